//! Generate images from text prompts.

use std::path::Path;

use conjure_core::{Error, ImageGenerator};
use futures_lite::StreamExt;
use mime::Mime;
use tracing::debug;

use crate::media::sniff_image;

pub use conjure_core::image::{Data, Prompt, Size};

/// Size used by [`image`].
pub const DEFAULT_SIZE: Size = Size::square(1024);

/// A generated image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    data: Data,
    size: Size,
    mime: Mime,
}

impl Image {
    /// Wraps encoded image bytes, detecting the media type.
    #[must_use]
    pub fn new(data: Data, size: Size) -> Self {
        let mime = sniff_image(&data);
        Self { data, size, mime }
    }

    /// Returns the encoded bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the size that was requested.
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Returns the media type, `application/octet-stream` if unknown.
    #[must_use]
    pub const fn mime(&self) -> &Mime {
        &self.mime
    }

    /// Consumes the image, returning its bytes.
    #[must_use]
    pub fn into_data(self) -> Data {
        self.data
    }

    /// Writes the image to `path`.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> crate::Result<()> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }
}

/// Generates a 1024x1024 image from `prompt`.
///
/// ```rust
/// use conjure::{ImageGenerator, image};
///
/// async fn poster(generator: &impl ImageGenerator) -> conjure::Result<()> {
///     image(generator, "a lighthouse at dusk, watercolor")
///         .await?
///         .save("poster.png")
/// }
/// ```
///
/// # Errors
/// See [`image_with_size`].
pub async fn image(
    generator: &impl ImageGenerator,
    prompt: impl Into<Prompt>,
) -> crate::Result<Image> {
    image_with_size(generator, prompt, DEFAULT_SIZE).await
}

/// Generates an image of the given size, keeping the final (highest quality) frame.
///
/// # Errors
/// - [`Error::Arguments`] if the prompt has neither text nor reference images.
/// - [`Error::Image`] if the generator fails.
/// - [`Error::Empty`] if the generator finishes without a frame.
pub async fn image_with_size(
    generator: &impl ImageGenerator,
    prompt: impl Into<Prompt>,
    size: Size,
) -> crate::Result<Image> {
    let prompt = prompt.into();
    if prompt.text().trim().is_empty() && prompt.references().is_empty() {
        return Err(Error::arguments("image", "prompt must not be empty"));
    }

    debug!(%size, "generating image");
    let mut frames = generator.create(prompt, size);
    let mut last = None;
    let mut count = 0_usize;
    while let Some(frame) = frames.next().await {
        last = Some(frame.map_err(|err| Error::Image(anyhow::Error::new(err)))?);
        count += 1;
    }
    debug!(frames = count, "image generation finished");

    last.filter(|data| !data.is_empty())
        .map(|data| Image::new(data, size))
        .ok_or(Error::Empty("image generator"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use futures_core::Stream;
    use std::sync::Mutex;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfinal";

    struct Progressive {
        frames: Vec<Data>,
        sizes: Mutex<Vec<Size>>,
    }

    impl Progressive {
        fn new(frames: Vec<Data>) -> Self {
            Self {
                frames,
                sizes: Mutex::new(Vec::new()),
            }
        }
    }

    impl ImageGenerator for Progressive {
        type Error = Infallible;

        fn create(
            &self,
            _prompt: Prompt,
            size: Size,
        ) -> impl Stream<Item = Result<Data, Self::Error>> + Unpin + Send {
            self.sizes.lock().unwrap().push(size);
            let frames: Vec<_> = self.frames.iter().cloned().map(Ok).collect();
            futures_lite::stream::iter(frames)
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("quota exceeded")]
    struct Quota;

    struct Failing;

    impl ImageGenerator for Failing {
        type Error = Quota;

        fn create(
            &self,
            _prompt: Prompt,
            _size: Size,
        ) -> impl Stream<Item = Result<Data, Self::Error>> + Unpin + Send {
            futures_lite::stream::iter(vec![Ok(b"preview".to_vec()), Err(Quota)])
        }
    }

    #[tokio::test]
    async fn keeps_last_frame_at_default_size() {
        let generator =
            Progressive::new(vec![b"blurry".to_vec(), b"sharper".to_vec(), PNG.to_vec()]);
        let image = image(&generator, "a red fox").await.unwrap();

        assert_eq!(image.data(), PNG);
        assert_eq!(image.mime(), &mime::IMAGE_PNG);
        assert_eq!(image.size(), DEFAULT_SIZE);
        assert_eq!(generator.sizes.lock().unwrap()[0], Size::square(1024));
    }

    #[tokio::test]
    async fn honors_requested_size() {
        let generator = Progressive::new(vec![PNG.to_vec()]);
        let size = Size::new(1792, 1024);
        let image = image_with_size(&generator, "a wide beach", size).await.unwrap();
        assert_eq!(image.size(), size);
    }

    #[tokio::test]
    async fn empty_stream_is_an_error() {
        let generator = Progressive::new(vec![]);
        let err = image(&generator, "nothing").await.unwrap_err();
        assert!(matches!(err, Error::Empty(_)));
    }

    #[tokio::test]
    async fn generator_errors_are_wrapped() {
        let err = image(&Failing, "a cat").await.unwrap_err();
        assert!(matches!(err, Error::Image(_)));
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected() {
        let generator = Progressive::new(vec![PNG.to_vec()]);
        let err = image(&generator, "  ").await.unwrap_err();
        assert!(matches!(err, Error::Arguments { .. }));
        assert!(generator.sizes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn saves_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fox.png");

        let generator = Progressive::new(vec![PNG.to_vec()]);
        image(&generator, "a red fox").await.unwrap().save(&path).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), PNG);
    }
}
