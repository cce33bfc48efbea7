use std::sync::Arc;

use futures_core::Stream;
use serde::{Deserialize, Serialize};

/// Encoded image bytes (PNG, JPEG, ...).
pub type Data = Vec<u8>;

/// Generates images from prompts.
///
/// Images are returned as a stream where each item is a complete image with progressively
/// improving quality, so callers can show previews while generation is still running. The last
/// item is the final image.
pub trait ImageGenerator: Send + Sync {
    /// The error type returned by the image generator.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Creates an image from a prompt at the requested size.
    fn create(
        &self,
        prompt: Prompt,
        size: Size,
    ) -> impl Stream<Item = Result<Data, Self::Error>> + Unpin + Send;
}

macro_rules! impl_image_generator {
    ($($name:ident),*) => {
        $(
            impl<T: ImageGenerator> ImageGenerator for $name<T> {
                type Error = T::Error;

                fn create(
                    &self,
                    prompt: Prompt,
                    size: Size,
                ) -> impl Stream<Item = Result<Data, Self::Error>> + Unpin + Send {
                    T::create(self, prompt, size)
                }
            }
        )*
    };
}

impl<T: ImageGenerator> ImageGenerator for &T {
    type Error = T::Error;

    fn create(
        &self,
        prompt: Prompt,
        size: Size,
    ) -> impl Stream<Item = Result<Data, Self::Error>> + Unpin + Send {
        T::create(self, prompt, size)
    }
}

impl_image_generator!(Arc, Box);

/// Text description of an image, optionally guided by reference images.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Prompt {
    text: String,
    references: Vec<Data>,
}

impl Prompt {
    /// Creates a prompt from text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            references: Vec::new(),
        }
    }

    /// Returns the text description.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the reference images.
    #[must_use]
    pub fn references(&self) -> &[Data] {
        &self.references
    }

    /// Adds a reference image.
    #[must_use]
    pub fn with_reference(mut self, image: Data) -> Self {
        self.references.push(image);
        self
    }

    /// Appends extra instructions to the text, separated by a blank line.
    #[must_use]
    pub fn with_instructions(mut self, instructions: &str) -> Self {
        let instructions = instructions.trim();
        if !instructions.is_empty() {
            if !self.text.is_empty() {
                self.text.push_str("\n\n");
            }
            self.text.push_str(instructions);
        }
        self
    }
}

impl From<String> for Prompt {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for Prompt {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Width and height of an image in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Size {
    width: u32,
    height: u32,
}

impl Size {
    /// Creates a size from width and height.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Creates a square size.
    #[must_use]
    pub const fn square(size: u32) -> Self {
        Self::new(size, size)
    }

    /// Returns the width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Parses `"{width}x{height}"`, e.g. `"1792x1024"`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let (width, height) = raw.trim().split_once(|c| c == 'x' || c == 'X')?;
        let width = width.trim().parse::<u32>().ok().filter(|w| *w > 0)?;
        let height = height.trim().parse::<u32>().ok().filter(|h| *h > 0)?;
        Some(Self::new(width, height))
    }
}

impl core::fmt::Display for Size {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use core::convert::Infallible;

    use super::*;
    use futures_lite::StreamExt;

    struct Echo;

    impl ImageGenerator for Echo {
        type Error = Infallible;

        fn create(
            &self,
            prompt: Prompt,
            size: Size,
        ) -> impl Stream<Item = Result<Data, Self::Error>> + Unpin + Send {
            let preview = vec![0u8; 4];
            let full = format!("{}@{size}", prompt.text()).into_bytes();
            futures_lite::stream::iter(vec![Ok(preview), Ok(full)])
        }
    }

    #[tokio::test]
    async fn streams_progressive_frames() {
        let generator = Arc::new(Echo);
        let mut stream = generator.create(Prompt::new("a cat"), Size::square(256));

        let mut frames = Vec::new();
        while let Some(frame) = stream.next().await {
            frames.push(frame.unwrap());
        }

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1], b"a cat@256x256".to_vec());
    }

    #[test]
    fn prompt_instructions_are_appended() {
        let prompt = Prompt::new("a lighthouse").with_instructions("  in watercolor ");
        assert_eq!(prompt.text(), "a lighthouse\n\nin watercolor");

        let untouched = Prompt::new("a lighthouse").with_instructions("   ");
        assert_eq!(untouched.text(), "a lighthouse");

        let bare = Prompt::default().with_instructions("only this");
        assert_eq!(bare.text(), "only this");
    }

    #[test]
    fn prompt_keeps_references() {
        let prompt = Prompt::from("edit this").with_reference(vec![1, 2, 3]);
        assert_eq!(prompt.references().to_vec(), vec![vec![1u8, 2, 3]]);
    }

    #[test]
    fn size_parse_and_display() {
        assert_eq!(Size::parse("1792x1024"), Some(Size::new(1792, 1024)));
        assert_eq!(Size::parse(" 512 X 512 "), Some(Size::square(512)));
        assert_eq!(Size::parse("0x512"), None);
        assert_eq!(Size::parse("wide"), None);
        assert_eq!(Size::square(64).to_string(), "64x64");
    }
}
