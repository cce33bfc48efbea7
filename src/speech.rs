//! Synthesize speech from text.

use std::path::Path;

use conjure_core::{AudioGenerator, Error, audio::Data};
use futures_lite::{StreamExt, pin};
use mime::Mime;
use tracing::debug;

use crate::media::sniff_audio;

/// Synthesized speech.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Audio {
    data: Data,
    mime: Mime,
}

impl Audio {
    /// Wraps encoded audio bytes, detecting the media type.
    #[must_use]
    pub fn new(data: Data) -> Self {
        let mime = sniff_audio(&data);
        Self { data, mime }
    }

    /// Returns the encoded bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the media type, `application/octet-stream` if unknown.
    #[must_use]
    pub const fn mime(&self) -> &Mime {
        &self.mime
    }

    /// Consumes the audio, returning its bytes.
    #[must_use]
    pub fn into_data(self) -> Data {
        self.data
    }

    /// Writes the audio to `path`.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> crate::Result<()> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }
}

/// Speaks `text` with the generator's default voice.
///
/// ```rust
/// use conjure::{AudioGenerator, speech};
///
/// async fn greet(generator: &impl AudioGenerator) -> conjure::Result<()> {
///     speech(generator, "Welcome aboard!").await?.save("welcome.mp3")
/// }
/// ```
///
/// # Errors
/// See [`speech_with_voice`].
pub async fn speech(generator: &impl AudioGenerator, text: &str) -> crate::Result<Audio> {
    synthesize(generator, text, None).await
}

/// Speaks `text` with the named voice.
///
/// # Errors
/// - [`Error::Arguments`] if `text` is blank; the generator is not called.
/// - [`Error::Speech`] if the generator fails.
/// - [`Error::Empty`] if the generator produced no audio.
pub async fn speech_with_voice(
    generator: &impl AudioGenerator,
    text: &str,
    voice: &str,
) -> crate::Result<Audio> {
    synthesize(generator, text, Some(voice)).await
}

async fn synthesize(
    generator: &impl AudioGenerator,
    text: &str,
    voice: Option<&str>,
) -> crate::Result<Audio> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::arguments("speech", "text must not be empty"));
    }

    debug!(voice, chars = text.len(), "synthesizing speech");
    let chunks = generator.generate(text, voice);
    pin!(chunks);

    let mut data = Data::new();
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(|err| Error::Speech(anyhow::Error::new(err)))?;
        data.extend_from_slice(&chunk);
    }

    if data.is_empty() {
        return Err(Error::Empty("speech synthesizer"));
    }
    debug!(bytes = data.len(), "speech synthesis finished");
    Ok(Audio::new(data))
}
