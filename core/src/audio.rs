use std::sync::Arc;

use futures_core::Stream;

/// Encoded audio bytes (MP3, WAV, ...).
pub type Data = Vec<u8>;

/// Synthesizes speech from text.
///
/// The returned stream yields consecutive chunks of a single encoded audio file; concatenating
/// them in order gives the complete file.
///
/// # Example
///
/// ```rust
/// use conjure_core::AudioGenerator;
/// use futures_core::Stream;
///
/// struct Silence;
///
/// impl AudioGenerator for Silence {
///     type Error = std::convert::Infallible;
///
///     fn generate(
///         &self,
///         _text: &str,
///         _voice: Option<&str>,
///     ) -> impl Stream<Item = Result<conjure_core::audio::Data, Self::Error>> + Send {
///         futures_lite::stream::iter(vec![Ok(vec![0u8; 1024])])
///     }
/// }
/// ```
pub trait AudioGenerator: Send + Sync {
    /// The error type returned by the synthesizer.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Speaks `text`, using `voice` when given and the generator's default voice otherwise.
    fn generate(
        &self,
        text: &str,
        voice: Option<&str>,
    ) -> impl Stream<Item = Result<Data, Self::Error>> + Send;
}

macro_rules! impl_audio_generator {
    ($($name:ident),*) => {
        $(
            impl<T: AudioGenerator> AudioGenerator for $name<T> {
                type Error = T::Error;

                fn generate(
                    &self,
                    text: &str,
                    voice: Option<&str>,
                ) -> impl Stream<Item = Result<Data, Self::Error>> + Send {
                    T::generate(self, text, voice)
                }
            }
        )*
    };
}

impl<T: AudioGenerator> AudioGenerator for &T {
    type Error = T::Error;

    fn generate(
        &self,
        text: &str,
        voice: Option<&str>,
    ) -> impl Stream<Item = Result<Data, Self::Error>> + Send {
        T::generate(self, text, voice)
    }
}

impl_audio_generator!(Arc, Box);
