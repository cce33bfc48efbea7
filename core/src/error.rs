//! Error type shared by the backend traits and every component built on them.

use thiserror::Error;

/// Errors produced while rendering, running, or parsing a component call.
#[derive(Debug, Error)]
pub enum Error {
    /// The language model failed to produce a response.
    #[error("language model error: {0}")]
    Model(anyhow::Error),

    /// The image generator failed.
    #[error("image generation error: {0}")]
    Image(anyhow::Error),

    /// The speech synthesizer failed.
    #[error("speech synthesis error: {0}")]
    Speech(anyhow::Error),

    /// The model answered, but not with JSON matching the requested schema.
    #[error("failed to parse structured output: {message}; sample: {sample}")]
    Parse {
        /// Error reported by the last parse attempt.
        message: String,
        /// Leading part of the offending output.
        sample: String,
    },

    /// Call arguments did not match the declared signature.
    #[error("invalid arguments for `{function}`: {reason}")]
    Arguments {
        /// Function or component that rejected the arguments.
        function: String,
        /// What was wrong with them.
        reason: String,
    },

    /// A declared parameter had no value.
    #[error("missing argument `{name}` for `{function}`")]
    MissingArgument {
        /// Function being called.
        function: String,
        /// Name of the missing parameter.
        name: String,
    },

    /// `classify` was called without any label.
    #[error("no labels provided for classification")]
    NoLabels,

    /// The model picked a label that does not exist.
    #[error("label index {index} is out of range for {count} labels")]
    LabelOutOfRange {
        /// Index returned by the model.
        index: usize,
        /// Number of labels offered.
        count: usize,
    },

    /// A backend finished without producing anything.
    #[error("{0} produced no output")]
    Empty(&'static str),

    /// A configuration value could not be parsed.
    #[error("invalid value for {key}: {value:?}")]
    Config {
        /// Setting name, e.g. the environment variable.
        key: &'static str,
        /// Raw value that failed to parse.
        value: String,
    },

    /// JSON encoding or decoding failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Writing a result to disk failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps a language model backend error.
    pub fn model<E>(err: E) -> Self
    where
        E: core::error::Error + Send + Sync + 'static,
    {
        Self::Model(anyhow::Error::new(err))
    }

    /// Builds an [`Error::Arguments`].
    pub fn arguments(function: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Arguments {
            function: function.into(),
            reason: reason.into(),
        }
    }

    /// Whether retrying the same request could plausibly succeed.
    #[must_use]
    pub const fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

/// Result type used throughout the workspace.
///
/// Defaults to [`String`] as the success type, like the text-producing calls it mostly wraps.
pub type Result<T = String> = core::result::Result<T, Error>;
