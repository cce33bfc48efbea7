//! Sampling parameters attached to a [`Request`](super::Request).
//!
//! ```rust
//! use conjure_core::llm::Parameters;
//!
//! let params = Parameters::default()
//!     .temperature(0.2)
//!     .max_tokens(512)
//!     .seed(7);
//! ```

use schemars::Schema;
use serde::{Deserialize, Serialize};

/// Parameters controlling how a language model generates a response.
///
/// Every sampling field is optional; providers ignore the ones they don't support.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// Sampling temperature. Lower is more deterministic.
    pub temperature: Option<f32>,
    /// Nucleus sampling probability.
    pub top_p: Option<f32>,
    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,
    /// Random seed for reproducible output.
    pub seed: Option<u32>,
    /// Sequences that end generation.
    pub stop: Option<Vec<String>>,
    /// Whether the caller expects JSON output.
    pub structured_outputs: bool,
    /// Schema the JSON output should conform to.
    ///
    /// Providers with native structured generation should constrain decoding to it.
    pub response_format: Option<Schema>,
}

macro_rules! impl_with_methods {
    (
        impl $ty:ty {
            $($field:ident : $field_ty:ty),* $(,)?
        }
    ) => {
        impl $ty {
            $(
                /// Sets the parameter value using a builder pattern.
                #[allow(clippy::missing_const_for_fn)]
                #[must_use] pub fn $field(mut self, value: $field_ty) -> Self {
                    self.$field = Some(value);
                    self
                }
            )*
        }
    };
}

impl_with_methods! {
    impl Parameters {
        temperature: f32,
        top_p: f32,
        max_tokens: u32,
        seed: u32,
        stop: Vec<String>,
    }
}

impl Parameters {
    /// Requests JSON output conforming to `schema`.
    #[must_use]
    pub fn with_response_format(mut self, schema: Schema) -> Self {
        self.structured_outputs = true;
        self.response_format = Some(schema);
        self
    }

    /// Fills every unset field from `defaults`. Fields already set are kept.
    #[must_use]
    pub fn merge(mut self, defaults: &Self) -> Self {
        self.temperature = self.temperature.or(defaults.temperature);
        self.top_p = self.top_p.or(defaults.top_p);
        self.max_tokens = self.max_tokens.or(defaults.max_tokens);
        self.seed = self.seed.or(defaults.seed);
        if self.stop.is_none() {
            self.stop.clone_from(&defaults.stop);
        }
        self.structured_outputs |= defaults.structured_outputs;
        if self.response_format.is_none() {
            self.response_format.clone_from(&defaults.response_format);
        }
        self
    }
}
