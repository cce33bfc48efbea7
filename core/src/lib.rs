//! # conjure-core
//!
//! Backend traits that the `conjure` components are written against.
//!
//! A component never talks to a provider directly. It renders a [`llm::Request`], hands it to
//! something implementing [`LanguageModel`], and parses the answer into a Rust type. Image and
//! speech components do the same with [`ImageGenerator`] and [`AudioGenerator`]. Provider crates
//! only have to implement these traits.
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐    ┌─────────────────┐
//! │   conjure       │───▶│  conjure-core    │◀───│   Providers     │
//! │                 │    │   (this crate)   │    │                 │
//! │ - fn / Function │    │ - LanguageModel  │    │ - openai        │
//! │ - cast/extract  │    │ - ImageGenerator │    │ - anthropic     │
//! │ - image, speech │    │ - AudioGenerator │    │ - local models  │
//! └─────────────────┘    └──────────────────┘    └─────────────────┘
//! ```
//!
//! ## Structured output
//!
//! ```rust
//! use conjure_core::{LanguageModel, llm::oneshot};
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//!
//! #[derive(JsonSchema, Deserialize)]
//! struct Weather {
//!     temperature: f32,
//!     condition: String,
//! }
//!
//! async fn weather(model: impl LanguageModel) -> conjure_core::Result<Weather> {
//!     let request = oneshot(
//!         "Extract weather information from the following text",
//!         "It's 22°C and sunny today",
//!     );
//!     model.generate::<Weather>(request).await
//! }
//! ```
//!
//! ## Modules
//!
//! - [`llm`]: requests, messages, parameters and structured generation.
//! - [`image`]: progressive image generation.
//! - [`audio`]: speech synthesis.
//! - [`config`]: default parameters and retry policy.
//! - [`error`]: the error type shared by every crate in the workspace.

/// Speech synthesis.
///
/// Contains the [`AudioGenerator`] trait.
pub mod audio;
pub mod config;
pub mod error;
/// Text-to-image generation.
///
/// Contains the [`ImageGenerator`] trait for creating images from text.
pub mod image;
pub mod llm;

#[doc(inline)]
pub use audio::AudioGenerator;
#[doc(inline)]
pub use config::Settings;
#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use image::ImageGenerator;
#[doc(inline)]
pub use llm::LanguageModel;
