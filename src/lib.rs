//! # conjure
//!
//! Typed AI helpers on top of any language model, image generator or speech synthesizer.
//!
//! The crate root is the public manifest: every helper lives in its own module and is
//! re-exported here under the name callers use.
//!
//! | name | defined in |
//! |------|------------|
//! | [`r#fn`], [`Function`] | [`function`] |
//! | [`model()`] | [`mod@model`] |
//! | [`cast`], [`extract`], [`classify`] | [`text`] |
//! | [`image()`] | [`mod@image`] |
//! | [`speech()`] | [`mod@speech`] |
//! | [`prompt_fn`], [`PromptFunction`] | [`prompt::r#fn`] |
//!
//! Backends come from [`conjure_core`]: implement [`LanguageModel`], [`ImageGenerator`] or
//! [`AudioGenerator`] for a provider and every helper works with it.
//!
//! ## Example
//!
//! ```rust
//! use conjure::{LanguageModel, ai_fn, classify, model};
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, JsonSchema)]
//! struct Ticket {
//!     title: String,
//!     priority: u8,
//! }
//!
//! /// Suggest a short, friendly reply to a support ticket.
//! #[ai_fn]
//! async fn suggest_reply(ticket_title: String) -> String {}
//!
//! async fn triage(llm: &impl LanguageModel, email: &str) -> conjure::Result<String> {
//!     let ticket = model::<Ticket>(llm, email).await?;
//!     let team = classify(llm, email, &["billing", "bugs", "accounts"], None).await?;
//!     let reply = suggest_reply(llm, ticket.title).await?;
//!     Ok(format!("[{team}] {reply}"))
//! }
//! ```
//!
//! ## Defaults
//!
//! Wrap a model with [`Settings`] to give every helper the same sampling defaults and a retry
//! policy for malformed structured output:
//!
//! ```rust
//! use conjure::{LanguageModel, Settings};
//!
//! fn configured(llm: impl LanguageModel) -> conjure::Result<impl LanguageModel> {
//!     Ok(Settings::from_env()?.bind(llm))
//! }
//! ```

pub mod function;
pub mod image;
mod media;
pub mod model;
pub mod prompt;
pub mod speech;
pub mod text;

pub use function::{Function, r#fn};
pub use image::image;
pub use model::model;
pub use prompt::r#fn::{PromptFunction, prompt_fn};
pub use speech::speech;
pub use text::{cast, classify, extract};

pub use conjure_core::{
    AudioGenerator, Error, ImageGenerator, LanguageModel, Result, Settings, config::Configured,
    error, llm,
};

#[cfg(feature = "derive")]
pub use conjure_derive::{ai_fn, ai_prompt};

#[doc(hidden)]
/// For internal use only.
pub mod __hidden {
    pub use crate::prompt::Arguments;
}
