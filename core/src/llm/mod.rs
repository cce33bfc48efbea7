//! # Language models
//!
//! Everything a component needs to talk to a language model without knowing which provider
//! sits behind it.
//!
//! - **[`LanguageModel`]** - streams text for a [`Request`] and parses structured output.
//! - **[`Request`]** - messages plus [`Parameters`].
//! - **[`Message`]** - a single turn in the conversation.
//!
//! ## Plain text
//!
//! ```rust
//! use conjure_core::llm::{LanguageModel, collect_text, oneshot};
//!
//! async fn capital(model: impl LanguageModel) -> Result<String, Box<dyn std::error::Error>> {
//!     let request = oneshot("You are a helpful assistant", "What's the capital of Japan?");
//!     Ok(collect_text(model.respond(request)).await?)
//! }
//! ```
//!
//! ## Structured output
//!
//! [`LanguageModel::generate`] asks for JSON matching the schema of `T` and parses the answer,
//! tolerating the usual ways models wrap JSON (code fences, leading labels, surrounding prose).
//!
//! ```rust
//! use conjure_core::llm::{LanguageModel, Message, Request};
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//!
//! #[derive(JsonSchema, Deserialize)]
//! struct Recipe {
//!     title: String,
//!     ingredients: Vec<String>,
//! }
//!
//! async fn recipe(model: impl LanguageModel) -> conjure_core::Result<Recipe> {
//!     let request = Request::new([Message::user("Give me a pancake recipe")]);
//!     model.generate::<Recipe>(request).await
//! }
//! ```

/// Message types and conversation roles.
pub mod message;
/// Sampling parameters.
pub mod parameters;
mod prompts;

use core::{any::TypeId, future::Future};
use std::sync::Arc;

use futures_core::Stream;
use futures_lite::{StreamExt, pin};
use schemars::{JsonSchema, Schema, schema_for};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::debug;

pub use message::{Message, Role};
pub use parameters::Parameters;

use crate::Error;

/// Conversation and parameters passed into [`LanguageModel::respond`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    messages: Vec<Message>,
    parameters: Parameters,
}

impl Request {
    /// Creates a request from the provided messages using default parameters.
    pub fn new(messages: impl Into<Vec<Message>>) -> Self {
        Self {
            messages: messages.into(),
            parameters: Parameters::default(),
        }
    }

    /// Overrides the sampling parameters used for this call.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Appends a message to the conversation.
    #[must_use]
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Returns the conversation messages.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the current parameters.
    #[must_use]
    pub const fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Breaks the request into its owned parts.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Message>, Parameters) {
        (self.messages, self.parameters)
    }
}

/// Convenience helper that creates a single system + user [`Request`].
pub fn oneshot(system: impl Into<String>, user: impl Into<String>) -> Request {
    Request::new(vec![Message::system(system), Message::user(user)])
}

/// Language models for text generation.
///
/// See the [module documentation](crate::llm) for examples.
pub trait LanguageModel: Sized + Send + Sync {
    /// The error type returned by this language model.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Streams the response to a conversation as text chunks.
    fn respond(&self, request: Request) -> impl Stream<Item = Result<String, Self::Error>> + Send;

    /// Generates output conforming to the JSON schema of `T`.
    ///
    /// # Note for Implementors
    /// The default implementation appends a system prompt describing the schema and parses the
    /// collected text. Providers with native structured generation should override this, since
    /// token-level constraints make the output valid JSON by construction.
    fn generate<T: JsonSchema + DeserializeOwned + 'static>(
        &self,
        request: Request,
    ) -> impl Future<Output = crate::Result<T>> + Send {
        async move { structured_generate(self, request).await }
    }
}

macro_rules! impl_language_model {
    ($($name:ident),*) => {
        $(
            impl<T: LanguageModel> LanguageModel for $name<T> {
                type Error = T::Error;

                fn respond(
                    &self,
                    request: Request,
                ) -> impl Stream<Item = Result<String, Self::Error>> + Send {
                    T::respond(self, request)
                }

                fn generate<U: JsonSchema + DeserializeOwned + 'static>(
                    &self,
                    request: Request,
                ) -> impl Future<Output = crate::Result<U>> + Send {
                    T::generate(self, request)
                }
            }
        )*
    };
}

impl<T: LanguageModel> LanguageModel for &T {
    type Error = T::Error;

    fn respond(&self, request: Request) -> impl Stream<Item = Result<String, Self::Error>> + Send {
        T::respond(self, request)
    }

    fn generate<U: JsonSchema + DeserializeOwned + 'static>(
        &self,
        request: Request,
    ) -> impl Future<Output = crate::Result<U>> + Send {
        T::generate(self, request)
    }
}

impl_language_model!(Arc, Box);

/// Concatenates every chunk of a text stream.
///
/// # Errors
/// Returns the first error yielded by the stream.
pub async fn collect_text<S, E>(stream: S) -> Result<String, E>
where
    S: Stream<Item = Result<String, E>>,
{
    pin!(stream);

    stream
        .try_fold(String::new(), |acc, chunk| Ok(acc + &chunk))
        .await
}

async fn structured_generate<T, M>(model: &M, request: Request) -> crate::Result<T>
where
    T: JsonSchema + DeserializeOwned + 'static,
    M: LanguageModel,
{
    let schema = schema_for!(T);

    let json = if is_plain_text(&schema) {
        let text = collect_text(model.respond(request))
            .await
            .map_err(Error::model)?;
        // Free text is not JSON yet; encode it as a JSON string.
        serde_json::to_string(&text)?
    } else {
        let prompt = prompts::structured(&serde_json::to_string_pretty(&schema)?);
        let (messages, parameters) = request.into_parts();
        let request = Request::new(messages)
            .with_message(Message::system(prompt))
            .with_parameters(parameters.with_response_format(schema));

        collect_text(model.respond(request))
            .await
            .map_err(Error::model)?
    };

    parse_json_with_recovery(&json)
}

/// Whether `schema` asks for free text rather than JSON.
///
/// Enumerations, constants and formatted strings still need JSON.
#[must_use]
pub fn is_plain_text(schema: &Schema) -> bool {
    schema.get("type").and_then(Value::as_str) == Some("string")
        && ["enum", "const", "oneOf", "anyOf", "format"]
            .into_iter()
            .all(|key| schema.get(key).is_none())
}

/// Parses model output as `T`, trying the common ways models wrap JSON before giving up.
///
/// # Errors
/// Returns [`Error::Parse`] when no candidate deserializes into `T`.
pub fn parse_json_with_recovery<T: DeserializeOwned + 'static>(raw: &str) -> crate::Result<T> {
    let trimmed = raw.trim();
    let mut last_error: Option<serde_json::Error> = None;
    let mut last_candidate: Option<String> = None;

    for candidate in build_json_candidates(trimmed) {
        match serde_json::from_str::<T>(&candidate) {
            Ok(value) => return Ok(value),
            Err(err) => {
                last_error = Some(err);
                last_candidate = Some(candidate);
            }
        }
    }

    if is_string_type::<T>() {
        if let Some(value) = last_candidate.as_deref().and_then(coerce_to_string::<T>) {
            debug!("structured output coerced to a string");
            return Ok(value);
        }
    }

    let message = last_error.map_or_else(
        || "structured output was empty or missing a JSON block".to_string(),
        |err| err.to_string(),
    );
    let sample = last_candidate
        .as_deref()
        .unwrap_or(trimmed)
        .chars()
        .take(500)
        .collect::<String>();
    Err(Error::Parse { message, sample })
}

fn coerce_to_string<T: DeserializeOwned>(candidate: &str) -> Option<T> {
    let text = match serde_json::from_str::<Value>(candidate) {
        Ok(Value::String(s)) => s,
        Ok(other) => other.to_string(),
        Err(_) => candidate.to_string(),
    };
    let encoded = serde_json::to_string(&text).ok()?;
    serde_json::from_str(&encoded).ok()
}

fn strip_code_fences(raw: &str) -> Option<String> {
    let fence_start = raw.find("```")?;
    let after_fence = &raw[fence_start + 3..];
    let mut lines = after_fence.lines();
    let _language = lines.next();
    let body = lines.collect::<Vec<_>>().join("\n");
    let content = body.rfind("```").map_or(body.as_str(), |end| &body[..end]);

    let cleaned = content.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// Spans from the first opening bracket to the last matching closer, outermost first.
fn extract_json_blocks(raw: &str) -> Vec<String> {
    let mut spans: Vec<(usize, String)> = [('{', '}'), ('[', ']')]
        .into_iter()
        .filter_map(|(open, close)| {
            let start = raw.find(open)?;
            let end = raw.rfind(close)?;
            (end > start).then(|| (start, raw[start..=end].trim().to_string()))
        })
        .collect();
    spans.sort_by_key(|(start, _)| *start);
    spans.into_iter().map(|(_, span)| span).collect()
}

fn dequote_json_string(raw: &str) -> Option<String> {
    if !(raw.starts_with('"') && raw.ends_with('"')) {
        return None;
    }
    let inner: String = serde_json::from_str(raw).ok()?;
    (!inner.trim().is_empty()).then_some(inner)
}

fn strip_leading_label(raw: &str, label: &str) -> Option<String> {
    let head = raw.get(..label.len())?;
    if !head.eq_ignore_ascii_case(label) {
        return None;
    }
    let stripped = raw[label.len()..]
        .trim_start_matches(|c: char| c.is_whitespace() || c == ':' || c == '-')
        .trim();
    (!stripped.is_empty()).then(|| stripped.to_string())
}

fn build_json_candidates(raw: &str) -> Vec<String> {
    let candidates = [
        (!raw.is_empty()).then(|| raw.to_string()),
        strip_code_fences(raw),
    ]
    .into_iter()
    .flatten()
    .chain(extract_json_blocks(raw))
    .chain(dequote_json_string(raw))
    .chain(strip_leading_label(raw, "json"));

    let mut deduped: Vec<String> = Vec::new();
    for candidate in candidates {
        if !deduped.contains(&candidate) {
            deduped.push(candidate);
        }
    }
    deduped
}

fn is_string_type<T: 'static>() -> bool {
    TypeId::of::<T>() == TypeId::of::<String>()
}
