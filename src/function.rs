//! AI functions: a signature whose return value is predicted by a language model.
//!
//! ```rust
//! use conjure::{LanguageModel, r#fn};
//!
//! async fn haiku(model: &impl LanguageModel) -> conjure::Result<String> {
//!     r#fn::<String>("write_haiku", "Writes a haiku about the topic")
//!         .param::<str>("topic")
//!         .call(model, conjure::prompt::Arguments::new().with("topic", "autumn rain")?)
//!         .await
//! }
//! ```
//!
//! The `#[ai_fn]` attribute builds the same thing from a Rust function signature.

use core::fmt;

use conjure_core::LanguageModel;
use futures::future::join_all;
use schemars::JsonSchema;
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::prompt::{PromptFn, PromptFunction, Signature};

/// Starts describing an AI function returning `O`.
///
/// Same as [`Function::new`].
pub fn r#fn<O: JsonSchema>(name: impl Into<String>, description: impl Into<String>) -> Function<O> {
    Function::new(name, description)
}

/// An AI function returning `O`.
///
/// Each call renders the signature and arguments into a prompt and runs one structured
/// generation on the model.
pub struct Function<O> {
    prompt: PromptFn<O>,
}

impl<O> fmt::Debug for Function<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("signature", self.prompt.signature())
            .finish_non_exhaustive()
    }
}

impl<O> Clone for Function<O> {
    fn clone(&self) -> Self {
        Self {
            prompt: self.prompt.clone(),
        }
    }
}

impl<O: JsonSchema> Function<O> {
    /// Creates a function without parameters.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            prompt: PromptFn::new(name, description),
        }
    }
}

impl<O> Function<O> {
    /// Declares a parameter whose values follow the schema of `T`.
    #[must_use]
    pub fn param<T: JsonSchema + ?Sized>(self, name: impl Into<String>) -> Self {
        Self {
            prompt: self.prompt.param::<T>(name),
        }
    }

    /// Declares one parameter per field of the struct `A`, in field order.
    #[must_use]
    pub fn params<A: JsonSchema>(self) -> Self {
        Self {
            prompt: self.prompt.params::<A>(),
        }
    }

    /// Adds guidance for the model on top of the description.
    #[must_use]
    pub fn instructions(self, instructions: impl Into<String>) -> Self {
        Self {
            prompt: self.prompt.instructions(instructions),
        }
    }

    /// Returns the signature.
    #[must_use]
    pub const fn signature(&self) -> &Signature {
        self.prompt.signature()
    }

    /// Renders the prompt a call with `arguments` would send.
    ///
    /// # Errors
    /// See [`PromptFn::render`].
    pub fn prompt(&self, arguments: impl Serialize) -> crate::Result<PromptFunction> {
        self.prompt.render(arguments)
    }
}

impl<O: JsonSchema + DeserializeOwned + 'static> Function<O> {
    /// Calls the function once.
    ///
    /// # Errors
    /// Argument errors from [`PromptFn::render`], plus any error of
    /// [`LanguageModel::generate`].
    pub async fn call<M: LanguageModel>(
        &self,
        model: &M,
        arguments: impl Serialize,
    ) -> crate::Result<O> {
        let request = self.prompt.render(arguments)?.into_request();
        debug!(function = self.signature().name(), "calling AI function");
        model.generate::<O>(request).await
    }

    /// Calls the function once per input, concurrently.
    ///
    /// Results keep the order of `inputs`.
    ///
    /// # Errors
    /// Returns the error of the first failing input.
    pub async fn map<M, I, A>(&self, model: &M, inputs: I) -> crate::Result<Vec<O>>
    where
        M: LanguageModel,
        I: IntoIterator<Item = A>,
        A: Serialize,
    {
        let calls = inputs
            .into_iter()
            .map(|arguments| self.call(model, arguments));
        join_all(calls).await.into_iter().collect()
    }
}
