//! Rendering AI function signatures into prompts.
//!
//! [`prompt_fn`] is the model-free half of [`Function`](crate::Function): it describes a
//! function, validates the arguments of one call and renders both into a
//! [`PromptFunction`] that any client can send.

/// Prompt functions.
pub mod r#fn;
/// Signatures and call arguments.
pub mod signature;

pub use r#fn::{PromptFn, PromptFunction, prompt_fn};
pub use signature::{Arguments, Parameter, Signature};
