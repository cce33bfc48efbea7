use core::{fmt, marker::PhantomData};
use std::fmt::Write as _;

use conjure_core::{
    Error,
    llm::{Message, Parameters, Request, is_plain_text},
};
use schemars::{JsonSchema, Schema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::signature::{Arguments, Signature};

const PREAMBLE: &str = include_str!("../../prompts/function.txt");

/// Starts describing a function whose result is rendered into a [`PromptFunction`].
///
/// ```rust
/// use conjure::{prompt::Arguments, prompt_fn};
///
/// let prompt = prompt_fn::<Vec<String>>("list_fruits", "Lists fruits of the given color")
///     .param::<String>("color")
///     .param::<u8>("n")
///     .render(Arguments::new().with("color", "red")?.with("n", &3)?)?;
///
/// assert_eq!(prompt.name(), "list_fruits");
/// assert!(prompt.messages()[1].content().contains("color = \"red\""));
/// # Ok::<(), conjure::Error>(())
/// ```
pub fn prompt_fn<O: JsonSchema>(
    name: impl Into<String>,
    description: impl Into<String>,
) -> PromptFn<O> {
    PromptFn::new(name, description)
}

/// Builder for the prompt of an AI function returning `O`.
pub struct PromptFn<O> {
    signature: Signature,
    instructions: Option<String>,
    invalid: Option<String>,
    _output: PhantomData<fn() -> O>,
}

impl<O> fmt::Debug for PromptFn<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptFn")
            .field("signature", &self.signature)
            .field("instructions", &self.instructions)
            .finish_non_exhaustive()
    }
}

impl<O> Clone for PromptFn<O> {
    fn clone(&self) -> Self {
        Self {
            signature: self.signature.clone(),
            instructions: self.instructions.clone(),
            invalid: self.invalid.clone(),
            _output: PhantomData,
        }
    }
}

impl<O: JsonSchema> PromptFn<O> {
    /// Creates a prompt function without parameters.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            signature: Signature::new(name, description, schema_for!(O)),
            instructions: None,
            invalid: None,
            _output: PhantomData,
        }
    }
}

impl<O> PromptFn<O> {
    /// Declares a parameter whose values follow the schema of `T`.
    #[must_use]
    pub fn param<T: JsonSchema + ?Sized>(mut self, name: impl Into<String>) -> Self {
        self.signature.declare(name, schema_for!(T));
        self
    }

    /// Declares one parameter per field of the struct `A`, in field order.
    ///
    /// A type that isn't a struct with named fields makes [`render`](Self::render) fail with
    /// [`Error::Arguments`].
    #[must_use]
    pub fn params<A: JsonSchema>(mut self) -> Self {
        let schema = schema_for!(A);

        if schema.get("type").and_then(Value::as_str) == Some("null") {
            return self;
        }

        let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
            self.invalid = Some(format!(
                "`{}` has no named fields to use as parameters",
                A::schema_name()
            ));
            return self;
        };

        let definitions = schema.get("$defs").cloned();
        for (name, property) in properties {
            let mut property = property.clone();
            if let (Some(definitions), Some(object)) = (&definitions, property.as_object_mut()) {
                object.insert("$defs".to_string(), definitions.clone());
            }
            match serde_json::from_value::<Schema>(property) {
                Ok(schema) => self.signature.declare(name.clone(), schema),
                Err(err) => {
                    self.invalid = Some(format!("field `{name}` has an invalid schema: {err}"));
                }
            }
        }
        self
    }

    /// Adds guidance for the model on top of the description.
    #[must_use]
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Returns the signature built so far.
    #[must_use]
    pub const fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Renders the prompt for one call.
    ///
    /// `arguments` is anything serializing to an object of named values (a struct, a map,
    /// [`Arguments`]) or to `null` when the function takes no parameters.
    ///
    /// # Errors
    /// - [`Error::Arguments`] for non-object arguments, undeclared arguments or an invalid
    ///   [`params`](Self::params) type.
    /// - [`Error::MissingArgument`] if a declared parameter has no argument.
    /// - [`Error::Json`] if a schema or argument cannot be encoded.
    pub fn render(&self, arguments: impl Serialize) -> crate::Result<PromptFunction> {
        let name = self.signature.name();
        if let Some(reason) = &self.invalid {
            return Err(Error::arguments(name, reason.as_str()));
        }

        let arguments = Arguments::from_serialize(name, arguments)?;
        let bound = self.signature.bind(&arguments)?;

        let system = self.system_prompt()?;
        let mut user = String::new();
        if bound.is_empty() {
            user.push_str("The function takes no arguments.\n");
        } else {
            user.push_str("Call arguments:\n");
            for (param, value) in bound {
                let _ = writeln!(user, "{param} = {}", serde_json::to_string(value)?);
            }
        }
        let _ = write!(user, "\nWhat does `{name}` return?");

        debug!(function = name, "rendered prompt function");

        Ok(PromptFunction {
            name: name.to_string(),
            messages: vec![Message::system(system), Message::user(user)],
            response_schema: self.signature.returns().clone(),
        })
    }

    fn system_prompt(&self) -> crate::Result<String> {
        let signature = &self.signature;
        let mut prompt = String::from(PREAMBLE.trim_end());

        let _ = write!(prompt, "\n\nFunction: {}\n", signature.name());
        if signature.parameters().is_empty() {
            prompt.push_str("Parameters: none\n");
        } else {
            prompt.push_str("Parameters:\n");
            for param in signature.parameters() {
                let _ = writeln!(
                    prompt,
                    "- {}: {}",
                    param.name(),
                    serde_json::to_string(param.schema())?
                );
            }
        }
        let _ = writeln!(
            prompt,
            "Returns: {}",
            serde_json::to_string(signature.returns())?
        );

        let _ = write!(prompt, "\nDescription:\n{}\n\n", signature.description().trim());
        if is_plain_text(signature.returns()) {
            prompt.push_str(
                "Answer with the return value as plain text, without quotes or commentary.",
            );
        } else {
            prompt.push_str(
                "Answer with the return value only, as JSON matching the return schema. \
                 No commentary.",
            );
        }

        if let Some(instructions) = self.instructions.as_deref().map(str::trim) {
            if !instructions.is_empty() {
                let _ = write!(prompt, "\n\nAdditional instructions:\n{instructions}");
            }
        }

        Ok(prompt)
    }
}

/// The rendered prompt of one AI function call.
///
/// Messages are always `[system, user]`. The payload is plain data, so it can be serialized
/// and sent by any client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptFunction {
    name: String,
    messages: Vec<Message>,
    response_schema: Schema,
}

impl PromptFunction {
    /// Returns the function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the rendered messages.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the schema the answer must follow.
    #[must_use]
    pub const fn response_schema(&self) -> &Schema {
        &self.response_schema
    }

    /// Converts the prompt into a [`Request`].
    ///
    /// Non-text return types request structured output with the response schema.
    #[must_use]
    pub fn into_request(self) -> Request {
        let parameters = if is_plain_text(&self.response_schema) {
            Parameters::default()
        } else {
            Parameters::default().with_response_format(self.response_schema)
        };
        Request::new(self.messages).with_parameters(parameters)
    }
}
