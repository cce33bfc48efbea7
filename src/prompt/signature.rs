use conjure_core::Error;
use schemars::Schema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A named, schema-described parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    name: String,
    schema: Schema,
}

impl Parameter {
    /// Creates a parameter.
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }

    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the JSON schema of the parameter's values.
    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }
}

/// Name, description, parameters and return schema of an AI function.
///
/// Parameter names are unique: declaring a name twice replaces the earlier schema and keeps its
/// position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    name: String,
    description: String,
    parameters: Vec<Parameter>,
    returns: Schema,
}

impl Signature {
    /// Creates a signature without parameters.
    pub fn new(name: impl Into<String>, description: impl Into<String>, returns: Schema) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            returns,
        }
    }

    /// Returns the function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the parameters in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Returns the schema of the return value.
    #[must_use]
    pub const fn returns(&self) -> &Schema {
        &self.returns
    }

    /// Looks up a parameter by name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|param| param.name == name)
    }

    /// Declares a parameter, replacing any earlier one with the same name.
    pub fn declare(&mut self, name: impl Into<String>, schema: Schema) {
        let param = Parameter::new(name, schema);
        match self.parameters.iter_mut().find(|p| p.name == param.name) {
            Some(existing) => *existing = param,
            None => self.parameters.push(param),
        }
    }

    /// Pairs every declared parameter with its argument, in declaration order.
    ///
    /// # Errors
    /// - [`Error::MissingArgument`] if a declared parameter has no argument.
    /// - [`Error::Arguments`] if an argument is not declared.
    pub fn bind<'a>(
        &'a self,
        arguments: &'a Arguments,
    ) -> crate::Result<Vec<(&'a str, &'a Value)>> {
        if let Some(unknown) = arguments
            .names()
            .find(|name| self.parameter(name).is_none())
        {
            return Err(Error::arguments(
                &self.name,
                format!("unexpected argument `{unknown}`"),
            ));
        }

        self.parameters
            .iter()
            .map(|param| {
                arguments
                    .get(&param.name)
                    .map(|value| (param.name.as_str(), value))
                    .ok_or_else(|| Error::MissingArgument {
                        function: self.name.clone(),
                        name: param.name.clone(),
                    })
            })
            .collect()
    }
}

/// Arguments of a single call, keyed by parameter name.
///
/// Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arguments(Map<String, Value>);

impl Arguments {
    /// Creates an empty argument list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an argument, serializing `value` to JSON.
    ///
    /// # Errors
    /// Returns [`Error::Json`] if `value` cannot be serialized.
    pub fn with<T: Serialize + ?Sized>(mut self, name: &str, value: &T) -> crate::Result<Self> {
        self.insert(name, serde_json::to_value(value)?);
        Ok(self)
    }

    /// Sets an argument, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    /// Returns the value passed for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Iterates over argument names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no argument was passed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Converts any serializable value into arguments.
    ///
    /// Structs and maps become one argument per field; `()` and `None` become no arguments.
    ///
    /// # Errors
    /// Returns [`Error::Arguments`] for values that don't serialize to a JSON object or `null`.
    pub fn from_serialize(function: &str, value: impl Serialize) -> crate::Result<Self> {
        match serde_json::to_value(value)? {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::new()),
            other => Err(Error::arguments(
                function,
                format!("arguments must be an object of named values, got `{other}`"),
            )),
        }
    }
}

impl FromIterator<(String, Value)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
