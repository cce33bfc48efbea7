//! Default parameters and retry policy applied to every component call.
//!
//! Components take any [`LanguageModel`]; to give them defaults, wrap the model once:
//!
//! ```rust
//! use conjure_core::{LanguageModel, Settings};
//!
//! fn configure<M: LanguageModel>(model: M) -> impl LanguageModel {
//!     Settings::default().temperature(0.0).retries(2).bind(model)
//! }
//! ```

use core::future::Future;

use futures_core::Stream;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::{
    Error,
    llm::{LanguageModel, Parameters, Request},
};

/// Environment variable holding the default sampling temperature.
pub const TEMPERATURE_ENV: &str = "CONJURE_TEMPERATURE";
/// Environment variable holding the default token limit.
pub const MAX_TOKENS_ENV: &str = "CONJURE_MAX_TOKENS";
/// Environment variable holding the default seed.
pub const SEED_ENV: &str = "CONJURE_SEED";
/// Environment variable holding the number of structured-output retries.
pub const RETRIES_ENV: &str = "CONJURE_RETRIES";

/// Defaults shared by all components.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    seed: Option<u32>,
    retries: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            temperature: None,
            max_tokens: None,
            seed: None,
            retries: 1,
        }
    }
}

impl Settings {
    /// Reads settings from the `CONJURE_*` environment variables, keeping defaults for unset ones.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if a variable is set but cannot be parsed.
    pub fn from_env() -> crate::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> crate::Result<Self> {
        let mut settings = Self::default();
        if let Some(value) = parse_var(&lookup, TEMPERATURE_ENV)? {
            settings.temperature = Some(value);
        }
        if let Some(value) = parse_var(&lookup, MAX_TOKENS_ENV)? {
            settings.max_tokens = Some(value);
        }
        if let Some(value) = parse_var(&lookup, SEED_ENV)? {
            settings.seed = Some(value);
        }
        if let Some(value) = parse_var(&lookup, RETRIES_ENV)? {
            settings.retries = value;
        }
        Ok(settings)
    }

    /// Sets the default sampling temperature.
    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the default token limit.
    #[must_use]
    pub const fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the default seed.
    #[must_use]
    pub const fn seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets how many extra attempts are made when structured output fails to parse.
    #[must_use]
    pub const fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Returns the number of structured-output retries.
    #[must_use]
    pub const fn retry_count(&self) -> u32 {
        self.retries
    }

    /// Default parameters derived from these settings.
    #[must_use]
    pub fn parameters(&self) -> Parameters {
        let mut parameters = Parameters::default();
        parameters.temperature = self.temperature;
        parameters.max_tokens = self.max_tokens;
        parameters.seed = self.seed;
        parameters
    }

    /// Wraps `model` so every request picks up these settings.
    pub fn bind<M: LanguageModel>(self, model: M) -> Configured<M> {
        Configured {
            defaults: self.parameters(),
            settings: self,
            inner: model,
        }
    }
}

fn parse_var<T: core::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> crate::Result<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => match raw.trim().parse() {
            Ok(value) => Ok(Some(value)),
            Err(_) => Err(Error::Config { key, value: raw }),
        },
    }
}

/// A [`LanguageModel`] with [`Settings`] applied.
///
/// Request parameters that are already set win over the defaults.
#[derive(Debug, Clone)]
pub struct Configured<M> {
    inner: M,
    settings: Settings,
    defaults: Parameters,
}

impl<M> Configured<M> {
    /// Returns the wrapped model.
    pub const fn inner(&self) -> &M {
        &self.inner
    }

    /// Returns the applied settings.
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Unwraps the model.
    pub fn into_inner(self) -> M {
        self.inner
    }

    fn apply(&self, request: Request) -> Request {
        let (messages, parameters) = request.into_parts();
        Request::new(messages).with_parameters(parameters.merge(&self.defaults))
    }
}

impl<M: LanguageModel> LanguageModel for Configured<M> {
    type Error = M::Error;

    fn respond(&self, request: Request) -> impl Stream<Item = Result<String, Self::Error>> + Send {
        self.inner.respond(self.apply(request))
    }

    fn generate<T: JsonSchema + DeserializeOwned + 'static>(
        &self,
        request: Request,
    ) -> impl Future<Output = crate::Result<T>> + Send {
        let request = self.apply(request);
        async move {
            let mut attempt = 0;
            loop {
                match self.inner.generate::<T>(request.clone()).await {
                    Err(err) if err.is_parse() && attempt < self.settings.retries => {
                        attempt += 1;
                        warn!("structured output failed to parse, retrying ({attempt}): {err}");
                    }
                    result => return result,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::oneshot;
    use core::convert::Infallible;
    use serde::Deserialize;
    use std::{collections::VecDeque, sync::Mutex};

    #[derive(Debug, Deserialize, JsonSchema, PartialEq, Eq)]
    struct Point {
        x: i32,
        y: i32,
    }

    struct Replay {
        replies: Mutex<VecDeque<&'static str>>,
        seen: Mutex<Vec<Parameters>>,
    }

    impl Replay {
        fn new(replies: impl IntoIterator<Item = &'static str>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().collect()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl LanguageModel for Replay {
        type Error = Infallible;

        fn respond(
            &self,
            request: Request,
        ) -> impl Stream<Item = Result<String, Self::Error>> + Send {
            self.seen.lock().unwrap().push(request.parameters().clone());
            let reply = self.replies.lock().unwrap().pop_front().unwrap_or_default();
            futures_lite::stream::iter(vec![Ok(reply.to_string())])
        }
    }

    fn lookup(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value).to_string())
        }
    }

    #[test]
    fn reads_environment_values() {
        let settings = Settings::from_lookup(lookup(&[
            (TEMPERATURE_ENV, "0.3"),
            (MAX_TOKENS_ENV, " 800 "),
            (RETRIES_ENV, "3"),
            (SEED_ENV, ""),
        ]))
        .unwrap();

        assert_eq!(
            settings,
            Settings::default().temperature(0.3).max_tokens(800).retries(3)
        );
    }

    #[test]
    fn rejects_malformed_values() {
        let err = Settings::from_lookup(lookup(&[(MAX_TOKENS_ENV, "lots")])).unwrap_err();
        match err {
            Error::Config { key, value } => {
                assert_eq!(key, MAX_TOKENS_ENV);
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn applies_defaults_without_overriding() {
        let model = Settings::default()
            .temperature(0.0)
            .seed(42)
            .bind(Replay::new(["hello"]));

        let request = oneshot("sys", "hi").with_parameters(Parameters::default().temperature(0.9));
        let text: String = model.generate(request).await.unwrap();
        assert_eq!(text, "hello");

        let seen = model.inner().seen.lock().unwrap();
        assert_eq!(seen[0].temperature, Some(0.9));
        assert_eq!(seen[0].seed, Some(42));
    }

    #[tokio::test]
    async fn retries_unparsable_output() {
        let model = Settings::default()
            .retries(2)
            .bind(Replay::new(["not json", "still not", r#"{"x": 1, "y": 2}"#]));

        let point: Point = model.generate(oneshot("sys", "point")).await.unwrap();
        assert_eq!(point, Point { x: 1, y: 2 });
        assert_eq!(model.inner().seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_retries() {
        let model = Settings::default()
            .retries(0)
            .bind(Replay::new(["not json", r#"{"x": 1, "y": 2}"#]));

        let err = model.generate::<Point>(oneshot("sys", "point")).await.unwrap_err();
        assert!(err.is_parse());
        assert_eq!(model.inner().seen.lock().unwrap().len(), 1);
    }
}
