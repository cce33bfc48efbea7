//! Integration tests for the public manifest and the attribute macros.

use core::{any::TypeId, convert::Infallible};
use std::sync::Mutex;

use conjure::{
    AudioGenerator, Error, ImageGenerator, LanguageModel, Settings, ai_fn, ai_prompt,
    image::{Prompt, Size},
    llm::{Request, Role},
};
use futures_core::Stream;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Replies with the first scripted answer whose needle appears in the request.
struct Script {
    replies: Vec<(&'static str, &'static str)>,
    seen: Mutex<Vec<Request>>,
}

impl Script {
    fn new(replies: impl IntoIterator<Item = (&'static str, &'static str)>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<Request> {
        self.seen.lock().unwrap().clone()
    }
}

impl LanguageModel for Script {
    type Error = Infallible;

    fn respond(&self, request: Request) -> impl Stream<Item = Result<String, Self::Error>> + Send {
        let reply = self
            .replies
            .iter()
            .find(|(needle, _)| {
                request
                    .messages()
                    .iter()
                    .any(|message| message.content().contains(needle))
            })
            .map_or("", |(_, reply)| *reply);
        self.seen.lock().unwrap().push(request);
        futures_lite::stream::iter(vec![Ok(reply.to_string())])
    }
}

struct Painter;

impl ImageGenerator for Painter {
    type Error = Infallible;

    fn create(
        &self,
        prompt: Prompt,
        size: Size,
    ) -> impl Stream<Item = Result<Vec<u8>, Self::Error>> + Unpin + Send {
        let mut frame = b"\x89PNG\r\n\x1a\n".to_vec();
        frame.extend_from_slice(format!("{}@{size}", prompt.text()).as_bytes());
        futures_lite::stream::iter(vec![Ok(b"draft".to_vec()), Ok(frame)])
    }
}

struct Voice;

impl AudioGenerator for Voice {
    type Error = Infallible;

    fn generate(
        &self,
        text: &str,
        _voice: Option<&str>,
    ) -> impl Stream<Item = Result<Vec<u8>, Self::Error>> + Send {
        futures_lite::stream::iter(vec![Ok(b"OggS".to_vec()), Ok(text.as_bytes().to_vec())])
    }
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
struct City {
    name: String,
    country: String,
}

/// Both arguments must be the same function item.
fn same<T>(item: T, _: T) -> T {
    item
}

#[test]
fn manifest_types_are_the_module_types() {
    assert_eq!(
        TypeId::of::<conjure::Function<City>>(),
        TypeId::of::<conjure::function::Function<City>>()
    );
    assert_eq!(
        TypeId::of::<conjure::PromptFunction>(),
        TypeId::of::<conjure::prompt::r#fn::PromptFunction>()
    );
}

#[test]
fn manifest_functions_are_the_module_functions() {
    let llm = Script::new([]);

    let function = same(conjure::r#fn::<City>, conjure::function::r#fn::<City>);
    assert_eq!(function("capital", "Capital city").signature().name(), "capital");

    let prompt_fn = same(
        conjure::prompt_fn::<City>,
        conjure::prompt::r#fn::prompt_fn::<City>,
    );
    assert_eq!(prompt_fn("capital", "Capital city").signature().name(), "capital");

    let model = same(conjure::model::<City>, conjure::model::model::<City>);
    drop(model(&llm, "paris"));

    let cast = same(conjure::cast::<City>, conjure::text::cast::<City>);
    drop(cast(&llm, "paris", None));

    let extract = same(conjure::extract::<City>, conjure::text::extract::<City>);
    drop(extract(&llm, "paris and rome", None));

    let classify = same(conjure::classify, conjure::text::classify);
    drop(classify(&llm, "paris", &["city", "country"], None));

    let image = same(conjure::image, conjure::image::image);
    drop(image(&Painter, "a map"));

    let speech = same(conjure::speech, conjure::speech::speech);
    drop(speech(&Voice, "hello"));

    // Futures are dropped unpolled, so the model is never called.
    assert!(llm.requests().is_empty());
}

#[tokio::test]
async fn helpers_work_through_the_manifest() {
    init_tracing();
    let llm = Script::new([
        ("Text:\nthe city of light", r#"{"name": "Paris", "country": "France"}"#),
        ("Labels:", r#"{"index": 0}"#),
        ("Extract every", r#"[{"name": "Rome", "country": "Italy"}]"#),
    ]);

    let city: City = conjure::model(&llm, "the city of light").await.unwrap();
    assert_eq!(city.name, "Paris");

    let label = conjure::classify(&llm, "Paris", &["city", "country"], None)
        .await
        .unwrap();
    assert_eq!(*label, "city");

    let cities: Vec<City> = conjure::extract(&llm, "I flew to Rome", None).await.unwrap();
    assert_eq!(cities[0].country, "Italy");

    let image = conjure::image(&Painter, "a map").await.unwrap();
    assert!(image.data().ends_with(b"a map@1024x1024"));

    let audio = conjure::speech(&Voice, "hello").await.unwrap();
    assert_eq!(audio.data(), b"OggShello");
    assert_eq!(audio.mime().essence_str(), "audio/ogg");
}

/// Returns the sum of the two numbers.
#[ai_fn]
async fn add(a: i32, b: i32) -> i32 {}

#[ai_fn(
    rename = "summarize_text",
    description = "Summarizes the text in one sentence.",
    instructions = "Keep it under ten words."
)]
async fn summarize(text: &str) -> String {}

/// Names the capital of a country.
#[ai_fn]
async fn capital(country: String) -> City {}

/// Translates text into the target language.
#[ai_prompt]
fn translate(text: String, language: String) -> String {}

#[tokio::test]
async fn ai_fn_builds_and_calls_a_function() {
    init_tracing();
    let llm = Script::new([("Function: add", "5")]);

    let sum = add(&llm, 2, 3).await.unwrap();
    assert_eq!(sum, 5);

    let requests = llm.requests();
    let messages = requests[0].messages();
    assert_eq!(messages[0].role(), Role::System);
    assert!(messages[0].content().contains("Returns the sum of the two numbers."));
    assert!(messages[1].content().contains("a = 2\nb = 3"));
    assert!(requests[0].parameters().structured_outputs);
}

#[tokio::test]
async fn ai_fn_arguments_rename_and_instructions() {
    let llm = Script::new([("Function: summarize_text", "Rust is fast and safe.")]);

    let summary = summarize(&llm, "Rust is a systems language...").await.unwrap();
    assert_eq!(summary, "Rust is fast and safe.");

    let system = llm.requests()[0].messages()[0].content().to_string();
    assert!(system.contains("Summarizes the text in one sentence."));
    assert!(system.contains("Keep it under ten words."));
    assert!(system.contains("as plain text"));
}

#[tokio::test]
async fn ai_fn_parses_structured_returns() {
    let llm = Script::new([(
        "Function: capital",
        "Sure! {\"name\": \"Tokyo\", \"country\": \"Japan\"}",
    )]);

    let city = capital(&llm, "Japan".into()).await.unwrap();
    assert_eq!(
        city,
        City {
            name: "Tokyo".into(),
            country: "Japan".into(),
        }
    );
}

#[tokio::test]
async fn ai_fn_surfaces_parse_errors() {
    let llm = Script::new([("Function: add", "no idea")]);
    let err = add(&llm, 1, 1).await.unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
}

#[test]
fn ai_prompt_renders_without_a_model() {
    let prompt = translate("good morning".into(), "French".into()).unwrap();

    assert_eq!(prompt.name(), "translate");
    let [system, user] = prompt.messages() else {
        panic!("expected system and user messages");
    };
    assert!(system.content().contains("Translates text into the target language."));
    assert_eq!(
        user.content(),
        "Call arguments:\ntext = \"good morning\"\nlanguage = \"French\"\n\n\
         What does `translate` return?"
    );
}

#[tokio::test]
async fn settings_apply_to_helpers() {
    let script = Script::new([("Convert the data", "oops")]);
    let llm = Settings::default()
        .temperature(0.1)
        .max_tokens(64)
        .bind(&script);

    let err = conjure::cast::<u32>(&llm, "forty-two", None).await.unwrap_err();
    assert!(err.is_parse());

    let requests = script.requests();
    // One retry by default after the unparsable answer.
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].parameters().temperature, Some(0.1));
    assert_eq!(requests[1].parameters().max_tokens, Some(64));
}
