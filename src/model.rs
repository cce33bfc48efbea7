//! Build typed values from free text.

use core::future::Future;

use conjure_core::{
    Error, LanguageModel,
    llm::{Message, Request},
};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use tracing::debug;

const SYSTEM: &str = include_str!("../prompts/model.txt");

/// Infers a complete `T` from a free-text description.
///
/// Fields the text implies but doesn't state are filled in by the model.
///
/// ```rust
/// use conjure::{LanguageModel, model};
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct Location {
///     city: String,
///     state: String,
///     country: String,
/// }
///
/// async fn locate(llm: &impl LanguageModel) -> conjure::Result<Location> {
///     model::<Location>(llm, "the big apple").await
/// }
/// ```
///
/// # Errors
/// Returns [`Error::Arguments`] for blank text, otherwise any error of
/// [`LanguageModel::generate`].
pub async fn model<T>(llm: &impl LanguageModel, text: &str) -> crate::Result<T>
where
    T: JsonSchema + DeserializeOwned + 'static,
{
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::arguments("model", "text must not be empty"));
    }

    debug!(target_type = %T::schema_name(), "building value from text");
    let request = Request::new([
        Message::system(SYSTEM),
        Message::user(format!("Text:\n{text}")),
    ]);
    llm.generate::<T>(request).await
}

/// Types that can be built from free text by a language model.
///
/// Implemented for every `JsonSchema + DeserializeOwned` type.
pub trait FromText: Sized {
    /// Same as [`model`].
    fn from_text<M: LanguageModel>(
        llm: &M,
        text: &str,
    ) -> impl Future<Output = crate::Result<Self>>;
}

impl<T: JsonSchema + DeserializeOwned + 'static> FromText for T {
    fn from_text<M: LanguageModel>(
        llm: &M,
        text: &str,
    ) -> impl Future<Output = crate::Result<Self>> {
        model::<T>(llm, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use futures_core::Stream;
    use serde::Deserialize;
    use std::sync::Mutex;

    #[derive(Debug, PartialEq, Eq, Deserialize, JsonSchema)]
    struct Location {
        city: String,
        country: String,
    }

    struct Canned {
        reply: &'static str,
        calls: Mutex<Vec<Request>>,
    }

    impl Canned {
        fn new(reply: &'static str) -> Self {
            Self {
                reply,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl LanguageModel for Canned {
        type Error = Infallible;

        fn respond(
            &self,
            request: Request,
        ) -> impl Stream<Item = Result<String, Self::Error>> + Send {
            self.calls.lock().unwrap().push(request);
            futures_lite::stream::iter(vec![Ok(self.reply.to_string())])
        }
    }

    #[tokio::test]
    async fn builds_struct_from_text() {
        let llm = Canned::new(r#"Here you go: {"city": "New York", "country": "US"}"#);
        let location: Location = model(&llm, "  the big apple ").await.unwrap();
        assert_eq!(
            location,
            Location {
                city: "New York".into(),
                country: "US".into(),
            }
        );

        let calls = llm.calls.lock().unwrap();
        assert_eq!(calls[0].messages()[1].content(), "Text:\nthe big apple");
    }

    #[tokio::test]
    async fn from_text_matches_model() {
        let llm = Canned::new(r#"{"city": "Paris", "country": "FR"}"#);
        let location = Location::from_text(&llm, "city of light").await.unwrap();
        assert_eq!(location.city, "Paris");
    }

    #[tokio::test]
    async fn blank_text_is_rejected() {
        let llm = Canned::new("{}");
        let err = model::<Location>(&llm, "   ").await.unwrap_err();
        assert!(matches!(err, Error::Arguments { .. }));
        assert!(llm.calls.lock().unwrap().is_empty());
    }
}
