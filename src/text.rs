//! Text helpers: convert, extract, classify and synthesize data with a language model.
//!
//! Every helper is a single structured generation. Inputs can be any serializable value;
//! strings are shown to the model verbatim and everything else as pretty-printed JSON.

use std::fmt::Write as _;

use conjure_core::{
    Error, LanguageModel,
    llm::{Message, Request},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, warn};

const CAST: &str = include_str!("../prompts/cast.txt");
const EXTRACT: &str = include_str!("../prompts/extract.txt");
const CLASSIFY: &str = include_str!("../prompts/classify.txt");
const CLASSIFY_MANY: &str = include_str!("../prompts/classify_many.txt");
const GENERATE: &str = include_str!("../prompts/generate.txt");

/// Converts `data` into a `T`.
///
/// ```rust
/// use conjure::{LanguageModel, cast};
///
/// async fn to_number(llm: &impl LanguageModel) -> conjure::Result<u32> {
///     cast::<u32>(llm, "one hundred and two", None).await
/// }
/// ```
///
/// # Errors
/// Returns [`Error::Json`] if `data` cannot be serialized, otherwise any error of
/// [`LanguageModel::generate`].
pub async fn cast<T>(
    llm: &impl LanguageModel,
    data: impl Serialize,
    instructions: Option<&str>,
) -> crate::Result<T>
where
    T: JsonSchema + DeserializeOwned + 'static,
{
    let user = format!(
        "Data:\n{}\n\nConvert the data into the target type.",
        describe(&data)?
    );
    debug!(target_type = %T::schema_name(), "casting data");
    llm.generate::<T>(request(CAST, user, instructions)).await
}

/// Finds every `T` mentioned in `data`.
///
/// An empty list is a valid answer.
///
/// # Errors
/// Returns [`Error::Json`] if `data` cannot be serialized, otherwise any error of
/// [`LanguageModel::generate`].
pub async fn extract<T>(
    llm: &impl LanguageModel,
    data: impl Serialize,
    instructions: Option<&str>,
) -> crate::Result<Vec<T>>
where
    T: JsonSchema + DeserializeOwned + 'static,
{
    let user = format!(
        "Data:\n{}\n\nExtract every `{}` from the data.",
        describe(&data)?,
        T::schema_name()
    );
    debug!(target_type = %T::schema_name(), "extracting entities");
    llm.generate::<Vec<T>>(request(EXTRACT, user, instructions))
        .await
}

#[derive(Deserialize, JsonSchema)]
struct Choice {
    /// Number of the chosen label.
    index: usize,
}

#[derive(Deserialize, JsonSchema)]
struct Choices {
    /// Numbers of every label that applies.
    indices: Vec<usize>,
}

/// Picks the label from `labels` that best describes `data`.
///
/// The returned reference always points into `labels`.
///
/// ```rust
/// use conjure::{LanguageModel, classify};
///
/// async fn sentiment(llm: &impl LanguageModel) -> conjure::Result<&'static str> {
///     classify(llm, "I love this!", &["positive", "negative"], None)
///         .await
///         .copied()
/// }
/// ```
///
/// # Errors
/// - [`Error::NoLabels`] if `labels` is empty; the model is not called.
/// - [`Error::LabelOutOfRange`] if the model picks a number outside `labels`.
/// - Any error of [`LanguageModel::generate`].
pub async fn classify<'l, L: Serialize>(
    llm: &impl LanguageModel,
    data: impl Serialize,
    labels: &'l [L],
    instructions: Option<&str>,
) -> crate::Result<&'l L> {
    if labels.is_empty() {
        return Err(Error::NoLabels);
    }

    let user = format!(
        "Data:\n{}\n\nLabels:\n{}\nAnswer with the number of the best label.",
        describe(&data)?,
        enumerate(labels)?
    );
    debug!(labels = labels.len(), "classifying data");
    let choice: Choice = llm.generate(request(CLASSIFY, user, instructions)).await?;

    label_at(labels, choice.index)
}

/// Picks every label from `labels` that applies to `data`, most relevant first.
///
/// Repeated answers are kept once.
///
/// # Errors
/// Same as [`classify`].
pub async fn classify_many<'l, L: Serialize>(
    llm: &impl LanguageModel,
    data: impl Serialize,
    labels: &'l [L],
    instructions: Option<&str>,
) -> crate::Result<Vec<&'l L>> {
    if labels.is_empty() {
        return Err(Error::NoLabels);
    }

    let user = format!(
        "Data:\n{}\n\nLabels:\n{}\nAnswer with the numbers of every label that applies.",
        describe(&data)?,
        enumerate(labels)?
    );
    debug!(labels = labels.len(), "classifying data with multiple labels");
    let choices: Choices = llm
        .generate(request(CLASSIFY_MANY, user, instructions))
        .await?;

    let mut seen = Vec::with_capacity(choices.indices.len());
    for index in choices.indices {
        if !seen.contains(&index) {
            seen.push(index);
        }
    }
    seen.into_iter()
        .map(|index| label_at(labels, index))
        .collect()
}

/// Generates `n` synthetic examples of `T`.
///
/// Extra items are dropped. When the model returns fewer than `n`, the ones it returned are
/// kept and a warning is logged.
///
/// # Errors
/// Any error of [`LanguageModel::generate`].
pub async fn generate<T>(
    llm: &impl LanguageModel,
    instructions: Option<&str>,
    n: usize,
) -> crate::Result<Vec<T>>
where
    T: JsonSchema + DeserializeOwned + 'static,
{
    if n == 0 {
        return Ok(Vec::new());
    }

    let user = format!("Generate {n} examples of `{}`.", T::schema_name());
    let mut items: Vec<T> = llm
        .generate(request(GENERATE, user, instructions))
        .await?;

    if items.len() < n {
        warn!(
            requested = n,
            received = items.len(),
            "model returned fewer examples than requested"
        );
    }
    items.truncate(n);
    Ok(items)
}

fn request(system: &str, mut user: String, instructions: Option<&str>) -> Request {
    if let Some(instructions) = instructions.map(str::trim).filter(|text| !text.is_empty()) {
        let _ = write!(user, "\n\nAdditional instructions:\n{instructions}");
    }
    Request::new([Message::system(system), Message::user(user)])
}

fn describe(data: &impl Serialize) -> crate::Result<String> {
    Ok(match serde_json::to_value(data)? {
        Value::String(text) => text,
        other => serde_json::to_string_pretty(&other)?,
    })
}

fn enumerate<L: Serialize>(labels: &[L]) -> crate::Result<String> {
    let mut listing = String::new();
    for (index, label) in labels.iter().enumerate() {
        let _ = writeln!(listing, "{index}. {}", describe(label)?);
    }
    Ok(listing)
}

fn label_at<L>(labels: &[L], index: usize) -> crate::Result<&L> {
    labels.get(index).ok_or(Error::LabelOutOfRange {
        index,
        count: labels.len(),
    })
}
