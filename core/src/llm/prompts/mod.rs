/// System prompt appended when a provider has no native structured generation.
pub fn structured(schema: &str) -> String {
    format!(
        r#"Answer with a single JSON value that validates against this JSON schema:

{schema}

Rules:
- Output the JSON value and nothing else: no prose, no markdown fences, no comments
- Include every required property with the type the schema declares
- Do not invent properties the schema does not allow
- Strings must be valid JSON strings with escaped quotes and newlines"#
    )
}
