//! Lenient extraction of JSON from model output.
//!
//! Models wrap JSON in prose or Markdown fences more often than not, even
//! when asked for raw JSON. Lookup order: a ```json fence, then any fence
//! whose body opens with a brace or bracket, then the first balanced
//! `{...}` object in the text.

use serde::de::DeserializeOwned;

use crate::backend::LlmError;

/// Slice of `text` holding the JSON payload, if one can be located.
pub fn extract_json(text: &str) -> Option<&str> {
    if let Some(body) = fenced(text, "```json") {
        return Some(body);
    }
    if let Some(body) = fenced(text, "```") {
        if body.starts_with('{') || body.starts_with('[') {
            return Some(body);
        }
    }
    balanced_object(text)
}

pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let payload = extract_json(text)
        .ok_or_else(|| LlmError::MalformedResponse("no JSON object in model output".to_string()))?;
    serde_json::from_str(payload).map_err(|e| LlmError::MalformedResponse(format!("invalid JSON: {e}")))
}

/// Coerce a field into a list of non-empty strings. Accepts an array of
/// strings, an array of objects with a `text`/`name`/`title` field, or a
/// single string.
pub fn string_list(value: &serde_json::Value) -> Vec<String> {
    let items: Vec<String> = match value {
        serde_json::Value::String(s) => vec![s.clone()],
        serde_json::Value::Array(arr) => arr
            .iter()
            .filter_map(|v| match v {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Object(obj) => ["text", "name", "title"]
                    .iter()
                    .find_map(|k| obj.get(*k).and_then(|x| x.as_str()))
                    .map(str::to_string),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn fenced<'a>(text: &'a str, opener: &str) -> Option<&'a str> {
    let start = text.find(opener)? + opener.len();
    let rest = &text[start..];
    let end = rest.find("```")?;
    let body = rest[..end].trim();
    (!body.is_empty()).then_some(body)
}

fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
