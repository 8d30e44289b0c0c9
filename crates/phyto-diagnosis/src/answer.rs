//! Reading the disease name out of an AI answer.

use serde_json::Value;

const NAME_KEYS: [&str; 3] = ["disease_name", "diseaseName", "name"];

/// Disease name from AI content.
///
/// Prefers a JSON object (bare or inside a Markdown code fence) with one of
/// `disease_name`, `diseaseName` or `name`; otherwise takes the first
/// non-empty line with Markdown decoration trimmed.
#[must_use]
pub fn disease_name(content: &str) -> Option<String> {
    if let Some(name) = json_object(content).as_ref().and_then(name_field) {
        return Some(name);
    }
    content
        .lines()
        .map(|line| line.trim().trim_matches(|c: char| matches!(c, '#' | '*' | '-' | '`' | '>')).trim())
        .find(|line| !line.is_empty() && !line.starts_with('{'))
        .map(ToString::to_string)
}

fn json_object(content: &str) -> Option<Value> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str::<Value>(&content[start..=end])
        .ok()
        .filter(Value::is_object)
}

fn name_field(object: &Value) -> Option<String> {
    NAME_KEYS
        .iter()
        .filter_map(|key| object.get(key).and_then(Value::as_str))
        .map(str::trim)
        .find(|name| !name.is_empty())
        .map(ToString::to_string)
}
