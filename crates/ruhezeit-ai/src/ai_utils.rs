//! Helpers shared by the capability wrappers.

use serde_json::Value;

/// Fields a capability response may carry its text in, checked in order
const RESPONSE_FIELDS: [&str; 4] = ["result", "summary", "draft", "translated"];

/// Normalize user text before it is sent to a capability
#[must_use]
pub fn prepare_prompt(text: &str) -> String {
    text.trim().to_string()
}

/// Extract the text of a capability response
///
/// Strings pass through, objects yield their first known text field, and
/// anything else is rendered as JSON. `null` has no text.
#[must_use]
pub fn parse_ai_response(response: &Value) -> Option<String> {
    match response {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Object(map) => RESPONSE_FIELDS
            .iter()
            .find_map(|field| map.get(*field).filter(|v| !v.is_null()))
            .map_or_else(|| Some(response.to_string()), parse_ai_response),
        other => Some(other.to_string()),
    }
}

/// Normalize raw provider output, unwrapping JSON envelopes some models emit
#[must_use]
pub fn normalize_response(raw: &str) -> String {
    let clean = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    match serde_json::from_str::<Value>(clean) {
        Ok(value @ Value::Object(_)) => parse_ai_response(&value).unwrap_or_default(),
        _ => raw.trim().to_string(),
    }
}

/// Take at most `max_chars` characters without splitting UTF-8 sequences
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prepare_prompt_trims() {
        assert_eq!(prepare_prompt("  hello \n"), "hello");
        assert_eq!(prepare_prompt(""), "");
    }

    #[test]
    fn test_parse_string_passes_through() {
        assert_eq!(parse_ai_response(&json!("text")), Some("text".to_string()));
    }

    #[test]
    fn test_parse_null_has_no_text() {
        assert_eq!(parse_ai_response(&Value::Null), None);
    }

    #[test]
    fn test_parse_object_field_priority() {
        let resp = json!({ "summary": "s", "result": "r" });
        assert_eq!(parse_ai_response(&resp), Some("r".to_string()));

        let resp = json!({ "draft": "d" });
        assert_eq!(parse_ai_response(&resp), Some("d".to_string()));
    }

    #[test]
    fn test_parse_object_without_known_field_renders_json() {
        let resp = json!({ "other": 1 });
        assert_eq!(parse_ai_response(&resp), Some("{\"other\":1}".to_string()));
    }

    #[test]
    fn test_normalize_unwraps_fenced_json() {
        let raw = "```json\n{\"summary\": \"Read docs\"}\n```";
        assert_eq!(normalize_response(raw), "Read docs");
    }

    #[test]
    fn test_normalize_keeps_plain_text() {
        assert_eq!(normalize_response("  plain answer "), "plain answer");
    }

    #[test]
    fn test_truncate_chars_is_utf8_safe() {
        assert_eq!(truncate_chars("\u{4f60}\u{597d}\u{4e16}\u{754c}", 2), "\u{4f60}\u{597d}");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
