//! Structured payload extraction from free-text agent replies.
//!
//! Role replies are chat text with a JSON object embedded somewhere inside.
//! The extraction rule is deliberately simple: the span from the first `{`
//! to the *last* `}` in the reply. Nested or multiple objects are never
//! distinguished: callers get one merged span and must validate
//! required-field completeness before treating it as usable.
//!
//! A missing or malformed object is a recoverable condition (the turn is
//! incomplete and gets retried), never a fatal one.

use serde::de::DeserializeOwned;

/// Why extraction failed. Both variants are recoverable.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The text contains no `{...}` span at all.
    #[error("no payload found")]
    NoObject,

    /// A span was found but did not parse, or parsed without required fields.
    #[error("payload did not match the expected schema: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Return the substring spanning the first `{` to the last `}`.
///
/// `None` when either brace is absent or the last `}` precedes the
/// first `{`. The span is authoritative: no bracket balancing, no
/// smallest-object search.
pub fn extract_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

/// Extract the first-to-last-brace span and parse it into `T`.
pub fn extract_payload<T: DeserializeOwned>(text: &str) -> Result<T, ExtractError> {
    let span = extract_object(text).ok_or(ExtractError::NoObject)?;
    Ok(serde_json::from_str(span)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_extracts_plain_object() {
        let text = r#"{"a": 1}"#;
        assert_eq!(extract_object(text), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn test_extracts_object_with_surrounding_prose() {
        let text = "Here is my analysis:\n{\"a\": 1}\nLet me know.";
        assert_eq!(extract_object(text), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_no_braces_is_none() {
        assert_eq!(extract_object("no json here"), None);
        assert_eq!(extract_object(""), None);
    }

    #[test]
    fn test_only_open_brace_is_none() {
        assert_eq!(extract_object("dangling {"), None);
    }

    #[test]
    fn test_close_before_open_is_none() {
        assert_eq!(extract_object("} then {"), None);
    }

    #[test]
    fn test_multiple_objects_merge_into_one_span() {
        // First-{ to last-} swallows both objects; the merged span is
        // returned even though it is not itself valid JSON.
        let text = r#"{"a": 1} and {"b": 2}"#;
        assert_eq!(extract_object(text), Some(r#"{"a": 1} and {"b": 2}"#));
        assert!(extract_payload::<Value>(text).is_err());
    }

    #[test]
    fn test_nested_object_parses_as_whole() {
        let text = r#"result: {"outer": {"inner": 2}}"#;
        let v: Value = extract_payload(text).unwrap();
        assert_eq!(v["outer"]["inner"], 2);
    }

    #[test]
    fn test_malformed_span_is_recoverable_error() {
        let err = extract_payload::<Value>("{not json}").unwrap_err();
        assert!(matches!(err, ExtractError::Malformed(_)));
    }

    #[test]
    fn test_no_object_error_message() {
        let err = extract_payload::<Value>("plain text").unwrap_err();
        assert_eq!(err.to_string(), "no payload found");
    }
}
