use loomcore::{Record, StructuredOutputError};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").unwrap())
}

/// Extract a JSON record from free-form model output.
///
/// Strategies, in order:
/// 1. parse the entire response as JSON;
/// 2. strip a triple-backtick fence (optionally tagged `json`) and parse
///    the interior;
/// 3. take the first `{` through the last `}` and parse that span.
///
/// The first strategy that yields a JSON object wins. If none do, the raw
/// text is returned inside the error for diagnostics.
pub fn extract_record(text: &str) -> Result<Record, StructuredOutputError> {
    let trimmed = text.trim();

    if let Some(record) = parse_object(trimmed) {
        return Ok(record);
    }

    if let Some(captures) = fence_re().captures(trimmed) {
        if let Some(record) = parse_object(&captures[1]) {
            return Ok(record);
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Some(record) = parse_object(&trimmed[start..=end]) {
                return Ok(record);
            }
        }
    }

    Err(StructuredOutputError::ParseFailed {
        raw: text.to_string(),
    })
}

fn parse_object(text: &str) -> Option<Record> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn whole_text_parse_wins() {
        let record = extract_record(r#"{"k": 1}"#).unwrap();
        assert_eq!(record["k"], json!(1));
    }

    #[test]
    fn fenced_block_beats_failing_full_parse() {
        let text = "Here is the result you asked for:\n```json\n{\"k\": 1}\n```\nLet me know if you need more.";
        let record = extract_record(text).unwrap();
        assert_eq!(record["k"], json!(1));
    }

    #[test]
    fn untagged_fence() {
        let record = extract_record("```\n{\"x\": true}\n```").unwrap();
        assert_eq!(record["x"], json!(true));
    }

    #[test]
    fn brace_span_fallback() {
        let text = "The answer is {\"value\": \"yes\"} as discussed.";
        let record = extract_record(text).unwrap();
        assert_eq!(record["value"], json!("yes"));
    }

    #[test]
    fn no_json_carries_raw_text() {
        let err = extract_record("just prose, no json here").unwrap_err();
        match err {
            StructuredOutputError::ParseFailed { raw } => {
                assert!(raw.contains("just prose"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_object_json_is_rejected() {
        assert!(extract_record("[1, 2, 3]").is_err());
    }
}
