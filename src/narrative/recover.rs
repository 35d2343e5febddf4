//! Recovery of a structured narrative from free-form model output.
//!
//! Models often wrap the requested JSON in commentary or code fences.
//! [`extract_json_object`] narrows the text to the first balanced
//! `{...}` span and [`parse_narrative`] enforces the three-field shape.

use crate::error::GenerationError;
use crate::models::NarrativeResult;

/// Find the first balanced top-level `{...}` span.
///
/// Braces inside JSON strings are ignored. An opening brace that never
/// closes is skipped and the search resumes at the next one. Returns
/// `None` when no balanced span exists.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        if let Some(end) = balanced_end(&text[start..]) {
            return Some(&text[start..start + end]);
        }
        search_from = start + 1;
    }

    None
}

/// Byte length of the balanced span starting at `text[0] == '{'`.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
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
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + ch.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse a raw model response into a narrative.
pub fn parse_narrative(raw: &str) -> Result<NarrativeResult, GenerationError> {
    let candidate = extract_json_object(raw)
        .ok_or_else(|| GenerationError::new("response contained no JSON object"))?;

    serde_json::from_str(candidate)
        .map_err(|e| GenerationError::new(format!("malformed narrative JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{"analysis": "Loose passive.", "tendencies": ["limps"], "exploits": ["iso-raise"]}"#;

    #[test]
    fn test_extract_plain_object() {
        assert_eq!(extract_json_object(VALID), Some(VALID));
    }

    #[test]
    fn test_extract_from_surrounding_prose() {
        let text = format!("Sure! Here is the profile:\n{}\nHope this helps {{:", VALID);
        assert_eq!(extract_json_object(&text), Some(VALID));
    }

    #[test]
    fn test_extract_from_code_fence() {
        let text = format!("```json\n{}\n```", VALID);
        assert_eq!(extract_json_object(&text), Some(VALID));
    }

    #[test]
    fn test_extract_ignores_braces_in_strings() {
        let text = r#"{"analysis": "uses {weird} } text \" {", "tendencies": [], "exploits": []} trailing }"#;
        let span = extract_json_object(text).unwrap();
        assert!(span.ends_with("\"exploits\": []}"));
    }

    #[test]
    fn test_extract_nested_objects() {
        let text = r#"x {"a": {"b": {"c": 1}}} y"#;
        assert_eq!(extract_json_object(text), Some(r#"{"a": {"b": {"c": 1}}}"#));
    }

    #[test]
    fn test_extract_skips_unclosed_brace() {
        let text = r#"Note: { is never closed... {"a": 1}"#;
        // The first brace swallows the rest; the second one balances.
        assert_eq!(extract_json_object(text), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn test_extract_none() {
        assert_eq!(extract_json_object("I cannot help with that."), None);
        assert_eq!(extract_json_object("} backwards {"), None);
        assert_eq!(extract_json_object(""), None);
    }

    #[test]
    fn test_parse_wrapped_response() {
        let raw = format!("Here you go:\n\n{}\n\nLet me know!", VALID);
        let narrative = parse_narrative(&raw).unwrap();
        assert_eq!(narrative.analysis, "Loose passive.");
        assert_eq!(narrative.tendencies, vec!["limps"]);
        assert_eq!(narrative.exploits, vec!["iso-raise"]);
    }

    #[test]
    fn test_parse_refusal_fails() {
        let err = parse_narrative("I'm sorry, I can't analyze people.").unwrap_err();
        assert!(err.message.contains("no JSON object"));
        assert_eq!(err.status, None);
    }

    #[test]
    fn test_parse_missing_key_fails() {
        let err = parse_narrative(r#"{"analysis": "x", "tendencies": []}"#).unwrap_err();
        assert!(err.message.contains("exploits"));
    }

    #[test]
    fn test_parse_wrong_shape_fails() {
        assert!(parse_narrative(r#"{"analysis": "x", "tendencies": "limps", "exploits": []}"#).is_err());
        assert!(parse_narrative(r#"{"analysis": 5, "tendencies": [], "exploits": []}"#).is_err());
        assert!(parse_narrative(r#"{"analysis": "x", "tendencies": [1], "exploits": []}"#).is_err());
    }

    #[test]
    fn test_parse_malformed_json_fails() {
        assert!(parse_narrative(r#"{"analysis": "x", tendencies: []}"#).is_err());
    }
}
