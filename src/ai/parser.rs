use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use super::AiError;

lazy_static! {
    // First bracketed span, non-greedy, across lines.
    static ref JSON_ARRAY: Regex = Regex::new(r"(?s)\[.*?\]").expect("valid regex");
}

/// Pull the single text payload out of a `generateContent` response body.
///
/// The provider nests it as `candidates[0].content.parts[0].text`; any
/// missing level is a malformed response.
pub fn extract_text(body: &Value) -> Result<String, AiError> {
    let text = body
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .and_then(|parts| parts.first())
        .and_then(|part| part.get("text"))
        .and_then(Value::as_str)
        .ok_or_else(|| {
            AiError::MalformedResponse("missing candidates/content/parts/text".into())
        })?;
    Ok(text.to_string())
}

/// Extract a clean ingredient list from free-form model output.
///
/// The model is asked for a bare JSON array but routinely wraps it in
/// markdown fences or surrounding prose, so we are permissive about the
/// envelope and strict about the array itself: strip fence markers, take the
/// first `[...]` span, parse it as a JSON array of strings, then trim,
/// drop empty/single-character entries and dedupe preserving first-seen
/// order. An empty result is legitimate (everything filtered out).
pub fn parse_ingredients(text: &str) -> Result<Vec<String>, AiError> {
    let cleaned = text.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    let Some(found) = JSON_ARRAY.find(cleaned) else {
        return Err(AiError::NoStructuredData(
            truncate_chars(cleaned, 200).to_string(),
        ));
    };

    let raw: Vec<String> = serde_json::from_str(found.as_str())
        .map_err(|e| AiError::MalformedPayload(e.to_string()))?;

    let mut names: Vec<String> = Vec::with_capacity(raw.len());
    for item in raw {
        let name = item.trim();
        if name.chars().count() <= 1 {
            continue;
        }
        if !names.iter().any(|seen| seen == name) {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_text_from_well_formed_response() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "[\"tomato\"]" }] }
            }]
        });
        assert_eq!(extract_text(&body).unwrap(), "[\"tomato\"]");
    }

    #[test]
    fn extract_fails_on_empty_candidates() {
        let body = json!({ "candidates": [] });
        assert!(matches!(
            extract_text(&body),
            Err(AiError::MalformedResponse(_))
        ));
    }

    #[test]
    fn extract_fails_on_missing_text_field() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "inline_data": {} }] } }]
        });
        assert!(matches!(
            extract_text(&body),
            Err(AiError::MalformedResponse(_))
        ));
    }

    #[test]
    fn parses_fenced_array_with_duplicates_and_whitespace() {
        let names = parse_ingredients("```json\n[\"a\", \"a\", \" b \"]\n```");
        // single-char entries are dropped, so "a" disappears entirely
        assert_eq!(names.unwrap(), Vec::<String>::new());

        let names = parse_ingredients("```json\n[\"apple\", \"apple\", \" basil \"]\n```");
        assert_eq!(names.unwrap(), vec!["apple", "basil"]);
    }

    #[test]
    fn parses_array_embedded_in_prose() {
        let text = "Sure! Here are the items I found:\n[\"milk\", \"eggs\"]\nEnjoy cooking!";
        assert_eq!(parse_ingredients(text).unwrap(), vec!["milk", "eggs"]);
    }

    #[test]
    fn preserves_first_seen_order() {
        let text = "[\"rice\", \"beans\", \"rice\", \"corn\", \"beans\"]";
        assert_eq!(
            parse_ingredients(text).unwrap(),
            vec!["rice", "beans", "corn"]
        );
    }

    #[test]
    fn multi_line_array_is_found() {
        let text = "```json\n[\n  \"olive oil\",\n  \"garlic\"\n]\n```";
        assert_eq!(parse_ingredients(text).unwrap(), vec!["olive oil", "garlic"]);
    }

    #[test]
    fn no_array_fails_with_text_prefix() {
        let long_prose = "x".repeat(500);
        match parse_ingredients(&long_prose) {
            Err(AiError::NoStructuredData(prefix)) => assert_eq!(prefix.len(), 200),
            other => panic!("expected NoStructuredData, got {other:?}"),
        }
    }

    #[test]
    fn malformed_array_fails() {
        assert!(matches!(
            parse_ingredients("[\"tomato\", 42]"),
            Err(AiError::MalformedPayload(_))
        ));
        assert!(matches!(
            parse_ingredients("[not json at all]"),
            Err(AiError::MalformedPayload(_))
        ));
    }

    #[test]
    fn all_filtered_out_yields_empty_list() {
        assert_eq!(
            parse_ingredients("[\"\", \" \", \"x\"]").unwrap(),
            Vec::<String>::new()
        );
    }
}
