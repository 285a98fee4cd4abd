//! Image payload extraction from upstream responses.
//!
//! The upstream API has returned the encoded image in several shapes over
//! time: a top-level `base64` field, the first entry of an `artifacts` list,
//! or somewhere deeper in a nested document. Extraction tries, in order:
//!
//! 1. the top-level `base64` field
//! 2. `artifacts[0].base64`
//! 3. a recursive search for any `base64` field
//! 4. a recursive search for the longest base64-looking string
//!
//! Both recursive searches stop at `max_depth` levels of nesting.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{Map, Value};

use crate::error::TrainerError;

/// Default nesting limit for the recursive searches.
pub const DEFAULT_MAX_DEPTH: usize = 20;

/// A payload must be longer than this to be considered an image.
pub const MIN_PAYLOAD_LEN: usize = 100;

const PAYLOAD_KEY: &str = "base64";
const ARTIFACTS_KEY: &str = "artifacts";
const DEFAULT_FINISH_REASON: &str = "SUCCESS";

/// Which strategy located the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractStrategy {
    TopLevel,
    Artifacts,
    NamedSearch,
    LongestString,
}

/// An encoded payload found in a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPayload {
    pub data: String,
    pub finish_reason: String,
    pub strategy: ExtractStrategy,
}

/// Strip a `data:<mime>;base64,` prefix if present.
fn strip_data_uri(s: &str) -> &str {
    if s.starts_with("data:") {
        if let Some((_, rest)) = s.split_once(',') {
            return rest;
        }
    }
    s
}

/// Whether `s` looks like an encoded image: long enough and made only of
/// base64 alphabet characters.
pub fn is_plausible_payload(s: &str) -> bool {
    let s = strip_data_uri(s);
    s.len() > MIN_PAYLOAD_LEN
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'=')
}

fn finish_reason_of(obj: &Map<String, Value>) -> String {
    obj.get("finish_reason")
        .or_else(|| obj.get("finishReason"))
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_FINISH_REASON)
        .to_string()
}

fn plausible_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| is_plausible_payload(s))
}

/// Locate the encoded image in a response body.
pub fn extract_payload(body: &Value, max_depth: usize) -> Option<ExtractedPayload> {
    if let Value::Object(root) = body {
        if let Some(data) = plausible_field(root, PAYLOAD_KEY) {
            return Some(ExtractedPayload {
                data: data.to_string(),
                finish_reason: finish_reason_of(root),
                strategy: ExtractStrategy::TopLevel,
            });
        }

        let first_artifact = root
            .get(ARTIFACTS_KEY)
            .and_then(Value::as_array)
            .and_then(|artifacts| artifacts.first())
            .and_then(Value::as_object);
        if let Some(artifact) = first_artifact {
            if let Some(data) = plausible_field(artifact, PAYLOAD_KEY) {
                return Some(ExtractedPayload {
                    data: data.to_string(),
                    finish_reason: finish_reason_of(artifact),
                    strategy: ExtractStrategy::Artifacts,
                });
            }
        }
    }

    if let Some((data, finish_reason)) = find_named(body, PAYLOAD_KEY, 0, max_depth) {
        return Some(ExtractedPayload {
            data,
            finish_reason,
            strategy: ExtractStrategy::NamedSearch,
        });
    }

    let mut longest: Option<&str> = None;
    find_longest(body, 0, max_depth, &mut longest);
    longest.map(|data| ExtractedPayload {
        data: data.to_string(),
        finish_reason: DEFAULT_FINISH_REASON.to_string(),
        strategy: ExtractStrategy::LongestString,
    })
}

fn find_named(value: &Value, key: &str, depth: usize, max_depth: usize) -> Option<(String, String)> {
    if depth > max_depth {
        return None;
    }
    match value {
        Value::Object(obj) => {
            for (k, v) in obj {
                if k == key {
                    if let Some(s) = v.as_str().filter(|s| is_plausible_payload(s)) {
                        return Some((s.to_string(), finish_reason_of(obj)));
                    }
                }
                if v.is_object() || v.is_array() {
                    if let Some(found) = find_named(v, key, depth + 1, max_depth) {
                        return Some(found);
                    }
                }
            }
            None
        }
        Value::Array(items) => items
            .iter()
            .find_map(|v| find_named(v, key, depth + 1, max_depth)),
        _ => None,
    }
}

fn find_longest<'a>(value: &'a Value, depth: usize, max_depth: usize, best: &mut Option<&'a str>) {
    if depth > max_depth {
        return;
    }
    match value {
        Value::String(s) => {
            if is_plausible_payload(s) && best.map_or(true, |b| s.len() > b.len()) {
                *best = Some(s.as_str());
            }
        }
        Value::Object(obj) => {
            for v in obj.values() {
                find_longest(v, depth + 1, max_depth, best);
            }
        }
        Value::Array(items) => {
            for v in items {
                find_longest(v, depth + 1, max_depth, best);
            }
        }
        _ => {}
    }
}

/// Decode an extracted payload into raw image bytes.
pub fn decode_payload(data: &str) -> Result<Vec<u8>, TrainerError> {
    BASE64
        .decode(strip_data_uri(data).trim())
        .map_err(|e| TrainerError::DecodeError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> String {
        BASE64.encode(vec![0x89u8; 200])
    }

    fn nest(value: Value, levels: usize) -> Value {
        (0..levels).fold(value, |inner, _| json!({ "wrapper": inner }))
    }

    #[test]
    fn top_level_field() {
        let body = json!({ "base64": payload(), "finish_reason": "CONTENT_FILTERED" });
        let found = extract_payload(&body, DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(found.strategy, ExtractStrategy::TopLevel);
        assert_eq!(found.data, payload());
        assert_eq!(found.finish_reason, "CONTENT_FILTERED");
    }

    #[test]
    fn artifacts_field() {
        let body = json!({ "artifacts": [{ "base64": payload(), "finishReason": "SUCCESS" }] });
        let found = extract_payload(&body, DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(found.strategy, ExtractStrategy::Artifacts);
        assert_eq!(found.data, payload());
    }

    #[test]
    fn nested_named_field() {
        let body = json!({ "result": { "images": [{ "meta": {}, "base64": payload() }] } });
        let found = extract_payload(&body, DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(found.strategy, ExtractStrategy::NamedSearch);
        assert_eq!(found.data, payload());
    }

    #[test]
    fn same_payload_regardless_of_shape() {
        let shapes = [
            json!({ "base64": payload() }),
            json!({ "artifacts": [{ "base64": payload() }] }),
            json!({ "data": { "output": [{ "base64": payload() }] } }),
        ];
        for body in &shapes {
            let first = extract_payload(body, DEFAULT_MAX_DEPTH).unwrap();
            let second = extract_payload(body, DEFAULT_MAX_DEPTH).unwrap();
            assert_eq!(first, second);
            assert_eq!(first.data, payload());
        }
    }

    #[test]
    fn longest_unnamed_string() {
        let short = "A".repeat(150);
        let long = "B".repeat(400);
        let body = json!({ "x": [short, { "y": long.clone() }], "note": "not base64 at all!" });
        let found = extract_payload(&body, DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(found.strategy, ExtractStrategy::LongestString);
        assert_eq!(found.data, long);
    }

    #[test]
    fn short_or_non_alphabet_values_are_ignored() {
        let body = json!({ "base64": "abc", "message": "x".repeat(50) });
        assert!(extract_payload(&body, DEFAULT_MAX_DEPTH).is_none());

        let body = json!({ "base64": format!("{}!!", "A".repeat(200)) });
        assert!(extract_payload(&body, DEFAULT_MAX_DEPTH).is_none());
    }

    #[test]
    fn search_depth_is_bounded() {
        let shallow = nest(json!({ "base64": payload() }), 5);
        assert!(extract_payload(&shallow, 10).is_some());

        let deep = nest(json!({ "base64": payload() }), 30);
        assert!(extract_payload(&deep, DEFAULT_MAX_DEPTH).is_none());
        assert!(extract_payload(&deep, 40).is_some());
    }

    #[test]
    fn empty_and_scalar_bodies() {
        assert!(extract_payload(&json!({}), DEFAULT_MAX_DEPTH).is_none());
        assert!(extract_payload(&json!(null), DEFAULT_MAX_DEPTH).is_none());
        assert!(extract_payload(&json!({ "artifacts": [] }), DEFAULT_MAX_DEPTH).is_none());
    }

    #[test]
    fn decode_strips_data_uri() {
        let bytes = vec![1u8, 2, 3, 4, 5];
        let encoded = format!("data:image/png;base64,{}", BASE64.encode(&bytes));
        assert_eq!(decode_payload(&encoded).unwrap(), bytes);
    }

    #[test]
    fn decode_failure_is_decode_error() {
        // Valid alphabet, invalid length.
        let err = decode_payload(&"A".repeat(101)).unwrap_err();
        assert!(matches!(err, TrainerError::DecodeError(_)));
    }
}
