/// Response envelope normalization
///
/// The backend answers list endpoints with a bare JSON array, or with an
/// object that carries the array under one of a few keys, or with
/// `{ok:false, error}`. Everything that sniffs those shapes lives here so the
/// rest of the crate only ever sees `Vec<Value>` or an `ApiError`.

use serde_json::Value;

use crate::logging::{self, Endpoint};
use crate::model::{ApiError, ShapeError};

/// Keys tried, in order, when the body is an object.
pub const ENVELOPE_KEYS: &[&str] = &["data", "rows", "result", "history"];

/// Characters of body kept on an HTTP error.
pub const HTTP_EXCERPT_CHARS: usize = 160;
/// Characters of body kept when the body is not (valid) JSON.
pub const JSON_EXCERPT_CHARS: usize = 80;

pub fn excerpt(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}

pub fn is_json_content_type(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("json")
}

/// Checks status and content type, then parses the body as JSON.
pub fn parse_json_body(
    status: u16,
    content_type: &str,
    body: &str,
    url: &str,
) -> Result<Value, ApiError> {
    if !(200..300).contains(&status) {
        return Err(ApiError::Http {
            status,
            url: url.to_string(),
            body_excerpt: excerpt(body, HTTP_EXCERPT_CHARS),
        });
    }

    if !is_json_content_type(content_type) {
        return Err(ApiError::NotJson {
            content_type: content_type.to_string(),
            excerpt: excerpt(body, JSON_EXCERPT_CHARS),
        });
    }

    serde_json::from_str(body)
        .map_err(|_| ShapeError::InvalidJson(excerpt(body, JSON_EXCERPT_CHARS)).into())
}

/// Rejects `{ok:false}` envelopes with the backend's own message.
pub fn check_logical(json: &Value) -> Result<(), ApiError> {
    if json.get("ok").and_then(Value::as_bool) == Some(false) {
        let msg = json
            .get("error")
            .or_else(|| json.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("Request failed");
        return Err(ApiError::Logical(msg.to_string()));
    }
    Ok(())
}

/// Pulls the record list out of an already-parsed body.
pub fn extract_list(json: Value) -> Result<Vec<Value>, ApiError> {
    check_logical(&json)?;

    match json {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => {
            for key in ENVELOPE_KEYS {
                if matches!(map.get(*key), Some(Value::Array(_))) {
                    if let Some(Value::Array(items)) = map.remove(*key) {
                        return Ok(items);
                    }
                }
            }
            Err(ShapeError::NoArrayEnvelope.into())
        }
        _ => Err(ShapeError::NoArrayEnvelope.into()),
    }
}

/// Full pipeline for a list endpoint.
pub fn parse_envelope(
    status: u16,
    content_type: &str,
    body: &str,
    url: &str,
) -> Result<Vec<Value>, ApiError> {
    extract_list(parse_json_body(status, content_type, body, url)?)
}

/// Degrades a shape problem to "no data", logging it once. Transport and
/// HTTP failures pass through for the caller to surface.
pub fn unwrap_list(
    source: Endpoint,
    result: Result<Vec<Value>, ApiError>,
) -> Result<Vec<Value>, ApiError> {
    match result {
        Err(e) if e.is_shape() => {
            logging::warn(source, None, &format!("treating response as empty: {}", e));
            Ok(Vec::new())
        }
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = "application/json; charset=utf-8";

    #[test]
    fn test_bare_array() {
        let out = parse_envelope(200, JSON, r#"[{"tank_no":"A"},{"tank_no":"B"}]"#, "/x").unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_envelope_keys_in_order() {
        let out = parse_envelope(200, JSON, r#"{"ok":true,"data":[1,2,3]}"#, "/x").unwrap();
        assert_eq!(out.len(), 3);

        let out = parse_envelope(200, JSON, r#"{"rows":[1]}"#, "/x").unwrap();
        assert_eq!(out.len(), 1);

        let out = parse_envelope(200, JSON, r#"{"result":[1,2]}"#, "/x").unwrap();
        assert_eq!(out.len(), 2);

        let out = parse_envelope(200, JSON, r#"{"tank_no":"A","history":[1]}"#, "/x").unwrap();
        assert_eq!(out.len(), 1);

        // A non-array "data" does not shadow a later array key.
        let out = parse_envelope(200, JSON, r#"{"data":{"n":1},"rows":[1,2]}"#, "/x").unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_no_array_is_shape_error() {
        let err = parse_envelope(200, JSON, r#"{"count":3}"#, "/x").unwrap_err();
        assert_eq!(err, ApiError::Shape(ShapeError::NoArrayEnvelope));

        let err = parse_envelope(200, JSON, "42", "/x").unwrap_err();
        assert!(err.is_shape());
    }

    #[test]
    fn test_invalid_json_is_shape_error() {
        let err = parse_envelope(200, JSON, "{not json", "/x").unwrap_err();
        assert_eq!(err, ApiError::Shape(ShapeError::InvalidJson("{not json".to_string())));
    }

    #[test]
    fn test_http_error_keeps_status_and_excerpt() {
        let body = "x".repeat(500);
        let err = parse_envelope(503, "text/html", &body, "http://h/api/tank-current/all").unwrap_err();
        match err {
            ApiError::Http { status, url, body_excerpt } => {
                assert_eq!(status, 503);
                assert_eq!(url, "http://h/api/tank-current/all");
                assert_eq!(body_excerpt.chars().count(), HTTP_EXCERPT_CHARS);
            }
            other => panic!("expected Http, got {:?}", other),
        }
    }

    #[test]
    fn test_non_json_content_type() {
        let err = parse_envelope(200, "text/html", "<html>login</html>", "/x").unwrap_err();
        assert_eq!(
            err,
            ApiError::NotJson {
                content_type: "text/html".to_string(),
                excerpt: "<html>login</html>".to_string(),
            }
        );
        assert!(!err.is_shape(), "a non-JSON page is a hard error, not empty data");
    }

    #[test]
    fn test_logical_error() {
        let err = parse_envelope(200, JSON, r#"{"ok":false,"error":"db down"}"#, "/x").unwrap_err();
        assert_eq!(err, ApiError::Logical("db down".to_string()));
    }

    #[test]
    fn test_excerpt_counts_chars_not_bytes() {
        assert_eq!(excerpt("ñññ", 2), "ññ");
        assert_eq!(excerpt("ab", 80), "ab");
    }

    #[test]
    fn test_unwrap_list_degrades_only_shape_errors() {
        let empty = unwrap_list(Endpoint::Tanks, Err(ShapeError::NoArrayEnvelope.into())).unwrap();
        assert!(empty.is_empty());

        let net = unwrap_list(Endpoint::Tanks, Err(ApiError::Network("down".to_string())));
        assert!(net.is_err(), "network errors must reach the caller");
    }
}
