/// Centralized helpers for WebSocket and HTTP error responses.
///
/// Use these helpers so error payloads stay consistent with the regular
/// event envelope even when serialization itself is what failed.
use actix_web::{HttpResponse, http::StatusCode};

/// Fallback payload for a client message that could not be parsed.
pub fn ws_invalid_event() -> &'static str {
    r#"{"action":"Notify","data":{"message":"Invalid event","is_error":true}}"#
}

/// Fallback payload when an outbound event failed to serialize.
pub fn ws_serialize_failure() -> &'static str {
    r#"{"action":"Notify","data":{"message":"Internal server error","is_error":true}}"#
}

/// Returns an HTTP error response with a JSON body.
pub fn http_error_response(code: &str, message: &str, status: StatusCode) -> HttpResponse {
    let body = format!(r#"{{"error":{{"code":"{}","message":"{}"}}}}"#, code, message);
    HttpResponse::build(status).content_type("application/json").body(body)
}
