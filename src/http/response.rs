//! Response helpers shared by endpoints and the dispatcher.
//!
//! Textual bodies always declare `charset=utf-8`.

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_JRD_JSON: &str = "application/jrd+json";

/// Serialize `value` as a JSON response with the given media type.
pub fn json_response<T: Serialize>(status: StatusCode, content_type: &str, value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => {
            let mut response = (status, Body::from(body)).into_response();
            if let Ok(ct) = HeaderValue::from_str(&format!("{content_type}; charset=utf-8")) {
                response.headers_mut().insert(header::CONTENT_TYPE, ct);
            }
            response
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response body");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// OAuth 2.0 style error body: `{"error": ..., "error_description": ...}`.
pub fn error_response(status: StatusCode, error: &str, description: &str) -> Response {
    json_response(
        status,
        APPLICATION_JSON,
        &json!({ "error": error, "error_description": description }),
    )
}

/// `405` for endpoints that only answer GET/HEAD.
pub fn method_not_allowed() -> Response {
    let mut response = error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        "invalid_request",
        "method not allowed",
    );
    response
        .headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static("GET, HEAD"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_response_sets_utf8_content_type() {
        let response = json_response(StatusCode::OK, APPLICATION_JSON, &json!({"a": 1}));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json; charset=utf-8"
        );
    }

    #[test]
    fn method_not_allowed_lists_methods() {
        let response = method_not_allowed();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, HEAD");
    }
}
