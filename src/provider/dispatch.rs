//! Routes requests under the provider root to registered endpoints.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::Response,
};

use crate::cookies::Session;
use crate::endpoint::{EndpointRequest, VirtualPath};
use crate::http::response::error_response;
use crate::provider::ProviderContext;

/// Largest request body handed to an endpoint.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Main provider handler.
/// Looks up the endpoint by virtual path and lets it answer.
pub async fn provider_handler(
    State(ctx): State<Arc<ProviderContext>>,
    request: Request<Body>,
) -> Response {
    let vpath = VirtualPath::from_request_path(request.uri().path());

    let Some(entry) = ctx.registry().lookup(&vpath) else {
        tracing::debug!(path = %request.uri().path(), "No endpoint matched");
        return error_response(StatusCode::NOT_FOUND, "not_found", "no such endpoint");
    };
    let handler = Arc::clone(entry.handler());

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(endpoint = %handler.name(), error = %e, "Failed to read request body");
            return error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                "invalid_request",
                "request body too large",
            );
        }
    };

    tracing::debug!(
        endpoint = %handler.name(),
        method = %parts.method,
        vpath = %vpath,
        "Dispatching to endpoint"
    );

    let endpoint_request = EndpointRequest {
        session: parts.extensions.get::<Session>().cloned(),
        method: parts.method,
        uri: parts.uri,
        headers: parts.headers,
        body,
    };
    handler.handle(&ctx, endpoint_request)
}
