//! Placeholder for endpoints whose protocol logic lives outside this crate.

use axum::http::StatusCode;
use axum::response::Response;

use crate::config::EndpointKind;
use crate::endpoint::{Endpoint, EndpointRequest};
use crate::http::response::error_response;
use crate::provider::ProviderContext;

/// Holds an endpoint's place in the registry (and its advertised URL in
/// discovery) until a collaborator installs the real handler.
#[derive(Debug, Clone)]
pub struct DelegatedEndpoint {
    name: String,
    kind: EndpointKind,
    path: String,
}

impl DelegatedEndpoint {
    pub fn new(name: &str, kind: EndpointKind, path: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            path: path.to_string(),
        }
    }
}

impl Endpoint for DelegatedEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EndpointKind {
        self.kind
    }

    fn endpoint_path(&self) -> &str {
        &self.path
    }

    fn handle(&self, _ctx: &ProviderContext, request: EndpointRequest) -> Response {
        tracing::warn!(
            endpoint = %self.name,
            method = %request.method,
            "Request for endpoint without an installed handler"
        );
        error_response(
            StatusCode::NOT_IMPLEMENTED,
            "temporarily_unavailable",
            &format!("{} endpoint is not available", self.name),
        )
    }
}
