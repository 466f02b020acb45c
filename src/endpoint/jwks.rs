//! Publishes the issuer's public key set.

use axum::http::{Method, StatusCode};
use axum::response::Response;

use crate::config::EndpointKind;
use crate::endpoint::{Endpoint, EndpointRequest};
use crate::http::response::{json_response, method_not_allowed, APPLICATION_JSON};
use crate::provider::ProviderContext;

#[derive(Debug, Clone)]
pub struct JwksEndpoint {
    name: String,
    path: String,
}

impl JwksEndpoint {
    pub fn new(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
        }
    }
}

impl Endpoint for JwksEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EndpointKind {
        EndpointKind::Jwks
    }

    fn endpoint_path(&self) -> &str {
        &self.path
    }

    fn handle(&self, ctx: &ProviderContext, request: EndpointRequest) -> Response {
        if request.method != Method::GET && request.method != Method::HEAD {
            return method_not_allowed();
        }
        let jwks = ctx.keys().export_jwks(ctx.issuer(), false);
        json_response(StatusCode::OK, APPLICATION_JSON, &jwks)
    }
}
