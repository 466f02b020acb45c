//! Protocol endpoints and their routing table.
//!
//! # Data Flow
//! ```text
//! server_info.endpoint.<name> { path, kind }
//!     → builtin() picks a handler for the kind
//!     → path.rs derives the virtual path from the advertised path
//!     → registry.rs indexes handlers by virtual path
//!     → provider dispatch looks requests up by their own virtual path
//! ```
//!
//! Discovery, JWKS and WebFinger are answered here. Authorization, token,
//! userinfo, registration and end-session belong to protocol collaborators;
//! until one is installed they answer `501`.

pub mod delegated;
pub mod discovery;
pub mod jwks;
pub mod path;
pub mod registry;

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, Uri};
use axum::response::Response;

use crate::config::EndpointKind;
use crate::cookies::Session;
use crate::provider::ProviderContext;

pub use delegated::DelegatedEndpoint;
pub use discovery::{ProviderConfigEndpoint, WebfingerEndpoint};
pub use jwks::JwksEndpoint;
pub use path::{virtual_path, VirtualPath};
pub use registry::{EndpointRegistry, RegisteredEndpoint, RegistryError};

/// A request as seen by an endpoint.
#[derive(Debug, Clone)]
pub struct EndpointRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub session: Option<Session>,
}

impl EndpointRequest {
    /// Decoded query string parameters, in order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.uri
            .query()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query_pairs()
            .into_iter()
            .find_map(|(k, v)| (k == name).then_some(v))
    }
}

/// A protocol endpoint mounted under the provider root.
pub trait Endpoint: Send + Sync {
    /// Configured endpoint name.
    fn name(&self) -> &str;

    fn kind(&self) -> EndpointKind;

    /// Advertised path, as configured (absolute URL or path).
    fn endpoint_path(&self) -> &str;

    fn handle(&self, ctx: &ProviderContext, request: EndpointRequest) -> Response;
}

/// The handler this crate provides for an endpoint kind.
pub fn builtin(name: &str, kind: EndpointKind, path: &str) -> Arc<dyn Endpoint> {
    match kind {
        EndpointKind::ProviderConfig => Arc::new(ProviderConfigEndpoint::new(name, path)),
        EndpointKind::Jwks => Arc::new(JwksEndpoint::new(name, path)),
        EndpointKind::Webfinger => Arc::new(WebfingerEndpoint::new(name, path)),
        EndpointKind::Authorization
        | EndpointKind::Token
        | EndpointKind::Userinfo
        | EndpointKind::Registration
        | EndpointKind::EndSession => Arc::new(DelegatedEndpoint::new(name, kind, path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_params_are_decoded() {
        let request = EndpointRequest {
            method: Method::GET,
            uri: "/.well-known/webfinger?resource=acct%3Aalice%40op.example&rel=x"
                .parse()
                .unwrap(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            session: None,
        };
        assert_eq!(
            request.query_param("resource").as_deref(),
            Some("acct:alice@op.example")
        );
        assert!(request.query_param("missing").is_none());
    }

    #[test]
    fn builtin_matches_kind() {
        let endpoint = builtin("keys", EndpointKind::Jwks, "/static/jwks");
        assert_eq!(endpoint.kind(), EndpointKind::Jwks);
        assert_eq!(endpoint.name(), "keys");
        assert_eq!(endpoint.endpoint_path(), "/static/jwks");
    }
}
