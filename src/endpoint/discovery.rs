//! Provider discovery: OpenID provider metadata and WebFinger issuer lookup.

use axum::http::{Method, StatusCode};
use axum::response::Response;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::EndpointKind;
use crate::endpoint::{Endpoint, EndpointRequest};
use crate::http::response::{
    error_response, json_response, method_not_allowed, APPLICATION_JRD_JSON, APPLICATION_JSON,
};
use crate::provider::ProviderContext;

pub const ISSUER_REL: &str = "http://openid.net/specs/connect/1.0/issuer";

/// Serves `/.well-known/openid-configuration`.
#[derive(Debug, Clone)]
pub struct ProviderConfigEndpoint {
    name: String,
    path: String,
}

impl ProviderConfigEndpoint {
    pub fn new(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
        }
    }
}

/// Build the provider metadata document from the context.
pub fn provider_metadata(ctx: &ProviderContext) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("issuer".into(), Value::from(ctx.issuer()));

    for entry in ctx.registry().iter() {
        if let Some(field) = entry.kind().metadata_field() {
            metadata.insert(field.into(), Value::from(entry.url()));
        }
    }

    let mut algs: Vec<&str> = ctx
        .keys()
        .signing_keys(ctx.issuer())
        .iter()
        .map(|k| k.alg())
        .collect();
    algs.dedup();
    metadata.insert("id_token_signing_alg_values_supported".into(), algs.into());
    metadata.insert("response_types_supported".into(), vec!["code"].into());
    metadata.insert("subject_types_supported".into(), vec!["public"].into());
    metadata.insert("scopes_supported".into(), vec!["openid"].into());
    metadata
}

impl Endpoint for ProviderConfigEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EndpointKind {
        EndpointKind::ProviderConfig
    }

    fn endpoint_path(&self) -> &str {
        &self.path
    }

    fn handle(&self, ctx: &ProviderContext, request: EndpointRequest) -> Response {
        if request.method != Method::GET && request.method != Method::HEAD {
            return method_not_allowed();
        }
        json_response(StatusCode::OK, APPLICATION_JSON, &provider_metadata(ctx))
    }
}

/// Serves `/.well-known/webfinger` issuer discovery (OpenID Connect
/// Discovery 1.0, section 2).
#[derive(Debug, Clone)]
pub struct WebfingerEndpoint {
    name: String,
    path: String,
}

impl WebfingerEndpoint {
    pub fn new(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Jrd<'a> {
    subject: String,
    links: Vec<JrdLink<'a>>,
}

#[derive(Debug, Serialize)]
struct JrdLink<'a> {
    rel: &'a str,
    href: &'a str,
}

impl Endpoint for WebfingerEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EndpointKind {
        EndpointKind::Webfinger
    }

    fn endpoint_path(&self) -> &str {
        &self.path
    }

    fn handle(&self, ctx: &ProviderContext, request: EndpointRequest) -> Response {
        if request.method != Method::GET && request.method != Method::HEAD {
            return method_not_allowed();
        }

        let Some(resource) = request.query_param("resource") else {
            return error_response(
                StatusCode::BAD_REQUEST,
                "invalid_request",
                "missing resource parameter",
            );
        };

        let rels: Vec<String> = request
            .query_pairs()
            .into_iter()
            .filter_map(|(k, v)| (k == "rel").then_some(v))
            .collect();
        let links = if rels.is_empty() || rels.iter().any(|r| r == ISSUER_REL) {
            vec![JrdLink {
                rel: ISSUER_REL,
                href: ctx.issuer(),
            }]
        } else {
            Vec::new()
        };

        json_response(
            StatusCode::OK,
            APPLICATION_JRD_JSON,
            &Jrd {
                subject: resource,
                links,
            },
        )
    }
}
