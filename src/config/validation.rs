//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ports, secret lengths)
//! - Detect endpoints that would collide on the same virtual path
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: OpConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashMap;

use thiserror::Error;
use url::Url;

use crate::config::schema::{EndpointKind, OpConfig};
use crate::cookies::MIN_SECRET_LEN;
use crate::endpoint::virtual_path;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("server_info.issuer {0:?} is not an absolute http(s) URL")]
    InvalidIssuer(String),

    #[error("webserver.port must be non-zero")]
    ZeroPort,

    #[error("webserver.{0} is set but empty")]
    EmptyPath(&'static str),

    #[error("server_info.jwks.key_defs is empty")]
    NoKeyDefs,

    #[error("server_info.cookie_dealer.symkey must be at least {MIN_SECRET_LEN} bytes")]
    WeakCookieSecret,

    #[error("endpoint {0:?} has an empty path")]
    EmptyEndpointPath(String),

    #[error("endpoint {0:?} has no kind and its name is not a known endpoint")]
    UnknownEndpointKind(String),

    #[error("endpoints {first:?} and {second:?} share the path {path:?}")]
    DuplicateEndpointPath {
        first: String,
        second: String,
        path: String,
    },
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &OpConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let issuer_ok = Url::parse(&config.server_info.issuer)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false);
    if !issuer_ok {
        errors.push(ValidationError::InvalidIssuer(
            config.server_info.issuer.clone(),
        ));
    }

    let web = &config.webserver;
    if web.port == Some(0) {
        errors.push(ValidationError::ZeroPort);
    }
    for (field, value) in [("cert", &web.cert), ("key", &web.key)] {
        if value.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            errors.push(ValidationError::EmptyPath(field));
        }
    }

    if config.server_info.jwks.key_defs.is_empty() {
        errors.push(ValidationError::NoKeyDefs);
    }

    if config.server_info.cookie_dealer.symkey.len() < MIN_SECRET_LEN {
        errors.push(ValidationError::WeakCookieSecret);
    }

    let mut seen: HashMap<Vec<String>, &str> = HashMap::new();
    for (name, endpoint) in &config.server_info.endpoint {
        if endpoint.path.trim().is_empty() {
            errors.push(ValidationError::EmptyEndpointPath(name.clone()));
            continue;
        }
        if endpoint.kind.is_none() && EndpointKind::from_name(name).is_none() {
            errors.push(ValidationError::UnknownEndpointKind(name.clone()));
        }

        let vpath = virtual_path(&endpoint.path);
        if let Some(first) = seen.get(vpath.segments()) {
            errors.push(ValidationError::DuplicateEndpointPath {
                first: first.to_string(),
                second: name.clone(),
                path: vpath.to_string(),
            });
        } else {
            seen.insert(vpath.segments().to_vec(), name);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::parse_config;
    use crate::config::ConfigError;

    fn base(extra: &str) -> String {
        format!(
            r#"
            [webserver]
            [server_info]
            issuer = "https://op.example.com"
            [server_info.jwks]
            key_defs = [{{ type = "OKP", crv = "Ed25519" }}]
            [server_info.cookie_dealer]
            symkey = "0123456789abcdef0123456789abcdef"
            {extra}
            "#
        )
    }

    fn errors_of(doc: &str) -> Vec<ValidationError> {
        match parse_config(doc) {
            Err(ConfigError::Validation(errors)) => errors,
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => Vec::new(),
        }
    }

    #[test]
    fn accepts_valid_config() {
        assert!(errors_of(&base("")).is_empty());
    }

    #[test]
    fn rejects_colliding_endpoints() {
        let errors = errors_of(&base(
            r#"
            [server_info.endpoint.token]
            path = "/token"
            [server_info.endpoint.userinfo]
            path = "https://op.example.com/token"
            "#,
        ));
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            ValidationError::DuplicateEndpointPath { .. }
        ));
    }

    #[test]
    fn rejects_unknown_kind() {
        let errors = errors_of(&base(
            r#"
            [server_info.endpoint.frobnicate]
            path = "frob"
            "#,
        ));
        assert_eq!(
            errors,
            vec![ValidationError::UnknownEndpointKind("frobnicate".into())]
        );
    }

    #[test]
    fn explicit_kind_allows_any_name() {
        let errors = errors_of(&base(
            r#"
            [server_info.endpoint.keys]
            path = "static/keys"
            kind = "jwks"
            "#,
        ));
        assert!(errors.is_empty());
    }

    #[test]
    fn rejects_empty_cert_path() {
        let doc = base("").replace("[webserver]", "[webserver]\ncert = \"\"");
        assert_eq!(errors_of(&doc), vec![ValidationError::EmptyPath("cert")]);
    }
}
