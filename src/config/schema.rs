//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the provider.
//! All types derive Serde traits for deserialization from config files.
//!
//! `webserver`, `server_info` and `server_info.jwks` carry no defaults: a
//! document without them is rejected while parsing.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the provider process.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpConfig {
    /// Listener configuration (port, TLS material, served directories).
    pub webserver: WebserverConfig,

    /// Issuer identity, key jar, cookie dealer and endpoint definitions.
    pub server_info: ServerInfoConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WebserverConfig {
    /// Explicit listen port. Falls back to 443/80 depending on TLS.
    pub port: Option<u16>,

    /// Path to certificate file (PEM). Required when TLS is enabled.
    pub cert: Option<PathBuf>,

    /// Path to private key file (PEM). Required when TLS is enabled.
    pub key: Option<PathBuf>,

    /// Optional intermediate chain (PEM), appended to the served chain.
    pub cert_chain: Option<PathBuf>,

    /// Directory served under `/public`. Relative to the working directory.
    pub public_dir: Option<PathBuf>,

    /// Directory receiving `op.log`, `error.log` and `access.log`.
    pub log_dir: Option<PathBuf>,

    /// Request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
}

/// The `server_info` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerInfoConfig {
    /// Issuer identifier, e.g. `https://op.example.com`.
    pub issuer: String,

    /// Key jar initialization parameters.
    pub jwks: KeyJarConfig,

    /// Cookie dealer parameters.
    #[serde(default)]
    pub cookie_dealer: CookieDealerConfig,

    /// Endpoints keyed by name.
    #[serde(default)]
    pub endpoint: BTreeMap<String, EndpointConfig>,
}

/// Key jar initialization parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeyJarConfig {
    /// Keys to hold for the issuer.
    pub key_defs: Vec<KeySpec>,

    /// Where the private JWKS is read from / written to.
    #[serde(default)]
    pub private_path: Option<PathBuf>,

    /// Where the public JWKS is written to.
    #[serde(default)]
    pub public_path: Option<PathBuf>,

    /// Never write key files; use whatever is on disk.
    #[serde(default)]
    pub read_only: bool,
}

/// One key definition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct KeySpec {
    /// JWK key type (`OKP` or `oct`).
    #[serde(rename = "type")]
    pub kty: String,

    /// Curve for `OKP` keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,

    /// Intended usages (`sig`, `enc`).
    #[serde(rename = "use", default = "default_key_use")]
    pub key_use: Vec<String>,

    /// Size in bytes of an `oct` key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<usize>,
}

fn default_key_use() -> Vec<String> {
    vec!["sig".to_string()]
}

/// Cookie dealer parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CookieDealerConfig {
    /// Secret the signing/encryption keys are derived from.
    pub symkey: String,

    /// Signing algorithm; only HMAC-SHA256 is offered.
    pub sign_alg: String,

    /// Encrypt cookie values instead of only signing them.
    pub encrypt: bool,

    /// Restrict cookies to HTTPS.
    pub secure: bool,

    /// Attributes applied to every issued cookie.
    pub default_values: CookieDefaults,
}

impl Default for CookieDealerConfig {
    fn default() -> Self {
        Self {
            symkey: String::new(),
            sign_alg: "HS256".to_string(),
            encrypt: false,
            secure: true,
            default_values: CookieDefaults::default(),
        }
    }
}

/// Default cookie attributes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CookieDefaults {
    pub name: String,
    pub domain: Option<String>,
    pub path: String,
    /// Lifetime in seconds; session cookie when absent.
    pub max_age: Option<i64>,
}

impl Default for CookieDefaults {
    fn default() -> Self {
        Self {
            name: "oidc_op".to_string(),
            domain: None,
            path: "/".to_string(),
            max_age: None,
        }
    }
}

/// One endpoint definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointConfig {
    /// Advertised endpoint path: absolute URL or path relative to the issuer.
    pub path: String,

    /// Endpoint kind. Inferred from the endpoint name when omitted.
    #[serde(default)]
    pub kind: Option<EndpointKind>,
}

/// Endpoint kinds known to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    ProviderConfig,
    Jwks,
    Webfinger,
    Authorization,
    Token,
    Userinfo,
    Registration,
    EndSession,
}

impl EndpointKind {
    /// Infer a kind from a conventional endpoint name.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "provider_config" | "provider_info" | "discovery" => Self::ProviderConfig,
            "jwks" | "jwks_uri" => Self::Jwks,
            "webfinger" => Self::Webfinger,
            "authorization" => Self::Authorization,
            "token" => Self::Token,
            "userinfo" => Self::Userinfo,
            "registration" => Self::Registration,
            "end_session" | "session" => Self::EndSession,
            _ => return None,
        };
        Some(kind)
    }

    /// Discovery metadata field advertising this endpoint, if any.
    pub fn metadata_field(&self) -> Option<&'static str> {
        match self {
            Self::ProviderConfig | Self::Webfinger => None,
            Self::Jwks => Some("jwks_uri"),
            Self::Authorization => Some("authorization_endpoint"),
            Self::Token => Some("token_endpoint"),
            Self::Userinfo => Some("userinfo_endpoint"),
            Self::Registration => Some("registration_endpoint"),
            Self::EndSession => Some("end_session_endpoint"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_document_parses() {
        let config: OpConfig = toml::from_str(
            r#"
            [webserver]

            [server_info]
            issuer = "https://op.example.com"

            [server_info.jwks]
            key_defs = [{ type = "OKP", crv = "Ed25519" }]
            "#,
        )
        .unwrap();

        assert!(config.webserver.port.is_none());
        assert_eq!(config.server_info.jwks.key_defs[0].key_use, vec!["sig"]);
        assert_eq!(config.server_info.cookie_dealer.sign_alg, "HS256");
        assert_eq!(config.server_info.cookie_dealer.default_values.path, "/");
        assert!(config.server_info.endpoint.is_empty());
    }

    #[test]
    fn missing_jwks_is_rejected() {
        let result: Result<OpConfig, _> = toml::from_str(
            r#"
            [webserver]
            [server_info]
            issuer = "https://op.example.com"
            "#,
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("jwks"), "unexpected error: {err}");
    }

    #[test]
    fn endpoint_kind_inference() {
        assert_eq!(EndpointKind::from_name("token"), Some(EndpointKind::Token));
        assert_eq!(
            EndpointKind::from_name("provider_info"),
            Some(EndpointKind::ProviderConfig)
        );
        assert_eq!(EndpointKind::from_name("custom"), None);
        assert_eq!(EndpointKind::Jwks.metadata_field(), Some("jwks_uri"));
    }
}
