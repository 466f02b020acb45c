//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use op_server::cli::Cli;
use op_server::config::{parse_config, OpConfig};
use op_server::lifecycle::Bootstrap;

pub const ISSUER: &str = "https://op.example.com";

pub const BASE_CONFIG: &str = r#"
[webserver]
port = 8090

[server_info]
issuer = "https://op.example.com"

[server_info.jwks]
key_defs = [
    { type = "OKP", crv = "Ed25519", use = ["sig"] },
    { type = "oct", bytes = 32, use = ["enc"] },
]
private_path = "private/jwks.json"
public_path = "public/jwks.json"

[server_info.cookie_dealer]
symkey = "0123456789abcdef0123456789abcdef"

[server_info.endpoint.provider_config]
path = ".well-known/openid-configuration"

[server_info.endpoint.webfinger]
path = ".well-known/webfinger"

[server_info.endpoint.jwks]
path = "jwks"

[server_info.endpoint.authorization]
path = "authorization"

[server_info.endpoint.token]
path = "token"
"#;

/// A working directory holding a `public/` folder.
pub fn workdir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("public")).unwrap();
    dir
}

pub fn config(toml: &str) -> OpConfig {
    parse_config(toml).unwrap()
}

pub fn cli(args: &[&str]) -> Cli {
    use clap::Parser;
    let mut argv = vec!["op-server"];
    argv.extend_from_slice(args);
    argv.push("op_config");
    Cli::parse_from(argv)
}

/// Prepared bootstrap for `BASE_CONFIG` rooted at `dir`.
pub fn bootstrap(dir: &Path) -> Bootstrap {
    Bootstrap::prepare(&config(BASE_CONFIG), &cli(&[]), dir).unwrap()
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn content_type(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
