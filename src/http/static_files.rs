//! Static assets served under `/public`.
//!
//! Files come from a directory on disk. Content types follow an explicit
//! extension table first, so key set files (`.jwks`, `.jose`) get their JOSE
//! media types rather than a generic guess.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Method, Request},
    middleware::{self, Next},
    response::Response,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

/// Mount point of the static assets.
pub const PUBLIC_PREFIX: &str = "/public";

/// Extension → media type overrides.
#[derive(Debug, Clone)]
pub struct ContentTypes(HashMap<String, String>);

impl Default for ContentTypes {
    fn default() -> Self {
        let mut table = HashMap::new();
        table.insert("json".to_string(), "application/json".to_string());
        table.insert("jwks".to_string(), "application/json".to_string());
        table.insert("jose".to_string(), "application/jose".to_string());
        Self(table)
    }
}

impl ContentTypes {
    pub fn insert(&mut self, extension: &str, media_type: &str) {
        self.0.insert(
            extension.trim_start_matches('.').to_ascii_lowercase(),
            media_type.to_string(),
        );
    }

    /// Media type for a request path, by its final extension.
    pub fn lookup(&self, path: &str) -> Option<&str> {
        let file = path.rsplit('/').next()?;
        let (_, ext) = file.rsplit_once('.')?;
        self.0.get(&ext.to_ascii_lowercase()).map(String::as_str)
    }
}

/// A directory of static files plus its content type table.
#[derive(Debug, Clone)]
pub struct StaticAssets {
    dir: PathBuf,
    content_types: ContentTypes,
}

impl StaticAssets {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            content_types: ContentTypes::default(),
        }
    }

    pub fn with_content_type(mut self, extension: &str, media_type: &str) -> Self {
        self.content_types.insert(extension, media_type);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn content_types(&self) -> &ContentTypes {
        &self.content_types
    }

    /// Service for the mount point: files, content types and CORS.
    pub fn router(&self) -> Router {
        if !self.dir.is_dir() {
            tracing::warn!(dir = %self.dir.display(), "Static asset directory does not exist");
        }

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
            .expose_headers(Any);

        Router::new()
            .fallback_service(ServeDir::new(&self.dir))
            .layer(middleware::from_fn_with_state(
                Arc::new(self.content_types.clone()),
                apply_content_type,
            ))
            .layer(cors)
    }
}

async fn apply_content_type(
    State(types): State<Arc<ContentTypes>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let media_type = types.lookup(request.uri().path()).map(str::to_string);
    let mut response = next.run(request).await;

    if let Some(media_type) = media_type {
        if response.status().is_success() {
            if let Ok(value) = HeaderValue::from_str(&media_type) {
                response.headers_mut().insert(header::CONTENT_TYPE, value);
            }
        }
    }
    response
}
