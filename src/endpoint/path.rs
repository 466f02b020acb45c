//! Endpoint path normalization.
//!
//! Configured endpoint paths may be absolute URLs (`https://op/authorize`),
//! absolute paths (`/authorize`) or relative paths (`authorize`). All three
//! collapse to the same [`VirtualPath`], which is what requests are routed by.

use std::fmt;

use url::Url;

/// Base used to resolve relative endpoint paths. Only its path matters.
const RESOLUTION_BASE: &str = "http://localhost/";

/// An endpoint path split into non-empty segments.
///
/// The root path (`/`) is the empty sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VirtualPath(Vec<String>);

impl VirtualPath {
    /// Build from request path segments, skipping empty ones.
    pub fn from_request_path(path: &str) -> Self {
        Self(split_segments(path))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0.join("/"))
    }
}

/// Normalize an advertised endpoint path.
///
/// Only the path component is kept: scheme, host, query and fragment are
/// dropped. Relative paths are resolved against a fixed base, so `a/b` and
/// `/a/b` agree.
pub fn virtual_path(endpoint_path: &str) -> VirtualPath {
    let path = match Url::parse(endpoint_path) {
        Ok(url) if url.has_host() => url.path().to_string(),
        _ => resolve_relative(endpoint_path),
    };
    VirtualPath(split_segments(&path))
}

fn resolve_relative(endpoint_path: &str) -> String {
    // A leading "//" would be read as a network-path reference naming a host.
    let trimmed = format!("/{}", endpoint_path.trim_start_matches('/'));
    Url::parse(RESOLUTION_BASE)
        .and_then(|base| base.join(&trimmed))
        .map(|url| url.path().to_string())
        .unwrap_or(trimmed)
}

fn split_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(path: &str) -> Vec<String> {
        virtual_path(path).segments().to_vec()
    }

    #[test]
    fn absolute_url_keeps_path_only() {
        assert_eq!(segs("https://issuer.example/authorize"), vec!["authorize"]);
        assert_eq!(
            segs("https://issuer.example:8443/op/token?x=1#frag"),
            vec!["op", "token"]
        );
    }

    #[test]
    fn leading_slash_is_stripped() {
        assert_eq!(segs("/token"), vec!["token"]);
        assert_eq!(segs("token"), vec!["token"]);
    }

    #[test]
    fn leading_slash_invariance() {
        for p in [
            "a/b",
            "/a/b",
            "//a/b",
            ".well-known/openid-configuration",
            "registration",
            "x/y/z",
        ] {
            let prefixed = format!("/{}", p.trim_start_matches('/'));
            assert_eq!(virtual_path(p), virtual_path(&prefixed), "path {p}");
        }
    }

    #[test]
    fn root_is_empty_sequence() {
        assert!(virtual_path("/").is_root());
        assert!(virtual_path("https://issuer.example").is_root());
        assert!(VirtualPath::from_request_path("/").is_root());
    }

    #[test]
    fn segments_are_never_empty() {
        let vp = virtual_path("/a//b/");
        assert_eq!(vp.segments(), ["a", "b"]);
        assert!(vp.segments().iter().all(|s| !s.is_empty()));
    }

    #[test]
    fn request_paths_match_configured_paths() {
        assert_eq!(
            VirtualPath::from_request_path("/.well-known/openid-configuration"),
            virtual_path("https://op.example/.well-known/openid-configuration")
        );
    }

    #[test]
    fn display_is_absolute_path() {
        assert_eq!(virtual_path("a/b").to_string(), "/a/b");
        assert_eq!(virtual_path("/").to_string(), "/");
    }
}
