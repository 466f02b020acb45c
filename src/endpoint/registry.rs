//! Endpoint lookup by virtual path.
//!
//! # Design Decisions
//! - Built once from configuration; collaborators may swap handlers in
//!   before the provider is shared, never after
//! - Two endpoints may not share a virtual path
//! - Lookup is an exact match on the full segment sequence

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use thiserror::Error;
use url::Url;

use crate::config::{EndpointConfig, EndpointKind};
use crate::endpoint::{builtin, virtual_path, Endpoint, VirtualPath};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("endpoint {0:?} has no kind and its name is not a known endpoint")]
    UnknownKind(String),

    #[error("endpoints {first:?} and {second:?} share the path {path}")]
    DuplicatePath {
        first: String,
        second: String,
        path: VirtualPath,
    },

    #[error("no endpoint named {0:?}")]
    UnknownEndpoint(String),
}

/// A mounted endpoint with its derived routing data.
#[derive(Clone)]
pub struct RegisteredEndpoint {
    url: String,
    vpath: VirtualPath,
    handler: Arc<dyn Endpoint>,
}

impl RegisteredEndpoint {
    pub fn name(&self) -> &str {
        self.handler.name()
    }

    pub fn kind(&self) -> EndpointKind {
        self.handler.kind()
    }

    /// Absolute URL advertised for this endpoint.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn virtual_path(&self) -> &VirtualPath {
        &self.vpath
    }

    pub fn handler(&self) -> &Arc<dyn Endpoint> {
        &self.handler
    }
}

impl std::fmt::Debug for RegisteredEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredEndpoint")
            .field("name", &self.name())
            .field("url", &self.url)
            .field("vpath", &self.vpath)
            .finish()
    }
}

/// Endpoints of one issuer, keyed by virtual path.
#[derive(Debug, Default)]
pub struct EndpointRegistry {
    issuer: String,
    entries: Vec<RegisteredEndpoint>,
    index: HashMap<VirtualPath, usize>,
}

impl EndpointRegistry {
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            ..Self::default()
        }
    }

    /// Build the registry from the `server_info.endpoint` table.
    pub fn from_config(
        issuer: &str,
        endpoints: &BTreeMap<String, EndpointConfig>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new(issuer);
        for (name, config) in endpoints {
            let kind = config
                .kind
                .or_else(|| EndpointKind::from_name(name))
                .ok_or_else(|| RegistryError::UnknownKind(name.clone()))?;
            registry.register(builtin(name, kind, &config.path))?;
        }
        Ok(registry)
    }

    /// Mount a handler at the virtual path of its endpoint path.
    pub fn register(&mut self, handler: Arc<dyn Endpoint>) -> Result<(), RegistryError> {
        let entry = self.entry_for(handler);
        if let Some(&i) = self.index.get(&entry.vpath) {
            return Err(RegistryError::DuplicatePath {
                first: self.entries[i].name().to_string(),
                second: entry.name().to_string(),
                path: entry.vpath,
            });
        }

        tracing::debug!(
            endpoint = %entry.name(),
            vpath = %entry.vpath,
            url = %entry.url,
            "Endpoint registered"
        );
        self.index.insert(entry.vpath.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Replace the handler of the endpoint called `name`.
    ///
    /// The new handler may advertise a different path; it is re-indexed.
    pub fn install(&mut self, name: &str, handler: Arc<dyn Endpoint>) -> Result<(), RegistryError> {
        let position = self
            .entries
            .iter()
            .position(|e| e.name() == name)
            .ok_or_else(|| RegistryError::UnknownEndpoint(name.to_string()))?;

        let entry = self.entry_for(handler);
        if let Some(&i) = self.index.get(&entry.vpath) {
            if i != position {
                return Err(RegistryError::DuplicatePath {
                    first: self.entries[i].name().to_string(),
                    second: entry.name().to_string(),
                    path: entry.vpath,
                });
            }
        }

        self.index.remove(&self.entries[position].vpath);
        self.index.insert(entry.vpath.clone(), position);
        self.entries[position] = entry;
        Ok(())
    }

    pub fn lookup(&self, vpath: &VirtualPath) -> Option<&RegisteredEndpoint> {
        self.index.get(vpath).map(|&i| &self.entries[i])
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredEndpoint> {
        self.entries.iter().find(|e| e.name() == name)
    }

    /// Endpoints in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredEndpoint> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry_for(&self, handler: Arc<dyn Endpoint>) -> RegisteredEndpoint {
        let path = handler.endpoint_path();
        RegisteredEndpoint {
            url: advertised_url(&self.issuer, path),
            vpath: virtual_path(path),
            handler,
        }
    }
}

/// Absolute endpoint URL: absolute paths as configured, relative ones
/// appended to the issuer.
pub fn advertised_url(issuer: &str, endpoint_path: &str) -> String {
    match Url::parse(endpoint_path) {
        Ok(url) if url.has_host() => endpoint_path.to_string(),
        _ => format!(
            "{}/{}",
            issuer.trim_end_matches('/'),
            endpoint_path.trim_start_matches('/')
        ),
    }
}
