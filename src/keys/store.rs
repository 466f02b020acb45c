//! Issuer key store and its startup initialization.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::KeyJarConfig;
use crate::keys::jwk::{JwkSet, Key, KeyKind};
use crate::keys::KeyError;

/// The keys held for one owner.
#[derive(Debug, Default)]
pub struct KeyBundle {
    keys: Vec<Key>,
}

impl KeyBundle {
    pub fn new(keys: Vec<Key>) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Export as a JWKS document. Public exports skip symmetric keys.
    pub fn to_jwks(&self, private: bool) -> JwkSet {
        JwkSet {
            keys: self.keys.iter().filter_map(|k| k.to_jwk(private)).collect(),
        }
    }

    fn from_jwks(set: &JwkSet) -> Result<Self, KeyError> {
        let keys = set
            .keys
            .iter()
            .map(Key::from_jwk)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { keys })
    }

    /// Every (kind, use) pair required by the definitions has a key.
    fn satisfies(&self, required: &[(KeyKind, String)]) -> bool {
        required
            .iter()
            .all(|(kind, key_use)| self.keys.iter().any(|k| k.satisfies(*kind, key_use)))
    }
}

/// Keys indexed by owner (the issuer for the provider's own keys).
///
/// Built once at startup and read-only afterwards.
#[derive(Debug, Default)]
pub struct KeyStore {
    bundles: HashMap<String, KeyBundle>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a bundle to an owner, replacing any previous one.
    pub fn add_bundle(&mut self, owner: impl Into<String>, bundle: KeyBundle) {
        self.bundles.insert(owner.into(), bundle);
    }

    pub fn owners(&self) -> impl Iterator<Item = &str> {
        self.bundles.keys().map(String::as_str)
    }

    pub fn owner_keys(&self, owner: &str) -> &[Key] {
        self.bundles.get(owner).map(KeyBundle::keys).unwrap_or(&[])
    }

    /// Keys usable for signing, asymmetric first.
    pub fn signing_keys(&self, owner: &str) -> Vec<&Key> {
        let mut keys: Vec<&Key> = self
            .owner_keys(owner)
            .iter()
            .filter(|k| k.key_use() == "sig")
            .collect();
        keys.sort_by_key(|k| k.is_symmetric());
        keys
    }

    pub fn get(&self, owner: &str, kid: &str) -> Option<&Key> {
        self.owner_keys(owner).iter().find(|k| k.kid() == kid)
    }

    pub fn export_jwks(&self, owner: &str, private: bool) -> JwkSet {
        self.bundles
            .get(owner)
            .map(|b| b.to_jwks(private))
            .unwrap_or_default()
    }
}

/// Build the key store for `owner` from the key jar configuration.
///
/// Relative key file paths resolve against `base_dir`. An existing private
/// JWKS is reused; if it no longer matches `key_defs` it is regenerated
/// unless the jar is read-only.
pub fn init_key_store(
    owner: &str,
    config: &KeyJarConfig,
    base_dir: &Path,
) -> Result<KeyStore, KeyError> {
    let required = required_keys(config)?;
    let private_path = config.private_path.as_ref().map(|p| base_dir.join(p));
    let public_path = config.public_path.as_ref().map(|p| base_dir.join(p));

    let existing = match &private_path {
        Some(path) if path.exists() => Some(read_jwks(path)?),
        _ => None,
    };

    let bundle = match existing {
        Some(bundle) if config.read_only || bundle.satisfies(&required) => {
            tracing::info!(owner, keys = bundle.len(), "Loaded key material from disk");
            bundle
        }
        stale => {
            if stale.is_some() {
                tracing::warn!(owner, "Stored keys do not match key definitions, regenerating");
            }
            let bundle = generate(&required)?;
            tracing::info!(owner, keys = bundle.len(), "Generated key material");
            if let (Some(path), false) = (&private_path, config.read_only) {
                write_jwks(path, &bundle.to_jwks(true), true)?;
            }
            bundle
        }
    };

    if let (Some(path), false) = (&public_path, config.read_only) {
        write_jwks(path, &bundle.to_jwks(false), false)?;
    }

    let mut store = KeyStore::new();
    store.add_bundle(owner, bundle);
    Ok(store)
}

fn required_keys(config: &KeyJarConfig) -> Result<Vec<(KeyKind, String)>, KeyError> {
    if config.key_defs.is_empty() {
        return Err(KeyError::NoKeyDefs);
    }
    let mut required = Vec::new();
    for spec in &config.key_defs {
        let kind = KeyKind::from_spec(spec)?;
        if spec.key_use.is_empty() {
            return Err(KeyError::InvalidUse(String::new()));
        }
        for key_use in &spec.key_use {
            required.push((kind, key_use.clone()));
        }
    }
    Ok(required)
}

fn generate(required: &[(KeyKind, String)]) -> Result<KeyBundle, KeyError> {
    let keys = required
        .iter()
        .map(|(kind, key_use)| Key::generate(*kind, key_use))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(KeyBundle::new(keys))
}

fn read_jwks(path: &Path) -> Result<KeyBundle, KeyError> {
    let content = fs::read_to_string(path).map_err(|source| KeyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let set: JwkSet = serde_json::from_str(&content).map_err(|source| KeyError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    KeyBundle::from_jwks(&set)
}

fn write_jwks(path: &Path, set: &JwkSet, private: bool) -> Result<(), KeyError> {
    let io_err = |source: std::io::Error| KeyError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let body = serde_json::to_string_pretty(set).map_err(|source| KeyError::Json {
        path: PathBuf::from(path),
        source,
    })?;
    fs::write(path, body).map_err(io_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if private {
            fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(io_err)?;
        }
    }

    tracing::debug!(path = %path.display(), private, "Wrote JWKS");
    Ok(())
}
