//! JSON Web Key encoding of issuer keys.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::KeySpec;
use crate::keys::KeyError;

pub const KTY_OKP: &str = "OKP";
pub const KTY_OCT: &str = "oct";
pub const CRV_ED25519: &str = "Ed25519";

const DEFAULT_OCT_BYTES: usize = 32;
const MIN_OCT_BYTES: usize = 16;

/// Wire form of a single key (RFC 7517).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<String>,
}

/// A key set document: `{"keys": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

/// Key types the store can generate and load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Ed25519,
    Symmetric { bytes: usize },
}

impl KeyKind {
    /// Interpret a key definition from configuration.
    pub fn from_spec(spec: &KeySpec) -> Result<Self, KeyError> {
        match spec.kty.as_str() {
            KTY_OKP => match spec.crv.as_deref() {
                None | Some(CRV_ED25519) => Ok(Self::Ed25519),
                Some(other) => Err(KeyError::UnsupportedCurve(other.to_string())),
            },
            KTY_OCT => {
                let bytes = spec.bytes.unwrap_or(DEFAULT_OCT_BYTES);
                if bytes < MIN_OCT_BYTES {
                    return Err(KeyError::InvalidSize(bytes));
                }
                Ok(Self::Symmetric { bytes })
            }
            other => Err(KeyError::UnsupportedKeyType(other.to_string())),
        }
    }
}

enum KeyMaterial {
    Ed25519(SigningKey),
    Symmetric(Vec<u8>),
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMaterial::Ed25519(_) => f.write_str("Ed25519(..)"),
            KeyMaterial::Symmetric(k) => write!(f, "Symmetric({} bytes)", k.len()),
        }
    }
}

/// One issuer key with its id and usage.
#[derive(Debug)]
pub struct Key {
    kid: String,
    key_use: String,
    material: KeyMaterial,
}

impl Key {
    /// Generate fresh key material.
    pub fn generate(kind: KeyKind, key_use: &str) -> Result<Self, KeyError> {
        check_use(key_use)?;
        let material = match kind {
            KeyKind::Ed25519 => KeyMaterial::Ed25519(SigningKey::generate(&mut OsRng)),
            KeyKind::Symmetric { bytes } => {
                let mut secret = vec![0u8; bytes];
                OsRng.fill_bytes(&mut secret);
                KeyMaterial::Symmetric(secret)
            }
        };
        let kid = thumbprint(&material);
        Ok(Self {
            kid,
            key_use: key_use.to_string(),
            material,
        })
    }

    /// Load a key from its private JWK form.
    pub fn from_jwk(jwk: &Jwk) -> Result<Self, KeyError> {
        let key_use = jwk.key_use.clone().unwrap_or_else(|| "sig".to_string());
        check_use(&key_use)?;

        let material = match jwk.kty.as_str() {
            KTY_OKP => {
                let crv = jwk.crv.as_deref().unwrap_or(CRV_ED25519);
                if crv != CRV_ED25519 {
                    return Err(KeyError::UnsupportedCurve(crv.to_string()));
                }
                let d = decode_fixed::<32>(jwk.d.as_deref(), "d")?;
                let signing = SigningKey::from_bytes(&d);
                if let Some(x) = jwk.x.as_deref() {
                    if decode(x, "x")? != signing.verifying_key().as_bytes() {
                        return Err(KeyError::Malformed(
                            "public part does not match private key".into(),
                        ));
                    }
                }
                KeyMaterial::Ed25519(signing)
            }
            KTY_OCT => {
                let k = jwk
                    .k
                    .as_deref()
                    .ok_or_else(|| KeyError::Malformed("oct key without \"k\"".into()))?;
                let secret = decode(k, "k")?;
                if secret.len() < MIN_OCT_BYTES {
                    return Err(KeyError::InvalidSize(secret.len()));
                }
                KeyMaterial::Symmetric(secret)
            }
            other => return Err(KeyError::UnsupportedKeyType(other.to_string())),
        };

        let kid = jwk.kid.clone().unwrap_or_else(|| thumbprint(&material));
        Ok(Self {
            kid,
            key_use,
            material,
        })
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn key_use(&self) -> &str {
        &self.key_use
    }

    pub fn kind(&self) -> KeyKind {
        match &self.material {
            KeyMaterial::Ed25519(_) => KeyKind::Ed25519,
            KeyMaterial::Symmetric(k) => KeyKind::Symmetric { bytes: k.len() },
        }
    }

    /// JOSE algorithm name for this key.
    pub fn alg(&self) -> &'static str {
        match self.material {
            KeyMaterial::Ed25519(_) => "EdDSA",
            KeyMaterial::Symmetric(_) => "HS256",
        }
    }

    pub fn is_symmetric(&self) -> bool {
        matches!(self.material, KeyMaterial::Symmetric(_))
    }

    /// Whether this key satisfies a configured definition for `key_use`.
    pub fn satisfies(&self, kind: KeyKind, key_use: &str) -> bool {
        if self.key_use != key_use {
            return false;
        }
        match (self.kind(), kind) {
            (KeyKind::Ed25519, KeyKind::Ed25519) => true,
            (KeyKind::Symmetric { bytes: have }, KeyKind::Symmetric { bytes: want }) => {
                have == want
            }
            _ => false,
        }
    }

    /// Sign a message with an asymmetric key.
    pub fn sign(&self, message: &[u8]) -> Option<Vec<u8>> {
        match &self.material {
            KeyMaterial::Ed25519(key) => Some(key.sign(message).to_bytes().to_vec()),
            KeyMaterial::Symmetric(_) => None,
        }
    }

    /// Verify a signature produced by [`Key::sign`].
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let KeyMaterial::Ed25519(key) = &self.material else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        let verifying: VerifyingKey = key.verifying_key();
        verifying.verify(message, &signature).is_ok()
    }

    /// JWK form. Symmetric keys have no public form and yield `None`.
    pub fn to_jwk(&self, private: bool) -> Option<Jwk> {
        let mut jwk = Jwk {
            kid: Some(self.kid.clone()),
            key_use: Some(self.key_use.clone()),
            alg: Some(self.alg().to_string()),
            ..Jwk::default()
        };
        match &self.material {
            KeyMaterial::Ed25519(key) => {
                jwk.kty = KTY_OKP.to_string();
                jwk.crv = Some(CRV_ED25519.to_string());
                jwk.x = Some(URL_SAFE_NO_PAD.encode(key.verifying_key().as_bytes()));
                if private {
                    jwk.d = Some(URL_SAFE_NO_PAD.encode(key.to_bytes()));
                }
            }
            KeyMaterial::Symmetric(secret) => {
                if !private {
                    return None;
                }
                jwk.kty = KTY_OCT.to_string();
                jwk.k = Some(URL_SAFE_NO_PAD.encode(secret));
            }
        }
        Some(jwk)
    }
}

fn check_use(key_use: &str) -> Result<(), KeyError> {
    match key_use {
        "sig" | "enc" => Ok(()),
        other => Err(KeyError::InvalidUse(other.to_string())),
    }
}

fn decode(value: &str, field: &str) -> Result<Vec<u8>, KeyError> {
    URL_SAFE_NO_PAD
        .decode(value.trim_end_matches('='))
        .map_err(|e| KeyError::Malformed(format!("field {field:?}: {e}")))
}

fn decode_fixed<const N: usize>(value: Option<&str>, field: &str) -> Result<[u8; N], KeyError> {
    let value = value.ok_or_else(|| KeyError::Malformed(format!("missing field {field:?}")))?;
    let bytes = decode(value, field)?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| KeyError::Malformed(format!("field {field:?} has {} bytes", b.len())))
}

/// RFC 7638 thumbprint over the required members, in lexicographic order.
fn thumbprint(material: &KeyMaterial) -> String {
    let canonical = match material {
        KeyMaterial::Ed25519(key) => format!(
            r#"{{"crv":"{CRV_ED25519}","kty":"{KTY_OKP}","x":"{}"}}"#,
            URL_SAFE_NO_PAD.encode(key.verifying_key().as_bytes())
        ),
        KeyMaterial::Symmetric(secret) => format!(
            r#"{{"k":"{}","kty":"{KTY_OCT}"}}"#,
            URL_SAFE_NO_PAD.encode(secret)
        ),
    };
    URL_SAFE_NO_PAD.encode(Sha256::digest(canonical.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(kty: &str, crv: Option<&str>) -> KeySpec {
        KeySpec {
            kty: kty.to_string(),
            crv: crv.map(str::to_string),
            key_use: vec!["sig".into()],
            bytes: None,
        }
    }

    #[test]
    fn spec_interpretation() {
        assert_eq!(KeyKind::from_spec(&spec("OKP", None)).unwrap(), KeyKind::Ed25519);
        assert_eq!(
            KeyKind::from_spec(&spec("oct", None)).unwrap(),
            KeyKind::Symmetric { bytes: 32 }
        );
        assert!(matches!(
            KeyKind::from_spec(&spec("RSA", None)),
            Err(KeyError::UnsupportedKeyType(_))
        ));
        assert!(matches!(
            KeyKind::from_spec(&spec("OKP", Some("X448"))),
            Err(KeyError::UnsupportedCurve(_))
        ));
    }

    #[test]
    fn private_jwk_reloads_same_key() {
        let key = Key::generate(KeyKind::Ed25519, "sig").unwrap();
        let jwk = key.to_jwk(true).unwrap();
        let reloaded = Key::from_jwk(&jwk).unwrap();

        assert_eq!(reloaded.kid(), key.kid());
        let sig = key.sign(b"payload").unwrap();
        assert!(reloaded.verify(b"payload", &sig));
        assert!(!reloaded.verify(b"tampered", &sig));
    }

    #[test]
    fn public_jwk_has_no_secret() {
        let key = Key::generate(KeyKind::Ed25519, "sig").unwrap();
        let jwk = key.to_jwk(false).unwrap();
        assert!(jwk.d.is_none());
        assert_eq!(jwk.alg.as_deref(), Some("EdDSA"));

        let sym = Key::generate(KeyKind::Symmetric { bytes: 32 }, "enc").unwrap();
        assert!(sym.to_jwk(false).is_none());
        assert!(sym.to_jwk(true).unwrap().k.is_some());
    }

    #[test]
    fn mismatched_public_part_is_rejected() {
        let a = Key::generate(KeyKind::Ed25519, "sig").unwrap().to_jwk(true).unwrap();
        let b = Key::generate(KeyKind::Ed25519, "sig").unwrap().to_jwk(true).unwrap();
        let forged = Jwk { x: b.x, ..a };
        assert!(matches!(Key::from_jwk(&forged), Err(KeyError::Malformed(_))));
    }

    #[test]
    fn kid_is_thumbprint() {
        // RFC 8037 appendix A.3 test vector.
        let jwk = Jwk {
            kty: "OKP".into(),
            crv: Some("Ed25519".into()),
            d: Some("nWGxne_9WmC6hEr0kuwsxERJxWl7MmkZcDusAxyuf2A".into()),
            x: Some("11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo".into()),
            ..Jwk::default()
        };
        let key = Key::from_jwk(&jwk).unwrap();
        assert_eq!(key.kid(), "kPrK_qmxVWaYVA9wwBF6Iuo3vVzz7TxHCTwXBygrS4k");
    }

    #[test]
    fn bad_use_is_rejected() {
        assert!(matches!(
            Key::generate(KeyKind::Ed25519, "wrap"),
            Err(KeyError::InvalidUse(_))
        ));
    }
}
