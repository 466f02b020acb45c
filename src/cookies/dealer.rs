//! Signed and encrypted cookies for the provider's own state.

use std::fmt;

use axum::http::{header::COOKIE, HeaderMap};
use cookie::time::Duration;
use cookie::{Cookie, CookieJar, Key, SameSite};

use crate::config::{CookieDealerConfig, CookieDefaults};
use crate::cookies::{CookieError, MIN_SECRET_LEN};

/// Issues cookies whose values are HMAC-SHA256 signed, or AES-256-GCM
/// encrypted when `encrypt` is set, and verifies them on the way back in.
pub struct CookieDealer {
    key: Key,
    encrypt: bool,
    secure: bool,
    defaults: CookieDefaults,
}

impl fmt::Debug for CookieDealer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieDealer")
            .field("encrypt", &self.encrypt)
            .field("secure", &self.secure)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl CookieDealer {
    /// Build from configuration. Pure: no I/O.
    pub fn new(config: &CookieDealerConfig) -> Result<Self, CookieError> {
        match config.sign_alg.to_ascii_uppercase().as_str() {
            "HS256" | "SHA256" => {}
            _ => return Err(CookieError::UnsupportedAlgorithm(config.sign_alg.clone())),
        }
        if config.symkey.len() < MIN_SECRET_LEN {
            return Err(CookieError::WeakSecret(config.symkey.len()));
        }
        if config.default_values.name.is_empty() {
            return Err(CookieError::EmptyName);
        }

        Ok(Self {
            key: Key::derive_from(config.symkey.as_bytes()),
            encrypt: config.encrypt,
            secure: config.secure,
            defaults: config.default_values.clone(),
        })
    }

    pub fn default_name(&self) -> &str {
        &self.defaults.name
    }

    pub fn encrypts(&self) -> bool {
        self.encrypt
    }

    /// Create a protected cookie carrying `value`.
    pub fn create_cookie(&self, value: &str, name: Option<&str>) -> Cookie<'static> {
        let name = name.unwrap_or(&self.defaults.name).to_string();
        let cookie = self.base_cookie(name.clone(), value.to_string()).build();

        let mut jar = CookieJar::new();
        if self.encrypt {
            jar.private_mut(&self.key).add(cookie);
        } else {
            jar.signed_mut(&self.key).add(cookie);
        }
        match jar.get(&name) {
            Some(protected) => protected.clone(),
            None => unreachable!("cookie was just added to the jar"),
        }
    }

    /// Return the plaintext value of cookie `name` from a `Cookie` header
    /// value, if it is present and authentic.
    pub fn verify(&self, cookie_header: &str, name: Option<&str>) -> Option<String> {
        let name = name.unwrap_or(&self.defaults.name);
        let mut jar = CookieJar::new();
        for cookie in Cookie::split_parse(cookie_header.to_string()).flatten() {
            jar.add_original(cookie);
        }

        let verified = if self.encrypt {
            jar.private(&self.key).get(name)
        } else {
            jar.signed(&self.key).get(name)
        };
        verified.map(|c| c.value().to_string())
    }

    /// Like [`CookieDealer::verify`], over every `Cookie` header of a request.
    pub fn verify_request(&self, headers: &HeaderMap, name: Option<&str>) -> Option<String> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|header| self.verify(header, name))
    }

    /// A cookie instructing the client to drop `name`.
    pub fn delete_cookie(&self, name: Option<&str>) -> Cookie<'static> {
        let name = name.unwrap_or(&self.defaults.name).to_string();
        let mut cookie = self.base_cookie(name, String::new()).build();
        cookie.make_removal();
        cookie
    }

    fn base_cookie(&self, name: String, value: String) -> cookie::CookieBuilder<'static> {
        let mut builder = Cookie::build((name, value))
            .path(self.defaults.path.clone())
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax);
        if let Some(domain) = &self.defaults.domain {
            builder = builder.domain(domain.clone());
        }
        if let Some(max_age) = self.defaults.max_age {
            builder = builder.max_age(Duration::seconds(max_age));
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn config(encrypt: bool) -> CookieDealerConfig {
        CookieDealerConfig {
            symkey: "an example secret that is long enough".into(),
            encrypt,
            default_values: CookieDefaults {
                name: "oidc_op".into(),
                domain: Some("op.example.com".into()),
                path: "/".into(),
                max_age: Some(3600),
            },
            ..CookieDealerConfig::default()
        }
    }

    #[test]
    fn signed_cookie_verifies() {
        let dealer = CookieDealer::new(&config(false)).unwrap();
        let cookie = dealer.create_cookie("user=alice", None);

        assert_eq!(cookie.name(), "oidc_op");
        assert_ne!(cookie.value(), "user=alice");
        assert_eq!(cookie.domain(), Some("op.example.com"));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(3600)));
        assert_eq!(cookie.http_only(), Some(true));

        let header = cookie.stripped().to_string();
        assert_eq!(dealer.verify(&header, None).as_deref(), Some("user=alice"));
    }

    #[test]
    fn encrypted_cookie_hides_value() {
        let dealer = CookieDealer::new(&config(true)).unwrap();
        let cookie = dealer.create_cookie("secret-state", Some("state"));
        assert!(!cookie.value().contains("secret-state"));

        let header = format!("other=1; {}", cookie.stripped());
        assert_eq!(
            dealer.verify(&header, Some("state")).as_deref(),
            Some("secret-state")
        );
    }

    #[test]
    fn tampered_cookie_is_rejected() {
        let dealer = CookieDealer::new(&config(false)).unwrap();
        let cookie = dealer.create_cookie("user=alice", None);
        let tampered = format!("oidc_op={}x", cookie.value());
        assert!(dealer.verify(&tampered, None).is_none());

        let other = CookieDealer::new(&CookieDealerConfig {
            symkey: "a completely different secret value!!".into(),
            ..config(false)
        })
        .unwrap();
        assert!(other.verify(&cookie.stripped().to_string(), None).is_none());
    }

    #[test]
    fn verify_request_scans_all_headers() {
        let dealer = CookieDealer::new(&config(false)).unwrap();
        let cookie = dealer.create_cookie("v", None);

        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("a=b"));
        headers.append(
            COOKIE,
            HeaderValue::from_str(&cookie.stripped().to_string()).unwrap(),
        );
        assert_eq!(dealer.verify_request(&headers, None).as_deref(), Some("v"));
    }

    #[test]
    fn delete_cookie_expires() {
        let dealer = CookieDealer::new(&config(false)).unwrap();
        let removal = dealer.delete_cookie(None);
        assert_eq!(removal.value(), "");
        assert_eq!(removal.max_age(), Some(Duration::ZERO));
    }

    #[test]
    fn rejects_bad_configuration() {
        let weak = CookieDealerConfig {
            symkey: "short".into(),
            ..config(false)
        };
        assert!(matches!(
            CookieDealer::new(&weak),
            Err(CookieError::WeakSecret(5))
        ));

        let alg = CookieDealerConfig {
            sign_alg: "RS256".into(),
            ..config(false)
        };
        assert!(matches!(
            CookieDealer::new(&alg),
            Err(CookieError::UnsupportedAlgorithm(_))
        ));
    }
}
