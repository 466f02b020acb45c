//! Server-side sessions keyed by a `session_id` cookie.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, Request,
    },
    middleware::Next,
    response::Response,
};
use cookie::{Cookie, SameSite};
use dashmap::DashMap;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session_id";

const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Upper bound on the time between sweeps of expired sessions.
const MAX_SWEEP_PERIOD: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct SessionData {
    last_seen: Instant,
    values: HashMap<String, Value>,
}

/// Concurrent in-memory session storage.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<DashMap<String, SessionData>>,
    ttl: Duration,
    secure: bool,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl SessionStore {
    /// Sessions idle for longer than `ttl` are dropped.
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            ttl,
            secure: false,
        }
    }

    /// Mark issued session cookies `Secure`. Set when serving over TLS.
    pub fn with_secure_cookie(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn secure_cookie(&self) -> bool {
        self.secure
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a new, empty session and return its id.
    pub fn create(&self) -> String {
        let id = Uuid::new_v4().to_string();
        self.inner.insert(
            id.clone(),
            SessionData {
                last_seen: Instant::now(),
                values: HashMap::new(),
            },
        );
        id
    }

    /// Mark a session as used. Returns false if it is unknown or expired.
    pub fn touch(&self, id: &str) -> bool {
        let expired = match self.inner.get_mut(id) {
            Some(mut data) if data.last_seen.elapsed() <= self.ttl => {
                data.last_seen = Instant::now();
                return true;
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.inner.remove(id);
        }
        false
    }

    pub fn get(&self, id: &str, key: &str) -> Option<Value> {
        self.inner.get(id)?.values.get(key).cloned()
    }

    pub fn insert(&self, id: &str, key: impl Into<String>, value: Value) -> bool {
        match self.inner.get_mut(id) {
            Some(mut data) => {
                data.values.insert(key.into(), value);
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, id: &str) {
        self.inner.remove(id);
    }

    /// Drop every expired session.
    pub fn purge_expired(&self) -> usize {
        let before = self.inner.len();
        self.inner.retain(|_, data| data.last_seen.elapsed() <= self.ttl);
        before - self.inner.len()
    }

    /// Purge expired sessions periodically until the task is aborted.
    ///
    /// Sweeps run every TTL, at most every minute.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let store = self.clone();
        let period = self
            .ttl
            .min(MAX_SWEEP_PERIOD)
            .max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let purged = store.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, remaining = store.len(), "Expired sessions purged");
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Handle to the current request's session, found in request extensions.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    store: SessionStore,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.store.get(&self.id, key)
    }

    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.store.insert(&self.id, key, value);
    }

    /// End the session.
    pub fn clear(&self) {
        self.store.remove(&self.id);
    }
}

fn session_id_from(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|h| Cookie::split_parse(h.to_string()).flatten())
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.value().to_string())
}

/// Attach a [`Session`] to every request, issuing a session cookie when the
/// client has no live session.
pub async fn session_layer(
    State(store): State<SessionStore>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let existing = session_id_from(request.headers()).filter(|id| store.touch(id));
    let fresh = existing.is_none();
    let id = existing.unwrap_or_else(|| store.create());

    request.extensions_mut().insert(Session {
        id: id.clone(),
        store: store.clone(),
    });

    let mut response = next.run(request).await;

    if fresh {
        let cookie = Cookie::build((SESSION_COOKIE, id))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(store.secure)
            .build();
        if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_values_roundtrip() {
        let store = SessionStore::default();
        let id = store.create();
        assert!(store.touch(&id));
        assert!(store.insert(&id, "user", Value::from("alice")));
        assert_eq!(store.get(&id, "user"), Some(Value::from("alice")));
        assert!(!store.insert("unknown", "user", Value::Null));
    }

    #[test]
    fn expired_sessions_are_dropped() {
        let store = SessionStore::new(Duration::ZERO);
        let id = store.create();
        std::thread::sleep(Duration::from_millis(5));
        assert!(!store.touch(&id));
        assert!(store.is_empty());

        store.create();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(store.purge_expired(), 1);
    }

    #[tokio::test]
    async fn sweeper_empties_idle_sessions() {
        let store = SessionStore::new(Duration::from_millis(5));
        for _ in 0..200 {
            store.create();
        }
        assert_eq!(store.len(), 200);

        let sweeper = store.spawn_sweeper();
        tokio::time::sleep(Duration::from_millis(100)).await;
        sweeper.abort();

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn sweeper_keeps_live_sessions() {
        let store = SessionStore::default();
        let id = store.create();

        let sweeper = store.spawn_sweeper();
        tokio::time::sleep(Duration::from_millis(20)).await;
        sweeper.abort();

        assert!(store.touch(&id));
    }

    #[test]
    fn secure_flag_defaults_off() {
        assert!(!SessionStore::default().secure_cookie());
        assert!(SessionStore::default().with_secure_cookie(true).secure_cookie());
    }

    #[test]
    fn session_id_is_read_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("a=1; session_id=abc; b=2"),
        );
        assert_eq!(session_id_from(&headers).as_deref(), Some("abc"));
        assert!(session_id_from(&HeaderMap::new()).is_none());
    }
}
