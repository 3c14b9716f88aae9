//! Session store and login checks
//!
//! The only shared mutable state in the service. Tokens live in process
//! memory and vanish on restart.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::config::WebCredentials;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// Session lifetime in seconds (24 hours)
pub const SESSION_TTL_SECS: i64 = 86_400;

/// In-memory session tokens with expiry
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new random token valid for [`SESSION_TTL_SECS`].
    ///
    /// Sessions already expired at `now` are dropped first.
    pub fn create(&self, now: DateTime<Utc>) -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        let expires_at = now + Duration::seconds(SESSION_TTL_SECS);
        let mut sessions = self.lock();
        sessions.retain(|_, expiry| *expiry > now);
        sessions.insert(token.clone(), expires_at);
        token
    }

    /// Whether `token` names a live session. Expired tokens are dropped.
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> bool {
        let mut sessions = self.lock();
        match sessions.get(token) {
            Some(expires_at) if *expires_at > now => true,
            Some(_) => {
                sessions.remove(token);
                false
            }
            None => false,
        }
    }

    pub fn destroy(&self, token: &str) {
        self.lock().remove(token);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Compare a login attempt against the configured credentials.
///
/// Both sides are hashed first so the comparison time does not depend on
/// where the inputs differ or on their lengths.
pub fn credentials_match(expected: &WebCredentials, username: &str, password: &str) -> bool {
    let user_ok = digest_eq(&expected.username, username);
    let pass_ok = digest_eq(&expected.password, password);
    user_ok & pass_ok
}

fn digest_eq(a: &str, b: &str) -> bool {
    let a = Sha256::digest(a.as_bytes());
    let b = Sha256::digest(b.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Pull the session token out of a `Cookie` header value
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value for a fresh session
pub fn session_cookie(token: &str) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, token, SESSION_TTL_SECS
    )
}

/// `Set-Cookie` value that clears the session
pub fn expired_session_cookie() -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE)
}
