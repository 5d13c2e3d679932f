//! Admin session layer — password check against a configured SHA-256
//! digest, opaque bearer tokens with a 7-day lifetime.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD as BASE64_URL};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::server::AppState;

/// Session lifetime, matching the original 7-day cookie.
fn session_ttl() -> Duration {
    Duration::days(7)
}

/// In-memory session tokens. Lost on restart, like the rest of the
/// runtime state.
#[derive(Default)]
pub struct SessionStore {
    tokens: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh token valid for 7 days.
    pub fn issue(&self) -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = BASE64_URL.encode(bytes);

        let mut tokens = self.tokens.lock().unwrap();
        tokens.insert(token.clone(), Utc::now() + session_ttl());
        token
    }

    /// Check a token, pruning it if expired.
    pub fn validate(&self, token: &str) -> bool {
        let mut tokens = self.tokens.lock().unwrap();
        match tokens.get(token) {
            Some(expires) if *expires > Utc::now() => true,
            Some(_) => {
                tokens.remove(token);
                false
            }
            None => false,
        }
    }

    pub fn revoke(&self, token: &str) {
        self.tokens.lock().unwrap().remove(token);
    }
}

/// Compare a plaintext password against the configured SHA-256 hex
/// digest. An empty configured digest rejects everything
/// (fail-closed).
pub fn verify_password(password: &str, expected_sha256_hex: &str) -> bool {
    if expected_sha256_hex.is_empty() {
        return false;
    }
    let digest = Sha256::digest(password.as_bytes());
    let hex = format!("{digest:x}");
    hex.eq_ignore_ascii_case(expected_sha256_hex)
}

/// Pull the session token out of a request: `X-Session-Token` first,
/// then `Authorization: Bearer`.
pub fn token_from_headers(headers: &axum::http::HeaderMap) -> Option<&str> {
    if let Some(token) = headers.get("x-session-token").and_then(|v| v.to_str().ok()) {
        return Some(token);
    }
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Session middleware for the protected routes.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let authorized = token_from_headers(req.headers())
        .map(|t| state.sessions.validate(t))
        .unwrap_or(false);

    if authorized {
        return next.run(req).await;
    }

    axum::response::Response::builder()
        .status(axum::http::StatusCode::UNAUTHORIZED)
        .header("Content-Type", "application/json")
        .body(axum::body::Body::from(
            serde_json::json!({"error": "unauthorized"}).to_string(),
        ))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_validate_until_revoked() {
        let sessions = SessionStore::new();
        let token = sessions.issue();
        assert!(sessions.validate(&token));
        sessions.revoke(&token);
        assert!(!sessions.validate(&token));
        assert!(!sessions.validate("never-issued"));
    }

    #[test]
    fn tokens_are_unique() {
        let sessions = SessionStore::new();
        assert_ne!(sessions.issue(), sessions.issue());
    }

    #[test]
    fn password_digest_comparison() {
        // sha256("admin123")
        let digest = "240be518fabd2724ddb6f04eeb1da5967448d7e831c08c8fa822809f74c720a9";
        assert!(verify_password("admin123", digest));
        assert!(verify_password("admin123", &digest.to_uppercase()));
        assert!(!verify_password("admin124", digest));
        // No configured digest means no way in.
        assert!(!verify_password("anything", ""));
    }
}
