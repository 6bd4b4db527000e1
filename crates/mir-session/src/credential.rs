//! Credentials: short-lived proof that a user passed the login server and
//! picked a specific game server.
//!
//! The login server is the only producer. A credential is never persisted;
//! it lives in exactly one game server's [`CredentialLedger`] until a newer
//! one for the same user replaces it.
//!
//! [`CredentialLedger`]: crate::CredentialLedger

use std::time::{Duration, Instant};

use mir_protocol::ServerId;
use rand::Rng;

/// A credential issued for one user and one target server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Account the credential was issued to.
    pub username: String,

    /// The only game server that may honor it.
    pub server_id: ServerId,

    /// The secret the client presents as `username/token`.
    ///
    /// A 32-character hex string (128 bits of randomness).
    pub token: String,

    /// When the login server issued it. Used for optional expiry.
    pub issued_at: Instant,
}

impl Credential {
    /// Issues a fresh credential with a newly generated token.
    pub fn issue(username: impl Into<String>, server_id: ServerId) -> Self {
        Self {
            username: username.into(),
            server_id,
            token: generate_token(),
            issued_at: Instant::now(),
        }
    }

    /// Returns `true` if `ttl` is set and has elapsed since issuance.
    pub fn is_expired(&self, ttl: Option<Duration>) -> bool {
        ttl.is_some_and(|ttl| self.issued_at.elapsed() > ttl)
    }
}

/// Generates a random 32-character hex string (128 bits of entropy).
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_generates_hex_token() {
        let cred = Credential::issue("pangliang", ServerId(1));
        assert_eq!(cred.username, "pangliang");
        assert_eq!(cred.server_id, ServerId(1));
        assert_eq!(cred.token.len(), 32);
        assert!(cred.token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_issue_tokens_are_unique() {
        let a = Credential::issue("pangliang", ServerId(1));
        let b = Credential::issue("pangliang", ServerId(1));
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_is_expired_without_ttl_never_expires() {
        let cred = Credential::issue("pangliang", ServerId(1));
        assert!(!cred.is_expired(None));
    }

    #[test]
    fn test_is_expired_with_zero_ttl() {
        let mut cred = Credential::issue("pangliang", ServerId(1));
        cred.issued_at -= Duration::from_millis(5);
        assert!(cred.is_expired(Some(Duration::ZERO)));
        assert!(!cred.is_expired(Some(Duration::from_secs(3600))));
    }
}
