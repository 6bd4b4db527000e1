//! The credential ledger: a game server's table of credentials waiting to
//! be presented by clients.
//!
//! The ledger is written by the handoff intake (one deposit per server
//! selection on the login server) and read by every connection's
//! verification path. Both go through one mutex, and no lock is held across
//! an `.await` other than acquiring it, so a deposit and a claim for the
//! same username are always seen whole.
//!
//! # Policy
//!
//! - One slot per username. A new deposit replaces the old one, so only
//!   the most recent server selection is honored.
//! - A successful claim leaves the entry in place: the client sends several
//!   character requests after one handshake and each presents the token.
//! - Optional time-to-live ([`LedgerConfig::credential_ttl_secs`]). Expired
//!   entries are dropped when claimed, and every deposit sweeps out the rest,
//!   so credentials nobody presents don't pile up.

use std::collections::HashMap;

use mir_protocol::ServerId;
use tokio::sync::Mutex;

use crate::{ClaimError, Credential, LedgerConfig, SessionError};

/// Pending credentials for one game server.
///
/// Shared as `Arc<CredentialLedger>`: the game server creates it at
/// construction time and hands clones to the intake task and to each
/// connection handler.
#[derive(Debug)]
pub struct CredentialLedger {
    server_id: ServerId,
    config: LedgerConfig,
    entries: Mutex<HashMap<String, Credential>>,
}

impl CredentialLedger {
    /// Creates an empty ledger for the given server.
    pub fn new(server_id: ServerId, config: LedgerConfig) -> Self {
        Self {
            server_id,
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The server this ledger accepts credentials for.
    pub fn server_id(&self) -> ServerId {
        self.server_id
    }

    /// Stores a credential, replacing any pending one for the same user.
    ///
    /// Expired entries are swept out under the same lock first.
    ///
    /// # Errors
    /// [`SessionError::WrongServer`] if the credential targets another
    /// server.
    pub async fn deposit(&self, credential: Credential) -> Result<(), SessionError> {
        if credential.server_id != self.server_id {
            tracing::warn!(
                server_id = %self.server_id,
                target = %credential.server_id,
                username = %credential.username,
                "rejecting credential for another server"
            );
            return Err(SessionError::WrongServer {
                username: credential.username,
                expected: self.server_id,
                got: credential.server_id,
            });
        }

        let username = credential.username.clone();
        let replaced = {
            let mut entries = self.entries.lock().await;
            self.purge_expired(&mut entries);
            entries.insert(username.clone(), credential).is_some()
        };

        tracing::debug!(server_id = %self.server_id, %username, replaced, "credential deposited");
        Ok(())
    }

    /// Checks a presented `(username, token)` pair.
    ///
    /// Absence is checked first, then expiry, then the token itself.
    ///
    /// # Errors
    /// - [`ClaimError::Unknown`]: nothing pending for `username`
    /// - [`ClaimError::Expired`]: pending but past its TTL (now removed)
    /// - [`ClaimError::Mismatch`]: pending, but `token` differs
    pub async fn claim(&self, username: &str, token: &str) -> Result<(), ClaimError> {
        let mut entries = self.entries.lock().await;

        let credential = entries.get(username).ok_or(ClaimError::Unknown)?;

        if credential.is_expired(self.config.ttl()) {
            entries.remove(username);
            tracing::debug!(server_id = %self.server_id, %username, "credential expired");
            return Err(ClaimError::Expired);
        }

        if credential.token != token {
            return Err(ClaimError::Mismatch);
        }

        Ok(())
    }

    /// Drops every credential past its TTL. A no-op without a TTL.
    fn purge_expired(&self, entries: &mut HashMap<String, Credential>) {
        let ttl = self.config.ttl();
        if ttl.is_none() {
            return;
        }

        let before = entries.len();
        entries.retain(|_, credential| !credential.is_expired(ttl));

        let purged = before - entries.len();
        if purged > 0 {
            tracing::info!(server_id = %self.server_id, purged, "purged expired credentials");
        }
    }

    /// Returns the number of pending credentials.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Returns `true` if nothing is pending.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
