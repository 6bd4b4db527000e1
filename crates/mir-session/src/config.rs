//! Tunables for credentials and their delivery.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for a game server's credential ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// How long (in seconds) an issued credential stays claimable.
    ///
    /// `None` (the default) keeps a credential until the next server
    /// selection by the same user replaces it.
    pub credential_ttl_secs: Option<u64>,
}

impl LedgerConfig {
    /// The time-to-live as a `Duration`, if one is configured.
    pub fn ttl(&self) -> Option<Duration> {
        self.credential_ttl_secs.map(Duration::from_secs)
    }
}

/// Configuration for the login → game handoff queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandoffConfig {
    /// Maximum number of credentials waiting to be deposited. Deliveries
    /// beyond this are rejected rather than buffered.
    pub capacity: usize,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self { capacity: 100 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_config_default_has_no_expiry() {
        assert!(LedgerConfig::default().ttl().is_none());
    }

    #[test]
    fn test_ledger_config_ttl_in_seconds() {
        let config = LedgerConfig {
            credential_ttl_secs: Some(300),
        };
        assert_eq!(config.ttl(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_handoff_config_default_capacity() {
        assert_eq!(HandoffConfig::default().capacity, 100);
    }
}
