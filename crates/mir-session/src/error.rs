//! Error types for the session layer.

use mir_protocol::ServerId;

/// Errors raised by the ledger and by connection identity.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A credential was deposited into the ledger of a server it wasn't
    /// issued for.
    #[error("credential for {username} targets {got}, ledger serves {expected}")]
    WrongServer {
        username: String,
        expected: ServerId,
        got: ServerId,
    },

    /// The connection already has an identity; it can only be set once.
    #[error("session identity already set to {0}")]
    IdentityAlreadySet(String),
}

/// Why a presented `(username, token)` pair was not honored.
///
/// Variants are ordered by the precedence the ledger checks them in:
/// absence is detected before any token comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ClaimError {
    /// No pending credential for this username.
    #[error("no pending credential")]
    Unknown,

    /// A credential existed but outlived the configured time-to-live.
    /// It has been removed.
    #[error("credential expired")]
    Expired,

    /// A credential exists but the token differs.
    #[error("token mismatch")]
    Mismatch,
}

/// Errors delivering a credential from the login server to a game server.
///
/// These are operational failures: they get logged, never sent to the
/// client verbatim.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The target's handoff queue is at capacity.
    #[error("handoff queue for {0} is full")]
    ChannelFull(ServerId),

    /// No route to the target, or its intake task is gone.
    #[error("game server {0} is unreachable")]
    Unreachable(ServerId),

    /// The target's ledger refused the credential.
    #[error("game server {0} rejected credential: {1}")]
    Rejected(ServerId, #[source] SessionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_error_display_names_server() {
        let err = DeliveryError::ChannelFull(ServerId(2));
        assert_eq!(err.to_string(), "handoff queue for S-2 is full");
    }

    #[test]
    fn test_rejected_keeps_source() {
        use std::error::Error;
        let err = DeliveryError::Rejected(
            ServerId(1),
            SessionError::WrongServer {
                username: "pangliang".into(),
                expected: ServerId(1),
                got: ServerId(2),
            },
        );
        assert!(err.source().is_some());
    }
}
