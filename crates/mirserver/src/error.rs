//! Unified error type for the Mir servers.

use mir_protocol::{ProtocolError, kind};
use mir_session::SessionError;
use mir_store::StoreError;
use mir_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impls, so
/// `?` converts sub-crate errors automatically.
///
/// Any of these returned from a handler ends the connection. Recoverable
/// failures (bad password, bad token, invalid character fields) are never
/// errors: they are ordinary response packets.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A transport-level error (accept, send, recv, malformed frame).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error outside of a handler's recovery rules.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (identity already set).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The backing store failed where no response code covers it.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The client sent a kind this server doesn't handle, or a kind that
    /// isn't valid in the connection's current state.
    #[error("protocol violation on {}: {reason}", kind::name(*.kind))]
    ProtocolViolation { kind: u16, reason: String },

    /// The configuration file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for [`MirConfig`](crate::MirConfig).
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
}

impl ServerError {
    pub(crate) fn violation(kind: u16, reason: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            kind,
            reason: reason.into(),
        }
    }
}
