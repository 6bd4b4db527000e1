//! Error types for the protocol layer.
//!
//! Framing problems and payload problems are separate variants. A framing
//! error means the byte stream can no longer be trusted; a payload error
//! only concerns one request and can be answered with a failure packet.

/// Errors that can occur while framing or interpreting packets.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The byte stream did not contain a complete, well-formed frame.
    ///
    /// Covers oversized or undersized length prefixes, non-UTF-8 payloads,
    /// and streams that close in the middle of a frame. Always fatal for
    /// the connection.
    #[error("malformed packet: {0}")]
    MalformedPacket(String),

    /// The header carried a `kind` this side of the protocol doesn't know.
    #[error("unknown message kind {0}")]
    UnknownKind(u16),

    /// The `kind` is known but its payload has the wrong shape
    /// (field count, non-numeric field, ...).
    #[error("malformed payload for kind {kind}: {reason}")]
    MalformedPayload {
        /// The message kind whose grammar was violated.
        kind: u16,
        /// What was wrong with it.
        reason: String,
    },

    /// The underlying stream failed.
    ///
    /// `tokio_util::codec` requires decoder errors to be constructible
    /// from `std::io::Error`.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
