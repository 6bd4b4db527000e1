use mir_protocol::ProtocolError;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection was closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Sending a packet failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] ProtocolError),

    /// Receiving a packet failed: the peer sent a bad frame or the socket
    /// broke mid-read.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] ProtocolError),

    /// Binding or accepting connections failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),
}

impl TransportError {
    /// Returns `true` if the peer sent bytes that don't form a valid frame.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::ReceiveFailed(ProtocolError::MalformedPacket(_))
        )
    }
}
