//! The per-connection request/response loop shared by both servers.
//!
//! Each accepted connection gets its own Tokio task running
//! [`run_session`]. The flow is:
//!   1. Receive one packet
//!   2. Hand it to the connection's [`SessionHandler`]
//!   3. Send back the single response it returns
//!   4. Repeat until the peer closes or something fatal happens
//!
//! Handlers never touch the socket, so every request gets exactly one
//! response and the server never pushes unsolicited packets.

use std::future::Future;

use mir_protocol::{Packet, kind};
use mir_transport::Connection;

use crate::ServerError;

/// Per-connection request handler.
///
/// One value is created per connection and owns that connection's state
/// (who it is, where it is in the handshake). Requests on a connection are
/// handled strictly one at a time.
pub trait SessionHandler: Send + 'static {
    /// Handles one request and returns the response to send.
    ///
    /// An `Err` ends the connection without a response.
    fn handle(
        &mut self,
        packet: Packet,
    ) -> impl Future<Output = Result<Packet, ServerError>> + Send;
}

/// Runs the read → handle → write loop until the connection ends.
///
/// Returns `Ok(())` when the peer closes cleanly between packets. Codec
/// errors and handler errors end the loop with that error; the connection
/// is closed first.
pub async fn run_session<C, H>(mut conn: C, mut handler: H) -> Result<(), ServerError>
where
    C: Connection,
    H: SessionHandler,
    ServerError: From<C::Error>,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "session started");

    loop {
        let request = match conn.recv().await {
            Ok(Some(packet)) => packet,
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let request_kind = request.kind();
        tracing::trace!(%conn_id, kind = kind::name(request_kind), "request");

        let response = match handler.handle(request).await {
            Ok(response) => response,
            Err(e) => {
                // Best effort: the error is what gets reported.
                let _ = conn.close().await;
                return Err(e);
            }
        };

        tracing::trace!(
            %conn_id,
            request = kind::name(request_kind),
            response = kind::name(response.kind()),
            code = response.code(),
            "response"
        );
        conn.send(response).await?;
    }
}

#[cfg(test)]
mod tests {
    //! The loop is tested against an in-memory connection so ordering and
    //! termination can be checked without sockets.

    use std::collections::VecDeque;

    use mir_protocol::ProtocolError;
    use mir_transport::{ConnectionId, TransportError};

    use super::*;

    /// Replays queued inbound results and records what was sent.
    struct ScriptedConnection {
        inbound: VecDeque<Result<Option<Packet>, TransportError>>,
        sent: std::sync::Arc<std::sync::Mutex<Vec<Packet>>>,
        closed: std::sync::Arc<std::sync::atomic::AtomicBool>,
    }

    impl Connection for ScriptedConnection {
        type Error = TransportError;

        async fn send(&mut self, packet: Packet) -> Result<(), TransportError> {
            self.sent.lock().unwrap().push(packet);
            Ok(())
        }

        async fn recv(&mut self) -> Result<Option<Packet>, TransportError> {
            self.inbound.pop_front().unwrap_or(Ok(None))
        }

        async fn close(&mut self) -> Result<(), TransportError> {
            self.closed.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        }

        fn id(&self) -> ConnectionId {
            ConnectionId::new(1)
        }
    }

    /// Answers every request with its payload echoed under kind + 1.
    /// Kind 0 is treated as a violation.
    struct EchoHandler;

    impl SessionHandler for EchoHandler {
        async fn handle(&mut self, packet: Packet) -> Result<Packet, ServerError> {
            if packet.kind() == 0 {
                return Err(ServerError::violation(0, "kind 0"));
            }
            Ok(Packet::new(packet.kind() + 1, packet.payload))
        }
    }

    fn scripted(
        inbound: Vec<Result<Option<Packet>, TransportError>>,
    ) -> (
        ScriptedConnection,
        std::sync::Arc<std::sync::Mutex<Vec<Packet>>>,
        std::sync::Arc<std::sync::atomic::AtomicBool>,
    ) {
        let sent = std::sync::Arc::default();
        let closed = std::sync::Arc::default();
        let conn = ScriptedConnection {
            inbound: inbound.into(),
            sent: std::sync::Arc::clone(&sent),
            closed: std::sync::Arc::clone(&closed),
        };
        (conn, sent, closed)
    }

    #[tokio::test]
    async fn test_run_session_one_response_per_request_in_order() {
        let (conn, sent, _) = scripted(vec![
            Ok(Some(Packet::new(10, "a"))),
            Ok(Some(Packet::new(20, "b"))),
        ]);

        run_session(conn, EchoHandler).await.unwrap();

        let sent = sent.lock().unwrap();
        assert_eq!(*sent, vec![Packet::new(11, "a"), Packet::new(21, "b")]);
    }

    #[tokio::test]
    async fn test_run_session_handler_error_closes_without_response() {
        let (conn, sent, closed) = scripted(vec![
            Ok(Some(Packet::new(0, "bad"))),
            Ok(Some(Packet::new(10, "never read"))),
        ]);

        let err = run_session(conn, EchoHandler).await.unwrap_err();

        assert!(matches!(err, ServerError::ProtocolViolation { kind: 0, .. }));
        assert!(sent.lock().unwrap().is_empty());
        assert!(closed.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_run_session_malformed_frame_is_fatal() {
        let (conn, sent, _) = scripted(vec![
            Ok(Some(Packet::new(10, "a"))),
            Err(TransportError::ReceiveFailed(ProtocolError::MalformedPacket(
                "truncated".into(),
            ))),
        ]);

        let err = run_session(conn, EchoHandler).await.unwrap_err();

        assert!(matches!(err, ServerError::Transport(ref e) if e.is_malformed()));
        assert_eq!(sent.lock().unwrap().len(), 1);
    }
}
