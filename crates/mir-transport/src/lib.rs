//! Transport abstraction layer for the Mir servers.
//!
//! Provides the [`Transport`] and [`Connection`] traits. A connection
//! carries whole [`Packet`]s: framing happens below this API, so callers
//! never see partial frames.
//!
//! # Feature Flags
//!
//! - `tcp` (default): plain TCP via `tokio` + `tokio_util::codec::Framed`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "tcp")]
mod tcp;

pub use error::TransportError;
#[cfg(feature = "tcp")]
pub use tcp::{TcpConnection, TcpTransport};

use std::fmt;

use mir_protocol::Packet;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// A single connection that exchanges packets.
///
/// Methods take `&mut self`: the protocol is half-duplex, so one task owns
/// the connection and alternates between reading a request and writing its
/// response.
pub trait Connection: Send + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one packet to the remote peer.
    fn send(
        &mut self,
        packet: Packet,
    ) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send;

    /// Receives the next packet from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed between
    /// frames.
    fn recv(
        &mut self,
    ) -> impl std::future::Future<Output = Result<Option<Packet>, Self::Error>> + Send;

    /// Closes the connection.
    fn close(&mut self) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
