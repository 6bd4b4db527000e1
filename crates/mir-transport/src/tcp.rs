//! TCP transport implementation using `tokio_util::codec::Framed`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::{SinkExt, StreamExt};
use mir_protocol::{CodecConfig, Packet, PacketCodec};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// A TCP [`Transport`] that listens for incoming connections.
pub struct TcpTransport {
    listener: TcpListener,
    codec: CodecConfig,
}

impl TcpTransport {
    /// Binds a new TCP transport to the given address.
    pub async fn bind(addr: &str, codec: CodecConfig) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "TCP transport listening");
        Ok(Self { listener, codec })
    }

    /// Returns the address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for TcpTransport {
    type Connection = TcpConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, %addr, "accepted TCP connection");

        Ok(TcpConnection::from_stream(id, stream, self.codec.clone()))
    }
}

/// A single framed TCP connection.
pub struct TcpConnection {
    id: ConnectionId,
    framed: Framed<TcpStream, PacketCodec>,
}

impl TcpConnection {
    /// Opens an outbound connection. Used by clients and tests.
    pub async fn connect(addr: &str) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        Ok(Self::from_stream(id, stream, CodecConfig::default()))
    }

    fn from_stream(id: ConnectionId, stream: TcpStream, codec: CodecConfig) -> Self {
        Self {
            id,
            framed: Framed::new(stream, PacketCodec::new(codec)),
        }
    }

    /// Sends a request and waits for the single response to it.
    pub async fn request(&mut self, packet: Packet) -> Result<Packet, TransportError> {
        self.send(packet).await?;
        self.recv()
            .await?
            .ok_or_else(|| TransportError::ConnectionClosed("no response".into()))
    }
}

impl Connection for TcpConnection {
    type Error = TransportError;

    async fn send(&mut self, packet: Packet) -> Result<(), Self::Error> {
        self.framed
            .send(packet)
            .await
            .map_err(TransportError::SendFailed)
    }

    async fn recv(&mut self) -> Result<Option<Packet>, Self::Error> {
        match self.framed.next().await {
            Some(Ok(packet)) => Ok(Some(packet)),
            Some(Err(e)) => Err(TransportError::ReceiveFailed(e)),
            None => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        self.framed
            .close()
            .await
            .map_err(TransportError::SendFailed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
