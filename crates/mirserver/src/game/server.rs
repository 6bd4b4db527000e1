//! `GameServer` builder and accept loop.

use std::net::SocketAddr;
use std::sync::Arc;

use mir_protocol::{CodecConfig, ServerId};
use mir_session::{CertSender, CredentialLedger, spawn_intake};
use mir_store::CharacterStore;
use mir_transport::{Connection, TcpTransport, Transport};

use super::GameHandler;
use crate::{GameConfig, ServerError, run_session};

/// Builder for configuring and starting a game server.
///
/// # Example
///
/// ```rust,ignore
/// let game = GameServerBuilder::new(ServerId(1))
///     .bind("0.0.0.0:7400")
///     .build(store)
///     .await?;
/// let sender = game.cert_sender(); // hand this to the login server
/// game.run().await
/// ```
pub struct GameServerBuilder {
    server_id: ServerId,
    bind_addr: String,
    codec: CodecConfig,
    config: GameConfig,
}

impl GameServerBuilder {
    /// Creates a builder for the server with this directory id.
    pub fn new(server_id: ServerId) -> Self {
        Self {
            server_id,
            bind_addr: "127.0.0.1:7400".to_string(),
            codec: CodecConfig::default(),
            config: GameConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the framing limits.
    pub fn codec(mut self, codec: CodecConfig) -> Self {
        self.codec = codec;
        self
    }

    /// Sets the roster, ledger and handoff configuration.
    pub fn config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds the listener, creates the ledger and starts its intake task.
    ///
    /// Must be called inside a Tokio runtime.
    pub async fn build<S: CharacterStore>(self, store: Arc<S>) -> Result<GameServer<S>, ServerError> {
        let transport = TcpTransport::bind(&self.bind_addr, self.codec).await?;
        let ledger = Arc::new(CredentialLedger::new(self.server_id, self.config.ledger));
        let cert_sender = spawn_intake(Arc::clone(&ledger), &self.config.handoff);

        Ok(GameServer {
            transport,
            store,
            ledger,
            cert_sender,
            max_characters: self.config.max_characters,
        })
    }
}

/// A bound game server with its credential ledger.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct GameServer<S> {
    transport: TcpTransport,
    store: Arc<S>,
    ledger: Arc<CredentialLedger>,
    cert_sender: CertSender,
    max_characters: usize,
}

impl<S: CharacterStore> GameServer<S> {
    pub fn server_id(&self) -> ServerId {
        self.ledger.server_id()
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// The handle the login server delivers credentials through.
    pub fn cert_sender(&self) -> CertSender {
        self.cert_sender.clone()
    }

    /// Runs the accept loop. Each connection gets its own task; this only
    /// returns if the process is shutting down.
    pub async fn run(mut self) -> Result<(), ServerError> {
        let server_id = self.server_id();
        tracing::info!(%server_id, addr = ?self.transport.local_addr().ok(), "game server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let conn_id = conn.id();
                    let handler = GameHandler::new(
                        conn_id,
                        Arc::clone(&self.store),
                        Arc::clone(&self.ledger),
                        self.max_characters,
                    );
                    tokio::spawn(async move {
                        if let Err(e) = run_session(conn, handler).await {
                            tracing::debug!(%server_id, %conn_id, error = %e, "game connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(%server_id, error = %e, "accept failed");
                }
            }
        }
    }
}
