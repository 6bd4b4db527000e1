//! `LoginServer` builder and accept loop.

use std::net::SocketAddr;
use std::sync::Arc;

use mir_protocol::CodecConfig;
use mir_session::{CertRouter, CertSender};
use mir_store::{ServerDirectory, UserDirectory};
use mir_transport::{Connection, TcpTransport, Transport};

use super::LoginHandler;
use crate::{LoginConfig, ServerError, run_session};

/// Builder for configuring and starting a login server.
///
/// # Example
///
/// ```rust,ignore
/// let login = LoginServerBuilder::new()
///     .bind("0.0.0.0:7000")
///     .route(game.cert_sender())
///     .build(store)
///     .await?;
/// login.run().await
/// ```
pub struct LoginServerBuilder {
    bind_addr: String,
    codec: CodecConfig,
    router: CertRouter,
}

impl LoginServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::from_config(&LoginConfig::default())
    }

    /// Starts from a [`LoginConfig`].
    pub fn from_config(config: &LoginConfig) -> Self {
        Self {
            bind_addr: config.bind.clone(),
            codec: CodecConfig::default(),
            router: CertRouter::new(),
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

    /// Adds the handoff queue of one game server.
    pub fn route(mut self, sender: CertSender) -> Self {
        let server_id = sender.server_id();
        if self.router.add_route(sender) {
            tracing::warn!(%server_id, "replaced handoff route for duplicate server id");
        }
        self
    }

    /// Binds the listener.
    pub async fn build<S>(self, store: Arc<S>) -> Result<LoginServer<S>, ServerError>
    where
        S: UserDirectory + ServerDirectory,
    {
        let transport = TcpTransport::bind(&self.bind_addr, self.codec).await?;
        Ok(LoginServer {
            transport,
            store,
            router: Arc::new(self.router),
        })
    }
}

impl Default for LoginServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound login server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct LoginServer<S> {
    transport: TcpTransport,
    store: Arc<S>,
    router: Arc<CertRouter>,
}

impl<S> LoginServer<S>
where
    S: UserDirectory + ServerDirectory,
{
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop. Each connection gets its own task; this only
    /// returns if the process is shutting down.
    pub async fn run(mut self) -> Result<(), ServerError> {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "login server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let conn_id = conn.id();
                    let handler =
                        LoginHandler::new(conn_id, Arc::clone(&self.store), Arc::clone(&self.router));
                    tokio::spawn(async move {
                        if let Err(e) = run_session(conn, handler).await {
                            tracing::debug!(%conn_id, error = %e, "login connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
