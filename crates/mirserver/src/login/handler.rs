//! Login handshake: password check, server list, server selection.
//!
//! A connection moves through three states:
//!
//! ```text
//! Unauthenticated ──CM_IDPASSWORD ok──→ Authenticated ──CM_SELECTSERVER ok──→ ServerChosen
//!     ↺ bad password                        ↺ unknown server
//! ```
//!
//! Failed attempts keep the state so the client may retry. Anything sent
//! out of sequence, and anything after `ServerChosen`, is a protocol
//! violation and ends the connection.

use std::sync::Arc;

use mir_protocol::{ClientMessage, Packet, ProtocolError, ServerMessage, kind};
use mir_session::{CertRouter, Credential, SessionIdentity};
use mir_store::{ServerDirectory, UserDirectory};
use mir_transport::ConnectionId;

use crate::{ServerError, SessionHandler};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginState {
    Unauthenticated,
    Authenticated,
    ServerChosen,
}

/// Handles one login connection.
pub struct LoginHandler<S> {
    conn_id: ConnectionId,
    store: Arc<S>,
    router: Arc<CertRouter>,
    identity: SessionIdentity,
    state: LoginState,
}

impl<S> LoginHandler<S>
where
    S: UserDirectory + ServerDirectory,
{
    pub fn new(conn_id: ConnectionId, store: Arc<S>, router: Arc<CertRouter>) -> Self {
        Self {
            conn_id,
            store,
            router,
            identity: SessionIdentity::new(),
            state: LoginState::Unauthenticated,
        }
    }

    /// The username this connection logged in as, once it has.
    pub fn username(&self) -> Option<&str> {
        self.identity.username()
    }

    async fn dispatch(&mut self, packet: &Packet) -> Result<ServerMessage, ServerError> {
        let message = match ClientMessage::parse(packet) {
            Ok(message) => message,
            Err(ProtocolError::MalformedPayload { kind, reason }) => {
                return self.malformed(kind, reason);
            }
            Err(ProtocolError::UnknownKind(kind)) => {
                return Err(ServerError::violation(kind, "not a login request"));
            }
            Err(e) => return Err(e.into()),
        };

        match (self.state, message) {
            (LoginState::Unauthenticated, ClientMessage::IdPassword { username, password }) => {
                self.login(username, password).await
            }
            (LoginState::Authenticated, ClientMessage::SelectServer { server_name }) => {
                self.select_server(server_name).await
            }
            (state, message) => Err(ServerError::violation(
                message.kind(),
                format!("unexpected in state {state:?}"),
            )),
        }
    }

    /// A payload that doesn't parse for its kind. Only the two login
    /// requests have a failure answer, and only in the state they're
    /// valid in.
    fn malformed(&self, kind: u16, reason: String) -> Result<ServerMessage, ServerError> {
        match (self.state, kind) {
            (LoginState::Unauthenticated, kind::CM_IDPASSWORD) => {
                tracing::debug!(conn_id = %self.conn_id, %reason, "malformed login request");
                Ok(ServerMessage::PasswordFail)
            }
            (LoginState::Authenticated, kind::CM_SELECTSERVER) => {
                tracing::debug!(conn_id = %self.conn_id, %reason, "malformed server selection");
                Ok(ServerMessage::SelectServerFail)
            }
            _ => Err(ServerError::violation(kind, reason)),
        }
    }

    async fn login(
        &mut self,
        username: String,
        password: String,
    ) -> Result<ServerMessage, ServerError> {
        let user = match UserDirectory::find(self.store.as_ref(), &username).await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(conn_id = %self.conn_id, %username, error = %e, "user lookup failed");
                return Ok(ServerMessage::PasswordFail);
            }
        };

        // Unknown user and wrong password produce the same answer.
        if !user.is_some_and(|u| u.password == password) {
            tracing::debug!(conn_id = %self.conn_id, %username, "login rejected");
            return Ok(ServerMessage::PasswordFail);
        }

        let servers = match self.store.all().await {
            Ok(servers) => servers,
            Err(e) => {
                tracing::error!(conn_id = %self.conn_id, %username, error = %e, "server list unavailable");
                return Ok(ServerMessage::PasswordFail);
            }
        };

        self.identity.set(username.as_str())?;
        self.state = LoginState::Authenticated;
        tracing::info!(conn_id = %self.conn_id, %username, servers = servers.len(), "user logged in");

        Ok(ServerMessage::ServerList {
            servers: servers.iter().map(|s| s.list_entry()).collect(),
        })
    }

    async fn select_server(&mut self, server_name: String) -> Result<ServerMessage, ServerError> {
        let Some(username) = self.identity.username().map(str::to_owned) else {
            return Err(ServerError::violation(
                kind::CM_SELECTSERVER,
                "authenticated without identity",
            ));
        };

        let server = match ServerDirectory::find(self.store.as_ref(), &server_name).await {
            Ok(Some(server)) => server,
            Ok(None) => {
                tracing::debug!(conn_id = %self.conn_id, %username, %server_name, "unknown server");
                return Ok(ServerMessage::SelectServerFail);
            }
            Err(e) => {
                tracing::error!(conn_id = %self.conn_id, %server_name, error = %e, "server lookup failed");
                return Ok(ServerMessage::SelectServerFail);
            }
        };

        let credential = Credential::issue(username.as_str(), server.id);
        let token = credential.token.clone();

        // The client still gets its answer; it will fail at the game server.
        if let Err(e) = self.router.deliver(credential).await {
            tracing::error!(
                conn_id = %self.conn_id,
                %username,
                server_id = %server.id,
                error = %e,
                "credential delivery failed"
            );
        }

        self.state = LoginState::ServerChosen;
        tracing::info!(conn_id = %self.conn_id, %username, server_id = %server.id, "server selected");

        Ok(ServerMessage::SelectServerOk {
            address: server.game_addr,
            port: server.game_port,
            token,
        })
    }
}

impl<S> SessionHandler for LoginHandler<S>
where
    S: UserDirectory + ServerDirectory,
{
    async fn handle(&mut self, packet: Packet) -> Result<Packet, ServerError> {
        let response = self.dispatch(&packet).await?;
        Ok(response.to_packet())
    }
}
