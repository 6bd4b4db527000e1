//! Character roster: credential verification, character query and creation.
//!
//! A game connection starts `Unverified`. The first `CM_QUERYCHR` whose
//! `username/token` matches the ledger binds the connection to that
//! username. Every later `CM_QUERYCHR` claims again, so a credential
//! replaced by a newer login stops working mid-connection.
//!
//! `CM_NEWCHR` carries no token. It is only honored on a connection already
//! verified as the same username, and the token that connection verified
//! with is claimed again first. The slot limit is enforced by the store
//! inside `create`, together with name uniqueness.

use std::sync::Arc;

use mir_protocol::{
    ClientMessage, Gender, Job, NewCharacter, NewCharacterFailure, Packet, ProtocolError,
    QueryCharactersFailure, ServerMessage, kind,
};
use mir_session::{ClaimError, CredentialLedger, SessionIdentity};
use mir_store::{Character, CharacterStore, StoreError};
use mir_transport::ConnectionId;

use crate::{ServerError, SessionHandler};

/// Longest accepted character name, in characters.
pub const MAX_NAME_LEN: usize = 14;

/// Highest hair style index.
pub const MAX_HAIR: u8 = 9;

/// Level of a newly created character.
const STARTING_LEVEL: u16 = 1;

/// Handles one game connection.
pub struct GameHandler<S> {
    conn_id: ConnectionId,
    store: Arc<S>,
    ledger: Arc<CredentialLedger>,
    max_characters: usize,
    identity: SessionIdentity,
    token: Option<String>,
}

impl<S: CharacterStore> GameHandler<S> {
    pub fn new(
        conn_id: ConnectionId,
        store: Arc<S>,
        ledger: Arc<CredentialLedger>,
        max_characters: usize,
    ) -> Self {
        Self {
            conn_id,
            store,
            ledger,
            max_characters,
            identity: SessionIdentity::new(),
            token: None,
        }
    }

    /// The username this connection verified as, once it has.
    pub fn username(&self) -> Option<&str> {
        self.identity.username()
    }

    async fn dispatch(&mut self, packet: &Packet) -> Result<ServerMessage, ServerError> {
        let message = match ClientMessage::parse(packet) {
            Ok(message) => message,
            Err(ProtocolError::MalformedPayload {
                kind: kind::CM_QUERYCHR,
                ..
            }) => {
                return Ok(ServerMessage::QueryCharactersFail(
                    QueryCharactersFailure::Malformed,
                ));
            }
            Err(ProtocolError::MalformedPayload {
                kind: kind::CM_NEWCHR,
                ..
            }) => {
                let reason = if self.identity.is_set() {
                    NewCharacterFailure::InvalidFields
                } else {
                    NewCharacterFailure::NotVerified
                };
                return Ok(ServerMessage::NewCharacterFail(reason));
            }
            Err(ProtocolError::MalformedPayload { kind, reason }) => {
                return Err(ServerError::violation(kind, reason));
            }
            Err(ProtocolError::UnknownKind(kind)) => {
                return Err(ServerError::violation(kind, "not a game request"));
            }
            Err(e) => return Err(e.into()),
        };

        match message {
            ClientMessage::QueryCharacters { username, token } => {
                self.query_characters(username, token).await
            }
            ClientMessage::NewCharacter(request) => Ok(self.new_character(request).await),
            other => Err(ServerError::violation(
                other.kind(),
                "login request sent to a game server",
            )),
        }
    }

    async fn query_characters(
        &mut self,
        username: String,
        token: String,
    ) -> Result<ServerMessage, ServerError> {
        if let Err(reason) = self.verify(&username, &token).await {
            return Ok(ServerMessage::QueryCharactersFail(reason));
        }
        self.bind(&username, token)?;

        let characters = self.store.find_by_owner(&username).await?;
        Ok(ServerMessage::CharacterList {
            characters: characters.iter().map(Character::summary).collect(),
        })
    }

    /// Claims the credential presented with a `CM_QUERYCHR`.
    async fn verify(&self, username: &str, token: &str) -> Result<(), QueryCharactersFailure> {
        if self.identity.is_set() && !self.identity.is(username) {
            tracing::debug!(
                conn_id = %self.conn_id,
                verified = self.identity.username(),
                presented = username,
                "username differs from verified identity"
            );
            return Err(QueryCharactersFailure::TokenMismatch);
        }

        self.ledger.claim(username, token).await.map_err(|e| {
            tracing::debug!(conn_id = %self.conn_id, %username, error = %e, "credential refused");
            match e {
                ClaimError::Unknown | ClaimError::Expired => QueryCharactersFailure::UnknownUser,
                ClaimError::Mismatch => QueryCharactersFailure::TokenMismatch,
            }
        })
    }

    /// Remembers the accepted token and binds the identity on first success.
    fn bind(&mut self, username: &str, token: String) -> Result<(), ServerError> {
        self.token = Some(token);
        if self.identity.is(username) {
            return Ok(());
        }

        self.identity.set(username)?;
        tracing::info!(
            conn_id = %self.conn_id,
            %username,
            server_id = %self.ledger.server_id(),
            "connection verified"
        );
        Ok(())
    }

    /// Claims again the token this connection verified with.
    async fn reclaim(&self, username: &str) -> Result<(), NewCharacterFailure> {
        let token = match &self.token {
            Some(token) if self.identity.is(username) => token,
            _ => return Err(NewCharacterFailure::NotVerified),
        };

        self.ledger.claim(username, token).await.map_err(|e| {
            tracing::debug!(conn_id = %self.conn_id, %username, error = %e, "credential no longer valid");
            NewCharacterFailure::NotVerified
        })
    }

    async fn new_character(&self, request: NewCharacter) -> ServerMessage {
        match self.create(request).await {
            Ok(()) => ServerMessage::NewCharacterOk,
            Err(reason) => ServerMessage::NewCharacterFail(reason),
        }
    }

    async fn create(&self, request: NewCharacter) -> Result<(), NewCharacterFailure> {
        self.reclaim(&request.username).await?;

        let character = validate(request)?;

        if self.store.name_exists(&character.name).await.map_err(|e| self.internal(e))? {
            return Err(NewCharacterFailure::NameTaken);
        }

        let (owner, name) = (character.owner.clone(), character.name.clone());
        match self.store.create(character, self.max_characters).await {
            Ok(()) => {
                tracing::info!(conn_id = %self.conn_id, %owner, %name, "character created");
                Ok(())
            }
            Err(StoreError::NameTaken(_)) => Err(NewCharacterFailure::NameTaken),
            Err(StoreError::NoFreeSlot(_)) => Err(NewCharacterFailure::NoFreeSlot),
            Err(e) => Err(self.internal(e)),
        }
    }

    fn internal(&self, error: StoreError) -> NewCharacterFailure {
        tracing::error!(conn_id = %self.conn_id, %error, "character store failed");
        NewCharacterFailure::Internal
    }
}

impl<S: CharacterStore> SessionHandler for GameHandler<S> {
    async fn handle(&mut self, packet: Packet) -> Result<Packet, ServerError> {
        let response = self.dispatch(&packet).await?;
        Ok(response.to_packet())
    }
}

/// Checks a creation request's fields and builds the record to store.
fn validate(request: NewCharacter) -> Result<Character, NewCharacterFailure> {
    let name_ok = {
        let len = request.name.chars().count();
        (1..=MAX_NAME_LEN).contains(&len)
            && !request.name.chars().any(|c| c.is_whitespace() || c == '/')
    };
    if !name_ok || request.hair > MAX_HAIR {
        return Err(NewCharacterFailure::InvalidFields);
    }

    let job = Job::try_from(request.job).map_err(|_| NewCharacterFailure::InvalidFields)?;
    let gender = Gender::try_from(request.sex).map_err(|_| NewCharacterFailure::InvalidFields)?;

    Ok(Character {
        owner: request.username,
        name: request.name,
        job,
        hair: request.hair,
        gender,
        level: STARTING_LEVEL,
    })
}
