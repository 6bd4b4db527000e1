//! Typed views of the packets each side sends.
//!
//! The raw header reuses `code` for different things depending on `kind`.
//! These enums give every kind its own variant, and failure variants carry
//! a named reason whose wire code is fixed in one place.

use crate::{Gender, Job, Packet, ProtocolError, ServerId, kind, push_record};

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Fields of a `CM_NEWCHR` request, as sent.
///
/// `job` and `sex` are kept as raw numbers: range checks belong to the
/// roster handler, which answers them with a failure code instead of a
/// parse error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCharacter {
    pub username: String,
    pub name: String,
    pub hair: u8,
    pub job: u8,
    pub sex: u8,
}

/// A request from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// `CM_IDPASSWORD`: `username/password`.
    IdPassword { username: String, password: String },

    /// `CM_SELECTSERVER`: `server-name`.
    SelectServer { server_name: String },

    /// `CM_QUERYCHR`: `username/token`.
    QueryCharacters { username: String, token: String },

    /// `CM_NEWCHR`: `username/name/hair/job/sex/`.
    NewCharacter(NewCharacter),
}

impl ClientMessage {
    /// Interprets a packet according to its `kind`.
    ///
    /// # Errors
    /// - [`ProtocolError::UnknownKind`] if the kind is not a client request.
    /// - [`ProtocolError::MalformedPayload`] if the payload has the wrong
    ///   number of fields or a numeric field doesn't parse.
    pub fn parse(packet: &Packet) -> Result<Self, ProtocolError> {
        let kind = packet.kind();
        let params = packet.params();

        match kind {
            kind::CM_IDPASSWORD => {
                let [username, password] = fields::<2>(kind, &params)?;
                Ok(Self::IdPassword {
                    username: username.to_string(),
                    password: password.to_string(),
                })
            }
            kind::CM_SELECTSERVER => {
                let [server_name] = fields::<1>(kind, &params)?;
                if server_name.is_empty() {
                    return Err(malformed(kind, "empty server name"));
                }
                Ok(Self::SelectServer {
                    server_name: server_name.to_string(),
                })
            }
            kind::CM_QUERYCHR => {
                let [username, token] = fields::<2>(kind, &params)?;
                Ok(Self::QueryCharacters {
                    username: username.to_string(),
                    token: token.to_string(),
                })
            }
            kind::CM_NEWCHR => {
                let [username, name, hair, job, sex] = fields::<5>(kind, &params)?;
                Ok(Self::NewCharacter(NewCharacter {
                    username: username.to_string(),
                    name: name.to_string(),
                    hair: number(kind, "hair", hair)?,
                    job: number(kind, "job", job)?,
                    sex: number(kind, "sex", sex)?,
                }))
            }
            other => Err(ProtocolError::UnknownKind(other)),
        }
    }

    /// The wire kind of this request.
    pub fn kind(&self) -> u16 {
        match self {
            Self::IdPassword { .. } => kind::CM_IDPASSWORD,
            Self::SelectServer { .. } => kind::CM_SELECTSERVER,
            Self::QueryCharacters { .. } => kind::CM_QUERYCHR,
            Self::NewCharacter(_) => kind::CM_NEWCHR,
        }
    }

    /// Builds the packet a client sends for this request.
    pub fn to_packet(&self) -> Packet {
        let payload = match self {
            Self::IdPassword { username, password } => format!("{username}/{password}"),
            Self::SelectServer { server_name } => server_name.clone(),
            Self::QueryCharacters { username, token } => format!("{username}/{token}"),
            Self::NewCharacter(c) => {
                let mut out = String::new();
                push_record(
                    &mut out,
                    [
                        c.username.clone(),
                        c.name.clone(),
                        c.hair.to_string(),
                        c.job.to_string(),
                        c.sex.to_string(),
                    ],
                );
                out
            }
        };
        Packet::new(self.kind(), payload)
    }
}

fn malformed(kind: u16, reason: impl Into<String>) -> ProtocolError {
    ProtocolError::MalformedPayload {
        kind,
        reason: reason.into(),
    }
}

/// Checks the field count and hands the fields back as an array.
fn fields<'a, const N: usize>(kind: u16, params: &[&'a str]) -> Result<[&'a str; N], ProtocolError> {
    <[&str; N]>::try_from(params)
        .map_err(|_| malformed(kind, format!("expected {N} fields, got {}", params.len())))
}

fn number(kind: u16, field: &str, value: &str) -> Result<u8, ProtocolError> {
    value
        .parse()
        .map_err(|_| malformed(kind, format!("{field} is not a small number: {value:?}")))
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// One entry of the server list sent after a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerListEntry {
    pub name: String,
    pub id: ServerId,
}

/// The roster fields of one character, in wire order
/// `name/job/hair/level/sex/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterSummary {
    pub name: String,
    pub job: Job,
    pub hair: u8,
    pub level: u16,
    pub gender: Gender,
}

/// Why a `CM_QUERYCHR` was refused. Checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryCharactersFailure {
    /// Wrong field count.
    Malformed,
    /// No pending credential for the username.
    UnknownUser,
    /// A credential exists but the token differs.
    TokenMismatch,
}

impl QueryCharactersFailure {
    pub fn code(self) -> i32 {
        match self {
            Self::Malformed => 1,
            Self::UnknownUser => 2,
            Self::TokenMismatch => 3,
        }
    }

    fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Malformed),
            2 => Some(Self::UnknownUser),
            3 => Some(Self::TokenMismatch),
            _ => None,
        }
    }
}

/// Why a `CM_NEWCHR` was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewCharacterFailure {
    /// Field count, number format, name format, or attribute out of range.
    InvalidFields,
    /// Another character (of any owner) already uses the name.
    NameTaken,
    /// The owner already holds the maximum number of characters.
    NoFreeSlot,
    /// The connection has not presented a valid credential, or the
    /// username doesn't match the one it verified as.
    NotVerified,
    /// The character store failed. Shares the wire code with `NotVerified`.
    Internal,
}

impl NewCharacterFailure {
    pub fn code(self) -> i32 {
        match self {
            Self::InvalidFields => 1,
            Self::NameTaken => 2,
            Self::NoFreeSlot => 3,
            Self::NotVerified | Self::Internal => 4,
        }
    }

    fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::InvalidFields),
            2 => Some(Self::NameTaken),
            3 => Some(Self::NoFreeSlot),
            4 => Some(Self::NotVerified),
            _ => None,
        }
    }
}

/// A response from the login or game server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// `SM_PASSOK_SELECTSERVER`: records `name/id/`, `r3` = count.
    ServerList { servers: Vec<ServerListEntry> },

    /// `SM_PASSWD_FAIL`. Same packet for unknown user and wrong password.
    PasswordFail,

    /// `SM_SELECTSERVER_OK`: `address/port/token`.
    SelectServerOk {
        address: String,
        port: u16,
        token: String,
    },

    /// `SM_SELECTSERVER_FAIL`.
    SelectServerFail,

    /// `SM_QUERYCHR`: records `name/job/hair/level/sex/`, `code` = count.
    CharacterList { characters: Vec<CharacterSummary> },

    /// `SM_QUERYCHR_FAIL` with the reason in `code`.
    QueryCharactersFail(QueryCharactersFailure),

    /// `SM_NEWCHR_SUCCESS`.
    NewCharacterOk,

    /// `SM_NEWCHR_FAIL` with the reason in `code`.
    NewCharacterFail(NewCharacterFailure),
}

/// Status code reported by failure responses that have a single reason.
const SINGLE_FAILURE_CODE: i32 = 1;

impl ServerMessage {
    /// Builds the wire packet for this response.
    pub fn to_packet(&self) -> Packet {
        match self {
            Self::ServerList { servers } => {
                let mut payload = String::new();
                for server in servers {
                    push_record(&mut payload, [server.name.clone(), server.id.0.to_string()]);
                }
                Packet::new(kind::SM_PASSOK_SELECTSERVER, payload)
                    .with_r3(u16::try_from(servers.len()).unwrap_or(u16::MAX))
            }
            Self::PasswordFail => {
                Packet::new(kind::SM_PASSWD_FAIL, "").with_code(SINGLE_FAILURE_CODE)
            }
            Self::SelectServerOk {
                address,
                port,
                token,
            } => Packet::new(kind::SM_SELECTSERVER_OK, format!("{address}/{port}/{token}")),
            Self::SelectServerFail => {
                Packet::new(kind::SM_SELECTSERVER_FAIL, "").with_code(SINGLE_FAILURE_CODE)
            }
            Self::CharacterList { characters } => {
                let mut payload = String::new();
                for c in characters {
                    push_record(
                        &mut payload,
                        [
                            c.name.clone(),
                            u8::from(c.job).to_string(),
                            c.hair.to_string(),
                            c.level.to_string(),
                            u8::from(c.gender).to_string(),
                        ],
                    );
                }
                Packet::new(kind::SM_QUERYCHR, payload)
                    .with_code(i32::try_from(characters.len()).unwrap_or(i32::MAX))
            }
            Self::QueryCharactersFail(reason) => {
                Packet::new(kind::SM_QUERYCHR_FAIL, "").with_code(reason.code())
            }
            Self::NewCharacterOk => Packet::new(kind::SM_NEWCHR_SUCCESS, ""),
            Self::NewCharacterFail(reason) => {
                Packet::new(kind::SM_NEWCHR_FAIL, "").with_code(reason.code())
            }
        }
    }

    /// Interprets a response packet. Used by clients and tests.
    ///
    /// `NewCharacterFailure::Internal` reads back as `NotVerified`, since
    /// both share code 4.
    ///
    /// # Errors
    /// [`ProtocolError::UnknownKind`] or [`ProtocolError::MalformedPayload`].
    pub fn from_packet(packet: &Packet) -> Result<Self, ProtocolError> {
        let kind = packet.kind();
        let params = packet.params();

        match kind {
            kind::SM_PASSOK_SELECTSERVER => {
                let servers = records::<2>(kind, &params)?
                    .into_iter()
                    .map(|[name, id]| -> Result<ServerListEntry, ProtocolError> {
                        Ok(ServerListEntry {
                            name: name.to_string(),
                            id: ServerId(id.parse().map_err(|_| malformed(kind, "server id"))?),
                        })
                    })
                    .collect::<Result<_, ProtocolError>>()?;
                Ok(Self::ServerList { servers })
            }
            kind::SM_PASSWD_FAIL => Ok(Self::PasswordFail),
            kind::SM_SELECTSERVER_OK => {
                let [address, port, token] = fields::<3>(kind, &params)?;
                Ok(Self::SelectServerOk {
                    address: address.to_string(),
                    port: port.parse().map_err(|_| malformed(kind, "port"))?,
                    token: token.to_string(),
                })
            }
            kind::SM_SELECTSERVER_FAIL => Ok(Self::SelectServerFail),
            kind::SM_QUERYCHR => {
                let characters = records::<5>(kind, &params)?
                    .into_iter()
                    .map(|[name, job, hair, level, sex]| -> Result<CharacterSummary, ProtocolError> {
                        let job = number(kind, "job", job)?;
                        let sex = number(kind, "sex", sex)?;
                        Ok(CharacterSummary {
                            name: name.to_string(),
                            job: Job::try_from(job).map_err(|_| malformed(kind, "job"))?,
                            hair: number(kind, "hair", hair)?,
                            level: level.parse().map_err(|_| malformed(kind, "level"))?,
                            gender: Gender::try_from(sex).map_err(|_| malformed(kind, "sex"))?,
                        })
                    })
                    .collect::<Result<_, ProtocolError>>()?;
                Ok(Self::CharacterList { characters })
            }
            kind::SM_QUERYCHR_FAIL => QueryCharactersFailure::from_code(packet.code())
                .map(Self::QueryCharactersFail)
                .ok_or_else(|| malformed(kind, format!("unknown code {}", packet.code()))),
            kind::SM_NEWCHR_SUCCESS => Ok(Self::NewCharacterOk),
            kind::SM_NEWCHR_FAIL => NewCharacterFailure::from_code(packet.code())
                .map(Self::NewCharacterFail)
                .ok_or_else(|| malformed(kind, format!("unknown code {}", packet.code()))),
            other => Err(ProtocolError::UnknownKind(other)),
        }
    }
}

/// Splits a record list into fixed-arity records.
fn records<'a, const N: usize>(
    kind: u16,
    params: &[&'a str],
) -> Result<Vec<[&'a str; N]>, ProtocolError> {
    if params.len() % N != 0 {
        return Err(malformed(
            kind,
            format!("{} fields is not a whole number of {N}-field records", params.len()),
        ));
    }
    Ok(params
        .chunks_exact(N)
        .filter_map(|chunk| <[&str; N]>::try_from(chunk).ok())
        .collect())
}
