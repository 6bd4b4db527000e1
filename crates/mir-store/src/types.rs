//! Records owned by the store.

use mir_protocol::{CharacterSummary, Gender, Job, ServerId, ServerListEntry};
use serde::{Deserialize, Serialize};

/// An account in the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password: String,
}

impl User {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// A server directory entry.
///
/// `game_addr`/`game_port` is what clients are told to connect to;
/// `login_addr`/`login_port` is the address the login server reaches the
/// game server on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub id: ServerId,
    pub name: String,
    pub game_addr: String,
    pub game_port: u16,
    pub login_addr: String,
    pub login_port: u16,
}

impl ServerInfo {
    /// The `name/id` record shown in the login server list.
    pub fn list_entry(&self) -> ServerListEntry {
        ServerListEntry {
            name: self.name.clone(),
            id: self.id,
        }
    }
}

/// A stored character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub owner: String,
    pub name: String,
    pub job: Job,
    pub hair: u8,
    pub gender: Gender,
    pub level: u16,
}

impl Character {
    /// The fields sent in a roster response.
    pub fn summary(&self) -> CharacterSummary {
        CharacterSummary {
            name: self.name.clone(),
            job: self.job,
            hair: self.hair,
            level: self.level,
            gender: self.gender,
        }
    }
}
