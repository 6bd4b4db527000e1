//! Server configuration.
//!
//! Each server takes a small typed config with sensible defaults. The
//! `mirserver` binary reads all of them from one TOML file:
//!
//! ```toml
//! [login]
//! bind = "0.0.0.0:7000"
//!
//! [[server]]
//! id = 1
//! name = "test1"
//! bind = "0.0.0.0:7400"
//! game_addr = "127.0.0.1"
//! game_port = 7400
//! login_addr = "127.0.0.1"
//! login_port = 7000
//!
//! [[user]]
//! username = "pangliang"
//! password = "pwd"
//! ```

use std::path::Path;

use mir_protocol::CodecConfig;
use mir_session::{HandoffConfig, LedgerConfig};
use mir_store::{MemoryStore, ServerInfo, User};
use serde::{Deserialize, Serialize};

use crate::ServerError;

/// Login server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    /// Address the login listener binds to.
    pub bind: String,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:7000".to_string(),
        }
    }
}

/// Game server settings shared by every game server in a process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Most characters one account may own.
    pub max_characters: usize,

    pub ledger: LedgerConfig,

    pub handoff: HandoffConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_characters: 2,
            ledger: LedgerConfig::default(),
            handoff: HandoffConfig::default(),
        }
    }
}

/// One `[[server]]` table: a directory entry plus where to listen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameServerConfig {
    /// Address the game listener binds to.
    pub bind: String,

    #[serde(flatten)]
    pub info: ServerInfo,
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MirConfig {
    pub login: LoginConfig,

    pub game: GameConfig,

    pub codec: CodecConfig,

    #[serde(rename = "server")]
    pub servers: Vec<GameServerConfig>,

    #[serde(rename = "user")]
    pub users: Vec<User>,
}

impl MirConfig {
    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ServerError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Parses TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ServerError> {
        Ok(toml::from_str(text)?)
    }

    /// An in-memory store seeded with the configured users and servers.
    pub fn memory_store(&self) -> MemoryStore {
        let builder = self
            .users
            .iter()
            .cloned()
            .fold(MemoryStore::builder(), |b, user| b.user(user));
        self.servers
            .iter()
            .fold(builder, |b, server| b.server(server.info.clone()))
            .build()
    }
}
