//! # mirserver
//!
//! Login and game servers for a Mir-style two-tier backend.
//!
//! A client logs in on the [`LoginServer`], picks a game server from the
//! list it gets back, and receives that server's address plus a one-off
//! token. The login server pushes the matching credential to the chosen
//! [`GameServer`] over an in-process handoff queue. The client then
//! connects to the game server, presents `username/token`, and manages its
//! characters.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use mirserver::prelude::*;
//!
//! # async fn start() -> Result<(), ServerError> {
//! let store = Arc::new(MemoryStore::builder().user(User::new("pangliang", "pwd")).build());
//!
//! let game = GameServerBuilder::new(ServerId(1))
//!     .bind("0.0.0.0:7400")
//!     .build(Arc::clone(&store))
//!     .await?;
//! let login = LoginServerBuilder::new()
//!     .bind("0.0.0.0:7000")
//!     .route(game.cert_sender())
//!     .build(store)
//!     .await?;
//!
//! tokio::spawn(game.run());
//! login.run().await
//! # }
//! ```

mod config;
mod error;
pub mod game;
pub mod login;
mod session;

pub use config::{GameConfig, GameServerConfig, LoginConfig, MirConfig};
pub use error::ServerError;
pub use game::{GameServer, GameServerBuilder};
pub use login::{LoginServer, LoginServerBuilder};
pub use session::{SessionHandler, run_session};

/// Everything needed to stand up both servers.
pub mod prelude {
    pub use crate::{
        GameConfig, GameServer, GameServerBuilder, LoginConfig, LoginServer, LoginServerBuilder,
        MirConfig, ServerError, SessionHandler,
    };
    pub use mir_protocol::{Packet, ServerId, kind};
    pub use mir_session::{CertSender, HandoffConfig, LedgerConfig};
    pub use mir_store::{CharacterStore, MemoryStore, ServerDirectory, ServerInfo, User, UserDirectory};
    pub use mir_transport::TcpConnection;
}
