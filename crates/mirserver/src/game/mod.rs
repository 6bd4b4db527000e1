//! The game server: credential verification and character roster.

mod handler;
mod server;

pub use handler::{GameHandler, MAX_HAIR, MAX_NAME_LEN};
pub use server::{GameServer, GameServerBuilder};
