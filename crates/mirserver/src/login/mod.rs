//! The login server.

mod handler;
mod server;

pub use handler::LoginHandler;
pub use server::{LoginServer, LoginServerBuilder};
