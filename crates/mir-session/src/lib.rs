//! Credentials and connection identity for the Mir servers.
//!
//! A player authenticates once, on the login server. Picking a game server
//! issues a [`Credential`] that travels to that server over a handoff queue
//! and waits in its [`CredentialLedger`] until the client presents it.
//!
//! 1. **Issuing**: [`Credential::issue`] on the login server
//! 2. **Handoff**: [`CertRouter`] / [`CertSender`] → intake task
//! 3. **Verification**: [`CredentialLedger::claim`] on the game server
//!
//! # How it fits in the stack
//!
//! ```text
//! mirserver (above)   ← login and game handlers drive these types
//!     ↕
//! mir-session (this crate)
//!     ↕
//! mir-protocol (below) ← provides ServerId
//! ```

mod config;
mod credential;
mod error;
mod handoff;
mod identity;
mod ledger;

pub use config::{HandoffConfig, LedgerConfig};
pub use credential::Credential;
pub use error::{ClaimError, DeliveryError, SessionError};
pub use handoff::{CertIntake, CertRouter, CertSender, channel, spawn_intake};
pub use identity::SessionIdentity;
pub use ledger::CredentialLedger;
