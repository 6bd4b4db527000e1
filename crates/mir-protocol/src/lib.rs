//! Wire protocol for the Mir login and game servers.
//!
//! This crate defines the "language" that clients and both servers speak:
//!
//! - **Types** ([`Packet`], [`PacketHeader`], [`ServerId`], [`Job`],
//!   [`Gender`]): what travels on the wire.
//! - **Kinds** ([`kind`]): the message-type table.
//! - **Messages** ([`ClientMessage`], [`ServerMessage`]): one typed variant
//!   per kind, so the overloaded header `code` never leaks into handlers.
//! - **Codec** ([`PacketCodec`]): length-prefixed framing for
//!   `tokio_util::codec::Framed`.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (bytes) → Protocol (Packet) → Session (identity, credentials)
//! ```

mod codec;
mod error;
pub mod kind;
mod messages;
mod types;

pub use codec::{CodecConfig, PacketCodec};
pub use error::ProtocolError;
pub use messages::{
    CharacterSummary, ClientMessage, NewCharacter, NewCharacterFailure, QueryCharactersFailure,
    ServerListEntry, ServerMessage,
};
pub use types::{
    DELIMITER, Gender, HEADER_LEN, Job, Packet, PacketHeader, ServerId, push_record,
};
