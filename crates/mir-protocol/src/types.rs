//! Core protocol types: the packet that travels on the wire and the small
//! identity/attribute types that appear inside payloads.
//!
//! A packet is a fixed five-integer header plus a string payload. The
//! header's `kind` decides how the payload is read; the payload itself is
//! never self-describing. Multi-field payloads are joined with `/`.

use serde::{Deserialize, Serialize};

use std::fmt;

/// Field separator inside payloads.
pub const DELIMITER: char = '/';

/// Size of the encoded [`PacketHeader`] in bytes.
pub const HEADER_LEN: usize = 12;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifier of a game-world server in the server directory.
///
/// Newtype so a server id can't be mixed up with a port or a character
/// level, both of which are also small integers in this protocol.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ServerId(pub u32);

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Character attributes
// ---------------------------------------------------------------------------

/// Character class.
///
/// The numeric value is what travels on the wire; anything outside
/// `0..=2` is rejected during character creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Job {
    Warrior = 0,
    Wizard = 1,
    Taoist = 2,
}

impl TryFrom<u8> for Job {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Warrior),
            1 => Ok(Self::Wizard),
            2 => Ok(Self::Taoist),
            other => Err(other),
        }
    }
}

impl From<Job> for u8 {
    fn from(job: Job) -> u8 {
        job as u8
    }
}

/// Character gender. Wire values `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male = 0,
    Female = 1,
}

impl TryFrom<u8> for Gender {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Male),
            1 => Ok(Self::Female),
            other => Err(other),
        }
    }
}

impl From<Gender> for u8 {
    fn from(gender: Gender) -> u8 {
        gender as u8
    }
}

// ---------------------------------------------------------------------------
// PacketHeader
// ---------------------------------------------------------------------------

/// The fixed-shape header in front of every payload.
///
/// ```text
/// ┌──────────┬──────────┬────────┬────────┬────────┐
/// │ code i32 │ kind u16 │ r1 u16 │ r2 u16 │ r3 u16 │   12 bytes, little-endian
/// └──────────┴──────────┴────────┴────────┴────────┘
/// ```
///
/// `code` is kind-specific: 0 on plain success, a reason code on failure,
/// or an attribute such as a record count. `r1..r3` are mostly unused;
/// `SM_PASSOK_SELECTSERVER` puts the server count in `r3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PacketHeader {
    pub code: i32,
    pub kind: u16,
    pub r1: u16,
    pub r2: u16,
    pub r3: u16,
}

impl PacketHeader {
    /// A header for `kind` with every other field zeroed.
    pub fn new(kind: u16) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Writes the header in wire order.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..4].copy_from_slice(&self.code.to_le_bytes());
        out[4..6].copy_from_slice(&self.kind.to_le_bytes());
        out[6..8].copy_from_slice(&self.r1.to_le_bytes());
        out[8..10].copy_from_slice(&self.r2.to_le_bytes());
        out[10..12].copy_from_slice(&self.r3.to_le_bytes());
        out
    }

    /// Reads a header from exactly [`HEADER_LEN`] bytes.
    pub fn from_bytes(bytes: &[u8; HEADER_LEN]) -> Self {
        let u16_at = |i: usize| u16::from_le_bytes([bytes[i], bytes[i + 1]]);
        Self {
            code: i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            kind: u16_at(4),
            r1: u16_at(6),
            r2: u16_at(8),
            r3: u16_at(10),
        }
    }
}

// ---------------------------------------------------------------------------
// Packet
// ---------------------------------------------------------------------------

/// One request or response: header plus UTF-8 payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Packet {
    pub header: PacketHeader,
    pub payload: String,
}

impl Packet {
    /// A packet of `kind` with a zeroed header and the given payload.
    pub fn new(kind: u16, payload: impl Into<String>) -> Self {
        Self {
            header: PacketHeader::new(kind),
            payload: payload.into(),
        }
    }

    /// Sets the header `code`.
    pub fn with_code(mut self, code: i32) -> Self {
        self.header.code = code;
        self
    }

    /// Sets the header `r3` field.
    pub fn with_r3(mut self, r3: u16) -> Self {
        self.header.r3 = r3;
        self
    }

    /// The message kind.
    pub fn kind(&self) -> u16 {
        self.header.kind
    }

    /// The header status/attribute code.
    pub fn code(&self) -> i32 {
        self.header.code
    }

    /// Splits the payload into its `/`-separated fields.
    ///
    /// One trailing delimiter is tolerated (record lists end with one), so
    /// `"a/b/"` and `"a/b"` both yield `["a", "b"]`. An empty payload has
    /// no fields at all.
    pub fn params(&self) -> Vec<&str> {
        if self.payload.is_empty() {
            return Vec::new();
        }
        let body = self
            .payload
            .strip_suffix(DELIMITER)
            .unwrap_or(&self.payload);
        body.split(DELIMITER).collect()
    }
}

/// Appends one record of a repeated-record list: every field followed by
/// `/`, so a list of records always ends with the delimiter.
pub fn push_record<I, S>(out: &mut String, fields: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for field in fields {
        out.push_str(field.as_ref());
        out.push(DELIMITER);
    }
}
