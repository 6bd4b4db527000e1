//! Length-prefixed framing for [`Packet`]s.
//!
//! ```text
//! ┌───────────────┬──────────────────────┬─────────────────────┐
//! │ body_len u32  │ header (12 bytes)    │ payload (UTF-8)     │
//! └───────────────┴──────────────────────┴─────────────────────┘
//!                  └──────────── body_len bytes ─────────────┘
//! ```
//!
//! [`PacketCodec`] plugs into `tokio_util::codec::Framed`, which owns the
//! read buffer. A partial frame stays in that buffer until the rest of it
//! arrives; nothing else is carried between calls.

use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use tokio_util::codec::{Decoder, Encoder};

use crate::{HEADER_LEN, Packet, PacketHeader, ProtocolError};

/// Size of the length prefix.
const LEN_PREFIX: usize = 4;

/// Framing limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Largest accepted body (header + payload) in bytes.
    pub max_frame_len: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_frame_len: 8 * 1024,
        }
    }
}

/// Encoder/decoder for one packet per frame.
#[derive(Debug, Clone, Default)]
pub struct PacketCodec {
    config: CodecConfig,
}

impl PacketCodec {
    /// Creates a codec with the given limits.
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    /// Returns the body length announced by a prefix, validated against
    /// the configured bounds.
    fn body_len(&self, prefix: [u8; LEN_PREFIX]) -> Result<usize, ProtocolError> {
        let len = u32::from_le_bytes(prefix) as usize;
        if len < HEADER_LEN {
            return Err(ProtocolError::MalformedPacket(format!(
                "frame body of {len} bytes is shorter than the {HEADER_LEN}-byte header"
            )));
        }
        if len > self.config.max_frame_len {
            return Err(ProtocolError::MalformedPacket(format!(
                "frame body of {len} bytes exceeds limit of {}",
                self.config.max_frame_len
            )));
        }
        Ok(len)
    }
}

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>, ProtocolError> {
        if src.len() < LEN_PREFIX {
            return Ok(None);
        }

        let mut prefix = [0u8; LEN_PREFIX];
        prefix.copy_from_slice(&src[..LEN_PREFIX]);
        let len = self.body_len(prefix)?;

        if src.len() < LEN_PREFIX + len {
            // Leave the partial frame in place and ask for more.
            src.reserve(LEN_PREFIX + len - src.len());
            return Ok(None);
        }

        src.advance(LEN_PREFIX);
        let body = src.split_to(len);

        let mut header_bytes = [0u8; HEADER_LEN];
        header_bytes.copy_from_slice(&body[..HEADER_LEN]);
        let header = PacketHeader::from_bytes(&header_bytes);

        let payload = String::from_utf8(body[HEADER_LEN..].to_vec()).map_err(|e| {
            ProtocolError::MalformedPacket(format!(
                "payload of kind {} is not UTF-8: {e}",
                header.kind
            ))
        })?;

        Ok(Some(Packet { header, payload }))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Packet>, ProtocolError> {
        match self.decode(src)? {
            Some(packet) => Ok(Some(packet)),
            None if src.is_empty() => Ok(None),
            None => Err(ProtocolError::MalformedPacket(format!(
                "stream closed with {} bytes of an incomplete frame",
                src.len()
            ))),
        }
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = ProtocolError;

    fn encode(&mut self, packet: Packet, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        let len = HEADER_LEN + packet.payload.len();
        if len > self.config.max_frame_len {
            return Err(ProtocolError::MalformedPacket(format!(
                "refusing to encode {len}-byte body, limit is {}",
                self.config.max_frame_len
            )));
        }

        dst.reserve(LEN_PREFIX + len);
        dst.put_u32_le(len as u32);
        dst.put_slice(&packet.header.to_bytes());
        dst.put_slice(packet.payload.as_bytes());
        Ok(())
    }
}
