// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! A reference-counted, typed push/pull byte buffer for chat packets.
//!
//! `Packet` wraps [`bytes::Bytes`], whose internal `Arc` refcount *is* the
//! refcount discipline described in §5/§6: cloning a `Packet` to hand it to
//! another outbound queue increments the count, and dropping the last clone
//! frees the buffer. Nothing here decrements a counter by hand.

use anyhow::{Result, bail};
use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::wire::opcode::PacketType;

/// An immutable, cheaply-cloned packet payload (type tag included).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet(Bytes);

impl Packet {
    #[inline]
    pub fn from_bytes(bytes: Bytes) -> Self {
        Self(bytes)
    }

    #[inline]
    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reads the leading 16-bit type tag as a raw value, without validating
    /// it against the known set of packet types.
    pub fn peek_raw_type(&self) -> Result<u16> {
        if self.0.len() < 2 {
            bail!("packet shorter than the 2-byte type tag");
        }
        Ok(u16::from_le_bytes([self.0[0], self.0[1]]))
    }

    /// Reads the leading 16-bit type tag without consuming the rest.
    pub fn peek_type(&self) -> Result<PacketType> {
        let raw = self.peek_raw_type()?;
        PacketType::try_from(raw).map_err(|e| anyhow::anyhow!(e))
    }

    pub fn reader(&self) -> PacketReader<'_> {
        PacketReader(&self.0[..])
    }
}

/// Sequential little-endian reader over a packet's bytes (tag included).
pub struct PacketReader<'a>(&'a [u8]);

impl<'a> PacketReader<'a> {
    #[inline]
    pub fn remaining(&self) -> usize {
        self.0.remaining()
    }

    pub fn pull_u8(&mut self) -> Result<u8> {
        if self.0.remaining() < 1 {
            bail!("packet truncated reading u8");
        }
        Ok(self.0.get_u8())
    }

    pub fn pull_u16(&mut self) -> Result<u16> {
        if self.0.remaining() < 2 {
            bail!("packet truncated reading u16");
        }
        Ok(self.0.get_u16_le())
    }

    pub fn pull_i64(&mut self) -> Result<i64> {
        if self.0.remaining() < 8 {
            bail!("packet truncated reading i64");
        }
        Ok(self.0.get_i64_le())
    }
}

/// Builder for an outbound packet: writes the type tag first, then fields
/// in wire order, then freezes into a [`Packet`].
pub struct PacketWriter(BytesMut);

impl PacketWriter {
    pub fn new(ty: PacketType) -> Self {
        let mut buf = BytesMut::with_capacity(64);
        buf.put_u16_le(ty as u16);
        Self(buf)
    }

    pub fn push_u8(mut self, v: u8) -> Self {
        self.0.put_u8(v);
        self
    }

    pub fn push_u16(mut self, v: u16) -> Self {
        self.0.put_u16_le(v);
        self
    }

    pub fn push_i64(mut self, v: i64) -> Self {
        self.0.put_i64_le(v);
        self
    }

    pub fn push_u16_array(mut self, vs: &[u16]) -> Self {
        for v in vs {
            self.0.put_u16_le(*v);
        }
        self
    }

    pub fn push_bytes(mut self, vs: &[u8]) -> Self {
        self.0.put_slice(vs);
        self
    }

    pub fn finish(self) -> Packet {
        Packet(self.0.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_simple_field_set() {
        let packet = PacketWriter::new(PacketType::CsChatResSectorMove)
            .push_i64(100)
            .push_u16(5)
            .push_u16(7)
            .finish();

        assert_eq!(packet.peek_type().expect("tag"), PacketType::CsChatResSectorMove);

        let mut r = packet.reader();
        r.pull_u16().expect("tag"); // consume the tag
        assert_eq!(r.pull_i64().expect("account"), 100);
        assert_eq!(r.pull_u16().expect("x"), 5);
        assert_eq!(r.pull_u16().expect("y"), 7);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn truncated_read_is_an_error() {
        let packet = PacketWriter::new(PacketType::CsChatReqHeartbeat).finish();
        let mut r = packet.reader();
        r.pull_u16().expect("tag");
        assert!(r.pull_i64().is_err());
    }
}
