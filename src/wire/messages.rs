// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Typed request/response payload shapes (§6.1). The constant-size shapes
//! are zero-copy views over the wire bytes, mirroring how fixed PDU headers
//! are modeled elsewhere in this stack; the two variable-length shapes
//! (MESSAGE request/response) pair a zero-copy fixed header with a tail
//! read/written through [`crate::wire::packet`].

use anyhow::{Result, bail};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, LittleEndian, I64, U16};

use crate::wire::packet::{Packet, PacketWriter};
use crate::wire::opcode::PacketType;

/// Fixed-width identity field width (UTF-16 code units), per §3.
pub const ID_LEN: usize = 20;
/// Fixed-width nickname field width (UTF-16 code units), per §3.
pub const NICKNAME_LEN: usize = 20;
/// Fixed-width session key length (bytes), per §3.
pub const SESSION_KEY_LEN: usize = 64;

/// `CS_CHAT_REQ_LOGIN` payload (after the 2-byte type tag).
#[repr(C)]
#[derive(Debug, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct LoginRequestWire {
    pub account_no: I64<LittleEndian>,
    pub id: [U16<LittleEndian>; ID_LEN],
    pub nickname: [U16<LittleEndian>; NICKNAME_LEN],
    pub session_key: [u8; SESSION_KEY_LEN],
}

/// `CS_CHAT_REQ_SECTOR_MOVE` payload (after the 2-byte type tag).
#[repr(C)]
#[derive(Debug, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct SectorMoveRequestWire {
    pub account_no: I64<LittleEndian>,
    pub sector_x: U16<LittleEndian>,
    pub sector_y: U16<LittleEndian>,
}

/// Fixed header of `CS_CHAT_REQ_MESSAGE`; `messageLen` bytes follow in the
/// packet tail.
#[repr(C)]
#[derive(Debug, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct MessageRequestHeaderWire {
    pub account_no: I64<LittleEndian>,
    pub message_len: U16<LittleEndian>,
}

/// Total byte length of a packet body (tag included) for each constant-size
/// request shape, used by the dispatcher's §4.4 exact-size check (I5).
pub const TAG_LEN: usize = 2;
pub const LOGIN_REQ_LEN: usize = TAG_LEN + size_of::<LoginRequestWire>();
pub const SECTOR_MOVE_REQ_LEN: usize = TAG_LEN + size_of::<SectorMoveRequestWire>();
pub const HEARTBEAT_REQ_LEN: usize = TAG_LEN;
pub const MESSAGE_REQ_FIXED_LEN: usize = TAG_LEN + size_of::<MessageRequestHeaderWire>();

/// A decoded `LOGIN` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub account_no: i64,
    pub id: [u16; ID_LEN],
    pub nickname: [u16; NICKNAME_LEN],
    pub session_key: [u8; SESSION_KEY_LEN],
}

impl LoginRequest {
    /// Decodes the payload that follows the 2-byte tag. `body` must be
    /// exactly `LOGIN_REQ_LEN - TAG_LEN` bytes (checked by the dispatcher).
    pub fn decode(body: &[u8]) -> Result<Self> {
        let wire = LoginRequestWire::ref_from_bytes(body)
            .map_err(|e| anyhow::anyhow!("malformed LOGIN payload: {e}"))?;
        Ok(Self {
            account_no: wire.account_no.get(),
            id: wire.id.map(|c| c.get()),
            nickname: wire.nickname.map(|c| c.get()),
            session_key: wire.session_key,
        })
    }
}

/// A decoded `SECTOR_MOVE` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorMoveRequest {
    pub account_no: i64,
    pub sector_x: u16,
    pub sector_y: u16,
}

impl SectorMoveRequest {
    pub fn decode(body: &[u8]) -> Result<Self> {
        let wire = SectorMoveRequestWire::ref_from_bytes(body)
            .map_err(|e| anyhow::anyhow!("malformed SECTOR_MOVE payload: {e}"))?;
        Ok(Self {
            account_no: wire.account_no.get(),
            sector_x: wire.sector_x.get(),
            sector_y: wire.sector_y.get(),
        })
    }
}

/// A decoded `MESSAGE` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRequest {
    pub account_no: i64,
    pub message: Vec<u8>,
}

impl MessageRequest {
    /// Decodes a payload of `MESSAGE_REQ_FIXED_LEN - TAG_LEN + messageLen`
    /// bytes; `messageLen` is read from the fixed header and the dispatcher
    /// has already checked the total length accounts for it exactly.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let header_len = size_of::<MessageRequestHeaderWire>();
        if body.len() < header_len {
            bail!("MESSAGE payload shorter than its fixed header");
        }
        let (header_bytes, tail) = body.split_at(header_len);
        let header = MessageRequestHeaderWire::ref_from_bytes(header_bytes)
            .map_err(|e| anyhow::anyhow!("malformed MESSAGE header: {e}"))?;
        let message_len = header.message_len.get() as usize;
        if tail.len() != message_len {
            bail!(
                "MESSAGE declared messageLen={message_len} but payload carried {} bytes",
                tail.len()
            );
        }
        Ok(Self {
            account_no: header.account_no.get(),
            message: tail.to_vec(),
        })
    }
}

/// Builds the `CS_CHAT_RES_LOGIN` packet: `{ status=1, accountNo }`.
pub fn build_login_response(account_no: i64) -> Packet {
    PacketWriter::new(PacketType::CsChatResLogin)
        .push_u8(1)
        .push_i64(account_no)
        .finish()
}

/// Builds the `CS_CHAT_RES_SECTOR_MOVE` packet: `{ accountNo, x, y }`.
pub fn build_sector_move_response(account_no: i64, sector_x: u16, sector_y: u16) -> Packet {
    PacketWriter::new(PacketType::CsChatResSectorMove)
        .push_i64(account_no)
        .push_u16(sector_x)
        .push_u16(sector_y)
        .finish()
}

/// Builds the `CS_CHAT_RES_MESSAGE` packet:
/// `{ accountNo, id[20], nickname[20], messageLen, messageBytes }`.
pub fn build_message_response(
    account_no: i64,
    id: &[u16; ID_LEN],
    nickname: &[u16; NICKNAME_LEN],
    message: &[u8],
) -> Packet {
    PacketWriter::new(PacketType::CsChatResMessage)
        .push_i64(account_no)
        .push_u16_array(id)
        .push_u16_array(nickname)
        .push_u16(message.len() as u16)
        .push_bytes(message)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_login_bytes() -> Vec<u8> {
        let mut id = [0u16; ID_LEN];
        id[0] = b'a' as u16;
        let mut nickname = [0u16; NICKNAME_LEN];
        nickname[0] = b'A' as u16;
        let key = [0u8; SESSION_KEY_LEN];

        let wire = LoginRequestWire {
            account_no: 100.into(),
            id: id.map(U16::new),
            nickname: nickname.map(U16::new),
            session_key: key,
        };
        wire.as_bytes().to_vec()
    }

    #[test]
    fn decodes_login_request() {
        let body = sample_login_bytes();
        let req = LoginRequest::decode(&body).expect("decode");
        assert_eq!(req.account_no, 100);
        assert_eq!(req.id[0], b'a' as u16);
        assert_eq!(req.nickname[0], b'A' as u16);
        assert_eq!(req.session_key, [0u8; SESSION_KEY_LEN]);
    }

    #[test]
    fn message_request_rejects_length_mismatch() {
        let wire = MessageRequestHeaderWire {
            account_no: 1.into(),
            message_len: 4u16.into(),
        };
        let mut bytes = wire.as_bytes().to_vec();
        bytes.extend_from_slice(b"hi"); // only 2 bytes, declared 4
        assert!(MessageRequest::decode(&bytes).is_err());
    }

    #[test]
    fn message_request_round_trips() {
        let wire = MessageRequestHeaderWire {
            account_no: 5.into(),
            message_len: 4u16.into(),
        };
        let mut bytes = wire.as_bytes().to_vec();
        bytes.extend_from_slice(b"hi!\0");
        let req = MessageRequest::decode(&bytes).expect("decode");
        assert_eq!(req.account_no, 5);
        assert_eq!(req.message, b"hi!\0");
    }

    #[test]
    fn builds_login_response_packet() {
        let packet = build_login_response(42);
        let mut r = packet.reader();
        assert_eq!(r.pull_u16().expect("tag"), PacketType::CsChatResLogin as u16);
        assert_eq!(r.pull_u8().expect("status"), 1);
        assert_eq!(r.pull_i64().expect("account"), 42);
        assert_eq!(r.remaining(), 0);
    }
}
