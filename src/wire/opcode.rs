// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The 16-bit packet-type tag that opens every packet on the wire (§6.1).

use thiserror::Error;

/// All packet types defined by the chat protocol.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    CsChatReqLogin = 0,
    CsChatReqSectorMove = 1,
    CsChatReqMessage = 2,
    CsChatReqHeartbeat = 3,
    CsChatResLogin = 4,
    CsChatResSectorMove = 5,
    CsChatResMessage = 6,
}

impl PacketType {
    #[inline]
    pub fn from_u16(v: u16) -> Option<Self> {
        Some(match v {
            0 => Self::CsChatReqLogin,
            1 => Self::CsChatReqSectorMove,
            2 => Self::CsChatReqMessage,
            3 => Self::CsChatReqHeartbeat,
            4 => Self::CsChatResLogin,
            5 => Self::CsChatResSectorMove,
            6 => Self::CsChatResMessage,
            _ => return None,
        })
    }
}

/// Returned when the leading 16-bit tag contains an undefined packet type.
#[derive(Debug, Error)]
#[error("unknown packet type: 0x{0:04x}")]
pub struct UnknownPacketType(pub u16);

impl TryFrom<u16> for PacketType {
    type Error = UnknownPacketType;

    fn try_from(v: u16) -> Result<Self, Self::Error> {
        Self::from_u16(v).ok_or(UnknownPacketType(v))
    }
}
