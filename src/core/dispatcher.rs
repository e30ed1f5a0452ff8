// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Decodes an inbound packet's type tag, validates its size, and routes it
//! to a handler (§4.4).

use crate::core::error::ProtocolViolation;
use crate::core::handlers;
use crate::core::sector::SectorGrid;
use crate::core::state::ChatServerState;
use crate::core::SessionId;
use crate::wire::messages::{
    HEARTBEAT_REQ_LEN, LOGIN_REQ_LEN, LoginRequest, MESSAGE_REQ_FIXED_LEN, MessageRequest,
    SECTOR_MOVE_REQ_LEN, SectorMoveRequest,
};
use crate::wire::opcode::PacketType;
use crate::wire::packet::Packet;

/// Routes `(session_id, packet)` to the matching handler, or returns the
/// `ProtocolViolation` that should disconnect the session. The packet's
/// single logical reference (held by the caller) is consumed either way.
pub async fn dispatch(
    state: &ChatServerState,
    session_id: SessionId,
    packet: Packet,
) -> Result<(), ProtocolViolation> {
    let raw_tag = packet
        .peek_raw_type()
        .map_err(|_| ProtocolViolation::SizeMismatch {
            kind: "tag",
            expected: 2,
            actual: packet.len(),
        })?;
    let ty = PacketType::try_from(raw_tag).map_err(|_| ProtocolViolation::UnknownType(raw_tag))?;

    let body = &packet.as_bytes()[2..];

    match ty {
        PacketType::CsChatReqLogin => {
            if packet.len() != LOGIN_REQ_LEN {
                return Err(ProtocolViolation::SizeMismatch {
                    kind: "LOGIN",
                    expected: LOGIN_REQ_LEN,
                    actual: packet.len(),
                });
            }
            let req = LoginRequest::decode(body).map_err(|source| ProtocolViolation::Malformed {
                kind: "LOGIN",
                source,
            })?;
            handlers::handle_login(state, session_id, req).await;
        }
        PacketType::CsChatReqSectorMove => {
            if packet.len() != SECTOR_MOVE_REQ_LEN {
                return Err(ProtocolViolation::SizeMismatch {
                    kind: "SECTOR_MOVE",
                    expected: SECTOR_MOVE_REQ_LEN,
                    actual: packet.len(),
                });
            }
            let req =
                SectorMoveRequest::decode(body).map_err(|source| ProtocolViolation::Malformed {
                    kind: "SECTOR_MOVE",
                    source,
                })?;
            if !SectorGrid::in_bounds(req.sector_x, req.sector_y) {
                return Err(ProtocolViolation::SectorOutOfRange {
                    x: req.sector_x,
                    y: req.sector_y,
                });
            }
            handlers::handle_sector_move(state, session_id, req).await;
        }
        PacketType::CsChatReqMessage => {
            if packet.len() < MESSAGE_REQ_FIXED_LEN {
                return Err(ProtocolViolation::SizeMismatch {
                    kind: "MESSAGE",
                    expected: MESSAGE_REQ_FIXED_LEN,
                    actual: packet.len(),
                });
            }
            let req =
                MessageRequest::decode(body).map_err(|source| ProtocolViolation::Malformed {
                    kind: "MESSAGE",
                    source,
                })?;
            handlers::handle_message(state, session_id, req).await;
        }
        PacketType::CsChatReqHeartbeat => {
            if packet.len() != HEARTBEAT_REQ_LEN {
                return Err(ProtocolViolation::SizeMismatch {
                    kind: "HEARTBEAT",
                    expected: HEARTBEAT_REQ_LEN,
                    actual: packet.len(),
                });
            }
            handlers::handle_heartbeat(state, session_id).await;
        }
        PacketType::CsChatResLogin | PacketType::CsChatResSectorMove | PacketType::CsChatResMessage => {
            // Server-to-client tags arriving from a client are not valid requests.
            return Err(ProtocolViolation::UnknownType(raw_tag));
        }
    }

    Ok(())
}
