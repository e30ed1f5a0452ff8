// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! LOGIN, SECTOR_MOVE, MESSAGE, and HEARTBEAT handlers (§4.5–§4.8).
//!
//! Each handler looks the session up under a momentary registry read lock,
//! then does its work under the player lock (and, where needed, sector
//! locks taken in rank order), and only sends packets after every lock has
//! been released.

use tokio::time::Instant;

use tracing::{error, warn};

use crate::core::SessionId;
use crate::core::sector::SectorGrid;
use crate::core::state::ChatServerState;
use crate::wire::messages::{self, LoginRequest, MessageRequest, SectorMoveRequest};

/// §4.5: copies identity fields into the player record and replies with the
/// outcome. Authorization is delegated to the configured
/// [`crate::core::auth::SessionAuthorizer`]; on rejection the session is
/// disconnected instead of acknowledged.
pub async fn handle_login(state: &ChatServerState, session_id: SessionId, req: LoginRequest) {
    let Some(player) = state.registry.get(session_id).await else {
        return;
    };

    let account_no = req.account_no;
    {
        let mut guard = player.lock().await;
        guard.update_last_recv(Instant::now());

        if !state.authorizer.authorize(req.account_no, &req.session_key) {
            warn!(session_id, account_no, "login rejected by authorizer");
            drop(guard);
            state.network.disconnect(session_id);
            return;
        }

        guard.log_in(req.account_no, req.id, req.nickname, req.session_key);
    }

    state
        .network
        .send_packet(session_id, messages::build_login_response(account_no));
}

/// §4.6: Case A/B/C sector transition. Sector locks are only taken for
/// Case A (first placement) and Case C (cross-cell move); Case B (same
/// cell) updates nothing but `last_recv`.
pub async fn handle_sector_move(
    state: &ChatServerState,
    session_id: SessionId,
    req: SectorMoveRequest,
) {
    debug_assert!(SectorGrid::in_bounds(req.sector_x, req.sector_y));

    let Some(player) = state.registry.get(session_id).await else {
        return;
    };

    let (new_x, new_y) = (req.sector_x, req.sector_y);
    {
        let mut guard = player.lock().await;
        guard.update_last_recv(Instant::now());

        if !guard.in_sector {
            state.grid.insert(new_x, new_y, session_id).await;
            guard.move_sector(new_x, new_y);
        } else if (guard.sector_x, guard.sector_y) != (new_x, new_y) {
            let prev = (guard.sector_x, guard.sector_y);
            state.grid.move_cell(prev, (new_x, new_y), session_id).await;
            guard.move_sector(new_x, new_y);
        }
        // else: Case B, same cell, no sector mutation.
    }

    state.network.send_packet(
        session_id,
        messages::build_sector_move_response(req.account_no, new_x, new_y),
    );
}

/// §4.7: builds the broadcast packet once, snapshots the 3×3 neighborhood
/// under shared sector locks, and sends outside every lock.
pub async fn handle_message(state: &ChatServerState, session_id: SessionId, req: MessageRequest) {
    let Some(player) = state.registry.get(session_id).await else {
        return;
    };

    let (x, y, id, nickname) = {
        let mut guard = player.lock().await;
        guard.update_last_recv(Instant::now());

        if !guard.in_sector {
            // The original preserves this as a fatal contract rather than a
            // disconnect: a client reaching here without ever completing a
            // SECTOR_MOVE means the core's own invariants have already been
            // violated upstream, not just this one session's input.
            drop(guard);
            error!(session_id, "MESSAGE handler invariant violated: session has no sector");
            std::process::abort();
        }

        (guard.sector_x, guard.sector_y, guard.id, guard.nickname)
    };

    let packet = messages::build_message_response(req.account_no, &id, &nickname, &req.message);
    let recipients = state.grid.snapshot_neighborhood(x, y).await;

    for recipient in recipients {
        state.network.send_packet(recipient, packet.clone());
    }
}

/// §4.8: liveness only, no response.
pub async fn handle_heartbeat(state: &ChatServerState, session_id: SessionId) {
    if let Some(player) = state.registry.get(session_id).await {
        player.lock().await.update_last_recv(Instant::now());
    }
}
