// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Periodic idle-session eviction (§4.10).

use std::sync::Arc;
use tokio::time::Instant;

use tracing::debug;

use crate::core::state::ChatServerState;

/// Runs forever, waking every `config.timeouts.sweep_interval` to scan the
/// registry and request disconnects for sessions past their timeout. The
/// disconnect is requested without waiting for the resulting release — the
/// next sweep will simply no longer see that session id.
pub async fn run(state: Arc<ChatServerState>) {
    let mut ticker = tokio::time::interval(state.config.timeouts.sweep_interval);
    loop {
        ticker.tick().await;

        let ids = state.registry.snapshot_ids().await;
        let now = Instant::now();

        for session_id in ids {
            let Some(player) = state.registry.get(session_id).await else {
                continue;
            };

            let (age, logged_in) = {
                let guard = player.lock().await;
                (now.saturating_duration_since(guard.last_recv), guard.logged_in)
            };

            let limit = if logged_in {
                state.config.timeouts.logged_in_timeout
            } else {
                state.config.timeouts.anonymous_timeout
            };

            if age > limit {
                debug!(session_id, logged_in, ?age, ?limit, "sweeper evicting idle session");
                state.network.disconnect(session_id);
            }
        }
    }
}
