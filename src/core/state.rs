// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The top-level, process-wide state struct (§9: "avoid hidden
//! singletons" — registry, grid, pool, config, and the pluggable hooks all
//! live here and are threaded explicitly into the dispatcher).

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::cfg::config::Config;
use crate::core::SessionId;
use crate::core::auth::{AcceptAllAuthorizer, SessionAuthorizer};
use crate::core::dispatcher;
use crate::core::network::NetworkLayer;
use crate::core::pool::PlayerPool;
use crate::core::registry::PlayerRegistry;
use crate::core::sector::SectorGrid;
use crate::wire::Packet;

pub struct ChatServerState {
    pub registry: PlayerRegistry,
    pub grid: SectorGrid,
    pub pool: PlayerPool,
    pub config: Config,
    pub authorizer: Box<dyn SessionAuthorizer>,
    pub network: Arc<dyn NetworkLayer>,
}

impl ChatServerState {
    pub fn new(config: Config, network: Arc<dyn NetworkLayer>) -> Arc<Self> {
        Self::with_authorizer(config, network, Box::new(AcceptAllAuthorizer))
    }

    pub fn with_authorizer(
        config: Config,
        network: Arc<dyn NetworkLayer>,
        authorizer: Box<dyn SessionAuthorizer>,
    ) -> Arc<Self> {
        let capacity = config.network.concurrent_thread_count as usize;
        Arc::new(Self {
            registry: PlayerRegistry::with_capacity(capacity),
            grid: SectorGrid::new(),
            pool: PlayerPool::new(),
            config,
            authorizer,
            network,
        })
    }

    /// §4.9 `onAccept`: allocates a player from the pool and registers it.
    pub async fn on_accept(&self, session_id: SessionId) {
        let player = self.pool.acquire(session_id);
        self.registry.insert(session_id, player).await;
        info!(session_id, "session accepted");
    }

    /// §4.9 `onRelease`: removes the player from its sector (if any) and
    /// from the registry, then returns its storage to the pool. The network
    /// layer guarantees this fires exactly once per session id.
    pub async fn on_release(&self, session_id: SessionId) {
        let Some(player) = self.registry.remove(session_id).await else {
            // The network layer guarantees exactly one `on_release` per
            // accepted session; a miss here means that guarantee broke.
            error!(session_id, "on_release called for a session not in the registry");
            std::process::abort();
        };

        let (in_sector, x, y) = {
            let guard = player.lock().await;
            (guard.in_sector, guard.sector_x, guard.sector_y)
        };
        if in_sector {
            self.grid.remove(x, y, session_id).await;
        }

        self.pool.release(player);
        info!(session_id, "session released");
    }

    /// Decodes and routes one inbound packet, disconnecting the session on
    /// any protocol violation (§4.4).
    pub async fn dispatch(&self, session_id: SessionId, packet: Packet) {
        if let Err(violation) = dispatcher::dispatch(self, session_id, packet).await {
            warn!(session_id, error = %violation, "protocol violation, disconnecting session");
            self.network.disconnect(session_id);
        }
    }
}
