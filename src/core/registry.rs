// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Session → player registry (§3, §4.2).

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::core::SessionId;
use crate::core::pool::PlayerHandle;

/// Exclusive for insert/remove (accept/release); shared for lookups done by
/// request handlers. The registry lock is never a substitute for the
/// per-player lock held inside the returned handle.
pub struct PlayerRegistry {
    inner: RwLock<HashMap<SessionId, PlayerHandle>>,
}

impl PlayerRegistry {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            inner: RwLock::new(HashMap::with_capacity(cap)),
        }
    }

    pub async fn insert(&self, session_id: SessionId, player: PlayerHandle) {
        self.inner.write().await.insert(session_id, player);
    }

    pub async fn remove(&self, session_id: SessionId) -> Option<PlayerHandle> {
        self.inner.write().await.remove(&session_id)
    }

    /// Looks up a player; `None` means the session was released concurrently.
    pub async fn get(&self, session_id: SessionId) -> Option<PlayerHandle> {
        self.inner.read().await.get(&session_id).cloned()
    }

    /// A point-in-time snapshot of live session ids, for the sweeper (§4.10).
    pub async fn snapshot_ids(&self) -> Vec<SessionId> {
        self.inner.read().await.keys().copied().collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
