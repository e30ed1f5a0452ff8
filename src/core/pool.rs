// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Player free-list allocator (§4.9, §10.7).

use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;

use crate::core::player::Player;

/// A registry-held reference to a player, mutated under its own async lock.
pub type PlayerHandle = Arc<AsyncMutex<Player>>;

/// A `Mutex<Vec<Box<Player>>>` free list: `acquire` pops a reused player
/// (resetting it) or allocates a new one; `release` pushes the storage back
/// once no other reference to it remains.
pub struct PlayerPool {
    free: Mutex<Vec<Box<Player>>>,
}

impl Default for PlayerPool {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerPool {
    pub fn new() -> Self {
        Self {
            free: Mutex::new(Vec::new()),
        }
    }

    pub fn acquire(&self, session_id: u64) -> PlayerHandle {
        let mut free = self.free.lock().expect("player pool mutex poisoned");
        let player = match free.pop() {
            Some(mut p) => {
                p.reset(session_id);
                p
            }
            None => Box::new(Player::init(session_id)),
        };
        Arc::new(AsyncMutex::new(*player))
    }

    /// Returns the player's storage to the free list if this was the last
    /// reference; otherwise the storage is simply dropped when the last
    /// remaining clone goes away. A handler holding a clone across a
    /// concurrent release is a narrow, transient race and is not worth
    /// blocking release on.
    pub fn release(&self, player: PlayerHandle) {
        if let Ok(mutex) = Arc::try_unwrap(player) {
            let player = mutex.into_inner();
            self.free
                .lock()
                .expect("player pool mutex poisoned")
                .push(Box::new(player));
        }
    }
}
