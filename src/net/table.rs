// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Concrete [`NetworkLayer`](crate::core::NetworkLayer) backed by a
//! session-id → outbound-queue table (§10.1).

use std::collections::HashMap;
use std::sync::RwLock;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::{NetworkLayer, SessionId};
use crate::wire::Packet;

struct SessionSlot {
    outbound: mpsc::Sender<Packet>,
    cancel: CancellationToken,
}

/// A plain `RwLock<HashMap<...>>` rather than a sharded concurrent map: the
/// core's lock-order discipline (§4.3, §5) is the part under test here, and
/// an opaque sharded map would only obscure that this table's own locking
/// is uninvolved in it (it is read/written independently of every registry
/// and sector lock).
#[derive(Default)]
pub struct SessionTable {
    inner: RwLock<HashMap<SessionId, SessionSlot>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        session_id: SessionId,
        outbound: mpsc::Sender<Packet>,
        cancel: CancellationToken,
    ) {
        self.inner
            .write()
            .expect("session table poisoned")
            .insert(session_id, SessionSlot { outbound, cancel });
    }

    pub fn deregister(&self, session_id: SessionId) {
        self.inner
            .write()
            .expect("session table poisoned")
            .remove(&session_id);
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("session table poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NetworkLayer for SessionTable {
    fn send_packet(&self, session_id: SessionId, packet: Packet) {
        let table = self.inner.read().expect("session table poisoned");
        if let Some(slot) = table.get(&session_id) {
            // A full or closed queue is tolerated silently, per §6.2.
            let _ = slot.outbound.try_send(packet);
        }
    }

    fn disconnect(&self, session_id: SessionId) {
        let table = self.inner.read().expect("session table poisoned");
        if let Some(slot) = table.get(&session_id) {
            slot.cancel.cancel();
        }
    }
}
