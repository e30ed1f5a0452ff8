// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The network-layer contract the core consumes (§6.2). This crate's
//! `net` module provides the concrete implementation (§10.1); the core
//! only depends on this trait, so it never needs to know about sockets.

use crate::core::SessionId;
use crate::wire::Packet;

/// Must tolerate unknown or already-closed sessions silently, and must not
/// block the caller — `send_packet`/`disconnect` may be called while a
/// handler holds registry/player/sector locks (§4.7) and must return
/// promptly.
pub trait NetworkLayer: Send + Sync {
    /// Increments the packet's refcount and enqueues it for delivery.
    fn send_packet(&self, session_id: SessionId, packet: Packet);

    /// Requests asynchronous teardown; eventually produces `on_release`.
    fn disconnect(&self, session_id: SessionId);
}
