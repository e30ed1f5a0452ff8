// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! A multi-threaded chat relay: clients authenticate, place themselves on a
//! 50×50 sector grid, and broadcast to the 3×3 neighborhood around their
//! current sector. See `core` for the session/sector dispatch engine, `net`
//! for the concrete TCP transport, and `wire` for the packet codec.

pub mod cfg;
pub mod core;
pub mod net;
pub mod wire;
