// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The session-and-sector dispatch engine (§2–§9): player records, the
//! registry, the sector grid, the dispatcher, and the handlers that tie
//! them together. Everything here is transport-agnostic — it depends only
//! on the [`network::NetworkLayer`] trait, never on `net` directly.

pub mod auth;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod network;
pub mod player;
pub mod pool;
pub mod registry;
pub mod sector;
pub mod state;
pub mod sweeper;

/// Opaque session identifier assigned by the network layer.
pub type SessionId = u64;

pub use auth::{AcceptAllAuthorizer, SessionAuthorizer};
pub use error::ProtocolViolation;
pub use network::NetworkLayer;
pub use player::{GRID_SIZE, Player};
pub use pool::{PlayerHandle, PlayerPool};
pub use registry::PlayerRegistry;
pub use sector::SectorGrid;
pub use state::ChatServerState;
