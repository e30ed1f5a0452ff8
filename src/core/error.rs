// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Structured dispatcher errors (§4.4, §7, §10.4). Every variant maps to
//! the same outcome — disconnect the offending session — but tests and
//! logs can match on *kind*.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolViolation {
    #[error("unknown packet type: 0x{0:04x}")]
    UnknownType(u16),

    #[error("size mismatch for {kind}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("sector coordinate out of range: ({x}, {y})")]
    SectorOutOfRange { x: u16, y: u16 },

    #[error("malformed {kind} payload: {source}")]
    Malformed {
        kind: &'static str,
        #[source]
        source: anyhow::Error,
    },
}
