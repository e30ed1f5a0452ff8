// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Pluggable LOGIN authorization (§9 open question, §10.6).

use crate::wire::messages::SESSION_KEY_LEN;

/// Decides whether a LOGIN request's account/session key may proceed.
/// The default accepts everything, matching the original's unconditional
/// acceptance; deployments that need real verification implement this.
pub trait SessionAuthorizer: Send + Sync {
    fn authorize(&self, account_no: i64, session_key: &[u8; SESSION_KEY_LEN]) -> bool;
}

pub struct AcceptAllAuthorizer;

impl SessionAuthorizer for AcceptAllAuthorizer {
    fn authorize(&self, _account_no: i64, _session_key: &[u8; SESSION_KEY_LEN]) -> bool {
        true
    }
}
