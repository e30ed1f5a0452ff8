// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Per-session player state (§3, §4.1).

use tokio::time::Instant;

use crate::wire::messages::{ID_LEN, NICKNAME_LEN, SESSION_KEY_LEN};

/// Side length of the sector grid (§4.3).
pub const GRID_SIZE: usize = 50;

/// All mutators require the caller to hold this player's mutex exclusively;
/// there is no internal locking here.
#[derive(Debug)]
pub struct Player {
    pub session_id: u64,
    pub account_no: i64,
    pub id: [u16; ID_LEN],
    pub nickname: [u16; NICKNAME_LEN],
    pub session_key: [u8; SESSION_KEY_LEN],
    pub sector_x: u16,
    pub sector_y: u16,
    pub in_sector: bool,
    pub logged_in: bool,
    pub last_recv: Instant,
}

impl Player {
    pub fn init(session_id: u64) -> Self {
        Self {
            session_id,
            account_no: 0,
            id: [0; ID_LEN],
            nickname: [0; NICKNAME_LEN],
            session_key: [0; SESSION_KEY_LEN],
            sector_x: 0,
            sector_y: 0,
            in_sector: false,
            logged_in: false,
            last_recv: Instant::now(),
        }
    }

    /// Returns this player to its just-accepted state, for pool reuse.
    pub fn reset(&mut self, session_id: u64) {
        *self = Self::init(session_id);
    }

    pub fn log_in(
        &mut self,
        account_no: i64,
        id: [u16; ID_LEN],
        nickname: [u16; NICKNAME_LEN],
        session_key: [u8; SESSION_KEY_LEN],
    ) {
        self.account_no = account_no;
        self.id = id;
        self.nickname = nickname;
        self.session_key = session_key;
        self.logged_in = true;
    }

    pub fn move_sector(&mut self, x: u16, y: u16) {
        self.sector_x = x;
        self.sector_y = y;
        self.in_sector = true;
    }

    pub fn update_last_recv(&mut self, now: Instant) {
        self.last_recv = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_not_logged_in_or_in_sector() {
        let p = Player::init(7);
        assert!(!p.logged_in);
        assert!(!p.in_sector);
        assert_eq!(p.session_id, 7);
    }

    #[test]
    fn reset_clears_login_state() {
        let mut p = Player::init(1);
        p.log_in(100, [1; ID_LEN], [2; NICKNAME_LEN], [3; SESSION_KEY_LEN]);
        p.move_sector(5, 5);
        p.reset(2);
        assert_eq!(p.session_id, 2);
        assert!(!p.logged_in);
        assert!(!p.in_sector);
        assert_eq!(p.account_no, 0);
    }
}
