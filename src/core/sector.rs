// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The 50×50 sector grid and its rank-ordered locking discipline (§4.3, §9).

use std::collections::HashSet;

use tokio::sync::RwLock;

use crate::core::SessionId;
use crate::core::player::GRID_SIZE;

/// A fixed `GRID_SIZE × GRID_SIZE` matrix of session-id sets, one
/// reader/writer lock per cell. Cell rank is `y * GRID_SIZE + x`; any code
/// holding more than one cell lock at a time must acquire in ascending rank
/// order and release in descending order (§4.3).
pub struct SectorGrid {
    cells: Vec<RwLock<HashSet<SessionId>>>,
}

impl Default for SectorGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl SectorGrid {
    pub fn new() -> Self {
        let cells = (0..GRID_SIZE * GRID_SIZE)
            .map(|_| RwLock::new(HashSet::new()))
            .collect();
        Self { cells }
    }

    #[inline]
    pub fn rank(x: u16, y: u16) -> usize {
        y as usize * GRID_SIZE + x as usize
    }

    #[inline]
    pub fn in_bounds(x: u16, y: u16) -> bool {
        (x as usize) < GRID_SIZE && (y as usize) < GRID_SIZE
    }

    /// Ranks of the up-to-nine cells in the 3×3 block centered on `(x, y)`,
    /// ascending, with out-of-grid neighbors skipped (§4.3, scenario 3).
    fn neighborhood_ranks(x: u16, y: u16) -> Vec<usize> {
        let (cx, cy) = (x as i32, y as i32);
        let mut ranks = Vec::with_capacity(9);
        for dy in -1..=1 {
            let ny = cy + dy;
            if ny < 0 || ny as usize >= GRID_SIZE {
                continue;
            }
            for dx in -1..=1 {
                let nx = cx + dx;
                if nx < 0 || nx as usize >= GRID_SIZE {
                    continue;
                }
                ranks.push(Self::rank(nx as u16, ny as u16));
            }
        }
        ranks.sort_unstable();
        ranks
    }

    /// Case A (§4.6): the session was not previously in any cell.
    pub async fn insert(&self, x: u16, y: u16, session_id: SessionId) {
        self.cells[Self::rank(x, y)].write().await.insert(session_id);
    }

    /// Used by release (§4.9) to drop a session out of its current cell.
    pub async fn remove(&self, x: u16, y: u16, session_id: SessionId) {
        self.cells[Self::rank(x, y)].write().await.remove(&session_id);
    }

    /// Case C (§4.6): moves a session between two distinct cells, taking
    /// both exclusive locks in ascending rank order. Same-cell moves (Case
    /// B) must not call this — they take no sector locks at all.
    pub async fn move_cell(&self, prev: (u16, u16), next: (u16, u16), session_id: SessionId) {
        let prev_rank = Self::rank(prev.0, prev.1);
        let next_rank = Self::rank(next.0, next.1);
        debug_assert_ne!(prev_rank, next_rank, "same-cell moves take no sector locks");

        let (lo_rank, hi_rank) = if prev_rank < next_rank {
            (prev_rank, next_rank)
        } else {
            (next_rank, prev_rank)
        };

        let mut lo_guard = self.cells[lo_rank].write().await;
        let mut hi_guard = self.cells[hi_rank].write().await;

        if prev_rank == lo_rank {
            lo_guard.remove(&session_id);
            hi_guard.insert(session_id);
        } else {
            hi_guard.remove(&session_id);
            lo_guard.insert(session_id);
        }
        // `hi_guard` drops before `lo_guard` (reverse declaration order),
        // matching the descending-rank release order.
    }

    /// Snapshots the session ids present across the 3×3 neighborhood of
    /// `(x, y)`, taking shared locks in ascending rank order and releasing
    /// in descending order (§4.7).
    pub async fn snapshot_neighborhood(&self, x: u16, y: u16) -> Vec<SessionId> {
        let ranks = Self::neighborhood_ranks(x, y);
        let mut guards = Vec::with_capacity(ranks.len());
        for rank in ranks {
            guards.push(self.cells[rank].read().await);
        }

        let ids = guards.iter().flat_map(|g| g.iter().copied()).collect();

        guards.reverse(); // descending-rank release order
        drop(guards);
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_then_snapshot_finds_member() {
        let grid = SectorGrid::new();
        grid.insert(5, 5, 7).await;
        let ids = grid.snapshot_neighborhood(5, 5).await;
        assert_eq!(ids, vec![7]);
    }

    #[tokio::test]
    async fn edge_cell_neighborhood_skips_out_of_grid() {
        let grid = SectorGrid::new();
        grid.insert(0, 0, 1).await;
        grid.insert(1, 0, 2).await;
        grid.insert(0, 1, 3).await;
        grid.insert(1, 1, 4).await;

        let mut ids = grid.snapshot_neighborhood(0, 0).await;
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn move_cell_relocates_membership() {
        let grid = SectorGrid::new();
        grid.insert(9, 10, 2).await;
        grid.move_cell((9, 10), (30, 30), 2).await;

        assert!(grid.snapshot_neighborhood(9, 10).await.is_empty());
        assert_eq!(grid.snapshot_neighborhood(30, 30).await, vec![2]);
    }

    #[tokio::test]
    async fn neighborhood_does_not_include_distant_session() {
        let grid = SectorGrid::new();
        for (x, y, id) in [(4, 4, 1), (5, 5, 5), (6, 6, 9)] {
            grid.insert(x, y, id).await;
        }
        grid.insert(8, 8, 10).await;

        let mut ids = grid.snapshot_neighborhood(5, 5).await;
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 5, 9]);
    }
}
