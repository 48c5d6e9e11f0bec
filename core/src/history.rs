//! Bounded snapshot stack and the undo-credit economy.

use std::collections::VecDeque;

use serde::Serialize;

use crate::config::GameConfig;
use crate::error::GameError;
use crate::grid::{Grid, TileId};

/// Point-in-time copy of everything undo restores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub grid: Grid,
    pub score: u32,
    pub undo_count: u32,
    pub rng_seed: u32,
    pub next_tile_id: TileId,
}

#[derive(Debug, Clone)]
pub struct History {
    snapshots: VecDeque<Snapshot>,
    capacity: usize,
    undo_count: u32,
    initial_undo_count: u32,
    max_undo_count: u32,
}

impl History {
    /// Empty history holding the configured starting credits.
    pub fn new(config: &GameConfig) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(config.history_capacity + 1),
            capacity: config.history_capacity,
            undo_count: config.initial_undo_credits,
            initial_undo_count: config.initial_undo_credits,
            max_undo_count: config.max_undo_credits,
        }
    }

    /// Drop every snapshot and refill undo credits.
    pub fn reset(&mut self) {
        self.snapshots.clear();
        self.undo_count = self.initial_undo_count;
    }

    /// Push a snapshot unless it repeats the top one's `(score, next_tile_id)`.
    ///
    /// Returns whether the snapshot was stored.
    pub fn save(&mut self, snapshot: Snapshot) -> bool {
        if let Some(top) = self.snapshots.back() {
            if top.score == snapshot.score && top.next_tile_id == snapshot.next_tile_id {
                tracing::trace!(
                    score = snapshot.score,
                    next_tile_id = snapshot.next_tile_id,
                    "duplicate snapshot dropped"
                );
                return false;
            }
        }

        self.snapshots.push_back(snapshot);
        if self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
            tracing::trace!(capacity = self.capacity, "oldest snapshot evicted");
        }
        true
    }

    /// Needs a credit and a snapshot older than the current one.
    pub fn can_undo(&self) -> bool {
        self.undo_count > 0 && self.snapshots.len() > 1
    }

    /// Pop the current snapshot and return the one beneath it, which stays on
    /// the stack as the new current state.
    ///
    /// Credits are not spent here; call [`History::spend_credit`] once the
    /// restore has been applied.
    pub fn undo(&mut self) -> Result<Snapshot, GameError> {
        if !self.can_undo() {
            return Err(GameError::NoHistory);
        }
        self.snapshots.pop_back();
        self.snapshots.back().cloned().ok_or(GameError::NoHistory)
    }

    /// Use one credit, never going below zero.
    pub fn spend_credit(&mut self) {
        self.undo_count = self.undo_count.saturating_sub(1);
    }

    /// Grant one credit unless already at the cap. Returns whether it was granted.
    pub fn earn_credit(&mut self) -> bool {
        if self.undo_count < self.max_undo_count {
            self.undo_count += 1;
            true
        } else {
            false
        }
    }

    /// Remaining undo credits.
    pub fn undo_count(&self) -> u32 {
        self.undo_count
    }

    /// Stored snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Most recently saved snapshot.
    pub fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.back()
    }

    /// Oldest snapshot still retained.
    pub fn oldest(&self) -> Option<&Snapshot> {
        self.snapshots.front()
    }
}
