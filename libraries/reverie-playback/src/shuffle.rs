//! Shuffle queue
//!
//! A materialized random permutation of the catalog plus a cursor, so that
//! shuffled next/previous are deterministic within a session.

use rand::seq::SliceRandom;
use rand::Rng;
use reverie_catalog::TrackId;

/// Random permutation of track ids with a current index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShuffleQueue {
    /// Every catalog track exactly once
    order: Vec<TrackId>,

    /// Cursor into `order` (0 when empty)
    index: usize,
}

impl ShuffleQueue {
    /// Build a fresh permutation.
    ///
    /// Uses Fisher-Yates via `SliceRandom::shuffle`, so each of the N!
    /// orderings is equally likely for a uniform `rng`.
    pub fn generate<R: Rng + ?Sized>(ids: Vec<TrackId>, rng: &mut R) -> Self {
        let mut order = ids;
        order.shuffle(rng);
        Self { order, index: 0 }
    }

    pub fn order(&self) -> &[TrackId] {
        &self.order
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Track under the cursor
    pub fn current(&self) -> Option<TrackId> {
        self.order.get(self.index).copied()
    }

    pub fn position_of(&self, id: TrackId) -> Option<usize> {
        self.order.iter().position(|&t| t == id)
    }

    /// Move the cursor onto `id`. Returns false if it is not in the queue.
    pub fn relocate(&mut self, id: TrackId) -> bool {
        match self.position_of(id) {
            Some(position) => {
                self.index = position;
                true
            }
            None => false,
        }
    }

    /// Id one step after `from` (or after the cursor), wrapping
    pub fn peek_after(&self, from: Option<TrackId>) -> Option<TrackId> {
        let len = self.order.len();
        if len == 0 {
            return None;
        }
        let base = from
            .and_then(|id| self.position_of(id))
            .unwrap_or(self.index);
        self.order.get((base + 1) % len).copied()
    }

    /// Id one step before `from` (or before the cursor), wrapping
    pub fn peek_before(&self, from: Option<TrackId>) -> Option<TrackId> {
        let len = self.order.len();
        if len == 0 {
            return None;
        }
        let base = from
            .and_then(|id| self.position_of(id))
            .unwrap_or(self.index);
        self.order.get((base + len - 1) % len).copied()
    }
}
