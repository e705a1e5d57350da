//! Bounded undo history.
//!
//! Each entry pairs a copy of the mask taken right before a store mutation
//! with enough of that mutation to revert it. Only the newest `capacity`
//! entries are kept.

use mezo_core::{Mezo, MezoId};
use mezo_raster::MaskSnapshot;
use std::collections::VecDeque;

/// The store mutation an entry precedes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UndoAction {
    Created(MezoId),
    /// Deleted `mezo`; its id fixes where it goes back in paint order.
    Removed(Mezo),
}

#[derive(Debug, Clone)]
pub struct UndoEntry {
    pub snapshot: MaskSnapshot,
    pub action: UndoAction,
}

#[derive(Debug, Clone)]
pub struct UndoHistory<T = UndoEntry> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> UndoHistory<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append, evicting the oldest entry beyond capacity.
    pub fn push(&mut self, entry: T) {
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn pop(&mut self) -> Option<T> {
        self.entries.pop_back()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
