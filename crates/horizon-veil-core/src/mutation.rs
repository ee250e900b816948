//! Child-list mutation records and the pending delivery queue.
//!
//! Structural changes to a [`Document`](crate::Document) are journaled as
//! [`MutationRecord`]s. They are not delivered when they happen: observers
//! see them on the next call to
//! [`SharedDocument::deliver_mutations`](crate::SharedDocument::deliver_mutations),
//! which makes delivery asynchronous relative to the code that mutated.

use std::collections::VecDeque;

use crate::document::NodeId;

/// A single child-list change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// The node whose children changed.
    pub target: NodeId,
    /// Children inserted under `target`.
    pub added: Vec<NodeId>,
    /// Children removed from `target`.
    pub removed: Vec<NodeId>,
}

impl MutationRecord {
    /// A record for a single inserted child.
    pub fn added(target: NodeId, child: NodeId) -> Self {
        Self {
            target,
            added: vec![child],
            removed: Vec::new(),
        }
    }

    /// A record for a single removed child.
    pub fn removed(target: NodeId, child: NodeId) -> Self {
        Self {
            target,
            added: Vec::new(),
            removed: vec![child],
        }
    }
}

/// Queue of records waiting for the next delivery cycle.
#[derive(Debug, Default)]
pub struct MutationQueue {
    records: VecDeque<MutationRecord>,
}

impl MutationQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            records: VecDeque::new(),
        }
    }

    /// Append a record.
    pub fn push(&mut self, record: MutationRecord) {
        self.records.push_back(record);
    }

    /// Check if there are any pending records.
    pub fn has_pending(&self) -> bool {
        !self.records.is_empty()
    }

    /// Get the number of pending records.
    pub fn pending_count(&self) -> usize {
        self.records.len()
    }

    /// Remove and return every pending record, oldest first.
    pub fn take_all(&mut self) -> Vec<MutationRecord> {
        self.records.drain(..).collect()
    }

    /// Drop all pending records.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
