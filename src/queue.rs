//! The per-unit-of-work queue of pending index operations.
//!
//! The queue holds at most one live [`OperationRecord`] per target. Every
//! [`append`](IndexQueue::append) runs the [coalescer](coalesce::combine)
//! against the pending record for the same target, so the queue always holds
//! the minimal set of operations needed to bring the index up to date.
//!
//! Iteration order is the order in which targets were first touched. A
//! target whose record was dropped by coalescing (index then unindex) and is
//! touched again is appended at the back.
//!
//! A queue is owned by exactly one unit of work and is not shared between
//! threads; every mutating method takes `&mut self`.
//!
//! # Example
//!
//! ```
//! use index_queue::operation::{Attributes, OperationRecord};
//! use index_queue::queue::IndexQueue;
//!
//! let mut queue = IndexQueue::new();
//! queue.append(OperationRecord::reindex("/doc", Attributes::only(["title"])));
//! queue.append(OperationRecord::reindex("/doc", Attributes::only(["body"])));
//!
//! let ops = queue.drain();
//! assert_eq!(ops.len(), 1);
//! assert_eq!(ops[0], OperationRecord::reindex("/doc", Attributes::only(["title", "body"])));
//! assert!(queue.is_empty());
//! ```

pub mod coalesce;

use indexmap::IndexMap;
use log::trace;

use crate::operation::{OperationKind, OperationRecord, TargetId};

/// Ordered, coalescing collection of pending operations.
#[derive(Debug, Default, Clone)]
pub struct IndexQueue {
    pending: IndexMap<TargetId, OperationKind>,
}

impl IndexQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an operation, merging it with any pending one for the same target.
    pub fn append(&mut self, op: OperationRecord) {
        let OperationRecord { target, kind } = op;
        let merged = coalesce::combine(self.pending.get(&target), kind);

        match merged {
            Some(kind) => {
                trace!("queued {kind} for {target}");
                // Keeps the original position when the target is already pending.
                self.pending.insert(target, kind);
            }
            None => {
                trace!("pending operations for {target} cancelled out");
                self.pending.shift_remove(&target);
            }
        }
    }

    /// Take every pending operation in first-touch order, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<OperationRecord> {
        std::mem::take(&mut self.pending)
            .into_iter()
            .map(|(target, kind)| OperationRecord { target, kind })
            .collect()
    }

    /// Drop every pending operation without applying it.
    ///
    /// Returns the number of operations dropped.
    pub fn discard(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// The pending operation for a target, if any.
    pub fn get(&self, target: &TargetId) -> Option<&OperationKind> {
        self.pending.get(target)
    }

    /// Pending operations in first-touch order.
    pub fn iter(&self) -> impl Iterator<Item = (&TargetId, &OperationKind)> {
        self.pending.iter()
    }
}
