//! Application of drained operations to the index engine.
//!
//! The [`Dispatcher`] walks a batch of [`OperationRecord`]s in order,
//! resolves each target to its current content and calls the matching
//! [`IndexEngine`] method. A failing record does not stop the batch: later
//! records are independent operations on independent targets. Failures are
//! returned in a [`DispatchReport`] once every record has been attempted.
//! Failed operations are not re-queued.
//!
//! Unindex records are not resolved: the object is usually gone from the
//! content tree by the time its removal is flushed, and the engine only
//! needs the identity.

use std::sync::Arc;

use ahash::AHashSet;
use log::{debug, warn};

use crate::content::ContentStore;
use crate::engine::IndexEngine;
use crate::error::{IndexQueueError, Result};
use crate::operation::{OperationKind, OperationRecord, TargetId};

/// A record that could not be applied.
#[derive(Debug)]
pub struct DispatchFailure {
    pub target: TargetId,
    pub kind: OperationKind,
    pub error: IndexQueueError,
}

/// Outcome of applying one batch.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Records attempted.
    pub attempted: usize,

    /// Records the engine accepted.
    pub applied: usize,

    /// Records that failed, in batch order.
    pub failures: Vec<DispatchFailure>,
}

impl DispatchReport {
    /// True when every attempted record was applied.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_targets(&self) -> Vec<&TargetId> {
        self.failures.iter().map(|failure| &failure.target).collect()
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: DispatchReport) {
        self.attempted += other.attempted;
        self.applied += other.applied;
        self.failures.extend(other.failures);
    }
}

/// Applies operation batches to an engine.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    engine: Arc<dyn IndexEngine>,
    content: Arc<dyn ContentStore>,
}

impl Dispatcher {
    pub fn new(engine: Arc<dyn IndexEngine>, content: Arc<dyn ContentStore>) -> Self {
        Dispatcher { engine, content }
    }

    pub fn engine(&self) -> &Arc<dyn IndexEngine> {
        &self.engine
    }

    pub fn content(&self) -> &Arc<dyn ContentStore> {
        &self.content
    }

    /// Apply a batch in order.
    ///
    /// Per-record failures end up in the report. The only error returned is
    /// an [`InvariantViolation`](IndexQueueError::InvariantViolation) for a
    /// batch naming the same target twice, which is rejected before anything
    /// is applied.
    pub fn apply(&self, ops: Vec<OperationRecord>) -> Result<DispatchReport> {
        check_single_record_per_target(&ops)?;

        let mut report = DispatchReport {
            attempted: ops.len(),
            ..DispatchReport::default()
        };

        for op in ops {
            match self.apply_one(&op) {
                Ok(()) => report.applied += 1,
                Err(error) => {
                    warn!("failed to {} {}: {}", op.kind, op.target, error);
                    report.failures.push(DispatchFailure {
                        target: op.target,
                        kind: op.kind,
                        error,
                    });
                }
            }
        }

        debug!(
            "dispatched {} operations ({} failed)",
            report.attempted,
            report.failures.len()
        );
        Ok(report)
    }

    /// Apply a single record.
    pub fn apply_one(&self, op: &OperationRecord) -> Result<()> {
        match &op.kind {
            OperationKind::Index => {
                let object = self.content.resolve(&op.target)?;
                self.engine.index(&object)
            }
            OperationKind::Unindex => self.engine.unindex(&op.target),
            OperationKind::Reindex(attributes) => {
                let object = self.content.resolve(&op.target)?;
                self.engine.reindex(&object, attributes.as_filter())
            }
        }
    }
}

fn check_single_record_per_target(ops: &[OperationRecord]) -> Result<()> {
    let mut seen = AHashSet::with_capacity(ops.len());
    for op in ops {
        if !seen.insert(&op.target) {
            return Err(IndexQueueError::invariant(format!(
                "more than one pending operation for {}",
                op.target
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentObject;
    use crate::content::memory::MemoryContentStore;
    use crate::engine::recording::{EngineCall, RecordingEngine};
    use crate::operation::Attributes;

    fn setup() -> (Arc<RecordingEngine>, MemoryContentStore, Dispatcher) {
        let engine = Arc::new(RecordingEngine::new());
        let content = MemoryContentStore::new();
        let dispatcher = Dispatcher::new(engine.clone(), Arc::new(content.clone()));
        (engine, content, dispatcher)
    }

    #[test]
    fn test_apply_translates_operations() {
        let (engine, content, dispatcher) = setup();
        content.insert(ContentObject::new("/a").with_attribute("title", "A"));
        content.insert(ContentObject::new("/b").with_attribute("title", "B"));

        let report = dispatcher
            .apply(vec![
                OperationRecord::index("/a"),
                OperationRecord::reindex("/b", Attributes::All),
                OperationRecord::unindex("/c"),
            ])
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.applied, 3);
        assert_eq!(
            engine.calls(),
            vec![
                EngineCall::Index { target: "/a".into() },
                EngineCall::Reindex {
                    target: "/b".into(),
                    attributes: None
                },
                EngineCall::Unindex { target: "/c".into() },
            ]
        );
    }

    #[test]
    fn test_failures_do_not_stop_the_batch() {
        let (engine, content, dispatcher) = setup();
        content.insert(ContentObject::new("/a"));
        content.insert(ContentObject::new("/c"));
        engine.fail_on("/c");

        let report = dispatcher
            .apply(vec![
                OperationRecord::index("/missing"),
                OperationRecord::index("/c"),
                OperationRecord::index("/a"),
            ])
            .unwrap();

        assert_eq!(report.attempted, 3);
        assert_eq!(report.applied, 1);
        assert_eq!(
            report.failed_targets(),
            vec![&TargetId::from("/missing"), &TargetId::from("/c")]
        );
        assert!(matches!(
            report.failures[0].error,
            IndexQueueError::Resolution(_)
        ));
        assert!(matches!(report.failures[1].error, IndexQueueError::Engine(_)));
        assert!(engine.catalog().contains(&"/a".into()));
    }

    #[test]
    fn test_duplicate_targets_are_rejected_before_applying() {
        let (engine, content, dispatcher) = setup();
        content.insert(ContentObject::new("/a"));

        let err = dispatcher
            .apply(vec![
                OperationRecord::index("/a"),
                OperationRecord::unindex("/a"),
            ])
            .unwrap_err();

        assert!(matches!(err, IndexQueueError::InvariantViolation(_)));
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn test_empty_batch() {
        let (engine, _, dispatcher) = setup();
        let report = dispatcher.apply(Vec::new()).unwrap();
        assert_eq!(report.attempted, 0);
        assert!(engine.calls().is_empty());
    }
}
