//! A recording test double for [`IndexEngine`].
//!
//! Every mutating call is appended to a call log before being forwarded to
//! an inner [`MemoryCatalog`], so tests can assert both on exactly which
//! engine calls a flush produced and on the resulting index state. Failures
//! can be injected per target.

use std::collections::BTreeSet;

use ahash::AHashSet;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::content::ContentObject;
use crate::engine::memory::MemoryCatalog;
use crate::engine::{CatalogQuery, IndexEngine, SearchResults};
use crate::error::{IndexQueueError, Result};
use crate::operation::TargetId;

/// One recorded mutating engine call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum EngineCall {
    Index {
        target: TargetId,
    },
    Unindex {
        target: TargetId,
    },
    Reindex {
        target: TargetId,
        /// `None` for a full reindex.
        attributes: Option<BTreeSet<String>>,
    },
}

impl EngineCall {
    pub fn target(&self) -> &TargetId {
        match self {
            EngineCall::Index { target }
            | EngineCall::Unindex { target }
            | EngineCall::Reindex { target, .. } => target,
        }
    }
}

/// Engine double recording calls on top of a [`MemoryCatalog`].
#[derive(Debug, Default)]
pub struct RecordingEngine {
    catalog: MemoryCatalog,
    calls: Mutex<Vec<EngineCall>>,
    failing: Mutex<AHashSet<TargetId>>,
    searches: Mutex<usize>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call for `target` fail with an engine error. The failed
    /// call is still recorded.
    pub fn fail_on<T: Into<TargetId>>(&self, target: T) {
        self.failing.lock().insert(target.into());
    }

    /// Stop failing calls for `target`.
    pub fn recover(&self, target: &TargetId) {
        self.failing.lock().remove(target);
    }

    /// All recorded calls in order.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone()
    }

    /// Recorded calls for one target.
    pub fn calls_for(&self, target: &TargetId) -> Vec<EngineCall> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.target() == target)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Number of queries executed.
    pub fn search_count(&self) -> usize {
        *self.searches.lock()
    }

    /// The catalog holding the resulting index state.
    pub fn catalog(&self) -> &MemoryCatalog {
        &self.catalog
    }

    fn record(&self, call: EngineCall) -> Result<()> {
        let target = call.target().clone();
        self.calls.lock().push(call);
        if self.failing.lock().contains(&target) {
            return Err(IndexQueueError::engine(format!(
                "injected failure for {target}"
            )));
        }
        Ok(())
    }
}

impl IndexEngine for RecordingEngine {
    fn index(&self, object: &ContentObject) -> Result<()> {
        self.record(EngineCall::Index {
            target: object.id.clone(),
        })?;
        self.catalog.index(object)
    }

    fn unindex(&self, target: &TargetId) -> Result<()> {
        self.record(EngineCall::Unindex {
            target: target.clone(),
        })?;
        self.catalog.unindex(target)
    }

    fn reindex(&self, object: &ContentObject, attributes: Option<&BTreeSet<String>>) -> Result<()> {
        self.record(EngineCall::Reindex {
            target: object.id.clone(),
            attributes: attributes.cloned(),
        })?;
        self.catalog.reindex(object, attributes)
    }

    fn search(&self, query: &CatalogQuery) -> Result<SearchResults> {
        *self.searches.lock() += 1;
        self.catalog.search(query)
    }

    fn counter(&self) -> u64 {
        self.catalog.counter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calls_are_recorded_in_order() {
        let engine = RecordingEngine::new();
        let doc = ContentObject::new("/a").with_attribute("title", "x");
        engine.index(&doc).unwrap();
        engine.reindex(&doc, None).unwrap();
        engine.unindex(&doc.id).unwrap();

        assert_eq!(
            engine.calls(),
            vec![
                EngineCall::Index { target: doc.id.clone() },
                EngineCall::Reindex {
                    target: doc.id.clone(),
                    attributes: None
                },
                EngineCall::Unindex { target: doc.id.clone() },
            ]
        );
        assert!(engine.catalog().is_empty());
    }

    #[test]
    fn test_injected_failure() {
        let engine = RecordingEngine::new();
        engine.fail_on("/bad");
        let bad = ContentObject::new("/bad");

        let err = engine.index(&bad).unwrap_err();
        assert!(matches!(err, IndexQueueError::Engine(_)));
        assert_eq!(engine.calls_for(&bad.id).len(), 1);
        assert!(!engine.catalog().contains(&bad.id));

        engine.recover(&bad.id);
        engine.index(&bad).unwrap();
        assert!(engine.catalog().contains(&bad.id));
    }
}
