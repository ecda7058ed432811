//! The indexing gateway and its units of work.
//!
//! [`IndexingGateway`] sits between the content layer and the
//! [`IndexEngine`]; it is the only component that calls the engine. Content
//! code opens a [`UnitOfWork`] per request or transaction and reports
//! mutations through it. The unit of work owns an [`IndexQueue`] and decides
//! when that queue is drained:
//!
//! - explicitly, through [`UnitOfWork::flush`]
//! - before every read, through the [`FlushingCatalog`] returned by
//!   [`UnitOfWork::catalog`], so queries always see the unit's own writes
//! - at the end of the unit: [`commit`](UnitOfWork::commit) flushes,
//!   [`abort`](UnitOfWork::abort) (or dropping the unit) discards
//!
//! Each unit of work carries its own [`IndexingMode`]. In
//! [`Immediate`](IndexingMode::Immediate) mode requests skip the queue and
//! go straight to the engine.
//!
//! The gateway keeps an index generation counter that moves forward once
//! for every flush that changed the index, so callers can detect changes
//! without querying.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use index_queue::content::ContentObject;
//! use index_queue::content::memory::MemoryContentStore;
//! use index_queue::engine::CatalogQuery;
//! use index_queue::engine::memory::MemoryCatalog;
//! use index_queue::gateway::IndexingGateway;
//! use index_queue::gateway::config::GatewayConfig;
//!
//! let content = MemoryContentStore::new();
//! let gateway = Arc::new(IndexingGateway::new(
//!     Arc::new(MemoryCatalog::new()),
//!     Arc::new(content.clone()),
//!     GatewayConfig::default(),
//! ));
//!
//! let doc = ContentObject::new("/site/doc").with_attribute("title", "Hello");
//! content.insert(doc.clone());
//!
//! let mut uow = gateway.begin();
//! uow.request_index(&doc).unwrap();
//!
//! // The query flushes the pending index operation first.
//! let results = uow.catalog().search(&CatalogQuery::new().term("title", "hello")).unwrap();
//! assert_eq!(results.total_hits, 1);
//!
//! uow.commit().unwrap();
//! assert_eq!(gateway.generation(), 1);
//! ```

pub mod config;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info, warn};
use uuid::Uuid;

use crate::content::filter::{EligibilityFilter, IdCheck, TransientContentFilter};
use crate::content::{ContentObject, ContentStore};
use crate::dispatch::{DispatchFailure, DispatchReport, Dispatcher};
use crate::engine::{CatalogQuery, IndexEngine, SearchResults};
use crate::error::{IndexQueueError, Result};
use crate::gateway::config::{GatewayConfig, IndexingMode};
use crate::operation::{Attributes, OperationRecord, TargetId};
use crate::queue::IndexQueue;

/// Shared entry point to the index engine.
#[derive(Debug)]
pub struct IndexingGateway {
    dispatcher: Dispatcher,
    filter: Arc<dyn EligibilityFilter>,
    config: GatewayConfig,
    generation: AtomicU64,
}

impl IndexingGateway {
    /// Create a gateway using the [`TransientContentFilter`].
    pub fn new(
        engine: Arc<dyn IndexEngine>,
        content: Arc<dyn ContentStore>,
        config: GatewayConfig,
    ) -> Self {
        IndexingGateway {
            dispatcher: Dispatcher::new(engine, content),
            filter: Arc::new(TransientContentFilter),
            config,
            generation: AtomicU64::new(0),
        }
    }

    /// Replace the eligibility filter.
    pub fn with_filter(mut self, filter: Arc<dyn EligibilityFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Open a unit of work in the configured default mode.
    pub fn begin(self: &Arc<Self>) -> UnitOfWork {
        let uow = UnitOfWork {
            id: Uuid::new_v4(),
            gateway: Arc::clone(self),
            queue: IndexQueue::new(),
            mode: self.config.mode,
            state: UnitState::Empty,
            read_flushes: DispatchReport::default(),
            finished: false,
        };
        debug!("unit of work {} started ({:?})", uow.id, uow.mode);
        uow
    }

    /// Current index generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Reads go through [`UnitOfWork::catalog`] so they see pending writes.
    pub(crate) fn engine(&self) -> &Arc<dyn IndexEngine> {
        self.dispatcher.engine()
    }

    pub fn content(&self) -> &Arc<dyn ContentStore> {
        self.dispatcher.content()
    }

    fn advance_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// Where a unit of work is in its lifecycle.
///
/// `Flushed` and `Discarded` accept new requests exactly like `Empty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Empty,
    Accumulating,
    Flushed,
    Discarded,
}

/// What happened to a mutation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Added to the queue (possibly cancelling out a pending operation).
    Queued,
    /// Applied to the engine right away.
    Applied,
    /// Rejected by the eligibility filter.
    Dropped,
}

/// Result of draining the queue.
#[derive(Debug, Default)]
pub struct FlushReport {
    pub dispatch: DispatchReport,

    /// Index generation after the flush.
    pub generation: u64,
}

impl FlushReport {
    /// True when nothing was drained.
    pub fn is_empty(&self) -> bool {
        self.dispatch.attempted == 0 && self.dispatch.failures.is_empty()
    }

    pub fn is_success(&self) -> bool {
        self.dispatch.is_success()
    }

    pub fn failures(&self) -> &[DispatchFailure] {
        &self.dispatch.failures
    }
}

/// A unit of work: one request's worth of index mutations.
///
/// Not shared between threads; run units of work in parallel by opening one
/// per thread from the same gateway.
#[derive(Debug)]
pub struct UnitOfWork {
    id: Uuid,
    gateway: Arc<IndexingGateway>,
    queue: IndexQueue,
    mode: IndexingMode,
    state: UnitState,
    /// Outcome of flushes triggered by reads, reported again at commit.
    read_flushes: DispatchReport,
    finished: bool,
}

impl UnitOfWork {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> IndexingMode {
        self.mode
    }

    pub fn state(&self) -> UnitState {
        if self.queue.is_empty() {
            self.state
        } else {
            UnitState::Accumulating
        }
    }

    /// Pending operations.
    pub fn pending(&self) -> &IndexQueue {
        &self.queue
    }

    pub fn gateway(&self) -> &Arc<IndexingGateway> {
        &self.gateway
    }

    /// Switch the indexing mode for the rest of this unit of work.
    ///
    /// Pending operations are flushed before switching to immediate mode so
    /// that they are not overtaken by immediate ones.
    pub fn set_mode(&mut self, mode: IndexingMode) -> Result<FlushReport> {
        let report = if mode == IndexingMode::Immediate {
            self.flush()?
        } else {
            self.empty_report()
        };
        self.mode = mode;
        Ok(report)
    }

    /// Request that an object be added to the index.
    pub fn request_index(&mut self, object: &ContentObject) -> Result<RequestOutcome> {
        let Some(target) = self.gateway.filter.admit(object, IdCheck::Required) else {
            return Ok(self.dropped(object));
        };
        self.submit(OperationRecord::index(target))
    }

    /// Request that an object be removed from the index.
    pub fn request_unindex(&mut self, object: &ContentObject) -> Result<RequestOutcome> {
        let Some(target) = self.gateway.filter.admit(object, IdCheck::Skip) else {
            return Ok(self.dropped(object));
        };
        self.submit(OperationRecord::unindex(target))
    }

    /// Request that an object's attributes be refreshed in the index.
    ///
    /// A full reindex also marks the object modified in the content store
    /// (see [`GatewayConfig::touch_on_full_reindex`]).
    pub fn request_reindex(
        &mut self,
        object: &ContentObject,
        attributes: Attributes,
    ) -> Result<RequestOutcome> {
        let Some(target) = self.gateway.filter.admit(object, IdCheck::Required) else {
            return Ok(self.dropped(object));
        };
        let attributes = attributes.normalized();

        if attributes.is_all() && self.gateway.config.touch_on_full_reindex {
            if let Err(e) = self.gateway.content().notify_modified(&target) {
                warn!("could not mark {target} modified: {e}");
            }
        }

        self.submit(OperationRecord::reindex(target, attributes))
    }

    /// Refresh the position attribute of every child of a reordered container.
    ///
    /// Returns the number of children whose reindex was accepted.
    pub fn reindex_on_reorder(&mut self, parent: &TargetId) -> Result<usize> {
        let attribute = self.gateway.config.reorder_attribute.clone();
        let children = self.gateway.content().children(parent)?;

        let mut accepted = 0;
        for child in &children {
            let outcome = self.request_reindex(child, Attributes::only([attribute.as_str()]))?;
            if outcome != RequestOutcome::Dropped {
                accepted += 1;
            }
        }
        debug!("reorder of {parent}: reindexing {accepted} children");
        Ok(accepted)
    }

    /// Apply every pending operation now.
    ///
    /// A flush of an empty queue does nothing and leaves the generation
    /// unchanged.
    pub fn flush(&mut self) -> Result<FlushReport> {
        if self.queue.is_empty() {
            return Ok(self.empty_report());
        }

        let ops = self.queue.drain();
        let dispatch = self.gateway.dispatcher.apply(ops)?;
        let generation = if dispatch.applied > 0 {
            self.gateway.advance_generation()
        } else {
            self.gateway.generation()
        };
        self.state = UnitState::Flushed;

        debug!(
            "unit of work {} flushed {} operations, generation {}",
            self.id, dispatch.attempted, generation
        );
        Ok(FlushReport {
            dispatch,
            generation,
        })
    }

    /// Drop every pending operation. Returns how many were dropped.
    pub fn discard(&mut self) -> usize {
        let dropped = self.queue.discard();
        if dropped > 0 {
            debug!("unit of work {} discarded {dropped} operations", self.id);
            self.state = UnitState::Discarded;
        }
        dropped
    }

    /// Read access to the index that flushes pending operations first.
    pub fn catalog(&mut self) -> FlushingCatalog<'_> {
        FlushingCatalog { uow: self }
    }

    /// Finish the unit of work, applying everything still pending.
    ///
    /// The report also covers flushes triggered by reads earlier in the
    /// unit. With
    /// [`fail_commit_on_errors`](GatewayConfig::fail_commit_on_errors) set,
    /// any failure turns into [`IndexQueueError::DispatchFailed`]; the
    /// operations that did apply stay applied.
    pub fn commit(mut self) -> Result<FlushReport> {
        let mut report = self.flush()?;
        self.finished = true;

        let mut total = std::mem::take(&mut self.read_flushes);
        total.merge(report.dispatch);
        report.dispatch = total;

        if report.dispatch.applied > 0 {
            info!(
                "unit of work {} committed: {} index operations applied",
                self.id, report.dispatch.applied
            );
        }

        if self.gateway.config.fail_commit_on_errors && !report.is_success() {
            return Err(IndexQueueError::DispatchFailed {
                failed: report.dispatch.failures.len(),
                attempted: report.dispatch.attempted,
            });
        }
        Ok(report)
    }

    /// Finish the unit of work without applying anything still pending.
    ///
    /// Returns the number of operations dropped.
    pub fn abort(mut self) -> usize {
        self.finished = true;
        let dropped = self.queue.discard();
        debug!("unit of work {} aborted, {dropped} operations dropped", self.id);
        dropped
    }

    fn submit(&mut self, op: OperationRecord) -> Result<RequestOutcome> {
        match self.mode {
            IndexingMode::Queued => {
                self.queue.append(op);
                Ok(RequestOutcome::Queued)
            }
            IndexingMode::Immediate => {
                self.gateway.dispatcher.apply_one(&op)?;
                self.gateway.advance_generation();
                Ok(RequestOutcome::Applied)
            }
        }
    }

    fn dropped(&self, object: &ContentObject) -> RequestOutcome {
        debug!("{} is not indexable, request dropped", object.id);
        RequestOutcome::Dropped
    }

    fn empty_report(&self) -> FlushReport {
        FlushReport {
            dispatch: DispatchReport::default(),
            generation: self.gateway.generation(),
        }
    }

    fn flush_before_read(&mut self) -> Result<()> {
        let report = self.flush()?;
        self.read_flushes.merge(report.dispatch);
        Ok(())
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        if !self.finished && !self.queue.is_empty() {
            warn!(
                "unit of work {} dropped with {} pending operations; discarding",
                self.id,
                self.queue.len()
            );
            self.queue.discard();
        }
    }
}

/// The engine's read surface, flushing the unit of work before every call.
#[derive(Debug)]
pub struct FlushingCatalog<'u> {
    uow: &'u mut UnitOfWork,
}

impl FlushingCatalog<'_> {
    /// Flush, then run the query.
    pub fn search(&mut self, query: &CatalogQuery) -> Result<SearchResults> {
        self.uow.flush_before_read()?;
        self.uow.gateway.engine().search(query)
    }

    /// Flush, then read the engine's change counter.
    pub fn counter(&mut self) -> Result<u64> {
        self.uow.flush_before_read()?;
        Ok(self.uow.gateway.engine().counter())
    }
}
