//! # index-queue
//!
//! Deferred, coalescing search index updates with flush-before-read.
//!
//! Content code reports mutations (index, unindex, reindex) through a
//! [`UnitOfWork`](gateway::UnitOfWork) instead of calling the search engine
//! directly. Requests for the same object are merged into the smallest
//! equivalent operation and applied in one batch at commit, or earlier when
//! the unit of work reads from the index.
//!
//! ## Features
//!
//! - Per-object coalescing of pending operations
//! - Flush before every catalog read, so a unit of work sees its own writes
//! - Queued and immediate indexing modes
//! - Per-target failure reporting without aborting the batch
//! - Index generation counter for cheap change detection

pub mod cli;
pub mod content;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod operation;
pub mod queue;

pub mod prelude {
    pub use crate::content::{ContentObject, ContentStore};
    pub use crate::engine::{CatalogQuery, IndexEngine, SearchResults};
    pub use crate::error::{IndexQueueError, Result};
    pub use crate::gateway::config::{GatewayConfig, IndexingMode};
    pub use crate::gateway::{IndexingGateway, UnitOfWork};
    pub use crate::operation::{Attributes, OperationKind, OperationRecord, TargetId};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
