//! The index engine boundary.
//!
//! [`IndexEngine`] is the only interface through which index state changes.
//! The queue never touches index state itself; the
//! [`Dispatcher`](crate::dispatch::Dispatcher) calls these methods when a
//! flush runs, and the [`FlushingCatalog`](crate::gateway::FlushingCatalog)
//! wraps the read side so that every query sees pending writes.
//!
//! Two implementations ship with the crate:
//!
//! - [`MemoryCatalog`](memory::MemoryCatalog): an in-memory catalog with term
//!   search over tokenised attribute values
//! - [`RecordingEngine`](recording::RecordingEngine): a test double that
//!   records every call and can be told to fail for given targets

pub mod memory;
pub mod recording;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::content::ContentObject;
use crate::error::Result;
use crate::operation::TargetId;

/// Operations an index engine must support.
///
/// Implementations provide their own concurrency control; the engine is
/// shared by every unit of work of a gateway.
pub trait IndexEngine: Send + Sync + Debug {
    /// Add an object with all of its attributes.
    fn index(&self, object: &ContentObject) -> Result<()>;

    /// Remove an object.
    fn unindex(&self, target: &TargetId) -> Result<()>;

    /// Refresh an indexed object. `None` means no attribute filter, i.e. a
    /// full reindex.
    fn reindex(&self, object: &ContentObject, attributes: Option<&BTreeSet<String>>) -> Result<()>;

    /// Run a query against the current index state.
    fn search(&self, query: &CatalogQuery) -> Result<SearchResults>;

    /// A counter that changes whenever the index changes.
    fn counter(&self) -> u64;
}

/// A single term clause of a [`CatalogQuery`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermClause {
    /// Attribute to match; `None` matches any attribute.
    #[serde(default)]
    pub attribute: Option<String>,

    /// Words that must all occur in the attribute value (case-insensitive).
    pub text: String,
}

/// Conjunctive term query over indexed attributes.
///
/// An empty query matches every indexed object.
///
/// # Example
///
/// ```
/// use index_queue::engine::CatalogQuery;
///
/// let query = CatalogQuery::new()
///     .term("title", "release notes")
///     .any("rust")
///     .limit(10);
/// assert_eq!(query.clauses.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub clauses: Vec<TermClause>,

    #[serde(default)]
    pub limit: Option<usize>,
}

impl CatalogQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `text` in the named attribute.
    pub fn term<A: Into<String>, T: Into<String>>(mut self, attribute: A, text: T) -> Self {
        self.clauses.push(TermClause {
            attribute: Some(attribute.into()),
            text: text.into(),
        });
        self
    }

    /// Require `text` in any attribute.
    pub fn any<T: Into<String>>(mut self, text: T) -> Self {
        self.clauses.push(TermClause {
            attribute: None,
            text: text.into(),
        });
        self
    }

    /// Cap the number of returned hits.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A matching index entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub target: TargetId,
    pub attributes: BTreeMap<String, String>,
}

/// Query results, ordered by target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    pub hits: Vec<SearchHit>,

    /// Number of matches before the limit was applied.
    pub total_hits: usize,
}

impl SearchResults {
    pub fn contains(&self, target: &TargetId) -> bool {
        self.hits.iter().any(|hit| &hit.target == target)
    }

    pub fn targets(&self) -> Vec<&TargetId> {
        self.hits.iter().map(|hit| &hit.target).collect()
    }
}
