//! Content objects as the indexing layer sees them.
//!
//! The indexing layer only needs three things from the content tree: a
//! stable identity for every object, a way to resolve that identity back to
//! the object's current attribute values when a flush runs, and a way to
//! list the children of a container. Those are captured by the
//! [`ContentStore`] trait. [`MemoryContentStore`](memory::MemoryContentStore)
//! is the in-process implementation used by the CLI and the tests.

pub mod filter;
pub mod memory;

use std::collections::BTreeMap;
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::operation::TargetId;

/// A snapshot of a content object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentObject {
    /// Identity (path) of the object.
    pub id: TargetId,

    /// Indexable attribute values by name.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,

    /// Last modification time.
    #[serde(default = "chrono::Utc::now")]
    pub modified: DateTime<Utc>,

    /// Still under construction and not yet part of the persisted tree.
    #[serde(default)]
    pub transient: bool,
}

impl ContentObject {
    /// Create a persisted object with no attributes.
    pub fn new<T: Into<TargetId>>(id: T) -> Self {
        ContentObject {
            id: id.into(),
            attributes: BTreeMap::new(),
            modified: Utc::now(),
            transient: false,
        }
    }

    /// Set an attribute value (builder style).
    pub fn with_attribute<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Mark the object as transient (builder style).
    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        self.attributes.insert(name.into(), value.into());
    }
}

/// Resolves target identities back to live content.
pub trait ContentStore: Send + Sync + Debug {
    /// Current state of the object, or a resolution error if it no longer exists.
    fn resolve(&self, target: &TargetId) -> Result<ContentObject>;

    /// Direct children of a container, in container order.
    fn children(&self, parent: &TargetId) -> Result<Vec<ContentObject>>;

    /// Record that the object was modified now.
    ///
    /// Called when a full reindex is requested so that modification dates
    /// change within the unit of work rather than at commit.
    fn notify_modified(&self, _target: &TargetId) -> Result<()> {
        Ok(())
    }
}
