//! Pending index operations.
//!
//! An [`OperationRecord`] is one requested change to the index for one
//! content object. Records are keyed by [`TargetId`], the stable identity of
//! the object, and carry an [`OperationKind`]. Only `Reindex` has an
//! attribute selection.
//!
//! # Example
//!
//! ```
//! use index_queue::operation::{Attributes, OperationKind, OperationRecord};
//!
//! let op = OperationRecord::reindex("/site/news", Attributes::only(["title"]));
//! assert_eq!(op.kind, OperationKind::Reindex(Attributes::only(["title"])));
//!
//! let parsed: OperationKind = "reindex:title,body".parse().unwrap();
//! assert_eq!(parsed.to_string(), "reindex(body, title)");
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{IndexQueueError, Result};

/// Stable identity of a content object (its path in the content tree).
///
/// Identity, not value: two snapshots of the same object share a `TargetId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    pub fn new<S: Into<String>>(path: S) -> Self {
        TargetId(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment, i.e. the object's id within its container.
    pub fn local_id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }

    /// Identity of the containing object, `None` at the root.
    pub fn parent(&self) -> Option<TargetId> {
        let (parent, _) = self.0.trim_end_matches('/').rsplit_once('/')?;
        if parent.is_empty() {
            None
        } else {
            Some(TargetId::new(parent))
        }
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetId {
    fn from(path: &str) -> Self {
        TargetId::new(path)
    }
}

impl From<String> for TargetId {
    fn from(path: String) -> Self {
        TargetId(path)
    }
}

/// Attribute selection for a reindex.
///
/// An empty `Only` set means a full reindex, however it was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "AttributesRepr")]
pub enum Attributes {
    /// Full reindex: every attribute, no filter at the engine.
    All,
    /// Update only the named attributes.
    Only(BTreeSet<String>),
}

impl Attributes {
    /// Build a finite selection. An empty selection means a full reindex.
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            Attributes::All
        } else {
            Attributes::Only(names)
        }
    }

    /// True for `All` and for an empty `Only` set.
    pub fn is_all(&self) -> bool {
        match self {
            Attributes::All => true,
            Attributes::Only(names) => names.is_empty(),
        }
    }

    /// Collapse an empty `Only` set into `All`.
    pub fn normalized(self) -> Attributes {
        if self.is_all() { Attributes::All } else { self }
    }

    /// Union of two selections; `All` absorbs any finite set.
    pub fn union(self, other: Attributes) -> Attributes {
        match (self.normalized(), other.normalized()) {
            (Attributes::Only(mut a), Attributes::Only(b)) => {
                a.extend(b);
                Attributes::Only(a)
            }
            _ => Attributes::All,
        }
    }

    /// The engine-level filter: `None` means "no attribute filter".
    pub fn as_filter(&self) -> Option<&BTreeSet<String>> {
        match self {
            Attributes::Only(names) if !names.is_empty() => Some(names),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum AttributesRepr {
    All,
    Only(BTreeSet<String>),
}

impl From<AttributesRepr> for Attributes {
    fn from(repr: AttributesRepr) -> Self {
        match repr {
            AttributesRepr::All => Attributes::All,
            AttributesRepr::Only(names) => Attributes::only(names),
        }
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attributes::All => f.write_str("all"),
            Attributes::Only(names) => {
                let joined: Vec<&str> = names.iter().map(String::as_str).collect();
                f.write_str(&joined.join(", "))
            }
        }
    }
}

/// What a pending operation does to the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "attributes", rename_all = "snake_case")]
pub enum OperationKind {
    Index,
    Unindex,
    Reindex(Attributes),
}

impl OperationKind {
    /// Short name used in logs and CLI output.
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::Index => "index",
            OperationKind::Unindex => "unindex",
            OperationKind::Reindex(_) => "reindex",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Reindex(attributes) => write!(f, "reindex({attributes})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Parses `index`, `unindex`, `reindex` and `reindex:attr1,attr2`.
impl FromStr for OperationKind {
    type Err = IndexQueueError;

    fn from_str(s: &str) -> Result<Self> {
        let (name, attributes) = match s.split_once(':') {
            Some((name, attributes)) => (name, Some(attributes)),
            None => (s, None),
        };

        match (name.trim().to_ascii_lowercase().as_str(), attributes) {
            ("index", None) => Ok(OperationKind::Index),
            ("unindex", None) => Ok(OperationKind::Unindex),
            ("reindex", None) => Ok(OperationKind::Reindex(Attributes::All)),
            ("reindex", Some(list)) => {
                let names = list
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty() && *name != "*");
                Ok(OperationKind::Reindex(Attributes::only(names)))
            }
            (_, Some(_)) => Err(IndexQueueError::invalid_argument(format!(
                "only reindex takes attributes: '{s}'"
            ))),
            _ => Err(IndexQueueError::invalid_argument(format!(
                "unknown operation '{s}'"
            ))),
        }
    }
}

/// One requested change to the index for one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub target: TargetId,
    #[serde(flatten)]
    pub kind: OperationKind,
}

impl OperationRecord {
    pub fn new<T: Into<TargetId>>(target: T, kind: OperationKind) -> Self {
        OperationRecord {
            target: target.into(),
            kind,
        }
    }

    pub fn index<T: Into<TargetId>>(target: T) -> Self {
        Self::new(target, OperationKind::Index)
    }

    pub fn unindex<T: Into<TargetId>>(target: T) -> Self {
        Self::new(target, OperationKind::Unindex)
    }

    pub fn reindex<T: Into<TargetId>>(target: T, attributes: Attributes) -> Self {
        Self::new(target, OperationKind::Reindex(attributes))
    }
}

impl fmt::Display for OperationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.target)
    }
}
