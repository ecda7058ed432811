//! Replay scripts: JSON descriptions of content changes, index requests and
//! queries, run in order against a fresh gateway.
//!
//! ```json
//! {
//!   "steps": [
//!     {"action": "put", "object": {"id": "/site/a", "attributes": {"title": "Hello"}}},
//!     {"action": "index", "target": "/site/a"},
//!     {"action": "search", "query": {"clauses": [{"attribute": "title", "text": "hello"}]}},
//!     {"action": "commit"}
//!   ]
//! }
//! ```
//!
//! After `commit` or `abort` a new unit of work is opened for the remaining
//! steps; whatever is pending at the end of the script is committed.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::content::ContentObject;
use crate::engine::CatalogQuery;
use crate::error::{IndexQueueError, Result};
use crate::gateway::config::IndexingMode;
use crate::operation::TargetId;

/// A replay script.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Script {
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let script: Script = serde_json::from_str(content)?;
        if script.steps.is_empty() {
            return Err(IndexQueueError::invalid_argument("script has no steps"));
        }
        Ok(script)
    }
}

/// One script step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Create or replace a content object (no index request).
    Put { object: ContentObject },
    /// Remove a content object from the content store (no index request).
    Delete { target: TargetId },
    /// Move an object to a position among its siblings.
    Move { target: TargetId, position: usize },
    /// Request indexing.
    Index { target: TargetId },
    /// Request removal from the index.
    Unindex { target: TargetId },
    /// Request a reindex; no attributes means a full reindex.
    Reindex {
        target: TargetId,
        #[serde(default)]
        attributes: Vec<String>,
    },
    /// Reindex the position of every child of a container.
    Reorder { parent: TargetId },
    /// Query the index (flushes first).
    Search {
        #[serde(default)]
        query: CatalogQuery,
    },
    /// Read the engine's change counter (flushes first).
    Counter,
    /// Switch the indexing mode of the current unit of work.
    Mode { mode: IndexingMode },
    Flush,
    Commit,
    Abort,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Put { .. } => "put",
            Step::Delete { .. } => "delete",
            Step::Move { .. } => "move",
            Step::Index { .. } => "index",
            Step::Unindex { .. } => "unindex",
            Step::Reindex { .. } => "reindex",
            Step::Reorder { .. } => "reorder",
            Step::Search { .. } => "search",
            Step::Counter => "counter",
            Step::Mode { .. } => "mode",
            Step::Flush => "flush",
            Step::Commit => "commit",
            Step::Abort => "abort",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let script = Script::from_json_str(
            r#"{"steps": [
                {"action": "put", "object": {"id": "/a", "attributes": {"title": "A"}}},
                {"action": "reindex", "target": "/a"},
                {"action": "reindex", "target": "/a", "attributes": ["title"]},
                {"action": "search"},
                {"action": "mode", "mode": "immediate"},
                {"action": "commit"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(script.steps.len(), 6);
        match &script.steps[0] {
            Step::Put { object } => {
                assert_eq!(object.attribute("title"), Some("A"));
                assert!(!object.transient);
            }
            other => panic!("unexpected step {other:?}"),
        }
        match &script.steps[1] {
            Step::Reindex { attributes, .. } => assert!(attributes.is_empty()),
            other => panic!("unexpected step {other:?}"),
        }
        assert!(matches!(
            script.steps[4],
            Step::Mode {
                mode: IndexingMode::Immediate
            }
        ));
    }

    #[test]
    fn test_empty_script_is_rejected() {
        let err = Script::from_json_str(r#"{"steps": []}"#).unwrap_err();
        assert!(matches!(err, IndexQueueError::InvalidArgument(_)));
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let err = Script::from_json_str(r#"{"steps": [{"action": "explode"}]}"#).unwrap_err();
        assert!(matches!(err, IndexQueueError::Json(_)));
    }
}
