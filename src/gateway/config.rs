//! Configuration for the indexing gateway.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IndexQueueError, Result};

/// How mutation requests reach the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexingMode {
    /// Requests are queued, coalesced and applied on flush.
    #[default]
    Queued,
    /// Requests bypass the queue and are applied immediately, one by one.
    /// Meant for bulk maintenance runs such as a full catalog rebuild.
    Immediate,
}

/// Gateway configuration.
///
/// Every unit of work starts from these settings; the indexing mode can be
/// overridden per unit of work.
///
/// # Example
///
/// ```
/// use index_queue::gateway::config::{GatewayConfig, IndexingMode};
///
/// let config = GatewayConfig::builder()
///     .mode(IndexingMode::Immediate)
///     .fail_commit_on_errors(true)
///     .build()
///     .unwrap();
/// assert_eq!(config.mode, IndexingMode::Immediate);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Default indexing mode for new units of work.
    pub mode: IndexingMode,

    /// Turn per-target dispatch failures at commit into a commit error.
    pub fail_commit_on_errors: bool,

    /// Mark objects modified when a full reindex is requested.
    pub touch_on_full_reindex: bool,

    /// Attribute refreshed on the children of a reordered container.
    pub reorder_attribute: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            mode: IndexingMode::Queued,
            fail_commit_on_errors: false,
            touch_on_full_reindex: true,
            reorder_attribute: "position_in_parent".to_string(),
        }
    }
}

impl GatewayConfig {
    /// Create a new builder for GatewayConfig.
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::new()
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: GatewayConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.reorder_attribute.trim().is_empty() {
            return Err(IndexQueueError::config("reorder_attribute must not be empty"));
        }
        Ok(())
    }
}

/// Builder for GatewayConfig.
#[derive(Debug, Default)]
pub struct GatewayConfigBuilder {
    mode: Option<IndexingMode>,
    fail_commit_on_errors: Option<bool>,
    touch_on_full_reindex: Option<bool>,
    reorder_attribute: Option<String>,
}

impl GatewayConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default indexing mode. Default: `Queued`
    pub fn mode(mut self, mode: IndexingMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Fail commits whose flush reported failures. Default: false
    pub fn fail_commit_on_errors(mut self, fail: bool) -> Self {
        self.fail_commit_on_errors = Some(fail);
        self
    }

    /// Touch modification dates on full reindex requests. Default: true
    pub fn touch_on_full_reindex(mut self, touch: bool) -> Self {
        self.touch_on_full_reindex = Some(touch);
        self
    }

    /// Attribute reindexed when a container is reordered.
    /// Default: `position_in_parent`
    pub fn reorder_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.reorder_attribute = Some(attribute.into());
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<GatewayConfig> {
        let mut config = GatewayConfig::default();

        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(fail) = self.fail_commit_on_errors {
            config.fail_commit_on_errors = fail;
        }
        if let Some(touch) = self.touch_on_full_reindex {
            config.touch_on_full_reindex = touch;
        }
        if let Some(attribute) = self.reorder_attribute {
            config.reorder_attribute = attribute;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.mode, IndexingMode::Queued);
        assert!(!config.fail_commit_on_errors);
        assert!(config.touch_on_full_reindex);
        assert_eq!(config.reorder_attribute, "position_in_parent");
    }

    #[test]
    fn test_builder_rejects_empty_reorder_attribute() {
        let err = GatewayConfig::builder()
            .reorder_attribute("  ")
            .build()
            .unwrap_err();
        assert!(matches!(err, IndexQueueError::Config(_)));
    }

    #[test]
    fn test_from_json_file_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"mode": "immediate"}}"#).unwrap();

        let config = GatewayConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.mode, IndexingMode::Immediate);
        assert!(config.touch_on_full_reindex);
    }

    #[test]
    fn test_from_json_file_rejects_unknown_mode() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"mode": "eventually"}}"#).unwrap();

        let err = GatewayConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, IndexQueueError::Json(_)));
    }
}
