//! Store configuration.
//!
//! [`GraphConfig`] is a plain value passed to
//! [`ReceiptStore::with_config`](crate::store::ReceiptStore::with_config). It
//! can be built in code or loaded from JSON; missing fields take their
//! defaults.
//!
//! ```
//! use provenant_graph::config::GraphConfig;
//! use provenant_graph::tier::TierLimit;
//!
//! let config = GraphConfig::from_json(r#"{ "key_id": "ops-2024", "default_tier": { "max_depth": 2 } }"#)
//!     .unwrap();
//! assert_eq!(config.key_id, "ops-2024");
//! assert_eq!(config.default_tier, TierLimit::MaxDepth(2));
//! assert_eq!(config.max_paths, GraphConfig::default().max_paths);
//! ```

use serde::{Deserialize, Serialize};

use crate::paths::PathLimits;
use crate::tier::TierLimit;
use crate::GraphError;

/// Default cap on enumerated proof paths per query.
pub const DEFAULT_MAX_PATHS: usize = 10_000;

/// Configuration for a [`ReceiptStore`](crate::store::ReceiptStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Key id handed to the [`HashChainGenerator`](crate::hash::HashChainGenerator).
    pub key_id: String,
    /// Stop path enumeration after this many paths. `None` disables the cap.
    pub max_paths: Option<usize>,
    /// Ignore paths longer than this many edges. `None` disables the cap.
    pub max_path_hops: Option<usize>,
    /// Tier applied by [`ReceiptStore::visible_at_default_tier`](crate::store::ReceiptStore::visible_at_default_tier).
    pub default_tier: TierLimit,
}

impl Default for GraphConfig {
    /// Demo key id, 10k path cap, no hop cap, unbounded tier.
    fn default() -> Self {
        Self {
            key_id: "provenant-demo".to_owned(),
            max_paths: Some(DEFAULT_MAX_PATHS),
            max_path_hops: None,
            default_tier: TierLimit::Unbounded,
        }
    }
}

impl GraphConfig {
    /// Parse a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Config`] if the text is not valid JSON for this
    /// struct, or if it names an empty key id or a zero path cap.
    pub fn from_json(text: &str) -> Result<Self, GraphError> {
        let config: GraphConfig = serde_json::from_str(text).map_err(|e| GraphError::Config {
            details: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Config`] describing the first violation.
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.key_id.is_empty() {
            return Err(GraphError::Config {
                details: "key_id must not be empty".to_owned(),
            });
        }
        if self.max_paths == Some(0) {
            return Err(GraphError::Config {
                details: "max_paths must be at least 1 (use null to disable the cap)".to_owned(),
            });
        }
        Ok(())
    }

    /// The path-search limits implied by this configuration.
    pub fn path_limits(&self) -> PathLimits {
        PathLimits {
            max_paths: self.max_paths,
            max_hops: self.max_path_hops,
        }
    }
}
