//! Resource database configuration.
//!
//! Loaded from TOML. Every table and key is optional:
//!
//! ```toml
//! [nodes]
//! initial_capacity = 1024
//!
//! [materials]
//! recycle = "linear_scan"
//! ```

use arbor_core::config::StoreConfig;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid resource config: {detail}")]
    Parse { detail: String },
}

/// Per-registry store settings for a
/// [`ResourceDatabase`](crate::database::ResourceDatabase).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResourceConfig {
    pub nodes: StoreConfig,
    pub materials: StoreConfig,
    pub meshes: StoreConfig,
}

impl ResourceConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            detail: e.to_string(),
        })
    }
}
