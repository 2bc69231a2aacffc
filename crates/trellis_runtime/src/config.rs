//! Runtime configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;
use trellis_core::DEFAULT_MAX_PASSES;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings for a [`Runtime`](crate::Runtime)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Settle passes before giving up on a feedback loop
    pub max_settle_passes: usize,
    /// Keep released widgets in the pool for reuse
    pub recycle_widgets: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_settle_passes: DEFAULT_MAX_PASSES,
            recycle_widgets: true,
        }
    }
}

impl RuntimeConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }
}
