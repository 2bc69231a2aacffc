//! Trellis configuration file handling
//!
//! Settings live in `trellis.toml`:
//!
//! ```toml
//! [runtime]
//! max_settle_passes = 3
//! recycle_widgets = true
//!
//! [log]
//! filter = "info"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use trellis_runtime::RuntimeConfig;

pub const CONFIG_FILE: &str = "trellis.toml";

/// Contents of `trellis.toml`
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TrellisConfig {
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl TrellisConfig {
    /// Load `trellis.toml` from a directory; a missing file means defaults.
    pub fn load_from_dir(path: &Path) -> Result<Self> {
        let config_path = path.join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }
        Self::load(&config_path)
    }

    /// Load an explicit config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: TrellisConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(config)
    }
}
