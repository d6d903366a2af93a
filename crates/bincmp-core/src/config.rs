use serde::{Deserialize, Serialize};

use crate::error::{BincmpError, BincmpResult};

/// Default I/O granularity for lock-step reads
pub const DEFAULT_CHUNK_SIZE: usize = 512;

/// Top-level configuration (loaded from bincmp.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BincmpConfig {
    pub compare: CompareConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// Bytes read from each file per step (default: 512)
    pub chunk_size: usize,
    /// Run the two reference comparisons of a three-way check concurrently
    pub parallel: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: warn)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            parallel: true,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "text".into(),
        }
    }
}

impl BincmpConfig {
    pub fn validate(&self) -> BincmpResult<()> {
        if self.compare.chunk_size == 0 {
            return Err(BincmpError::Config(
                "compare.chunk_size must be greater than zero".into(),
            ));
        }
        match self.log.format.as_str() {
            "json" | "text" => Ok(()),
            other => Err(BincmpError::Config(format!(
                "log.format must be \"json\" or \"text\", got {other:?}"
            ))),
        }
    }
}
