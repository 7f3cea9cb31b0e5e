//! Backend selection.
//!
//! The deployment mode is chosen once, when the store is built; everything
//! downstream only sees `dyn KeyValueBackend`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::backend::{KeyValueBackend, MemoryBackend, ShardedBackend};
use crate::config::BackendConfig;
use crate::error::Result;

/// Backend deployment mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendMode {
    /// One node owns every key.
    #[default]
    #[serde(alias = "standalone", alias = "node")]
    Single,
    /// Keys are routed to shards by hash slot.
    #[serde(alias = "sharded")]
    Cluster,
}

impl BackendMode {
    /// Get the mode name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Cluster => "cluster",
        }
    }

    /// Parse a mode name from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "single" | "standalone" | "node" => Some(Self::Single),
            "cluster" | "sharded" => Some(Self::Cluster),
            _ => None,
        }
    }
}

impl std::fmt::Display for BackendMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Build the backend described by `config`.
pub fn create_backend(config: &BackendConfig) -> Result<Arc<dyn KeyValueBackend>> {
    let mode = config.mode;
    let backend: Arc<dyn KeyValueBackend> = match mode {
        BackendMode::Single => Arc::new(MemoryBackend::new()),
        BackendMode::Cluster => Arc::new(ShardedBackend::in_memory(config.shards as usize)?),
    };

    tracing::debug!(mode = %mode, backend = backend.name(), "created session backend");
    Ok(backend)
}
