//! Store factory for creating store handles from configuration.

use crate::{LocalBucketStore, MemoryStore};
use runbucket_abstraction::{ObjectStore, StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Store backend enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// Directory on the local filesystem.
    #[default]
    Local,
    /// Empty in-process store.
    Memory,
}

impl FromStr for StoreKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "fs" | "mirror" => Ok(Self::Local),
            "memory" | "mem" => Ok(Self::Memory),
            other => Err(StoreError::Backend(format!("unknown store kind: {other}"))),
        }
    }
}

/// Store section of the retrieval configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Which backend to open.
    #[serde(default)]
    pub kind: StoreKind,
    /// Bucket root directory (local stores only).
    #[serde(default)]
    pub root: Option<PathBuf>,
}

/// Factory for creating store handles.
pub struct StoreFactory;

impl StoreFactory {
    /// Opens a store serving `bucket_name`.
    ///
    /// # Errors
    /// Returns a `StoreError` if the configuration is incomplete.
    pub fn create(config: &StoreConfig, bucket_name: &str) -> StoreResult<Arc<dyn ObjectStore>> {
        debug!(kind = ?config.kind, bucket = %bucket_name, "Creating object store");
        match config.kind {
            StoreKind::Local => {
                let root = config.root.clone().ok_or_else(|| {
                    StoreError::Backend("local store requires a root directory".to_string())
                })?;
                Ok(Arc::new(LocalBucketStore::new(root, bucket_name)))
            }
            StoreKind::Memory => Ok(Arc::new(MemoryStore::new(bucket_name))),
        }
    }
}
