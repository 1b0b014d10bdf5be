//! Artifact retrieval for training runs stored in an object bucket.
//!
//! A bucket holds one directory per run, one subdirectory per run instance,
//! and inside each instance a `config.json` plus per-epoch model snapshots:
//!
//! ```text
//! <run_name>/<wandb_id>/config.json
//! <run_name>/<wandb_id>/states/test/production/epoch_0000.pkl
//! ```
//!
//! This crate enumerates those artifacts by pattern, orders them
//! deterministically, decodes them into typed records, and mirrors them into a
//! local directory tree through a bounded pool of download workers.

pub mod artifacts;
pub mod batch;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod error;
pub mod listing;
pub mod mirror;
pub mod ordering;
pub mod path;
pub mod progress;

#[cfg(test)]
mod fixtures;

pub use artifacts::{
    EpochSnapshot, RunConfiguration, Tensor, CONFIG_FILE_NAME, DEFAULT_SNAPSHOT_EXTENSION, SNAPSHOT_DIR,
};
pub use batch::{BatchRetriever, DownloadOutcome, DownloadReport, TransferState, DEFAULT_WORKERS};
pub use codec::{decode_config, decode_snapshot, encode_config, encode_snapshot};
pub use config::{ConfigFile, RetrievalConfig, StoreSection};
pub use error::{RetrievalError, RetrievalResult};
pub use mirror::{read_config_file, read_snapshot_file, write_config_file, write_snapshot_file};
pub use ordering::{epoch_index, sort_configs_by_lesion_onset, sort_epochs};
pub use path::{mirror_path, path_relative_to_bucket};
pub use progress::{ProgressSink, TracingProgressSink, TransferEvent};

pub use runbucket_abstraction::{ListQuery, ObjectRef, ObjectStore, StoreError};
