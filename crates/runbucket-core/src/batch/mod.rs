//! Batch retrieval of objects into a local mirror tree.

pub mod retriever;
pub mod types;

pub use retriever::{BatchRetriever, DEFAULT_WORKERS};
pub use types::{DownloadOutcome, DownloadReport, TransferState};
