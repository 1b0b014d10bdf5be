//! Object store implementations for runbucket.
//!
//! - [`LocalBucketStore`]: a directory treated as a bucket (including mirrors
//!   written by the batch retriever)
//! - [`MemoryStore`]: in-process objects with failure injection
//! - [`StoreFactory`]: builds a shared handle from [`StoreConfig`]

pub mod factory;
pub mod local;
pub mod matcher;
pub mod memory;

pub use factory::{StoreConfig, StoreFactory, StoreKind};
pub use local::LocalBucketStore;
pub use matcher::GlobMatcher;
pub use memory::MemoryStore;
