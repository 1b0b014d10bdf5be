//! Object-store abstraction layer for runbucket.
//!
//! This crate defines the collaborator seam between the artifact retrieval core
//! and whatever actually holds the bytes (a cloud bucket, a local mirror, an
//! in-memory fixture). The core only ever talks to [`ObjectStore`].

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Errors surfaced by an object store.
///
/// The retrieval core treats these as opaque and passes them through.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The object does not exist in the bucket.
    #[error("Object not found: {0}")]
    NotFound(String),

    /// The caller is not allowed to read the object.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The listing glob could not be compiled.
    #[error("Invalid match pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Why it was rejected.
        message: String,
    },

    /// Backend-specific failure (network, quota, ...).
    #[error("Backend error: {0}")]
    Backend(String),

    /// Local I/O failure while reading or writing object bytes.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Lazy, single-pass listing of object handles.
pub type ObjectStream<'a> = BoxStream<'a, StoreResult<ObjectRef>>;

/// Handle to a named object inside a bucket.
///
/// Handles are cheap to list and carry no payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Name of the bucket holding the object.
    pub bucket_name: String,
    /// Bucket-relative object name, `/`-separated.
    pub name: String,
    /// Size in bytes, when the store reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl ObjectRef {
    /// Creates a handle without size metadata.
    #[must_use]
    pub fn new(bucket_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self { bucket_name: bucket_name.into(), name: name.into(), size: None }
    }

    /// Attaches the object size.
    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Last `/`-separated segment of the object name.
    pub fn base_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Everything before the last `/`, or `""` for top-level objects.
    pub fn prefix(&self) -> &str {
        self.name.rsplit_once('/').map_or("", |(prefix, _)| prefix)
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket_name, self.name)
    }
}

/// Parameters for a listing call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Server-side glob; `None` lists everything.
    pub match_glob: Option<String>,
    /// Upper bound on returned handles; `None` is unbounded.
    pub max_results: Option<usize>,
}

impl ListQuery {
    /// Lists everything in the bucket.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Lists objects matching `pattern`.
    #[must_use]
    pub fn glob(pattern: impl Into<String>) -> Self {
        Self { match_glob: Some(pattern.into()), max_results: None }
    }

    /// Caps the number of returned handles.
    #[must_use]
    pub fn with_max_results(mut self, max_results: Option<usize>) -> Self {
        self.max_results = max_results;
        self
    }
}

/// A bucket of named objects.
///
/// All stores must be `Send + Sync` so a single handle can be shared by the
/// download workers.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Name of the bucket this handle reads from.
    fn bucket_name(&self) -> &str;

    /// Enumerates object handles matching `query`.
    ///
    /// No ordering is guaranteed and no payload is fetched.
    ///
    /// # Errors
    /// Returns a `StoreError` if the listing call fails.
    async fn list_objects(&self, query: &ListQuery) -> StoreResult<Vec<ObjectRef>>;

    /// Lazy variant of [`ObjectStore::list_objects`].
    ///
    /// The stream is single-pass and cannot be restarted. The default
    /// implementation performs the eager listing on first poll.
    fn stream_objects(&self, query: ListQuery) -> ObjectStream<'_> {
        stream::once(async move { self.list_objects(&query).await })
            .flat_map(|listing| match listing {
                Ok(objects) => stream::iter(objects.into_iter().map(Ok)).left_stream(),
                Err(err) => stream::iter(vec![Err(err)]).right_stream(),
            })
            .boxed()
    }

    /// Reads the full payload of an object into memory.
    ///
    /// # Errors
    /// Returns a `StoreError` if the object is missing or unreadable.
    async fn read_object(&self, object: &ObjectRef) -> StoreResult<Vec<u8>>;

    /// Writes the payload of an object to `path`.
    ///
    /// The parent directory must already exist.
    ///
    /// # Errors
    /// Returns a `StoreError` if the object is missing, unreadable, or the
    /// file cannot be written.
    async fn download_to_file(&self, object: &ObjectRef, path: &Path) -> StoreResult<()>;
}
