//! In-process bucket for tests and dry runs.

use crate::matcher::GlobMatcher;
use async_trait::async_trait;
use runbucket_abstraction::{ListQuery, ObjectRef, ObjectStore, StoreError, StoreResult};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{PoisonError, RwLock};

/// Objects held in a sorted map, with optional per-object read denial.
#[derive(Debug, Default)]
pub struct MemoryStore {
    bucket_name: String,
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
    denied: RwLock<BTreeSet<String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(bucket_name: impl Into<String>) -> Self {
        Self { bucket_name: bucket_name.into(), ..Self::default() }
    }

    /// Builder form of [`MemoryStore::insert`].
    #[must_use]
    pub fn with_object(self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }

    /// Stores `bytes` under `name`, replacing any previous payload.
    pub fn insert(&self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> ObjectRef {
        let name = name.into();
        let bytes = bytes.into();
        let object = ObjectRef::new(self.bucket_name.clone(), name.clone()).with_size(bytes.len() as u64);
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, bytes);
        object
    }

    /// Makes every later read or download of `name` fail with `PermissionDenied`.
    ///
    /// The object still shows up in listings.
    pub fn deny(&self, name: impl Into<String>) {
        self.denied
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into());
    }

    pub fn remove(&self, name: &str) -> Option<Vec<u8>> {
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    pub fn len(&self) -> usize {
        self.objects.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn payload(&self, object: &ObjectRef) -> StoreResult<Vec<u8>> {
        if object.bucket_name != self.bucket_name {
            return Err(StoreError::NotFound(object.to_string()));
        }
        if self
            .denied
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&object.name)
        {
            return Err(StoreError::PermissionDenied(object.name.clone()));
        }
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&object.name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(object.name.clone()))
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    async fn list_objects(&self, query: &ListQuery) -> StoreResult<Vec<ObjectRef>> {
        let matcher = GlobMatcher::compile(query.match_glob.as_deref())?;
        let objects = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        Ok(objects
            .iter()
            .filter(|(name, _)| matcher.matches(name))
            .take(query.max_results.unwrap_or(usize::MAX))
            .map(|(name, bytes)| {
                ObjectRef::new(self.bucket_name.clone(), name.clone()).with_size(bytes.len() as u64)
            })
            .collect())
    }

    async fn read_object(&self, object: &ObjectRef) -> StoreResult<Vec<u8>> {
        self.payload(object)
    }

    async fn download_to_file(&self, object: &ObjectRef, path: &Path) -> StoreResult<()> {
        let bytes = self.payload(object)?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }
}
