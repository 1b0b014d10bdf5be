//! Filesystem-backed bucket.
//!
//! A directory is treated as the bucket root and every regular file below it
//! is an object whose name is its `/`-joined relative path. Pointing this at
//! `<dest>/<bucket>` re-opens a mirror written by the batch retriever.

use crate::matcher::GlobMatcher;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use runbucket_abstraction::{ListQuery, ObjectRef, ObjectStore, ObjectStream, StoreError, StoreResult};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct LocalBucketStore {
    root: PathBuf,
    bucket_name: String,
}

impl LocalBucketStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, bucket_name: impl Into<String>) -> Self {
        Self { root: root.into(), bucket_name: bucket_name.into() }
    }

    /// Opens the `<destination>/<bucket_name>` mirror tree.
    #[must_use]
    pub fn open_mirror(destination: &Path, bucket_name: &str) -> Self {
        Self::new(destination.join(bucket_name), bucket_name)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, object: &ObjectRef) -> StoreResult<PathBuf> {
        if object.bucket_name != self.bucket_name {
            return Err(StoreError::NotFound(format!(
                "{} (store serves bucket {})",
                object, self.bucket_name
            )));
        }
        let relative = Path::new(&object.name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if object.name.is_empty() || escapes {
            return Err(StoreError::NotFound(object.name.clone()));
        }
        Ok(self.root.join(relative))
    }

    fn walk(&self, query: &ListQuery) -> StoreResult<impl Iterator<Item = StoreResult<ObjectRef>> + Send + 'static> {
        let matcher = GlobMatcher::compile(query.match_glob.as_deref())?;
        let root = self.root.clone();
        let bucket = self.bucket_name.clone();
        let limit = query.max_results.unwrap_or(usize::MAX);

        // A mirror that was never written lists as empty.
        let walker = root
            .exists()
            .then(|| WalkDir::new(&root).sort_by_file_name().into_iter())
            .into_iter()
            .flatten();

        let objects = walker
            .filter_map(move |entry| {
                let entry = match entry {
                    Ok(e) => e,
                    Err(e) => return Some(Err(StoreError::from(std::io::Error::from(e)))),
                };
                if !entry.file_type().is_file() {
                    return None;
                }
                let name = object_name(&root, entry.path())?;
                if !matcher.matches(&name) {
                    return None;
                }
                let mut object = ObjectRef::new(bucket.clone(), name);
                if let Ok(md) = entry.metadata() {
                    object = object.with_size(md.len());
                }
                Some(Ok(object))
            })
            .take(limit);

        Ok(objects)
    }
}

fn object_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

fn map_io(err: std::io::Error, object: &ObjectRef) -> StoreError {
    match err.kind() {
        ErrorKind::NotFound => StoreError::NotFound(object.name.clone()),
        ErrorKind::PermissionDenied => StoreError::PermissionDenied(object.name.clone()),
        _ => StoreError::Io(err),
    }
}

#[async_trait]
impl ObjectStore for LocalBucketStore {
    fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    async fn list_objects(&self, query: &ListQuery) -> StoreResult<Vec<ObjectRef>> {
        let walk = self.walk(query)?;
        let objects = tokio::task::spawn_blocking(move || walk.collect::<StoreResult<Vec<_>>>())
            .await
            .map_err(|e| StoreError::Backend(format!("listing task failed: {e}")))??;
        debug!(
            bucket = %self.bucket_name,
            pattern = ?query.match_glob,
            count = objects.len(),
            "Listed local objects"
        );
        Ok(objects)
    }

    fn stream_objects(&self, query: ListQuery) -> ObjectStream<'_> {
        // Directory reads happen as the stream is polled.
        match self.walk(&query) {
            Ok(walk) => stream::iter(walk).boxed(),
            Err(err) => stream::iter(vec![Err(err)]).boxed(),
        }
    }

    async fn read_object(&self, object: &ObjectRef) -> StoreResult<Vec<u8>> {
        let path = self.object_path(object)?;
        tokio::fs::read(&path).await.map_err(|e| map_io(e, object))
    }

    async fn download_to_file(&self, object: &ObjectRef, path: &Path) -> StoreResult<()> {
        let source = self.object_path(object)?;
        if let Err(e) = tokio::fs::metadata(&source).await {
            return Err(map_io(e, object));
        }
        tokio::fs::copy(&source, path).await?;
        Ok(())
    }
}
