//! Integration tests for batch retrieval against in-memory and local stores.

use async_trait::async_trait;
use runbucket_abstraction::{ListQuery, ObjectRef, ObjectStore, StoreError, StoreResult};
use runbucket_core::{BatchRetriever, RetrievalError, TransferState};
use runbucket_stores::{LocalBucketStore, MemoryStore};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

/// Store that records how many downloads run at once.
struct SlowStore {
    inner: MemoryStore,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl SlowStore {
    fn new(count: usize) -> Self {
        let inner = MemoryStore::new("bkt");
        for i in 0..count {
            inner.insert(format!("obj/{i:03}"), vec![0u8; 16]);
        }
        Self { inner, active: AtomicUsize::new(0), peak: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl ObjectStore for SlowStore {
    fn bucket_name(&self) -> &str {
        self.inner.bucket_name()
    }

    async fn list_objects(&self, query: &ListQuery) -> StoreResult<Vec<ObjectRef>> {
        self.inner.list_objects(query).await
    }

    async fn read_object(&self, object: &ObjectRef) -> StoreResult<Vec<u8>> {
        self.inner.read_object(object).await
    }

    async fn download_to_file(&self, object: &ObjectRef, path: &Path) -> StoreResult<()> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let result = self.inner.download_to_file(object, path).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Store that writes part of the payload before failing.
struct TruncatingStore;

#[async_trait]
impl ObjectStore for TruncatingStore {
    fn bucket_name(&self) -> &str {
        "bkt"
    }

    async fn list_objects(&self, _query: &ListQuery) -> StoreResult<Vec<ObjectRef>> {
        Ok(vec![ObjectRef::new("bkt", "a/partial.bin")])
    }

    async fn read_object(&self, object: &ObjectRef) -> StoreResult<Vec<u8>> {
        Err(StoreError::Backend(format!("{object}: connection reset")))
    }

    async fn download_to_file(&self, object: &ObjectRef, path: &Path) -> StoreResult<()> {
        tokio::fs::write(path, b"half").await?;
        Err(StoreError::Backend(format!("{object}: connection reset")))
    }
}

#[tokio::test]
async fn test_denied_item_fails_alone() {
    let store = MemoryStore::new("bkt")
        .with_object("run/a/config.json", "{}")
        .with_object("run/b/config.json", "{}")
        .with_object("run/c/config.json", "{}");
    store.deny("run/b/config.json");
    let objects = store.list_objects(&ListQuery::all()).await.unwrap();
    let temp = TempDir::new().unwrap();

    let report = BatchRetriever::new(Arc::new(store)).download_many(objects, temp.path()).await;

    assert_eq!(report.total_items(), 3);
    assert_eq!(report.succeeded().count(), 2);
    assert_eq!(report.failed_names(), vec!["run/b/config.json"]);
    let failed = report.get("run/b/config.json").unwrap();
    assert!(matches!(
        failed.state,
        TransferState::Failed(RetrievalError::Store(StoreError::PermissionDenied(_)))
    ));
    assert!(temp.path().join("bkt/run/a/config.json").is_file());
    assert!(!temp.path().join("bkt/run/b/config.json").exists());
    assert!(temp.path().join("bkt/run/c/config.json").is_file());

    let err = report.into_result().unwrap_err();
    assert!(err.to_string().starts_with("1 of 3 downloads failed"));
}

#[tokio::test]
async fn test_concurrency_never_exceeds_workers() {
    let store = Arc::new(SlowStore::new(12));
    let objects = store.list_objects(&ListQuery::all()).await.unwrap();
    let temp = TempDir::new().unwrap();

    let report = BatchRetriever::new(store.clone())
        .with_workers(3)
        .download_many(objects, temp.path())
        .await;

    assert!(report.is_complete_success());
    let peak = store.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak concurrency {peak} exceeded pool size");
    assert!(peak >= 2, "downloads never overlapped");
}

#[tokio::test]
async fn test_outcomes_follow_input_order() {
    let store = Arc::new(SlowStore::new(5));
    let mut objects = store.list_objects(&ListQuery::all()).await.unwrap();
    objects.reverse();
    let expected: Vec<String> = objects.iter().map(|o| o.name.clone()).collect();
    let temp = TempDir::new().unwrap();

    let report = BatchRetriever::new(store).download_many(objects, temp.path()).await;
    let names: Vec<String> = report.outcomes().iter().map(|o| o.name().to_string()).collect();
    assert_eq!(names, expected);
}

#[tokio::test]
async fn test_partial_file_removed_on_failure() {
    let temp = TempDir::new().unwrap();
    let retriever = BatchRetriever::new(Arc::new(TruncatingStore));

    let report = retriever.download_bucket(temp.path(), Some(10)).await.unwrap();
    assert_eq!(report.failed().count(), 1);
    assert!(!temp.path().join("bkt/a/partial.bin").exists());
}

#[tokio::test]
async fn test_download_bucket_respects_max_results() {
    let store = Arc::new(
        MemoryStore::new("bkt")
            .with_object("a", "1")
            .with_object("b", "2")
            .with_object("c", "3"),
    );
    let temp = TempDir::new().unwrap();

    let capped = BatchRetriever::new(store.clone()).download_bucket(temp.path(), Some(2)).await.unwrap();
    assert_eq!(capped.total_items(), 2);

    let all = BatchRetriever::new(store).download_bucket(temp.path(), None).await.unwrap();
    assert_eq!(all.total_items(), 3);
}

#[tokio::test]
async fn test_mirror_can_be_reopened_as_store() {
    let source = Arc::new(
        MemoryStore::new("bkt")
            .with_object("run/x/config.json", "{\"k\": 1}")
            .with_object("run/x/states/test/production/epoch_0000.pkl", vec![1u8, 2, 3]),
    );
    let temp = TempDir::new().unwrap();
    let report = BatchRetriever::new(source).download_bucket(temp.path(), None).await.unwrap();
    assert!(report.is_complete_success());

    let mirror = LocalBucketStore::open_mirror(temp.path(), "bkt");
    let mut names: Vec<String> = mirror
        .list_objects(&ListQuery::all())
        .await
        .unwrap()
        .into_iter()
        .map(|o| o.name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["run/x/config.json", "run/x/states/test/production/epoch_0000.pkl"]);

    let bytes = mirror
        .read_object(&ObjectRef::new("bkt", "run/x/states/test/production/epoch_0000.pkl"))
        .await
        .unwrap();
    assert_eq!(bytes, vec![1, 2, 3]);
}
