//! Concurrent download of object batches into a local mirror.

use crate::batch::types::{DownloadOutcome, DownloadReport, TransferState};
use crate::error::{RetrievalError, RetrievalResult};
use crate::path::mirror_path;
use crate::progress::{ProgressSink, TracingProgressSink, TransferEvent};
use runbucket_abstraction::{ListQuery, ObjectRef, ObjectStore};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

/// Worker count used when the caller does not pick one.
pub const DEFAULT_WORKERS: usize = 8;

/// Downloads batches of objects through a bounded worker pool.
///
/// Each item is retrieved into `<destination>/<bucket_name>/<object_name>`.
/// A failing item never aborts its siblings and is not retried.
pub struct BatchRetriever {
    store: Arc<dyn ObjectStore>,
    workers: usize,
    progress: Arc<dyn ProgressSink>,
}

impl BatchRetriever {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store, workers: DEFAULT_WORKERS, progress: Arc::new(TracingProgressSink) }
    }

    /// Sets the pool size; zero is treated as one.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Downloads every object and returns once each has reached a terminal state.
    ///
    /// Outcomes are reported in input order regardless of completion order.
    pub async fn download_many(&self, objects: Vec<ObjectRef>, destination: &Path) -> DownloadReport {
        let start_time = Instant::now();
        let total = objects.len();
        self.progress.on_event(TransferEvent::BatchStarted { total, workers: self.workers });

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut handles = Vec::with_capacity(total);

        for object in objects {
            let store = Arc::clone(&self.store);
            let progress = Arc::clone(&self.progress);
            let semaphore = Arc::clone(&semaphore);
            let destination = destination.to_path_buf();
            let fallback = object.clone();

            let handle = tokio::spawn(async move {
                let mut outcome = DownloadOutcome::pending(object);

                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        outcome.state.abort(RetrievalError::Worker(format!("worker pool closed: {e}")));
                        report_item(progress.as_ref(), &outcome);
                        return outcome;
                    }
                };

                outcome.state.start();
                progress.on_event(TransferEvent::ItemStarted { name: outcome.object.name.clone() });

                let result = match mirror_path(&destination, &outcome.object.bucket_name, &outcome.object.name) {
                    Ok(path) => {
                        let result = fetch_to(store.as_ref(), &outcome.object, &path).await;
                        outcome.destination = Some(path);
                        result
                    }
                    Err(e) => Err(e),
                };
                outcome.state.finish(result);

                report_item(progress.as_ref(), &outcome);
                outcome
            });

            handles.push((fallback, handle));
        }

        let mut outcomes = Vec::with_capacity(total);
        for (object, handle) in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!(object = %object.name, "Download task join error: {}", e);
                    let mut outcome = DownloadOutcome::pending(object);
                    outcome.state.abort(RetrievalError::Worker(format!("download task failed: {e}")));
                    report_item(self.progress.as_ref(), &outcome);
                    outcomes.push(outcome);
                }
            }
        }

        let report = DownloadReport::new(outcomes, start_time.elapsed());
        self.progress.on_event(TransferEvent::BatchFinished {
            succeeded: report.succeeded().count(),
            failed: report.failed().count(),
        });
        debug!(
            total_items = total,
            duration_ms = report.total_duration.as_millis(),
            success_rate = report.success_rate,
            "Batch download completed"
        );
        report
    }

    /// Lists up to `max_results` objects from the bucket root and downloads them.
    ///
    /// `None` lists the whole bucket; every name is held in memory before the
    /// first download starts, so this is only safe for buckets known to be small.
    pub async fn download_bucket(
        &self,
        destination: &Path,
        max_results: Option<usize>,
    ) -> RetrievalResult<DownloadReport> {
        if max_results.is_none() {
            warn!(bucket = %self.store.bucket_name(), "Listing entire bucket without a result cap");
        }
        let objects = self
            .store
            .list_objects(&ListQuery::all().with_max_results(max_results))
            .await?;
        Ok(self.download_many(objects, destination).await)
    }
}

pub(crate) async fn fetch_to(store: &dyn ObjectStore, object: &ObjectRef, path: &Path) -> RetrievalResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    if let Err(e) = store.download_to_file(object, path).await {
        // Never leave a partial file behind for a failed item.
        match tokio::fs::remove_file(path).await {
            Ok(()) => {}
            Err(rm) if rm.kind() == ErrorKind::NotFound => {}
            Err(rm) => warn!(path = %path.display(), error = %rm, "Could not remove partial download"),
        }
        return Err(e.into());
    }
    Ok(())
}

fn report_item(progress: &dyn ProgressSink, outcome: &DownloadOutcome) {
    let name = outcome.object.name.clone();
    match &outcome.state {
        TransferState::Succeeded => progress.on_event(TransferEvent::ItemSucceeded {
            name,
            destination: outcome.destination.clone().unwrap_or_default(),
        }),
        TransferState::Failed(err) => progress.on_event(TransferEvent::ItemFailed { name, error: err.to_string() }),
        TransferState::Pending | TransferState::InFlight => {}
    }
}
