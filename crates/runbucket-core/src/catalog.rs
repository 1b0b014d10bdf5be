//! Listing, ordering and decoding composed into record-level queries.

use crate::artifacts::{EpochSnapshot, RunConfiguration};
use crate::batch::retriever::fetch_to;
use crate::codec::{decode_config, decode_snapshot};
use crate::error::RetrievalResult;
use crate::listing;
use crate::ordering::{sort_configs_by_lesion_onset, sort_epochs};
use crate::path::mirror_path;
use futures::future::try_join_all;
use runbucket_abstraction::{ObjectRef, ObjectStore};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads and decodes one configuration object.
pub async fn fetch_config(store: &dyn ObjectStore, object: &ObjectRef) -> RetrievalResult<RunConfiguration> {
    let raw = store.read_object(object).await?;
    decode_config(&raw, &object.name, &object.bucket_name)
}

/// Reads and decodes one snapshot object.
pub async fn fetch_snapshot(store: &dyn ObjectStore, object: &ObjectRef) -> RetrievalResult<EpochSnapshot> {
    let raw = store.read_object(object).await?;
    decode_snapshot(&raw, &object.name, &object.bucket_name)
}

/// Every configuration of `run_name`, optionally ordered by lesion onset.
///
/// Without sorting the store's listing order is kept.
pub async fn list_run_configurations(
    store: &dyn ObjectStore,
    run_name: &str,
    sorted: bool,
) -> RetrievalResult<Vec<RunConfiguration>> {
    let objects = listing::list_config_objects(store, run_name).await?;
    let configs = try_join_all(objects.iter().map(|object| fetch_config(store, object))).await?;
    Ok(if sorted { sort_configs_by_lesion_onset(configs) } else { configs })
}

/// Epoch snapshot handles of one run instance, optionally ordered by epoch.
pub async fn list_epoch_objects(
    store: &dyn ObjectStore,
    run_name: &str,
    instance_id: &str,
    extension: &str,
    sorted: bool,
) -> RetrievalResult<Vec<ObjectRef>> {
    let objects = listing::list_epoch_objects(store, run_name, instance_id, extension).await?;
    if sorted { sort_epochs(objects) } else { Ok(objects) }
}

/// Decoded epoch snapshots of one run instance, in the order of
/// [`list_epoch_objects`].
pub async fn list_epoch_snapshots(
    store: &dyn ObjectStore,
    run_name: &str,
    instance_id: &str,
    extension: &str,
    sorted: bool,
) -> RetrievalResult<Vec<EpochSnapshot>> {
    let objects = list_epoch_objects(store, run_name, instance_id, extension, sorted).await?;
    debug!(run = %run_name, instance = %instance_id, count = objects.len(), "Fetching epoch snapshots");
    try_join_all(objects.iter().map(|object| fetch_snapshot(store, object))).await
}

/// Mirrors a single object under `destination` and returns its local path.
pub async fn download_object(
    store: &dyn ObjectStore,
    object: &ObjectRef,
    destination: &Path,
) -> RetrievalResult<PathBuf> {
    let path = mirror_path(destination, &object.bucket_name, &object.name)?;
    fetch_to(store, object, &path).await?;
    debug!(object = %object, path = %path.display(), "Downloaded object");
    Ok(path)
}
