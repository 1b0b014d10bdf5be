//! Pattern-based enumeration of artifact objects.
//!
//! Matching is delegated to the store's glob support. Listing returns handles
//! only; nothing is downloaded.

use crate::artifacts::{CONFIG_FILE_NAME, SNAPSHOT_DIR};
use crate::error::RetrievalResult;
use glob::Pattern;
use runbucket_abstraction::{ListQuery, ObjectRef, ObjectStore, ObjectStream};
use tracing::debug;

/// `<run_name>/*/config.json`
pub fn config_pattern(run_name: &str) -> String {
    format!("{}/*/{}", Pattern::escape(run_name), CONFIG_FILE_NAME)
}

/// `<run_name>/<instance_id>/states/test/production/epoch_[0-9][0-9][0-9][0-9].<ext>`
pub fn epoch_pattern(run_name: &str, instance_id: &str, extension: &str) -> String {
    format!(
        "{}/{}/{}/epoch_[0-9][0-9][0-9][0-9].{}",
        Pattern::escape(run_name),
        Pattern::escape(instance_id),
        SNAPSHOT_DIR,
        Pattern::escape(extension)
    )
}

/// Lists the configuration objects of every instance of `run_name`.
pub async fn list_config_objects(store: &dyn ObjectStore, run_name: &str) -> RetrievalResult<Vec<ObjectRef>> {
    let pattern = config_pattern(run_name);
    let objects = store.list_objects(&ListQuery::glob(&pattern)).await?;
    debug!(run = %run_name, pattern = %pattern, count = objects.len(), "Listed run configurations");
    Ok(objects)
}

/// Lazy form of [`list_config_objects`]; single pass, not restartable.
pub fn stream_config_objects<'a>(store: &'a dyn ObjectStore, run_name: &str) -> ObjectStream<'a> {
    store.stream_objects(ListQuery::glob(config_pattern(run_name)))
}

/// Lists the epoch snapshot objects of one run instance.
pub async fn list_epoch_objects(
    store: &dyn ObjectStore,
    run_name: &str,
    instance_id: &str,
    extension: &str,
) -> RetrievalResult<Vec<ObjectRef>> {
    let pattern = epoch_pattern(run_name, instance_id, extension);
    let objects = store.list_objects(&ListQuery::glob(&pattern)).await?;
    debug!(
        run = %run_name,
        instance = %instance_id,
        count = objects.len(),
        "Listed epoch snapshots"
    );
    Ok(objects)
}

/// Lazy form of [`list_epoch_objects`]; single pass, not restartable.
pub fn stream_epoch_objects<'a>(
    store: &'a dyn ObjectStore,
    run_name: &str,
    instance_id: &str,
    extension: &str,
) -> ObjectStream<'a> {
    store.stream_objects(ListQuery::glob(epoch_pattern(run_name, instance_id, extension)))
}
