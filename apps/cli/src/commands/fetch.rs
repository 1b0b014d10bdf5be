//! `runbucket fetch` - download named objects into the local mirror.

use super::report::print_report;
use runbucket_core::{BatchRetriever, ObjectRef, RetrievalConfig};

pub async fn execute(settings: &RetrievalConfig, names: Vec<String>) -> anyhow::Result<()> {
    let store = settings.open_store()?;
    let bucket = settings.bucket()?;
    let objects = names.into_iter().map(|name| ObjectRef::new(bucket, name)).collect();

    let report = BatchRetriever::new(store)
        .with_workers(settings.workers)
        .download_many(objects, &settings.destination_dir)
        .await;

    print_report(&report, &settings.destination_dir);
    report.into_result()?;
    Ok(())
}
