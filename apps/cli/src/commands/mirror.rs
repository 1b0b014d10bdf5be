//! `runbucket mirror` - download a whole bucket into the local mirror.

use super::report::print_report;
use runbucket_core::{BatchRetriever, RetrievalConfig};

pub async fn execute(settings: &RetrievalConfig, max_results: Option<usize>) -> anyhow::Result<()> {
    let store = settings.open_store()?;

    let report = BatchRetriever::new(store)
        .with_workers(settings.workers)
        .download_bucket(&settings.destination_dir, max_results)
        .await?;

    print_report(&report, &settings.destination_dir);
    report.into_result()?;
    Ok(())
}
