//! `runbucket epochs` - list the epoch snapshots of one run instance.

use colored::Colorize;
use runbucket_core::catalog::list_epoch_objects;
use runbucket_core::{RetrievalConfig, epoch_index};

pub async fn execute(
    settings: &RetrievalConfig,
    run: &str,
    instance: &str,
    sorted: bool,
    json: bool,
) -> anyhow::Result<()> {
    let store = settings.open_store()?;
    let objects = list_epoch_objects(store.as_ref(), run, instance, &settings.snapshot_extension, sorted).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&objects)?);
        return Ok(());
    }

    if objects.is_empty() {
        println!("{}", format!("No epoch snapshots found for {run}/{instance}").yellow());
        return Ok(());
    }

    println!("{}", format!("Epochs of {run}/{instance} ({})", objects.len()).bold().cyan());
    for object in &objects {
        let index = epoch_index(&object.name).map_or_else(|_| "?".to_string(), |i| i.to_string());
        println!("  {:>6}  {}", index, object.name.dimmed());
    }
    Ok(())
}
