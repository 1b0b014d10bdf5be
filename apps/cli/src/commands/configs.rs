//! `runbucket configs` - list the run configurations of a run.

use colored::Colorize;
use runbucket_core::RetrievalConfig;
use runbucket_core::catalog::list_run_configurations;

pub async fn execute(settings: &RetrievalConfig, run: &str, sorted: bool, json: bool) -> anyhow::Result<()> {
    let store = settings.open_store()?;
    let configs = list_run_configurations(store.as_ref(), run, sorted).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&configs)?);
        return Ok(());
    }

    if configs.is_empty() {
        println!("{}", format!("No configurations found for run '{run}'").yellow());
        return Ok(());
    }

    println!("{}", format!("Configurations of {run} ({})", configs.len()).bold().cyan());
    for config in &configs {
        println!(
            "  {:>6}  {:<10} {:<12} {}",
            config.lesion_start_epoch,
            config.wandb_id.green(),
            config.lesion_type,
            config.name.dimmed()
        );
    }
    Ok(())
}
