//! Configuration discovery for the CLI.

use runbucket_core::RetrievalConfig;
use std::path::Path;

/// Loads the layered configuration and applies `RUNBUCKET_*` variables.
pub fn load(explicit: Option<&Path>) -> anyhow::Result<RetrievalConfig> {
    let cwd = std::env::current_dir()?;
    let home = dirs::home_dir();
    let mut config = RetrievalConfig::discover_and_load(home.as_deref(), &cwd, explicit)?;
    config.apply_env(|key| std::env::var(key).ok())?;
    Ok(config)
}
