//! Reading and writing artifacts inside a local mirror tree.
//!
//! A mirror file at `<anything>/<bucket_name>/<object_name>` carries its
//! provenance in its path, so readers take the bucket name and recover the
//! object name from the path. Writers use the record's own provenance.

use crate::artifacts::{EpochSnapshot, RunConfiguration};
use crate::codec::{decode_config, decode_snapshot, encode_config, encode_snapshot};
use crate::error::RetrievalResult;
use crate::path::{mirror_path, path_relative_to_bucket};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads a configuration file from a mirror of `bucket_name`.
pub fn read_config_file(path: &Path, bucket_name: &str) -> RetrievalResult<RunConfiguration> {
    let name = path_relative_to_bucket(path, Some(bucket_name))?;
    let raw = fs::read(path)?;
    decode_config(&raw, &name, bucket_name)
}

/// Reads a snapshot file from a mirror of `bucket_name`.
pub fn read_snapshot_file(path: &Path, bucket_name: &str) -> RetrievalResult<EpochSnapshot> {
    let name = path_relative_to_bucket(path, Some(bucket_name))?;
    let raw = fs::read(path)?;
    decode_snapshot(&raw, &name, bucket_name)
}

/// Writes `config` to `<destination>/<bucket_name>/<name>` and returns the path.
///
/// A configuration without an object name is stored under its canonical
/// `<run_name>/<wandb_id>/config.json` location.
pub fn write_config_file(config: &RunConfiguration, destination: &Path) -> RetrievalResult<PathBuf> {
    let name = if config.name.is_empty() { config.object_name() } else { config.name.clone() };
    let path = mirror_path(destination, &config.bucket_name, &name)?;
    write_payload(&path, &encode_config(config)?)?;
    Ok(path)
}

/// Writes `snapshot` to `<destination>/<bucket_name>/<name>` and returns the path.
pub fn write_snapshot_file(snapshot: &EpochSnapshot, destination: &Path) -> RetrievalResult<PathBuf> {
    let path = mirror_path(destination, &snapshot.bucket_name, &snapshot.name)?;
    write_payload(&path, &encode_snapshot(snapshot)?)?;
    Ok(path)
}

fn write_payload(path: &Path, payload: &[u8]) -> RetrievalResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, payload)?;
    debug!(path = %path.display(), bytes = payload.len(), "Wrote mirror file");
    Ok(())
}
