//! Retrieval configuration and its file/environment layering.
//!
//! Layers are applied in order, later ones winning field by field:
//!
//! 1. built-in defaults
//! 2. global file (`~/.runbucket/config.toml`)
//! 3. local file (`./runbucket.toml`)
//! 4. an explicitly named file
//! 5. environment overrides (`RUNBUCKET_*`)
//!
//! The environment is read through a caller-supplied lookup so that nothing in
//! this crate touches process state.

use crate::artifacts::DEFAULT_SNAPSHOT_EXTENSION;
use crate::batch::DEFAULT_WORKERS;
use crate::error::{RetrievalError, RetrievalResult};
use runbucket_abstraction::ObjectStore;
use runbucket_stores::{StoreConfig, StoreFactory, StoreKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Default cap on bucket-wide listings.
pub const DEFAULT_MAX_RESULTS: usize = 1000;

/// Default mirror root, relative to the working directory.
pub const DEFAULT_DESTINATION: &str = "buckets";

pub const ENV_BUCKET: &str = "RUNBUCKET_BUCKET";
pub const ENV_STORE_ROOT: &str = "RUNBUCKET_STORE_ROOT";
pub const ENV_WORKERS: &str = "RUNBUCKET_WORKERS";
pub const ENV_DEST: &str = "RUNBUCKET_DEST";

/// Effective settings for a retrieval session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Bucket to read from; required by every store-backed command.
    pub bucket_name: Option<String>,
    pub store: StoreConfig,
    /// Local mirror root; objects land at `<destination_dir>/<bucket>/<name>`.
    pub destination_dir: PathBuf,
    pub workers: usize,
    /// Cap on bucket-wide listings; `0` means unlimited.
    pub max_results: usize,
    pub snapshot_extension: String,
    pub log_level: Option<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            bucket_name: None,
            store: StoreConfig::default(),
            destination_dir: PathBuf::from(DEFAULT_DESTINATION),
            workers: DEFAULT_WORKERS,
            max_results: DEFAULT_MAX_RESULTS,
            snapshot_extension: DEFAULT_SNAPSHOT_EXTENSION.to_string(),
            log_level: None,
        }
    }
}

/// One configuration file; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub bucket_name: Option<String>,
    #[serde(default)]
    pub store: Option<StoreSection>,
    #[serde(default)]
    pub destination_dir: Option<PathBuf>,
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default)]
    pub max_results: Option<usize>,
    #[serde(default)]
    pub snapshot_extension: Option<String>,
    #[serde(default)]
    pub log_level: Option<String>,
}

/// `[store]` table of a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    #[serde(default)]
    pub kind: Option<StoreKind>,
    #[serde(default)]
    pub root: Option<PathBuf>,
}

impl ConfigFile {
    /// Loads a TOML configuration file.
    pub fn load(path: &Path) -> RetrievalResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RetrievalError::Config(format!("{}: {}", path.display(), e)))?;
        Self::parse(&content).map_err(|e| match e {
            RetrievalError::Config(msg) => RetrievalError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    pub fn parse(content: &str) -> RetrievalResult<Self> {
        toml::from_str(content).map_err(|e| RetrievalError::Config(e.to_string()))
    }
}

impl RetrievalConfig {
    /// `<home>/.runbucket/config.toml`
    pub fn global_path(home: &Path) -> PathBuf {
        home.join(".runbucket").join("config.toml")
    }

    /// `<dir>/runbucket.toml`
    pub fn local_path(dir: &Path) -> PathBuf {
        dir.join("runbucket.toml")
    }

    /// Applies the global, local and explicit files over the defaults.
    ///
    /// Missing global and local files are skipped; a missing explicit file is
    /// an error. Any file that exists but does not parse is an error.
    pub fn discover_and_load(home: Option<&Path>, cwd: &Path, explicit: Option<&Path>) -> RetrievalResult<Self> {
        let mut config = Self::default();

        let discovered = home.map(Self::global_path).into_iter().chain([Self::local_path(cwd)]);
        for path in discovered {
            if path.is_file() {
                debug!(path = %path.display(), "Loading configuration file");
                config.merge(&ConfigFile::load(&path)?);
            }
        }

        if let Some(path) = explicit {
            debug!(path = %path.display(), "Loading explicit configuration file");
            config.merge(&ConfigFile::load(path)?);
        }

        Ok(config)
    }

    /// Overlays the set fields of `file`.
    pub fn merge(&mut self, file: &ConfigFile) {
        if let Some(ref bucket) = file.bucket_name {
            self.bucket_name = Some(bucket.clone());
        }
        if let Some(ref store) = file.store {
            if let Some(kind) = store.kind {
                self.store.kind = kind;
            }
            if let Some(ref root) = store.root {
                self.store.root = Some(root.clone());
            }
        }
        if let Some(ref dest) = file.destination_dir {
            self.destination_dir = dest.clone();
        }
        if let Some(workers) = file.workers {
            self.workers = workers;
        }
        if let Some(max_results) = file.max_results {
            self.max_results = max_results;
        }
        if let Some(ref ext) = file.snapshot_extension {
            self.snapshot_extension = ext.clone();
        }
        if let Some(ref level) = file.log_level {
            self.log_level = Some(level.clone());
        }
    }

    /// Applies `RUNBUCKET_*` overrides obtained through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> RetrievalResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bucket) = lookup(ENV_BUCKET) {
            self.bucket_name = Some(bucket);
        }
        if let Some(root) = lookup(ENV_STORE_ROOT) {
            self.store.root = Some(PathBuf::from(root));
        }
        if let Some(workers) = lookup(ENV_WORKERS) {
            self.workers = workers
                .trim()
                .parse()
                .map_err(|e| RetrievalError::Config(format!("{ENV_WORKERS}={workers}: {e}")))?;
        }
        if let Some(dest) = lookup(ENV_DEST) {
            self.destination_dir = PathBuf::from(dest);
        }
        Ok(())
    }

    /// Listing cap for bucket-wide operations; `None` when unlimited.
    pub fn max_results_limit(&self) -> Option<usize> {
        (self.max_results > 0).then_some(self.max_results)
    }

    pub fn bucket(&self) -> RetrievalResult<&str> {
        self.bucket_name
            .as_deref()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| RetrievalError::Config(format!("no bucket configured (set bucket_name or {ENV_BUCKET})")))
    }

    /// Checks values that cannot be expressed in the types.
    pub fn validate(&self) -> RetrievalResult<()> {
        let ext = &self.snapshot_extension;
        if ext.is_empty() || ext.starts_with('.') || ext.contains('/') {
            return Err(RetrievalError::Config(format!("invalid snapshot extension '{ext}'")));
        }
        if self.store.kind == StoreKind::Local && self.store.root.is_none() {
            return Err(RetrievalError::Config(format!(
                "local store needs a root directory (set store.root or {ENV_STORE_ROOT})"
            )));
        }
        Ok(())
    }

    /// Opens the configured store for the configured bucket.
    pub fn open_store(&self) -> RetrievalResult<Arc<dyn ObjectStore>> {
        self.validate()?;
        Ok(StoreFactory::create(&self.store, self.bucket()?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RetrievalConfig::default();
        assert_eq!(config.workers, 8);
        assert_eq!(config.max_results_limit(), Some(1000));
        assert_eq!(config.destination_dir, PathBuf::from("buckets"));
        assert_eq!(config.snapshot_extension, "pkl");
        assert!(config.bucket().is_err());
    }

    #[test]
    fn test_zero_max_results_is_unlimited() {
        let mut config = RetrievalConfig::default();
        config.merge(&ConfigFile::parse("max_results = 0").unwrap());
        assert_eq!(config.max_results_limit(), None);
    }

    #[test]
    fn test_layering_order() {
        let home = TempDir::new().unwrap();
        let cwd = TempDir::new().unwrap();
        let global = RetrievalConfig::global_path(home.path());
        std::fs::create_dir_all(global.parent().unwrap()).unwrap();
        std::fs::write(&global, "bucket_name = \"global\"\nworkers = 2\nsnapshot_extension = \"npz\"\n").unwrap();
        std::fs::write(RetrievalConfig::local_path(cwd.path()), "bucket_name = \"local\"\n[store]\nroot = \"/data\"\n")
            .unwrap();
        let explicit = cwd.path().join("extra.toml");
        std::fs::write(&explicit, "workers = 4\n").unwrap();

        let mut config =
            RetrievalConfig::discover_and_load(Some(home.path()), cwd.path(), Some(&explicit)).unwrap();
        assert_eq!(config.bucket().unwrap(), "local");
        assert_eq!(config.workers, 4);
        assert_eq!(config.snapshot_extension, "npz");
        assert_eq!(config.store.root, Some(PathBuf::from("/data")));

        config
            .apply_env(env(&[(ENV_BUCKET, "envbkt"), (ENV_WORKERS, "16"), (ENV_DEST, "/tmp/m")]))
            .unwrap();
        assert_eq!(config.bucket().unwrap(), "envbkt");
        assert_eq!(config.workers, 16);
        assert_eq!(config.destination_dir, PathBuf::from("/tmp/m"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let cwd = TempDir::new().unwrap();
        let missing = cwd.path().join("nope.toml");
        let err = RetrievalConfig::discover_and_load(None, cwd.path(), Some(&missing)).unwrap_err();
        assert!(matches!(err, RetrievalError::Config(_)));
        assert!(RetrievalConfig::discover_and_load(None, cwd.path(), None).is_ok());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(ConfigFile::parse("bucket = \"x\"").is_err());
    }

    #[test]
    fn test_bad_worker_env_is_config_error() {
        let mut config = RetrievalConfig::default();
        let err = config.apply_env(env(&[(ENV_WORKERS, "many")])).unwrap_err();
        assert!(matches!(err, RetrievalError::Config(ref m) if m.contains(ENV_WORKERS)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = RetrievalConfig { bucket_name: Some("b".to_string()), ..RetrievalConfig::default() };
        assert!(config.validate().is_err());
        config.store.root = Some(PathBuf::from("/data"));
        assert!(config.validate().is_ok());
        config.snapshot_extension = ".pkl".to_string();
        assert!(config.validate().is_err());
        config.snapshot_extension = "a/b".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_open_memory_store() {
        let mut config = RetrievalConfig { bucket_name: Some("b".to_string()), ..RetrievalConfig::default() };
        config.store.kind = StoreKind::Memory;
        let store = config.open_store().unwrap();
        assert_eq!(store.bucket_name(), "b");
    }
}
