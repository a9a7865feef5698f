//! Infrastructure implementation of the `HapfileStore` port.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::application::ports::HapfileStore;
use crate::domain::hapfile::{DEFAULT_HAPFILE, Hapfile};

/// Production implementation of `HapfileStore` that reads YAML from disk.
///
/// Path precedence: explicit path (`--file`), then `HAP_FILE`, then
/// `./Hapfile`.
pub struct YamlHapfileStore {
    path: Option<PathBuf>,
}

impl YamlHapfileStore {
    #[must_use]
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl HapfileStore for YamlHapfileStore {
    fn load(&self) -> Result<Hapfile> {
        let path = self.path();
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        serde_yaml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
    }

    fn path(&self) -> PathBuf {
        resolve_path(self.path.as_ref(), std::env::var("HAP_FILE").ok())
    }
}

fn resolve_path(explicit: Option<&PathBuf>, env: Option<String>) -> PathBuf {
    explicit
        .cloned()
        .or_else(|| env.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_HAPFILE))
}
