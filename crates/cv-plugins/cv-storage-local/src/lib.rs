//! # cv-storage-local
//! civitas/crates/cv-plugins/cv-storage-local/src/lib.rs
//! Local filesystem implementation of `KeyValueStore`.
//! Each key is one `<key>.json` document under the root directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use cv_core::traits::KeyValueStore;
use tracing::debug;

pub struct LocalFileStore {
    /// Root directory for all slots (e.g., "./data")
    root_path: PathBuf,
}

impl LocalFileStore {
    /// Creates the root directory if it does not exist yet.
    pub fn open(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root_path = root.into();
        fs::create_dir_all(&root_path)
            .with_context(|| format!("creating data directory {}", root_path.display()))?;
        Ok(Self { root_path })
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    /// Maps a key onto its document path, rejecting anything that could
    /// escape the root directory.
    fn slot_path(&self, key: &str) -> anyhow::Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            bail!("invalid storage key '{key}'");
        }
        Ok(self.root_path.join(format!("{key}.json")))
    }
}

impl KeyValueStore for LocalFileStore {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.slot_path(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    /// Writes to a sibling temp file then renames it over the slot, so a
    /// crash mid-write leaves the previous document intact.
    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.slot_path(key)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &path).with_context(|| format!("replacing {}", path.display()))?;
        debug!(key, bytes = value.len(), "slot written");
        Ok(())
    }
}
