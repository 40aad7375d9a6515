//! Key-value storage backed by a single JSON object on disk.

use std::{
    collections::BTreeMap,
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::Context;
use async_trait::async_trait;
use gridplace_contracts::{CollaboratorError, KeyValueStore};
use tempfile::NamedTempFile;
use tracing::debug;

type Entries = BTreeMap<String, String>;

/// Persists every `set` by rewriting the whole file atomically.
///
/// Without a path the store lives in memory only and is gone when the
/// process exits.
#[derive(Debug, Default)]
pub struct JsonFileStore {
    path: Option<PathBuf>,
    entries: Mutex<Entries>,
}

impl JsonFileStore {
    /// Open `path`, starting empty if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => Entries::new(),
            Ok(raw) => serde_json::from_str(&raw).with_context(|| {
                format!("{} is not a JSON object of strings", path.display())
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Entries::new()
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to read store {}", path.display())
                });
            }
        };
        debug!(
            "[store] Loaded {} entries from {}",
            entries.len(),
            path.display()
        );

        Ok(Self {
            path: Some(path),
            entries: Mutex::new(entries),
        })
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, Entries> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn write_atomically(path: &Path, entries: &Entries) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, entries)?;
    tmp.write_all(b"\n")?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CollaboratorError> {
        Ok(self.entries().get(key).cloned())
    }

    async fn set(
        &self,
        key: &str,
        value: String,
    ) -> Result<(), CollaboratorError> {
        let snapshot = {
            let mut entries = self.entries();
            entries.insert(key.to_string(), value);
            entries.clone()
        };

        let Some(path) = self.path.clone() else {
            return Ok(());
        };
        tokio::task::spawn_blocking(move || write_atomically(&path, &snapshot))
            .await
            .map_err(|err| CollaboratorError::Backend(err.to_string()))?
            .map_err(|err| CollaboratorError::Backend(err.to_string()))
    }
}
