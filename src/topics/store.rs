use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    foundation::error::{MemeError, MemeResult},
    topics::ledger::TopicRecord,
};

/// Durable home of the ledger record. Load-or-absent, then whole-record replace.
pub trait LedgerStore {
    fn load(&mut self) -> MemeResult<Option<TopicRecord>>;
    fn save(&mut self, record: &TopicRecord) -> MemeResult<()>;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    record: Option<TopicRecord>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: TopicRecord) -> Self {
        Self {
            record: Some(record),
            saves: 0,
        }
    }

    pub fn record(&self) -> Option<&TopicRecord> {
        self.record.as_ref()
    }

    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl LedgerStore for MemoryStore {
    fn load(&mut self) -> MemeResult<Option<TopicRecord>> {
        Ok(self.record.clone())
    }

    fn save(&mut self, record: &TopicRecord) -> MemeResult<()> {
        self.record = Some(record.clone());
        self.saves += 1;
        Ok(())
    }
}

/// JSON file `{"topics": [...], "timestamp": <epoch ms>}`.
///
/// Writes go to a sibling temp file which is then renamed over the target. A file that
/// fails to parse is treated as absent so a damaged ledger never blocks a run.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "ledger".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl LedgerStore for JsonFileStore {
    fn load(&mut self) -> MemeResult<Option<TopicRecord>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(MemeError::storage(format!(
                    "read ledger '{}': {e}",
                    self.path.display()
                )));
            }
        };

        match serde_json::from_slice::<TopicRecord>(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "ledger file is unreadable, starting a fresh window"
                );
                Ok(None)
            }
        }
    }

    fn save(&mut self, record: &TopicRecord) -> MemeResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create ledger directory '{}'", parent.display()))?;
        }

        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| MemeError::serde(format!("encode ledger: {e}")))?;

        let tmp = self.temp_path();
        std::fs::write(&tmp, &json)
            .map_err(|e| MemeError::storage(format!("write '{}': {e}", tmp.display())))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            MemeError::storage(format!(
                "replace ledger '{}': {e}",
                self.path.display()
            ))
        })?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/topics/store.rs"]
mod tests;
