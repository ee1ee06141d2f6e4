use std::{
    collections::HashMap,
    fs, io,
    path::PathBuf,
    sync::Mutex,
};

use crate::{errors::Error, Result};

/// Whole-document key-value persistence.
///
/// Both ledgers (premium expiry, free-tier usage) are small flat maps:
/// every read loads the entire map, every write rewrites it. An absent
/// document is an empty map; only unreadable or unparseable content is an
/// error, so callers can tell "nobody stored yet" apart from "storage is
/// broken" and pick a degraded-mode policy deliberately.
pub trait MapStore: Send + Sync {
    fn load(&self) -> Result<HashMap<String, String>>;
    fn save(&self, map: &HashMap<String, String>) -> Result<()>;
}

/// JSON file backing. Writes go to a sibling temp file first and are
/// renamed over the target, so readers never observe a half-written map.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MapStore for JsonFileStore {
    fn load(&self) -> Result<HashMap<String, String>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => {
                return Err(Error::Storage(format!(
                    "read {}: {e}",
                    self.path.display()
                )))
            }
        };

        serde_json::from_str(&raw)
            .map_err(|e| Error::Storage(format!("parse {}: {e}", self.path.display())))
    }

    fn save(&self, map: &HashMap<String, String>) -> Result<()> {
        let raw = serde_json::to_string(map)
            .map_err(|e| Error::Storage(format!("serialize {}: {e}", self.path.display())))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw)
            .map_err(|e| Error::Storage(format!("write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            Error::Storage(format!(
                "rename {} -> {}: {e}",
                tmp.display(),
                self.path.display()
            ))
        })
    }
}

/// In-memory backing for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, String>>,
}

impl MapStore for MemoryStore {
    fn load(&self) -> Result<HashMap<String, String>> {
        Ok(self.inner.lock().unwrap_or_else(|p| p.into_inner()).clone())
    }

    fn save(&self, map: &HashMap<String, String>) -> Result<()> {
        *self.inner.lock().unwrap_or_else(|p| p.into_inner()) = map.clone();
        Ok(())
    }
}
