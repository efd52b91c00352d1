//! User accent overrides backed by a JSON file
//!
//! The file is a UTF-8 JSON object mapping lowercase words to their accented
//! form. Workers reload it at the start of every job so edits show up without
//! a restart. A missing file is an empty map; a malformed file keeps the last
//! map that loaded successfully.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::TextError;

pub type OverrideMap = HashMap<String, String>;

pub struct OverrideStore {
    path: PathBuf,
    current: RwLock<Arc<OverrideMap>>,
}

impl OverrideStore {
    /// Store with an empty map; call [`reload`](Self::reload) to read the file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: RwLock::new(Arc::new(OverrideMap::new())),
        }
    }

    /// Create and load immediately, tolerating a malformed file
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let store = Self::new(path);
        if let Err(e) = store.reload() {
            tracing::warn!(path = %store.path.display(), error = %e, "Accent overrides not loaded");
        }
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file; on error the previous map stays active
    pub fn reload(&self) -> Result<usize, TextError> {
        let map = read_map(&self.path)?;
        let count = map.len();
        *self.current.write() = Arc::new(map);
        tracing::trace!(path = %self.path.display(), count, "Accent overrides reloaded");
        Ok(count)
    }

    /// Current map
    pub fn snapshot(&self) -> Arc<OverrideMap> {
        self.current.read().clone()
    }

    /// Add or replace one override and persist the file
    ///
    /// Returns the number of entries after the write.
    pub fn set(&self, word: &str, accented: &str) -> Result<usize, TextError> {
        let key = word.trim().to_lowercase();
        if key.is_empty() {
            return Err(TextError::OverrideStore("override word is empty".into()));
        }

        let mut map = read_map(&self.path)?;
        map.insert(key, accented.trim().to_string());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(&map)?)?;
        std::fs::rename(&tmp, &self.path)?;

        let count = map.len();
        *self.current.write() = Arc::new(map);
        Ok(count)
    }
}

fn read_map(path: &Path) -> Result<OverrideMap, TextError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(OverrideMap::new()),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_str(&raw).map_err(|e| {
        TextError::OverrideStore(format!("malformed override file {}: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = OverrideStore::new(dir.path().join("missing.json"));
        assert_eq!(store.reload().unwrap(), 0);
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_set_persists_lowercase_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("overrides.json");
        let store = OverrideStore::new(&path);

        assert_eq!(store.set("Замок", "замо\u{301}к").unwrap(), 1);
        assert_eq!(store.set("мука", "му\u{301}ка").unwrap(), 2);
        assert_eq!(store.snapshot().get("замок").unwrap(), "замо\u{301}к");

        let reopened = OverrideStore::open(&path);
        assert_eq!(reopened.snapshot().len(), 2);
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("замо\u{301}к"));
    }

    #[test]
    fn test_malformed_file_keeps_previous_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overrides.json");
        std::fs::write(&path, r#"{"замок": "замо\u0301к"}"#).unwrap();

        let store = OverrideStore::open(&path);
        assert_eq!(store.snapshot().len(), 1);

        std::fs::write(&path, "{ not json").unwrap();
        let err = store.reload().unwrap_err();
        assert!(matches!(err, TextError::OverrideStore(_)));
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn test_malformed_first_load_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overrides.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let store = OverrideStore::open(&path);
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_reload_sees_external_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overrides.json");
        let store = OverrideStore::open(&path);
        assert!(store.snapshot().is_empty());

        std::fs::write(&path, r#"{"мука": "мука\u0301"}"#).unwrap();
        assert_eq!(store.reload().unwrap(), 1);
    }
}
