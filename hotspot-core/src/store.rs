//! Whole-set persistence of hotspot lists, keyed by session id.
//!
//! Every write replaces the full list for a session and every read returns a
//! freshly deserialized copy. A session with nothing stored reads as an empty
//! list.

use crate::error::{HotspotError, Result};
use crate::hotspot::Hotspot;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

const MAX_SESSION_ID_LEN: usize = 128;

/// Durable storage for hotspot sets
pub trait HotspotStore: Send + Sync {
    /// Stored list for `session_id`, or an empty list if none exists
    fn load(&self, session_id: &str) -> Result<Vec<Hotspot>>;

    /// Replace the stored list for `session_id` with `hotspots`
    fn save(&self, session_id: &str, hotspots: &[Hotspot]) -> Result<()>;
}

/// Generate a fresh, collision-resistant session id
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Session ids double as file names, so only `[A-Za-z0-9_-]` is accepted
pub fn validate_session_id(session_id: &str) -> Result<()> {
    let valid = !session_id.is_empty()
        && session_id.len() <= MAX_SESSION_ID_LEN
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(HotspotError::InvalidSessionId(session_id.to_string()))
    }
}

/// One pretty-printed JSON file per session: `<dir>/<session_id>.json`
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `session_id`
    pub fn path_for(&self, session_id: &str) -> Result<PathBuf> {
        validate_session_id(session_id)?;
        Ok(self.dir.join(format!("{}.json", session_id)))
    }

    fn temp_path_for(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!(
            ".{}.json.{}.tmp",
            session_id,
            uuid::Uuid::new_v4().simple()
        ))
    }
}

impl HotspotStore for JsonFileStore {
    fn load(&self, session_id: &str) -> Result<Vec<Hotspot>> {
        let path = self.path_for(session_id)?;

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No hotspots stored for session {}", session_id);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            HotspotError::Storage(format!("Corrupt record {}: {}", path.display(), e))
        })
    }

    fn save(&self, session_id: &str, hotspots: &[Hotspot]) -> Result<()> {
        let path = self.path_for(session_id)?;
        fs::create_dir_all(&self.dir)?;

        let json = serde_json::to_string_pretty(hotspots)?;

        // Write beside the target, then rename over it so readers never see a partial file
        let tmp_path = self.temp_path_for(session_id);
        let written = (|| -> std::io::Result<()> {
            let mut tmp_file = File::create(&tmp_path)?;
            tmp_file.write_all(json.as_bytes())?;
            tmp_file.sync_all()?;
            drop(tmp_file);
            fs::rename(&tmp_path, &path)
        })();

        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        info!("Saved {} hotspots to {}", hotspots.len(), path.display());
        Ok(())
    }
}

/// In-process store. Records are kept serialized so each load is a fresh copy.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.records
            .lock()
            .map(|records| records.contains_key(session_id))
            .unwrap_or(false)
    }
}

impl HotspotStore for MemoryStore {
    fn load(&self, session_id: &str) -> Result<Vec<Hotspot>> {
        validate_session_id(session_id)?;
        let records = self
            .records
            .lock()
            .map_err(|_| HotspotError::Storage("Memory store lock poisoned".to_string()))?;

        match records.get(session_id) {
            Some(json) => Ok(serde_json::from_str(json)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, session_id: &str, hotspots: &[Hotspot]) -> Result<()> {
        validate_session_id(session_id)?;
        let json = serde_json::to_string(hotspots)?;
        let mut records = self
            .records
            .lock()
            .map_err(|_| HotspotError::Storage("Memory store lock poisoned".to_string()))?;

        records.insert(session_id.to_string(), json);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Hotspot> {
        vec![
            Hotspot {
                id: "0".to_string(),
                label: "A".to_string(),
                yaw: -120.0,
                pitch: 12.5,
                y_norm: 237.5,
                x_norm: 100.0,
            },
            Hotspot {
                id: "1".to_string(),
                label: "B".to_string(),
                yaw: 104.08,
                pitch: 67.78,
                y_norm: 123.456,
                x_norm: 789.123,
            },
        ]
    }

    #[test]
    fn test_session_id_validation() {
        assert!(validate_session_id("3f2b6c1e-9a7d-4e0b-8c55-0d1f2a3b4c5d").is_ok());
        assert!(validate_session_id("pano_01").is_ok());
        assert!(validate_session_id("").is_err());
        assert!(validate_session_id("../etc/passwd").is_err());
        assert!(validate_session_id("a/b").is_err());
        assert!(validate_session_id("with space").is_err());
        assert!(validate_session_id(&"x".repeat(129)).is_err());
    }

    #[test]
    fn test_new_session_ids_are_valid_and_distinct() {
        let a = new_session_id();
        let b = new_session_id();
        assert_ne!(a, b);
        assert!(validate_session_id(&a).is_ok());
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        store.save("session-1", &sample()).unwrap();
        let loaded = store.load("session-1").unwrap();

        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_file_store_missing_session_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        assert!(store.load("never-saved").unwrap().is_empty());
    }

    #[test]
    fn test_file_store_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("not-created-yet"));

        assert!(store.load("abc").unwrap().is_empty());
    }

    #[test]
    fn test_file_store_creates_directory_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("processed").join("deep");
        let store = JsonFileStore::new(&nested);

        store.save("abc", &sample()).unwrap();

        assert!(nested.join("abc.json").exists());
    }

    #[test]
    fn test_file_store_overwrites_whole_set() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        store.save("s", &sample()).unwrap();
        let edited = vec![Hotspot {
            id: "7".to_string(),
            label: "Main Tower".to_string(),
            yaw: 33.33,
            pitch: -4.5,
            y_norm: 525.0,
            x_norm: 592.6,
        }];
        store.save("s", &edited).unwrap();

        assert_eq!(store.load("s").unwrap(), edited);
    }

    #[test]
    fn test_file_store_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        store.save("s", &sample()).unwrap();
        store.save("s", &sample()).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["s.json".to_string()]);
    }

    #[test]
    fn test_file_store_empty_file_is_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("blank.json"), "  \n").unwrap();
        let store = JsonFileStore::new(dir.path());

        assert!(store.load("blank").unwrap().is_empty());
    }

    #[test]
    fn test_file_store_corrupt_record_is_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.json"), "[{\"id\": ").unwrap();
        let store = JsonFileStore::new(dir.path());

        assert!(matches!(store.load("bad"), Err(HotspotError::Storage(_))));
    }

    #[test]
    fn test_file_store_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        assert!(matches!(
            store.save("../escape", &sample()),
            Err(HotspotError::InvalidSessionId(_))
        ));
    }

    #[test]
    fn test_file_store_reads_record_written_elsewhere() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("legacy.json"),
            r#"[
  {"id": "0", "label": "A", "yaw": -120.0, "pitch": 12.5, "y_norm": 237.5, "x_norm": 100.0}
]"#,
        )
        .unwrap();
        let store = JsonFileStore::new(dir.path());

        let loaded = store.load("legacy").unwrap();
        assert_eq!(loaded, sample()[..1].to_vec());
    }

    #[test]
    fn test_memory_store_roundtrip_and_missing() {
        let store = MemoryStore::new();

        assert!(store.load("s").unwrap().is_empty());
        assert!(!store.contains("s"));

        store.save("s", &sample()).unwrap();
        assert!(store.contains("s"));
        assert_eq!(store.load("s").unwrap(), sample());
    }
}
