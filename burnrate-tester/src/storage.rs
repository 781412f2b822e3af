//! Directory-backed [`SessionStorage`]: one pretty-printed JSON file per blob.
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use burnrate_game::{CooldownMap, SessionState, SessionStorage};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

const SESSION_FILE: &str = "session.json";
const BACKGROUND_FILE: &str = "background.json";
const COOLDOWNS_FILE: &str = "cooldowns.json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    /// Files are created lazily; the directory need not exist yet.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write<T: Serialize>(&self, file: &str, value: &T) -> Result<(), StorageError> {
        let path = self.dir.join(file);
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let bytes = serde_json::to_vec_pretty(value).map_err(|source| StorageError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, bytes).map_err(|source| StorageError::Io { path, source })
    }

    fn read<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>, StorageError> {
        let path = self.dir.join(file);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| StorageError::Json { path, source })
    }

    fn remove(&self, file: &str) -> Result<(), StorageError> {
        let path = self.dir.join(file);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}

impl SessionStorage for JsonFileStorage {
    type Error = StorageError;

    fn save(&self, state: &SessionState) -> Result<(), Self::Error> {
        self.write(SESSION_FILE, state)
    }

    fn load(&self) -> Result<Option<SessionState>, Self::Error> {
        self.read(SESSION_FILE)
    }

    fn delete(&self) -> Result<(), Self::Error> {
        self.remove(SESSION_FILE)?;
        self.remove(BACKGROUND_FILE)
    }

    fn save_last_background_timestamp(&self, at: DateTime<Utc>) -> Result<(), Self::Error> {
        self.write(BACKGROUND_FILE, &at)
    }

    fn load_last_background_timestamp(&self) -> Result<Option<DateTime<Utc>>, Self::Error> {
        self.read(BACKGROUND_FILE)
    }

    fn save_cooldowns(&self, cooldowns: &CooldownMap) -> Result<(), Self::Error> {
        self.write(COOLDOWNS_FILE, cooldowns)
    }

    fn load_cooldowns(&self) -> Result<CooldownMap, Self::Error> {
        Ok(self.read(COOLDOWNS_FILE)?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burnrate_game::FounderProfile;
    use chrono::TimeZone;

    fn storage(label: &str) -> JsonFileStorage {
        let dir = std::env::temp_dir().join(format!(
            "burnrate-storage-{label}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        JsonFileStorage::new(dir)
    }

    #[test]
    fn missing_files_load_as_empty() {
        let storage = storage("empty");
        assert!(storage.load().unwrap().is_none());
        assert!(storage.load_last_background_timestamp().unwrap().is_none());
        assert!(storage.load_cooldowns().unwrap().is_empty());
        storage.delete().unwrap();
    }

    #[test]
    fn session_blobs_survive_a_new_handle() {
        let storage = storage("roundtrip");
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap();
        let mut state = SessionState::new(FounderProfile::new("Grace", "researcher", "Oslo"), now);
        state.startup.funding = 42_000;
        state.record_event("viral_tweet");
        let mut cooldowns = CooldownMap::new();
        cooldowns.insert("pitch_angels".to_string(), now);

        storage.save(&state).unwrap();
        storage.save_last_background_timestamp(now).unwrap();
        storage.save_cooldowns(&cooldowns).unwrap();

        let reopened = JsonFileStorage::new(storage.dir());
        assert_eq!(reopened.load().unwrap(), Some(state));
        assert_eq!(reopened.load_last_background_timestamp().unwrap(), Some(now));
        assert_eq!(reopened.load_cooldowns().unwrap(), cooldowns);

        reopened.delete().unwrap();
        assert!(reopened.load().unwrap().is_none());
        assert!(reopened.load_last_background_timestamp().unwrap().is_none());
        assert_eq!(reopened.load_cooldowns().unwrap(), cooldowns);
        let _ = fs::remove_dir_all(storage.dir());
    }

    #[test]
    fn corrupt_save_is_a_json_error() {
        let storage = storage("corrupt");
        fs::create_dir_all(storage.dir()).unwrap();
        fs::write(storage.dir().join(SESSION_FILE), "not json").unwrap();
        assert!(matches!(storage.load(), Err(StorageError::Json { .. })));
        let _ = fs::remove_dir_all(storage.dir());
    }
}
