//! State file persistence.
//!
//! The whole store is one JSON document. Writes go to a sibling temp file
//! first and are renamed into place, so an interrupted save never leaves a
//! truncated state file behind.
//!
//! Each command reads, mutates and rewrites the whole document, so two
//! seatctl processes must not interleave. A command holds an exclusive
//! advisory lock on `<state>.lock` from before its load until after its
//! save; a second command blocks until the first one exits.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use seatplan_engine::{MemoryStore, StoreState};
use tracing::debug;

/// Exclusive hold on the state file, released on drop.
#[derive(Debug)]
pub struct StateLock {
    _file: File,
}

/// Location of the persisted store.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling lock file, e.g. `state.json.lock`.
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("state"));
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Block until no other process holds the state, then hold it until the
    /// returned guard is dropped.
    pub fn lock(&self) -> Result<StateLock> {
        self.ensure_dir()?;
        let path = self.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("Failed to open state lock {:?}", path))?;
        file.lock()
            .with_context(|| format!("Failed to lock state at {:?}", path))?;

        debug!(lock = %path.display(), "State locked");
        Ok(StateLock { _file: file })
    }

    fn ensure_dir(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory {:?}", dir))?;
        }
        Ok(())
    }

    /// Load the store, starting empty if the file does not exist yet.
    pub fn load(&self) -> Result<MemoryStore> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No state file yet, starting empty");
            return Ok(MemoryStore::new());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read state from {:?}", self.path))?;
        let state: StoreState = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse state from {:?}", self.path))?;

        debug!(
            path = %self.path.display(),
            batches = state.batches.len(),
            rooms = state.rooms.len(),
            "State loaded"
        );
        Ok(MemoryStore::from_state(state))
    }

    /// Persist the store.
    pub fn save(&self, store: &MemoryStore) -> Result<()> {
        self.ensure_dir()?;

        let contents = serde_json::to_string_pretty(&store.snapshot())?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)
            .with_context(|| format!("Failed to write state to {:?}", tmp))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace state at {:?}", self.path))?;

        debug!(path = %self.path.display(), "State saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatplan_engine::{NewBatch, Room};
    use seatplan_id::RoomCode;

    #[test]
    fn test_missing_state_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateFile::new(dir.path().join("state.json"));
        let store = state.load().unwrap();
        assert!(store.list_batches().is_empty());
        assert!(store.rooms().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateFile::new(dir.path().join("data").join("state.json"));

        let store = MemoryStore::new();
        store.create_batch(NewBatch::default()).unwrap();
        store
            .add_room(Room::new(RoomCode::parse("G01").unwrap(), 30).unwrap())
            .unwrap();
        state.save(&store).unwrap();

        let reloaded = state.load().unwrap();
        assert_eq!(reloaded.snapshot(), store.snapshot());
        assert!(!dir.path().join("data").join("state.json.tmp").exists());
    }

    #[test]
    fn test_lock_file_sits_beside_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateFile::new(dir.path().join("nested").join("state.json"));
        assert_eq!(
            state.lock_path(),
            dir.path().join("nested").join("state.json.lock")
        );

        let guard = state.lock().unwrap();
        assert!(state.lock_path().exists());
        assert!(!state.path().exists());
        drop(guard);

        // Released on drop, so it can be taken again.
        state.lock().unwrap();
    }

    #[test]
    fn test_lock_is_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateFile::new(dir.path().join("state.json"));
        let guard = state.lock().unwrap();

        let other = File::open(state.lock_path()).unwrap();
        assert!(other.try_lock().is_err());

        drop(guard);
        other.try_lock().unwrap();
    }

    #[test]
    fn test_corrupt_state_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();

        let err = StateFile::new(path).load().unwrap_err();
        assert!(err.to_string().contains("Failed to parse state"));
    }
}
