//! JSON-file store.
//!
//! The whole document is loaded on open. Each mutation is applied to a
//! copy, the copy is written through a temporary file in the same
//! directory, and only then does it become the live state. A failed write
//! leaves both the file and the in-memory state as they were.

use super::{MemoryStore, Store, StoreData, StoreResult, TellFilter};
use crate::models::{Cue, Export, Note, Observation, Player};
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl FileStore {
    /// Open the store at `path`, starting a fresh seeded store if the
    /// file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();

        let data = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let data: StoreData = serde_json::from_str(&content)?;
            debug!(
                "Loaded store {} ({} players, {} notes, {} observations)",
                path.display(),
                data.players.len(),
                data.notes.len(),
                data.observations.len()
            );
            data
        } else {
            info!("No store at {}, starting a new one", path.display());
            StoreData::seeded()
        };

        Ok(Self {
            path,
            inner: MemoryStore::from_data(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, data: &StoreData) -> StoreResult<()> {
        let content = serde_json::to_string_pretty(data)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!("Saved store to {}", self.path.display());
        Ok(())
    }

    /// Apply a mutation that reports whether it changed anything. The file
    /// is rewritten only for changes.
    fn commit(&self, apply: impl FnOnce(&mut StoreData) -> bool) -> StoreResult<bool> {
        self.inner.commit(apply, |draft, changed| {
            if *changed {
                self.persist(draft)
            } else {
                Ok(())
            }
        })
    }
}

#[async_trait]
impl Store for FileStore {
    async fn insert_player(&self, player: Player) -> StoreResult<()> {
        self.commit(|data| {
            data.players.push(player);
            true
        })?;
        Ok(())
    }

    async fn find_player(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Player>> {
        self.inner.find_player(owner, id).await
    }

    async fn list_players(&self, owner: Uuid, query: &str) -> StoreResult<Vec<Player>> {
        self.inner.list_players(owner, query).await
    }

    async fn update_player_notes(&self, owner: Uuid, id: Uuid, notes: &str) -> StoreResult<bool> {
        self.commit(|data| data.update_player(owner, id, |p| p.notes = notes.to_string()))
    }

    async fn set_player_active(&self, owner: Uuid, id: Uuid, active: bool) -> StoreResult<bool> {
        self.commit(|data| data.update_player(owner, id, |p| p.active = active))
    }

    async fn insert_note(&self, note: Note) -> StoreResult<()> {
        self.commit(|data| {
            data.notes.push(note);
            true
        })?;
        Ok(())
    }

    async fn list_notes(
        &self,
        owner: Uuid,
        player_id: Uuid,
        limit: usize,
    ) -> StoreResult<Vec<Note>> {
        self.inner.list_notes(owner, player_id, limit).await
    }

    async fn insert_observation(&self, observation: Observation) -> StoreResult<()> {
        self.commit(|data| {
            data.observations.push(observation);
            true
        })?;
        Ok(())
    }

    async fn find_observations(
        &self,
        owner: Uuid,
        player_id: Uuid,
        filter: &TellFilter,
    ) -> StoreResult<Vec<Observation>> {
        self.inner.find_observations(owner, player_id, filter).await
    }

    async fn delete_observation(
        &self,
        owner: Uuid,
        player_id: Uuid,
        id: Uuid,
    ) -> StoreResult<bool> {
        self.commit(|data| data.delete_observation(owner, player_id, id))
    }

    async fn cues(&self) -> StoreResult<Vec<Cue>> {
        self.inner.cues().await
    }

    async fn export(&self, owner: Uuid) -> StoreResult<Export> {
        self.inner.export(owner).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use chrono::Utc;
    use tempfile::TempDir;

    fn player(owner: Uuid) -> Player {
        Player {
            id: Uuid::new_v4(),
            owner,
            name: "Villain".to_string(),
            notes: "limps a lot".to_string(),
            active: true,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_missing_file_starts_seeded() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("tells.json")).unwrap();

        assert!(!store.cues().await.unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_mutations_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tells.json");
        let owner = Uuid::new_v4();
        let p = player(owner);
        let id = p.id;

        {
            let store = FileStore::open(&path).unwrap();
            store.insert_player(p).await.unwrap();
            assert!(store.set_player_active(owner, id, false).await.unwrap());
        }

        let reopened = FileStore::open(&path).unwrap();
        let loaded = reopened.find_player(owner, id).await.unwrap().unwrap();
        assert_eq!(loaded.notes, "limps a lot");
        assert!(!loaded.active);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tells.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = FileStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_notes_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tells.json");
        let owner = Uuid::new_v4();
        let player_id = Uuid::new_v4();

        {
            let store = FileStore::open(&path).unwrap();
            store
                .insert_note(Note {
                    id: Uuid::new_v4(),
                    player_id,
                    owner,
                    body: "tanks then jams with air".to_string(),
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        let reopened = FileStore::open(&path).unwrap();
        let notes = reopened.list_notes(owner, player_id, 100).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].body, "tanks then jams with air");
    }

    #[tokio::test]
    async fn test_failed_write_leaves_memory_unchanged() {
        let dir = TempDir::new().unwrap();
        // a regular file where the store's directory should be
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let store = FileStore::open(blocker.join("tells.json")).unwrap();
        let owner = Uuid::new_v4();
        let p = player(owner);
        let id = p.id;

        let err = store.insert_player(p).await.unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
        assert!(store.find_player(owner, id).await.unwrap().is_none());
    }
}
