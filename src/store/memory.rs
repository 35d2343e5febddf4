//! In-process store.

use super::{Store, StoreData, StoreResult, TellFilter, PLAYER_LIST_LIMIT};
use crate::error::StoreError;
use crate::models::{Cue, Export, Note, Observation, Player};
use async_trait::async_trait;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<StoreData>,
}

impl MemoryStore {
    /// Empty store with the default cue catalog.
    #[cfg(test)]
    pub fn new() -> Self {
        Self::from_data(StoreData::seeded())
    }

    pub fn from_data(data: StoreData) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    /// Apply `apply` to a copy of the contents and pass the copy to `save`.
    /// The copy replaces the current contents only when `save` succeeds.
    /// The write lock is held throughout, so commits never interleave.
    pub fn commit<T>(
        &self,
        apply: impl FnOnce(&mut StoreData) -> T,
        save: impl FnOnce(&StoreData, &T) -> StoreResult<()>,
    ) -> StoreResult<T> {
        let mut data = self.write()?;
        let mut draft = data.clone();
        let outcome = apply(&mut draft);
        save(&draft, &outcome)?;
        *data = draft;
        Ok(outcome)
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> StoreResult<StoreData> {
        Ok(self.read()?.clone())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, StoreData>> {
        self.data.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, StoreData>> {
        self.data.write().map_err(|_| StoreError::Poisoned)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_player(&self, player: Player) -> StoreResult<()> {
        self.write()?.players.push(player);
        Ok(())
    }

    async fn find_player(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Player>> {
        Ok(self
            .read()?
            .players
            .iter()
            .find(|p| p.id == id && p.owner == owner)
            .cloned())
    }

    async fn list_players(&self, owner: Uuid, query: &str) -> StoreResult<Vec<Player>> {
        let needle = query.trim().to_lowercase();
        let mut players: Vec<Player> = self
            .read()?
            .players
            .iter()
            .filter(|p| p.owner == owner)
            .filter(|p| needle.is_empty() || p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();

        players.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        players.truncate(PLAYER_LIST_LIMIT);
        Ok(players)
    }

    async fn update_player_notes(&self, owner: Uuid, id: Uuid, notes: &str) -> StoreResult<bool> {
        Ok(self
            .write()?
            .update_player(owner, id, |p| p.notes = notes.to_string()))
    }

    async fn set_player_active(&self, owner: Uuid, id: Uuid, active: bool) -> StoreResult<bool> {
        Ok(self.write()?.update_player(owner, id, |p| p.active = active))
    }

    async fn insert_note(&self, note: Note) -> StoreResult<()> {
        self.write()?.notes.push(note);
        Ok(())
    }

    async fn list_notes(
        &self,
        owner: Uuid,
        player_id: Uuid,
        limit: usize,
    ) -> StoreResult<Vec<Note>> {
        let mut notes: Vec<Note> = self
            .read()?
            .notes
            .iter()
            .filter(|n| n.owner == owner && n.player_id == player_id)
            .cloned()
            .collect();

        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notes.truncate(limit);
        Ok(notes)
    }

    async fn insert_observation(&self, observation: Observation) -> StoreResult<()> {
        self.write()?.observations.push(observation);
        Ok(())
    }

    async fn find_observations(
        &self,
        owner: Uuid,
        player_id: Uuid,
        filter: &TellFilter,
    ) -> StoreResult<Vec<Observation>> {
        let mut observations: Vec<Observation> = self
            .read()?
            .observations
            .iter()
            .filter(|o| o.owner == owner && o.player_id == player_id)
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();

        observations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(observations)
    }

    async fn delete_observation(
        &self,
        owner: Uuid,
        player_id: Uuid,
        id: Uuid,
    ) -> StoreResult<bool> {
        Ok(self.write()?.delete_observation(owner, player_id, id))
    }

    async fn cues(&self) -> StoreResult<Vec<Cue>> {
        Ok(self.read()?.cues.clone())
    }

    async fn export(&self, owner: Uuid) -> StoreResult<Export> {
        Ok(self.read()?.export(owner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Bucket;
    use crate::store::NOTE_LIST_LIMIT;
    use chrono::{Duration, Utc};

    fn player(owner: Uuid, name: &str) -> Player {
        Player {
            id: Uuid::new_v4(),
            owner,
            name: name.to_string(),
            notes: String::new(),
            active: true,
            updated_at: Utc::now(),
        }
    }

    fn observation(owner: Uuid, player_id: Uuid, cue_id: i64, age_minutes: i64) -> Observation {
        Observation {
            id: Uuid::new_v4(),
            player_id,
            owner,
            bucket: Bucket::Strong,
            cue_id: Some(cue_id),
            free_text: None,
            hand_outcome: None,
            tilt_state: None,
            stack_situation: None,
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[tokio::test]
    async fn test_player_lookup_is_owner_scoped() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let p = player(alice, "Mike");
        let id = p.id;
        store.insert_player(p).await.unwrap();

        assert!(store.find_player(alice, id).await.unwrap().is_some());
        assert!(store.find_player(bob, id).await.unwrap().is_none());
        assert!(!store.update_player_notes(bob, id, "x").await.unwrap());
        assert!(!store.set_player_active(bob, id, false).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_players_filters_by_name() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        store.insert_player(player(owner, "Big Mike")).await.unwrap();
        store.insert_player(player(owner, "Sarah")).await.unwrap();
        store
            .insert_player(player(Uuid::new_v4(), "Mikey"))
            .await
            .unwrap();

        let found = store.list_players(owner, "mike").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Big Mike");
        assert_eq!(store.list_players(owner, "").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_find_observations_newest_first_and_filtered() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let player_id = Uuid::new_v4();
        let old = observation(owner, player_id, 5, 30);
        let new = observation(owner, player_id, 5, 1);
        store.insert_observation(old.clone()).await.unwrap();
        store.insert_observation(new.clone()).await.unwrap();
        store
            .insert_observation(observation(owner, player_id, 9, 2))
            .await
            .unwrap();
        store
            .insert_observation(observation(Uuid::new_v4(), player_id, 5, 0))
            .await
            .unwrap();

        let found = store
            .find_observations(owner, player_id, &TellFilter::new().cue_in([5]))
            .await
            .unwrap();
        assert_eq!(found, vec![new, old]);
    }

    #[tokio::test]
    async fn test_delete_observation_scoped() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let player_id = Uuid::new_v4();
        let obs = observation(owner, player_id, 5, 0);
        let id = obs.id;
        store.insert_observation(obs).await.unwrap();

        assert!(!store
            .delete_observation(Uuid::new_v4(), player_id, id)
            .await
            .unwrap());
        assert!(!store
            .delete_observation(owner, Uuid::new_v4(), id)
            .await
            .unwrap());
        assert!(store.delete_observation(owner, player_id, id).await.unwrap());
        assert!(!store.delete_observation(owner, player_id, id).await.unwrap());
    }

    fn note(owner: Uuid, player_id: Uuid, body: &str, age_minutes: i64) -> Note {
        Note {
            id: Uuid::new_v4(),
            player_id,
            owner,
            body: body.to_string(),
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[tokio::test]
    async fn test_list_notes_newest_first_scoped_and_capped() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let player_id = Uuid::new_v4();
        for age in 0..(NOTE_LIST_LIMIT as i64 + 5) {
            store
                .insert_note(note(owner, player_id, &format!("note {}", age), age))
                .await
                .unwrap();
        }
        store
            .insert_note(note(Uuid::new_v4(), player_id, "someone else's", 0))
            .await
            .unwrap();
        store
            .insert_note(note(owner, Uuid::new_v4(), "other player", 0))
            .await
            .unwrap();

        let notes = store
            .list_notes(owner, player_id, NOTE_LIST_LIMIT)
            .await
            .unwrap();
        assert_eq!(notes.len(), NOTE_LIST_LIMIT);
        assert_eq!(notes[0].body, "note 0");
        assert_eq!(notes[NOTE_LIST_LIMIT - 1].body, format!("note {}", NOTE_LIST_LIMIT - 1));
        assert!(notes.iter().all(|n| n.owner == owner && n.player_id == player_id));
    }

    #[tokio::test]
    async fn test_export_is_owner_scoped_and_newest_first() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let player_id = Uuid::new_v4();
        store.insert_note(note(owner, player_id, "old", 10)).await.unwrap();
        store.insert_note(note(owner, player_id, "new", 1)).await.unwrap();
        store
            .insert_note(note(Uuid::new_v4(), player_id, "hidden", 0))
            .await
            .unwrap();
        store.insert_player(player(owner, "Mike")).await.unwrap();

        let export = store.export(owner).await.unwrap();
        assert_eq!(export.players.len(), 1);
        let bodies: Vec<_> = export.notes.iter().map(|n| n.body.as_str()).collect();
        assert_eq!(bodies, vec!["new", "old"]);
    }

    #[test]
    fn test_commit_discards_draft_when_save_fails() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();

        let result = store.commit(
            |data| data.players.push(player(owner, "Ghost")),
            |_, _| Err(StoreError::Poisoned),
        );
        assert!(result.is_err());
        assert!(store.snapshot().unwrap().players.is_empty());

        store
            .commit(|data| data.players.push(player(owner, "Kept")), |_, _| Ok(()))
            .unwrap();
        assert_eq!(store.snapshot().unwrap().players.len(), 1);
    }
}
