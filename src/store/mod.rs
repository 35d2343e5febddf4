//! Persistence for players, observations and the cue catalog.
//!
//! Every read and write is keyed by the owning account; a record that
//! belongs to someone else is indistinguishable from one that does not
//! exist.

pub mod file;
pub mod filter;
pub mod memory;

pub use file::FileStore;
pub use filter::TellFilter;
pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::models::{Cue, Export, Note, Observation, Player};
use chrono::Utc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Maximum number of players returned by a listing.
pub const PLAYER_LIST_LIMIT: usize = 200;

/// Maximum number of notes returned for one player.
pub const NOTE_LIST_LIMIT: usize = 100;

#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_player(&self, player: Player) -> StoreResult<()>;

    async fn find_player(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Player>>;

    /// Players whose name contains `query` (case-insensitive), most
    /// recently updated first, capped at [`PLAYER_LIST_LIMIT`].
    async fn list_players(&self, owner: Uuid, query: &str) -> StoreResult<Vec<Player>>;

    /// Returns `false` when no player matched.
    async fn update_player_notes(&self, owner: Uuid, id: Uuid, notes: &str) -> StoreResult<bool>;

    /// Returns `false` when no player matched.
    async fn set_player_active(&self, owner: Uuid, id: Uuid, active: bool) -> StoreResult<bool>;

    async fn insert_note(&self, note: Note) -> StoreResult<()>;

    /// Notes of one player, newest first, at most `limit`.
    async fn list_notes(
        &self,
        owner: Uuid,
        player_id: Uuid,
        limit: usize,
    ) -> StoreResult<Vec<Note>>;

    async fn insert_observation(&self, observation: Observation) -> StoreResult<()>;

    /// Observations of one player matching `filter`, newest first.
    async fn find_observations(
        &self,
        owner: Uuid,
        player_id: Uuid,
        filter: &TellFilter,
    ) -> StoreResult<Vec<Observation>>;

    /// Returns `false` when no observation matched.
    async fn delete_observation(
        &self,
        owner: Uuid,
        player_id: Uuid,
        id: Uuid,
    ) -> StoreResult<bool>;

    /// The whole catalog, active or not.
    async fn cues(&self) -> StoreResult<Vec<Cue>>;

    /// Everything `owner` has, each list newest first.
    async fn export(&self, owner: Uuid) -> StoreResult<Export>;
}

/// Serialized form of a store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub observations: Vec<Observation>,
    #[serde(default)]
    pub cues: Vec<Cue>,
}

impl StoreData {
    /// Empty store with the default cue catalog.
    pub fn seeded() -> Self {
        Self {
            cues: default_catalog(),
            ..Self::default()
        }
    }

    /// Apply `apply` to the owner's player and bump `updated_at`.
    /// Returns `false` when no player matched.
    pub fn update_player(
        &mut self,
        owner: Uuid,
        id: Uuid,
        apply: impl FnOnce(&mut Player),
    ) -> bool {
        match self
            .players
            .iter_mut()
            .find(|p| p.id == id && p.owner == owner)
        {
            Some(player) => {
                apply(player);
                player.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Returns `false` when no observation matched.
    pub fn delete_observation(&mut self, owner: Uuid, player_id: Uuid, id: Uuid) -> bool {
        let before = self.observations.len();
        self.observations
            .retain(|o| !(o.id == id && o.player_id == player_id && o.owner == owner));
        self.observations.len() < before
    }

    pub fn export(&self, owner: Uuid) -> Export {
        let mut export = Export {
            players: self.players.iter().filter(|p| p.owner == owner).cloned().collect(),
            notes: self.notes.iter().filter(|n| n.owner == owner).cloned().collect(),
            observations: self
                .observations
                .iter()
                .filter(|o| o.owner == owner)
                .cloned()
                .collect(),
        };
        export.players.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        export.notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        export.observations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        export
    }
}

/// Cue catalog seeded into new stores.
pub fn default_catalog() -> Vec<Cue> {
    let entries: [(&str, &str); 24] = [
        ("hands", "Shaking hands"),
        ("hands", "Chip shuffling stops"),
        ("hands", "Protects cards"),
        ("hands", "Reaches for chips early"),
        ("eyes", "Stares at opponent"),
        ("eyes", "Looks away"),
        ("eyes", "Glances at chips"),
        ("eyes", "Rechecks hole cards"),
        ("voice", "Talkative"),
        ("voice", "Sudden silence"),
        ("voice", "Pitch change"),
        ("voice", "Explains the bet"),
        ("timing", "Instant bet"),
        ("timing", "Long tank"),
        ("timing", "Instant call"),
        ("timing", "Hollywood pause"),
        ("posture", "Leans forward"),
        ("posture", "Leans back"),
        ("posture", "Frozen"),
        ("posture", "Slumps"),
        ("breathing", "Holds breath"),
        ("breathing", "Heavy breathing"),
        ("breathing", "Neck pulse visible"),
        ("breathing", "Sighs"),
    ];

    entries
        .iter()
        .zip(1..)
        .map(|((zone, label), id)| Cue {
            id,
            zone: zone.to_string(),
            label: label.to_string(),
            active: true,
        })
        .collect()
}
