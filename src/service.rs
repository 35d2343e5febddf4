//! Owner-scoped operations over the store.
//!
//! Every method takes the caller's account id and treats records owned by
//! anyone else as missing. Input is validated before the store is touched.

use crate::analysis::{aggregate, classify, validate_context, AggregateQuery};
use crate::error::{Result, TellError};
use crate::models::{
    AggregateResult, AnalyzeRequest, BucketCounts, Cue, Export, HandOutcome, NarrativeResult,
    NewObservation, Note, Observation, ObservationView, Player, PlayerProfile, StackSituation,
    TiltState,
};
use crate::narrative::{Generator, NarrativeSynthesizer};
use crate::store::{Store, TellFilter, NOTE_LIST_LIMIT};
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

/// Default cap on observation free text, in characters.
pub const DEFAULT_MAX_FREE_TEXT: usize = 500;

pub struct Tellbook<S> {
    store: S,
    max_free_text: usize,
}

/// Parse a record id, rejecting anything that is not a UUID.
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| TellError::validation(format!("invalid {}", what)))
}

impl<S: Store> Tellbook<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_free_text: DEFAULT_MAX_FREE_TEXT,
        }
    }

    pub fn with_max_free_text(mut self, max_free_text: usize) -> Self {
        self.max_free_text = max_free_text;
        self
    }

    async fn resolve_player(&self, owner: Uuid, id: Uuid) -> Result<Player> {
        self.store
            .find_player(owner, id)
            .await?
            .ok_or(TellError::NotFound)
    }

    // ---- players ----

    pub async fn add_player(&self, owner: Uuid, name: &str, notes: Option<&str>) -> Result<Player> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TellError::validation("name_required"));
        }

        let player = Player {
            id: Uuid::new_v4(),
            owner,
            name: name.to_string(),
            notes: notes.unwrap_or_default().to_string(),
            active: true,
            updated_at: Utc::now(),
        };
        self.store.insert_player(player.clone()).await?;
        info!("Added player {} ({})", player.name, player.id);
        Ok(player)
    }

    pub async fn get_player(&self, owner: Uuid, id: &str) -> Result<Player> {
        let id = parse_id(id, "id")?;
        self.resolve_player(owner, id).await
    }

    pub async fn list_players(&self, owner: Uuid, query: &str) -> Result<Vec<Player>> {
        Ok(self.store.list_players(owner, query).await?)
    }

    pub async fn update_notes(&self, owner: Uuid, id: &str, notes: &str) -> Result<()> {
        let id = parse_id(id, "id")?;
        if !self.store.update_player_notes(owner, id, notes).await? {
            return Err(TellError::NotFound);
        }
        Ok(())
    }

    /// Soft delete.
    pub async fn remove_player(&self, owner: Uuid, id: &str) -> Result<()> {
        self.set_active(owner, id, false).await
    }

    pub async fn restore_player(&self, owner: Uuid, id: &str) -> Result<()> {
        self.set_active(owner, id, true).await
    }

    async fn set_active(&self, owner: Uuid, id: &str, active: bool) -> Result<()> {
        let id = parse_id(id, "id")?;
        if !self.store.set_player_active(owner, id, active).await? {
            return Err(TellError::NotFound);
        }
        Ok(())
    }

    // ---- notes log ----

    /// Append a note to a player's log. Returns the new note's id.
    pub async fn add_note(&self, owner: Uuid, player_id: &str, body: &str) -> Result<Uuid> {
        let player_id = parse_id(player_id, "id")?;
        let body = body.trim();
        if body.is_empty() {
            return Err(TellError::validation("body_required"));
        }

        self.resolve_player(owner, player_id).await?;

        let note = Note {
            id: Uuid::new_v4(),
            player_id,
            owner,
            body: body.to_string(),
            created_at: Utc::now(),
        };
        let id = note.id;
        self.store.insert_note(note).await?;
        debug!("Added note {} for {}", id, player_id);
        Ok(id)
    }

    /// The player's most recent notes, newest first.
    pub async fn list_notes(&self, owner: Uuid, player_id: &str) -> Result<Vec<Note>> {
        let player_id = parse_id(player_id, "id")?;
        self.resolve_player(owner, player_id).await?;
        Ok(self
            .store
            .list_notes(owner, player_id, NOTE_LIST_LIMIT)
            .await?)
    }

    // ---- cues ----

    /// Active cues ordered by zone, then label.
    pub async fn list_cues(&self) -> Result<Vec<Cue>> {
        let mut cues: Vec<Cue> = self
            .store
            .cues()
            .await?
            .into_iter()
            .filter(|c| c.active)
            .collect();
        cues.sort_by(|a, b| a.zone.cmp(&b.zone).then_with(|| a.label.cmp(&b.label)));
        Ok(cues)
    }

    // ---- observations ----

    pub async fn record_observation(
        &self,
        owner: Uuid,
        player_id: &str,
        input: NewObservation,
    ) -> Result<Uuid> {
        let player_id = parse_id(player_id, "id")?;
        let bucket = classify(&input.bucket)?;
        let hand_outcome = validate_context::<HandOutcome>(input.hand_outcome)?;
        let tilt_state = validate_context::<TiltState>(input.tilt_state)?;
        let stack_situation = validate_context::<StackSituation>(input.stack_situation)?;
        let free_text = self.normalize_free_text(input.free_text)?;

        self.resolve_player(owner, player_id).await?;

        if let Some(cue_id) = input.cue_id {
            let cues = self.store.cues().await?;
            if !cues.iter().any(|c| c.id == cue_id) {
                return Err(TellError::validation(format!("unknown cue_id {}", cue_id)));
            }
        }

        let observation = Observation {
            id: Uuid::new_v4(),
            player_id,
            owner,
            bucket,
            cue_id: input.cue_id,
            free_text,
            hand_outcome,
            tilt_state,
            stack_situation,
            created_at: Utc::now(),
        };
        let id = observation.id;
        self.store.insert_observation(observation).await?;
        debug!("Recorded {} observation {} for {}", bucket, id, player_id);
        Ok(id)
    }

    fn normalize_free_text(&self, text: Option<String>) -> Result<Option<String>> {
        let text = match text.as_deref().map(str::trim) {
            None | Some("") => return Ok(None),
            Some(text) => text,
        };
        if text.chars().count() > self.max_free_text {
            return Err(TellError::validation(format!(
                "free_text must be at most {} characters",
                self.max_free_text
            )));
        }
        Ok(Some(text.to_string()))
    }

    /// All observations of a player, newest first, joined with their cues.
    pub async fn list_observations(
        &self,
        owner: Uuid,
        player_id: &str,
    ) -> Result<Vec<ObservationView>> {
        let player_id = parse_id(player_id, "id")?;
        self.resolve_player(owner, player_id).await?;
        self.observation_views(owner, player_id).await
    }

    async fn observation_views(&self, owner: Uuid, player_id: Uuid) -> Result<Vec<ObservationView>> {
        let observations = self
            .store
            .find_observations(owner, player_id, &TellFilter::new())
            .await?;
        let cues = self.store.cues().await?;

        Ok(observations
            .into_iter()
            .map(|o| ObservationView::join(o, &cues))
            .collect())
    }

    /// Counts over every observation of the player.
    pub async fn bucket_summary(&self, owner: Uuid, player_id: &str) -> Result<BucketCounts> {
        let player_id = parse_id(player_id, "id")?;
        self.resolve_player(owner, player_id).await?;
        let observations = self
            .store
            .find_observations(owner, player_id, &TellFilter::new())
            .await?;
        Ok(BucketCounts::from_observations(&observations))
    }

    pub async fn delete_observation(
        &self,
        owner: Uuid,
        player_id: &str,
        observation_id: &str,
    ) -> Result<()> {
        let player_id = parse_id(player_id, "player id")?;
        let observation_id = parse_id(observation_id, "observation id")?;
        if !self
            .store
            .delete_observation(owner, player_id, observation_id)
            .await?
        {
            return Err(TellError::NotFound);
        }
        Ok(())
    }

    // ---- analysis ----

    /// Contextual bucket statistics for the given cues.
    pub async fn analyze(
        &self,
        owner: Uuid,
        player_id: &str,
        request: &AnalyzeRequest,
    ) -> Result<AggregateResult> {
        let player_id = parse_id(player_id, "id")?;
        let query = AggregateQuery::from_request(request)?;
        self.resolve_player(owner, player_id).await?;
        aggregate(&self.store, owner, player_id, &query).await
    }

    /// Model-written profile built from the player's full history.
    pub async fn narrate<G: Generator>(
        &self,
        owner: Uuid,
        player_id: &str,
        synthesizer: &NarrativeSynthesizer<G>,
    ) -> Result<NarrativeResult> {
        let player_id = parse_id(player_id, "id")?;
        let player = self.resolve_player(owner, player_id).await?;
        let views = self.observation_views(owner, player_id).await?;
        let counts = BucketCounts::from_observations(views.iter().map(|v| &v.observation));

        let narrative = synthesizer
            .synthesize(&PlayerProfile::from(&player), &views, &counts)
            .await?;
        Ok(narrative)
    }

    pub async fn export(&self, owner: Uuid) -> Result<Export> {
        Ok(self.store.export(owner).await?)
    }
}
