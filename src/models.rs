//! Data models for the tell tracker.
//!
//! This module contains the core data structures used throughout
//! the application: players, cues, observations and the computed
//! aggregate and narrative results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Behavioral bucket an observation is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Bucket {
    Bluff = 1,
    Strong = 2,
    SemiBluff = 3,
    SemiStrong = 4,
}

impl Bucket {
    /// All buckets in code order.
    pub const ALL: [Bucket; 4] = [
        Bucket::Bluff,
        Bucket::Strong,
        Bucket::SemiBluff,
        Bucket::SemiStrong,
    ];

    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Bucket::Bluff),
            2 => Some(Bucket::Strong),
            3 => Some(Bucket::SemiBluff),
            4 => Some(Bucket::SemiStrong),
            _ => None,
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Bucket::Bluff => "Bluff",
            Bucket::Strong => "Strong",
            Bucket::SemiBluff => "Semi-Bluff",
            Bucket::SemiStrong => "Semi-Strong",
        }
    }

    /// Upper-case label used when describing tells to the generator.
    pub fn prompt_label(self) -> &'static str {
        match self {
            Bucket::Bluff => "BLUFF",
            Bucket::Strong => "STRONG",
            Bucket::SemiBluff => "SEMI-BLUFF",
            Bucket::SemiStrong => "SEMI-STRONG",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl TryFrom<i64> for Bucket {
    type Error = String;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Bucket::from_code(code).ok_or_else(|| format!("invalid bucket code {}", code))
    }
}

impl From<Bucket> for i64 {
    fn from(bucket: Bucket) -> Self {
        bucket.code()
    }
}

/// Small integer-coded context enums (hand outcome, tilt, stack).
///
/// Codes outside the declared range never fail a lookup; they render as
/// `"Unknown"` through [`ContextCode::label_for`].
pub trait ContextCode: Sized + Copy {
    /// Field name used in validation messages.
    const FIELD: &'static str;

    fn from_code(code: i64) -> Option<Self>;
    fn code(self) -> i64;
    fn label(self) -> &'static str;

    fn label_for(code: i64) -> &'static str {
        Self::from_code(code).map_or("Unknown", Self::label)
    }
}

/// How the hand ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum HandOutcome {
    Unknown = 0,
    Won = 1,
    Lost = 2,
    Folded = 3,
}

impl ContextCode for HandOutcome {
    const FIELD: &'static str = "hand_outcome";

    fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(HandOutcome::Unknown),
            1 => Some(HandOutcome::Won),
            2 => Some(HandOutcome::Lost),
            3 => Some(HandOutcome::Folded),
            _ => None,
        }
    }

    fn code(self) -> i64 {
        self as i64
    }

    fn label(self) -> &'static str {
        match self {
            HandOutcome::Unknown => "Unknown",
            HandOutcome::Won => "Won",
            HandOutcome::Lost => "Lost",
            HandOutcome::Folded => "Folded",
        }
    }
}

/// Emotional state of the player when the tell was seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum TiltState {
    Normal = 0,
    Slight = 1,
    Tilt = 2,
    Steaming = 3,
}

impl ContextCode for TiltState {
    const FIELD: &'static str = "tilt_state";

    fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(TiltState::Normal),
            1 => Some(TiltState::Slight),
            2 => Some(TiltState::Tilt),
            3 => Some(TiltState::Steaming),
            _ => None,
        }
    }

    fn code(self) -> i64 {
        self as i64
    }

    fn label(self) -> &'static str {
        match self {
            TiltState::Normal => "Normal",
            TiltState::Slight => "Slight tilt",
            TiltState::Tilt => "On tilt",
            TiltState::Steaming => "Steaming",
        }
    }
}

/// Stack depth at the time of the tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum StackSituation {
    Unknown = 0,
    Short = 1,
    Medium = 2,
    Deep = 3,
}

impl ContextCode for StackSituation {
    const FIELD: &'static str = "stack_situation";

    fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(StackSituation::Unknown),
            1 => Some(StackSituation::Short),
            2 => Some(StackSituation::Medium),
            3 => Some(StackSituation::Deep),
            _ => None,
        }
    }

    fn code(self) -> i64 {
        self as i64
    }

    fn label(self) -> &'static str {
        match self {
            StackSituation::Unknown => "Unknown",
            StackSituation::Short => "Short",
            StackSituation::Medium => "Medium",
            StackSituation::Deep => "Deep",
        }
    }
}

macro_rules! code_conversions {
    ($($ty:ty),*) => {
        $(
            impl TryFrom<i64> for $ty {
                type Error = String;

                fn try_from(code: i64) -> Result<Self, Self::Error> {
                    <$ty as ContextCode>::from_code(code)
                        .ok_or_else(|| format!("invalid {} code {}", <$ty as ContextCode>::FIELD, code))
                }
            }

            impl From<$ty> for i64 {
                fn from(value: $ty) -> Self {
                    value.code()
                }
            }
        )*
    };
}

code_conversions!(HandOutcome, TiltState, StackSituation);

/// A catalog entry describing one physical or verbal signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cue {
    pub id: i64,
    /// Grouping label, e.g. "hands" or "voice".
    pub zone: String,
    pub label: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// A tracked opponent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: Uuid,
    pub owner: Uuid,
    pub name: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default = "default_true")]
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

/// A free-text entry in a player's notes log. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub player_id: Uuid,
    pub owner: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A single recorded tell. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: Uuid,
    pub player_id: Uuid,
    pub owner: Uuid,
    pub bucket: Bucket,
    #[serde(default)]
    pub cue_id: Option<i64>,
    #[serde(default)]
    pub free_text: Option<String>,
    #[serde(default)]
    pub hand_outcome: Option<HandOutcome>,
    #[serde(default)]
    pub tilt_state: Option<TiltState>,
    #[serde(default)]
    pub stack_situation: Option<StackSituation>,
    pub created_at: DateTime<Utc>,
}

/// An observation joined with its cue's catalog entry.
#[derive(Debug, Clone, Serialize)]
pub struct ObservationView {
    #[serde(flatten)]
    pub observation: Observation,
    pub zone: Option<String>,
    pub cue_label: Option<String>,
}

impl ObservationView {
    pub fn join(observation: Observation, cues: &[Cue]) -> Self {
        let cue = observation
            .cue_id
            .and_then(|id| cues.iter().find(|c| c.id == id));

        Self {
            zone: cue.map(|c| c.zone.clone()),
            cue_label: cue.map(|c| c.label.clone()),
            observation,
        }
    }
}

/// Unvalidated input for recording a tell.
///
/// `bucket` is kept loose so numeric strings can be coerced by the
/// classifier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewObservation {
    pub bucket: Value,
    #[serde(default)]
    pub cue_id: Option<i64>,
    #[serde(default)]
    pub free_text: Option<String>,
    #[serde(default)]
    pub hand_outcome: Option<i64>,
    #[serde(default)]
    pub tilt_state: Option<i64>,
    #[serde(default)]
    pub stack_situation: Option<i64>,
}

/// Aggregate query input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub cue_ids: Vec<i64>,
    #[serde(default)]
    pub hand_outcome: Option<i64>,
    #[serde(default)]
    pub tilt_state: Option<i64>,
    #[serde(default)]
    pub stack_situation: Option<i64>,
}

/// Raw per-bucket counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCounts {
    #[serde(default)]
    pub bluff: u64,
    #[serde(default)]
    pub strong: u64,
    #[serde(default)]
    pub semi_bluff: u64,
    #[serde(default)]
    pub semi_strong: u64,
}

impl BucketCounts {
    pub fn from_observations<'a>(observations: impl IntoIterator<Item = &'a Observation>) -> Self {
        let mut counts = Self::default();
        for observation in observations {
            *counts.slot_mut(observation.bucket) += 1;
        }
        counts
    }

    pub fn get(&self, bucket: Bucket) -> u64 {
        match bucket {
            Bucket::Bluff => self.bluff,
            Bucket::Strong => self.strong,
            Bucket::SemiBluff => self.semi_bluff,
            Bucket::SemiStrong => self.semi_strong,
        }
    }

    fn slot_mut(&mut self, bucket: Bucket) -> &mut u64 {
        match bucket {
            Bucket::Bluff => &mut self.bluff,
            Bucket::Strong => &mut self.strong,
            Bucket::SemiBluff => &mut self.semi_bluff,
            Bucket::SemiStrong => &mut self.semi_strong,
        }
    }

    pub fn total(&self) -> u64 {
        self.bluff + self.strong + self.semi_bluff + self.semi_strong
    }
}

/// Per-bucket whole-number percentages. Not guaranteed to sum to 100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketPercentages {
    pub bluff: u64,
    pub strong: u64,
    pub semi_bluff: u64,
    pub semi_strong: u64,
}

impl BucketPercentages {
    pub fn get(&self, bucket: Bucket) -> u64 {
        match bucket {
            Bucket::Bluff => self.bluff,
            Bucket::Strong => self.strong,
            Bucket::SemiBluff => self.semi_bluff,
            Bucket::SemiStrong => self.semi_strong,
        }
    }
}

/// Result of an aggregate query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub total: u64,
    pub percentages: BucketPercentages,
    pub counts: BucketCounts,
    /// "Filtered when ..." when any context filter was active.
    pub context_message: Option<String>,
    /// Set only when nothing matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Model-written profile of a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeResult {
    pub analysis: String,
    pub tendencies: Vec<String>,
    pub exploits: Vec<String>,
}

/// Player metadata handed to the narrative prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerProfile {
    pub name: String,
    pub notes: Option<String>,
}

impl From<&Player> for PlayerProfile {
    fn from(player: &Player) -> Self {
        let notes = player.notes.trim();
        Self {
            name: player.name.clone(),
            notes: (!notes.is_empty()).then(|| notes.to_string()),
        }
    }
}

/// Everything one account owns, for export. Each list is newest first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Export {
    pub players: Vec<Player>,
    pub notes: Vec<Note>,
    pub observations: Vec<Observation>,
}
