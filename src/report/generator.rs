//! Markdown rendering of command results.
//!
//! JSON output uses the models' serde shapes directly; these functions
//! produce the human-readable alternative.

use crate::models::{
    AggregateResult, Bucket, BucketCounts, Cue, NarrativeResult, Note, ObservationView, Player,
};
use anyhow::Result;
use serde::Serialize;

/// Pretty JSON for any result.
pub fn generate_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

/// Render an aggregate query result.
pub fn generate_aggregate_report(player: &Player, result: &AggregateResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Tell Analysis: {}\n\n", player.name));

    if let Some(ref context) = result.context_message {
        output.push_str(&format!("*{}*\n\n", context));
    }

    if let Some(ref message) = result.message {
        output.push_str(message);
        output.push_str("\n\n");
        return output;
    }

    output.push_str("| Bucket | Count | Share |\n");
    output.push_str("|:---|:---:|:---:|\n");
    for bucket in Bucket::ALL {
        output.push_str(&format!(
            "| {} | {} | {}% |\n",
            bucket.label(),
            result.counts.get(bucket),
            result.percentages.get(bucket)
        ));
    }
    output.push_str(&format!("| **Total** | **{}** | |\n\n", result.total));

    output
}

/// Render the all-time bucket counts.
pub fn generate_summary_report(player: &Player, counts: &BucketCounts) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Tell Summary: {}\n\n", player.name));
    output.push_str("| Bluff | Strong | Semi-Bluff | Semi-Strong | **Total** |\n");
    output.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    output.push_str(&format!(
        "| {} | {} | {} | {} | **{}** |\n\n",
        counts.bluff,
        counts.strong,
        counts.semi_bluff,
        counts.semi_strong,
        counts.total()
    ));

    output
}

/// Render a model-written profile.
pub fn generate_narrative_report(player: &Player, narrative: &NarrativeResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Player Profile: {}\n\n", player.name));

    output.push_str("## Analysis\n\n");
    output.push_str(&narrative.analysis);
    output.push_str("\n\n");

    output.push_str(&generate_list_section("Tendencies", &narrative.tendencies));
    output.push_str(&generate_list_section("Exploits", &narrative.exploits));

    output
}

fn generate_list_section(title: &str, items: &[String]) -> String {
    if items.is_empty() {
        return String::new();
    }

    let mut section = format!("## {}\n\n", title);
    for (i, item) in items.iter().enumerate() {
        section.push_str(&format!("{}. {}\n", i + 1, item));
    }
    section.push('\n');
    section
}

/// Render a player's observation history.
pub fn generate_observation_list(player: &Player, views: &[ObservationView]) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Observations: {}\n\n", player.name));

    if views.is_empty() {
        output.push_str("No observations recorded yet.\n");
        return output;
    }

    output.push_str("| When | Bucket | Cue | Context | Note | Id |\n");
    output.push_str("|:---|:---|:---|:---|:---|:---|\n");

    for view in views {
        let obs = &view.observation;
        let cue = match (&view.zone, &view.cue_label) {
            (Some(zone), Some(label)) => format!("{} / {}", zone, label),
            _ => "-".to_string(),
        };

        output.push_str(&format!(
            "| {} | {} | {} | {} | {} | `{}` |\n",
            obs.created_at.format("%Y-%m-%d %H:%M"),
            obs.bucket.label(),
            cue,
            context_cell(view),
            obs.free_text.as_deref().unwrap_or(""),
            obs.id
        ));
    }
    output.push('\n');

    output
}

/// Render a player's notes log.
pub fn generate_note_list(player: &Player, notes: &[Note]) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Notes: {}\n\n", player.name));

    if notes.is_empty() {
        output.push_str("No notes yet.\n");
        return output;
    }

    for note in notes {
        output.push_str(&format!(
            "- **{}** {}\n",
            note.created_at.format("%Y-%m-%d %H:%M"),
            note.body
        ));
    }
    output.push('\n');

    output
}

fn context_cell(view: &ObservationView) -> String {
    use crate::models::ContextCode;

    let obs = &view.observation;
    let parts: Vec<String> = [
        obs.hand_outcome.map(|h| format!("Hand: {}", h.label())),
        obs.tilt_state.map(|t| format!("Tilt: {}", t.label())),
        obs.stack_situation.map(|s| format!("Stack: {}", s.label())),
    ]
    .into_iter()
    .flatten()
    .collect();

    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(", ")
    }
}

/// Render the cue catalog grouped by zone.
pub fn generate_cue_table(cues: &[Cue]) -> String {
    let mut output = String::new();

    output.push_str("# Cues\n\n");
    output.push_str("| Id | Zone | Label |\n");
    output.push_str("|:---:|:---|:---|\n");
    for cue in cues {
        output.push_str(&format!("| {} | {} | {} |\n", cue.id, cue.zone, cue.label));
    }
    output.push('\n');

    output
}

/// Render a player listing.
pub fn generate_player_table(players: &[Player]) -> String {
    let mut output = String::new();

    output.push_str("# Players\n\n");

    if players.is_empty() {
        output.push_str("No players found.\n");
        return output;
    }

    output.push_str("| Name | Active | Updated | Id |\n");
    output.push_str("|:---|:---:|:---|:---|\n");
    for player in players {
        output.push_str(&format!(
            "| {} | {} | {} | `{}` |\n",
            player.name,
            if player.active { "yes" } else { "no" },
            player.updated_at.format("%Y-%m-%d %H:%M"),
            player.id
        ));
    }
    output.push('\n');

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BucketPercentages, HandOutcome, Observation, TiltState};
    use chrono::Utc;
    use uuid::Uuid;

    fn player() -> Player {
        Player {
            id: Uuid::nil(),
            owner: Uuid::nil(),
            name: "Reg in seat 2".to_string(),
            notes: String::new(),
            active: true,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_aggregate_report_table() {
        let result = AggregateResult {
            total: 4,
            percentages: BucketPercentages {
                bluff: 75,
                strong: 25,
                semi_bluff: 0,
                semi_strong: 0,
            },
            counts: BucketCounts {
                bluff: 3,
                strong: 1,
                semi_bluff: 0,
                semi_strong: 0,
            },
            context_message: Some("Filtered while On tilt".to_string()),
            message: None,
        };

        let report = generate_aggregate_report(&player(), &result);
        assert!(report.contains("# Tell Analysis: Reg in seat 2"));
        assert!(report.contains("*Filtered while On tilt*"));
        assert!(report.contains("| Bluff | 3 | 75% |"));
        assert!(report.contains("| Semi-Strong | 0 | 0% |"));
        assert!(report.contains("**4**"));
    }

    #[test]
    fn test_aggregate_report_no_data() {
        let result = AggregateResult {
            total: 0,
            percentages: BucketPercentages::default(),
            counts: BucketCounts::default(),
            context_message: None,
            message: Some("No historical data for these behaviors".to_string()),
        };

        let report = generate_aggregate_report(&player(), &result);
        assert!(report.contains("No historical data"));
        assert!(!report.contains("| Bucket |"));
    }

    #[test]
    fn test_narrative_report() {
        let narrative = NarrativeResult {
            analysis: "Straightforward".to_string(),
            tendencies: vec!["Overfolds to 3-bets".to_string()],
            exploits: vec![],
        };

        let report = generate_narrative_report(&player(), &narrative);
        assert!(report.contains("## Analysis\n\nStraightforward"));
        assert!(report.contains("1. Overfolds to 3-bets"));
        assert!(!report.contains("## Exploits"));
    }

    #[test]
    fn test_observation_list() {
        let view = ObservationView {
            observation: Observation {
                id: Uuid::nil(),
                player_id: Uuid::nil(),
                owner: Uuid::nil(),
                bucket: Bucket::SemiBluff,
                cue_id: Some(13),
                free_text: Some("river jam".to_string()),
                hand_outcome: Some(HandOutcome::Won),
                tilt_state: Some(TiltState::Steaming),
                stack_situation: None,
                created_at: Utc::now(),
            },
            zone: Some("timing".to_string()),
            cue_label: Some("Instant bet".to_string()),
        };

        let list = generate_observation_list(&player(), &[view]);
        assert!(list.contains("Semi-Bluff"));
        assert!(list.contains("timing / Instant bet"));
        assert!(list.contains("Hand: Won, Tilt: Steaming"));
        assert!(list.contains("river jam"));

        let empty = generate_observation_list(&player(), &[]);
        assert!(empty.contains("No observations recorded yet."));
    }

    #[test]
    fn test_note_list() {
        let note = Note {
            id: Uuid::nil(),
            player_id: Uuid::nil(),
            owner: Uuid::nil(),
            body: "Shows bluffs when he wins".to_string(),
            created_at: Utc::now(),
        };

        let list = generate_note_list(&player(), &[note]);
        assert!(list.contains("# Notes: Reg in seat 2"));
        assert!(list.contains("Shows bluffs when he wins"));
        assert!(generate_note_list(&player(), &[]).contains("No notes yet."));
    }

    #[test]
    fn test_generate_json_uses_snake_case_keys() {
        let counts = BucketCounts {
            bluff: 1,
            strong: 0,
            semi_bluff: 2,
            semi_strong: 0,
        };
        let json = generate_json(&counts).unwrap();
        assert!(json.contains("\"semi_bluff\": 2"));
    }
}
