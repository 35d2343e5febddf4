//! Prompt construction for player narratives.

use crate::models::{
    BucketCounts, ContextCode, HandOutcome, ObservationView, PlayerProfile, StackSituation,
};

/// Default cap on the number of observations listed in a prompt.
pub const DEFAULT_MAX_OBSERVATIONS: usize = 50;

/// System instruction sent with every narrative request.
pub const SYSTEM_PROMPT: &str = "You are an expert poker analyst with deep knowledge of player \
profiling, behavioral analysis, and game theory optimal play. You MUST respond only with valid \
JSON. No additional text.";

/// Placeholder for observations recorded without a cue.
const NO_CUE_LABEL: &str = "General observation";

/// Build the user prompt. Deterministic for identical input.
pub fn build_prompt(
    profile: &PlayerProfile,
    observations: &[ObservationView],
    counts: &BucketCounts,
    max_observations: usize,
) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "You are an expert poker analyst. Analyze this player's behavior patterns and provide actionable insights.\n\n",
    );
    prompt.push_str(&format!("Player: {}\n", profile.name));
    prompt.push_str(&format!(
        "Notes: {}\n\n",
        profile.notes.as_deref().unwrap_or("None")
    ));

    prompt.push_str("Behavior Summary:\n");
    prompt.push_str(&format!("- BLUFF observations: {}\n", counts.bluff));
    prompt.push_str(&format!("- STRONG observations: {}\n", counts.strong));
    prompt.push_str(&format!("- SEMI-BLUFF observations: {}\n", counts.semi_bluff));
    prompt.push_str(&format!("- SEMI-STRONG observations: {}\n", counts.semi_strong));
    prompt.push_str(&format!("Total observations: {}\n\n", counts.total()));

    if !observations.is_empty() {
        prompt.push_str("Detailed Observations:\n");
        for (idx, view) in observations.iter().take(max_observations).enumerate() {
            prompt.push_str(&format!("{}. {}\n", idx + 1, describe_observation(view)));
        }
    }

    prompt.push_str("\nProvide:\n");
    prompt.push_str("1. A comprehensive analysis of their playing style and decision patterns\n");
    prompt.push_str("2. Key tendencies and patterns you've identified\n");
    prompt.push_str("3. Specific exploitable weaknesses and how to exploit them\n");
    prompt.push_str("\nIMPORTANT: You MUST respond ONLY with valid JSON in this exact format:\n");
    prompt.push_str("{\n");
    prompt.push_str("  \"analysis\": \"your comprehensive analysis here\",\n");
    prompt.push_str("  \"tendencies\": [\"tendency 1\", \"tendency 2\", \"tendency 3\"],\n");
    prompt.push_str("  \"exploits\": [\"exploit 1\", \"exploit 2\", \"exploit 3\"]\n");
    prompt.push_str("}\n");
    prompt.push_str(
        "Do not include any text before or after the JSON. Only return the JSON object.\n",
    );

    prompt
}

/// One observation line without its ordinal, e.g.
/// `BLUFF - Instant bet [Hand: Won] [Tilt: Normal]`.
///
/// Outcome and stack are left out when recorded as Unknown; every tilt
/// state, Normal included, is shown.
fn describe_observation(view: &ObservationView) -> String {
    let obs = &view.observation;
    let mut line = format!(
        "{} - {}",
        obs.bucket.prompt_label(),
        view.cue_label.as_deref().unwrap_or(NO_CUE_LABEL)
    );

    if let Some(outcome) = obs.hand_outcome.filter(|h| *h != HandOutcome::Unknown) {
        line.push_str(&format!(" [Hand: {}]", outcome.label()));
    }
    if let Some(tilt) = obs.tilt_state {
        line.push_str(&format!(" [Tilt: {}]", tilt.label()));
    }
    if let Some(stack) = obs.stack_situation.filter(|s| *s != StackSituation::Unknown) {
        line.push_str(&format!(" [Stack: {}]", stack.label()));
    }
    if let Some(text) = &obs.free_text {
        line.push_str(&format!(" [Note: {}]", text));
    }

    line
}
