//! Observation aggregation and statistics.
//!
//! Turns the observations that match a cue/context query into per-bucket
//! counts, whole-number percentages and a readable description of the
//! active filters.

use crate::error::{Result, TellError};
use crate::models::{
    AggregateResult, AnalyzeRequest, Bucket, BucketCounts, BucketPercentages, ContextCode,
    HandOutcome, StackSituation, TiltState,
};
use crate::store::{Store, TellFilter};
use std::collections::BTreeSet;
use tracing::debug;
use uuid::Uuid;

/// A validated aggregate query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateQuery {
    pub cue_ids: BTreeSet<i64>,
    pub hand_outcome: Option<i64>,
    pub tilt_state: Option<i64>,
    pub stack_situation: Option<i64>,
}

impl AggregateQuery {
    /// Validate a request. Fails before any store access.
    pub fn from_request(request: &AnalyzeRequest) -> Result<Self> {
        if request.cue_ids.is_empty() {
            return Err(TellError::validation("cue_ids array required"));
        }

        Ok(Self {
            cue_ids: request.cue_ids.iter().copied().collect(),
            hand_outcome: request.hand_outcome,
            tilt_state: request.tilt_state,
            stack_situation: request.stack_situation,
        })
    }

    pub fn filter(&self) -> TellFilter {
        TellFilter::new()
            .cue_in(self.cue_ids.iter().copied())
            .hand_outcome(self.hand_outcome)
            .tilt_state(self.tilt_state)
            .stack_situation(self.stack_situation)
    }

    /// Filter description, always in outcome, tilt, stack order.
    ///
    /// Empty when no context filter is active; otherwise starts with a
    /// space, e.g. `" when Won while On tilt"`.
    pub fn context_description(&self) -> String {
        let mut context = String::new();

        if let Some(code) = self.hand_outcome {
            context.push_str(&format!(" when {}", HandOutcome::label_for(code)));
        }
        if let Some(code) = self.tilt_state {
            context.push_str(&format!(" while {}", TiltState::label_for(code)));
        }
        if let Some(code) = self.stack_situation {
            context.push_str(&format!(" with {} stack", StackSituation::label_for(code)));
        }

        context
    }
}

/// Run an aggregate query for one player. Performs a single store read.
pub async fn aggregate<S: Store + ?Sized>(
    store: &S,
    owner: Uuid,
    player_id: Uuid,
    query: &AggregateQuery,
) -> Result<AggregateResult> {
    let filter = query.filter();
    let matches = store.find_observations(owner, player_id, &filter).await?;
    debug!(
        "Aggregate query with {} constraints matched {} observations",
        filter.constraints().len(),
        matches.len()
    );

    let counts = BucketCounts::from_observations(&matches);
    Ok(summarize(counts, &query.context_description()))
}

/// Build the result from raw counts and a context description.
pub fn summarize(counts: BucketCounts, context: &str) -> AggregateResult {
    let total = counts.total();
    let context_message = (!context.is_empty()).then(|| format!("Filtered{}", context));

    if total == 0 {
        return AggregateResult {
            total: 0,
            percentages: BucketPercentages::default(),
            counts: BucketCounts::default(),
            context_message,
            message: Some(format!("No historical data for these behaviors{}", context)),
        };
    }

    AggregateResult {
        total,
        percentages: percentages(&counts),
        counts,
        context_message,
        message: None,
    }
}

/// Independently rounded percentages; no adjustment toward 100.
pub fn percentages(counts: &BucketCounts) -> BucketPercentages {
    let total = counts.total();
    let pct = |bucket: Bucket| percentage(counts.get(bucket), total);

    BucketPercentages {
        bluff: pct(Bucket::Bluff),
        strong: pct(Bucket::Strong),
        semi_bluff: pct(Bucket::SemiBluff),
        semi_strong: pct(Bucket::SemiStrong),
    }
}

/// `round(count / total * 100)` with halves rounding up. Zero when
/// `total` is zero.
pub fn percentage(count: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    (200 * count + total) / (2 * total)
}
