//! Typed observation filters.
//!
//! A [`TellFilter`] is a conjunction of independently optional equality
//! constraints. Backends evaluate it with [`TellFilter::matches`].

use crate::models::{ContextCode, Observation};
use std::collections::BTreeSet;

/// One equality constraint over an observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Cue must be one of the set. Observations without a cue never match.
    CueIn(BTreeSet<i64>),
    HandOutcome(i64),
    TiltState(i64),
    StackSituation(i64),
}

impl Constraint {
    pub fn matches(&self, observation: &Observation) -> bool {
        match self {
            Constraint::CueIn(ids) => observation.cue_id.is_some_and(|id| ids.contains(&id)),
            Constraint::HandOutcome(code) => {
                observation.hand_outcome.map(ContextCode::code) == Some(*code)
            }
            Constraint::TiltState(code) => {
                observation.tilt_state.map(ContextCode::code) == Some(*code)
            }
            Constraint::StackSituation(code) => {
                observation.stack_situation.map(ContextCode::code) == Some(*code)
            }
        }
    }
}

/// Conjunctive filter. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TellFilter {
    constraints: Vec<Constraint>,
}

impl TellFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cue_in(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.constraints
            .push(Constraint::CueIn(ids.into_iter().collect()));
        self
    }

    pub fn hand_outcome(self, code: Option<i64>) -> Self {
        self.push_optional(code.map(Constraint::HandOutcome))
    }

    pub fn tilt_state(self, code: Option<i64>) -> Self {
        self.push_optional(code.map(Constraint::TiltState))
    }

    pub fn stack_situation(self, code: Option<i64>) -> Self {
        self.push_optional(code.map(Constraint::StackSituation))
    }

    fn push_optional(mut self, constraint: Option<Constraint>) -> Self {
        if let Some(constraint) = constraint {
            self.constraints.push(constraint);
        }
        self
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn matches(&self, observation: &Observation) -> bool {
        self.constraints.iter().all(|c| c.matches(observation))
    }
}
