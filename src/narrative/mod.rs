//! LLM-written player narratives.
//!
//! A narrative is produced with a single generation call: the prompt is
//! built from the player, the counts and the raw tell list, and the
//! response is narrowed to its JSON object and checked against the
//! three-field schema. Nothing is retried and nothing partial is returned.

pub mod client;
pub mod prompt;
pub mod recover;

pub use client::{ChatClient, ClientConfig};
use recover::parse_narrative;

use crate::error::GenerationError;
use crate::models::{BucketCounts, NarrativeResult, ObservationView, PlayerProfile};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

/// A single-shot text generation service.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, GenerationError>;
}

pub struct NarrativeSynthesizer<G> {
    generator: G,
    max_observations: usize,
    timeout: Option<Duration>,
}

impl<G: Generator> NarrativeSynthesizer<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            max_observations: prompt::DEFAULT_MAX_OBSERVATIONS,
            timeout: None,
        }
    }

    pub fn with_max_observations(mut self, max_observations: usize) -> Self {
        self.max_observations = max_observations;
        self
    }

    /// Abandon the generation call after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[cfg(test)]
    pub(crate) fn generator(&self) -> &G {
        &self.generator
    }

    pub async fn synthesize(
        &self,
        profile: &PlayerProfile,
        observations: &[ObservationView],
        counts: &BucketCounts,
    ) -> Result<NarrativeResult, GenerationError> {
        let user_prompt =
            prompt::build_prompt(profile, observations, counts, self.max_observations);
        info!(
            "Requesting narrative for {} ({} observations)",
            profile.name,
            observations.len().min(self.max_observations)
        );

        let call = self.generator.generate(prompt::SYSTEM_PROMPT, &user_prompt);
        let raw = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                GenerationError::new(format!(
                    "generation timed out after {}s",
                    limit.as_secs()
                ))
            })?,
            None => call.await,
        };

        let result = raw.and_then(|text| parse_narrative(&text));
        if let Err(ref e) = result {
            warn!("Narrative generation failed: {} (status: {:?})", e.message, e.status);
        }
        result
    }
}
