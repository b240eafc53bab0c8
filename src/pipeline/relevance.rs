//! Relevance gate — decides whether a posting matches the candidate profile.
//!
//! Deliberately lenient: a false positive costs one wasted extraction run, a
//! false negative silently drops a posting the candidate might have wanted.
//! Every failure path therefore degrades to "relevant".

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::capability::CapabilityProvider;
use crate::error::CapabilityError;
use crate::model::Posting;
use crate::pipeline::graph::{Node, NodeId};
use crate::pipeline::state::{RunState, RunStatus, StateUpdate};

/// Similarity at or above this is relevant. Boundary inclusive.
pub const RELEVANCE_THRESHOLD: f32 = 0.4;

/// Classify a similarity score. Factored out so the inclusive boundary is
/// testable without a provider.
pub(crate) fn is_relevant_score(score: f32) -> bool {
    score >= RELEVANCE_THRESHOLD
}

/// The relevance gate node. Sole writer of `is_relevant`.
pub struct RelevanceGate {
    provider: Arc<dyn CapabilityProvider>,
}

impl RelevanceGate {
    pub fn new(provider: Arc<dyn CapabilityProvider>) -> Self {
        Self { provider }
    }

    /// Evaluate one posting against the profile. Never errors.
    pub async fn evaluate(&self, state: &RunState) -> bool {
        if state.profile_context.trim().is_empty() {
            return true;
        }
        if state.posting.description.trim().is_empty() {
            return true;
        }

        match self.similarity(state).await {
            Ok(score) => {
                debug!(
                    external_id = %state.posting.external_id,
                    score,
                    "relevance similarity computed"
                );
                is_relevant_score(score)
            }
            Err(error) => {
                warn!(
                    external_id = %state.posting.external_id,
                    error = %error,
                    "relevance check failed, keeping posting"
                );
                true
            }
        }
    }

    async fn similarity(&self, state: &RunState) -> Result<f32, CapabilityError> {
        let profile = self.provider.embed(&state.profile_context).await?;
        let posting = self.provider.embed(&composite_text(&state.posting)).await?;

        cosine_similarity(&profile, &posting).ok_or_else(|| CapabilityError::InvalidResponse {
            provider: self.provider.name().to_string(),
            reason: "embeddings have mismatched dimensions or zero norm".to_string(),
        })
    }
}

#[async_trait]
impl Node for RelevanceGate {
    fn id(&self) -> NodeId {
        NodeId::RelevanceGate
    }

    async fn run(&self, state: &RunState) -> StateUpdate {
        let relevant = self.evaluate(state).await;
        StateUpdate {
            is_relevant: Some(relevant),
            status: (!relevant).then_some(RunStatus::Irrelevant),
            ..Default::default()
        }
    }
}

/// Text embedded on the posting side: title, company, and description.
fn composite_text(posting: &Posting) -> String {
    format!(
        "{}\n{}\n{}",
        posting.title, posting.company, posting.description
    )
}

/// Cosine similarity of two vectors. `None` on mismatched dimensions, empty
/// input, or a zero-norm vector.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    Some(dot / (norm_a.sqrt() * norm_b.sqrt()))
}
