//! Filter & dedup stage — static criteria applied before any LLM work.
//!
//! Postings the store has already seen are excluded from both output lists:
//! they were evaluated in a prior run and re-persisting them would double
//! count. Everything else is partitioned into accepted and rejected, and
//! `accepted + rejected + duplicates` always adds up to the input.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StoreError;
use crate::model::Posting;
use crate::store::PostingStore;

/// Static filter criteria. Absent fields impose no constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub max_months_of_experience: Option<i64>,
    pub location_allows_to_apply: Option<bool>,
}

impl FilterCriteria {
    /// No constraints at all — every non-duplicate posting is accepted.
    pub fn none() -> Self {
        Self {
            max_months_of_experience: None,
            location_allows_to_apply: None,
        }
    }
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            max_months_of_experience: Some(60),
            location_allows_to_apply: Some(true),
        }
    }
}

/// Result of partitioning one batch.
#[derive(Debug, Default)]
pub struct FilterOutcome {
    /// Passed every check; goes to the task-graph executor.
    pub accepted: Vec<Posting>,
    /// Failed a criteria check; the driver persists these with
    /// `is_filtered = true` so future runs dedup them.
    pub rejected: Vec<Posting>,
    /// Already known to the store; excluded from both lists.
    pub duplicates: Vec<Posting>,
}

/// Partition a batch of postings against the criteria, consulting the store
/// for dedup. Checks short-circuit per posting: dedup, then experience, then
/// location.
///
/// Store read errors propagate — the dedup question cannot be answered
/// without the store, and guessing would re-evaluate known postings.
pub async fn partition(
    store: &dyn PostingStore,
    postings: Vec<Posting>,
    criteria: &FilterCriteria,
) -> Result<FilterOutcome, StoreError> {
    let mut outcome = FilterOutcome::default();

    for posting in postings {
        let known = store
            .get_by_external_id(&posting.external_id, Some(&posting.source))
            .await?
            .is_some()
            || store
                .has_active_by_title_and_company(&posting.title, &posting.company)
                .await?;
        if known {
            debug!(external_id = %posting.external_id, "posting already evaluated, skipping");
            outcome.duplicates.push(posting);
            continue;
        }

        if let Some(max_months) = criteria.max_months_of_experience {
            // Absent experience means no stated requirement, which satisfies
            // any maximum.
            if posting.experience_months.unwrap_or(0) > max_months {
                outcome.rejected.push(posting);
                continue;
            }
        }

        if criteria.location_allows_to_apply == Some(true) {
            let can_apply = posting
                .location
                .as_ref()
                .map(|location| location.can_apply)
                .unwrap_or(false);
            if !can_apply {
                outcome.rejected.push(posting);
                continue;
            }
        }

        outcome.accepted.push(posting);
    }

    Ok(outcome)
}
