//! Persistence node — writes the evaluated posting to the store.
//!
//! Runs exactly once per graph run, after the join barrier, so it always sees
//! the merged state of both extraction tasks. A failed write is recorded in
//! the run status, not raised: one bad posting must not abort the batch.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::model::NewPosting;
use crate::pipeline::graph::{Node, NodeId};
use crate::pipeline::state::{RunState, RunStatus, StateUpdate};
use crate::store::PostingStore;

pub struct StoreNode {
    store: Arc<dyn PostingStore>,
}

impl StoreNode {
    pub fn new(store: Arc<dyn PostingStore>) -> Self {
        Self { store }
    }

    /// Derive the create record from the merged state.
    ///
    /// Skill groups are copied only when extraction ran and found something:
    /// an empty extraction result stays absent in the record, so "evaluated,
    /// found nothing" and "never evaluated" store the same way.
    fn build_record(state: &RunState) -> NewPosting {
        let mut record = NewPosting::from_posting(&state.posting);
        record.is_relevant = state.is_relevant();
        if let Some(groups) = &state.must_have_skill_groups
            && !groups.is_empty()
        {
            record.must_have_skill_groups = Some(groups.clone());
        }
        if let Some(groups) = &state.nice_to_have_skill_groups
            && !groups.is_empty()
        {
            record.nice_to_have_skill_groups = Some(groups.clone());
        }
        record
    }
}

#[async_trait]
impl Node for StoreNode {
    fn id(&self) -> NodeId {
        NodeId::Store
    }

    async fn run(&self, state: &RunState) -> StateUpdate {
        let record = Self::build_record(state);
        match self.store.create(&record).await {
            Ok(stored) => {
                debug!(
                    external_id = %stored.external_id,
                    is_relevant = record.is_relevant,
                    "posting persisted"
                );
                StateUpdate::default()
            }
            Err(err) => {
                error!(
                    external_id = %state.posting.external_id,
                    error = %err,
                    "failed to persist posting"
                );
                StateUpdate {
                    status: Some(RunStatus::Error),
                    ..Default::default()
                }
            }
        }
    }
}
