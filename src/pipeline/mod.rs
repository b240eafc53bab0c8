//! Per-posting task graph and the batch driver that feeds it.
//!
//! One graph run evaluates one posting: relevance gate, fan-out to the two
//! skill-extraction tasks, join at the persistence node, terminal. The driver
//! pages postings out of a source, runs the filter stage, and pushes each
//! accepted posting through the graph.

pub mod driver;
pub mod extract;
pub mod graph;
pub mod persist;
pub mod relevance;
pub mod state;

use std::sync::Arc;

use crate::capability::CapabilityProvider;
use crate::error::PipelineError;
use crate::store::PostingStore;

pub use driver::{BatchReport, CancelFlag, PipelineDriver, PipelineReport, RunStats};
pub use extract::{ExtractSkills, SkillKind};
pub use graph::{Node, NodeId, Routing, TaskGraph, Terminal};
pub use persist::StoreNode;
pub use relevance::{RELEVANCE_THRESHOLD, RelevanceGate};
pub use state::{RunState, RunStatus, StateUpdate};

static STORE_ONLY: [NodeId; 1] = [NodeId::Store];
static EXTRACT_BOTH: [NodeId; 2] = [NodeId::ExtractMustHave, NodeId::ExtractNiceToHave];

/// An irrelevant posting skips extraction and goes straight to the store.
/// An absent verdict reads as relevant.
fn route_after_relevance(state: &state::RunState) -> &'static [NodeId] {
    if state.is_relevant == Some(false) {
        &STORE_ONLY
    } else {
        &EXTRACT_BOTH
    }
}

/// Build the job-evaluation graph:
///
/// ```text
/// relevance_gate ──┬─▶ extract_must_have ──┬─▶ store ─▶ terminal
///                  └─▶ extract_nice_to_have ┘
///                  └────────(irrelevant)────▶ store ─▶ terminal
/// ```
pub fn job_graph(
    provider: Arc<dyn CapabilityProvider>,
    store: Arc<dyn PostingStore>,
) -> Result<TaskGraph, PipelineError> {
    TaskGraph::builder()
        .entry(NodeId::RelevanceGate)
        .node(Arc::new(RelevanceGate::new(provider.clone())))
        .node(Arc::new(ExtractSkills::new(
            provider.clone(),
            SkillKind::MustHave,
        )))
        .node(Arc::new(ExtractSkills::new(provider, SkillKind::NiceToHave)))
        .node(Arc::new(StoreNode::new(store)))
        .node(Arc::new(Terminal))
        .edge(NodeId::RelevanceGate, Routing::Branch(route_after_relevance))
        .edge(NodeId::ExtractMustHave, Routing::Next(&STORE_ONLY))
        .edge(NodeId::ExtractNiceToHave, Routing::Next(&STORE_ONLY))
        .edge(NodeId::Store, Routing::Next(&[NodeId::Terminal]))
        .edge(NodeId::Terminal, Routing::End)
        .compile()
}
