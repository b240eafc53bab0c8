//! Task-graph executor — runs the per-posting node graph.
//!
//! The graph shape is data, not code: a transition table maps each node to
//! its successors, either a fixed list or a routing function over the merged
//! state. The executor runs one frontier at a time, joins every node in it,
//! merges their partial updates, and only then routes. That join is what
//! guarantees the store node never observes a half-merged fan-out.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future;
use tracing::trace;

use crate::error::PipelineError;
use crate::pipeline::state::{RunState, RunStatus, StateUpdate};

/// Node identifiers in the job-processing graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    RelevanceGate,
    ExtractMustHave,
    ExtractNiceToHave,
    Store,
    Terminal,
}

impl NodeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RelevanceGate => "relevance_gate",
            Self::ExtractMustHave => "extract_must_have",
            Self::ExtractNiceToHave => "extract_nice_to_have",
            Self::Store => "store",
            Self::Terminal => "terminal",
        }
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A graph node: reads the run state, returns the fields it sets.
///
/// Nodes absorb their own failures into documented defaults — `run` cannot
/// error. The one node allowed to report failure does so through the
/// `status` field of its update.
#[async_trait]
pub trait Node: Send + Sync {
    fn id(&self) -> NodeId;

    async fn run(&self, state: &RunState) -> StateUpdate;
}

/// Successor specification for one node.
#[derive(Clone, Copy)]
pub enum Routing {
    /// Unconditional successors. More than one means fan-out.
    Next(&'static [NodeId]),
    /// Successors chosen from the merged state after the node ran.
    Branch(fn(&RunState) -> &'static [NodeId]),
    /// No successors.
    End,
}

/// A compiled task graph: nodes plus the transition table.
pub struct TaskGraph {
    nodes: HashMap<NodeId, Arc<dyn Node>>,
    edges: HashMap<NodeId, Routing>,
    entry: NodeId,
}

impl TaskGraph {
    pub fn builder() -> TaskGraphBuilder {
        TaskGraphBuilder::default()
    }

    /// Run one posting through the graph and return the final state.
    ///
    /// Nodes sharing a frontier run concurrently and their updates are merged
    /// together before any successor is considered. Errors here mean a
    /// miswired graph, never a bad posting.
    pub async fn run(&self, mut state: RunState) -> Result<RunState, PipelineError> {
        let mut frontier = vec![self.entry];

        while !frontier.is_empty() {
            let mut pending = Vec::with_capacity(frontier.len());
            for id in &frontier {
                let node = self
                    .nodes
                    .get(id)
                    .ok_or(PipelineError::UnknownNode(*id))?;
                trace!(node = %id, "running node");
                pending.push(node.run(&state));
            }

            // Join barrier: every node in the frontier completes before any
            // update is visible.
            let updates = future::join_all(pending).await;
            for update in updates {
                state.apply(update);
            }

            let mut next: Vec<NodeId> = Vec::new();
            for id in &frontier {
                let routing = self.edges.get(id).copied().unwrap_or(Routing::End);
                let targets: &[NodeId] = match routing {
                    Routing::Next(targets) => targets,
                    Routing::Branch(route) => route(&state),
                    Routing::End => &[],
                };
                for target in targets {
                    if !next.contains(target) {
                        next.push(*target);
                    }
                }
            }
            frontier = next;
        }

        Ok(state)
    }
}

/// Builder validating the graph before execution.
#[derive(Default)]
pub struct TaskGraphBuilder {
    nodes: HashMap<NodeId, Arc<dyn Node>>,
    edges: HashMap<NodeId, Routing>,
    entry: Option<NodeId>,
}

impl TaskGraphBuilder {
    pub fn entry(mut self, id: NodeId) -> Self {
        self.entry = Some(id);
        self
    }

    pub fn node(mut self, node: Arc<dyn Node>) -> Self {
        self.nodes.insert(node.id(), node);
        self
    }

    pub fn edge(mut self, from: NodeId, routing: Routing) -> Self {
        self.edges.insert(from, routing);
        self
    }

    /// Validate and freeze the graph. Fixed edge targets must be registered
    /// nodes; routing-function targets are checked at run time.
    pub fn compile(self) -> Result<TaskGraph, PipelineError> {
        let entry = self
            .entry
            .ok_or_else(|| PipelineError::Graph("no entry point set".to_string()))?;
        if !self.nodes.contains_key(&entry) {
            return Err(PipelineError::UnknownNode(entry));
        }
        for (from, routing) in &self.edges {
            if !self.nodes.contains_key(from) {
                return Err(PipelineError::UnknownNode(*from));
            }
            if let Routing::Next(targets) = routing {
                for target in *targets {
                    if !self.nodes.contains_key(target) {
                        return Err(PipelineError::UnknownNode(*target));
                    }
                }
            }
        }
        Ok(TaskGraph {
            nodes: self.nodes,
            edges: self.edges,
            entry,
        })
    }
}

/// The terminal node: marks the run completed.
///
/// A persistence failure recorded in `status` survives — the run finished,
/// but it finished badly, and that is what the caller should see.
pub struct Terminal;

#[async_trait]
impl Node for Terminal {
    fn id(&self) -> NodeId {
        NodeId::Terminal
    }

    async fn run(&self, state: &RunState) -> StateUpdate {
        if state.status == RunStatus::Error {
            return StateUpdate::default();
        }
        StateUpdate {
            status: Some(RunStatus::Completed),
            ..Default::default()
        }
    }
}
