//! Per-posting run state and the sparse updates nodes contribute to it.

use serde::{Deserialize, Serialize};

use crate::model::{Posting, SkillGroups};

/// Progress tag carried through the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Started,
    Irrelevant,
    Completed,
    Error,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Irrelevant => "irrelevant",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unit of data threaded through the task graph for one posting.
///
/// Owned exclusively by one executor invocation; nodes read it immutably and
/// return a [`StateUpdate`], which the executor merges. No node ever observes
/// a half-merged state: fan-out updates are applied together after the join.
#[derive(Debug, Clone)]
pub struct RunState {
    pub posting: Posting,
    pub status: RunStatus,
    /// Candidate profile text. Empty means no profile is configured.
    pub profile_context: String,
    /// Set by the relevance gate only. Absent reads as relevant.
    pub is_relevant: Option<bool>,
    pub must_have_skill_groups: Option<SkillGroups>,
    pub nice_to_have_skill_groups: Option<SkillGroups>,
}

impl RunState {
    pub fn new(posting: Posting, profile_context: String) -> Self {
        Self {
            posting,
            status: RunStatus::Started,
            profile_context,
            is_relevant: None,
            must_have_skill_groups: None,
            nice_to_have_skill_groups: None,
        }
    }

    /// `is_relevant` with the lenient default applied: not yet evaluated
    /// counts as relevant.
    pub fn is_relevant(&self) -> bool {
        self.is_relevant.unwrap_or(true)
    }

    /// Merge a node's partial update. Only fields the node set are written;
    /// a set field can never be un-set by a later node.
    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(is_relevant) = update.is_relevant {
            self.is_relevant = Some(is_relevant);
        }
        if let Some(groups) = update.must_have_skill_groups {
            self.must_have_skill_groups = Some(groups);
        }
        if let Some(groups) = update.nice_to_have_skill_groups {
            self.nice_to_have_skill_groups = Some(groups);
        }
    }
}

/// The sparse set of fields one node contributes to the merged run state.
///
/// No two nodes share a target key other than `status`, so merge order within
/// a fan-out is irrelevant.
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub status: Option<RunStatus>,
    pub is_relevant: Option<bool>,
    pub must_have_skill_groups: Option<SkillGroups>,
    pub nice_to_have_skill_groups: Option<SkillGroups>,
}
