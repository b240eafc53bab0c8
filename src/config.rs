//! Configuration types.

use std::time::Duration;

use crate::filter::FilterCriteria;

/// Pipeline driver configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Static filter criteria applied before any LLM work.
    pub criteria: FilterCriteria,
    /// Candidate profile text used by the relevance gate. Empty means
    /// "no profile" — every posting passes the gate.
    pub profile_context: String,
    /// Minimum salary passed to the posting source.
    pub min_salary: i64,
    /// Employment type filter passed to the posting source.
    pub employment: String,
    /// Explicit look-back in days, used as given. `None` derives the window
    /// from the store's most recent update time, capped at
    /// [`crate::pipeline::driver::MAX_LOOKBACK_DAYS`].
    pub lookback_days: Option<i64>,
    /// Per-request timeout for source fetches.
    pub request_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            criteria: FilterCriteria::default(),
            profile_context: String::new(),
            min_salary: 4000,
            employment: "remote".to_string(),
            lookback_days: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}
