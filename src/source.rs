//! Streaming posting source — pure I/O, no business logic.
//!
//! Implementations wrap a scraper or message-broker transport and page
//! through an unbounded stream of candidate postings. The driver keeps
//! fetching pages until one comes back empty.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::error::SourceError;
use crate::model::Posting;

/// Query parameters passed to every page fetch.
#[derive(Debug, Clone)]
pub struct SourceQuery {
    /// Minimum salary filter.
    pub min_salary: i64,
    /// Employment type filter (e.g. "remote").
    pub employment: String,
    /// Only postings published after this instant.
    pub posted_after: DateTime<Utc>,
    /// Per-request timeout, enforced by the source.
    pub timeout: Duration,
}

/// A paged source of candidate postings.
#[async_trait]
pub trait PostingSource: Send + Sync {
    /// Source name for logging (e.g. "djinni").
    fn name(&self) -> &str;

    /// Fetch one page of postings. Pages are 1-based; an empty page signals
    /// the end of the stream.
    async fn fetch_page(
        &self,
        query: &SourceQuery,
        page: u32,
    ) -> Result<Vec<Posting>, SourceError>;
}
