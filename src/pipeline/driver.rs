//! Batch driver — pages postings out of a source and runs each accepted one
//! through the task graph.
//!
//! Two consumption modes over the same plumbing: [`PipelineDriver::run_batches`]
//! yields one report per source page as it completes, and
//! [`PipelineDriver::run`] drains that stream into a single summary.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Duration, Utc};
use futures::stream::{Stream, TryStreamExt};
use tracing::{info, warn};

use crate::capability::CapabilityProvider;
use crate::config::PipelineConfig;
use crate::error::{Error, StoreError};
use crate::filter::{self, FilterOutcome};
use crate::model::{NewPosting, Posting};
use crate::pipeline::state::RunState;
use crate::pipeline::{TaskGraph, job_graph};
use crate::source::{PostingSource, SourceQuery};
use crate::store::PostingStore;

/// Upper bound on the auto-derived look-back window, in days. Re-scraping
/// old pages mostly yields duplicates, so an idle store must not trigger a
/// multi-week scrape. An explicit caller-supplied window is not bounded.
pub const MAX_LOOKBACK_DAYS: i64 = 5;

/// Cooperative cancellation handle shared between the driver and its caller.
///
/// Checked at batch boundaries and between postings; the posting in flight
/// always finishes, so the store never holds a half-evaluated record.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counters for one batch, or the whole run once accumulated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Postings fetched from the source.
    pub scraped: usize,
    /// Postings that survived filter and dedup.
    pub passed_filter: usize,
    /// Postings that went through the task graph.
    pub processed: usize,
    /// Processed postings judged relevant.
    pub relevant: usize,
}

impl RunStats {
    fn absorb(&mut self, other: RunStats) {
        self.scraped += other.scraped;
        self.passed_filter += other.passed_filter;
        self.processed += other.processed;
        self.relevant += other.relevant;
    }
}

/// One source page, fully evaluated.
#[derive(Debug)]
pub struct BatchReport {
    /// 1-based source page this batch came from.
    pub page: u32,
    /// Final graph state of every accepted posting in the page.
    pub states: Vec<RunState>,
    /// Counters for this page only.
    pub stats: RunStats,
}

/// Aggregate of a whole driver run.
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub stats: RunStats,
    pub states: Vec<RunState>,
}

/// Orchestrates source paging, the filter stage, and graph execution.
pub struct PipelineDriver {
    source: Arc<dyn PostingSource>,
    store: Arc<dyn PostingStore>,
    config: PipelineConfig,
    graph: TaskGraph,
    cancel: CancelFlag,
}

impl PipelineDriver {
    pub fn new(
        source: Arc<dyn PostingSource>,
        store: Arc<dyn PostingStore>,
        provider: Arc<dyn CapabilityProvider>,
        config: PipelineConfig,
    ) -> Result<Self, Error> {
        let graph = job_graph(provider, store.clone())?;
        Ok(Self {
            source,
            store,
            config,
            graph,
            cancel: CancelFlag::new(),
        })
    }

    /// Handle for cancelling this driver from another task.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Start of the scrape window.
    ///
    /// An explicit `lookback_days` wins and is used as given. Otherwise the
    /// window starts at the store's most recent update time, but never
    /// further back than [`MAX_LOOKBACK_DAYS`].
    async fn posted_after(&self) -> Result<DateTime<Utc>, StoreError> {
        if let Some(days) = self.config.lookback_days {
            return Ok(Utc::now() - Duration::days(days));
        }
        let floor = Utc::now() - Duration::days(MAX_LOOKBACK_DAYS);
        Ok(match self.store.most_recent_update_time().await? {
            Some(last_update) => last_update.max(floor),
            None => floor,
        })
    }

    async fn build_query(&self) -> Result<SourceQuery, Error> {
        let posted_after = self.posted_after().await?;
        info!(
            source = self.source.name(),
            %posted_after,
            min_salary = self.config.min_salary,
            employment = %self.config.employment,
            "starting pipeline run"
        );
        Ok(SourceQuery {
            min_salary: self.config.min_salary,
            employment: self.config.employment.clone(),
            posted_after,
            timeout: self.config.request_timeout,
        })
    }

    /// Persist filter rejects so future runs dedup them. Best effort: a
    /// failed write is logged and the batch continues.
    async fn persist_rejected(&self, rejected: &[Posting]) {
        for posting in rejected {
            let record = NewPosting::from_posting(posting).filtered();
            if let Err(err) = self.store.create(&record).await {
                warn!(
                    external_id = %posting.external_id,
                    error = %err,
                    "failed to persist filtered posting"
                );
            }
        }
    }

    async fn process_batch(&self, page: u32, postings: Vec<Posting>) -> Result<BatchReport, Error> {
        let mut stats = RunStats {
            scraped: postings.len(),
            ..Default::default()
        };

        let FilterOutcome {
            accepted,
            rejected,
            duplicates,
        } = filter::partition(self.store.as_ref(), postings, &self.config.criteria).await?;
        self.persist_rejected(&rejected).await;
        stats.passed_filter = accepted.len();
        info!(
            page,
            scraped = stats.scraped,
            accepted = accepted.len(),
            rejected = rejected.len(),
            duplicates = duplicates.len(),
            "batch filtered"
        );

        let mut states = Vec::with_capacity(accepted.len());
        for posting in accepted {
            if self.cancel.is_cancelled() {
                info!(page, "cancellation requested, stopping mid-batch");
                break;
            }
            let state = RunState::new(posting, self.config.profile_context.clone());
            let final_state = self.graph.run(state).await?;
            stats.processed += 1;
            if final_state.is_relevant() {
                stats.relevant += 1;
            }
            states.push(final_state);
        }

        Ok(BatchReport {
            page,
            states,
            stats,
        })
    }

    /// Stream of per-page batch reports. Lazy: each page is fetched only
    /// when the consumer polls for it, and dropping the stream stops the
    /// scrape.
    pub fn run_batches(&self) -> impl Stream<Item = Result<BatchReport, Error>> + '_ {
        futures::stream::try_unfold(
            (1u32, None::<SourceQuery>),
            move |(page, query)| async move {
                if self.cancel.is_cancelled() {
                    info!("cancellation requested, stopping before page fetch");
                    return Ok(None);
                }
                let query = match query {
                    Some(query) => query,
                    None => self.build_query().await?,
                };
                let postings = self.source.fetch_page(&query, page).await?;
                if postings.is_empty() {
                    info!(pages = page - 1, "source exhausted");
                    return Ok(None);
                }
                let report = self.process_batch(page, postings).await?;
                Ok(Some((report, (page + 1, Some(query)))))
            },
        )
    }

    /// Drain the whole source and return an aggregate report.
    pub async fn run(&self) -> Result<PipelineReport, Error> {
        let batches = self.run_batches();
        futures::pin_mut!(batches);

        let mut report = PipelineReport::default();
        while let Some(batch) = batches.try_next().await? {
            report.stats.absorb(batch.stats);
            report.states.extend(batch.states);
        }
        info!(
            scraped = report.stats.scraped,
            passed_filter = report.stats.passed_filter,
            processed = report.stats.processed,
            relevant = report.stats.relevant,
            "pipeline run finished"
        );
        Ok(report)
    }
}
