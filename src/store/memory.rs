//! In-memory posting store.
//!
//! Used by tests and by callers that embed the pipeline without a relational
//! backend. Records age out of the "active" set after a configurable window
//! so the dedup check can distinguish expired postings.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::model::{NewPosting, Posting};
use crate::store::PostingStore;

const DEFAULT_ACTIVE_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone)]
struct StoredRecord {
    record: NewPosting,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Vec-backed posting store guarded by an async lock.
pub struct InMemoryPostingStore {
    records: RwLock<Vec<StoredRecord>>,
    active_window: Duration,
}

impl InMemoryPostingStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            active_window: Duration::days(DEFAULT_ACTIVE_WINDOW_DAYS),
        }
    }

    pub fn with_active_window(mut self, window: Duration) -> Self {
        self.active_window = window;
        self
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Snapshot of all stored records, in insertion order.
    pub async fn records(&self) -> Vec<NewPosting> {
        self.records
            .read()
            .await
            .iter()
            .map(|r| r.record.clone())
            .collect()
    }

    /// Backdate a record's creation time. Test hook for expiry behavior.
    pub async fn backdate(&self, external_id: &str, created_at: DateTime<Utc>) {
        let mut records = self.records.write().await;
        for stored in records.iter_mut() {
            if stored.record.external_id == external_id {
                stored.created_at = created_at;
                stored.updated_at = created_at;
            }
        }
    }
}

impl Default for InMemoryPostingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostingStore for InMemoryPostingStore {
    async fn get_by_external_id(
        &self,
        external_id: &str,
        source: Option<&str>,
    ) -> Result<Option<Posting>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|stored| {
                stored.record.external_id == external_id
                    && source.is_none_or(|s| stored.record.source == s)
            })
            .map(|stored| stored.record.to_posting(stored.updated_at)))
    }

    async fn has_active_by_title_and_company(
        &self,
        title: &str,
        company: &str,
    ) -> Result<bool, StoreError> {
        let cutoff = Utc::now() - self.active_window;
        let records = self.records.read().await;
        Ok(records.iter().any(|stored| {
            stored.record.title == title
                && stored.record.company == company
                && stored.created_at > cutoff
        }))
    }

    async fn create(&self, record: &NewPosting) -> Result<Posting, StoreError> {
        let now = Utc::now();
        let stored = StoredRecord {
            record: record.clone(),
            created_at: now,
            updated_at: now,
        };
        let posting = stored.record.to_posting(now);
        self.records.write().await.push(stored);
        Ok(posting)
    }

    async fn most_recent_update_time(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().map(|stored| stored.updated_at).max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(external_id: &str, title: &str, company: &str) -> NewPosting {
        NewPosting {
            external_id: external_id.into(),
            source: "djinni".into(),
            title: title.into(),
            company: company.into(),
            description: String::new(),
            location: None,
            employment: None,
            experience_months: None,
            salary: None,
            published_at: None,
            is_relevant: true,
            is_filtered: false,
            must_have_skill_groups: None,
            nice_to_have_skill_groups: None,
        }
    }

    #[tokio::test]
    async fn create_then_lookup_by_external_id() {
        let store = InMemoryPostingStore::new();
        store.create(&record("a-1", "Dev", "Acme")).await.unwrap();

        let found = store.get_by_external_id("a-1", None).await.unwrap();
        assert_eq!(found.unwrap().title, "Dev");
        assert!(store.get_by_external_id("a-2", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lookup_respects_source_filter() {
        let store = InMemoryPostingStore::new();
        store.create(&record("a-1", "Dev", "Acme")).await.unwrap();

        assert!(store
            .get_by_external_id("a-1", Some("djinni"))
            .await
            .unwrap()
            .is_some());
        assert!(store
            .get_by_external_id("a-1", Some("other"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn active_check_matches_title_and_company() {
        let store = InMemoryPostingStore::new();
        store.create(&record("a-1", "Dev", "Acme")).await.unwrap();

        assert!(store
            .has_active_by_title_and_company("Dev", "Acme")
            .await
            .unwrap());
        assert!(!store
            .has_active_by_title_and_company("Dev", "Other")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn expired_records_are_not_active() {
        let store = InMemoryPostingStore::new().with_active_window(Duration::days(7));
        store.create(&record("a-1", "Dev", "Acme")).await.unwrap();
        store.backdate("a-1", Utc::now() - Duration::days(8)).await;

        assert!(!store
            .has_active_by_title_and_company("Dev", "Acme")
            .await
            .unwrap());
        // Still findable by external id — only the active window lapsed.
        assert!(store.get_by_external_id("a-1", None).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn most_recent_update_time_tracks_latest_write() {
        let store = InMemoryPostingStore::new();
        assert!(store.most_recent_update_time().await.unwrap().is_none());

        store.create(&record("a-1", "Dev", "Acme")).await.unwrap();
        let first = store.most_recent_update_time().await.unwrap().unwrap();

        store.create(&record("a-2", "Ops", "Acme")).await.unwrap();
        let second = store.most_recent_update_time().await.unwrap().unwrap();
        assert!(second >= first);
    }
}
