//! Posting store — backend-agnostic persistence interface.
//!
//! The relational engine behind this trait (schema, migrations, transactions)
//! is an external collaborator. The pipeline writes exactly one record per
//! evaluated posting, including irrelevant and filtered ones.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::model::{NewPosting, Posting};

pub mod memory;

pub use memory::InMemoryPostingStore;

/// Backend-agnostic posting store trait.
#[async_trait]
pub trait PostingStore: Send + Sync {
    /// Look up a posting by its source-native identifier.
    async fn get_by_external_id(
        &self,
        external_id: &str,
        source: Option<&str>,
    ) -> Result<Option<Posting>, StoreError>;

    /// Whether an active (non-expired) record with the same title and company
    /// already exists.
    async fn has_active_by_title_and_company(
        &self,
        title: &str,
        company: &str,
    ) -> Result<bool, StoreError>;

    /// Create a posting record, returning the stored posting.
    async fn create(&self, record: &NewPosting) -> Result<Posting, StoreError>;

    /// Most recent update timestamp across all records, if any exist.
    /// Used by the driver to derive its look-back window.
    async fn most_recent_update_time(&self) -> Result<Option<DateTime<Utc>>, StoreError>;
}
