use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cloudquote_core::PricingSnapshot;

pub mod memory;
pub mod pricing_snapshot;

pub use memory::InMemorySnapshotRepository;
pub use pricing_snapshot::SqlSnapshotRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("encode error: {0}")]
    Encode(String),
}

/// A persisted configuration snapshot. Versions start at 1 and increase by one per save.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSnapshot {
    pub version: i64,
    pub label: String,
    pub saved_at: DateTime<Utc>,
    pub snapshot: PricingSnapshot,
}

impl StoredSnapshot {
    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary { version: self.version, label: self.label.clone(), saved_at: self.saved_at }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub version: i64,
    pub label: String,
    pub saved_at: DateTime<Utc>,
}

#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    async fn load_latest(&self) -> Result<Option<StoredSnapshot>, RepositoryError>;

    /// Appends `snapshot` as the next version. Earlier versions are never rewritten.
    async fn save(
        &self,
        snapshot: &PricingSnapshot,
        label: &str,
    ) -> Result<StoredSnapshot, RepositoryError>;

    /// Newest first.
    async fn history(&self, limit: u32) -> Result<Vec<SnapshotSummary>, RepositoryError>;
}
