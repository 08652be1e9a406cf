use chrono::Utc;
use tokio::sync::RwLock;

use cloudquote_core::PricingSnapshot;

use super::{RepositoryError, SnapshotRepository, SnapshotSummary, StoredSnapshot};

#[derive(Default)]
pub struct InMemorySnapshotRepository {
    versions: RwLock<Vec<StoredSnapshot>>,
}

#[async_trait::async_trait]
impl SnapshotRepository for InMemorySnapshotRepository {
    async fn load_latest(&self) -> Result<Option<StoredSnapshot>, RepositoryError> {
        let versions = self.versions.read().await;
        Ok(versions.last().cloned())
    }

    async fn save(
        &self,
        snapshot: &PricingSnapshot,
        label: &str,
    ) -> Result<StoredSnapshot, RepositoryError> {
        let mut versions = self.versions.write().await;
        let stored = StoredSnapshot {
            version: versions.last().map_or(1, |latest| latest.version + 1),
            label: label.to_string(),
            saved_at: Utc::now(),
            snapshot: snapshot.clone(),
        };
        versions.push(stored.clone());
        Ok(stored)
    }

    async fn history(&self, limit: u32) -> Result<Vec<SnapshotSummary>, RepositoryError> {
        let versions = self.versions.read().await;
        Ok(versions.iter().rev().take(limit as usize).map(StoredSnapshot::summary).collect())
    }
}
