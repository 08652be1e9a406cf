use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cloudquote_core::PricingSnapshot;
use sqlx::{sqlite::SqliteRow, Row};
use tracing::info;

use super::{RepositoryError, SnapshotRepository, SnapshotSummary, StoredSnapshot};
use crate::DbPool;

/// SQLite-backed snapshot history.
///
/// Each save inserts a new row holding the JSON-encoded snapshot; `load_latest` reads the
/// highest version. Rows are never updated in place.
pub struct SqlSnapshotRepository {
    pool: DbPool,
}

impl SqlSnapshotRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn stored_from_row(row: &SqliteRow) -> Result<StoredSnapshot, RepositoryError> {
        let summary = Self::summary_from_row(row)?;
        let snapshot_json: String = row.try_get("snapshot_json")?;
        let snapshot: PricingSnapshot = serde_json::from_str(&snapshot_json).map_err(|error| {
            RepositoryError::Decode(format!(
                "snapshot version {} has invalid snapshot_json: {error}",
                summary.version
            ))
        })?;

        Ok(StoredSnapshot {
            version: summary.version,
            label: summary.label,
            saved_at: summary.saved_at,
            snapshot,
        })
    }

    fn summary_from_row(row: &SqliteRow) -> Result<SnapshotSummary, RepositoryError> {
        let version: i64 = row.try_get("version")?;
        let label: String = row.try_get("label")?;
        let saved_at_text: String = row.try_get("saved_at")?;

        Ok(SnapshotSummary { version, label, saved_at: parse_timestamp(version, &saved_at_text)? })
    }
}

fn parse_timestamp(version: i64, value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value).map(|parsed| parsed.with_timezone(&Utc)).map_err(|error| {
        RepositoryError::Decode(format!("snapshot version {version} has invalid saved_at: {error}"))
    })
}

#[async_trait]
impl SnapshotRepository for SqlSnapshotRepository {
    async fn load_latest(&self) -> Result<Option<StoredSnapshot>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT version, label, snapshot_json, saved_at
            FROM pricing_snapshot
            ORDER BY version DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::stored_from_row).transpose()
    }

    async fn save(
        &self,
        snapshot: &PricingSnapshot,
        label: &str,
    ) -> Result<StoredSnapshot, RepositoryError> {
        let snapshot_json = serde_json::to_string(snapshot)
            .map_err(|error| RepositoryError::Encode(format!("failed to encode snapshot: {error}")))?;
        let saved_at = Utc::now();

        let mut tx = self.pool.begin().await?;
        let latest: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM pricing_snapshot")
            .fetch_one(&mut *tx)
            .await?;
        let version = latest.unwrap_or_default() + 1;

        sqlx::query(
            r#"
            INSERT INTO pricing_snapshot (version, label, snapshot_json, saved_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(version)
        .bind(label)
        .bind(snapshot_json)
        .bind(saved_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        info!(event_name = "persistence.snapshot.saved", version, label, "pricing snapshot saved");

        Ok(StoredSnapshot {
            version,
            label: label.to_string(),
            saved_at,
            snapshot: snapshot.clone(),
        })
    }

    async fn history(&self, limit: u32) -> Result<Vec<SnapshotSummary>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT version, label, saved_at
            FROM pricing_snapshot
            ORDER BY version DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::summary_from_row).collect()
    }
}
