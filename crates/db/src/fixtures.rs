use cloudquote_core::{consistency_report, PricingSnapshot};
use tracing::info;

use crate::repositories::{RepositoryError, SnapshotRepository};

pub const SEED_LABEL: &str = "seed";

const EXPECTED_CATEGORIES: &[&str] = &["V3", "V4", "Gold", "Gold NVME"];
const EXPECTED_TIER_THRESHOLDS: &[u32] = &[25, 10, 5];
const EXPECTED_ACCOUNT_IDS: &[&str] = &["1", "2", "3", "4", "5"];

/// Demo configuration for a fresh install.
///
/// Provides the stock CPU categories, price tables, volume tiers, and a small
/// admin / reseller / sub-reseller hierarchy with two margin records.
pub struct DemoSeed;

impl DemoSeed {
    /// Saves the demo snapshot unless the latest stored version already equals it.
    pub async fn load(repo: &dyn SnapshotRepository) -> Result<SeedResult, RepositoryError> {
        let demo = PricingSnapshot::demo();

        if let Some(latest) = repo.load_latest().await? {
            if latest.snapshot == demo {
                return Ok(SeedResult::from_snapshot(latest.version, false, &demo));
            }
        }

        let stored = repo.save(&demo, SEED_LABEL).await?;
        info!(event_name = "persistence.seed.loaded", version = stored.version, "demo seed loaded");
        Ok(SeedResult::from_snapshot(stored.version, true, &stored.snapshot))
    }

    /// Checks that the latest snapshot carries the demo contract.
    pub async fn verify(repo: &dyn SnapshotRepository) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();
        let Some(latest) = repo.load_latest().await? else {
            checks.push(("snapshot-present", false));
            return Ok(VerificationResult { all_present: false, checks });
        };
        checks.push(("snapshot-present", true));

        let snapshot = &latest.snapshot;
        let categories_ok = EXPECTED_CATEGORIES
            .iter()
            .all(|name| snapshot.category_named(name).is_some());
        checks.push(("categories", categories_ok));

        let mut thresholds: Vec<u32> = snapshot.discount_tiers.iter().map(|t| t.min_vms).collect();
        thresholds.sort_unstable_by(|a, b| b.cmp(a));
        checks.push(("discount-tiers", thresholds == EXPECTED_TIER_THRESHOLDS));

        let accounts_ok = EXPECTED_ACCOUNT_IDS
            .iter()
            .all(|id| snapshot.accounts.iter().any(|account| account.id.0 == *id));
        checks.push(("accounts", accounts_ok));

        checks.push(("consistency", consistency_report(snapshot).is_empty()));

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedResult {
    pub version: i64,
    pub created: bool,
    pub categories: usize,
    pub discount_tiers: usize,
    pub accounts: usize,
}

impl SeedResult {
    fn from_snapshot(version: i64, created: bool, snapshot: &PricingSnapshot) -> Self {
        Self {
            version,
            created,
            categories: snapshot.categories.len(),
            discount_tiers: snapshot.discount_tiers.len(),
            accounts: snapshot.accounts.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
