use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::account::{Role, UserId};
use crate::domain::catalog::{PriceMap, TierId};
use crate::store::PricingSnapshot;

/// A recoverable inconsistency found while reading configuration. Pricing always completes;
/// these ride along on the result so the caller can surface them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfigDiagnostic {
    MissingPriceEntry { category: String, table: PriceMap },
    UnknownCategory { category: String },
    DuplicateTierThreshold { min_vms: u32, tier_ids: Vec<TierId> },
    DanglingParent { user_id: UserId, parent_id: UserId },
    ParentNotReseller { user_id: UserId, parent_id: UserId, parent_role: Role },
    CyclicHierarchy { path: Vec<UserId> },
}

impl ConfigDiagnostic {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingPriceEntry { .. } => "MISSING_PRICE_ENTRY",
            Self::UnknownCategory { .. } => "UNKNOWN_CATEGORY",
            Self::DuplicateTierThreshold { .. } => "DUPLICATE_TIER_THRESHOLD",
            Self::DanglingParent { .. } => "DANGLING_PARENT",
            Self::ParentNotReseller { .. } => "PARENT_NOT_RESELLER",
            Self::CyclicHierarchy { .. } => "CYCLIC_HIERARCHY",
        }
    }
}

impl fmt::Display for ConfigDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPriceEntry { category, table } => {
                write!(f, "category `{category}` has no `{}` entry; priced as zero", table.as_str())
            }
            Self::UnknownCategory { category } => {
                write!(f, "category `{category}` is not configured; RAM inclusion treated as zero")
            }
            Self::DuplicateTierThreshold { min_vms, tier_ids } => {
                write!(
                    f,
                    "{} discount tiers share the {min_vms}-VM threshold; highest discount wins",
                    tier_ids.len()
                )
            }
            Self::DanglingParent { user_id, parent_id } => {
                write!(f, "account {user_id} points at missing parent {parent_id}; treated as no parent")
            }
            Self::ParentNotReseller { user_id, parent_id, parent_role } => {
                write!(
                    f,
                    "account {user_id} hangs under {parent_id}, which is {} rather than reseller",
                    parent_role.as_str()
                )
            }
            Self::CyclicHierarchy { path } => {
                let rendered = path.iter().map(|id| id.0.as_str()).collect::<Vec<_>>().join(" -> ");
                write!(f, "reseller hierarchy contains a cycle: {rendered}")
            }
        }
    }
}

/// Whole-snapshot consistency check. Deterministic order: price entries, tiers, hierarchy.
pub fn consistency_report(snapshot: &PricingSnapshot) -> Vec<ConfigDiagnostic> {
    let mut diagnostics = Vec::new();

    for category in &snapshot.categories {
        let (_, missing) = snapshot.vps_pricing.rates_for(&category.name);
        diagnostics.extend(
            missing
                .into_iter()
                .map(|table| ConfigDiagnostic::MissingPriceEntry {
                    category: category.name.clone(),
                    table,
                }),
        );
    }

    diagnostics.extend(duplicate_tier_thresholds(&snapshot.discount_tiers));

    let roles: HashMap<&UserId, Role> =
        snapshot.accounts.iter().map(|account| (&account.id, account.role)).collect();
    let mut reported_cycles: Vec<Vec<UserId>> = Vec::new();
    for account in &snapshot.accounts {
        let Some(parent_id) = &account.parent_reseller_id else {
            continue;
        };
        let Some(&parent_role) = roles.get(parent_id) else {
            diagnostics.push(ConfigDiagnostic::DanglingParent {
                user_id: account.id.clone(),
                parent_id: parent_id.clone(),
            });
            continue;
        };
        if parent_role != Role::Reseller {
            diagnostics.push(ConfigDiagnostic::ParentNotReseller {
                user_id: account.id.clone(),
                parent_id: parent_id.clone(),
                parent_role,
            });
        }

        if let Some(mut cycle) = snapshot.find_cycle_from(&account.id) {
            let mut normalized = cycle.clone();
            normalized.sort();
            if !reported_cycles.contains(&normalized) {
                reported_cycles.push(normalized);
                cycle.push(cycle[0].clone());
                diagnostics.push(ConfigDiagnostic::CyclicHierarchy { path: cycle });
            }
        }
    }

    diagnostics
}

pub(crate) fn duplicate_tier_thresholds(
    tiers: &[crate::domain::catalog::DiscountTier],
) -> Vec<ConfigDiagnostic> {
    let mut by_threshold: BTreeMap<u32, Vec<TierId>> = BTreeMap::new();
    for tier in tiers {
        by_threshold.entry(tier.min_vms).or_default().push(tier.id.clone());
    }

    by_threshold
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(min_vms, tier_ids)| ConfigDiagnostic::DuplicateTierThreshold { min_vms, tier_ids })
        .collect()
}
