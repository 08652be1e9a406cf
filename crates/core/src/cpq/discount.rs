use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::diagnostics::{duplicate_tier_thresholds, ConfigDiagnostic};
use crate::domain::catalog::{DiscountTier, TierId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountResolution {
    pub percent: Decimal,
    pub tier_id: Option<TierId>,
    pub min_vms: Option<u32>,
    pub diagnostics: Vec<ConfigDiagnostic>,
}

impl DiscountResolution {
    pub fn none() -> Self {
        Self { percent: Decimal::ZERO, tier_id: None, min_vms: None, diagnostics: Vec::new() }
    }
}

/// Picks the tier with the highest threshold that `vm_count` still clears. Tiers sharing that
/// threshold resolve to the largest discount. Order of `tiers` does not matter.
pub fn resolve_discount(tiers: &[DiscountTier], vm_count: u32) -> DiscountResolution {
    let best = tiers
        .iter()
        .filter(|tier| tier.min_vms <= vm_count)
        .max_by(|a, b| {
            a.min_vms.cmp(&b.min_vms).then_with(|| a.discount_percent.cmp(&b.discount_percent))
        });

    let Some(tier) = best else {
        return DiscountResolution::none();
    };

    let diagnostics = duplicate_tier_thresholds(tiers)
        .into_iter()
        .filter(|diagnostic| {
            matches!(diagnostic, ConfigDiagnostic::DuplicateTierThreshold { min_vms, .. } if *min_vms == tier.min_vms)
        })
        .collect();

    DiscountResolution {
        percent: tier.discount_percent,
        tier_id: Some(tier.id.clone()),
        min_vms: Some(tier.min_vms),
        diagnostics,
    }
}
