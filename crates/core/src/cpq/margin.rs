use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::diagnostics::ConfigDiagnostic;
use crate::domain::account::{Account, Margin, ProductLine, Role, UserId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginContribution {
    pub user_id: UserId,
    pub percent: Decimal,
    /// True when the node had no margin record and the default was used.
    pub defaulted: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginResolution {
    pub line: ProductLine,
    pub percent: Decimal,
    pub contributions: Vec<MarginContribution>,
    pub diagnostics: Vec<ConfigDiagnostic>,
}

impl MarginResolution {
    pub fn cycle_detected(&self) -> bool {
        self.diagnostics.iter().any(|d| matches!(d, ConfigDiagnostic::CyclicHierarchy { .. }))
    }
}

/// Sums the user's own margin and every ancestor's margin for `line`.
///
/// Margins stack additively. Nodes without a margin record contribute
/// [`Margin::DEFAULT_PERCENT`]; admins contribute nothing. The walk stops at the first node
/// without a parent, at a parent id that does not exist, or at the first revisited node.
pub fn resolve_effective_margin(
    hierarchy: &[Account],
    margins: &[Margin],
    user_id: &UserId,
    line: ProductLine,
) -> MarginResolution {
    let mut resolution = MarginResolution {
        line,
        percent: Decimal::ZERO,
        contributions: Vec::new(),
        diagnostics: Vec::new(),
    };

    let by_id: HashMap<&UserId, &Account> =
        hierarchy.iter().map(|account| (&account.id, account)).collect();
    let by_reseller: HashMap<&UserId, &Margin> =
        margins.iter().map(|margin| (&margin.reseller_id, margin)).collect();

    if by_id.get(user_id).is_some_and(|account| account.role == Role::Admin) {
        return resolution;
    }

    let mut visited: HashSet<&UserId> = HashSet::new();
    let mut path: Vec<UserId> = Vec::new();
    let mut current = user_id;

    loop {
        if !visited.insert(current) {
            path.push(current.clone());
            resolution.diagnostics.push(ConfigDiagnostic::CyclicHierarchy { path });
            break;
        }
        path.push(current.clone());

        let account = by_id.get(current).copied();
        let contributes = account.map_or(true, |account| account.role.carries_margin());
        if contributes {
            let record = by_reseller.get(current).copied();
            let percent = record.map_or(Margin::DEFAULT_PERCENT, |margin| margin.percent_for(line));
            resolution.percent += percent;
            resolution.contributions.push(MarginContribution {
                user_id: current.clone(),
                percent,
                defaulted: record.is_none(),
            });
        }

        let Some(parent_id) = account.and_then(|account| account.parent_reseller_id.as_ref())
        else {
            break;
        };
        if !by_id.contains_key(parent_id) {
            resolution.diagnostics.push(ConfigDiagnostic::DanglingParent {
                user_id: current.clone(),
                parent_id: parent_id.clone(),
            });
            break;
        }
        current = parent_id;
    }

    resolution
}
