//! Pricing configuration store.
//!
//! A [`PricingSnapshot`] is an immutable value. Every admin change goes through
//! [`PricingSnapshot::apply`], which validates the change and returns the next snapshot; the
//! current one is never mutated, so a rejected update leaves it exactly as it was.

mod demo;

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::account::{Account, Margin, NewAccount, Role, UserId};
use crate::domain::catalog::{
    BaasPricePatch, BaasPriceTable, CpuCategory, DiscountTier, VpsPricePatch, VpsPriceTable,
};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingSnapshot {
    pub categories: Vec<CpuCategory>,
    pub vps_pricing: VpsPriceTable,
    pub baas_pricing: BaasPriceTable,
    #[serde(default)]
    pub discount_tiers: Vec<DiscountTier>,
    #[serde(default)]
    pub margins: Vec<Margin>,
    #[serde(default)]
    pub accounts: Vec<Account>,
    /// Highest numeric account id ever issued. Removing an account never lowers it, so a
    /// removed id is not handed out again.
    #[serde(default)]
    pub last_account_id: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum SnapshotUpdate {
    ReplaceCategories { categories: Vec<CpuCategory> },
    UpdateVpsPricing { patch: VpsPricePatch },
    UpdateBaasPricing { patch: BaasPricePatch },
    ReplaceDiscountTiers { tiers: Vec<DiscountTier> },
    SetMargin { reseller_id: UserId, vps_margin_percent: Decimal, baas_margin_percent: Decimal },
    ReplaceMargins { margins: Vec<Margin> },
    AddAccount { account: NewAccount },
    UpdateAccount { account: Account },
    SetParent { sub_reseller_id: UserId, parent_reseller_id: UserId },
    RemoveAccount { id: UserId },
}

impl SnapshotUpdate {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReplaceCategories { .. } => "replace_categories",
            Self::UpdateVpsPricing { .. } => "update_vps_pricing",
            Self::UpdateBaasPricing { .. } => "update_baas_pricing",
            Self::ReplaceDiscountTiers { .. } => "replace_discount_tiers",
            Self::SetMargin { .. } => "set_margin",
            Self::ReplaceMargins { .. } => "replace_margins",
            Self::AddAccount { .. } => "add_account",
            Self::UpdateAccount { .. } => "update_account",
            Self::SetParent { .. } => "set_parent",
            Self::RemoveAccount { .. } => "remove_account",
        }
    }
}

impl PricingSnapshot {
    pub fn apply(&self, update: SnapshotUpdate) -> Result<PricingSnapshot, DomainError> {
        let mut next = self.clone();

        match update {
            SnapshotUpdate::ReplaceCategories { categories } => {
                next.categories = validate_categories(categories)?;
            }
            SnapshotUpdate::UpdateVpsPricing { patch } => {
                apply_vps_patch(&mut next.vps_pricing, patch)?;
            }
            SnapshotUpdate::UpdateBaasPricing { patch } => {
                apply_baas_patch(&mut next.baas_pricing, patch)?;
            }
            SnapshotUpdate::ReplaceDiscountTiers { tiers } => {
                next.discount_tiers = validate_tiers(tiers)?;
            }
            SnapshotUpdate::SetMargin { reseller_id, vps_margin_percent, baas_margin_percent } => {
                let margin = Margin { reseller_id, vps_margin_percent, baas_margin_percent };
                next.validate_margin(&margin)?;
                match next.margins.iter_mut().find(|m| m.reseller_id == margin.reseller_id) {
                    Some(existing) => *existing = margin,
                    None => next.margins.push(margin),
                }
            }
            SnapshotUpdate::ReplaceMargins { margins } => {
                for margin in &margins {
                    next.validate_margin(margin)?;
                }
                next.margins = margins;
            }
            SnapshotUpdate::AddAccount { account } => {
                let created = next.materialize_account(account);
                next.validate_parent(&created.id, created.role, created.parent_reseller_id.as_ref())?;
                next.last_account_id = created.id.0.parse().unwrap_or(next.last_account_id);
                next.accounts.push(created);
            }
            SnapshotUpdate::UpdateAccount { account } => {
                let index = next
                    .account_index(&account.id)
                    .ok_or_else(|| DomainError::UnknownAccount(account.id.clone()))?;
                next.validate_parent(&account.id, account.role, account.parent_reseller_id.as_ref())?;
                if account.role != Role::Reseller {
                    next.ensure_no_dependents(&account.id, account.role)?;
                }
                next.accounts[index] = account;
            }
            SnapshotUpdate::SetParent { sub_reseller_id, parent_reseller_id } => {
                let index = next
                    .account_index(&sub_reseller_id)
                    .ok_or_else(|| DomainError::UnknownAccount(sub_reseller_id.clone()))?;
                let role = next.accounts[index].role;
                next.validate_parent(&sub_reseller_id, role, Some(&parent_reseller_id))?;
                next.accounts[index].parent_reseller_id = Some(parent_reseller_id);
            }
            SnapshotUpdate::RemoveAccount { id } => {
                let index =
                    next.account_index(&id).ok_or_else(|| DomainError::UnknownAccount(id.clone()))?;
                next.accounts.remove(index);
                // children keep their now-dangling parent reference
                next.margins.retain(|margin| margin.reseller_id != id);
            }
        }

        Ok(next)
    }

    pub fn category_named(&self, name: &str) -> Option<&CpuCategory> {
        self.categories.iter().find(|category| category.name == name)
    }

    pub fn account(&self, id: &UserId) -> Option<&Account> {
        self.accounts.iter().find(|account| &account.id == id)
    }

    pub fn margin_for(&self, id: &UserId) -> Option<&Margin> {
        self.margins.iter().find(|margin| &margin.reseller_id == id)
    }

    /// Next sequential account id: one past the highest numeric id issued or in use.
    pub fn next_account_id(&self) -> UserId {
        let in_use = self.accounts.iter().filter_map(|account| account.id.0.parse::<u64>().ok());
        let highest = in_use.fold(self.last_account_id, u64::max);
        UserId((highest + 1).to_string())
    }

    /// Follows parent links from `start`. Returns the members of the first loop encountered,
    /// in walk order, or `None` when the chain terminates.
    pub fn find_cycle_from(&self, start: &UserId) -> Option<Vec<UserId>> {
        let mut order: Vec<UserId> = Vec::new();
        let mut positions: HashMap<UserId, usize> = HashMap::new();
        let mut current = start.clone();

        loop {
            if let Some(&position) = positions.get(&current) {
                return Some(order[position..].to_vec());
            }
            positions.insert(current.clone(), order.len());
            order.push(current.clone());

            let parent = self.account(&current)?.parent_reseller_id.clone()?;
            current = parent;
        }
    }

    fn account_index(&self, id: &UserId) -> Option<usize> {
        self.accounts.iter().position(|account| &account.id == id)
    }

    fn materialize_account(&self, new: NewAccount) -> Account {
        let mut parent_reseller_id = new.parent_reseller_id;
        if new.role == Role::SubReseller && parent_reseller_id.is_none() {
            let creator_is_reseller = new
                .created_by
                .as_ref()
                .and_then(|creator| self.account(creator))
                .is_some_and(|creator| creator.role == Role::Reseller);
            if creator_is_reseller {
                parent_reseller_id = new.created_by.clone();
            }
        }

        Account {
            id: self.next_account_id(),
            name: new.name,
            email: new.email,
            role: new.role,
            parent_reseller_id,
            created_by: new.created_by,
        }
    }

    /// Refuses to give `id` a non-reseller role while sub-resellers still hang under it.
    fn ensure_no_dependents(&self, id: &UserId, role: Role) -> Result<(), DomainError> {
        match self.accounts.iter().find(|account| account.parent_reseller_id.as_ref() == Some(id)) {
            Some(dependent) => Err(DomainError::ParentNotReseller {
                child: dependent.id.clone(),
                parent: id.clone(),
                role,
            }),
            None => Ok(()),
        }
    }

    fn validate_margin(&self, margin: &Margin) -> Result<(), DomainError> {
        let account = self
            .account(&margin.reseller_id)
            .ok_or_else(|| DomainError::UnknownAccount(margin.reseller_id.clone()))?;
        if !account.role.carries_margin() {
            return Err(DomainError::MarginNotApplicable(margin.reseller_id.clone()));
        }
        non_negative("vpsMarginPercent", margin.vps_margin_percent)?;
        non_negative("baasMarginPercent", margin.baas_margin_percent)?;
        Ok(())
    }

    fn validate_parent(
        &self,
        child: &UserId,
        role: Role,
        parent: Option<&UserId>,
    ) -> Result<(), DomainError> {
        let Some(parent) = parent else {
            return Ok(());
        };
        if !role.may_have_parent() {
            return Err(DomainError::ParentNotAllowed { id: child.clone(), role });
        }
        if parent == child {
            return Err(DomainError::CyclicParent { child: child.clone(), parent: parent.clone() });
        }

        let parent_account =
            self.account(parent).ok_or_else(|| DomainError::UnknownAccount(parent.clone()))?;
        if parent_account.role != Role::Reseller {
            return Err(DomainError::ParentNotReseller {
                child: child.clone(),
                parent: parent.clone(),
                role: parent_account.role,
            });
        }

        let mut visited: HashSet<&UserId> = HashSet::new();
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(DomainError::CyclicParent {
                    child: child.clone(),
                    parent: parent.clone(),
                });
            }
            if !visited.insert(id) {
                break;
            }
            cursor = self.account(id).and_then(|account| account.parent_reseller_id.as_ref());
        }

        Ok(())
    }
}

fn validate_categories(categories: Vec<CpuCategory>) -> Result<Vec<CpuCategory>, DomainError> {
    let mut seen: HashSet<String> = HashSet::new();
    categories
        .into_iter()
        .map(|mut category| {
            let name = category.name.trim().to_string();
            if name.is_empty() {
                return Err(DomainError::EmptyCategoryName);
            }
            if !seen.insert(name.clone()) {
                return Err(DomainError::DuplicateCategoryName(name));
            }
            non_negative("ramPerCpuGB", category.ram_per_cpu_gb)?;
            category.name = name;
            Ok(category)
        })
        .collect()
}

fn validate_tiers(mut tiers: Vec<DiscountTier>) -> Result<Vec<DiscountTier>, DomainError> {
    let mut thresholds: HashSet<u32> = HashSet::new();
    for tier in &tiers {
        if tier.min_vms < 1 {
            return Err(DomainError::OutOfRange {
                field: "minVms".to_string(),
                expected: ">= 1",
                value: Decimal::from(tier.min_vms),
            });
        }
        percent("discountPercent", tier.discount_percent)?;
        if !thresholds.insert(tier.min_vms) {
            return Err(DomainError::DuplicateTierThreshold { min_vms: tier.min_vms });
        }
    }

    tiers.sort_by(|a, b| b.min_vms.cmp(&a.min_vms));
    Ok(tiers)
}

fn apply_vps_patch(table: &mut VpsPriceTable, patch: VpsPricePatch) -> Result<(), DomainError> {
    for (category, rates) in &patch.category_rates {
        non_negative(&format!("cpuCost.{category}"), rates.cpu_cost)?;
        non_negative(&format!("ramCostPerGB.{category}"), rates.ram_cost_per_gb)?;
        non_negative(
            &format!("additionalRamCostPerGB.{category}"),
            rates.additional_ram_cost_per_gb,
        )?;
        non_negative(&format!("storageCostPerGB.{category}"), rates.storage_cost_per_gb)?;
    }

    let globals = [
        ("vmCost", patch.vm_cost, &mut table.vm_cost),
        ("backupCostPerGB", patch.backup_cost_per_gb, &mut table.backup_cost_per_gb),
        ("baasCostPerGB", patch.baas_cost_per_gb, &mut table.baas_cost_per_gb),
        (
            "dynamicHardwareMarginPercent",
            patch.dynamic_hardware_margin_percent,
            &mut table.dynamic_hardware_margin_percent,
        ),
        ("hostingCost", patch.hosting_cost, &mut table.hosting_cost),
    ];
    let mut staged = Vec::new();
    for (field, value, slot) in globals {
        if let Some(value) = value {
            non_negative(field, value)?;
            staged.push((slot, value));
        }
    }
    for (slot, value) in staged {
        *slot = value;
    }

    for (category, rates) in patch.category_rates {
        table.set_rates(&category, rates);
    }
    Ok(())
}

fn apply_baas_patch(table: &mut BaasPriceTable, patch: BaasPricePatch) -> Result<(), DomainError> {
    let mut next = *table;
    if let Some(value) = patch.per_gb_cost {
        next.per_gb_cost = non_negative("perGbCost", value)?;
    }
    if let Some(value) = patch.per_server_cost {
        next.per_server_cost = non_negative("perServerCost", value)?;
    }
    if let Some(value) = patch.per_workstation_cost {
        next.per_workstation_cost = non_negative("perWorkstationCost", value)?;
    }
    *table = next;
    Ok(())
}

fn non_negative(field: &str, value: Decimal) -> Result<Decimal, DomainError> {
    if value < Decimal::ZERO {
        return Err(DomainError::OutOfRange { field: field.to_string(), expected: ">= 0", value });
    }
    Ok(value)
}

fn percent(field: &str, value: Decimal) -> Result<Decimal, DomainError> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(DomainError::OutOfRange {
            field: field.to_string(),
            expected: "within 0..=100",
            value,
        });
    }
    Ok(value)
}
