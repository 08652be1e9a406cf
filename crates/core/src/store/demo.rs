use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::PricingSnapshot;
use crate::domain::account::{Account, Margin, Role, UserId};
use crate::domain::catalog::{
    BaasPriceTable, CategoryId, CpuCategory, CpuRates, DiscountTier, TierId, VpsPriceTable,
};

impl PricingSnapshot {
    /// The stock configuration a fresh install starts from.
    pub fn demo() -> Self {
        let categories = vec![
            category("1", "V3", 3),
            category("2", "V4", 4),
            category("3", "Gold", 6),
            category("4", "Gold NVME", 6),
        ];

        let mut vps_pricing = VpsPriceTable {
            cpu_cost: BTreeMap::new(),
            ram_cost_per_gb: BTreeMap::new(),
            additional_ram_cost_per_gb: BTreeMap::new(),
            storage_cost_per_gb: BTreeMap::new(),
            vm_cost: Decimal::from(1500),
            backup_cost_per_gb: Decimal::from(8),
            baas_cost_per_gb: Decimal::from(12),
            dynamic_hardware_margin_percent: Decimal::from(15),
            hosting_cost: Decimal::ZERO,
        };
        for (name, cpu, ram, additional_ram, storage) in [
            ("V3", 3000, 1500, 2000, 15),
            ("V4", 4500, 2000, 2500, 20),
            ("Gold", 6000, 2500, 3000, 25),
            ("Gold NVME", 7500, 2500, 3000, 40),
        ] {
            vps_pricing.set_rates(
                name,
                CpuRates {
                    cpu_cost: Decimal::from(cpu),
                    ram_cost_per_gb: Decimal::from(ram),
                    additional_ram_cost_per_gb: Decimal::from(additional_ram),
                    storage_cost_per_gb: Decimal::from(storage),
                },
            );
        }

        Self {
            categories,
            vps_pricing,
            baas_pricing: BaasPriceTable {
                per_gb_cost: Decimal::from(35),
                per_server_cost: Decimal::from(2250),
                per_workstation_cost: Decimal::from(1125),
            },
            discount_tiers: vec![tier("3", 25, 15), tier("2", 10, 10), tier("1", 5, 5)],
            margins: vec![margin("2", 70, 50), margin("3", 60, 40)],
            accounts: vec![
                account("1", "Admin User", "admin@example.com", Role::Admin, None, None),
                account("2", "Reseller One", "reseller1@example.com", Role::Reseller, None, Some("1")),
                account("3", "Reseller Two", "reseller2@example.com", Role::Reseller, None, Some("1")),
                account(
                    "4",
                    "Sub-Reseller One",
                    "sub1@example.com",
                    Role::SubReseller,
                    Some("2"),
                    Some("2"),
                ),
                account(
                    "5",
                    "Sub-Reseller Two",
                    "sub2@example.com",
                    Role::SubReseller,
                    Some("3"),
                    Some("1"),
                ),
            ],
            last_account_id: 5,
        }
    }
}

fn category(id: &str, name: &str, ram_per_cpu_gb: i64) -> CpuCategory {
    CpuCategory {
        id: CategoryId(id.to_string()),
        name: name.to_string(),
        ram_per_cpu_gb: Decimal::from(ram_per_cpu_gb),
    }
}

fn tier(id: &str, min_vms: u32, discount_percent: i64) -> DiscountTier {
    DiscountTier { id: TierId(id.to_string()), min_vms, discount_percent: Decimal::from(discount_percent) }
}

fn margin(reseller_id: &str, vps: i64, baas: i64) -> Margin {
    Margin {
        reseller_id: UserId::new(reseller_id),
        vps_margin_percent: Decimal::from(vps),
        baas_margin_percent: Decimal::from(baas),
    }
}

fn account(
    id: &str,
    name: &str,
    email: &str,
    role: Role,
    parent: Option<&str>,
    created_by: Option<&str>,
) -> Account {
    Account {
        id: UserId::new(id),
        name: name.to_string(),
        email: email.to_string(),
        role,
        parent_reseller_id: parent.map(UserId::new),
        created_by: created_by.map(UserId::new),
    }
}
