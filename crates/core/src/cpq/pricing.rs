use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cpq::input::{BaasInput, DeviceType, VpsInput};
use crate::diagnostics::ConfigDiagnostic;
use crate::domain::catalog::{BaasPriceTable, CpuCategory, VpsPriceTable};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: Decimal,
}

impl PricingTraceStep {
    fn new(stage: &str, detail: String, amount: Decimal) -> Self {
        Self { stage: stage.to_string(), detail, amount }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct VpsPricingContext<'a> {
    pub category: &'a CpuCategory,
    pub table: &'a VpsPriceTable,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpsBreakdown {
    pub category: String,
    /// Storage is NVMe-backed for NVME categories and SSD otherwise.
    pub nvme_storage: bool,
    pub included_ram_gb: Decimal,
    pub additional_ram_gb: Decimal,
    pub server_cost: Decimal,
    pub hosting_cost: Decimal,
    pub hardware_margin_percent: Decimal,
    pub hardware_cost: Decimal,
    pub backup_cost: Decimal,
    pub infra_cost: Decimal,
    pub vm_cost: Decimal,
    pub baas_cost: Decimal,
    pub total_cost: Decimal,
    pub margin_percent: Decimal,
    pub final_cost: Decimal,
    pub discount_percent: Decimal,
    pub discounted_cost: Decimal,
    pub trace: Vec<PricingTraceStep>,
    pub diagnostics: Vec<ConfigDiagnostic>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaasBreakdown {
    pub base_cost: Decimal,
    pub margin_percent: Decimal,
    pub final_cost: Decimal,
    pub trace: Vec<PricingTraceStep>,
}

/// `amount × (1 + percent/100)`
pub fn apply_markup(amount: Decimal, percent: Decimal) -> Decimal {
    amount * (Decimal::ONE + percent / Decimal::ONE_HUNDRED)
}

/// `amount × (1 − percent/100)`
pub fn apply_discount(amount: Decimal, percent: Decimal) -> Decimal {
    amount * (Decimal::ONE - percent / Decimal::ONE_HUNDRED)
}

/// Prices one VPS configuration. Amounts are kept at full precision; rounding belongs to
/// presentation. Missing rate entries price as zero and are reported in `diagnostics`.
pub fn price_vps(
    config: VpsPricingContext<'_>,
    input: &VpsInput,
    effective_margin_percent: Decimal,
    discount_percent: Decimal,
) -> VpsBreakdown {
    let input = input.clamped();
    let table = config.table;
    let (rates, missing) = table.rates_for(&config.category.name);
    let diagnostics = missing
        .into_iter()
        .map(|map| ConfigDiagnostic::MissingPriceEntry {
            category: config.category.name.clone(),
            table: map,
        })
        .collect();

    let cpu_count = Decimal::from(input.cpu_count);
    let ram_gb = Decimal::from(input.ram_gb);
    let storage_gb = Decimal::from(input.storage_gb);

    let included_ram_gb = cpu_count * config.category.ram_per_cpu_gb;
    let additional_ram_gb = (ram_gb - included_ram_gb).max(Decimal::ZERO);

    let server_cost = cpu_count * rates.cpu_cost
        + included_ram_gb * rates.ram_cost_per_gb
        + additional_ram_gb * rates.additional_ram_cost_per_gb
        + storage_gb * rates.storage_cost_per_gb;

    // hosting sits inside the hardware margin base
    let hardware_cost =
        apply_markup(server_cost + table.hosting_cost, table.dynamic_hardware_margin_percent);

    let backup_cost = storage_gb * table.backup_cost_per_gb;
    let infra_cost = hardware_cost + backup_cost;

    let vm_cost = Decimal::from(input.vm_count) * table.vm_cost;
    let baas_cost = Decimal::from(input.baas_backup_gb) * table.baas_cost_per_gb;
    let total_cost = infra_cost + vm_cost + baas_cost;

    let final_cost = apply_markup(total_cost, effective_margin_percent);
    let discounted_cost = apply_discount(final_cost, discount_percent);

    let trace = vec![
        PricingTraceStep::new(
            "server",
            format!(
                "{} cpu + {included_ram_gb} GB included RAM + {additional_ram_gb} GB additional RAM + {} GB storage",
                input.cpu_count, input.storage_gb
            ),
            server_cost,
        ),
        PricingTraceStep::new(
            "hardware",
            format!(
                "(server + hosting {}) x (1 + {}%)",
                table.hosting_cost, table.dynamic_hardware_margin_percent
            ),
            hardware_cost,
        ),
        PricingTraceStep::new(
            "infra",
            format!("hardware + {} GB x backup {}", input.storage_gb, table.backup_cost_per_gb),
            infra_cost,
        ),
        PricingTraceStep::new(
            "total",
            format!(
                "infra + {} VM x {} + {} GB BAAS x {}",
                input.vm_count, table.vm_cost, input.baas_backup_gb, table.baas_cost_per_gb
            ),
            total_cost,
        ),
        PricingTraceStep::new(
            "final",
            format!("total x (1 + {effective_margin_percent}% margin)"),
            final_cost,
        ),
        PricingTraceStep::new(
            "discounted",
            format!("final x (1 - {discount_percent}% volume discount)"),
            discounted_cost,
        ),
    ];

    VpsBreakdown {
        category: config.category.name.clone(),
        nvme_storage: config.category.is_nvme(),
        included_ram_gb,
        additional_ram_gb,
        server_cost,
        hosting_cost: table.hosting_cost,
        hardware_margin_percent: table.dynamic_hardware_margin_percent,
        hardware_cost,
        backup_cost,
        infra_cost,
        vm_cost,
        baas_cost,
        total_cost,
        margin_percent: effective_margin_percent,
        final_cost,
        discount_percent,
        discounted_cost,
        trace,
        diagnostics,
    }
}

/// Prices backup-as-a-service. Volume discounts never apply here.
pub fn price_baas(
    table: &BaasPriceTable,
    input: &BaasInput,
    effective_margin_percent: Decimal,
) -> BaasBreakdown {
    let (base_cost, detail) = match input.clamped() {
        BaasInput::PerGb { gigabytes } => (
            Decimal::from(gigabytes) * table.per_gb_cost,
            format!("{gigabytes} GB x {}", table.per_gb_cost),
        ),
        BaasInput::PerDevice { device, count } => {
            let unit = match device {
                DeviceType::Server => table.per_server_cost,
                DeviceType::Workstation => table.per_workstation_cost,
            };
            (Decimal::from(count) * unit, format!("{count} {device:?} x {unit}"))
        }
    };
    let final_cost = apply_markup(base_cost, effective_margin_percent);

    BaasBreakdown {
        base_cost,
        margin_percent: effective_margin_percent,
        final_cost,
        trace: vec![
            PricingTraceStep::new("base", detail, base_cost),
            PricingTraceStep::new(
                "final",
                format!("base x (1 + {effective_margin_percent}% margin)"),
                final_cost,
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{price_baas, price_vps, VpsPricingContext};
    use crate::cpq::input::{BaasInput, DeviceType, VpsInput};
    use crate::diagnostics::ConfigDiagnostic;
    use crate::domain::catalog::{BaasPriceTable, CpuCategory, PriceMap};
    use crate::store::PricingSnapshot;

    fn v3() -> CpuCategory {
        CpuCategory::new("V3", Decimal::from(3))
    }

    fn input() -> VpsInput {
        VpsInput { cpu_count: 1, ram_gb: 4, storage_gb: 50, vm_count: 1, baas_backup_gb: 0 }
    }

    #[test]
    fn vps_reference_configuration_prices_every_stage() {
        let snapshot = PricingSnapshot::demo();
        let category = v3();
        let breakdown = price_vps(
            VpsPricingContext { category: &category, table: &snapshot.vps_pricing },
            &input(),
            Decimal::ONE_HUNDRED,
            Decimal::ZERO,
        );

        assert_eq!(breakdown.included_ram_gb, Decimal::from(3));
        assert_eq!(breakdown.additional_ram_gb, Decimal::ONE);
        assert_eq!(breakdown.server_cost, Decimal::from(10_250));
        assert_eq!(breakdown.hardware_cost, Decimal::new(117_875, 1));
        assert_eq!(breakdown.infra_cost, Decimal::new(121_875, 1));
        assert_eq!(breakdown.total_cost, Decimal::new(136_875, 1));
        assert_eq!(breakdown.final_cost, Decimal::from(27_375));
        assert_eq!(breakdown.discount_percent, Decimal::ZERO);
        assert_eq!(breakdown.discounted_cost, Decimal::from(27_375));
        assert!(breakdown.diagnostics.is_empty());
        assert_eq!(breakdown.trace.len(), 6);
        assert_eq!(breakdown.trace[0].stage, "server");
        assert!(!breakdown.nvme_storage);
    }

    #[test]
    fn nvme_categories_are_flagged_on_the_breakdown() {
        let snapshot = PricingSnapshot::demo();
        let category = snapshot.category_named("Gold NVME").cloned().expect("demo category");
        let breakdown = price_vps(
            VpsPricingContext { category: &category, table: &snapshot.vps_pricing },
            &input(),
            Decimal::ZERO,
            Decimal::ZERO,
        );

        assert!(breakdown.nvme_storage);
        assert_eq!(breakdown.category, "Gold NVME");
    }

    #[test]
    fn vps_discount_applies_after_margin() {
        let snapshot = PricingSnapshot::demo();
        let category = v3();
        let breakdown = price_vps(
            VpsPricingContext { category: &category, table: &snapshot.vps_pricing },
            &input(),
            Decimal::ONE_HUNDRED,
            Decimal::from(10),
        );

        assert_eq!(breakdown.final_cost, Decimal::from(27_375));
        assert_eq!(breakdown.discounted_cost, Decimal::new(246_375, 1));
    }

    #[test]
    fn hosting_cost_is_inside_hardware_margin_base() {
        let mut snapshot = PricingSnapshot::demo();
        snapshot.vps_pricing.hosting_cost = Decimal::from(1000);
        let category = v3();
        let breakdown = price_vps(
            VpsPricingContext { category: &category, table: &snapshot.vps_pricing },
            &input(),
            Decimal::ZERO,
            Decimal::ZERO,
        );

        assert_eq!(breakdown.server_cost, Decimal::from(10_250));
        assert_eq!(breakdown.hardware_cost, Decimal::new(129_375, 1));
    }

    #[test]
    fn ram_within_included_allowance_has_no_additional_charge() {
        let snapshot = PricingSnapshot::demo();
        let category = v3();
        let breakdown = price_vps(
            VpsPricingContext { category: &category, table: &snapshot.vps_pricing },
            &VpsInput { cpu_count: 2, ram_gb: 4, ..input() },
            Decimal::ZERO,
            Decimal::ZERO,
        );

        assert_eq!(breakdown.included_ram_gb, Decimal::from(6));
        assert_eq!(breakdown.additional_ram_gb, Decimal::ZERO);
        assert_eq!(breakdown.server_cost, Decimal::from(2 * 3000 + 6 * 1500 + 50 * 15));
    }

    #[test]
    fn optional_baas_and_vm_count_feed_total() {
        let snapshot = PricingSnapshot::demo();
        let category = v3();
        let breakdown = price_vps(
            VpsPricingContext { category: &category, table: &snapshot.vps_pricing },
            &VpsInput { vm_count: 3, baas_backup_gb: 100, ..input() },
            Decimal::ZERO,
            Decimal::ZERO,
        );

        assert_eq!(breakdown.vm_cost, Decimal::from(4500));
        assert_eq!(breakdown.baas_cost, Decimal::from(1200));
        assert_eq!(breakdown.total_cost, breakdown.infra_cost + Decimal::from(5700));
    }

    #[test]
    fn missing_rate_entry_prices_as_zero_with_diagnostic() {
        let mut snapshot = PricingSnapshot::demo();
        snapshot.vps_pricing.additional_ram_cost_per_gb.remove("V3");
        let category = v3();
        let breakdown = price_vps(
            VpsPricingContext { category: &category, table: &snapshot.vps_pricing },
            &input(),
            Decimal::ZERO,
            Decimal::ZERO,
        );

        assert_eq!(breakdown.server_cost, Decimal::from(3000 + 4500 + 750));
        assert_eq!(
            breakdown.diagnostics,
            vec![ConfigDiagnostic::MissingPriceEntry {
                category: "V3".to_string(),
                table: PriceMap::AdditionalRamCostPerGb,
            }]
        );
    }

    #[test]
    fn invalid_input_is_clamped_before_pricing() {
        let snapshot = PricingSnapshot::demo();
        let category = v3();
        let context = VpsPricingContext { category: &category, table: &snapshot.vps_pricing };
        let raw = price_vps(
            context,
            &VpsInput { cpu_count: 0, ram_gb: 0, storage_gb: 0, vm_count: 0, baas_backup_gb: 0 },
            Decimal::ZERO,
            Decimal::ZERO,
        );
        let floored = price_vps(
            context,
            &VpsInput { cpu_count: 1, ram_gb: 1, storage_gb: 10, vm_count: 0, baas_backup_gb: 0 },
            Decimal::ZERO,
            Decimal::ZERO,
        );
        assert_eq!(raw, floored);
    }

    #[test]
    fn vps_costs_are_monotone_in_each_input() {
        let snapshot = PricingSnapshot::demo();
        let category = v3();
        let context = VpsPricingContext { category: &category, table: &snapshot.vps_pricing };
        let price = |input: VpsInput| price_vps(context, &input, Decimal::from(50), Decimal::ZERO);

        let bumps: [fn(VpsInput, u32) -> VpsInput; 5] = [
            |i, n| VpsInput { cpu_count: n, ..i },
            |i, n| VpsInput { ram_gb: n, ..i },
            |i, n| VpsInput { storage_gb: n, ..i },
            |i, n| VpsInput { vm_count: n, ..i },
            |i, n| VpsInput { baas_backup_gb: n, ..i },
        ];

        for bump in bumps {
            let mut previous = price(bump(input(), 0));
            for n in 1..40 {
                let current = price(bump(input(), n));
                assert!(current.server_cost >= previous.server_cost);
                assert!(current.total_cost >= previous.total_cost);
                assert!(current.discounted_cost >= previous.discounted_cost);
                assert!(current.discounted_cost >= Decimal::ZERO);
                previous = current;
            }
        }
    }

    #[test]
    fn pricing_is_idempotent() {
        let snapshot = PricingSnapshot::demo();
        let category = v3();
        let context = VpsPricingContext { category: &category, table: &snapshot.vps_pricing };
        let first = price_vps(context, &input(), Decimal::from(70), Decimal::from(5));
        let second = price_vps(context, &input(), Decimal::from(70), Decimal::from(5));
        assert_eq!(first, second);
    }

    #[test]
    fn baas_per_gb_applies_margin() {
        let table = PricingSnapshot::demo().baas_pricing;
        let breakdown = price_baas(&table, &BaasInput::PerGb { gigabytes: 100 }, Decimal::from(50));

        assert_eq!(breakdown.base_cost, Decimal::from(3500));
        assert_eq!(breakdown.margin_percent, Decimal::from(50));
        assert_eq!(breakdown.final_cost, Decimal::from(5250));
    }

    #[test]
    fn baas_per_device_uses_device_rate() {
        let table = BaasPriceTable {
            per_gb_cost: Decimal::from(35),
            per_server_cost: Decimal::from(2250),
            per_workstation_cost: Decimal::from(1125),
        };

        let servers = price_baas(
            &table,
            &BaasInput::PerDevice { device: DeviceType::Server, count: 2 },
            Decimal::ZERO,
        );
        assert_eq!(servers.base_cost, Decimal::from(4500));
        assert_eq!(servers.final_cost, Decimal::from(4500));

        let workstations = price_baas(
            &table,
            &BaasInput::PerDevice { device: DeviceType::Workstation, count: 3 },
            Decimal::ONE_HUNDRED,
        );
        assert_eq!(workstations.base_cost, Decimal::from(3375));
        assert_eq!(workstations.final_cost, Decimal::from(6750));
    }

    #[test]
    fn baas_is_monotone_in_quantity() {
        let table = PricingSnapshot::demo().baas_pricing;
        let mut previous = Decimal::ZERO;
        for gigabytes in 0..50 {
            let cost = price_baas(&table, &BaasInput::PerGb { gigabytes }, Decimal::from(40)).final_cost;
            assert!(cost >= previous);
            previous = cost;
        }
    }
}
