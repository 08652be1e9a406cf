use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub String);

impl CategoryId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierId(pub String);

impl TierId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for TierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A CPU family. `name` doubles as the key into every per-category price map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuCategory {
    pub id: CategoryId,
    pub name: String,
    #[serde(rename = "ramPerCpuGB")]
    pub ram_per_cpu_gb: Decimal,
}

impl CpuCategory {
    pub fn new(name: impl Into<String>, ram_per_cpu_gb: Decimal) -> Self {
        Self { id: CategoryId::generate(), name: name.into(), ram_per_cpu_gb }
    }

    pub fn is_nvme(&self) -> bool {
        self.name.to_ascii_uppercase().contains("NVME")
    }
}

/// Identifies one of the per-category maps of [`VpsPriceTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PriceMap {
    CpuCost,
    #[serde(rename = "ramCostPerGB")]
    RamCostPerGb,
    #[serde(rename = "additionalRamCostPerGB")]
    AdditionalRamCostPerGb,
    #[serde(rename = "storageCostPerGB")]
    StorageCostPerGb,
}

impl PriceMap {
    pub const ALL: [PriceMap; 4] =
        [Self::CpuCost, Self::RamCostPerGb, Self::AdditionalRamCostPerGb, Self::StorageCostPerGb];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CpuCost => "cpuCost",
            Self::RamCostPerGb => "ramCostPerGB",
            Self::AdditionalRamCostPerGb => "additionalRamCostPerGB",
            Self::StorageCostPerGb => "storageCostPerGB",
        }
    }
}

/// Unit rates for a single CPU category, flattened out of the per-category maps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuRates {
    pub cpu_cost: Decimal,
    pub ram_cost_per_gb: Decimal,
    pub additional_ram_cost_per_gb: Decimal,
    pub storage_cost_per_gb: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpsPriceTable {
    #[serde(default)]
    pub cpu_cost: BTreeMap<String, Decimal>,
    #[serde(default, rename = "ramCostPerGB")]
    pub ram_cost_per_gb: BTreeMap<String, Decimal>,
    #[serde(default, rename = "additionalRamCostPerGB")]
    pub additional_ram_cost_per_gb: BTreeMap<String, Decimal>,
    #[serde(default, rename = "storageCostPerGB")]
    pub storage_cost_per_gb: BTreeMap<String, Decimal>,
    pub vm_cost: Decimal,
    #[serde(rename = "backupCostPerGB")]
    pub backup_cost_per_gb: Decimal,
    #[serde(rename = "baasCostPerGB")]
    pub baas_cost_per_gb: Decimal,
    pub dynamic_hardware_margin_percent: Decimal,
    #[serde(default)]
    pub hosting_cost: Decimal,
}

impl VpsPriceTable {
    pub fn map(&self, which: PriceMap) -> &BTreeMap<String, Decimal> {
        match which {
            PriceMap::CpuCost => &self.cpu_cost,
            PriceMap::RamCostPerGb => &self.ram_cost_per_gb,
            PriceMap::AdditionalRamCostPerGb => &self.additional_ram_cost_per_gb,
            PriceMap::StorageCostPerGb => &self.storage_cost_per_gb,
        }
    }

    pub fn map_mut(&mut self, which: PriceMap) -> &mut BTreeMap<String, Decimal> {
        match which {
            PriceMap::CpuCost => &mut self.cpu_cost,
            PriceMap::RamCostPerGb => &mut self.ram_cost_per_gb,
            PriceMap::AdditionalRamCostPerGb => &mut self.additional_ram_cost_per_gb,
            PriceMap::StorageCostPerGb => &mut self.storage_cost_per_gb,
        }
    }

    /// Rates for `category`, with the list of maps that had no entry for it.
    /// Missing entries price as zero.
    pub fn rates_for(&self, category: &str) -> (CpuRates, Vec<PriceMap>) {
        let mut missing = Vec::new();
        let mut lookup = |which: PriceMap| match self.map(which).get(category) {
            Some(value) => *value,
            None => {
                missing.push(which);
                Decimal::ZERO
            }
        };

        let rates = CpuRates {
            cpu_cost: lookup(PriceMap::CpuCost),
            ram_cost_per_gb: lookup(PriceMap::RamCostPerGb),
            additional_ram_cost_per_gb: lookup(PriceMap::AdditionalRamCostPerGb),
            storage_cost_per_gb: lookup(PriceMap::StorageCostPerGb),
        };
        (rates, missing)
    }

    pub fn set_rates(&mut self, category: &str, rates: CpuRates) {
        self.cpu_cost.insert(category.to_string(), rates.cpu_cost);
        self.ram_cost_per_gb.insert(category.to_string(), rates.ram_cost_per_gb);
        self.additional_ram_cost_per_gb
            .insert(category.to_string(), rates.additional_ram_cost_per_gb);
        self.storage_cost_per_gb.insert(category.to_string(), rates.storage_cost_per_gb);
    }
}

/// Partial update for [`VpsPriceTable`]; `None` keeps the current value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpsPricePatch {
    #[serde(default)]
    pub category_rates: BTreeMap<String, CpuRates>,
    pub vm_cost: Option<Decimal>,
    pub backup_cost_per_gb: Option<Decimal>,
    pub baas_cost_per_gb: Option<Decimal>,
    pub dynamic_hardware_margin_percent: Option<Decimal>,
    pub hosting_cost: Option<Decimal>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaasPriceTable {
    pub per_gb_cost: Decimal,
    pub per_server_cost: Decimal,
    pub per_workstation_cost: Decimal,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaasPricePatch {
    pub per_gb_cost: Option<Decimal>,
    pub per_server_cost: Option<Decimal>,
    pub per_workstation_cost: Option<Decimal>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountTier {
    pub id: TierId,
    pub min_vms: u32,
    pub discount_percent: Decimal,
}

impl DiscountTier {
    pub fn new(min_vms: u32, discount_percent: Decimal) -> Self {
        Self { id: TierId::generate(), min_vms, discount_percent }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{CpuCategory, CpuRates, PriceMap, VpsPriceTable};

    fn table() -> VpsPriceTable {
        let mut table = VpsPriceTable {
            cpu_cost: Default::default(),
            ram_cost_per_gb: Default::default(),
            additional_ram_cost_per_gb: Default::default(),
            storage_cost_per_gb: Default::default(),
            vm_cost: Decimal::from(1500),
            backup_cost_per_gb: Decimal::from(8),
            baas_cost_per_gb: Decimal::from(12),
            dynamic_hardware_margin_percent: Decimal::from(15),
            hosting_cost: Decimal::ZERO,
        };
        table.set_rates(
            "V3",
            CpuRates {
                cpu_cost: Decimal::from(3000),
                ram_cost_per_gb: Decimal::from(1500),
                additional_ram_cost_per_gb: Decimal::from(2000),
                storage_cost_per_gb: Decimal::from(15),
            },
        );
        table
    }

    #[test]
    fn rates_for_known_category_reports_nothing_missing() {
        let (rates, missing) = table().rates_for("V3");
        assert_eq!(rates.cpu_cost, Decimal::from(3000));
        assert_eq!(rates.storage_cost_per_gb, Decimal::from(15));
        assert!(missing.is_empty());
    }

    #[test]
    fn rates_for_missing_entries_price_as_zero() {
        let mut table = table();
        table.storage_cost_per_gb.remove("V3");

        let (rates, missing) = table.rates_for("V3");
        assert_eq!(rates.storage_cost_per_gb, Decimal::ZERO);
        assert_eq!(missing, vec![PriceMap::StorageCostPerGb]);

        let (unknown, missing) = table.rates_for("Platinum");
        assert_eq!(unknown, CpuRates::default());
        assert_eq!(missing.len(), 4);
    }

    #[test]
    fn price_table_serializes_with_gb_suffixed_keys() {
        let encoded = serde_json::to_value(table()).expect("serialize table");
        assert!(encoded.get("ramCostPerGB").is_some());
        assert!(encoded.get("additionalRamCostPerGB").is_some());
        assert!(encoded.get("dynamicHardwareMarginPercent").is_some());
        assert!(encoded.get("hostingCost").is_some());
    }

    #[test]
    fn hosting_cost_defaults_to_zero_when_absent() {
        let decoded: VpsPriceTable = serde_json::from_str(
            r#"{"vmCost":"1500","backupCostPerGB":"8","baasCostPerGB":"12","dynamicHardwareMarginPercent":"15"}"#,
        )
        .expect("deserialize table");
        assert_eq!(decoded.hosting_cost, Decimal::ZERO);
        assert!(decoded.cpu_cost.is_empty());
    }

    #[test]
    fn nvme_detection_is_case_insensitive() {
        assert!(CpuCategory::new("Gold NVME", Decimal::from(6)).is_nvme());
        assert!(CpuCategory::new("gold nvme", Decimal::from(6)).is_nvme());
        assert!(!CpuCategory::new("V3", Decimal::from(3)).is_nvme());
    }
}
