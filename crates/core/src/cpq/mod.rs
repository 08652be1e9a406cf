pub mod discount;
pub mod format;
pub mod input;
pub mod margin;
pub mod pricing;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::diagnostics::ConfigDiagnostic;
use crate::domain::account::{CurrentUser, ProductLine};
use crate::domain::catalog::CpuCategory;
use crate::store::PricingSnapshot;

use self::{
    discount::{resolve_discount, DiscountResolution},
    format::{format_amount, Currency},
    input::{BaasInput, VpsInput},
    margin::{resolve_effective_margin, MarginResolution},
    pricing::{price_baas, price_vps, BaasBreakdown, VpsBreakdown, VpsPricingContext},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculatorOptions {
    pub currency: Currency,
    pub apply_volume_discounts: bool,
}

impl Default for CalculatorOptions {
    fn default() -> Self {
        Self { currency: Currency::Inr, apply_volume_discounts: true }
    }
}

#[derive(Clone, Debug)]
pub struct VpsQuoteInput<'a> {
    pub snapshot: &'a PricingSnapshot,
    pub user: &'a CurrentUser,
    pub category: &'a str,
    pub input: VpsInput,
}

#[derive(Clone, Debug)]
pub struct BaasQuoteInput<'a> {
    pub snapshot: &'a PricingSnapshot,
    pub user: &'a CurrentUser,
    pub input: BaasInput,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpsQuote {
    pub input: VpsInput,
    pub currency: Currency,
    pub margin: MarginResolution,
    pub discount: DiscountResolution,
    pub breakdown: VpsBreakdown,
    pub display_final: String,
    pub display_discounted: String,
    pub diagnostics: Vec<ConfigDiagnostic>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaasQuote {
    pub input: BaasInput,
    pub currency: Currency,
    pub margin: MarginResolution,
    pub breakdown: BaasBreakdown,
    pub display_final: String,
    pub diagnostics: Vec<ConfigDiagnostic>,
}

pub trait CalculatorRuntime: Send + Sync {
    fn quote_vps(&self, request: VpsQuoteInput<'_>) -> VpsQuote;
    fn quote_baas(&self, request: BaasQuoteInput<'_>) -> BaasQuote;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicCalculator {
    options: CalculatorOptions,
}

impl DeterministicCalculator {
    pub fn new(options: CalculatorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> CalculatorOptions {
        self.options
    }
}

impl CalculatorRuntime for DeterministicCalculator {
    fn quote_vps(&self, request: VpsQuoteInput<'_>) -> VpsQuote {
        let snapshot = request.snapshot;
        let input = request.input.clamped();
        let mut diagnostics = Vec::new();

        let category = match snapshot.category_named(request.category) {
            Some(category) => category.clone(),
            None => {
                diagnostics.push(ConfigDiagnostic::UnknownCategory {
                    category: request.category.to_string(),
                });
                CpuCategory::new(request.category, Decimal::ZERO)
            }
        };

        let margin = resolve_effective_margin(
            &snapshot.accounts,
            &snapshot.margins,
            &request.user.id,
            ProductLine::Vps,
        );
        let discount = if self.options.apply_volume_discounts {
            resolve_discount(&snapshot.discount_tiers, input.vm_count)
        } else {
            DiscountResolution::none()
        };

        let breakdown = price_vps(
            VpsPricingContext { category: &category, table: &snapshot.vps_pricing },
            &input,
            margin.percent,
            discount.percent,
        );

        diagnostics.extend(breakdown.diagnostics.iter().cloned());
        diagnostics.extend(margin.diagnostics.iter().cloned());
        diagnostics.extend(discount.diagnostics.iter().cloned());

        let currency = self.options.currency;
        VpsQuote {
            input,
            currency,
            display_final: format_amount(breakdown.final_cost, currency),
            display_discounted: format_amount(breakdown.discounted_cost, currency),
            margin,
            discount,
            breakdown,
            diagnostics,
        }
    }

    fn quote_baas(&self, request: BaasQuoteInput<'_>) -> BaasQuote {
        let snapshot = request.snapshot;
        let input = request.input.clamped();
        let margin = resolve_effective_margin(
            &snapshot.accounts,
            &snapshot.margins,
            &request.user.id,
            ProductLine::Baas,
        );
        let breakdown = price_baas(&snapshot.baas_pricing, &input, margin.percent);
        let currency = self.options.currency;

        BaasQuote {
            input,
            currency,
            display_final: format_amount(breakdown.final_cost, currency),
            diagnostics: margin.diagnostics.clone(),
            margin,
            breakdown,
        }
    }
}
