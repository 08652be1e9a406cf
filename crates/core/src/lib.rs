pub mod config;
pub mod cpq;
pub mod diagnostics;
pub mod domain;
pub mod errors;
pub mod store;

pub use cpq::discount::{resolve_discount, DiscountResolution};
pub use cpq::format::{format_amount, Currency};
pub use cpq::input::{BaasInput, DeviceType, VpsForm, VpsInput};
pub use cpq::margin::{resolve_effective_margin, MarginContribution, MarginResolution};
pub use cpq::pricing::{price_baas, price_vps, BaasBreakdown, VpsBreakdown, VpsPricingContext};
pub use cpq::{
    BaasQuote, BaasQuoteInput, CalculatorOptions, CalculatorRuntime, DeterministicCalculator,
    VpsQuote, VpsQuoteInput,
};
pub use diagnostics::{consistency_report, ConfigDiagnostic};
pub use domain::account::{Account, CurrentUser, Margin, NewAccount, ProductLine, Role, UserId};
pub use domain::catalog::{
    BaasPricePatch, BaasPriceTable, CategoryId, CpuCategory, CpuRates, DiscountTier, PriceMap,
    TierId, VpsPricePatch, VpsPriceTable,
};
pub use errors::{ApplicationError, DomainError};
pub use store::{PricingSnapshot, SnapshotUpdate};
