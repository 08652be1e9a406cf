use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Admin,
    Reseller,
    SubReseller,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Reseller => "reseller",
            Self::SubReseller => "sub-reseller",
        }
    }

    /// Only sub-resellers hang off a parent reseller.
    pub fn may_have_parent(self) -> bool {
        matches!(self, Self::SubReseller)
    }

    pub fn carries_margin(self) -> bool {
        match self {
            Self::Admin => false,
            Self::Reseller | Self::SubReseller => true,
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "reseller" => Ok(Self::Reseller),
            "sub-reseller" | "sub_reseller" | "subreseller" => Ok(Self::SubReseller),
            other => Err(format!("unsupported role `{other}` (expected admin|reseller|sub-reseller)")),
        }
    }
}

/// A node of the reseller hierarchy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_reseller_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
}

/// Input for creating an account; the store assigns the id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub parent_reseller_id: Option<UserId>,
    #[serde(default)]
    pub created_by: Option<UserId>,
}

/// The logged-in user as supplied by the external auth provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub role: Role,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductLine {
    Vps,
    Baas,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Margin {
    pub reseller_id: UserId,
    pub vps_margin_percent: Decimal,
    pub baas_margin_percent: Decimal,
}

impl Margin {
    pub const DEFAULT_PERCENT: Decimal = Decimal::ONE_HUNDRED;

    pub fn percent_for(&self, line: ProductLine) -> Decimal {
        match line {
            ProductLine::Vps => self.vps_margin_percent,
            ProductLine::Baas => self.baas_margin_percent,
        }
    }
}
