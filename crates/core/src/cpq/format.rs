use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    #[serde(alias = "inr")]
    Inr,
    #[serde(alias = "usd")]
    Usd,
    #[serde(alias = "eur")]
    Eur,
    #[serde(alias = "gbp")]
    Gbp,
}

impl Currency {
    pub fn code(self) -> &'static str {
        match self {
            Self::Inr => "INR",
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Inr => "₹",
            Self::Usd => "$",
            Self::Eur => "€",
            Self::Gbp => "£",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "INR" => Ok(Self::Inr),
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "GBP" => Ok(Self::Gbp),
            other => Err(format!("unsupported currency `{other}` (expected INR|USD|EUR|GBP)")),
        }
    }
}

/// Rounds half away from zero to two places. Presentation only.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Renders an amount with the currency symbol and exactly two decimals. INR uses lakh
/// grouping (`₹12,34,567.00`); everything else groups by thousands.
pub fn format_amount(amount: Decimal, currency: Currency) -> String {
    let rounded = round_money(amount);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let plain = format!("{:.2}", rounded.abs());
    let (whole, fraction) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let grouped = match currency {
        Currency::Inr => group_lakh(whole),
        Currency::Usd | Currency::Eur | Currency::Gbp => group_thousands(whole),
    };

    format!("{}{}{grouped}.{fraction}", if negative { "-" } else { "" }, currency.symbol())
}

fn group_thousands(digits: &str) -> String {
    group(digits, 3, 3)
}

fn group_lakh(digits: &str) -> String {
    group(digits, 3, 2)
}

fn group(digits: &str, first: usize, rest: usize) -> String {
    if digits.len() <= first {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - first);
    let mut groups = vec![tail];
    let mut remaining = head;
    while remaining.len() > rest {
        let (left, right) = remaining.split_at(remaining.len() - rest);
        groups.push(right);
        remaining = left;
    }
    groups.push(remaining);
    groups.reverse();
    groups.join(",")
}
