//! Type-safe price representation using decimal arithmetic.
//!
//! Carrier rates arrive from the cart API in inconsistent shapes: `"12.99"`,
//! `12.99`, `1299` and `"1299"` have all been observed for the same rate.
//! [`normalize_price`] folds them into decimal currency units with one rule:
//!
//! - textual form contains a `.` ⇒ already in currency units
//! - otherwise ⇒ minor units (cents), divided by 100
//!
//! There is no magnitude guessing. A whole-dollar rate sent as a
//! bare integer (`10` meaning $10.00) is read as $0.10; the provider has to send
//! `"10.00"` for that case.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a US dollar price.
    #[must_use]
    pub const fn usd(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::USD)
    }

    /// Create a price from an amount in minor units (cents).
    #[must_use]
    pub fn from_cents(cents: i64, currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::new(cents, 2), currency_code)
    }

    /// Zero in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Whether this is a free (zero-cost) rate.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.amount.is_zero()
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{:.2}", self.currency_code.symbol(), self.amount)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }
}

/// A price field exactly as the rate provider sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPrice {
    Number(serde_json::Number),
    Text(String),
}

impl RawPrice {
    /// The textual representation the unit rule is applied to.
    fn text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_owned(),
        }
    }

    /// Normalize to decimal currency units. See [`normalize_price`].
    #[must_use]
    pub fn normalize(&self) -> Decimal {
        let text = self.text();
        if text.is_empty() {
            return Decimal::ZERO;
        }

        let Some(value) = parse_decimal(&text) else {
            return Decimal::ZERO;
        };

        if text.contains('.') {
            value
        } else {
            value / Decimal::ONE_HUNDRED
        }
    }
}

impl From<&str> for RawPrice {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<i64> for RawPrice {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Convert a raw provider price into decimal currency units.
///
/// Missing, empty and unparsable prices normalize to zero.
///
/// ```
/// use delivery_estimate_core::{RawPrice, normalize_price};
/// use rust_decimal::Decimal;
///
/// assert_eq!(normalize_price(Some(&RawPrice::from("12.99"))), Decimal::new(1299, 2));
/// assert_eq!(normalize_price(Some(&RawPrice::from(1299_i64))), Decimal::new(1299, 2));
/// assert_eq!(normalize_price(Some(&RawPrice::from(0_i64))), Decimal::ZERO);
/// assert_eq!(normalize_price(None), Decimal::ZERO);
/// ```
#[must_use]
pub fn normalize_price(raw: Option<&RawPrice>) -> Decimal {
    raw.map_or(Decimal::ZERO, RawPrice::normalize)
}
