//! Shipping method selection.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a shipping method name is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown shipping method: {0} (expected ground, express, overnight or 2day)")]
pub struct ShippingMethodError(pub String);

/// Customer-facing shipping speed.
///
/// Live carrier quotes are matched against these by name, and each zone maps
/// them to a transit-day count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    #[default]
    #[serde(alias = "standard")]
    Ground,
    Express,
    #[serde(alias = "next_day", alias = "next-day")]
    Overnight,
    #[serde(rename = "2day", alias = "two_day", alias = "2-day")]
    TwoDay,
}

impl ShippingMethod {
    /// All methods, in display order.
    pub const ALL: [Self; 4] = [Self::Ground, Self::Express, Self::TwoDay, Self::Overnight];

    /// Canonical lower-case key (`ground`, `express`, `overnight`, `2day`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ground => "ground",
            Self::Express => "express",
            Self::Overnight => "overnight",
            Self::TwoDay => "2day",
        }
    }

    /// Human-readable method name shown next to a static estimate.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Ground => "Ground Shipping",
            Self::Express => "Express Shipping",
            Self::Overnight => "Overnight Shipping",
            Self::TwoDay => "2-Day Shipping",
        }
    }
}

impl fmt::Display for ShippingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ShippingMethod {
    type Err = ShippingMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ground" | "standard" => Ok(Self::Ground),
            "express" => Ok(Self::Express),
            "overnight" | "next_day" | "next-day" => Ok(Self::Overnight),
            "2day" | "2-day" | "two_day" => Ok(Self::TwoDay),
            _ => Err(ShippingMethodError(s.to_owned())),
        }
    }
}
