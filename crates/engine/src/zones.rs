//! Shipping zones measured from the origin warehouse.
//!
//! Zones are checked in declaration order and the first one that lists a
//! region wins, so a table with overlapping region sets still classifies
//! deterministically. Regions that no zone claims fall into the table's
//! default zone (the mid tier for the standard table).

use core::fmt;

use delivery_estimate_core::{Price, RegionCode, ShippingMethod};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Zone identifier (`zone1`, `zone2`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(u8);

impl ZoneId {
    #[must_use]
    pub const fn new(tier: u8) -> Self {
        Self(tier)
    }

    /// Tier number; lower is closer to the warehouse.
    #[must_use]
    pub const fn tier(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zone{}", self.0)
    }
}

/// Carrier transit time, in business days, per shipping method.
///
/// Ground is mandatory; any other method without an entry uses ground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitDays {
    pub ground: u32,
    pub express: Option<u32>,
    pub overnight: Option<u32>,
    pub two_day: Option<u32>,
}

impl TransitDays {
    #[must_use]
    pub const fn new(ground: u32, express: u32, overnight: u32) -> Self {
        Self {
            ground,
            express: Some(express),
            overnight: Some(overnight),
            two_day: None,
        }
    }

    /// Transit days for `method`, falling back to ground.
    #[must_use]
    pub fn days_for(&self, method: ShippingMethod) -> u32 {
        let specific = match method {
            ShippingMethod::Ground => Some(self.ground),
            ShippingMethod::Express => self.express,
            ShippingMethod::Overnight => self.overnight,
            ShippingMethod::TwoDay => self.two_day,
        };
        specific.unwrap_or(self.ground)
    }
}

/// Typical price per method, shown when no live quote is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticPrices {
    pub ground: Decimal,
    pub express: Decimal,
    pub overnight: Decimal,
}

impl StaticPrices {
    fn cents(ground: i64, express: i64, overnight: i64) -> Self {
        Self {
            ground: Decimal::new(ground, 2),
            express: Decimal::new(express, 2),
            overnight: Decimal::new(overnight, 2),
        }
    }

    /// Price for `method`; two-day is billed at the express rate.
    #[must_use]
    pub const fn price_for(&self, method: ShippingMethod) -> Decimal {
        match method {
            ShippingMethod::Ground => self.ground,
            ShippingMethod::Express | ShippingMethod::TwoDay => self.express,
            ShippingMethod::Overnight => self.overnight,
        }
    }
}

/// One tier of the zone table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub regions: Vec<RegionCode>,
    pub transit: TransitDays,
    pub static_prices: StaticPrices,
}

impl Zone {
    #[must_use]
    pub fn new(
        id: ZoneId,
        name: impl Into<String>,
        regions: &[&'static str],
        transit: TransitDays,
        static_prices: StaticPrices,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            regions: regions.iter().copied().map(RegionCode::from_static).collect(),
            transit,
            static_prices,
        }
    }

    #[must_use]
    pub fn contains(&self, region: &RegionCode) -> bool {
        self.regions.contains(region)
    }

    /// Transit days for `method` in this zone.
    #[must_use]
    pub fn transit_days(&self, method: ShippingMethod) -> u32 {
        self.transit.days_for(method)
    }

    /// Typical USD price for `method` in this zone.
    #[must_use]
    pub const fn estimate_price(&self, method: ShippingMethod) -> Price {
        Price::usd(self.static_prices.price_for(method))
    }
}

/// Ordered zone table with a default zone.
#[derive(Debug, Clone)]
pub struct ZoneTable {
    zones: Vec<Zone>,
    default_zone: Zone,
}

impl ZoneTable {
    /// Build a table. The default zone does not need to be one of `zones`.
    #[must_use]
    pub const fn new(zones: Vec<Zone>, default_zone: Zone) -> Self {
        Self {
            zones,
            default_zone,
        }
    }

    /// Six-tier table for the New Jersey warehouse.
    ///
    /// Transit times follow typical carrier ground service from NJ.
    #[must_use]
    pub fn standard() -> Self {
        let zones = vec![
            Zone::new(
                ZoneId::new(1),
                "Northeast",
                &["NJ", "NY", "PA", "CT", "MA", "RI", "NH", "VT", "ME", "DE", "MD", "DC"],
                TransitDays::new(2, 1, 1),
                StaticPrices::cents(899, 1499, 2999),
            ),
            Zone::new(
                ZoneId::new(2),
                "Mid-Atlantic",
                &["VA", "WV", "NC", "OH", "MI", "IN"],
                TransitDays::new(3, 2, 1),
                StaticPrices::cents(999, 1699, 3499),
            ),
            Zone::new(
                ZoneId::new(3),
                "Southeast/Midwest",
                &["SC", "GA", "FL", "TN", "KY", "AL", "MS", "IL", "WI", "MN", "IA", "MO"],
                TransitDays::new(4, 2, 1),
                StaticPrices::cents(1199, 1999, 3999),
            ),
            Zone::new(
                ZoneId::new(4),
                "Central",
                &["AR", "LA", "TX", "OK", "KS", "NE", "SD", "ND"],
                TransitDays::new(5, 3, 2),
                StaticPrices::cents(1399, 2499, 4999),
            ),
            Zone::new(
                ZoneId::new(5),
                "Mountain",
                &["MT", "WY", "CO", "NM", "ID", "UT", "AZ", "NV"],
                TransitDays::new(6, 3, 2),
                StaticPrices::cents(1599, 2999, 5999),
            ),
            Zone::new(
                ZoneId::new(6),
                "Pacific",
                &["WA", "OR", "CA", "AK", "HI", "PR", "VI", "GU"],
                TransitDays::new(7, 4, 2),
                StaticPrices::cents(1899, 3499, 6999),
            ),
        ];

        let default_zone = zones
            .iter()
            .find(|z| z.id == ZoneId::new(3))
            .cloned()
            .unwrap_or_else(mid_tier_fallback);

        Self::new(zones, default_zone)
    }

    /// Classify a region. First matching zone wins; no match yields the default.
    #[must_use]
    pub fn classify(&self, region: &RegionCode) -> &Zone {
        self.zones
            .iter()
            .find(|zone| zone.contains(region))
            .unwrap_or(&self.default_zone)
    }

    /// The zone returned for unmatched regions.
    #[must_use]
    pub const fn default_zone(&self) -> &Zone {
        &self.default_zone
    }

    /// Zones in classification order.
    #[must_use]
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }
}

impl Default for ZoneTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn mid_tier_fallback() -> Zone {
    Zone::new(
        ZoneId::new(3),
        "Southeast/Midwest",
        &[],
        TransitDays::new(4, 2, 1),
        StaticPrices::cents(1199, 1999, 3999),
    )
}
