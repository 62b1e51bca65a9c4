//! Static, zone-based delivery estimates.
//!
//! The estimate is a pure function of (region, method, now): zone transit days
//! plus warehouse processing days, walked forward on the business calendar.
//! `now` is read once, so both ends of the window share the same cutoff
//! decision.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use delivery_estimate_core::{PostalCode, Price, RegionCode, ShippingMethod};
use serde::Serialize;
use tracing::debug;

use crate::calendar::BusinessCalendar;
use crate::format;
use crate::zip_region::RegionResolver;
use crate::zones::{Zone, ZoneTable};

/// Where an estimate's dates came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateSource {
    StaticCalculation,
    LiveQuote,
}

/// A delivery window for one destination and method.
///
/// Computed per request and never cached across different `now` values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EstimateResult {
    pub zone: Zone,
    pub region: RegionCode,
    pub zip: Option<PostalCode>,
    pub method: ShippingMethod,
    /// Live quote name, or the method's display name for static estimates.
    pub method_name: String,
    pub carrier: Option<String>,
    pub price: Option<Price>,
    /// Carrier transit days, when known.
    pub transit_days: Option<u32>,
    /// Processing plus transit days, when known.
    pub total_days: Option<u32>,
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    pub is_past_cutoff: bool,
    pub source: EstimateSource,
}

impl EstimateResult {
    /// `"Wed, Oct 23 - Thu, Oct 24"`, or a single date when both ends agree.
    #[must_use]
    pub fn range_text(&self) -> String {
        format::range_text(self.min_date, self.max_date)
    }

    /// `"Wednesday, October 23"` for the earliest date.
    #[must_use]
    pub fn full_date_text(&self) -> String {
        format::long_date(self.min_date)
    }
}

/// Dates for one static estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StaticWindow {
    pub transit_days: u32,
    pub total_days: u32,
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    pub is_past_cutoff: bool,
}

/// Zone and calendar based estimator.
#[derive(Clone)]
pub struct EstimateCalculator {
    resolver: Arc<dyn RegionResolver>,
    zones: ZoneTable,
    calendar: BusinessCalendar,
    processing_days: u32,
}

impl std::fmt::Debug for EstimateCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EstimateCalculator")
            .field("default_region", &self.resolver.default_region())
            .field("zones", &self.zones.zones().len())
            .field("calendar", &self.calendar)
            .field("processing_days", &self.processing_days)
            .finish()
    }
}

impl EstimateCalculator {
    #[must_use]
    pub fn new(
        resolver: Arc<dyn RegionResolver>,
        zones: ZoneTable,
        calendar: BusinessCalendar,
        processing_days: u32,
    ) -> Self {
        Self {
            resolver,
            zones,
            calendar,
            processing_days,
        }
    }

    #[must_use]
    pub fn resolver(&self) -> &dyn RegionResolver {
        self.resolver.as_ref()
    }

    #[must_use]
    pub const fn zones(&self) -> &ZoneTable {
        &self.zones
    }

    #[must_use]
    pub const fn calendar(&self) -> &BusinessCalendar {
        &self.calendar
    }

    #[must_use]
    pub const fn processing_days(&self) -> u32 {
        self.processing_days
    }

    /// Region for a possibly malformed ZIP.
    #[must_use]
    pub fn region_for_zip(&self, zip: Option<&str>) -> RegionCode {
        self.resolver.region_for_zip(zip)
    }

    /// Estimate delivery to `region` with `method`, as of `now`.
    #[must_use]
    pub fn estimate(
        &self,
        region: &RegionCode,
        method: ShippingMethod,
        now: DateTime<Utc>,
    ) -> EstimateResult {
        let zone = self.zones.classify(region);
        let window = self.static_window(zone, method, now);

        debug!(
            region = %region,
            zone = %zone.id,
            method = %method,
            total_days = window.total_days,
            past_cutoff = window.is_past_cutoff,
            "Static delivery estimate"
        );

        EstimateResult {
            zone: zone.clone(),
            region: *region,
            zip: None,
            method,
            method_name: method.display_name().to_owned(),
            carrier: None,
            price: Some(zone.estimate_price(method)),
            transit_days: Some(window.transit_days),
            total_days: Some(window.total_days),
            min_date: window.min_date,
            max_date: window.max_date,
            is_past_cutoff: window.is_past_cutoff,
            source: EstimateSource::StaticCalculation,
        }
    }

    /// Estimate for a raw ZIP; the region comes from the resolver.
    #[must_use]
    pub fn estimate_for_zip(
        &self,
        zip: Option<&str>,
        method: ShippingMethod,
        now: DateTime<Utc>,
    ) -> EstimateResult {
        let region = self.region_for_zip(zip);
        let mut result = self.estimate(&region, method, now);
        result.zip = zip.and_then(|z| PostalCode::parse(z).ok());
        result
    }

    pub(crate) fn static_window(
        &self,
        zone: &Zone,
        method: ShippingMethod,
        now: DateTime<Utc>,
    ) -> StaticWindow {
        let transit_days = zone.transit_days(method);
        let total_days = transit_days.saturating_add(self.processing_days);
        let is_past_cutoff = self.calendar.is_past_cutoff(now);
        let today = self.calendar.local_date(now);

        StaticWindow {
            transit_days,
            total_days,
            min_date: BusinessCalendar::add_business_days(today, total_days, is_past_cutoff),
            max_date: BusinessCalendar::add_business_days(
                today,
                total_days.saturating_add(1),
                is_past_cutoff,
            ),
            is_past_cutoff,
        }
    }
}
