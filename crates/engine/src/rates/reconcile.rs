//! Merge a live quote set with the static estimate.

use std::time::Duration;

use chrono::{DateTime, Utc};
use delivery_estimate_core::{PostalCode, ShippingMethod};
use tracing::debug;

use super::quote::{CachedQuoteSet, DeliveryTiming, Quote, select_quote};
use crate::calendar::BusinessCalendar;
use crate::estimate::{EstimateCalculator, EstimateResult, EstimateSource};

/// Prefers a fresh live quote, falls back to the zone estimate.
#[derive(Debug, Clone)]
pub struct LiveRateReconciler {
    calculator: EstimateCalculator,
    quote_ttl: Duration,
}

impl LiveRateReconciler {
    #[must_use]
    pub const fn new(calculator: EstimateCalculator, quote_ttl: Duration) -> Self {
        Self {
            calculator,
            quote_ttl,
        }
    }

    #[must_use]
    pub const fn calculator(&self) -> &EstimateCalculator {
        &self.calculator
    }

    #[must_use]
    pub const fn quote_ttl(&self) -> Duration {
        self.quote_ttl
    }

    /// Estimate for `zip` using `quotes` when they are usable.
    ///
    /// A set that is missing, empty, expired, or for another destination is
    /// ignored and the result is the static calculation for the ZIP's region.
    #[must_use]
    pub fn reconcile(
        &self,
        zip: &str,
        method: ShippingMethod,
        quotes: Option<&CachedQuoteSet>,
        now: DateTime<Utc>,
    ) -> EstimateResult {
        let destination = PostalCode::parse(zip).ok();

        let usable = quotes.filter(|set| {
            !set.is_empty()
                && !set.is_expired(now, self.quote_ttl)
                && destination.as_ref() == Some(set.destination_zip())
        });

        let Some(quote) = usable.and_then(|set| select_quote(set.quotes(), method)) else {
            debug!(zip, method = %method, "No usable live quotes, using static estimate");
            return self.calculator.estimate_for_zip(Some(zip), method, now);
        };

        self.live_estimate(zip, destination, method, quote, now)
    }

    fn live_estimate(
        &self,
        zip: &str,
        destination: Option<PostalCode>,
        method: ShippingMethod,
        quote: &Quote,
        now: DateTime<Utc>,
    ) -> EstimateResult {
        let region = self.calculator.region_for_zip(Some(zip));
        let zone = self.calculator.zones().classify(&region);
        let window = self.calculator.static_window(zone, method, now);
        let today = self.calculator.calendar().local_date(now);

        let (min_date, max_date, transit_days, total_days) = match quote.delivery {
            DeliveryTiming::Date { date } => (date, date, None, None),
            DeliveryTiming::Range { earliest, latest } => (earliest, latest, None, None),
            DeliveryTiming::BusinessDays { min, max } => (
                BusinessCalendar::add_business_days(today, min, window.is_past_cutoff),
                BusinessCalendar::add_business_days(today, max, window.is_past_cutoff),
                Some(min),
                None,
            ),
            DeliveryTiming::Unknown => (
                window.min_date,
                window.max_date,
                Some(window.transit_days),
                Some(window.total_days),
            ),
        };

        debug!(
            zip,
            method = %method,
            quote = %quote.name,
            price = %quote.price,
            "Using live quote"
        );

        EstimateResult {
            zone: zone.clone(),
            region,
            zip: destination,
            method,
            method_name: quote.name.clone(),
            carrier: quote.carrier.clone(),
            price: Some(quote.price),
            transit_days,
            total_days,
            min_date,
            max_date,
            is_past_cutoff: window.is_past_cutoff,
            source: EstimateSource::LiveQuote,
        }
    }
}
