//! Static delivery estimates against a frozen clock.
//!
//! All instants are US Eastern wall-clock times; the default warehouse ships
//! from New Jersey with a 14:00 cutoff and one processing day.

#![allow(clippy::unwrap_used)]

use chrono::{Datelike, NaiveDate, TimeZone, Utc, Weekday};
use delivery_estimate::calendar::BusinessCalendar;
use delivery_estimate::zones::ZoneId;
use delivery_estimate::EstimateSource;
use delivery_estimate_core::{RegionCode, ShippingMethod};
use delivery_estimate_integration_tests::{calculator, eastern};

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

// =============================================================================
// Warehouse region
// =============================================================================

#[test]
fn test_tuesday_morning_ground_from_warehouse_region() {
    // Tue 2024-10-15 10:00, two hours before cutoff.
    let now = eastern(2024, 10, 15, 10, 0);
    let result = calculator().estimate_for_zip(Some("07105"), ShippingMethod::Ground, now);

    assert_eq!(result.region.as_str(), "NJ");
    assert_eq!(result.zone.id, ZoneId::new(1));
    assert_eq!(result.transit_days, Some(2));
    assert_eq!(result.total_days, Some(3));
    assert!(!result.is_past_cutoff);
    assert_eq!(result.min_date, date(10, 18));
    assert_eq!(result.min_date.weekday(), Weekday::Fri);
    assert_eq!(result.max_date, date(10, 21));
    assert_eq!(result.source, EstimateSource::StaticCalculation);
    assert_eq!(result.zip.as_ref().map(|z| z.as_str()), Some("07105"));
}

#[test]
fn test_friday_after_cutoff_skips_weekend() {
    // Fri 2024-10-18 16:00: the walk starts Saturday, Mon-Wed are counted.
    let now = eastern(2024, 10, 18, 16, 0);
    let result = calculator().estimate_for_zip(Some("07105"), ShippingMethod::Ground, now);

    assert!(result.is_past_cutoff);
    assert_eq!(result.min_date, date(10, 23));
    assert_eq!(result.max_date, date(10, 24));
}

#[test]
fn test_friday_before_cutoff_still_crosses_weekend() {
    let now = eastern(2024, 10, 18, 9, 30);
    let result = calculator().estimate_for_zip(Some("07105"), ShippingMethod::Ground, now);

    assert!(!result.is_past_cutoff);
    assert_eq!(result.min_date, date(10, 23));
    assert_eq!(result.max_date, date(10, 24));
}

#[test]
fn test_range_text() {
    let now = eastern(2024, 10, 15, 10, 0);
    let result = calculator().estimate_for_zip(Some("07105"), ShippingMethod::Ground, now);

    assert_eq!(result.range_text(), "Fri, Oct 18 - Mon, Oct 21");
}

// =============================================================================
// Cutoff in local time
// =============================================================================

#[test]
fn test_cutoff_follows_daylight_saving() {
    let calendar = BusinessCalendar::default();

    // 18:30 UTC is 14:30 EDT in October and 13:30 EST in November.
    let october = Utc.with_ymd_and_hms(2024, 10, 28, 18, 30, 0).unwrap();
    let november = Utc.with_ymd_and_hms(2024, 11, 4, 18, 30, 0).unwrap();

    assert!(calendar.is_past_cutoff(october));
    assert!(!calendar.is_past_cutoff(november));
}

#[test]
fn test_local_date_differs_from_utc_date() {
    // 22:00 Eastern on Monday is already Tuesday in UTC.
    let now = eastern(2024, 10, 14, 22, 0);
    assert_eq!(now.date_naive(), date(10, 15));
    assert_eq!(BusinessCalendar::default().local_date(now), date(10, 14));
}

// =============================================================================
// Zones and methods
// =============================================================================

#[test]
fn test_estimate_zone_matches_classification() {
    let calc = calculator();
    let now = eastern(2024, 10, 15, 10, 0);

    for code in ["NJ", "VA", "FL", "TX", "CO", "CA", "ZZ"] {
        let region = RegionCode::parse(code).unwrap();
        for method in ShippingMethod::ALL {
            let result = calc.estimate(&region, method, now);
            assert_eq!(&result.zone, calc.zones().classify(&region), "{code} {method}");
        }
    }
}

#[test]
fn test_unknown_region_uses_default_zone() {
    let calc = calculator();
    let region = RegionCode::parse("ZZ").unwrap();
    let result = calc.estimate(&region, ShippingMethod::Ground, eastern(2024, 10, 15, 10, 0));

    assert_eq!(&result.zone, calc.zones().default_zone());
}

#[test]
fn test_faster_methods_never_arrive_later() {
    let calc = calculator();
    let now = eastern(2024, 10, 15, 10, 0);
    let region = RegionCode::parse("CA").unwrap();

    let ground = calc.estimate(&region, ShippingMethod::Ground, now);
    let express = calc.estimate(&region, ShippingMethod::Express, now);
    let overnight = calc.estimate(&region, ShippingMethod::Overnight, now);

    assert!(express.min_date <= ground.min_date);
    assert!(overnight.min_date <= express.min_date);
}

#[test]
fn test_window_on_business_days_for_every_start() {
    let calc = calculator();
    let region = RegionCode::parse("TX").unwrap();

    // Two full weeks of mornings and evenings.
    for day in 14..28 {
        for hour in [9, 17] {
            let now = eastern(2024, 10, day, hour, 0);
            let result = calc.estimate(&region, ShippingMethod::Ground, now);
            assert!(result.min_date < result.max_date);
            assert!(!BusinessCalendar::is_weekend(result.min_date));
            assert!(!BusinessCalendar::is_weekend(result.max_date));
        }
    }
}

#[test]
fn test_malformed_zip_uses_default_region() {
    let now = eastern(2024, 10, 15, 10, 0);
    let result = calculator().estimate_for_zip(Some("not a zip"), ShippingMethod::Ground, now);

    assert_eq!(result.region.as_str(), "NJ");
    assert!(result.zip.is_none());
}
