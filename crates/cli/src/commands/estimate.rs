//! Estimate, zone and cutoff commands.
//!
//! # Usage
//!
//! ```bash
//! delivery-cli estimate --zip 90210 --method express --cart-total 64.50
//! delivery-cli zone TX
//! delivery-cli cutoff --at 2024-10-15T13:15:00-04:00
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use delivery_estimate::calendar::{ClosedReason, CutoffStatus};
use delivery_estimate::free_shipping::FreeShippingProgress;
use delivery_estimate::rates::{RateService, ShopifyCartRates};
use delivery_estimate::zones::Zone;
use delivery_estimate::{DeliveryConfig, EstimateResult, format};
use delivery_estimate_core::{Price, RegionCode, ShippingMethod};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{CommandError, print_json};

/// Parsed `estimate` arguments.
#[derive(Debug)]
pub struct EstimateArgs {
    pub zip: Option<String>,
    pub region: Option<RegionCode>,
    pub method: ShippingMethod,
    pub now: DateTime<Utc>,
    pub live: bool,
    pub cart_total: Option<Decimal>,
}

#[derive(Serialize)]
struct EstimateOutput {
    #[serde(flatten)]
    estimate: EstimateResult,
    range_text: String,
    full_date_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    free_shipping: Option<FreeShippingOutput>,
}

#[derive(Serialize)]
struct FreeShippingOutput {
    threshold: Decimal,
    remaining: Decimal,
    qualifies: bool,
    percent: Decimal,
}

impl From<FreeShippingProgress> for FreeShippingOutput {
    fn from(progress: FreeShippingProgress) -> Self {
        Self {
            threshold: progress.threshold,
            remaining: progress.remaining(),
            qualifies: progress.qualifies(),
            percent: progress.percent(),
        }
    }
}

/// Estimate a delivery window and print it.
///
/// # Errors
///
/// Returns an error if `--live` is requested without a configured store.
pub async fn run(config: &DeliveryConfig, args: EstimateArgs) -> Result<(), CommandError> {
    let estimate = match (&args.zip, args.region) {
        (Some(zip), _) if args.live => {
            let shopify = config
                .shopify
                .as_ref()
                .ok_or(CommandError::LiveRatesDisabled)?;
            let provider = ShopifyCartRates::new(shopify, config.rate_timeout)?;
            let service = RateService::new(provider, config.reconciler(), config.rate_timeout);
            service.estimate_for_zip(zip, args.method, args.now).await
        }
        (Some(zip), _) => config
            .calculator()
            .estimate_for_zip(Some(zip), args.method, args.now),
        (None, Some(region)) => config.calculator().estimate(&region, args.method, args.now),
        (None, None) => config
            .calculator()
            .estimate(&config.warehouse_region, args.method, args.now),
    };

    let free_shipping = args.cart_total.map(|total| {
        FreeShippingOutput::from(FreeShippingProgress::new(
            config.free_shipping_threshold,
            total,
        ))
    });

    print_json(&EstimateOutput {
        range_text: estimate.range_text(),
        full_date_text: estimate.full_date_text(),
        estimate,
        free_shipping,
    })
}

#[derive(Serialize)]
struct ZoneOutput<'a> {
    region: RegionCode,
    zone: &'a Zone,
    methods: Vec<MethodRow>,
}

#[derive(Serialize)]
struct MethodRow {
    method: ShippingMethod,
    name: &'static str,
    transit_days: u32,
    transit_text: String,
    estimated_price: Price,
}

/// Print the zone and per-method transit table for `region`.
///
/// # Errors
///
/// Returns an error if the output cannot be serialized.
pub fn zone(config: &DeliveryConfig, region: RegionCode) -> Result<(), CommandError> {
    let calculator = config.calculator();
    let zone = calculator.zones().classify(&region);
    let processing = calculator.processing_days();

    let methods = ShippingMethod::ALL
        .into_iter()
        .map(|method| method_row(zone, method, processing))
        .collect();

    print_json(&ZoneOutput {
        region,
        zone,
        methods,
    })
}

fn method_row(zone: &Zone, method: ShippingMethod, processing: u32) -> MethodRow {
    let transit_days = zone.transit_days(method);
    let total = transit_days.saturating_add(processing);
    MethodRow {
        method,
        name: method.display_name(),
        transit_days,
        transit_text: format::business_days_text(total, total.saturating_add(1)),
        estimated_price: zone.estimate_price(method),
    }
}

#[derive(Serialize)]
struct CutoffOutput {
    local_time: String,
    cutoff_hour: u32,
    #[serde(flatten)]
    status: CutoffStatus,
    message: String,
}

/// Print the same-day dispatch countdown as of `now`.
///
/// # Errors
///
/// Returns an error if the output cannot be serialized.
pub fn cutoff(config: &DeliveryConfig, now: DateTime<Utc>) -> Result<(), CommandError> {
    let calendar = config.calendar();
    let status = calendar.cutoff_status(now);

    print_json(&CutoffOutput {
        local_time: calendar.local_time(now).to_rfc3339(),
        cutoff_hour: calendar.cutoff_hour(),
        message: cutoff_message(&status),
        status,
    })
}

fn cutoff_message(status: &CutoffStatus) -> String {
    match *status {
        CutoffStatus::Open {
            minutes_remaining, ..
        } => format!(
            "Order within {} to ship today",
            format::time_remaining_text(minutes_remaining)
        ),
        CutoffStatus::Closed {
            reason,
            next_business_day,
        } => ships_on(reason, next_business_day),
    }
}

fn ships_on(reason: ClosedReason, day: NaiveDate) -> String {
    let when = format::long_date(day);
    match reason {
        ClosedReason::Weekend => format!("Orders placed this weekend ship {when}"),
        ClosedReason::AfterCutoff => format!("Orders placed now ship {when}"),
    }
}
