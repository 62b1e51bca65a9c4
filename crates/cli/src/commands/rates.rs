//! Live rate lookup command.
//!
//! # Usage
//!
//! ```bash
//! SHOPIFY_STORE_URL=https://shop.example.com delivery-cli rates 90210
//! ```

use chrono::{DateTime, Utc};
use delivery_estimate::DeliveryConfig;
use delivery_estimate::rates::{CachedQuoteSet, Quote, RateService, ShopifyCartRates};
use delivery_estimate_core::PostalCode;
use serde::Serialize;

use super::{CommandError, print_json};

#[derive(Serialize)]
struct RatesOutput<'a> {
    #[serde(flatten)]
    set: &'a CachedQuoteSet,
    cheapest: Option<&'a Quote>,
    expedited: Vec<&'a Quote>,
}

/// Fetch and print live quotes for `zip`, cheapest first.
///
/// # Errors
///
/// Returns an error if the ZIP is invalid, live rates are not configured, or
/// the store returned no rates.
pub async fn run(config: &DeliveryConfig, zip: &str, now: DateTime<Utc>) -> Result<(), CommandError> {
    let zip = PostalCode::parse(zip)?;
    let shopify = config
        .shopify
        .as_ref()
        .ok_or(CommandError::LiveRatesDisabled)?;

    let provider = ShopifyCartRates::new(shopify, config.rate_timeout)?;
    let service = RateService::new(provider, config.reconciler(), config.rate_timeout);

    let set = service
        .quotes(&zip, now)
        .await
        .ok_or_else(|| CommandError::NoRates(zip.to_string()))?;

    print_json(&RatesOutput {
        set: &set,
        cheapest: set.cheapest(),
        expedited: set.expedited().collect(),
    })
}
