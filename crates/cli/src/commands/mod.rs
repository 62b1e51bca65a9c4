//! CLI command implementations.

pub mod estimate;
pub mod locate;
pub mod rates;

use delivery_estimate::location::GeoError;
use delivery_estimate::rates::RateError;
use delivery_estimate_core::PostalCodeError;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Live rates error: {0}")]
    Rates(#[from] RateError),

    #[error("Geo-IP error: {0}")]
    Geo(#[from] GeoError),

    #[error("Invalid ZIP: {0}")]
    InvalidZip(#[from] PostalCodeError),

    #[error("JSON output error: {0}")]
    Json(#[from] serde_json::Error),

    /// `SHOPIFY_STORE_URL` is not set.
    #[error("Live rates are disabled; set SHOPIFY_STORE_URL")]
    LiveRatesDisabled,

    #[error("No live rates available for {0}")]
    NoRates(String),
}

/// Print `value` to stdout as pretty JSON.
#[allow(clippy::print_stdout)]
fn print_json<T: Serialize>(value: &T) -> Result<(), CommandError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
