//! Live carrier rates and their reconciliation with the static estimate.
//!
//! # Architecture
//!
//! - [`QuoteProvider`] fetches raw rate records for a destination
//!   ([`ShopifyCartRates`] talks to the storefront cart API)
//! - [`CachedQuoteSet`] normalizes prices and keeps quotes cheapest-first
//! - [`LiveRateReconciler`] picks the quote for a shipping method, or falls back
//!   to [`EstimateCalculator`](crate::estimate::EstimateCalculator)
//! - [`RateService`] ties them together: in-memory cache via `moka`,
//!   one timed provider attempt per request, fallback on any failure
//!
//! # Example
//!
//! ```rust,ignore
//! use delivery_estimate::rates::{RateService, ShopifyCartRates};
//!
//! let provider = ShopifyCartRates::new(&config.shopify, config.rate_timeout)?;
//! let service = RateService::new(provider, config.reconciler(), config.rate_timeout);
//!
//! // Never fails; falls back to the zone estimate when live rates are unavailable
//! let estimate = service.estimate_for_zip("90210", ShippingMethod::Express, Utc::now()).await;
//! ```

mod quote;
mod reconcile;
mod service;
mod shopify;

use std::future::Future;
use std::sync::Arc;

use delivery_estimate_core::{PostalCode, RegionCode};
use thiserror::Error;

pub use quote::{CachedQuoteSet, DeliveryTiming, Quote, RawDeliveryDays, RawRate, select_quote};
pub use reconcile::LiveRateReconciler;
pub use service::RateService;
pub use shopify::ShopifyCartRates;

/// Errors that can occur while fetching live rates.
///
/// These never reach estimate callers; the service logs them and falls back.
#[derive(Debug, Error)]
pub enum RateError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate endpoint answered with a non-success status.
    #[error("Rate endpoint returned HTTP {0}")]
    Status(u16),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("Invalid rate endpoint URL: {0}")]
    Url(#[from] url::ParseError),

    /// No answer within the configured timeout.
    #[error("Rate request timed out after {0} ms")]
    Timeout(u128),
}

/// Destination sent to a quote provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateRequest {
    pub zip: PostalCode,
    pub region: RegionCode,
    pub country: String,
}

impl RateRequest {
    /// A US destination.
    #[must_use]
    pub fn domestic(zip: PostalCode, region: RegionCode) -> Self {
        Self {
            zip,
            region,
            country: "United States".to_owned(),
        }
    }
}

/// Source of raw carrier rates for a destination.
///
/// An empty list means "no live data", the same as an error.
pub trait QuoteProvider: Send + Sync {
    fn fetch_rates(
        &self,
        request: &RateRequest,
    ) -> impl Future<Output = Result<Vec<RawRate>, RateError>> + Send;
}

impl<P: QuoteProvider> QuoteProvider for Arc<P> {
    fn fetch_rates(
        &self,
        request: &RateRequest,
    ) -> impl Future<Output = Result<Vec<RawRate>, RateError>> + Send {
        (**self).fetch_rates(request)
    }
}
