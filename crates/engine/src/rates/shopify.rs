//! Storefront cart shipping-rate client.
//!
//! The cart API computes rates asynchronously: a POST to
//! `cart/prepare_shipping_rates.json` starts the calculation, and a later GET
//! of `cart/shipping_rates.json` returns the result. A `202 Accepted` on the
//! GET means the calculation is still running and is treated as "no rates".

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::COOKIE;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::{QuoteProvider, RateError, RateRequest, RawRate};
use crate::config::ShopifyCartConfig;

const PREPARE_PATH: &str = "cart/prepare_shipping_rates.json";
const RATES_PATH: &str = "cart/shipping_rates.json";

#[derive(Debug, Deserialize)]
struct ShippingRatesResponse {
    #[serde(default)]
    shipping_rates: Vec<serde_json::Value>,
}

/// Parse a `shipping_rates.json` body record by record.
///
/// Records that do not fit [`RawRate`] are skipped so the rest still count.
fn parse_rates(body: &str) -> Result<Vec<RawRate>, RateError> {
    let parsed: ShippingRatesResponse = serde_json::from_str(body)?;
    let rates = parsed
        .shipping_rates
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<RawRate>(record) {
            Ok(rate) => Some(rate),
            Err(e) => {
                debug!(error = %e, "Skipping unreadable shipping rate");
                None
            }
        })
        .collect();
    Ok(rates)
}

/// [`QuoteProvider`] backed by the storefront cart API.
#[derive(Clone)]
pub struct ShopifyCartRates {
    inner: Arc<ShopifyCartRatesInner>,
}

struct ShopifyCartRatesInner {
    client: reqwest::Client,
    store_url: Url,
    cart_token: Option<SecretString>,
    poll_delay: Duration,
}

impl std::fmt::Debug for ShopifyCartRates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyCartRates")
            .field("store_url", &self.inner.store_url.as_str())
            .field("poll_delay", &self.inner.poll_delay)
            .finish_non_exhaustive()
    }
}

impl ShopifyCartRates {
    /// Create a client. `timeout` bounds each individual HTTP request.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ShopifyCartConfig, timeout: Duration) -> Result<Self, RateError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            inner: Arc::new(ShopifyCartRatesInner {
                client,
                store_url: config.store_url.clone(),
                cart_token: config.cart_token.clone(),
                poll_delay: config.poll_delay,
            }),
        })
    }

    /// Endpoint URL with the destination as `shipping_address[...]` parameters.
    fn endpoint(&self, path: &str, request: &RateRequest) -> Result<Url, RateError> {
        let mut url = self.inner.store_url.join(path)?;
        url.query_pairs_mut()
            .append_pair("shipping_address[zip]", request.zip.as_str())
            .append_pair("shipping_address[country]", &request.country)
            .append_pair("shipping_address[province]", request.region.as_str());
        Ok(url)
    }

    fn with_cart(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.inner.cart_token {
            Some(token) => builder.header(COOKIE, format!("cart={}", token.expose_secret())),
            None => builder,
        }
    }
}

impl QuoteProvider for ShopifyCartRates {
    #[instrument(skip(self, request), fields(zip = %request.zip))]
    async fn fetch_rates(&self, request: &RateRequest) -> Result<Vec<RawRate>, RateError> {
        let prepare_url = self.endpoint(PREPARE_PATH, request)?;

        // The GET below still answers when the prepare call fails.
        match self.with_cart(self.inner.client.post(prepare_url)).send().await {
            Ok(response) if !response.status().is_success() => {
                debug!(status = %response.status(), "Prepare shipping rates rejected");
            }
            Ok(_) => {}
            Err(e) => debug!(error = %e, "Prepare shipping rates failed"),
        }

        tokio::time::sleep(self.inner.poll_delay).await;

        let rates_url = self.endpoint(RATES_PATH, request)?;
        let response = self
            .with_cart(self.inner.client.get(rates_url))
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::ACCEPTED {
            debug!("Shipping rates still calculating");
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(RateError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let rates = parse_rates(&body)?;
        debug!(count = rates.len(), "Received shipping rates");
        Ok(rates)
    }
}
