//! IP-based location lookup.

use std::future::Future;
use std::sync::Arc;

use delivery_estimate_core::{PostalCode, RegionCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::GeoIpConfig;

/// Errors that can occur during a geo-IP lookup.
///
/// Callers treat all of them as "location unknown".
#[derive(Debug, Error)]
pub enum GeoError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Lookup service answered with a non-success status.
    #[error("Geo-IP service returned HTTP {0}")]
    Status(u16),

    /// Lookup service reported an error in its body.
    #[error("Geo-IP service error: {0}")]
    Api(String),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Answer cannot be used for domestic estimates.
    #[error("Unusable geo-IP result: {0}")]
    Unusable(String),

    /// No answer within the configured timeout.
    #[error("Geo-IP lookup timed out after {0} ms")]
    Timeout(u128),
}

/// A US location approximated from the client IP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoLocation {
    pub zip: PostalCode,
    /// Region reported by the service, when it sent a valid one.
    pub region: Option<RegionCode>,
    pub city: Option<String>,
}

/// Capability for approximating the shopper's location.
pub trait GeoLookup: Send + Sync {
    fn lookup(&self) -> impl Future<Output = Result<GeoLocation, GeoError>> + Send;
}

impl<G: GeoLookup> GeoLookup for Arc<G> {
    fn lookup(&self) -> impl Future<Output = Result<GeoLocation, GeoError>> + Send {
        (**self).lookup()
    }
}

/// ipapi.co response body (only the fields used here).
#[derive(Debug, Deserialize)]
struct IpApiResponse {
    #[serde(default)]
    error: bool,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    country_code: Option<String>,
    #[serde(default)]
    postal: Option<String>,
    #[serde(default)]
    region_code: Option<String>,
    #[serde(default)]
    city: Option<String>,
}

impl IpApiResponse {
    /// Accept only US answers carrying a valid postal code.
    fn into_location(self) -> Result<GeoLocation, GeoError> {
        if self.error {
            return Err(GeoError::Api(
                self.reason.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        let country = self.country_code.unwrap_or_default();
        if country != "US" {
            return Err(GeoError::Unusable(format!("country {country:?} is not US")));
        }

        let zip = self
            .postal
            .as_deref()
            .and_then(|p| PostalCode::parse(p).ok())
            .ok_or_else(|| GeoError::Unusable("missing postal code".to_string()))?;

        Ok(GeoLocation {
            zip,
            region: self
                .region_code
                .as_deref()
                .and_then(|r| RegionCode::parse(r).ok()),
            city: self.city.filter(|c| !c.is_empty()),
        })
    }
}

/// [`GeoLookup`] backed by ipapi.co (or a compatible endpoint).
#[derive(Debug, Clone)]
pub struct IpApiClient {
    client: reqwest::Client,
    url: Url,
}

impl IpApiClient {
    /// Create a client; `config.timeout` bounds each request.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &GeoIpConfig) -> Result<Self, GeoError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

impl GeoLookup for IpApiClient {
    #[instrument(skip(self))]
    async fn lookup(&self) -> Result<GeoLocation, GeoError> {
        let response = self
            .client
            .get(self.url.clone())
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeoError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: IpApiResponse = serde_json::from_str(&body)?;
        let location = parsed.into_location()?;
        debug!(zip = %location.zip, "Geo-IP lookup succeeded");
        Ok(location)
    }
}
