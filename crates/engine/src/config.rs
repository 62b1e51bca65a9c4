//! Delivery estimate configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `DELIVERY_TIMEZONE` - IANA zone of the warehouse (default: America/New_York)
//! - `DELIVERY_CUTOFF_HOUR` - Same-day dispatch cutoff, 0-23 (default: 14)
//! - `DELIVERY_PROCESSING_DAYS` - Warehouse handling days (default: 1)
//! - `DELIVERY_WAREHOUSE_REGION` - Default region for unknown ZIPs (default: NJ)
//! - `DELIVERY_WAREHOUSE_ZIP` - Warehouse ZIP (default: 07105)
//! - `DELIVERY_QUOTE_TTL_SECS` - Live quote lifetime (default: 300)
//! - `DELIVERY_LOCATION_TTL_SECS` - Cached location lifetime (default: 1800)
//! - `DELIVERY_RATE_TIMEOUT_MS` - Live rate request budget (default: 6000)
//! - `DELIVERY_RATE_POLL_DELAY_MS` - Wait between preparing and reading rates (default: 500)
//! - `DELIVERY_FREE_SHIPPING_THRESHOLD` - Cart total for free shipping (default: 100.00)
//! - `SHOPIFY_STORE_URL` - Storefront base URL; live rates are disabled without it
//! - `SHOPIFY_CART_TOKEN` - Cart token sent as the `cart` cookie
//! - `GEOIP_URL` - Geo-IP endpoint (default: <https://ipapi.co/json/>)
//! - `GEOIP_TIMEOUT_MS` - Geo-IP request budget (default: 3000)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono_tz::Tz;
use delivery_estimate_core::{PostalCode, RegionCode};
use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::calendar::BusinessCalendar;
use crate::estimate::EstimateCalculator;
use crate::rates::LiveRateReconciler;
use crate::zip_region::{RegionResolver, ZipRegionTable};
use crate::zones::ZoneTable;

const DEFAULT_TIMEZONE: &str = "America/New_York";
const DEFAULT_CUTOFF_HOUR: &str = "14";
const DEFAULT_PROCESSING_DAYS: &str = "1";
const DEFAULT_WAREHOUSE_REGION: &str = "NJ";
const DEFAULT_WAREHOUSE_ZIP: &str = "07105";
const DEFAULT_QUOTE_TTL_SECS: &str = "300";
const DEFAULT_LOCATION_TTL_SECS: &str = "1800";
const DEFAULT_RATE_TIMEOUT_MS: &str = "6000";
const DEFAULT_RATE_POLL_DELAY_MS: &str = "500";
const DEFAULT_FREE_SHIPPING_THRESHOLD: &str = "100.00";
const DEFAULT_GEOIP_URL: &str = "https://ipapi.co/json/";
const DEFAULT_GEOIP_TIMEOUT_MS: &str = "3000";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Delivery estimate configuration.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Warehouse time zone
    pub timezone: Tz,
    /// Local hour after which orders ship the next business day
    pub cutoff_hour: u32,
    /// Business days spent in the warehouse before handoff
    pub processing_days: u32,
    /// Region used when a ZIP is missing or unknown
    pub warehouse_region: RegionCode,
    /// Warehouse ZIP
    pub warehouse_zip: PostalCode,
    /// How long live quotes stay usable
    pub quote_ttl: Duration,
    /// How long a resolved location is cached
    pub location_ttl: Duration,
    /// Budget for one live rate request
    pub rate_timeout: Duration,
    /// Cart total at which shipping becomes free
    pub free_shipping_threshold: Decimal,
    /// Storefront cart rates; `None` disables live quotes
    pub shopify: Option<ShopifyCartConfig>,
    /// Geo-IP lookup
    pub geoip: GeoIpConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Storefront cart shipping-rate endpoint.
///
/// Implements `Debug` manually to redact the cart token.
#[derive(Clone)]
pub struct ShopifyCartConfig {
    /// Storefront base URL (e.g., <https://shop.example.com/>)
    pub store_url: Url,
    /// Cart token, sent as the `cart` cookie
    pub cart_token: Option<SecretString>,
    /// Wait between preparing and reading rates
    pub poll_delay: Duration,
}

impl std::fmt::Debug for ShopifyCartConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyCartConfig")
            .field("store_url", &self.store_url.as_str())
            .field("cart_token", &self.cart_token.as_ref().map(|_| "[REDACTED]"))
            .field("poll_delay", &self.poll_delay)
            .finish()
    }
}

impl ShopifyCartConfig {
    /// Config for `store_url` with no cart token and the default poll delay.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL does not parse.
    pub fn new(store_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            store_url: parse_base_url("SHOPIFY_STORE_URL", store_url)?,
            cart_token: None,
            poll_delay: Duration::from_millis(500),
        })
    }
}

/// Geo-IP endpoint.
#[derive(Debug, Clone)]
pub struct GeoIpConfig {
    pub url: Url,
    pub timeout: Duration,
}

impl DeliveryConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_source(&|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_source(env: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let timezone = parse_var(env, "DELIVERY_TIMEZONE", DEFAULT_TIMEZONE, |s| {
            Tz::from_str(s).map_err(|e| e.to_string())
        })?;
        let cutoff_hour = parse_var(env, "DELIVERY_CUTOFF_HOUR", DEFAULT_CUTOFF_HOUR, |s| {
            match s.parse::<u32>() {
                Ok(h) if h <= 23 => Ok(h),
                Ok(h) => Err(format!("hour must be 0-23 (got {h})")),
                Err(e) => Err(e.to_string()),
            }
        })?;
        let processing_days =
            parse_var(env, "DELIVERY_PROCESSING_DAYS", DEFAULT_PROCESSING_DAYS, parse_display)?;
        let warehouse_region =
            parse_var(env, "DELIVERY_WAREHOUSE_REGION", DEFAULT_WAREHOUSE_REGION, parse_display)?;
        let warehouse_zip =
            parse_var(env, "DELIVERY_WAREHOUSE_ZIP", DEFAULT_WAREHOUSE_ZIP, parse_display)?;
        let quote_ttl = Duration::from_secs(parse_var(
            env,
            "DELIVERY_QUOTE_TTL_SECS",
            DEFAULT_QUOTE_TTL_SECS,
            parse_display,
        )?);
        let location_ttl = Duration::from_secs(parse_var(
            env,
            "DELIVERY_LOCATION_TTL_SECS",
            DEFAULT_LOCATION_TTL_SECS,
            parse_display,
        )?);
        let rate_timeout = Duration::from_millis(parse_var(
            env,
            "DELIVERY_RATE_TIMEOUT_MS",
            DEFAULT_RATE_TIMEOUT_MS,
            parse_display,
        )?);
        let free_shipping_threshold = parse_var(
            env,
            "DELIVERY_FREE_SHIPPING_THRESHOLD",
            DEFAULT_FREE_SHIPPING_THRESHOLD,
            |s| match Decimal::from_str(s) {
                Ok(d) if d.is_sign_negative() => Err("must not be negative".to_string()),
                Ok(d) => Ok(d),
                Err(e) => Err(e.to_string()),
            },
        )?;

        let shopify = ShopifyCartConfig::from_source(env)?;
        let geoip = GeoIpConfig::from_source(env)?;
        let sentry_dsn = get_optional_env(env, "SENTRY_DSN");

        Ok(Self {
            timezone,
            cutoff_hour,
            processing_days,
            warehouse_region,
            warehouse_zip,
            quote_ttl,
            location_ttl,
            rate_timeout,
            free_shipping_threshold,
            shopify,
            geoip,
            sentry_dsn,
        })
    }

    #[must_use]
    pub fn calendar(&self) -> BusinessCalendar {
        BusinessCalendar::new(self.timezone, self.cutoff_hour)
    }

    /// Built-in ZIP table defaulting to the warehouse region.
    #[must_use]
    pub fn region_resolver(&self) -> Arc<dyn RegionResolver> {
        Arc::new(ZipRegionTable::standard(self.warehouse_region))
    }

    /// Static estimator using the built-in ZIP and zone tables.
    #[must_use]
    pub fn calculator(&self) -> EstimateCalculator {
        EstimateCalculator::new(
            self.region_resolver(),
            ZoneTable::standard(),
            self.calendar(),
            self.processing_days,
        )
    }

    #[must_use]
    pub fn reconciler(&self) -> LiveRateReconciler {
        LiveRateReconciler::new(self.calculator(), self.quote_ttl)
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::America::New_York,
            cutoff_hour: 14,
            processing_days: 1,
            warehouse_region: RegionCode::from_static(DEFAULT_WAREHOUSE_REGION),
            warehouse_zip: PostalCode::parse(DEFAULT_WAREHOUSE_ZIP)
                .unwrap_or_else(|_| unreachable!("default ZIP is valid")),
            quote_ttl: Duration::from_secs(300),
            location_ttl: Duration::from_secs(1800),
            rate_timeout: Duration::from_millis(6000),
            free_shipping_threshold: Decimal::ONE_HUNDRED,
            shopify: None,
            geoip: GeoIpConfig::default(),
            sentry_dsn: None,
        }
    }
}

impl ShopifyCartConfig {
    fn from_source(env: &dyn Fn(&str) -> Option<String>) -> Result<Option<Self>, ConfigError> {
        let Some(raw_url) = get_optional_env(env, "SHOPIFY_STORE_URL") else {
            return Ok(None);
        };
        Ok(Some(Self {
            store_url: parse_base_url("SHOPIFY_STORE_URL", &raw_url)?,
            cart_token: get_optional_env(env, "SHOPIFY_CART_TOKEN").map(SecretString::from),
            poll_delay: Duration::from_millis(parse_var(
                env,
                "DELIVERY_RATE_POLL_DELAY_MS",
                DEFAULT_RATE_POLL_DELAY_MS,
                parse_display,
            )?),
        }))
    }
}

impl GeoIpConfig {
    fn from_source(env: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            url: parse_var(env, "GEOIP_URL", DEFAULT_GEOIP_URL, |s| {
                Url::parse(s).map_err(|e| e.to_string())
            })?,
            timeout: Duration::from_millis(parse_var(
                env,
                "GEOIP_TIMEOUT_MS",
                DEFAULT_GEOIP_TIMEOUT_MS,
                parse_display,
            )?),
        })
    }
}

impl Default for GeoIpConfig {
    fn default() -> Self {
        Self {
            url: Url::parse(DEFAULT_GEOIP_URL).unwrap_or_else(|_| unreachable!("default URL is valid")),
            timeout: Duration::from_millis(3000),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional variable, treating blank values as unset.
fn get_optional_env(env: &dyn Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    env(key).filter(|v| !v.trim().is_empty())
}

/// Get a variable with a default value.
fn get_env_or_default(env: &dyn Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    get_optional_env(env, key).unwrap_or_else(|| default.to_string())
}

/// Read `key` (or `default`) and parse it, tagging failures with the key.
fn parse_var<T>(
    env: &dyn Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
    parse: impl FnOnce(&str) -> Result<T, String>,
) -> Result<T, ConfigError> {
    let value = get_env_or_default(env, key, default);
    parse(value.trim()).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e))
}

fn parse_display<T>(s: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    s.parse::<T>().map_err(|e| e.to_string())
}

/// Parse a base URL, making sure relative joins stay under its path.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<DeliveryConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        DeliveryConfig::from_source(&move |key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_match_default_impl() {
        let loaded = load(&[]).unwrap();
        let default = DeliveryConfig::default();
        assert_eq!(loaded.timezone, default.timezone);
        assert_eq!(loaded.cutoff_hour, 14);
        assert_eq!(loaded.processing_days, default.processing_days);
        assert_eq!(loaded.warehouse_region.as_str(), "NJ");
        assert_eq!(loaded.warehouse_zip.as_str(), "07105");
        assert_eq!(loaded.quote_ttl, Duration::from_secs(300));
        assert_eq!(loaded.location_ttl, Duration::from_secs(1800));
        assert_eq!(loaded.rate_timeout, default.rate_timeout);
        assert_eq!(loaded.free_shipping_threshold, default.free_shipping_threshold);
        assert_eq!(loaded.geoip.url.as_str(), "https://ipapi.co/json/");
        assert!(loaded.shopify.is_none());
        assert!(loaded.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DELIVERY_TIMEZONE", "America/Los_Angeles"),
            ("DELIVERY_CUTOFF_HOUR", "12"),
            ("DELIVERY_WAREHOUSE_REGION", "ca"),
            ("DELIVERY_FREE_SHIPPING_THRESHOLD", "75.50"),
        ])
        .unwrap();
        assert_eq!(config.timezone, chrono_tz::America::Los_Angeles);
        assert_eq!(config.calendar().cutoff_hour(), 12);
        assert_eq!(config.warehouse_region.as_str(), "CA");
        assert_eq!(config.free_shipping_threshold, Decimal::new(7550, 2));
    }

    #[test]
    fn test_invalid_timezone() {
        let err = load(&[("DELIVERY_TIMEZONE", "Mars/Olympus")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "DELIVERY_TIMEZONE"));
    }

    #[test]
    fn test_cutoff_hour_out_of_range() {
        let err = load(&[("DELIVERY_CUTOFF_HOUR", "24")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "DELIVERY_CUTOFF_HOUR"));
    }

    #[test]
    fn test_negative_threshold_rejected() {
        assert!(load(&[("DELIVERY_FREE_SHIPPING_THRESHOLD", "-1")]).is_err());
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = load(&[("DELIVERY_PROCESSING_DAYS", "  "), ("SHOPIFY_STORE_URL", "")]).unwrap();
        assert_eq!(config.processing_days, 1);
        assert!(config.shopify.is_none());
    }

    #[test]
    fn test_shopify_config() {
        let config = load(&[
            ("SHOPIFY_STORE_URL", "https://shop.example.com/en"),
            ("SHOPIFY_CART_TOKEN", "c1-7a2b9f"),
            ("DELIVERY_RATE_POLL_DELAY_MS", "250"),
        ])
        .unwrap();
        let shopify = config.shopify.unwrap();
        assert_eq!(shopify.store_url.as_str(), "https://shop.example.com/en/");
        assert_eq!(shopify.cart_token.unwrap().expose_secret(), "c1-7a2b9f");
        assert_eq!(shopify.poll_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_shopify_debug_redacts_token() {
        let mut shopify = ShopifyCartConfig::new("https://shop.example.com").unwrap();
        shopify.cart_token = Some(SecretString::from("c1-7a2b9f"));
        let debug = format!("{shopify:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("c1-7a2b9f"));
    }

    #[test]
    fn test_invalid_store_url() {
        let err = load(&[("SHOPIFY_STORE_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "SHOPIFY_STORE_URL"));
    }
}
