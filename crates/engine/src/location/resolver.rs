//! Location precedence and change notification.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use delivery_estimate_core::{Location, LocationSource, PostalCode, PostalCodeError, RegionCode};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::cache::LocationCache;
use super::geoip::{GeoError, GeoLookup};
use crate::store::KeyValueStore;
use crate::zip_region::RegionResolver;

/// Storage key of the ZIP the shopper entered on an earlier visit.
pub const CUSTOMER_ZIP_KEY: &str = "customerZip";

const DEFAULT_GEO_TIMEOUT: Duration = Duration::from_secs(3);

/// What the caller already knows about the shopper.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationRequest {
    /// ZIP typed in during this request.
    pub user_zip: Option<String>,
    /// Default-address ZIP on the logged-in customer's account.
    pub account_zip: Option<String>,
    /// Default-address province code on the customer's account.
    pub account_region: Option<String>,
}

/// Resolves the shopper's location.
///
/// Precedence, first usable source wins:
///
/// 1. ZIP entered by the shopper
/// 2. customer account default address
/// 3. stored `customerZip`
/// 4. cached location, else a geo-IP lookup (cached on success)
/// 5. the warehouse's default region
///
/// Every change of the resolved location is published on a
/// [`watch`] channel; see [`LocationResolver::subscribe`].
pub struct LocationResolver<S, G> {
    cache: LocationCache<S>,
    geo: G,
    regions: Arc<dyn RegionResolver>,
    geo_timeout: Duration,
    changes: watch::Sender<Option<Location>>,
}

impl<S, G> std::fmt::Debug for LocationResolver<S, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationResolver")
            .field("default_region", &self.regions.default_region())
            .field("geo_timeout", &self.geo_timeout)
            .finish_non_exhaustive()
    }
}

impl<S: KeyValueStore, G: GeoLookup> LocationResolver<S, G> {
    #[must_use]
    pub fn new(cache: LocationCache<S>, geo: G, regions: Arc<dyn RegionResolver>) -> Self {
        let (changes, _) = watch::channel(None);
        Self {
            cache,
            geo,
            regions,
            geo_timeout: DEFAULT_GEO_TIMEOUT,
            changes,
        }
    }

    /// Upper bound for one geo-IP lookup.
    #[must_use]
    pub const fn with_geo_timeout(mut self, timeout: Duration) -> Self {
        self.geo_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn cache(&self) -> &LocationCache<S> {
        &self.cache
    }

    /// Receiver that sees every newly resolved location.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Location>> {
        self.changes.subscribe()
    }

    /// Most recently published location.
    #[must_use]
    pub fn current(&self) -> Option<Location> {
        self.changes.borrow().clone()
    }

    /// Resolve a location. Never fails; falls through to the default region.
    #[instrument(skip(self, request, now))]
    pub async fn resolve(&self, request: &LocationRequest, now: DateTime<Utc>) -> Location {
        let location = match self.resolve_known(request) {
            Some(location) => location,
            None => self.resolve_remote(now).await,
        };

        info!(
            zip = location.zip_str().unwrap_or("-"),
            region = %location.region,
            source = ?location.source,
            "Resolved delivery location"
        );
        self.publish(location.clone());
        location
    }

    /// Sources that need no network: request, account, stored ZIP.
    fn resolve_known(&self, request: &LocationRequest) -> Option<Location> {
        if let Some(zip) = request.user_zip.as_deref().and_then(parse_user_zip) {
            return Some(self.locate_zip(zip, None, LocationSource::UserInput));
        }

        let account_region = request
            .account_region
            .as_deref()
            .and_then(|r| RegionCode::parse(r).ok());
        match request
            .account_zip
            .as_deref()
            .and_then(|z| PostalCode::parse(z).ok())
        {
            Some(zip) => {
                return Some(self.locate_zip(zip, account_region, LocationSource::PlatformAccount));
            }
            None => {
                if let Some(region) = account_region {
                    return Some(Location::new(None, region, LocationSource::PlatformAccount));
                }
            }
        }

        let stored = self.cache.store().get(CUSTOMER_ZIP_KEY)?;
        match parse_user_zip(&stored) {
            Some(zip) => Some(self.locate_zip(zip, None, LocationSource::Stored)),
            None => {
                debug!(stored = %stored, "Ignoring malformed stored ZIP");
                None
            }
        }
    }

    /// Cache, then geo-IP, then the default region.
    async fn resolve_remote(&self, now: DateTime<Utc>) -> Location {
        if let Some(cached) = self.cache.get(now) {
            debug!("Using cached location");
            return cached;
        }

        match self.lookup().await {
            Ok(geo) => {
                let location = self.locate_zip(geo.zip, geo.region, LocationSource::GeoLookup);
                self.cache.set(&location, now);
                location
            }
            Err(e) => {
                warn!(error = %e, "Geo-IP lookup failed, using default region");
                Location::fallback(self.regions.default_region())
            }
        }
    }

    async fn lookup(&self) -> Result<super::GeoLocation, GeoError> {
        tokio::time::timeout(self.geo_timeout, self.geo.lookup())
            .await
            .map_err(|_| GeoError::Timeout(self.geo_timeout.as_millis()))?
    }

    /// Remember a ZIP entered by the shopper and publish it.
    ///
    /// Only exactly five digits are accepted.
    ///
    /// # Errors
    ///
    /// Returns `PostalCodeError` if `zip` is not five digits; nothing is
    /// stored or published in that case.
    pub fn set_customer_zip(&self, zip: &str, now: DateTime<Utc>) -> Result<Location, PostalCodeError> {
        let trimmed = zip.trim();
        let postal = parse_user_zip(trimmed).ok_or_else(|| {
            if trimmed.is_empty() {
                PostalCodeError::Empty
            } else {
                PostalCodeError::InvalidFormat(trimmed.to_string())
            }
        })?;

        self.cache.store().set(CUSTOMER_ZIP_KEY, postal.as_str());
        let location = self.locate_zip(postal, None, LocationSource::UserInput);
        self.cache.set(&location, now);

        info!(zip = %trimmed, region = %location.region, "Customer ZIP updated");
        self.publish(location.clone());
        Ok(location)
    }

    /// Forget the stored ZIP and cached location.
    pub fn clear(&self) {
        self.cache.store().remove(CUSTOMER_ZIP_KEY);
        self.cache.clear();
        self.publish(Location::fallback(self.regions.default_region()));
    }

    fn locate_zip(
        &self,
        zip: PostalCode,
        region: Option<RegionCode>,
        source: LocationSource,
    ) -> Location {
        let region = region.unwrap_or_else(|| self.regions.region_for_zip(Some(zip.as_str())));
        Location::new(Some(zip), region, source)
    }

    fn publish(&self, location: Location) {
        self.changes.send_if_modified(|current| {
            if current.as_ref() == Some(&location) {
                false
            } else {
                *current = Some(location);
                true
            }
        });
    }
}

/// Shopper-entered ZIPs must be exactly five digits.
fn parse_user_zip(raw: &str) -> Option<PostalCode> {
    let trimmed = raw.trim();
    if trimmed.len() != PostalCode::LENGTH {
        return None;
    }
    PostalCode::parse(trimmed).ok()
}
