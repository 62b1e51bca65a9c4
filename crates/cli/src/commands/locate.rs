//! Customer location command.
//!
//! # Usage
//!
//! ```bash
//! delivery-cli locate                 # resolve (stored ZIP, cache, geo-IP)
//! delivery-cli locate --zip 07105     # remember a ZIP
//! delivery-cli locate --clear         # forget it
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use delivery_estimate::DeliveryConfig;
use delivery_estimate::location::{IpApiClient, LocationCache, LocationRequest, LocationResolver};
use delivery_estimate::store::FileStore;
use delivery_estimate_core::Location;

use super::{CommandError, print_json};

/// Resolve, set or clear the customer location kept in `store_path`.
///
/// # Errors
///
/// Returns an error if `zip` is not five digits or the geo-IP client cannot
/// be built.
pub async fn run(
    config: &DeliveryConfig,
    store_path: &Path,
    zip: Option<&str>,
    clear: bool,
    now: DateTime<Utc>,
) -> Result<(), CommandError> {
    let cache = LocationCache::new(FileStore::new(store_path), config.location_ttl);
    let geo = IpApiClient::new(&config.geoip)?;
    let resolver = LocationResolver::new(cache, geo, config.region_resolver())
        .with_geo_timeout(config.geoip.timeout);

    let location: Location = if clear {
        resolver.clear();
        tracing::info!(path = %store_path.display(), "Cleared stored location");
        resolver
            .current()
            .unwrap_or_else(|| Location::fallback(config.warehouse_region))
    } else if let Some(zip) = zip {
        resolver.set_customer_zip(zip, now)?
    } else {
        resolver.resolve(&LocationRequest::default(), now).await
    };

    print_json(&location)
}
