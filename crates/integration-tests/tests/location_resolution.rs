//! Location precedence, caching and storage faults.
//!
//! Precedence, highest first: typed ZIP, account address, stored ZIP,
//! cached geo-IP result, fresh geo-IP lookup, warehouse region.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use delivery_estimate::DeliveryConfig;
use delivery_estimate::location::{
    CUSTOMER_ZIP_KEY, LocationCache, LocationRequest, LocationResolver,
};
use delivery_estimate::store::{KeyValueStore, MemoryStore};
use delivery_estimate_core::{Location, LocationSource};
use delivery_estimate_integration_tests::{StubGeo, UnavailableStore, eastern};

const TTL: Duration = Duration::from_secs(30 * 60);

fn resolver<S: KeyValueStore>(store: S, geo: Arc<StubGeo>) -> LocationResolver<S, Arc<StubGeo>> {
    LocationResolver::new(
        LocationCache::new(store, TTL),
        geo,
        DeliveryConfig::default().region_resolver(),
    )
}

fn request(user: Option<&str>, account: Option<&str>) -> LocationRequest {
    LocationRequest {
        user_zip: user.map(str::to_owned),
        account_zip: account.map(str::to_owned),
        account_region: None,
    }
}

// =============================================================================
// Precedence
// =============================================================================

#[tokio::test]
async fn test_user_zip_beats_everything() {
    let store = Arc::new(MemoryStore::new());
    store.set_item(CUSTOMER_ZIP_KEY, "60601").unwrap();
    let geo = Arc::new(StubGeo::found("98101", "WA"));
    let resolver = resolver(Arc::clone(&store), Arc::clone(&geo));

    let location = resolver
        .resolve(&request(Some("07105"), Some("10001")), eastern(2024, 10, 15, 10, 0))
        .await;

    assert_eq!(location.zip_str(), Some("07105"));
    assert_eq!(location.region.as_str(), "NJ");
    assert_eq!(location.source, LocationSource::UserInput);
    assert_eq!(geo.calls(), 0);
}

#[tokio::test]
async fn test_malformed_user_zip_falls_through() {
    let geo = Arc::new(StubGeo::found("98101", "WA"));
    let resolver = resolver(MemoryStore::new(), Arc::clone(&geo));

    let location = resolver
        .resolve(&request(Some("0710"), Some("10001")), eastern(2024, 10, 15, 10, 0))
        .await;

    assert_eq!(location.zip_str(), Some("10001"));
    assert_eq!(location.source, LocationSource::PlatformAccount);
}

#[tokio::test]
async fn test_account_beats_stored_zip() {
    let store = Arc::new(MemoryStore::new());
    store.set_item(CUSTOMER_ZIP_KEY, "60601").unwrap();
    let resolver = resolver(store, Arc::new(StubGeo::unavailable()));

    let location = resolver
        .resolve(&request(None, Some("10001")), eastern(2024, 10, 15, 10, 0))
        .await;

    assert_eq!(location.region.as_str(), "NY");
    assert_eq!(location.source, LocationSource::PlatformAccount);
}

#[tokio::test]
async fn test_account_region_without_zip() {
    let resolver = resolver(MemoryStore::new(), Arc::new(StubGeo::unavailable()));
    let request = LocationRequest {
        account_region: Some("tx".to_string()),
        ..LocationRequest::default()
    };

    let location = resolver.resolve(&request, eastern(2024, 10, 15, 10, 0)).await;

    assert_eq!(location.zip, None);
    assert_eq!(location.region.as_str(), "TX");
    assert_eq!(location.source, LocationSource::PlatformAccount);
}

#[tokio::test]
async fn test_stored_zip_beats_geo() {
    let store = Arc::new(MemoryStore::new());
    store.set_item(CUSTOMER_ZIP_KEY, "60601").unwrap();
    let geo = Arc::new(StubGeo::found("98101", "WA"));
    let resolver = resolver(store, Arc::clone(&geo));

    let location = resolver
        .resolve(&LocationRequest::default(), eastern(2024, 10, 15, 10, 0))
        .await;

    assert_eq!(location.region.as_str(), "IL");
    assert_eq!(location.source, LocationSource::Stored);
    assert_eq!(geo.calls(), 0);
}

#[tokio::test]
async fn test_geo_lookup_when_nothing_known() {
    let geo = Arc::new(StubGeo::found("98101", "WA"));
    let resolver = resolver(MemoryStore::new(), Arc::clone(&geo));

    let location = resolver
        .resolve(&LocationRequest::default(), eastern(2024, 10, 15, 10, 0))
        .await;

    assert_eq!(location.zip_str(), Some("98101"));
    assert_eq!(location.region.as_str(), "WA");
    assert_eq!(location.source, LocationSource::GeoLookup);
    assert_eq!(geo.calls(), 1);
}

#[tokio::test]
async fn test_default_region_when_geo_fails() {
    let resolver = resolver(MemoryStore::new(), Arc::new(StubGeo::unavailable()));

    let location = resolver
        .resolve(&LocationRequest::default(), eastern(2024, 10, 15, 10, 0))
        .await;

    assert_eq!(location, Location::fallback(DeliveryConfig::default().warehouse_region));
    assert_eq!(location.source, LocationSource::Default);
}

// =============================================================================
// Geo-IP caching
// =============================================================================

#[tokio::test]
async fn test_geo_result_cached_for_ttl() {
    let geo = Arc::new(StubGeo::found("98101", "WA"));
    let resolver = resolver(MemoryStore::new(), Arc::clone(&geo));
    let now = eastern(2024, 10, 15, 10, 0);

    resolver.resolve(&LocationRequest::default(), now).await;
    let cached = resolver
        .resolve(&LocationRequest::default(), now + TimeDelta::minutes(29))
        .await;
    assert_eq!(geo.calls(), 1);
    assert_eq!(cached.region.as_str(), "WA");

    resolver
        .resolve(&LocationRequest::default(), now + TimeDelta::minutes(31))
        .await;
    assert_eq!(geo.calls(), 2);
}

#[tokio::test]
async fn test_failed_geo_not_cached() {
    let geo = Arc::new(StubGeo::unavailable());
    let resolver = resolver(MemoryStore::new(), Arc::clone(&geo));
    let now = eastern(2024, 10, 15, 10, 0);

    resolver.resolve(&LocationRequest::default(), now).await;
    resolver.resolve(&LocationRequest::default(), now).await;

    assert_eq!(geo.calls(), 2);
}

// =============================================================================
// Storage faults
// =============================================================================

#[tokio::test]
async fn test_unavailable_storage_still_resolves_from_geo() {
    let store = Arc::new(UnavailableStore::default());
    let geo = Arc::new(StubGeo::found("98101", "WA"));
    let resolver = resolver(Arc::clone(&store), Arc::clone(&geo));
    let now = eastern(2024, 10, 15, 10, 0);

    let location = resolver.resolve(&LocationRequest::default(), now).await;
    assert_eq!(location.source, LocationSource::GeoLookup);
    assert!(store.attempts() > 0);

    // Nothing could be cached, so the next call looks up again.
    resolver.resolve(&LocationRequest::default(), now).await;
    assert_eq!(geo.calls(), 2);
}

#[tokio::test]
async fn test_unavailable_storage_and_geo_uses_default() {
    let resolver = resolver(UnavailableStore::default(), Arc::new(StubGeo::unavailable()));

    let location = resolver
        .resolve(&LocationRequest::default(), eastern(2024, 10, 15, 10, 0))
        .await;

    assert_eq!(location.source, LocationSource::Default);
    assert_eq!(location.region.as_str(), "NJ");
}

#[tokio::test]
async fn test_set_customer_zip_survives_unavailable_storage() {
    let resolver = resolver(UnavailableStore::default(), Arc::new(StubGeo::unavailable()));

    let location = resolver
        .set_customer_zip("90210", eastern(2024, 10, 15, 10, 0))
        .unwrap();

    assert_eq!(location.region.as_str(), "CA");
    assert_eq!(resolver.current(), Some(location));
}

// =============================================================================
// Customer ZIP and notifications
// =============================================================================

#[tokio::test]
async fn test_set_customer_zip_persists_and_notifies() {
    let store = Arc::new(MemoryStore::new());
    let geo = Arc::new(StubGeo::found("98101", "WA"));
    let resolver = resolver(Arc::clone(&store), Arc::clone(&geo));
    let mut changes = resolver.subscribe();
    let now = eastern(2024, 10, 15, 10, 0);

    let location = resolver.set_customer_zip(" 90210 ", now).unwrap();

    assert!(changes.has_changed().unwrap());
    assert_eq!(*changes.borrow_and_update(), Some(location));
    assert_eq!(
        store.get_item(CUSTOMER_ZIP_KEY).unwrap().as_deref(),
        Some("90210")
    );

    // A later visit with no typed ZIP resolves from storage.
    let later = resolver
        .resolve(&LocationRequest::default(), now + TimeDelta::hours(2))
        .await;
    assert_eq!(later.source, LocationSource::Stored);
    assert_eq!(later.region.as_str(), "CA");
    assert_eq!(geo.calls(), 0);
}

#[tokio::test]
async fn test_invalid_customer_zip_rejected() {
    let store = Arc::new(MemoryStore::new());
    let resolver = resolver(Arc::clone(&store), Arc::new(StubGeo::unavailable()));
    let changes = resolver.subscribe();
    let now = eastern(2024, 10, 15, 10, 0);

    for zip in ["", "1234", "abcde", "07105-1234"] {
        assert!(resolver.set_customer_zip(zip, now).is_err(), "{zip:?}");
    }

    assert!(!changes.has_changed().unwrap());
    assert_eq!(store.get_item(CUSTOMER_ZIP_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_unchanged_location_not_republished() {
    let geo = Arc::new(StubGeo::found("98101", "WA"));
    let resolver = resolver(MemoryStore::new(), geo);
    let mut changes = resolver.subscribe();
    let now = eastern(2024, 10, 15, 10, 0);

    resolver.resolve(&LocationRequest::default(), now).await;
    assert!(changes.has_changed().unwrap());
    changes.mark_unchanged();

    resolver.resolve(&LocationRequest::default(), now).await;
    assert!(!changes.has_changed().unwrap());
}

#[tokio::test]
async fn test_clear_forgets_stored_zip() {
    let store = Arc::new(MemoryStore::new());
    let resolver = resolver(Arc::clone(&store), Arc::new(StubGeo::unavailable()));
    let now = eastern(2024, 10, 15, 10, 0);

    resolver.set_customer_zip("90210", now).unwrap();
    resolver.clear();

    assert_eq!(store.get_item(CUSTOMER_ZIP_KEY).unwrap(), None);
    assert_eq!(resolver.current().map(|l| l.source), Some(LocationSource::Default));

    let location = resolver.resolve(&LocationRequest::default(), now).await;
    assert_eq!(location.source, LocationSource::Default);
}
