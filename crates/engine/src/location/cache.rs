//! Time-boxed persistence of the last resolved location.

use std::time::Duration;

use chrono::{DateTime, Utc};
use delivery_estimate_core::Location;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::{KeyValueStore, SafeStore};

/// Storage key of the cached location entry.
pub const LOCATION_CACHE_KEY: &str = "deliveryGeoIP";

/// Stored form: the location plus the epoch-millisecond write time.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    location: Location,
    timestamp: i64,
}

/// Location cache over a key-value store.
///
/// An entry is fresh while `now - timestamp < ttl`. Expired, missing and
/// unreadable entries all read as `None`.
#[derive(Debug, Clone)]
pub struct LocationCache<S> {
    store: SafeStore<S>,
    ttl: Duration,
}

impl<S: KeyValueStore> LocationCache<S> {
    /// 30 minutes.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

    #[must_use]
    pub const fn new(store: S, ttl: Duration) -> Self {
        Self {
            store: SafeStore::new(store),
            ttl,
        }
    }

    /// Underlying store, shared with other preference keys.
    #[must_use]
    pub const fn store(&self) -> &SafeStore<S> {
        &self.store
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh cached location, if any.
    #[must_use]
    pub fn get(&self, now: DateTime<Utc>) -> Option<Location> {
        let raw = self.store.get(LOCATION_CACHE_KEY)?;

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "Ignoring unreadable location cache entry");
                return None;
            }
        };

        let age_ms = now.timestamp_millis().saturating_sub(entry.timestamp);
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        if age_ms >= ttl_ms {
            debug!(age_ms, "Location cache entry expired");
            return None;
        }

        Some(entry.location)
    }

    /// Store `location` as of `now`.
    pub fn set(&self, location: &Location, now: DateTime<Utc>) {
        let entry = CacheEntry {
            location: location.clone(),
            timestamp: now.timestamp_millis(),
        };
        match serde_json::to_string(&entry) {
            Ok(json) => self.store.set(LOCATION_CACHE_KEY, &json),
            Err(e) => debug!(error = %e, "Could not serialize location cache entry"),
        }
    }

    pub fn clear(&self) {
        self.store.remove(LOCATION_CACHE_KEY);
    }
}
