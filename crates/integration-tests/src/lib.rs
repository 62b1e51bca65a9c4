//! Scenario tests for delivery estimates.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p delivery-estimate-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `estimate_scenarios` - Static estimates against a frozen clock
//! - `live_rates` - Live quote reconciliation and fallback
//! - `location_resolution` - Location precedence, caching and storage faults
//!
//! No test touches the network: providers, geo lookups and stores are the
//! in-process doubles below.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::America::New_York;
use delivery_estimate::location::{GeoError, GeoLocation, GeoLookup};
use delivery_estimate::rates::{QuoteProvider, RateError, RateRequest, RawRate};
use delivery_estimate::store::{KeyValueStore, StorageError};
use delivery_estimate::{DeliveryConfig, EstimateCalculator, LiveRateReconciler};
use delivery_estimate_core::{PostalCode, RegionCode};

/// Instant for a US Eastern wall-clock time.
///
/// # Panics
///
/// Panics if the wall-clock time does not exist in US Eastern time.
#[must_use]
pub fn eastern(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    New_York
        .with_ymd_and_hms(y, m, d, h, min, 0)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| panic!("ambiguous or missing local time {y}-{m}-{d} {h}:{min}"))
}

/// Calculator with the default NJ warehouse configuration.
#[must_use]
pub fn calculator() -> EstimateCalculator {
    DeliveryConfig::default().calculator()
}

/// Reconciler with the default 5-minute quote TTL.
#[must_use]
pub fn reconciler() -> LiveRateReconciler {
    DeliveryConfig::default().reconciler()
}

// =============================================================================
// QuoteProvider doubles
// =============================================================================

/// What a [`StubProvider`] does when asked for rates.
#[derive(Debug, Clone)]
pub enum StubBehavior {
    Rates(Vec<RawRate>),
    Fail(u16),
    Stall(Duration),
}

/// Quote provider with canned behaviour and a call counter.
#[derive(Debug)]
pub struct StubProvider {
    behavior: StubBehavior,
    calls: AtomicUsize,
    last_request: std::sync::Mutex<Option<RateRequest>>,
}

impl StubProvider {
    #[must_use]
    pub const fn new(behavior: StubBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            last_request: std::sync::Mutex::new(None),
        }
    }

    /// Number of `fetch_rates` calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Most recent request, if any.
    #[must_use]
    pub fn last_request(&self) -> Option<RateRequest> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }
}

impl QuoteProvider for StubProvider {
    async fn fetch_rates(&self, request: &RateRequest) -> Result<Vec<RawRate>, RateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }
        match &self.behavior {
            StubBehavior::Rates(rates) => Ok(rates.clone()),
            StubBehavior::Fail(status) => Err(RateError::Status(*status)),
            StubBehavior::Stall(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(Vec::new())
            }
        }
    }
}

// =============================================================================
// GeoLookup doubles
// =============================================================================

/// Geo lookup that returns a fixed answer and counts calls.
#[derive(Debug)]
pub struct StubGeo {
    answer: Option<(String, String)>,
    calls: AtomicUsize,
}

impl StubGeo {
    /// Always finds `zip` in `region`.
    #[must_use]
    pub fn found(zip: &str, region: &str) -> Self {
        Self {
            answer: Some((zip.to_string(), region.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always fails, like a non-US visitor.
    #[must_use]
    pub const fn unavailable() -> Self {
        Self {
            answer: None,
            calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GeoLookup for StubGeo {
    async fn lookup(&self) -> Result<GeoLocation, GeoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (zip, region) = self
            .answer
            .as_ref()
            .ok_or_else(|| GeoError::Unusable("country \"CA\" is not US".to_string()))?;
        Ok(GeoLocation {
            zip: PostalCode::parse(zip).map_err(|e| GeoError::Unusable(e.to_string()))?,
            region: RegionCode::parse(region).ok(),
            city: None,
        })
    }
}

// =============================================================================
// KeyValueStore doubles
// =============================================================================

/// Store that rejects every operation, like storage disabled in a private
/// browsing session.
#[derive(Debug, Default)]
pub struct UnavailableStore {
    attempts: AtomicUsize,
}

impl UnavailableStore {
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> Result<T, StorageError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::Unavailable("storage disabled".to_string()))
    }
}

impl KeyValueStore for UnavailableStore {
    fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
        self.fail()
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        self.fail()
    }

    fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
        self.fail()
    }
}
