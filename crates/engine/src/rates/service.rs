//! Cached, time-boxed live rate lookups.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use delivery_estimate_core::{Location, PostalCode, ShippingMethod};
use moka::future::Cache;
use tracing::{debug, instrument, warn};

use super::quote::CachedQuoteSet;
use super::reconcile::LiveRateReconciler;
use super::{QuoteProvider, RateError, RateRequest, RawRate};
use crate::estimate::EstimateResult;

/// Live-rate front end for estimate callers.
///
/// Quote sets are cached per ZIP for the reconciler's quote TTL. Each uncached
/// lookup makes a single provider attempt bounded by `timeout`; failures,
/// timeouts and empty answers all degrade to the static estimate.
pub struct RateService<P> {
    inner: Arc<RateServiceInner<P>>,
}

struct RateServiceInner<P> {
    provider: P,
    reconciler: LiveRateReconciler,
    timeout: Duration,
    cache: Cache<String, CachedQuoteSet>,
}

impl<P> Clone for RateService<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: QuoteProvider> RateService<P> {
    #[must_use]
    pub fn new(provider: P, reconciler: LiveRateReconciler, timeout: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(reconciler.quote_ttl())
            .build();

        Self {
            inner: Arc::new(RateServiceInner {
                provider,
                reconciler,
                timeout,
                cache,
            }),
        }
    }

    #[must_use]
    pub fn reconciler(&self) -> &LiveRateReconciler {
        &self.inner.reconciler
    }

    /// Quotes for `zip`, from cache or from the provider.
    ///
    /// Returns `None` when no live data could be obtained.
    #[instrument(skip(self, now), fields(zip = %zip))]
    pub async fn quotes(&self, zip: &PostalCode, now: DateTime<Utc>) -> Option<CachedQuoteSet> {
        let ttl = self.inner.reconciler.quote_ttl();

        if let Some(cached) = self.inner.cache.get(zip.as_str()).await {
            if !cached.is_expired(now, ttl) {
                debug!("Cache hit for quotes");
                return Some(cached);
            }
            self.inner.cache.invalidate(zip.as_str()).await;
        }

        let region = self
            .inner
            .reconciler
            .calculator()
            .region_for_zip(Some(zip.as_str()));
        let request = RateRequest::domestic(zip.clone(), region);

        match self.fetch(&request).await {
            Ok(raw) if raw.is_empty() => {
                debug!("Provider returned no rates");
                None
            }
            Ok(raw) => {
                let set = CachedQuoteSet::from_raw(zip.clone(), &raw, now);
                debug!(count = set.quotes().len(), "Fetched live quotes");
                self.inner
                    .cache
                    .insert(zip.as_str().to_owned(), set.clone())
                    .await;
                Some(set)
            }
            Err(e) => {
                warn!(error = %e, "Live rate lookup failed, using static estimate");
                None
            }
        }
    }

    async fn fetch(&self, request: &RateRequest) -> Result<Vec<RawRate>, RateError> {
        tokio::time::timeout(self.inner.timeout, self.inner.provider.fetch_rates(request))
            .await
            .map_err(|_| RateError::Timeout(self.inner.timeout.as_millis()))?
    }

    /// Estimate for a raw ZIP. Never fails.
    pub async fn estimate_for_zip(
        &self,
        zip: &str,
        method: ShippingMethod,
        now: DateTime<Utc>,
    ) -> EstimateResult {
        let reconciler = &self.inner.reconciler;
        let Ok(postal) = PostalCode::parse(zip) else {
            debug!(zip, "Unparseable ZIP, skipping live rates");
            return reconciler.calculator().estimate_for_zip(Some(zip), method, now);
        };

        let quotes = self.quotes(&postal, now).await;
        reconciler.reconcile(postal.as_str(), method, quotes.as_ref(), now)
    }

    /// Estimate for a resolved location. Never fails.
    ///
    /// Locations without a ZIP are estimated from their region alone.
    pub async fn estimate(
        &self,
        location: &Location,
        method: ShippingMethod,
        now: DateTime<Utc>,
    ) -> EstimateResult {
        match &location.zip {
            Some(zip) => self.estimate_for_zip(zip.as_str(), method, now).await,
            None => self
                .inner
                .reconciler
                .calculator()
                .estimate(&location.region, method, now),
        }
    }

    /// Drop cached quotes for `zip`, e.g. after the cart changes.
    pub async fn invalidate(&self, zip: &PostalCode) {
        self.inner.cache.invalidate(zip.as_str()).await;
    }
}
