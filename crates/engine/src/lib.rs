//! Delivery Estimate - zone, calendar and live-rate delivery estimates.
//!
//! Given a destination (ZIP or region), a shipping method and the current
//! instant, this crate answers "when will it arrive?" with a date window.
//!
//! # Architecture
//!
//! - [`zip_region`] - ZIP prefix to region lookup
//! - [`zones`] - Region to shipping zone classification
//! - [`calendar`] - Business days and same-day cutoff in the warehouse time zone
//! - [`estimate`] - Static zone-based estimates
//! - [`rates`] - Live carrier quotes, reconciled with the static estimate
//! - [`location`] - Customer location resolution and caching
//! - [`store`] - Key-value persistence adapters
//! - [`free_shipping`] - Free-shipping threshold progress
//! - [`format`] - Display strings
//! - [`config`] - Environment-based configuration
//!
//! Every estimate operation takes `now` explicitly and never fails: missing
//! live data, storage faults and lookup errors degrade to the static estimate
//! or the default region.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod calendar;
pub mod config;
pub mod estimate;
pub mod format;
pub mod free_shipping;
pub mod location;
pub mod rates;
pub mod store;
pub mod zip_region;
pub mod zones;

pub use calendar::{BusinessCalendar, CutoffStatus};
pub use config::{ConfigError, DeliveryConfig};
pub use estimate::{EstimateCalculator, EstimateResult, EstimateSource};
pub use rates::{LiveRateReconciler, RateService};
