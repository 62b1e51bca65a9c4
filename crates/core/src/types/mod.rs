//! Core types for delivery estimates.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod location;
pub mod method;
pub mod postal;
pub mod price;
pub mod region;

pub use location::{Location, LocationSource};
pub use method::{ShippingMethod, ShippingMethodError};
pub use postal::{PostalCode, PostalCodeError};
pub use price::{CurrencyCode, Price, RawPrice, normalize_price};
pub use region::{RegionCode, RegionCodeError};
