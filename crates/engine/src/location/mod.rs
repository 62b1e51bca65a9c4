//! Customer location: cached, looked up, or entered by hand.
//!
//! - [`LocationCache`] keeps the last resolved location in a key-value store
//!   with a TTL
//! - [`GeoLookup`] approximates the location from the client IP
//!   ([`IpApiClient`] talks to ipapi.co)
//! - [`LocationResolver`] applies the precedence rules and publishes changes

mod cache;
mod geoip;
mod resolver;

pub use cache::{LOCATION_CACHE_KEY, LocationCache};
pub use geoip::{GeoError, GeoLocation, GeoLookup, IpApiClient};
pub use resolver::{CUSTOMER_ZIP_KEY, LocationRequest, LocationResolver};
