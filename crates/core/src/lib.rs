//! Delivery Estimate Core - Shared types library.
//!
//! This crate provides the value types used across all delivery estimate components:
//! - `delivery-estimate` - Zone, calendar and live-rate estimation engine
//! - `delivery-estimate-cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types and pure conversions - no I/O, no clocks,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for region codes, postal codes, prices, shipping
//!   methods and customer locations

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
