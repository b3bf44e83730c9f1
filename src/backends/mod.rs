//! Appliance client implementations.
//!
//! This module contains implementations of the `ApplianceApi` trait.
//!
//! ## Available Backends
//!
//! - [`mock`] - A scripted appliance for testing
//! - [`http`] - The appliance's HTTPS API (requires `http` feature)

pub mod mock;

#[cfg(feature = "http")]
pub mod http;

// Re-exports
pub use mock::MockAppliance;

#[cfg(feature = "http")]
pub use http::{ApplianceAddress, ApplianceConfig, HttpAppliance};
