//! Core types for the scanrelay library.
//!
//! - [`types`] - Content hash, status labels, verdicts
//! - [`protocol`] - Request and response bodies of the appliance API
//! - [`error`] - Structured error types
//! - [`input`] - Scan targets and directory discovery
//! - [`hasher`] - Streaming MD5 fingerprints
//! - [`result`] - The per-target outcome
//! - [`traits`] - The `ApplianceApi` trait

pub mod error;
pub mod hasher;
pub mod input;
pub mod protocol;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{ScanError, ScanResult};
pub use hasher::FileHasher;
pub use input::{discover_targets, ScanTarget};
pub use protocol::{ScanRequest, ScanResponse};
pub use result::ScanOutcome;
pub use traits::{ApplianceApi, ArcAppliance};
pub use types::{ContentHash, ScanPath, StatusLabel, Verdict};
