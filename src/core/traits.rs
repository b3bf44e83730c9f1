//! The `ApplianceApi` trait every appliance client implements.

use crate::core::error::ScanError;
use crate::core::input::ScanTarget;
use crate::core::protocol::ScanResponse;
use crate::core::types::ContentHash;

use async_trait::async_trait;
use std::fmt::Debug;

/// Remote operations of a content-inspection appliance.
///
/// # Implementation Notes
///
/// - Implementations must be `Send + Sync` for use in async contexts.
/// - No state may be carried from one call to the next.
/// - Transport failures are returned as `ScanError::ConnectionFailed` and
///   are never retried here; the caller decides what a failure means.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use scanrelay::core::{ApplianceApi, ContentHash, ScanError, ScanResponse, ScanTarget};
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct Offline;
///
/// #[async_trait]
/// impl ApplianceApi for Offline {
///     fn name(&self) -> &str {
///         "offline"
///     }
///
///     async fn query(&self, _hash: &ContentHash) -> Result<ScanResponse, ScanError> {
///         Err(ScanError::connection_failed("query", "offline"))
///     }
///
///     async fn upload(&self, _target: &ScanTarget) -> Result<ScanResponse, ScanError> {
///         Err(ScanError::connection_failed("upload", "offline"))
///     }
/// }
/// ```
#[async_trait]
pub trait ApplianceApi: Send + Sync + Debug {
    /// Returns a human-readable identifier for logs, such as the base URL.
    fn name(&self) -> &str;

    /// Asks the appliance for a verdict on `hash`.
    ///
    /// Used both for the pre-upload cache check and for post-upload polling.
    async fn query(&self, hash: &ContentHash) -> Result<ScanResponse, ScanError>;

    /// Uploads the target's bytes for scanning.
    async fn upload(&self, target: &ScanTarget) -> Result<ScanResponse, ScanError>;
}

/// An arc-wrapped appliance client for shared ownership.
pub type ArcAppliance = std::sync::Arc<dyn ApplianceApi>;
