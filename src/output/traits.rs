//! Result store trait definition.

use crate::core::{ScanError, ScanResponse};

use async_trait::async_trait;
use std::fmt::Debug;

/// Where final responses are persisted.
///
/// One entry per target, keyed by the target's display name. Writing the
/// same name twice replaces the earlier entry.
#[async_trait]
pub trait ResultStore: Send + Sync + Debug {
    /// Persists `response` for the target called `name`.
    ///
    /// # Returns
    ///
    /// A human-readable location of the stored result, for logging.
    async fn write(&self, name: &str, response: &ScanResponse) -> Result<String, ScanError>;
}

/// An arc-wrapped result store for shared ownership.
pub type ArcResultStore = std::sync::Arc<dyn ResultStore>;
