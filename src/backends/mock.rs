//! Scripted appliance for testing.
//!
//! `MockAppliance` answers `query` and `upload` from per-endpoint scripts,
//! falling back to a default reply once a script runs dry, and records every
//! call it receives.

use crate::core::{
    ApplianceApi, ContentHash, ScanError, ScanResponse, ScanTarget, StatusLabel,
};

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Reply {
    Respond(ScanResponse),
    Fail(String),
}

impl Reply {
    fn into_result(self, endpoint: &str) -> Result<ScanResponse, ScanError> {
        match self {
            Self::Respond(response) => Ok(response),
            Self::Fail(message) => Err(ScanError::connection_failed(endpoint, message)),
        }
    }
}

/// A scripted appliance.
///
/// # Examples
///
/// ```rust
/// use scanrelay::backends::MockAppliance;
/// use scanrelay::core::{ScanResponse, StatusLabel};
///
/// // Cache miss, upload accepted, verdict on the first poll.
/// let appliance = MockAppliance::new()
///     .with_query_response(ScanResponse::from_parts(StatusLabel::NotFound, None))
///     .with_query_response(ScanResponse::from_parts(StatusLabel::Found, Some("EICAR-Test")));
/// ```
#[derive(Debug)]
pub struct MockAppliance {
    name: String,
    query_script: Mutex<VecDeque<Reply>>,
    upload_script: Mutex<VecDeque<Reply>>,
    default_query: ScanResponse,
    default_upload: ScanResponse,
    failing_uploads: Mutex<HashSet<String>>,
    queried_hashes: Mutex<Vec<ContentHash>>,
    uploaded_names: Mutex<Vec<String>>,
    query_count: AtomicU32,
    upload_count: AtomicU32,
}

impl Default for MockAppliance {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAppliance {
    /// Creates a mock that never has a verdict and accepts every upload.
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            query_script: Mutex::new(VecDeque::new()),
            upload_script: Mutex::new(VecDeque::new()),
            default_query: ScanResponse::from_parts(StatusLabel::NotFound, None),
            default_upload: ScanResponse::from_parts(StatusLabel::UploadSuccess, None),
            failing_uploads: Mutex::new(HashSet::new()),
            queried_hashes: Mutex::new(Vec::new()),
            uploaded_names: Mutex::new(Vec::new()),
            query_count: AtomicU32::new(0),
            upload_count: AtomicU32::new(0),
        }
    }

    /// Sets the name of this appliance.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Queues the next `query` reply.
    pub fn with_query_response(self, response: ScanResponse) -> Self {
        self.query_script
            .lock()
            .unwrap()
            .push_back(Reply::Respond(response));
        self
    }

    /// Queues a transport failure as the next `query` reply.
    pub fn with_query_failure(self, message: impl Into<String>) -> Self {
        self.query_script
            .lock()
            .unwrap()
            .push_back(Reply::Fail(message.into()));
        self
    }

    /// Queues the next `upload` reply.
    pub fn with_upload_response(self, response: ScanResponse) -> Self {
        self.upload_script
            .lock()
            .unwrap()
            .push_back(Reply::Respond(response));
        self
    }

    /// Reply used once the query script is empty.
    pub fn with_default_query(mut self, response: ScanResponse) -> Self {
        self.default_query = response;
        self
    }

    /// Reply used once the upload script is empty.
    pub fn with_default_upload(mut self, response: ScanResponse) -> Self {
        self.default_upload = response;
        self
    }

    /// Makes every upload of the target called `name` fail in transport.
    pub fn with_upload_failure_for(self, name: impl Into<String>) -> Self {
        self.failing_uploads.lock().unwrap().insert(name.into());
        self
    }

    /// Returns the number of `query` calls received.
    pub fn query_count(&self) -> u32 {
        self.query_count.load(Ordering::Relaxed)
    }

    /// Returns the number of `upload` calls received.
    pub fn upload_count(&self) -> u32 {
        self.upload_count.load(Ordering::Relaxed)
    }

    /// Returns every hash queried, in call order.
    pub fn queried_hashes(&self) -> Vec<ContentHash> {
        self.queried_hashes.lock().unwrap().clone()
    }

    /// Returns the names of every uploaded target, in call order.
    pub fn uploaded_names(&self) -> Vec<String> {
        self.uploaded_names.lock().unwrap().clone()
    }
}

#[async_trait]
impl ApplianceApi for MockAppliance {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query(&self, hash: &ContentHash) -> Result<ScanResponse, ScanError> {
        self.query_count.fetch_add(1, Ordering::Relaxed);
        self.queried_hashes.lock().unwrap().push(hash.clone());

        let reply = self
            .query_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::Respond(self.default_query.clone()));
        reply.into_result("query")
    }

    async fn upload(&self, target: &ScanTarget) -> Result<ScanResponse, ScanError> {
        self.upload_count.fetch_add(1, Ordering::Relaxed);
        self.uploaded_names
            .lock()
            .unwrap()
            .push(target.name().to_string());

        if self.failing_uploads.lock().unwrap().contains(target.name()) {
            return Err(ScanError::connection_failed("upload", "connection reset by peer"));
        }

        let reply = self
            .upload_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::Respond(self.default_upload.clone()));
        reply.into_result("upload")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_defaults() {
        let appliance = MockAppliance::new();
        let hash = ContentHash::new("abc");

        let response = appliance.query(&hash).await.unwrap();
        assert!(response.label().is_pending());

        let target = ScanTarget::new("a.txt", "/tmp/a.txt");
        let response = appliance.upload(&target).await.unwrap();
        assert_eq!(response.label(), &StatusLabel::UploadSuccess);

        assert_eq!(appliance.query_count(), 1);
        assert_eq!(appliance.upload_count(), 1);
        assert_eq!(appliance.queried_hashes(), vec![hash]);
        assert_eq!(appliance.uploaded_names(), vec!["a.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_script_then_default() {
        let appliance = MockAppliance::new()
            .with_query_response(ScanResponse::from_parts(StatusLabel::Found, None))
            .with_query_failure("timeout");
        let hash = ContentHash::new("abc");

        assert!(appliance.query(&hash).await.unwrap().label().is_found());
        assert!(appliance.query(&hash).await.is_err());
        assert!(appliance.query(&hash).await.unwrap().label().is_pending());
    }

    #[tokio::test]
    async fn test_mock_upload_failure_for_name() {
        let appliance = MockAppliance::new().with_upload_failure_for("bad.bin");

        let bad = ScanTarget::new("bad.bin", "/tmp/bad.bin");
        let good = ScanTarget::new("good.bin", "/tmp/good.bin");
        assert!(matches!(
            appliance.upload(&bad).await,
            Err(ScanError::ConnectionFailed { .. })
        ));
        assert!(appliance.upload(&good).await.is_ok());
    }
}
