//! The per-target outcome of an orchestration run.

use crate::core::protocol::ScanResponse;
use crate::core::types::{ContentHash, ScanPath, StatusLabel, Verdict};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The final result for one scan target.
///
/// Produced exactly once per target, persisted, then dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOutcome {
    /// Unique identifier for this outcome.
    pub id: String,

    /// Display name of the target.
    pub target_name: String,

    /// Content hash the appliance was queried with.
    pub content_hash: ContentHash,

    /// The last response received; this is what gets persisted.
    pub response: ScanResponse,

    /// Which branch produced `response`.
    pub path: ScanPath,

    /// Number of post-upload poll queries made (zero unless `path` is `Polled`).
    pub poll_attempts: u32,

    /// Whether polling stopped because it hit its ceiling.
    pub poll_exhausted: bool,

    /// When the outcome was produced.
    pub completed_at: DateTime<Utc>,

    /// Wall time from fingerprinting to the final response.
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

impl ScanOutcome {
    /// Creates a new outcome for a response reached through `path`.
    pub fn new(
        target_name: impl Into<String>,
        content_hash: ContentHash,
        response: ScanResponse,
        path: ScanPath,
        duration: Duration,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            target_name: target_name.into(),
            content_hash,
            response,
            path,
            poll_attempts: 0,
            poll_exhausted: false,
            completed_at: Utc::now(),
            duration,
        }
    }

    /// Records polling statistics.
    pub fn with_polling(mut self, attempts: u32, exhausted: bool) -> Self {
        self.poll_attempts = attempts;
        self.poll_exhausted = exhausted;
        self
    }

    /// Returns the final status label.
    pub fn label(&self) -> &StatusLabel {
        self.response.label()
    }

    /// Classifies the final response.
    pub fn verdict(&self) -> Verdict {
        Verdict::classify(self.response.label(), self.response.signature_name())
    }

    /// Returns `true` if the appliance reported a malware signature.
    pub fn is_malicious(&self) -> bool {
        self.verdict().is_malicious()
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(label: StatusLabel, signature: Option<&str>) -> ScanOutcome {
        ScanOutcome::new(
            "a.txt",
            ContentHash::new("abc"),
            ScanResponse::from_parts(label, signature),
            ScanPath::Cached,
            Duration::from_millis(5),
        )
    }

    #[test]
    fn test_outcome_verdict() {
        assert!(outcome(StatusLabel::Found, Some("EICAR-Test")).is_malicious());
        assert!(outcome(StatusLabel::Found, Some("")).verdict().is_clean());
        assert_eq!(outcome(StatusLabel::NotFound, None).verdict(), Verdict::Pending);
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = outcome(StatusLabel::Found, None).with_polling(3, false);
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["target_name"], "a.txt");
        assert_eq!(json["content_hash"], "abc");
        assert_eq!(json["path"], "cached");
        assert_eq!(json["poll_attempts"], 3);
        assert_eq!(json["duration"], 5);
        assert_eq!(json["response"]["response"][0]["status"]["label"], "FOUND");
    }
}
