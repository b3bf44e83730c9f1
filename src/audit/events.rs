//! Audit event types and emission functions.

use crate::core::{ContentHash, ScanError, ScanOutcome, Verdict};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Base trait for audit events.
pub trait AuditEvent: Serialize {
    /// Returns the event type name.
    fn event_type(&self) -> &'static str;

    /// Returns the timestamp of the event.
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Audit event for a completed target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanAuditEvent {
    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,

    /// Outcome ID.
    pub scan_id: String,

    /// Display name of the target.
    pub file_name: String,

    /// MD5 of the target's content.
    pub md5: String,

    /// Final status label.
    pub status_label: String,

    /// Classification of the final response.
    pub verdict: Verdict,

    /// `cached`, `uploaded` or `polled`.
    pub path: String,

    /// Number of post-upload poll queries.
    pub poll_attempts: u32,

    /// Whether polling hit its ceiling.
    pub poll_exhausted: bool,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl From<&ScanOutcome> for ScanAuditEvent {
    fn from(outcome: &ScanOutcome) -> Self {
        Self {
            timestamp: outcome.completed_at,
            scan_id: outcome.id.clone(),
            file_name: outcome.target_name.clone(),
            md5: outcome.content_hash.as_str().to_string(),
            status_label: outcome.label().to_string(),
            verdict: outcome.verdict(),
            path: outcome.path.to_string(),
            poll_attempts: outcome.poll_attempts,
            poll_exhausted: outcome.poll_exhausted,
            duration_ms: outcome.duration.as_millis() as u64,
        }
    }
}

impl AuditEvent for ScanAuditEvent {
    fn event_type(&self) -> &'static str {
        "scan_completed"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Emits an audit event for a target whose fingerprint is known.
pub fn emit_scan_started(file_name: &str, hash: &ContentHash) {
    tracing::info!(
        target: "scanrelay::audit",
        event_type = "scan_started",
        file_name = %file_name,
        md5 = %hash.as_str(),
        "Scan started"
    );
}

/// Emits an audit event for a completed target.
pub fn emit_scan_completed(outcome: &ScanOutcome) {
    let event = ScanAuditEvent::from(outcome);
    let signature = match &event.verdict {
        Verdict::Malicious { signature } => Some(signature.as_str()),
        _ => None,
    };

    tracing::info!(
        target: "scanrelay::audit",
        event_type = event.event_type(),
        scan_id = %event.scan_id,
        file_name = %event.file_name,
        md5 = %event.md5,
        status_label = %event.status_label,
        verdict = %event.verdict,
        signature = ?signature,
        path = %event.path,
        poll_attempts = event.poll_attempts,
        poll_exhausted = event.poll_exhausted,
        duration_ms = event.duration_ms,
        "Scan completed"
    );
}

/// Emits an audit event for a target that could not be handled.
pub fn emit_scan_failed(file_name: &str, hash: Option<&ContentHash>, error: &ScanError) {
    tracing::warn!(
        target: "scanrelay::audit",
        event_type = "scan_failed",
        file_name = %file_name,
        md5 = ?hash.map(ContentHash::as_str),
        endpoint = ?error.endpoint(),
        error = %error,
        "Scan failed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ScanPath, ScanResponse, StatusLabel};
    use std::time::Duration;

    #[test]
    fn test_audit_event_from_outcome() {
        let outcome = ScanOutcome::new(
            "a.txt",
            ContentHash::new("abc"),
            ScanResponse::from_parts(StatusLabel::Found, Some("EICAR-Test")),
            ScanPath::Polled,
            Duration::from_millis(1500),
        )
        .with_polling(2, false);

        let event = ScanAuditEvent::from(&outcome);
        assert_eq!(event.event_type(), "scan_completed");
        assert_eq!(event.file_name, "a.txt");
        assert_eq!(event.status_label, "FOUND");
        assert_eq!(event.path, "polled");
        assert_eq!(event.poll_attempts, 2);
        assert_eq!(event.duration_ms, 1500);
        assert!(event.verdict.is_malicious());

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["verdict"]["type"], "malicious");
        assert_eq!(json["verdict"]["signature"], "EICAR-Test");
    }
}
