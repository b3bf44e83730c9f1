//! Per-file scan orchestration.
//!
//! ```text
//! Fingerprinting -> CacheCheck -+-> Cached ---------------------+-> Finalizing -> Done
//!                               +-> Uploading -+-> Polling -----+
//!                                              +-> (final) -----+
//! ```

use crate::audit;
use crate::core::{
    ApplianceApi, ArcAppliance, FileHasher, ScanError, ScanOutcome, ScanPath, ScanTarget,
    StatusLabel, Verdict,
};
use crate::manager::polling::{poll_for_verdict, PollingPolicy};
use crate::output::{ArcResultStore, ResultStore};

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// The stages a target moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStage {
    /// Computing the content hash.
    Fingerprinting,
    /// Asking the appliance whether it already has a verdict.
    CacheCheck,
    /// The cache had a verdict.
    Cached,
    /// Sending the file bytes.
    Uploading,
    /// Waiting for the asynchronous verdict.
    Polling,
    /// Persisting and classifying the final response.
    Finalizing,
    /// Finished.
    Done,
}

impl fmt::Display for ScanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fingerprinting => "fingerprinting",
            Self::CacheCheck => "cache_check",
            Self::Cached => "cached",
            Self::Uploading => "uploading",
            Self::Polling => "polling",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// A target that could not be handled.
#[derive(Debug, Clone)]
pub struct FailedTarget {
    /// Display name of the target.
    pub name: String,
    /// Why it failed.
    pub reason: String,
}

/// Totals for one batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Targets handed to the batch.
    pub total: usize,
    /// Targets with a persisted result.
    pub completed: usize,
    /// Completed targets classified malicious.
    pub malicious: usize,
    /// Completed targets classified clean.
    pub clean: usize,
    /// Completed targets still `NOT_FOUND` at the end.
    pub pending: usize,
    /// Completed targets with any other label.
    pub other: usize,
    /// Targets abandoned because of an error.
    pub failed: Vec<FailedTarget>,
}

impl BatchSummary {
    fn record(&mut self, outcome: &ScanOutcome) {
        self.completed += 1;
        match outcome.verdict() {
            Verdict::Malicious { .. } => self.malicious += 1,
            Verdict::Clean => self.clean += 1,
            Verdict::Pending => self.pending += 1,
            Verdict::Other { .. } => self.other += 1,
        }
    }

    fn record_failure(&mut self, name: &str, error: &ScanError) {
        self.failed.push(FailedTarget {
            name: name.to_string(),
            reason: error.to_string(),
        });
    }

    /// Returns `true` if every target produced a result.
    pub fn all_completed(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Builder for creating a `ScanOrchestrator`.
pub struct ScanOrchestratorBuilder {
    appliance: Option<ArcAppliance>,
    store: Option<ArcResultStore>,
    hasher: FileHasher,
    polling: PollingPolicy,
}

impl ScanOrchestratorBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            appliance: None,
            store: None,
            hasher: FileHasher::new(),
            polling: PollingPolicy::default(),
        }
    }

    /// Sets the appliance client.
    pub fn appliance<A: ApplianceApi + 'static>(mut self, appliance: A) -> Self {
        self.appliance = Some(Arc::new(appliance));
        self
    }

    /// Sets an appliance client wrapped in an Arc.
    pub fn arc_appliance(mut self, appliance: ArcAppliance) -> Self {
        self.appliance = Some(appliance);
        self
    }

    /// Sets the result store.
    pub fn store<S: ResultStore + 'static>(mut self, store: S) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Sets a result store wrapped in an Arc.
    pub fn arc_store(mut self, store: ArcResultStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the hasher.
    pub fn hasher(mut self, hasher: FileHasher) -> Self {
        self.hasher = hasher;
        self
    }

    /// Sets the polling policy.
    pub fn polling(mut self, polling: PollingPolicy) -> Self {
        self.polling = polling;
        self
    }

    /// Builds the orchestrator.
    pub fn build(self) -> Result<ScanOrchestrator, ScanError> {
        let appliance = self
            .appliance
            .ok_or_else(|| ScanError::configuration("an appliance client is required"))?;
        let store = self
            .store
            .ok_or_else(|| ScanError::configuration("a result store is required"))?;

        Ok(ScanOrchestrator {
            appliance,
            store,
            hasher: self.hasher,
            polling: self.polling,
        })
    }
}

impl Default for ScanOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives targets through cache check, upload, polling and persistence.
pub struct ScanOrchestrator {
    appliance: ArcAppliance,
    store: ArcResultStore,
    hasher: FileHasher,
    polling: PollingPolicy,
}

impl ScanOrchestrator {
    /// Creates a new builder.
    pub fn builder() -> ScanOrchestratorBuilder {
        ScanOrchestratorBuilder::new()
    }

    /// Returns the polling policy.
    pub fn polling(&self) -> &PollingPolicy {
        &self.polling
    }

    /// Runs one target to completion.
    ///
    /// Any error abandons this target only; nothing is persisted for it.
    pub async fn scan_target(&self, target: &ScanTarget) -> Result<ScanOutcome, ScanError> {
        let started = Instant::now();
        let name = target.name();

        tracing::debug!(file = %name, stage = %ScanStage::Fingerprinting, "Entering stage");
        let hash = target.fingerprint(&self.hasher)?.clone();
        audit::emit_scan_started(name, &hash);

        tracing::debug!(file = %name, stage = %ScanStage::CacheCheck, md5 = %hash.as_str(), "Entering stage");
        let cached = self.appliance.query(&hash).await?;

        let outcome = if cached.label().is_found() {
            tracing::info!(file = %name, stage = %ScanStage::Cached, "Results already exist in AV cache");
            ScanOutcome::new(name, hash, cached, ScanPath::Cached, started.elapsed())
        } else {
            tracing::info!(
                file = %name,
                stage = %ScanStage::Uploading,
                cache_status = %cached.label(),
                "No cached results, uploading"
            );
            let uploaded = self.appliance.upload(target).await?;

            if uploaded.label() == &StatusLabel::UploadSuccess {
                tracing::info!(file = %name, stage = %ScanStage::Polling, "Upload accepted, polling for verdict");
                let appliance = &self.appliance;
                let polled = poll_for_verdict(&self.polling, || appliance.query(&hash)).await?;
                tracing::info!(
                    file = %name,
                    status = %polled.response.label(),
                    attempts = polled.attempts,
                    "Polling finished"
                );
                ScanOutcome::new(name, hash, polled.response, ScanPath::Polled, started.elapsed())
                    .with_polling(polled.attempts, polled.exhausted)
            } else {
                tracing::info!(
                    file = %name,
                    status = %uploaded.label(),
                    "Upload response is final"
                );
                ScanOutcome::new(name, hash, uploaded, ScanPath::Uploaded, started.elapsed())
            }
        };

        tracing::debug!(file = %name, stage = %ScanStage::Finalizing, "Entering stage");
        let location = self.store.write(name, &outcome.response).await?;
        tracing::info!(file = %name, location = %location, status = %outcome.label(), "Result persisted");

        match outcome.verdict() {
            Verdict::Malicious { signature } => {
                tracing::warn!(file = %name, signature = %signature, "File was found malicious by AV");
            }
            Verdict::Clean => {
                tracing::info!(file = %name, "File was found clean by AV");
            }
            Verdict::Pending | Verdict::Other { .. } => {}
        }

        audit::emit_scan_completed(&outcome);
        tracing::debug!(file = %name, stage = %ScanStage::Done, "Entering stage");
        Ok(outcome)
    }

    /// Runs every target in order, one at a time.
    ///
    /// A failing target is logged and counted, and the batch moves on.
    pub async fn scan_all(&self, targets: &[ScanTarget]) -> BatchSummary {
        let mut summary = BatchSummary {
            total: targets.len(),
            ..BatchSummary::default()
        };

        for target in targets {
            tracing::info!(file = %target.name(), "Handling file");
            match self.scan_target(target).await {
                Ok(outcome) => summary.record(&outcome),
                Err(e) => {
                    tracing::error!(
                        file = %target.name(),
                        error = %e,
                        "Could not handle file, continuing with next file"
                    );
                    audit::emit_scan_failed(target.name(), target.content_hash(), &e);
                    summary.record_failure(target.name(), &e);
                }
            }
        }

        tracing::info!(
            total = summary.total,
            completed = summary.completed,
            failed = summary.failed.len(),
            malicious = summary.malicious,
            "Batch finished"
        );
        summary
    }
}

impl fmt::Debug for ScanOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanOrchestrator")
            .field("appliance", &self.appliance.name())
            .field("polling", &self.polling)
            .finish()
    }
}
