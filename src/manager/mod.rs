//! Scan orchestration.
//!
//! This module contains:
//!
//! - [`ScanOrchestrator`] - runs targets through the appliance protocol
//! - [`PollingPolicy`] - bounded polling after an upload

mod orchestrator;
pub mod polling;

pub use orchestrator::{
    BatchSummary, FailedTarget, ScanOrchestrator, ScanOrchestratorBuilder, ScanStage,
};
pub use polling::{poll_for_verdict, PollResult, PollingPolicy};
