//! Structured audit logging.
//!
//! Events are plain `tracing` events on the `scanrelay::audit` target, so any
//! subscriber (JSON file, journald, OpenTelemetry) can capture them
//! separately from diagnostic logs.

mod events;

pub use events::{
    emit_scan_completed, emit_scan_failed, emit_scan_started, AuditEvent, ScanAuditEvent,
};
