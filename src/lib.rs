//! # Scanrelay
//!
//! Submit files to a threat-prevention appliance for antivirus scanning,
//! wait for the verdict, and persist it per file.
//!
//! ## Overview
//!
//! For every file, scanrelay:
//!
//! 1. Computes the MD5 of its content
//! 2. Asks the appliance whether it already has a verdict for that hash
//! 3. Otherwise uploads the file and polls until a verdict arrives or the
//!    polling ceiling is reached
//! 4. Writes the final appliance response to `<name>.response.txt`
//!
//! Files are handled one at a time. A file that fails (unreadable, upload
//! transport error, unwritable output) is logged and skipped; the batch
//! continues with the next one.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use scanrelay::backends::{ApplianceAddress, ApplianceConfig, HttpAppliance};
//! use scanrelay::output::FilesystemResultWriter;
//! use scanrelay::{discover_targets, PollingPolicy, ScanOrchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApplianceConfig::new(
//!         ApplianceAddress::Hostname("gw.example.com".into()),
//!         "api-key",
//!     );
//!
//!     let orchestrator = ScanOrchestrator::builder()
//!         .appliance(HttpAppliance::new(config)?)
//!         .store(FilesystemResultWriter::create("./results")?)
//!         .polling(PollingPolicy::default())
//!         .build()?;
//!
//!     let targets = discover_targets("./inbox".as_ref())?;
//!     let summary = orchestrator.scan_all(&targets).await;
//!     println!("{} of {} files scanned", summary.completed, summary.total);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `default` - Includes the HTTP client
//! - `http` - The `reqwest`-based appliance client
//!
//! ## Architecture
//!
//! - **Core**: Types, wire format, hashing, errors, the `ApplianceApi` trait
//! - **Backends**: HTTP and mock appliance clients
//! - **Manager**: The per-file state machine and polling policy
//! - **Output**: Result persistence
//! - **Audit**: Structured events for every completed or failed file

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod audit;
pub mod backends;
pub mod core;
pub mod manager;
pub mod output;

// Re-export commonly used types at the crate root
pub use crate::core::{
    discover_targets, ApplianceApi, ContentHash, FileHasher, ScanError, ScanOutcome, ScanPath,
    ScanRequest, ScanResponse, ScanTarget, StatusLabel, Verdict,
};

pub use crate::manager::{BatchSummary, PollingPolicy, ScanOrchestrator};
pub use crate::output::{FilesystemResultWriter, ResultStore};

/// Prelude module for convenient imports.
///
/// ```rust
/// use scanrelay::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{
        discover_targets, ApplianceApi, ContentHash, FileHasher, ScanError, ScanOutcome,
        ScanPath, ScanRequest, ScanResponse, ScanTarget, StatusLabel, Verdict,
    };
    pub use crate::manager::{BatchSummary, PollingPolicy, ScanOrchestrator};
    pub use crate::output::{FilesystemResultWriter, ResultStore};
}
