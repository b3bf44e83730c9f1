//! Basic scan example driving a scripted appliance.
//!
//! This example shows how to:
//! - Script a mock appliance
//! - Build a ScanOrchestrator that writes `<name>.response.txt` files
//! - Scan a directory and read the batch summary
//!
//! Run with: cargo run --example basic_scan

use scanrelay::backends::MockAppliance;
use scanrelay::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== Scanrelay Basic Scan Example ===\n");

    let input = tempfile::TempDir::new()?;
    let output = tempfile::TempDir::new()?;
    std::fs::write(input.path().join("invoice.pdf"), b"already known to the appliance")?;
    std::fs::write(input.path().join("setup.exe"), b"never seen before")?;

    // invoice.pdf hits the cache; setup.exe is uploaded and found malicious
    // on the second poll.
    let appliance = MockAppliance::new()
        .with_name("example-appliance")
        .with_query_response(ScanResponse::from_parts(StatusLabel::Found, None))
        .with_query_response(ScanResponse::from_parts(StatusLabel::NotFound, None))
        .with_query_response(ScanResponse::from_parts(StatusLabel::NotFound, None))
        .with_query_response(ScanResponse::from_parts(
            StatusLabel::Found,
            Some("Trojan.Generic.12345"),
        ));

    let orchestrator = ScanOrchestrator::builder()
        .appliance(appliance)
        .store(FilesystemResultWriter::create(output.path())?)
        .polling(PollingPolicy::new().with_interval(std::time::Duration::from_millis(100)))
        .build()?;

    let targets = discover_targets(input.path())?;
    println!("Scanning {} files from {}", targets.len(), input.path().display());

    let summary = orchestrator.scan_all(&targets).await;

    println!("\n=== Scan Results ===");
    println!("Completed: {}/{}", summary.completed, summary.total);
    println!("Malicious: {}", summary.malicious);
    println!("Clean:     {}", summary.clean);
    println!("Pending:   {}", summary.pending);
    for failed in &summary.failed {
        println!("Failed:    {} ({})", failed.name, failed.reason);
    }

    for target in &targets {
        let path = output.path().join(format!("{}.response.txt", target.name()));
        println!("\n{}:\n  {}", path.display(), std::fs::read_to_string(&path)?);
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
