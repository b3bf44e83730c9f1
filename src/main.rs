//! Scanrelay CLI

use anyhow::{bail, Context, Result};
use clap::Parser;
use scanrelay::backends::{ApplianceAddress, ApplianceConfig, HttpAppliance};
use scanrelay::{discover_targets, FilesystemResultWriter, PollingPolicy, ScanOrchestrator};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "scanrelay", version)]
#[command(about = "Scan a directory of files with a threat-prevention appliance's AV feature")]
struct Cli {
    /// Folder with the files to scan
    #[arg(short = 'i', long, value_name = "DIR")]
    input_directory: PathBuf,

    /// Folder for the `<name>.response.txt` results (created if absent)
    #[arg(short = 'o', long, value_name = "DIR")]
    output_directory: PathBuf,

    /// Appliance API key
    #[arg(short = 'k', long, env = "SCANRELAY_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Appliance IP address
    #[arg(long, conflicts_with = "fqdn", required_unless_present = "fqdn")]
    ip: Option<IpAddr>,

    /// Appliance FQDN
    #[arg(long)]
    fqdn: Option<String>,

    /// PEM certificate matching the appliance FQDN
    #[arg(long, value_name = "FILE", requires = "fqdn")]
    cert_file: Option<PathBuf>,

    /// Accept any certificate the appliance presents
    #[arg(long)]
    insecure_skip_verify: bool,

    /// Seconds between verdict queries after an upload
    #[arg(long, default_value_t = 2)]
    poll_interval_secs: u64,

    /// Maximum verdict queries after an upload
    #[arg(long, default_value_t = 20)]
    max_retries: u32,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn address(&self) -> Result<ApplianceAddress> {
        match (&self.ip, &self.fqdn) {
            (Some(ip), None) => Ok(ApplianceAddress::Ip(*ip)),
            (None, Some(fqdn)) => Ok(ApplianceAddress::Hostname(fqdn.clone())),
            _ => bail!("use exactly one of --ip and --fqdn"),
        }
    }

    fn appliance_config(&self) -> Result<ApplianceConfig> {
        let mut config = ApplianceConfig::new(self.address()?, self.api_key.clone())
            .with_insecure_skip_verify(self.insecure_skip_verify);
        if let Some(cert) = &self.cert_file {
            config = config.with_certificate(cert);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config.validate()?;
        Ok(config)
    }

    fn polling(&self) -> PollingPolicy {
        PollingPolicy::new()
            .with_interval(Duration::from_secs(self.poll_interval_secs))
            .with_max_retries(self.max_retries)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    info!(dir = %cli.input_directory.display(), "Input directory");
    if !cli.input_directory.is_dir() {
        bail!(
            "the input directory {} does not exist",
            cli.input_directory.display()
        );
    }

    let config = cli.appliance_config()?;
    info!(address = %config.address, url = %config.base_url, "Appliance");

    let writer = FilesystemResultWriter::create(&cli.output_directory)
        .context("could not create output directory")?;
    info!(dir = %writer.output_dir().display(), "Output directory");

    let orchestrator = ScanOrchestrator::builder()
        .appliance(HttpAppliance::new(config)?)
        .store(writer)
        .polling(cli.polling())
        .build()?;

    let targets = discover_targets(&cli.input_directory).context("could not list input files")?;
    info!(files = targets.len(), "Begin handling input files");

    let summary = orchestrator.scan_all(&targets).await;
    info!(
        completed = summary.completed,
        failed = summary.failed.len(),
        malicious = summary.malicious,
        clean = summary.clean,
        pending = summary.pending,
        "Done"
    );

    Ok(())
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    let default = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_ip_and_fqdn_conflict() {
        let result = Cli::try_parse_from([
            "scanrelay", "-i", "in", "-o", "out", "-k", "key", "--ip", "10.0.0.1", "--fqdn",
            "gw.example.com",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cert_requires_fqdn() {
        let result = Cli::try_parse_from([
            "scanrelay", "-i", "in", "-o", "out", "-k", "key", "--ip", "10.0.0.1",
            "--cert-file", "cert.pem",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_fqdn_with_cert() {
        let cli = Cli::try_parse_from([
            "scanrelay", "-i", "in", "-o", "out", "-k", "key", "--fqdn", "gw.example.com",
            "--cert-file", "cert.pem", "--max-retries", "5",
        ])
        .unwrap();

        let config = cli.appliance_config().unwrap();
        assert_eq!(config.base_url, "https://gw.example.com/UserCheck/TPAPI/");
        assert_eq!(config.certificate, Some(PathBuf::from("cert.pem")));
        assert!(!config.insecure_skip_verify);
        assert_eq!(cli.polling().max_retries, 5);
        assert_eq!(cli.polling().interval, Duration::from_secs(2));
    }

    #[test]
    fn test_address_required() {
        let result = Cli::try_parse_from(["scanrelay", "-i", "in", "-o", "out", "-k", "key"]);
        assert!(result.is_err());
    }
}
