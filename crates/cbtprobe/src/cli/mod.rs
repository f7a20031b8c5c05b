//! cbtprobe cli definition and entrypoint.
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use cbtprobe_core::Driver;
use cbtprobe_core::config::{ProbeConfig, get_config};
use clap::Parser;

use crate::log::setup_logging;
use crate::ux::{ConsoleReporter, banner, format_summary};

/// cbtprobe - run the StudentCBT API smoke tests as an admin and a student.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file to use instead of <config dir>/cbtprobe/cbtprobe.yml.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the API, e.g. http://localhost:3000/api.
    #[arg(short, long)]
    base_url: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Only show successes and errors.
    #[arg(short, long)]
    quiet: bool,

    /// Write a debug log to the data directory.
    #[arg(long)]
    log: bool,
}

impl Cli {
    /// Command line values win over the config file.
    fn apply(&self, mut config: ProbeConfig) -> Result<ProbeConfig> {
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if self.quiet {
            config.verbose = false;
        }
        config
            .validate()
            .context("Invalid command line options")
    }
}

/// Runs the whole scenario sequence once.
///
/// Scenario failures are reported on the console and never change the
/// result; only configuration and startup problems return an error.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.log {
        setup_logging().context("Failed to set up logging")?;
    }

    let config = get_config(cli.config.clone()).context("Failed to load configuration")?;
    let config = cli.apply(config)?;
    tracing::debug!(base_url = %config.base_url, verbose = config.verbose, "starting run");

    println!("{}", banner());

    let reporter = Arc::new(ConsoleReporter::new(config.verbose));
    let mut driver = Driver::new(config, reporter)?;
    let summary = driver.run_all().await;

    println!("{}", format_summary(&summary));
    Ok(())
}
