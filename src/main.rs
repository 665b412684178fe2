//! CLI entry point for the attenuator calibration sweep.
//!
//! # Usage
//!
//! Run against the bench hardware with the built-in settings:
//! ```bash
//! autocal
//! ```
//!
//! Dry run against simulated hardware, transcript to a scratch file:
//! ```bash
//! autocal --mock --output /tmp/autoconfig.txt --log-level debug
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use rf_autocal::{app, config::AutocalConfig, config::DEFAULT_CONFIG_FILE, logging};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "autocal")]
#[command(about = "Signal generator and attenuator calibration sweep", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Transcript path (overrides output.path)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Use simulated generator and rig
    #[arg(long)]
    mock: bool,

    /// Log level: trace, debug, info, warn, error
    #[arg(long)]
    log_level: Option<String>,

    /// Do not print the transcript when the sweep finishes
    #[arg(long)]
    no_echo: bool,
}

impl Cli {
    fn apply(&self, config: &mut AutocalConfig) {
        if let Some(path) = &self.output {
            config.output.path = path.clone();
        }
        if self.mock {
            config.use_mock_hardware();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.no_echo {
            config.output.echo = false;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AutocalConfig::load_from(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    cli.apply(&mut config);
    config.validate().map_err(anyhow::Error::msg)?;
    logging::init_from_config(&config.logging).map_err(anyhow::Error::msg)?;

    let report = app::run(&config).await?;

    if config.output.echo {
        print!("{}", report.transcript);
    }
    for advisory in &report.advisories {
        eprintln!("warning: {}", advisory);
    }
    eprintln!("Sweep complete: {}", app::summary(&report));
    eprintln!("Transcript written to {}", config.output.path.display());
    Ok(())
}
