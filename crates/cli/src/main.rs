//! primes - Sieve of Eratosthenes as a chain of filter processes

use anyhow::{Context, Result};
use clap::Parser;
use pipeline::{Pipeline, Reporter};
use sieve_core::{Candidate, Config};
use std::path::PathBuf;
use tracing::{info, warn};

mod logging;

use logging::init_logging;

#[derive(Parser)]
#[command(name = "primes")]
#[command(about = "Print every prime up to a bound using one filter process per prime")]
#[command(after_help = "\
EXAMPLES:
  primes                          # Primes up to the configured bound (default 280)
  primes --max 30                 # Primes up to 30
  primes --print-config           # Show the effective configuration

CONFIG:
  ./primes.toml, then $XDG_CONFIG_HOME/primes/config.toml, unless --config is given")]
struct Cli {
  /// Largest candidate to test, inclusive (overrides sieve.max)
  #[arg(short, long, allow_negative_numbers = true)]
  max: Option<Candidate>,

  /// Stop with an error once this many filter stages exist
  #[arg(long, value_name = "N")]
  max_stages: Option<usize>,

  /// Config file to use instead of the default locations
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Print the effective configuration and exit
  #[arg(long)]
  print_config: bool,
}

/// Resolve config from file locations and command-line overrides
fn load_config(cli: &Cli) -> Result<Config> {
  let mut config = match &cli.config {
    Some(path) => {
      Config::load_from(path).with_context(|| format!("Failed to load config from {}", path.display()))?
    }
    None => {
      let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
      Config::load_for_dir(&cwd)
    }
  };

  if let Some(max) = cli.max {
    config.sieve.max = max;
  }
  if let Some(limit) = cli.max_stages {
    config.sieve.max_stages = Some(limit);
  }

  Ok(config)
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  let config = load_config(&cli)?;

  if cli.print_config {
    print!("{}", config.to_toml().context("Failed to render config")?);
    return Ok(());
  }

  init_logging(&config.log);

  let reporter = Reporter::stdout().context("Failed to open standard output")?;
  let summary = Pipeline::new(config.sieve, reporter)
    .run()
    .context("Sieve pipeline failed")?;

  if summary.abnormal_exits > 0 {
    warn!(abnormal_exits = summary.abnormal_exits, "Some stages did not exit cleanly");
  }
  info!(
    max = summary.max,
    primes = summary.primes.len(),
    stages = summary.stages,
    "Done"
  );

  Ok(())
}
