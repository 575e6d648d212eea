//! Logging setup for the sieve.
//!
//! Standard output carries the prime announcements, so logs go to stderr or a
//! file. No background writer thread is used: the process forks its stages
//! and has to stay single-threaded.

use sieve_core::LogConfig;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

/// Parse log level from config string
fn parse_log_level(level: &str) -> LevelFilter {
  match level.to_lowercase().as_str() {
    "off" => LevelFilter::OFF,
    "error" => LevelFilter::ERROR,
    "warn" => LevelFilter::WARN,
    "info" => LevelFilter::INFO,
    "debug" => LevelFilter::DEBUG,
    "trace" => LevelFilter::TRACE,
    _ => LevelFilter::WARN,
  }
}

/// Open a non-rotating appender for `path`
fn file_appender(path: &Path) -> Option<RollingFileAppender> {
  let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
  let name = path.file_name()?;
  std::fs::create_dir_all(dir).ok()?;

  RollingFileAppender::builder()
    .rotation(Rotation::NEVER)
    .filename_prefix(name.to_string_lossy().into_owned())
    .build(dir)
    .ok()
}

/// Initialize logging from config; `RUST_LOG` overrides the configured level.
pub fn init_logging(config: &LogConfig) {
  let env_filter = EnvFilter::builder()
    .with_default_directive(parse_log_level(&config.level).into())
    .from_env_lossy();

  if let Some(path) = &config.file
    && let Some(appender) = file_appender(path)
  {
    tracing_subscriber::fmt()
      .with_env_filter(env_filter)
      .with_target(true)
      .with_ansi(false)
      .with_writer(appender)
      .init();
    return;
  }

  tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_target(true)
    .with_writer(std::io::stderr)
    .init();

  if let Some(path) = &config.file {
    tracing::warn!(path = %path.display(), "Could not open log file, logging to stderr");
  }
}
