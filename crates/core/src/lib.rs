//! Shared types and configuration for the prime sieve pipeline.

pub mod config;

pub use config::{Config, ConfigError, LogConfig, SieveConfig};

/// A value travelling through the pipeline.
pub type Candidate = i32;

/// Smallest value the source ever emits.
pub const MIN_CANDIDATE: Candidate = 2;

/// Upper bound used when nothing else is configured.
pub const DEFAULT_MAX: Candidate = 280;
