//! Pipeline orchestration: grows the filter chain one prime at a time.

use crate::process::{self, StageHandle, StageRole};
use crate::{Filter, PipelineError, Reporter, Source};
use ipc::ReadEnd;
use sieve_core::{Candidate, SieveConfig};
use tracing::{debug, info, warn};

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSummary {
  /// Upper bound the source was started with
  pub max: Candidate,
  /// Primes in discovery order, one per filter stage
  pub primes: Vec<Candidate>,
  /// Stages spawned, including the source
  pub stages: usize,
  /// Stages that did not exit with status 0
  pub abnormal_exits: usize,
}

/// The coordinating process.
///
/// Owns the frontier (read end of the newest stage's output) and every stage
/// handle until the run is over.
pub struct Pipeline {
  config: SieveConfig,
  reporter: Reporter,
}

impl Pipeline {
  pub fn new(config: SieveConfig, reporter: Reporter) -> Self {
    Self { config, reporter }
  }

  /// Run the sieve to completion and reap every stage.
  ///
  /// A failure while growing the chain still reaps the stages already spawned
  /// before the error is returned: releasing the frontier makes the whole
  /// chain wind down on its own.
  pub fn run(self) -> Result<PipelineSummary, PipelineError> {
    let Pipeline { config, reporter } = self;
    info!(max = config.max, max_stages = ?config.max_stages, "Starting sieve pipeline");

    let mut stages = Vec::new();
    let grown = grow(&config, &reporter, &mut stages);

    let spawned = stages.len();
    let abnormal_exits = reap(stages);
    let primes = grown?;

    info!(
      primes = primes.len(),
      stages = spawned,
      abnormal_exits,
      "Sieve pipeline finished"
    );

    Ok(PipelineSummary {
      max: config.max,
      primes,
      stages: spawned,
      abnormal_exits,
    })
  }
}

/// Spawn the source, then one filter per prime read from the frontier.
fn grow(
  config: &SieveConfig,
  reporter: &Reporter,
  stages: &mut Vec<StageHandle>,
) -> Result<Vec<Candidate>, PipelineError> {
  let (reader, writer) = ipc::pipe()?;
  let source = Source::new(config.max);
  let (handle, mut frontier) = process::spawn(StageRole::Source, reader, move || {
    source.run(writer);
  })?;
  stages.push(handle);

  let mut primes = Vec::new();
  while let Some(prime) = next_prime(&mut frontier) {
    if let Some(limit) = config.max_stages
      && primes.len() >= limit
    {
      warn!(limit, prime, "Stage limit reached, stopping pipeline");
      return Err(PipelineError::StageLimit { limit });
    }

    let (next_reader, next_writer) = ipc::pipe()?;
    let filter = Filter::new(prime);
    let input = frontier;
    let (handle, next) = process::spawn(StageRole::Filter { prime }, next_reader, move || {
      filter.run(input, next_writer, reporter);
    })?;
    stages.push(handle);
    primes.push(prime);
    frontier = next;
  }

  frontier.close();
  debug!(primes = primes.len(), "Frontier exhausted");
  Ok(primes)
}

/// Read the next prime; any irregularity counts as the end of the stream.
fn next_prime(frontier: &mut ReadEnd) -> Option<Candidate> {
  match frontier.receive() {
    Ok(value) => value,
    Err(e) => {
      debug!(error = %e, "Frontier ended irregularly");
      None
    }
  }
}

/// Wait for every stage. Returns how many did not exit cleanly.
fn reap(stages: Vec<StageHandle>) -> usize {
  let mut abnormal = 0;
  for stage in stages {
    let (pid, role) = (stage.pid(), stage.role());
    match stage.wait() {
      Ok(exit) if exit.is_clean() => {}
      Ok(exit) => {
        warn!(pid, %role, ?exit, "Stage exited abnormally");
        abnormal += 1;
      }
      Err(e) => {
        warn!(pid, %role, error = %e, "Failed to reap stage");
        abnormal += 1;
      }
    }
  }
  abnormal
}
