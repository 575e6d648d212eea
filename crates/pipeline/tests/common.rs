//! Common helpers for pipeline integration tests
//!
//! Every test here forks real stage processes, so they are run one at a time.

use pipeline::{Pipeline, PipelineError, PipelineSummary, Reporter};
use sieve_core::{Candidate, SieveConfig};
use std::io::{Read, Seek, SeekFrom};

/// Output of one pipeline run
#[allow(dead_code)]
pub struct Run {
  pub result: Result<PipelineSummary, PipelineError>,
  pub output: String,
}

impl Run {
  /// Primes parsed from the `prime <n>` announcement lines
  #[allow(dead_code)]
  pub fn announced(&self) -> Vec<Candidate> {
    self
      .output
      .lines()
      .map(|line| {
        let value = line.strip_prefix("prime ").expect("announcement prefix");
        value.parse().expect("announced value")
      })
      .collect()
  }
}

/// Run a pipeline with announcements captured in a temp file
pub fn run_with(config: SieveConfig) -> Run {
  let mut file = tempfile::tempfile().expect("Failed to create capture file");
  let reporter = Reporter::from(file.try_clone().expect("Failed to clone capture file"));

  let result = Pipeline::new(config, reporter).run();

  let mut output = String::new();
  file.seek(SeekFrom::Start(0)).expect("Failed to rewind capture file");
  file.read_to_string(&mut output).expect("Failed to read capture file");
  Run { result, output }
}

#[allow(dead_code)]
pub fn run_max(max: Candidate) -> Run {
  run_with(SieveConfig::with_max(max))
}

/// Trial-division reference
#[allow(dead_code)]
pub fn primes_up_to(max: Candidate) -> Vec<Candidate> {
  (2..=max).filter(|&n| (2..n).take_while(|d| d * d <= n).all(|d| n % d != 0)).collect()
}

/// True when this process has no children left to reap
#[allow(dead_code)]
pub fn no_children_left() -> bool {
  // SAFETY: null status pointer is allowed; WNOHANG never blocks
  let r = unsafe { libc::waitpid(-1, std::ptr::null_mut(), libc::WNOHANG) };
  r == -1 && std::io::Error::last_os_error().raw_os_error() == Some(libc::ECHILD)
}
