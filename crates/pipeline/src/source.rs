use ipc::WriteEnd;
use sieve_core::{Candidate, MIN_CANDIDATE};
use std::ops::RangeInclusive;
use tracing::debug;

/// First stage of the pipeline: feeds `2..=max` into its output.
#[derive(Debug, Clone, Copy)]
pub struct Source {
  max: Candidate,
}

impl Source {
  pub fn new(max: Candidate) -> Self {
    Self { max }
  }

  /// Values this source emits; empty when `max < 2`.
  pub fn candidates(&self) -> RangeInclusive<Candidate> {
    MIN_CANDIDATE..=self.max
  }

  /// Write every candidate in ascending order, then release the output.
  ///
  /// Stops at the first failed send; a reader that went away is a normal way
  /// for the pipeline to wind down. Returns how many candidates were delivered.
  pub fn run(self, mut output: WriteEnd) -> usize {
    let mut sent = 0;
    for candidate in self.candidates() {
      if let Err(e) = output.send(candidate) {
        debug!(candidate, error = %e, "Source output closed early");
        break;
      }
      sent += 1;
    }

    output.close();
    debug!(max = self.max, sent, "Source finished");
    sent
  }
}
