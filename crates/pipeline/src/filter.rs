use crate::Reporter;
use ipc::{ReadEnd, WriteEnd};
use sieve_core::{Candidate, MIN_CANDIDATE};
use tracing::{debug, warn};

/// Where a filter is in its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterState {
  /// Report the prime; happens exactly once, before anything is read
  Announce,
  /// Pass along every input value the prime does not divide
  Forward,
  /// Release both endpoints and stop
  Done,
}

/// Counters for one filter's run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
  pub forwarded: usize,
  pub discarded: usize,
}

/// A stage owning one prime.
///
/// Its prime is the first value that reached it, so by induction over the
/// chain no smaller prime divides it.
#[derive(Debug, Clone, Copy)]
pub struct Filter {
  prime: Candidate,
}

impl Filter {
  pub fn new(prime: Candidate) -> Self {
    debug_assert!(prime >= MIN_CANDIDATE, "filter prime must be at least 2, got {}", prime);
    Self { prime }
  }

  pub fn prime(&self) -> Candidate {
    self.prime
  }

  /// Whether `candidate` survives this filter.
  pub fn admits(&self, candidate: Candidate) -> bool {
    candidate % self.prime != 0
  }

  /// Run until the input ends or the output breaks.
  pub fn run(self, mut input: ReadEnd, mut output: WriteEnd, reporter: &Reporter) -> FilterStats {
    let mut stats = FilterStats::default();
    let mut state = FilterState::Announce;

    while state != FilterState::Done {
      state = match state {
        FilterState::Announce => {
          if let Err(e) = reporter.announce(self.prime) {
            warn!(prime = self.prime, error = %e, "Failed to announce prime");
          }
          FilterState::Forward
        }
        FilterState::Forward => self.step(&mut input, &mut output, &mut stats),
        FilterState::Done => FilterState::Done,
      };
    }

    input.close();
    output.close();
    debug!(
      prime = self.prime,
      forwarded = stats.forwarded,
      discarded = stats.discarded,
      "Filter finished"
    );
    stats
  }

  /// Handle one input value.
  fn step(&self, input: &mut ReadEnd, output: &mut WriteEnd, stats: &mut FilterStats) -> FilterState {
    let candidate = match input.receive() {
      Ok(Some(candidate)) => candidate,
      Ok(None) => return FilterState::Done,
      Err(e) => {
        debug!(prime = self.prime, error = %e, "Filter input ended irregularly");
        return FilterState::Done;
      }
    };

    if !self.admits(candidate) {
      stats.discarded += 1;
      return FilterState::Forward;
    }

    match output.send(candidate) {
      Ok(()) => {
        stats.forwarded += 1;
        FilterState::Forward
      }
      Err(e) => {
        debug!(
          prime = self.prime,
          broken_pipe = e.is_broken_pipe(),
          error = %e,
          "Filter output closed early"
        );
        FilterState::Done
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;
  use std::fs::File;
  use std::io::{Read, Seek, SeekFrom, Write};

  fn capture() -> (File, Reporter) {
    let file = tempfile::tempfile().unwrap();
    let reporter = Reporter::from(file.try_clone().unwrap());
    (file, reporter)
  }

  fn read_back(mut file: File) -> String {
    let mut out = String::new();
    file.seek(SeekFrom::Start(0)).unwrap();
    file.read_to_string(&mut out).unwrap();
    out
  }

  /// Pipe preloaded with `values` whose writer is already closed.
  fn input_of(values: &[Candidate]) -> ReadEnd {
    let (rx, mut tx) = ipc::pipe().unwrap();
    for &v in values {
      tx.send(v).unwrap();
    }
    rx
  }

  fn drain(mut rx: ReadEnd) -> Vec<Candidate> {
    let mut values = Vec::new();
    while let Some(v) = rx.receive().unwrap() {
      values.push(v);
    }
    values
  }

  #[test]
  fn test_admits() {
    let filter = Filter::new(3);
    assert!(!filter.admits(3));
    assert!(!filter.admits(9));
    assert!(filter.admits(4));
    assert!(filter.admits(5));
    assert!(!filter.admits(0));
    assert!(!filter.admits(-6));
    assert!(filter.admits(-7));
  }

  #[test]
  #[serial]
  fn test_forwards_survivors_in_order() {
    let (file, reporter) = capture();
    let input = input_of(&[3, 4, 5, 6, 7, 8, 9, 10, 11]);
    let (rx, tx) = ipc::pipe().unwrap();

    let stats = Filter::new(2).run(input, tx, &reporter);

    assert_eq!(stats, FilterStats { forwarded: 5, discarded: 4 });
    assert_eq!(drain(rx), vec![3, 5, 7, 9, 11]);
    drop(reporter);
    assert_eq!(read_back(file), "prime 2\n");
  }

  #[test]
  #[serial]
  fn test_announces_even_with_empty_input() {
    let (file, reporter) = capture();
    let (rx, tx) = ipc::pipe().unwrap();

    let stats = Filter::new(29).run(input_of(&[]), tx, &reporter);

    assert_eq!(stats, FilterStats::default());
    assert!(drain(rx).is_empty());
    drop(reporter);
    assert_eq!(read_back(file), "prime 29\n");
  }

  #[test]
  #[serial]
  fn test_stops_on_broken_output() {
    let (_file, reporter) = capture();
    let (rx, tx) = ipc::pipe().unwrap();
    rx.close();

    let stats = Filter::new(2).run(input_of(&[3, 5, 7]), tx, &reporter);

    // First survivor hits the broken pipe; nothing after it is read
    assert_eq!(stats.forwarded, 0);
  }

  #[test]
  #[serial]
  fn test_truncated_input_ends_forwarding() {
    let (_file, reporter) = capture();
    let (input, tx) = ipc::pipe().unwrap();
    let mut raw = File::from(tx);
    raw.write_all(&ipc::encode(5)).unwrap();
    raw.write_all(&[0xff, 0xff]).unwrap();
    drop(raw);
    let (rx, out) = ipc::pipe().unwrap();

    let stats = Filter::new(3).run(input, out, &reporter);

    assert_eq!(stats.forwarded, 1);
    assert_eq!(drain(rx), vec![5]);
  }

  #[test]
  #[serial]
  fn test_announcement_failure_does_not_stop_forwarding() {
    let (announce_rx, announce_tx) = ipc::pipe().unwrap();
    announce_rx.close();
    let reporter = Reporter::from(File::from(announce_tx));
    let (rx, tx) = ipc::pipe().unwrap();

    let stats = Filter::new(5).run(input_of(&[6, 10, 7]), tx, &reporter);

    assert_eq!(stats.forwarded, 2);
    assert_eq!(drain(rx), vec![6, 7]);
  }
}
