use crate::PipelineError;
use sieve_core::Candidate;
use std::fs::File;
use std::io::{self, Write};
use std::os::fd::{AsFd, OwnedFd};

/// Longest possible line is "prime -2147483648\n"
const LINE_CAPACITY: usize = 32;

/// Where filter stages announce their primes.
///
/// Each announcement is one unbuffered write of a whole line, so lines from
/// different stage processes never interleave and appear in the order the
/// stages wrote them.
#[derive(Debug)]
pub struct Reporter {
  out: File,
}

impl Reporter {
  /// Announce on a duplicate of the process's standard output.
  pub fn stdout() -> Result<Self, PipelineError> {
    let fd = io::stdout().as_fd().try_clone_to_owned().map_err(PipelineError::Reporter)?;
    Ok(Self::from(fd))
  }

  /// Write `prime <value>` followed by a newline.
  pub fn announce(&self, prime: Candidate) -> io::Result<()> {
    let mut buf = [0u8; LINE_CAPACITY];
    let len = {
      let mut cursor: &mut [u8] = &mut buf;
      writeln!(cursor, "prime {}", prime)?;
      LINE_CAPACITY - cursor.len()
    };

    let written = (&self.out).write(&buf[..len])?;
    if written != len {
      return Err(io::Error::new(io::ErrorKind::WriteZero, "partial announcement"));
    }
    Ok(())
  }
}

impl From<File> for Reporter {
  fn from(out: File) -> Self {
    Self { out }
  }
}

impl From<OwnedFd> for Reporter {
  fn from(fd: OwnedFd) -> Self {
    Self { out: File::from(fd) }
  }
}
