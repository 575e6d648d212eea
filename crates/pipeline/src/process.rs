//! Stage processes: forking and reaping.
//!
//! `spawn` splits ownership at the fork. Whatever the parent keeps is dropped
//! in the child, and whatever moved into the stage closure is dropped in the
//! parent, so each endpoint ends up open in exactly one process.

use crate::PipelineError;
use sieve_core::Candidate;
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, trace};

/// Exit code of a stage whose body panicked
pub const PANIC_EXIT_CODE: i32 = 101;

/// What a spawned stage does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageRole {
  Source,
  Filter { prime: Candidate },
}

impl fmt::Display for StageRole {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StageRole::Source => write!(f, "source"),
      StageRole::Filter { prime } => write!(f, "filter({})", prime),
    }
  }
}

/// How a stage process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageExit {
  Exited(i32),
  Signaled(i32),
  Other(i32),
}

impl StageExit {
  pub fn is_clean(&self) -> bool {
    matches!(self, StageExit::Exited(0))
  }

  fn from_status(status: libc::c_int) -> Self {
    if libc::WIFEXITED(status) {
      StageExit::Exited(libc::WEXITSTATUS(status))
    } else if libc::WIFSIGNALED(status) {
      StageExit::Signaled(libc::WTERMSIG(status))
    } else {
      StageExit::Other(status)
    }
  }
}

/// A running stage that has not been reaped yet.
#[derive(Debug)]
#[must_use = "stages must be waited for"]
pub struct StageHandle {
  pid: libc::pid_t,
  role: StageRole,
}

impl StageHandle {
  pub fn pid(&self) -> libc::pid_t {
    self.pid
  }

  pub fn role(&self) -> StageRole {
    self.role
  }

  /// Block until this stage terminates.
  pub fn wait(self) -> Result<StageExit, PipelineError> {
    let mut status: libc::c_int = 0;
    loop {
      // SAFETY: status is a valid out-pointer and pid is our own child
      let reaped = unsafe { libc::waitpid(self.pid, &mut status, 0) };
      if reaped == self.pid {
        break;
      }
      let err = io::Error::last_os_error();
      if err.kind() != io::ErrorKind::Interrupted {
        return Err(PipelineError::Wait {
          pid: self.pid,
          source: err,
        });
      }
    }

    let exit = StageExit::from_status(status);
    trace!(pid = self.pid, role = %self.role, ?exit, "Reaped stage");
    Ok(exit)
  }
}

/// Fork a stage process.
///
/// The child drops `parent_keeps`, runs `stage` and exits without returning.
/// The parent drops `stage` and gets `parent_keeps` back with the handle.
/// On failure both are dropped.
///
/// Only the calling thread exists in the child, so `stage` must not rely on a
/// lock that another thread of the parent could have been holding.
pub fn spawn<K, F>(role: StageRole, parent_keeps: K, stage: F) -> Result<(StageHandle, K), PipelineError>
where
  F: FnOnce(),
{
  // SAFETY: the child only runs `stage` and then calls _exit; it never returns
  // into the caller's frames
  let pid = unsafe { libc::fork() };

  match pid {
    -1 => Err(PipelineError::Spawn {
      role,
      source: io::Error::last_os_error(),
    }),
    0 => {
      drop(parent_keeps);
      let code = match panic::catch_unwind(AssertUnwindSafe(stage)) {
        Ok(()) => 0,
        Err(_) => PANIC_EXIT_CODE,
      };
      // SAFETY: terminates this process immediately; no exit handlers or
      // stdio buffers inherited from the parent are run
      unsafe { libc::_exit(code) }
    }
    pid => {
      drop(stage);
      debug!(pid, %role, "Spawned stage");
      Ok((StageHandle { pid, role }, parent_keeps))
    }
  }
}
