use crate::process::StageRole;
use ipc::IpcError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("Channel error: {0}")]
  Channel(#[from] IpcError),

  #[error("Failed to spawn {role} stage: {source}")]
  Spawn { role: StageRole, source: std::io::Error },

  #[error("Failed to wait for stage {pid}: {source}")]
  Wait { pid: libc::pid_t, source: std::io::Error },

  #[error("Failed to open reporter: {0}")]
  Reporter(#[source] std::io::Error),

  #[error("Stage limit of {limit} reached")]
  StageLimit { limit: usize },
}
