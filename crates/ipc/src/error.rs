use crate::codec::FRAME_LEN;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IpcError {
    #[error("Failed to create channel: {0}")]
    Create(#[source] io::Error),

    #[error("Channel I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Truncated frame: got {got} of {} bytes", FRAME_LEN)]
    Truncated { got: usize },

    #[error("Short write: {written} of {} bytes", FRAME_LEN)]
    ShortWrite { written: usize },
}

impl IpcError {
    /// The reading side of the channel has gone away.
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, IpcError::Io(e) if e.kind() == io::ErrorKind::BrokenPipe)
    }
}
