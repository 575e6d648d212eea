//! Unidirectional pipe channels with move-only endpoints.
//!
//! Each endpoint owns exactly one descriptor and closes it on drop. Handing an
//! endpoint to another stage means moving it; there is no way to clone one.

use crate::IpcError;
use crate::codec::{read_frame, write_frame};
use sieve_core::Candidate;
use std::fs::File;
use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};
use tracing::trace;

/// Create a new channel.
///
/// Both descriptors are close-on-exec, so they only ever reach forked stages.
pub fn pipe() -> Result<(ReadEnd, WriteEnd), IpcError> {
    let mut fds: [libc::c_int; 2] = [-1; 2];

    // SAFETY: fds points at two writable c_ints
    if unsafe { libc::pipe(fds.as_mut_ptr()) } < 0 {
        return Err(IpcError::Create(io::Error::last_os_error()));
    }

    // SAFETY: pipe succeeded, both descriptors are open and nothing else owns them
    let (read, write) = unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) };

    set_cloexec(&read).map_err(IpcError::Create)?;
    set_cloexec(&write).map_err(IpcError::Create)?;

    trace!(read_fd = fds[0], write_fd = fds[1], "Created channel");
    Ok((ReadEnd::from(read), WriteEnd::from(write)))
}

fn set_cloexec(fd: &OwnedFd) -> io::Result<()> {
    let raw = fd.as_raw_fd();
    // SAFETY: raw is an open descriptor owned by fd
    let flags = unsafe { libc::fcntl(raw, libc::F_GETFD) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: as above
    if unsafe { libc::fcntl(raw, libc::F_SETFD, flags | libc::FD_CLOEXEC) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Reading side of a channel.
#[derive(Debug)]
pub struct ReadEnd {
    file: File,
}

impl ReadEnd {
    /// Receive the next candidate; `Ok(None)` is a clean end-of-stream.
    pub fn receive(&mut self) -> Result<Option<Candidate>, IpcError> {
        read_frame(&mut self.file)
    }

    /// Release the endpoint.
    pub fn close(self) {}
}

impl From<OwnedFd> for ReadEnd {
    fn from(fd: OwnedFd) -> Self {
        Self { file: File::from(fd) }
    }
}

impl AsFd for ReadEnd {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl AsRawFd for ReadEnd {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

/// Writing side of a channel.
#[derive(Debug)]
pub struct WriteEnd {
    file: File,
}

impl WriteEnd {
    /// Send one candidate. Any failure means the channel is finished.
    pub fn send(&mut self, value: Candidate) -> Result<(), IpcError> {
        write_frame(&mut self.file, value)
    }

    /// Release the endpoint.
    pub fn close(self) {}
}

impl From<OwnedFd> for WriteEnd {
    fn from(fd: OwnedFd) -> Self {
        Self { file: File::from(fd) }
    }
}

impl From<WriteEnd> for File {
    fn from(end: WriteEnd) -> Self {
        end.file
    }
}

impl AsFd for WriteEnd {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl AsRawFd for WriteEnd {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}
