//! Fixed-width framing: one candidate per frame, host byte order.
//!
//! A frame is either transferred whole or the stream is over. Nothing is
//! retried except a call interrupted before it moved any bytes.

use crate::IpcError;
use sieve_core::Candidate;
use std::io::{self, Read, Write};

/// Bytes per frame
pub const FRAME_LEN: usize = std::mem::size_of::<Candidate>();

pub fn encode(value: Candidate) -> [u8; FRAME_LEN] {
    value.to_ne_bytes()
}

pub fn decode(frame: [u8; FRAME_LEN]) -> Candidate {
    Candidate::from_ne_bytes(frame)
}

/// Read one frame.
///
/// Returns `Ok(None)` when the peer closed after a whole number of frames and
/// `Err(IpcError::Truncated)` when it closed part-way through one.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Option<Candidate>, IpcError> {
    let mut frame = [0u8; FRAME_LEN];
    let got = loop {
        match reader.read(&mut frame) {
            Ok(n) => break n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(IpcError::Io(e)),
        }
    };

    match got {
        0 => Ok(None),
        FRAME_LEN => Ok(Some(decode(frame))),
        got => Err(IpcError::Truncated { got }),
    }
}

/// Write one frame with a single write call.
pub fn write_frame<W: Write>(writer: &mut W, value: Candidate) -> Result<(), IpcError> {
    let frame = encode(value);
    let written = loop {
        match writer.write(&frame) {
            Ok(n) => break n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(IpcError::Io(e)),
        }
    };

    if written == FRAME_LEN {
        Ok(())
    } else {
        Err(IpcError::ShortWrite { written })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Hands out at most `limit` bytes per call.
    struct Trickle<'a> {
        data: &'a [u8],
        limit: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.limit.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    /// Fails once with EINTR, then behaves like the inner reader.
    struct InterruptOnce<R> {
        inner: R,
        interrupted: bool,
    }

    impl<R: Read> Read for InterruptOnce<R> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }

    /// Accepts at most `limit` bytes per call.
    struct Narrow {
        limit: usize,
    }

    impl Write for Narrow {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(self.limit.min(buf.len()))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_frame_len_matches_candidate() {
        assert_eq!(FRAME_LEN, 4);
        assert_eq!(encode(7).len(), FRAME_LEN);
    }

    #[test]
    fn test_reads_frames_in_order_then_end_of_stream() {
        let mut bytes = Vec::new();
        for v in [2, 3, -1, Candidate::MAX] {
            write_frame(&mut bytes, v).unwrap();
        }

        let mut reader = Cursor::new(bytes);
        assert_eq!(read_frame(&mut reader).unwrap(), Some(2));
        assert_eq!(read_frame(&mut reader).unwrap(), Some(3));
        assert_eq!(read_frame(&mut reader).unwrap(), Some(-1));
        assert_eq!(read_frame(&mut reader).unwrap(), Some(Candidate::MAX));
        assert_eq!(read_frame(&mut reader).unwrap(), None);
    }

    #[test]
    fn test_empty_stream_is_end_of_stream() {
        let mut reader = Cursor::new(Vec::<u8>::new());
        assert!(read_frame(&mut reader).unwrap().is_none());
    }

    #[test]
    fn test_partial_frame_is_not_a_value() {
        let mut bytes = encode(11).to_vec();
        bytes.extend_from_slice(&encode(13)[..3]);

        let mut reader = Cursor::new(bytes);
        assert_eq!(read_frame(&mut reader).unwrap(), Some(11));
        let err = read_frame(&mut reader).unwrap_err();
        assert!(matches!(err, IpcError::Truncated { got: 3 }));
    }

    #[test]
    fn test_short_read_is_not_retried() {
        let frame = encode(17);
        let mut reader = Trickle { data: &frame, limit: 2 };
        assert!(matches!(read_frame(&mut reader), Err(IpcError::Truncated { got: 2 })));
    }

    #[test]
    fn test_interrupted_read_is_retried() {
        let mut reader = InterruptOnce {
            inner: Cursor::new(encode(19).to_vec()),
            interrupted: false,
        };
        assert_eq!(read_frame(&mut reader).unwrap(), Some(19));
    }

    #[test]
    fn test_short_write_is_failure() {
        let mut writer = Narrow { limit: 1 };
        let err = write_frame(&mut writer, 23).unwrap_err();
        assert!(matches!(err, IpcError::ShortWrite { written: 1 }));
        assert!(!err.is_broken_pipe());
    }
}
