//! Bounded stream copy with a reusable buffer.
//!
//! Every byte moved out of an archive goes through [`copy_bounded`], so no
//! member can produce more output than the caller allowed, whatever its
//! header claims.

use std::io;
use std::io::Read;
use std::io::Write;

/// Buffer size for copy operations (64KB).
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Reusable heap buffer for copy operations.
///
/// One buffer serves all members of an archive.
#[derive(Debug)]
pub struct CopyBuffer {
    buf: Box<[u8]>,
}

impl CopyBuffer {
    /// Creates a new copy buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: vec![0u8; COPY_BUFFER_SIZE].into_boxed_slice(),
        }
    }

    /// Returns the buffer size in bytes.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.buf.len()
    }
}

impl Default for CopyBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a bounded copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bounded {
    /// Source reached EOF within the limit.
    Complete(u64),
    /// Source produced more than the limit; `limit` bytes were written.
    LimitReached,
}

/// Which side of a copy failed.
///
/// Read failures come from the (untrusted) source and are a property of the
/// input; write failures come from local storage and are environment faults.
#[derive(Debug)]
pub enum CopyError {
    /// Reading from the source failed (corrupt data, CRC mismatch, ...).
    Read(io::Error),
    /// Writing to the destination failed.
    Write(io::Error),
}

impl std::fmt::Display for CopyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(e) => write!(f, "read failed: {e}"),
            Self::Write(e) => write!(f, "write failed: {e}"),
        }
    }
}

impl std::error::Error for CopyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read(e) | Self::Write(e) => Some(e),
        }
    }
}

/// Copies at most `limit` bytes from `reader` to `writer`.
///
/// The reader is read to EOF (so checksumming readers get to verify) unless
/// it exceeds `limit`, in which case copying stops after one byte of
/// overrun is observed.
///
/// # Errors
///
/// Returns `CopyError::Read` or `CopyError::Write` depending on which side
/// failed.
///
/// # Examples
///
/// ```
/// use intake_core::copy::{Bounded, CopyBuffer, copy_bounded};
///
/// let mut buffer = CopyBuffer::new();
/// let mut out = Vec::new();
/// let result = copy_bounded(&mut &b"hello"[..], &mut out, &mut buffer, 3).unwrap();
/// assert_eq!(result, Bounded::LimitReached);
/// assert_eq!(out, b"hel");
/// ```
pub fn copy_bounded<R: Read + ?Sized, W: Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
    buffer: &mut CopyBuffer,
    limit: u64,
) -> Result<Bounded, CopyError> {
    let mut total: u64 = 0;

    loop {
        let bytes_read = match reader.read(&mut buffer.buf) {
            Ok(0) => return Ok(Bounded::Complete(total)),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CopyError::Read(e)),
        };

        let remaining = limit - total;
        if bytes_read as u64 > remaining {
            // remaining < bytes_read <= buffer size, so this fits in usize
            #[allow(clippy::cast_possible_truncation)]
            let keep = remaining as usize;
            writer
                .write_all(&buffer.buf[..keep])
                .map_err(CopyError::Write)?;
            return Ok(Bounded::LimitReached);
        }

        writer
            .write_all(&buffer.buf[..bytes_read])
            .map_err(CopyError::Write)?;
        total += bytes_read as u64;
    }
}
