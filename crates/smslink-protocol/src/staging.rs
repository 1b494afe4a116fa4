//! Linear staging buffer with view-based field extraction.
//!
//! Ring contents are drained into the staging buffer once; every field pulled
//! out afterwards is a [`View`] (offset and length) into the same storage, so
//! nothing is copied a second time.
//!
//! Extraction never partially consumes: when a literal is not found, the
//! source view is left exactly as it was.
//!
//! ```
//! use smslink_protocol::StagingBuffer;
//!
//! let mut staging = StagingBuffer::<64>::new();
//! staging.extend_from_slice(b"+33612345671\",,\"date\"").unwrap();
//!
//! let mut rest = staging.view();
//! let sender = staging.extract_upto_literal(&mut rest, b"\"").unwrap();
//! assert_eq!(staging.bytes(sender), b"+33612345671");
//! assert_eq!(staging.bytes(rest), b",,\"date\"");
//! ```

use std::ops::Range;

use smslink_core::{Error, Result};

use crate::ring::ByteRing;

/// Sub-range of a [`StagingBuffer`].
///
/// A view is only meaningful for the buffer that produced it and only until
/// that buffer is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct View {
    offset: usize,
    len: usize,
}

impl View {
    pub fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn end(&self) -> usize {
        self.offset + self.len
    }

    fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }

    /// Drop the first `n` bytes of the view (clamped to its length).
    pub(crate) fn advance(&mut self, n: usize) {
        let n = n.min(self.len);
        self.offset += n;
        self.len -= n;
    }
}

/// Fixed-capacity linear buffer with a write cursor.
#[derive(Debug, Clone)]
pub struct StagingBuffer<const N: usize> {
    buf: [u8; N],
    cursor: usize,
}

impl<const N: usize> StagingBuffer<N> {
    pub const fn new() -> Self {
        Self {
            buf: [0u8; N],
            cursor: 0,
        }
    }

    /// Number of bytes written since the last reset.
    pub fn len(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Free space left before the buffer is full.
    pub fn remaining(&self) -> usize {
        N - self.cursor
    }

    /// Append bytes.
    ///
    /// # Errors
    /// Returns `Error::StagingOverflow` without writing anything if the bytes
    /// do not fit.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > self.remaining() {
            return Err(Error::StagingOverflow { capacity: N });
        }
        self.buf[self.cursor..self.cursor + bytes.len()].copy_from_slice(bytes);
        self.cursor += bytes.len();
        Ok(())
    }

    /// Drain as much of `ring` as fits into the free space.
    ///
    /// Returns the number of bytes moved. Bytes that do not fit stay in the
    /// ring.
    pub fn refill_from<const R: usize>(&mut self, ring: &mut ByteRing<R>) -> Result<usize> {
        let n = ring.len().min(self.remaining());
        if n == 0 {
            return Ok(0);
        }
        ring.drain_into(&mut self.buf[self.cursor..], n)?;
        self.cursor += n;
        Ok(n)
    }

    /// Move exactly the oldest `n` bytes of `ring` into the free space.
    ///
    /// # Errors
    /// - `Error::StagingOverflow` if `n` bytes do not fit
    /// - `Error::Insufficient` if the ring holds fewer than `n` bytes
    ///
    /// Neither buffer is modified on error.
    pub fn take_from<const R: usize>(&mut self, ring: &mut ByteRing<R>, n: usize) -> Result<()> {
        if n > self.remaining() {
            return Err(Error::StagingOverflow { capacity: N });
        }
        ring.drain_into(&mut self.buf[self.cursor..], n)?;
        self.cursor += n;
        Ok(())
    }

    /// View over everything written so far.
    pub fn view(&self) -> View {
        View::new(0, self.cursor)
    }

    /// Resolve a view to its bytes.
    ///
    /// A view reaching past the write cursor (for example one kept across a
    /// reset) resolves to an empty slice.
    pub fn bytes(&self, view: View) -> &[u8] {
        self.buf[..self.cursor].get(view.range()).unwrap_or(&[])
    }

    /// Return the part of `view` preceding the first `literal` and advance
    /// `view` past the literal.
    ///
    /// # Errors
    /// Returns `Error::NotFound` and leaves `view` untouched if `literal`
    /// does not occur in `view`.
    pub fn extract_upto_literal(&self, view: &mut View, literal: &[u8]) -> Result<View> {
        let prefix = self.extract_upto_literal_peek(view, literal)?;
        view.advance(prefix.len + literal.len());
        Ok(prefix)
    }

    /// Same search as [`extract_upto_literal`](Self::extract_upto_literal)
    /// without consuming anything.
    ///
    /// # Errors
    /// Returns `Error::NotFound` if `literal` does not occur in `view`.
    pub fn extract_upto_literal_peek(&self, view: &View, literal: &[u8]) -> Result<View> {
        let at = find(self.bytes(*view), literal).ok_or(Error::NotFound)?;
        Ok(View::new(view.offset, at))
    }

    /// Drop one trailing line terminator (`\r\n`, `\n` or `\r`) from `view`.
    pub fn strip_line_terminator(&self, view: View) -> View {
        let bytes = self.bytes(view);
        let cut = if bytes.ends_with(b"\r\n") {
            2
        } else if bytes.ends_with(b"\n") || bytes.ends_with(b"\r") {
            1
        } else {
            0
        };
        View::new(view.offset, view.len - cut)
    }

    /// Logically empty the buffer. Outstanding views become stale.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }
}

impl<const N: usize> Default for StagingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Offset of the first occurrence of `needle` in `haystack`.
///
/// An empty needle matches at offset 0.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
