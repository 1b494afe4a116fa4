//! Fixed-capacity receive ring with inline pattern matching.
//!
//! The ring is the only landing place for bytes arriving from the modem.
//! Bytes are appended one at a time by the receive path and inspected or
//! removed from the front by the consumer, which never needs to copy a line
//! out just to recognise it.
//!
//! # Invariants
//!
//! - `len <= N` and `head < N`.
//! - The buffered bytes, oldest first, are `buf[head..]` followed by the
//!   wrapped remainder at the start of `buf`.
//!
//! # Overflow
//!
//! A push into a full ring empties the ring and rejects the byte. Losing one
//! partial frame is preferred over silently overwriting the oldest bytes,
//! which would leave the consumer matching against a corrupted front.
//!
//! # Example
//!
//! ```
//! use smslink_protocol::{ByteRing, Comparison};
//!
//! let mut ring = ByteRing::<16>::new();
//! for &b in b"\r\nOK\r\n" {
//!     ring.push(b).unwrap();
//! }
//!
//! ring.skip_until(b'\n').unwrap();
//! assert_eq!(ring.compare_front(b"OK"), Comparison::Equal);
//! ```

use smslink_core::{Error, Result};

/// Result of comparing a literal pattern against the oldest buffered bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// The front of the ring starts with the full pattern.
    Equal,

    /// A buffered byte differs from the pattern.
    NotEqual,

    /// Every buffered byte matches, but the pattern is longer than the
    /// buffered content. More bytes are needed to decide.
    Insufficient,
}

/// Circular byte queue of compile-time capacity `N`.
#[derive(Debug, Clone)]
pub struct ByteRing<const N: usize> {
    buf: [u8; N],
    head: usize,
    len: usize,
}

impl<const N: usize> ByteRing<N> {
    /// Create an empty ring.
    ///
    /// # Panics
    /// Panics at compile time when used in a const context, or at runtime
    /// otherwise, if `N == 0`.
    pub const fn new() -> Self {
        assert!(N > 0, "ByteRing capacity must be > 0");
        Self {
            buf: [0u8; N],
            head: 0,
            len: 0,
        }
    }

    /// Append one byte.
    ///
    /// # Errors
    /// Returns `Error::RingOverflow` when the ring was full. The ring is
    /// emptied and the byte is dropped.
    pub fn push(&mut self, byte: u8) -> Result<()> {
        if self.len == N {
            self.reset();
            return Err(Error::RingOverflow { capacity: N });
        }

        let tail = (self.head + self.len) % N;
        self.buf[tail] = byte;
        self.len += 1;
        Ok(())
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Most recently pushed byte.
    ///
    /// # Errors
    /// Returns `Error::BufferEmpty` if nothing is buffered.
    pub fn last_byte(&self) -> Result<u8> {
        if self.len == 0 {
            return Err(Error::BufferEmpty);
        }
        Ok(self.buf[(self.head + self.len - 1) % N])
    }

    /// Buffered bytes, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        let (first, second) = self.segments();
        first.iter().chain(second.iter()).copied()
    }

    /// Offset from the front of the first occurrence of `byte`.
    pub fn position(&self, byte: u8) -> Option<usize> {
        self.iter().position(|b| b == byte)
    }

    /// Compare the oldest `pattern.len()` bytes against `pattern` without
    /// removing anything.
    pub fn compare_front(&self, pattern: &[u8]) -> Comparison {
        if !self.iter().zip(pattern).all(|(buffered, &expected)| buffered == expected) {
            return Comparison::NotEqual;
        }

        if self.len < pattern.len() {
            Comparison::Insufficient
        } else {
            Comparison::Equal
        }
    }

    /// Discard `n` bytes from the front.
    ///
    /// # Errors
    /// Returns `Error::Insufficient` without touching the ring if fewer than
    /// `n` bytes are buffered.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        if n > self.len {
            return Err(Error::Insufficient {
                requested: n,
                available: self.len,
            });
        }

        self.head = (self.head + n) % N;
        self.len -= n;
        Ok(())
    }

    /// Discard bytes up to and including the first `delimiter`.
    ///
    /// Returns the number of bytes discarded.
    ///
    /// # Errors
    /// Returns `Error::NotFound` without touching the ring if `delimiter` is
    /// not buffered.
    pub fn skip_until(&mut self, delimiter: u8) -> Result<usize> {
        let consumed = self.position(delimiter).ok_or(Error::NotFound)? + 1;
        self.skip(consumed)?;
        Ok(consumed)
    }

    /// Copy the oldest `n` bytes into `dest[..n]` and remove them.
    ///
    /// # Errors
    /// - `Error::Insufficient` if fewer than `n` bytes are buffered
    /// - `Error::StagingOverflow` if `dest` is shorter than `n`
    ///
    /// Neither the ring nor `dest` is modified on error.
    pub fn drain_into(&mut self, dest: &mut [u8], n: usize) -> Result<usize> {
        if n > self.len {
            return Err(Error::Insufficient {
                requested: n,
                available: self.len,
            });
        }
        if n > dest.len() {
            return Err(Error::StagingOverflow {
                capacity: dest.len(),
            });
        }

        let (first, second) = self.segments();
        let from_first = first.len().min(n);
        dest[..from_first].copy_from_slice(&first[..from_first]);
        dest[from_first..n].copy_from_slice(&second[..n - from_first]);

        self.skip(n)?;
        Ok(n)
    }

    /// Empty the ring in O(1).
    pub fn reset(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Buffered bytes as up to two slices in logical order.
    fn segments(&self) -> (&[u8], &[u8]) {
        let end = self.head + self.len;
        if end <= N {
            (&self.buf[self.head..end], &[])
        } else {
            (&self.buf[self.head..], &self.buf[..end - N])
        }
    }
}

impl<const N: usize> Default for ByteRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ring_with<const N: usize>(bytes: &[u8]) -> ByteRing<N> {
        let mut ring = ByteRing::<N>::new();
        for &b in bytes {
            ring.push(b).unwrap();
        }
        ring
    }

    /// Fill and drain so the head sits at index 6 and the next pushes wrap
    /// around the end of the array.
    fn wrapped_ring_with(bytes: &[u8]) -> ByteRing<8> {
        let mut ring = ring_with::<8>(b"xxxxxx");
        ring.skip(6).unwrap();
        for &b in bytes {
            ring.push(b).unwrap();
        }
        ring
    }

    #[test]
    fn test_new_ring_is_empty() {
        let ring = ByteRing::<4>::new();
        assert!(ring.is_empty());
        assert_eq!(ring.capacity(), 4);
        assert!(matches!(ring.last_byte(), Err(Error::BufferEmpty)));
    }

    #[test]
    fn test_push_and_last_byte() {
        let ring = ring_with::<4>(b"ab");
        assert_eq!(ring.len(), 2);
        assert_eq!(ring.last_byte().unwrap(), b'b');
    }

    #[test]
    fn test_overflow_resets_ring() {
        let mut ring = ring_with::<4>(b"abcd");
        assert_eq!(ring.len(), 4);

        let result = ring.push(b'e');
        assert!(matches!(result, Err(Error::RingOverflow { capacity: 4 })));
        assert!(ring.is_empty());

        // Usable again after the reset
        ring.push(b'f').unwrap();
        assert_eq!(ring.iter().collect::<Vec<_>>(), b"f");
    }

    #[rstest]
    #[case(b"OK\r\n", b"OK", Comparison::Equal)]
    #[case(b"OK", b"OK", Comparison::Equal)]
    #[case(b"O", b"OK", Comparison::Insufficient)]
    #[case(b"", b"OK", Comparison::Insufficient)]
    #[case(b"AT\r", b"OK", Comparison::NotEqual)]
    #[case(b"E", b"OK", Comparison::NotEqual)]
    #[case(b"ERR", b"ERROR", Comparison::Insufficient)]
    #[case(b"ERX", b"ERROR", Comparison::NotEqual)]
    fn test_compare_front(
        #[case] content: &[u8],
        #[case] pattern: &[u8],
        #[case] expected: Comparison,
    ) {
        let ring = ring_with::<16>(content);
        assert_eq!(ring.compare_front(pattern), expected);
        // Comparison never consumes
        assert_eq!(ring.len(), content.len());
    }

    #[test]
    fn test_compare_front_across_wrap() {
        let ring = wrapped_ring_with(b"> hi");
        assert_eq!(ring.compare_front(b"> "), Comparison::Equal);
        assert_eq!(ring.compare_front(b"> hi"), Comparison::Equal);
        assert_eq!(ring.compare_front(b"> ho"), Comparison::NotEqual);
    }

    #[test]
    fn test_skip() {
        let mut ring = ring_with::<8>(b"abcdef");
        ring.skip(2).unwrap();
        assert_eq!(ring.compare_front(b"cd"), Comparison::Equal);
        assert_eq!(ring.len(), 4);
    }

    #[test]
    fn test_skip_too_many_has_no_effect() {
        let mut ring = ring_with::<8>(b"abc");
        assert!(matches!(ring.skip(4), Err(Error::Insufficient { .. })));
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.compare_front(b"abc"), Comparison::Equal);
    }

    #[test]
    fn test_skip_until_consumes_delimiter() {
        let mut ring = ring_with::<16>(b"AT\r\nOK\r\n");
        assert_eq!(ring.skip_until(b'\n').unwrap(), 4);
        assert_eq!(ring.compare_front(b"OK"), Comparison::Equal);
    }

    #[test]
    fn test_skip_until_missing_delimiter_has_no_effect() {
        let mut ring = ring_with::<16>(b"+CMT: \"+336");
        assert!(matches!(ring.skip_until(b'\n'), Err(Error::NotFound)));
        assert_eq!(ring.len(), 11);
        assert_eq!(ring.compare_front(b"+CMT"), Comparison::Equal);
    }

    #[test]
    fn test_drain_into_across_wrap() {
        let mut ring = wrapped_ring_with(b"abcde");
        let mut dest = [0u8; 8];

        assert_eq!(ring.drain_into(&mut dest, 4).unwrap(), 4);
        assert_eq!(&dest[..4], b"abcd");
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.last_byte().unwrap(), b'e');
    }

    #[test]
    fn test_drain_into_errors_have_no_effect() {
        let mut ring = ring_with::<8>(b"abc");
        let mut small = [0u8; 2];

        assert!(matches!(
            ring.drain_into(&mut small, 3),
            Err(Error::StagingOverflow { capacity: 2 })
        ));
        assert!(matches!(
            ring.drain_into(&mut small, 5),
            Err(Error::Insufficient { .. })
        ));
        assert_eq!(small, [0, 0]);
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn test_position_and_iter_follow_logical_order() {
        let ring = wrapped_ring_with(b"12\n45");
        assert_eq!(ring.position(b'\n'), Some(2));
        assert_eq!(ring.iter().collect::<Vec<_>>(), b"12\n45");
    }

    #[test]
    fn test_reset() {
        let mut ring = ring_with::<4>(b"abc");
        ring.reset();
        assert!(ring.is_empty());
        assert_eq!(ring.position(b'a'), None);
    }
}
