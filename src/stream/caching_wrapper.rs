//! Caching wrapper around forward-only byte sources.
//!
//! This module provides [CachingStreamWrapper], which turns a source that
//! only supports sequential forward reads into one that can also seek
//! backward, by mirroring every byte it ever delivered in an internal cache.

use std::io::{self, Read, SeekFrom};

use log::trace;

use crate::stream::outcome::ReadSize;

// =#========================================================================#=
// CACHING STREAM WRAPPER
// =#========================================================================#=
/// A wrapper that buffers every byte read from a forward-only source.
///
/// Backward seeks within the buffered region succeed; new reads past the end
/// of the buffer are forwarded to the underlying source and their result is
/// appended to the buffer. This is what lets a decoder re-examine bytes it
/// has already consumed before committing to an interpretation.
///
/// The wrapper is tied to its decoder: for performance it does not validate
/// the caller's mark updates against the true position. The caller promises
/// two things:
/// - never seek before the [marked position](Self::set_marked_position), and
/// - advance the mark after every fully consumed structural element.
///
/// A caller that never advances the mark on a long forward-only stream causes
/// unbounded cache growth; advancing it is what allows the wrapper to discard
/// consumed bytes (see [set_marked_position](Self::set_marked_position)).
///
/// The wrapper never blocks or retries internally. If the underlying source
/// is non-blocking and has nothing ready, its `WouldBlock` error is
/// propagated with the logical read position unchanged, so the identical
/// request can be retried later.
pub struct CachingStreamWrapper {
    /// The wrapped forward-only source, owned exclusively
    raw: Box<dyn Read>,

    /// Mirror of every byte delivered so far (minus compacted prefixes)
    cache: Vec<u8>,

    /// Current logical read position within the cache
    cursor: usize,

    /// Earliest offset the caller has promised never to seek before
    marked_position: usize,

    /// Consumed-prefix size above which a mark update compacts the cache
    compaction_threshold: usize,
}

impl CachingStreamWrapper {
    /// Default compaction threshold, in bytes.
    ///
    /// Once the consumed prefix of the cache grows past this size, the next
    /// mark update discards it. 8 KiB keeps memory bounded for long streams
    /// without compacting on every small structural element.
    pub const DEFAULT_BUFFER_SIZE: usize = 8192;

    /// Creates a wrapper with the default compaction threshold.
    ///
    /// # Arguments
    /// * `raw` - The forward-only source to wrap
    pub fn new(raw: impl Read + 'static) -> Self {
        Self::with_threshold(raw, Self::DEFAULT_BUFFER_SIZE)
    }

    /// Creates a wrapper with a custom compaction threshold.
    ///
    /// # Arguments
    /// * `raw` - The forward-only source to wrap
    /// * `threshold` - Consumed-prefix size that triggers compaction on the
    ///   next mark update
    pub fn with_threshold(raw: impl Read + 'static, threshold: usize) -> Self {
        Self {
            raw: Box::new(raw),
            cache: Vec::new(),
            cursor: 0,
            marked_position: 0,
            compaction_threshold: threshold,
        }
    }

    /// Reads up to `size` bytes, serving from the cache first.
    ///
    /// Bytes already in the cache at the cursor are returned without touching
    /// the underlying source. Any shortfall is requested from the source in a
    /// single attempt; whatever arrives is appended to the cache and to the
    /// result. The result may therefore be shorter than requested when the
    /// source had only partial data available.
    ///
    /// # Errors
    /// Propagates the underlying source's I/O errors, `WouldBlock` included.
    /// On error the cursor is restored to its pre-call position; bytes the
    /// source delivered before failing stay cached and will be served on
    /// retry.
    pub fn read(&mut self, size: ReadSize) -> io::Result<Vec<u8>> {
        match size {
            ReadSize::Exact(n) => self.read_exact_upto(n),
            ReadSize::All => self.read_all(),
        }
    }

    fn read_exact_upto(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let from_cache = (self.cache.len() - self.cursor).min(n);
        let mut result = self.cache[self.cursor..self.cursor + from_cache].to_vec();
        self.cursor += from_cache;

        let shortfall = n - from_cache;
        if shortfall == 0 {
            return Ok(result);
        }

        // Single read attempt against the raw source; never loops or blocks.
        let mut chunk = vec![0u8; shortfall];
        match self.raw.read(&mut chunk) {
            Ok(delivered) => {
                self.cache.extend_from_slice(&chunk[..delivered]);
                self.cursor += delivered;
                result.extend_from_slice(&chunk[..delivered]);
                Ok(result)
            }
            Err(e) => {
                self.cursor -= from_cache;
                Err(e)
            }
        }
    }

    fn read_all(&mut self) -> io::Result<Vec<u8>> {
        let start = self.cursor;
        let mut result = self.cache[self.cursor..].to_vec();
        self.cursor = self.cache.len();

        let mut fresh = Vec::new();
        match self.raw.read_to_end(&mut fresh) {
            Ok(_) => {
                self.cache.extend_from_slice(&fresh);
                self.cursor += fresh.len();
                result.extend_from_slice(&fresh);
                Ok(result)
            }
            Err(e) => {
                // read_to_end appends whatever it got before failing; those
                // bytes stay cached, but the cursor is restored for retry.
                self.cache.extend_from_slice(&fresh);
                self.cursor = start;
                Err(e)
            }
        }
    }

    /// Reads up to `size` bytes without advancing the cursor.
    ///
    /// Equivalent to [read](Self::read) followed by rewinding the cursor by
    /// the number of bytes actually returned. The cache still grows by any
    /// freshly delivered bytes.
    ///
    /// # Errors
    /// Same as [read](Self::read).
    pub fn peek(&mut self, size: ReadSize) -> io::Result<Vec<u8>> {
        let result = self.read(size)?;
        self.cursor -= result.len();
        Ok(result)
    }

    /// Moves the cursor within the cached region.
    ///
    /// Only positions between the marked position and the end of the cache
    /// are addressable. Seeking forward past the end of cached data is
    /// unsupported, and seeking before the mark violates the caller's own
    /// promise; both are rejected.
    ///
    /// # Returns
    /// The new cursor position.
    ///
    /// # Errors
    /// Returns `InvalidInput` if the target lies before the marked position
    /// or past the end of the cache.
    pub fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => offset as i128,
            SeekFrom::Current(delta) => self.cursor as i128 + delta as i128,
            SeekFrom::End(delta) => self.cache.len() as i128 + delta as i128,
        };

        if target < self.marked_position as i128 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "cannot seek to {target}: before marked position {}",
                    self.marked_position
                ),
            ));
        }
        if target > self.cache.len() as i128 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "cannot seek to {target}: beyond cached data (cache ends at {})",
                    self.cache.len()
                ),
            ));
        }

        self.cursor = target as usize;
        Ok(self.cursor as u64)
    }

    /// Returns the cursor's offset within the cache.
    ///
    /// Offsets are relative to the cache, so a compaction rebases them; use
    /// [marked_position](Self::marked_position) and `tell` together, never
    /// offsets remembered across a mark update.
    pub fn tell(&self) -> u64 {
        self.cursor as u64
    }

    /// Returns the position where the currently processed element starts.
    pub fn marked_position(&self) -> u64 {
        self.marked_position as u64
    }

    /// Declares that the caller will never seek before `position` again.
    ///
    /// The value is trusted to equal the true current position; it is not
    /// validated (documented contract of the wrapper). Once the consumed
    /// prefix of the cache exceeds the compaction threshold, setting the mark
    /// discards all bytes before the cursor and rebases both cursor and mark
    /// to 0 within the shrunken cache. Bytes observable from the cursor
    /// onward are unaffected.
    pub fn set_marked_position(&mut self, position: u64) {
        self.marked_position = position as usize;

        if self.cursor > self.compaction_threshold {
            trace!(
                "compacting stream cache: discarding {} consumed bytes",
                self.cursor
            );
            self.cache.drain(..self.cursor);
            self.cursor = 0;
            self.marked_position = 0;
        }
    }
}

// =#========================================================================#=
// TESTS
// =#========================================================================#=
#[cfg(test)]
mod tests {
    use std::io::{self, Read, SeekFrom};

    use super::*;

    /// Forward-only source that hands out its data in fixed-size chunks.
    struct ChunkedSource {
        data: Vec<u8>,
        offset: usize,
        chunk: usize,
    }

    impl ChunkedSource {
        fn new(data: &[u8], chunk: usize) -> Self {
            Self {
                data: data.to_vec(),
                offset: 0,
                chunk,
            }
        }
    }

    impl Read for ChunkedSource {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.chunk.min(buf.len()).min(self.data.len() - self.offset);
            buf[..n].copy_from_slice(&self.data[self.offset..self.offset + n]);
            self.offset += n;
            Ok(n)
        }
    }

    #[test]
    fn test_read_serves_cache_after_backward_seek() {
        let mut wrapper = CachingStreamWrapper::new(ChunkedSource::new(b"abcdef", 16));
        assert_eq!(wrapper.read(ReadSize::Exact(4)).unwrap(), b"abcd");

        wrapper.seek(SeekFrom::Start(1)).unwrap();
        assert_eq!(wrapper.read(ReadSize::Exact(2)).unwrap(), b"bc");
        assert_eq!(wrapper.tell(), 3);

        // Straddles the cache boundary: one byte cached, two fresh.
        assert_eq!(wrapper.read(ReadSize::Exact(3)).unwrap(), b"def");
    }

    #[test]
    fn test_read_returns_short_on_partial_delivery() {
        let mut wrapper = CachingStreamWrapper::new(ChunkedSource::new(b"abcdef", 2));
        assert_eq!(wrapper.read(ReadSize::Exact(5)).unwrap(), b"ab");
        assert_eq!(wrapper.tell(), 2);
    }

    #[test]
    fn test_read_all_drains_cache_and_source() {
        let mut wrapper = CachingStreamWrapper::new(ChunkedSource::new(b"abcdef", 16));
        wrapper.read(ReadSize::Exact(4)).unwrap();
        wrapper.seek(SeekFrom::Start(2)).unwrap();

        assert_eq!(wrapper.read(ReadSize::All).unwrap(), b"cdef");
        assert_eq!(wrapper.read(ReadSize::All).unwrap(), b"");
    }

    #[test]
    fn test_peek_restores_cursor_but_grows_cache() {
        let mut wrapper = CachingStreamWrapper::new(ChunkedSource::new(b"abcdef", 16));
        assert_eq!(wrapper.peek(ReadSize::Exact(3)).unwrap(), b"abc");
        assert_eq!(wrapper.tell(), 0);

        // Peeked bytes are served from the cache on the next read.
        assert_eq!(wrapper.read(ReadSize::Exact(3)).unwrap(), b"abc");
    }

    #[test]
    fn test_seek_before_mark_is_rejected() {
        let mut wrapper = CachingStreamWrapper::new(ChunkedSource::new(b"abcdef", 16));
        wrapper.read(ReadSize::Exact(4)).unwrap();
        wrapper.set_marked_position(4);

        let error = wrapper.seek(SeekFrom::Start(3)).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::InvalidInput);
        assert_eq!(wrapper.tell(), 4);
    }

    #[test]
    fn test_seek_beyond_cache_is_rejected() {
        let mut wrapper = CachingStreamWrapper::new(ChunkedSource::new(b"abcdef", 16));
        wrapper.read(ReadSize::Exact(2)).unwrap();

        let error = wrapper.seek(SeekFrom::Start(5)).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_mark_update_below_threshold_keeps_cache() {
        let mut wrapper = CachingStreamWrapper::new(ChunkedSource::new(b"abcdef", 16));
        wrapper.read(ReadSize::Exact(4)).unwrap();
        wrapper.set_marked_position(4);

        // No compaction: offsets are unchanged.
        assert_eq!(wrapper.tell(), 4);
        assert_eq!(wrapper.marked_position(), 4);
    }

    #[test]
    fn test_mark_update_above_threshold_compacts() {
        let data: Vec<u8> = (0..32).map(|i| i as u8).collect();
        let mut wrapper = CachingStreamWrapper::with_threshold(ChunkedSource::new(&data, 64), 8);
        wrapper.read(ReadSize::Exact(16)).unwrap();
        wrapper.set_marked_position(16);

        // Cursor and mark rebase to 0 in the shrunken cache.
        assert_eq!(wrapper.tell(), 0);
        assert_eq!(wrapper.marked_position(), 0);

        // Subsequent reads continue with the correct bytes.
        assert_eq!(wrapper.read(ReadSize::Exact(2)).unwrap(), &[16, 17]);
    }

    #[test]
    fn test_compaction_preserves_unconsumed_tail() {
        let data: Vec<u8> = (0..32).map(|i| i as u8).collect();
        let mut wrapper = CachingStreamWrapper::with_threshold(ChunkedSource::new(&data, 64), 8);
        wrapper.read(ReadSize::Exact(20)).unwrap();
        wrapper.seek(SeekFrom::Start(12)).unwrap();
        wrapper.set_marked_position(12);

        // Bytes 12..20 were already cached and must survive the compaction.
        assert_eq!(
            wrapper.read(ReadSize::Exact(8)).unwrap(),
            &[12, 13, 14, 15, 16, 17, 18, 19]
        );
    }
}
