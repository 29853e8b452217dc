//! The normalized stream handle and the decoder-facing operations.
//!
//! This module provides [SeekableStream], the single handle a decode session
//! works against after [normalization](crate::stream::Substrate::into_seekable),
//! together with the four capabilities the decoder needs: end-of-stream
//! probing, peeking, bounded reads, and mark management.

use std::io::{self, Cursor, Read, Seek, SeekFrom};

use crate::stream::caching_wrapper::CachingStreamWrapper;
use crate::stream::error::{Context, Result, StreamError};
use crate::stream::outcome::{Outcome, ReadSize};
use crate::stream::substrate::ReadSeek;

// =#========================================================================#=
// SEEKABLE STREAM
// =#========================================================================#=
/// A seekable byte-stream handle over a normalized substrate.
///
/// Exactly one handle exists per decode session; all operations against it
/// are strictly sequential. The three realizations are selected once, at
/// normalization time:
/// - a random-access view over fully materialized bytes,
/// - a passthrough over a source that was already seekable,
/// - a [CachingStreamWrapper] giving a forward-only source backward seeks.
///
/// Operations that cannot complete on a non-blocking source report
/// [Outcome::Underrun] instead of blocking; the caller decides when to retry.
pub struct SeekableStream {
    inner: Inner,
}

impl std::fmt::Debug for SeekableStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            Inner::Buffer { cursor, mark } => f
                .debug_struct("SeekableStream::Buffer")
                .field("position", &cursor.position())
                .field("mark", mark)
                .finish(),
            Inner::Raw { mark, .. } => f
                .debug_struct("SeekableStream::Raw")
                .field("mark", mark)
                .finish_non_exhaustive(),
            Inner::Caching(_) => f
                .debug_struct("SeekableStream::Caching")
                .finish_non_exhaustive(),
        }
    }
}

enum Inner {
    Buffer { cursor: Cursor<Vec<u8>>, mark: u64 },
    Raw { stream: Box<dyn ReadSeek>, mark: u64 },
    Caching(CachingStreamWrapper),
}

impl SeekableStream {
    pub(crate) fn from_buffer(bytes: Vec<u8>) -> Self {
        Self {
            inner: Inner::Buffer {
                cursor: Cursor::new(bytes),
                mark: 0,
            },
        }
    }

    pub(crate) fn from_raw(stream: Box<dyn ReadSeek>) -> Self {
        Self {
            inner: Inner::Raw { stream, mark: 0 },
        }
    }

    pub(crate) fn from_caching(wrapper: CachingStreamWrapper) -> Self {
        Self {
            inner: Inner::Caching(wrapper),
        }
    }

    // --- Low-level stream capabilities -----------------------------------

    /// Reads up to `size` bytes from the current position.
    ///
    /// A single attempt against the realization: the result may be shorter
    /// than requested when the source had only partial data available. Use
    /// [read_bounded](Self::read_bounded) for exact-length reads with retry
    /// semantics.
    ///
    /// # Errors
    /// Propagates the realization's I/O errors, `WouldBlock` included.
    pub fn read(&mut self, size: ReadSize) -> io::Result<Vec<u8>> {
        match &mut self.inner {
            Inner::Buffer { cursor, .. } => read_upto(cursor, size),
            Inner::Raw { stream, .. } => read_upto(stream, size),
            Inner::Caching(wrapper) => wrapper.read(size),
        }
    }

    /// Moves the read position.
    ///
    /// For wrapped forward-only sources only backward seeks within
    /// already-cached data are supported; see
    /// [CachingStreamWrapper::seek].
    ///
    /// # Returns
    /// The new position.
    pub fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match &mut self.inner {
            Inner::Buffer { cursor, .. } => cursor.seek(pos),
            Inner::Raw { stream, .. } => stream.seek(pos),
            Inner::Caching(wrapper) => wrapper.seek(pos),
        }
    }

    /// Returns the current read position.
    pub fn tell(&mut self) -> io::Result<u64> {
        match &mut self.inner {
            Inner::Buffer { cursor, .. } => Ok(cursor.position()),
            Inner::Raw { stream, .. } => stream.stream_position(),
            Inner::Caching(wrapper) => Ok(wrapper.tell()),
        }
    }

    // --- Mark management -------------------------------------------------

    /// Returns the position where the currently processed element starts.
    pub fn marked_position(&self) -> u64 {
        match &self.inner {
            Inner::Buffer { mark, .. } | Inner::Raw { mark, .. } => *mark,
            Inner::Caching(wrapper) => wrapper.marked_position(),
        }
    }

    /// Declares that the caller will never seek before `position` again.
    ///
    /// The value is trusted, not validated against [tell](Self::tell). For
    /// randomly addressable realizations the mark is inert bookkeeping; for a
    /// wrapped forward-only source it is what permits cache compaction, so
    /// advance it after every fully consumed structural element.
    pub fn set_marked_position(&mut self, position: u64) {
        match &mut self.inner {
            Inner::Buffer { mark, .. } | Inner::Raw { mark, .. } => *mark = position,
            Inner::Caching(wrapper) => wrapper.set_marked_position(position),
        }
    }

    // --- Decoder-facing operations ---------------------------------------

    /// Checks whether the stream has no more bytes to deliver.
    ///
    /// The check has no net effect on position. For materialized buffers it
    /// compares offsets; for everything else it probe-reads one byte and
    /// pushes it back.
    ///
    /// # Returns
    /// * `Ready(true)` - No further bytes will be delivered
    /// * `Ready(false)` - At least one byte is ready
    /// * `Underrun` - A non-blocking source cannot answer yet; retry later
    pub fn is_end_of_stream(&mut self) -> Result<Outcome<bool>> {
        if let Inner::Buffer { cursor, .. } = &self.inner {
            let at_end = cursor.position() >= cursor.get_ref().len() as u64;
            return Ok(Outcome::Ready(at_end));
        }

        match self.read(ReadSize::Exact(1)) {
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(Outcome::Underrun(None)),
            Err(e) => Err(e.into()),
            Ok(bytes) if bytes.is_empty() => Ok(Outcome::Ready(true)),
            Ok(_) => {
                self.seek(SeekFrom::Current(-1))?;
                Ok(Outcome::Ready(false))
            }
        }
    }

    /// Returns up to `size` bytes without advancing the read position.
    ///
    /// The result may be shorter than requested when the source is exhausted;
    /// peeking an exhausted stream yields empty bytes, not an error. When a
    /// non-blocking source has nothing ready, the underrun is surfaced to the
    /// caller rather than looped on internally, like every other operation
    /// here.
    ///
    /// # Arguments
    /// * `size` - How many bytes to peek; [ReadSize::All] peeks everything
    ///   currently available
    pub fn peek(&mut self, size: ReadSize) -> Result<Outcome<Vec<u8>>> {
        // The caching wrapper peeks natively.
        if let Inner::Caching(wrapper) = &mut self.inner {
            return match wrapper.peek(size) {
                Ok(bytes) => Ok(Outcome::Ready(bytes)),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(Outcome::Underrun(None)),
                Err(e) => Err(e.into()),
            };
        }

        let origin = self.tell()?;
        let result = self.read_bounded(size, None);

        // Restore unconditionally, even on partial results or errors.
        self.seek(SeekFrom::Start(origin))?;

        match result {
            Err(StreamError::EndOfStream { .. }) => Ok(Outcome::Ready(Vec::new())),
            other => other,
        }
    }

    /// Reads exactly `size` bytes, or reports why it cannot.
    ///
    /// The caller never observes a torn read. Each call makes one attempt:
    /// - exactly `size` bytes were ready: `Ready(bytes)`, position advanced
    ///   by `size`;
    /// - the source had nothing ready right now, or only partial data (which
    ///   is pushed back): `Underrun` carrying `context`, position unchanged,
    ///   retry the identical call later;
    /// - the source is exhausted: [StreamError::EndOfStream] carrying
    ///   `context`, terminal.
    ///
    /// [ReadSize::All] delivers whatever is currently available, empty
    /// included, without treating emptiness as an error; so does
    /// `ReadSize::Exact(0)`.
    ///
    /// Retries are driven by the caller, never looped on internally, so
    /// higher-level scheduling (timeouts, fairness) stays in the caller's
    /// hands.
    ///
    /// # Arguments
    /// * `size` - Exact byte count to deliver
    /// * `context` - Opaque caller context attached to underrun and
    ///   end-of-stream outcomes; not interpreted
    ///
    /// # Errors
    /// [StreamError::EndOfStream] when the source is exhausted, or the
    /// realization's other I/O errors.
    pub fn read_bounded(
        &mut self,
        size: ReadSize,
        context: Option<Context>,
    ) -> Result<Outcome<Vec<u8>>> {
        let requested = match size {
            ReadSize::All => {
                return match self.read(ReadSize::All) {
                    Ok(bytes) => Ok(Outcome::Ready(bytes)),
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                        Ok(Outcome::Underrun(context))
                    }
                    Err(e) => Err(e.into()),
                };
            }
            ReadSize::Exact(n) => n,
        };

        match self.read(ReadSize::Exact(requested)) {
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(Outcome::Underrun(context)),
            Err(e) => Err(e.into()),
            Ok(bytes) if bytes.is_empty() && requested != 0 => {
                Err(StreamError::EndOfStream { context })
            }
            Ok(bytes) if bytes.len() < requested => {
                // Push the partial read back so the eventual success is a
                // single contiguous delivery.
                self.seek(SeekFrom::Current(-(bytes.len() as i64)))?;
                Ok(Outcome::Underrun(context))
            }
            Ok(bytes) => Ok(Outcome::Ready(bytes)),
        }
    }
}

/// Single read attempt of up to `size` bytes from a plain `Read` source.
fn read_upto<R: Read + ?Sized>(stream: &mut R, size: ReadSize) -> io::Result<Vec<u8>> {
    match size {
        ReadSize::Exact(n) => {
            let mut buf = vec![0u8; n];
            let delivered = stream.read(&mut buf)?;
            buf.truncate(delivered);
            Ok(buf)
        }
        ReadSize::All => {
            let mut buf = Vec::new();
            stream.read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}
