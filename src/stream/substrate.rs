//! Substrate normalization into seekable streams.
//!
//! Decoders accept their input as a [Substrate]: fully materialized bytes, a
//! source that already supports seeking, or a bare forward-only source. All
//! three normalize into a single [SeekableStream] handle, so the decoding
//! logic itself never has to care which kind it was handed.

use std::any::type_name;
use std::io::{Read, Seek, SeekFrom};

use log::debug;

use crate::stream::caching_wrapper::CachingStreamWrapper;
use crate::stream::error::{Result, StreamError};
use crate::stream::seekable_stream::SeekableStream;

// =#========================================================================#=
// READ SEEK (Trait)
// =#========================================================================#=
/// Combination of reading and seeking, usable as a trait object.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

// =#========================================================================#=
// SUBSTRATE
// =#========================================================================#=
/// A raw byte source awaiting normalization.
///
/// The variants select the normalization branch at construction time:
/// - `Bytes` becomes a random-access buffer view, no copy beyond the move.
/// - `Seekable` passes through unchanged after a cheap seekability probe.
/// - `Forward` is wrapped in a [CachingStreamWrapper] so backward seeks work.
///
/// # Example
/// ```
/// use substream::{ReadSize, Substrate};
///
/// let mut stream = Substrate::from(&b"\x02\x01\x05"[..]).into_seekable().unwrap();
/// assert_eq!(stream.read(ReadSize::Exact(2)).unwrap(), b"\x02\x01");
/// ```
pub enum Substrate {
    /// Fully materialized in-memory bytes.
    Bytes(Vec<u8>),
    /// A source that claims to support seeking.
    Seekable {
        /// The source itself
        stream: Box<dyn ReadSeek>,
        /// Concrete type name, kept for normalization diagnostics
        type_name: &'static str,
    },
    /// A source that only supports sequential forward reads.
    Forward {
        /// The source itself
        stream: Box<dyn Read>,
        /// Concrete type name, kept for normalization diagnostics
        type_name: &'static str,
    },
}

impl Substrate {
    /// Wraps a source that already supports seeking.
    ///
    /// # Arguments
    /// * `stream` - Any `Read + Seek` source (file, cursor, ...)
    pub fn from_seekable<S: Read + Seek + 'static>(stream: S) -> Self {
        Substrate::Seekable {
            stream: Box::new(stream),
            type_name: type_name::<S>(),
        }
    }

    /// Wraps a source that only supports forward reads.
    ///
    /// # Arguments
    /// * `stream` - Any `Read` source (socket, pipe, ...)
    pub fn from_forward<S: Read + 'static>(stream: S) -> Self {
        Substrate::Forward {
            stream: Box::new(stream),
            type_name: type_name::<S>(),
        }
    }

    /// Normalizes this substrate into a [SeekableStream].
    ///
    /// # Errors
    /// Returns [StreamError::UnsupportedSubstrate], naming the offending
    /// type, when a `Seekable` substrate cannot actually report its position.
    pub fn into_seekable(self) -> Result<SeekableStream> {
        match self {
            Substrate::Bytes(bytes) => Ok(SeekableStream::from_buffer(bytes)),

            Substrate::Seekable {
                mut stream,
                type_name,
            } => {
                // A source that claims seekability but cannot even report its
                // position cannot back the decoder's backtracking.
                if stream.seek(SeekFrom::Current(0)).is_err() {
                    return Err(StreamError::UnsupportedSubstrate { type_name });
                }
                debug!("substrate {type_name} passed through as seekable");
                Ok(SeekableStream::from_raw(stream))
            }

            Substrate::Forward { stream, type_name } => {
                debug!("wrapping forward-only substrate {type_name} for backward seeks");
                Ok(SeekableStream::from_caching(CachingStreamWrapper::new(
                    stream,
                )))
            }
        }
    }
}

impl From<Vec<u8>> for Substrate {
    fn from(bytes: Vec<u8>) -> Self {
        Substrate::Bytes(bytes)
    }
}

impl From<&[u8]> for Substrate {
    fn from(bytes: &[u8]) -> Self {
        Substrate::Bytes(bytes.to_vec())
    }
}
