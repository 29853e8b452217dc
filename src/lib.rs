//! Substream provides backtrack-capable byte streams for incremental binary
//! decoders.
//!
//! Decoders of structured, length-prefixed formats often need to re-examine
//! bytes they have already consumed before committing to an interpretation,
//! for example to distinguish definite- from indefinite-length encodings or
//! to probe how many bytes a field occupies. This crate supplies the stream
//! core such a decoder builds on. Core functionality provided:
//! - Normalization: any supported byte source (in-memory bytes, an
//!   already-seekable source, or a forward-only source) becomes a single
//!   seekable [SeekableStream] handle. See [Substrate].
//! - Caching: forward-only sources gain backward seeks through
//!   [CachingStreamWrapper], which buffers every delivered byte and compacts
//!   the buffer as the decoder advances its marked position.
//! - End-of-stream probing, peeking, and exact-length bounded reads, all
//!   without net effect on position where the contract says so.
//! - Non-blocking sources: an operation that cannot complete right now
//!   reports [Outcome::Underrun] instead of blocking; the caller owns the
//!   retry loop. See [crate::stream] for the full contracts.
//!
//! Limitations:
//! - No format parsing: tag/length/value interpretation belongs to the
//!   decoder built on top of this crate.
//! - Seeking forward past cached data on a wrapped forward-only source is
//!   unsupported.
//! - A caller that never advances the marked position on a long
//!   forward-only stream causes unbounded cache growth.
//!
//! # Usage
//!
//! Decode a length-prefixed record from in-memory bytes:
//! ```
//! use substream::{ReadSize, Substrate};
//!
//! // A record: tag, length, then payload.
//! let mut stream = Substrate::from(&b"\x04\x03abc"[..]).into_seekable().unwrap();
//!
//! // Probe the tag without consuming it.
//! let tag = stream.peek(ReadSize::Exact(1)).unwrap().ready().unwrap();
//! assert_eq!(tag, b"\x04");
//!
//! // Consume the tag/length pair, then the payload it announces.
//! let header = stream
//!     .read_bounded(ReadSize::Exact(2), None)
//!     .unwrap()
//!     .ready()
//!     .unwrap();
//! let payload = stream
//!     .read_bounded(ReadSize::Exact(header[1] as usize), None)
//!     .unwrap()
//!     .ready()
//!     .unwrap();
//! assert_eq!(payload, b"abc");
//!
//! // The record is consumed; promise never to look back before here.
//! let position = stream.tell().unwrap();
//! stream.set_marked_position(position);
//! assert!(stream.is_end_of_stream().unwrap().ready().unwrap());
//! ```
//!
//! Wrap a forward-only source (socket, pipe) the same way:
//! ```
//! use substream::{ReadSize, Substrate};
//!
//! let pipe: &[u8] = b"\x02\x01\x05";
//! let mut stream = Substrate::from_forward(pipe).into_seekable().unwrap();
//! assert_eq!(stream.read(ReadSize::Exact(2)).unwrap(), b"\x02\x01");
//! ```

pub mod stream;

pub use stream::{
    CachingStreamWrapper, Context, Outcome, ReadSeek, ReadSize, Result, SeekableStream,
    StreamError, Substrate,
};
