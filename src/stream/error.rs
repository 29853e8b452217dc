//! Error and diagnostic types for the stream core.
//!
//! Only two conditions here are terminal: [StreamError::EndOfStream] and
//! [StreamError::UnsupportedSubstrate]. The recoverable "not enough data yet"
//! condition is not an error at all; it is expressed as
//! [Outcome::Underrun](crate::stream::Outcome::Underrun) so that callers loop
//! on it instead of catching it.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

// =#========================================================================#=
// CONTEXT
// =#========================================================================#=
/// Opaque diagnostic payload attached to underrun and end-of-stream outcomes.
///
/// The decoder hands a `Context` to
/// [read_bounded](crate::stream::SeekableStream::read_bounded) and gets it
/// back attached to whatever outcome the read produces. The stream core never
/// inspects the payload; it exists purely so the decoder can tell which
/// structural element a stalled or failed read belongs to.
///
/// Cloning is cheap: the payload is behind a shared handle.
///
/// # Example
/// ```
/// use substream::Context;
///
/// let context = Context::new("SEQUENCE header");
/// assert_eq!(context.downcast_ref::<&str>(), Some(&"SEQUENCE header"));
/// assert!(context.downcast_ref::<u32>().is_none());
/// ```
#[derive(Clone)]
pub struct Context(Arc<dyn Any + Send + Sync>);

impl Context {
    /// Wraps an arbitrary caller value as an opaque context blob.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Context(Arc::new(value))
    }

    /// Returns a reference to the payload if it is of type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Context(..)")
    }
}

// =#========================================================================#=
// STREAM ERROR
// =#========================================================================#=
/// Terminal errors produced by the stream core.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The input exposes none of the capabilities required for normalization.
    /// Raised once, at the boundary, before any reading begins.
    #[error("cannot convert {type_name} to a seekable byte stream")]
    UnsupportedSubstrate {
        /// Name of the offending source type, for diagnostics.
        type_name: &'static str,
    },

    /// The source will never produce the requested bytes.
    ///
    /// Unlike an underrun this is not retryable; it is always propagated to
    /// the ultimate caller.
    #[error("end of stream reached")]
    EndOfStream {
        /// Opaque caller context attached at the failing read, if any.
        context: Option<Context>,
    },

    /// An I/O failure reported by the underlying source.
    ///
    /// `WouldBlock` never appears here; it is absorbed into the underrun
    /// outcome before errors are surfaced.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, StreamError>;

// =#========================================================================#=
// TESTS
// =#========================================================================#=
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_roundtrip() {
        let context = Context::new(vec![1u32, 2, 3]);
        let copy = context.clone();
        assert_eq!(copy.downcast_ref::<Vec<u32>>(), Some(&vec![1u32, 2, 3]));
        assert!(copy.downcast_ref::<String>().is_none());
    }

    #[test]
    fn test_unsupported_substrate_names_type() {
        let error = StreamError::UnsupportedSubstrate {
            type_name: "std::io::Stdin",
        };
        assert!(error.to_string().contains("std::io::Stdin"));
    }

    #[test]
    fn test_would_block_converts_to_io_not_end_of_stream() {
        let error = StreamError::from(std::io::Error::from(std::io::ErrorKind::WouldBlock));
        assert!(matches!(error, StreamError::Io(_)));
    }
}
