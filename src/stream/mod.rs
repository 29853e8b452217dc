//! Backtrack-capable byte-stream core.
pub(crate) mod caching_wrapper;
pub mod error;
pub(crate) mod outcome;
pub(crate) mod seekable_stream;
pub(crate) mod substrate;

pub use caching_wrapper::CachingStreamWrapper;
pub use error::{Context, Result, StreamError};
pub use outcome::{Outcome, ReadSize};
pub use seekable_stream::SeekableStream;
pub use substrate::{ReadSeek, Substrate};
