//! Read sizes and non-blocking operation outcomes.

use crate::stream::error::Context;

// =#========================================================================#=
// READ SIZE
// =#========================================================================#=
/// How many bytes a stream operation should deliver.
///
/// `All` corresponds to the classic `read(-1)` convention of buffered I/O
/// layers: deliver whatever is currently available, even if that is nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadSize {
    /// Deliver exactly this many bytes.
    Exact(usize),
    /// Deliver everything currently available.
    All,
}

impl From<usize> for ReadSize {
    fn from(n: usize) -> Self {
        ReadSize::Exact(n)
    }
}

// =#========================================================================#=
// OUTCOME
// =#========================================================================#=
/// Outcome of an operation against a possibly non-blocking source.
///
/// Suspension is expressed as data rather than as a blocking call: `Underrun`
/// means "fewer bytes than requested are available right now; retry once more
/// data has arrived". The stream position is always unchanged across an
/// underrun, so the identical request can be reissued verbatim. The caller
/// owns the retry loop (polling, backoff, or integration with an external
/// event source).
#[derive(Debug)]
pub enum Outcome<T> {
    /// The operation completed with a value.
    Ready(T),
    /// Not enough data yet; carries the opaque caller context, if any.
    Underrun(Option<Context>),
}

impl<T> Outcome<T> {
    /// Returns `true` if this outcome is an underrun.
    pub fn is_underrun(&self) -> bool {
        matches!(self, Outcome::Underrun(_))
    }

    /// Converts the outcome into its value, discarding an underrun.
    ///
    /// # Returns
    /// * `Some(value)` - The operation completed
    /// * `None` - The operation reported an underrun
    pub fn ready(self) -> Option<T> {
        match self {
            Outcome::Ready(value) => Some(value),
            Outcome::Underrun(_) => None,
        }
    }

    /// Returns the attached context of an underrun, if any.
    pub fn underrun_context(&self) -> Option<&Context> {
        match self {
            Outcome::Ready(_) => None,
            Outcome::Underrun(context) => context.as_ref(),
        }
    }
}

// =#========================================================================#=
// TESTS
// =#========================================================================#=
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_size_from_usize() {
        assert_eq!(ReadSize::from(7), ReadSize::Exact(7));
        assert_eq!(ReadSize::from(0), ReadSize::Exact(0));
    }

    #[test]
    fn test_outcome_accessors() {
        let ready: Outcome<u8> = Outcome::Ready(42);
        assert!(!ready.is_underrun());
        assert_eq!(ready.ready(), Some(42));

        let stalled: Outcome<u8> = Outcome::Underrun(Some(Context::new("tag")));
        assert!(stalled.is_underrun());
        assert_eq!(
            stalled.underrun_context().unwrap().downcast_ref::<&str>(),
            Some(&"tag")
        );
    }
}
