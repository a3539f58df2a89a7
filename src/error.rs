//! Error types for the persistent collections.
//!
//! Lookups never fail: a missing key is `None`. The variants here describe
//! misuse of an entry point, which the plain methods turn into a panic and
//! the `try_*` methods return as a value.

use thiserror::Error;

/// Errors reported by the collection entry points.
///
/// # Examples
///
/// ```rust
/// use immutrie::error::CollectionError;
///
/// let error = CollectionError::AbsentValue;
/// assert_eq!(error.to_string(), "value cannot be absent");
///
/// let error = CollectionError::GenerationMismatch { cursor: 3, queue: 1 };
/// assert_eq!(
///     error.to_string(),
///     "peek cursor generation 3 is newer than queue generation 1"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    /// An attempt was made to store "no value" under a key.
    ///
    /// Absence is expressed only by a key not being present.
    #[error("value cannot be absent")]
    AbsentValue,

    /// A queue peek cursor was advanced against a queue older than the one
    /// that produced it.
    #[error("peek cursor generation {cursor} is newer than queue generation {queue}")]
    GenerationMismatch {
        /// Generation recorded in the cursor.
        cursor: u64,
        /// Generation of the queue the cursor was advanced against.
        queue: u64,
    },
}
