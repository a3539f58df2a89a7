//! # immutrie
//!
//! Persistent (immutable) collections keyed by byte strings.
//!
//! ## Overview
//!
//! Every write returns a new collection and leaves the one it started from
//! untouched. Unchanged parts are shared between versions, so keeping old
//! versions around is cheap and they can be read concurrently.
//!
//! - **Critbit trie**: ordered map from byte strings to values
//! - **Radix trie**: ordered map with the same contract, branching per byte
//! - **List**: singly-linked cons-list
//! - **Queue**: FIFO queue with peek cursors that survive later snapshots
//!
//! ## Feature Flags
//!
//! - `arc`: share nodes through `Arc` instead of `Rc`, making every
//!   collection `Send + Sync`
//! - `serde`: `Serialize`/`Deserialize` for every collection
//!
//! ## Example
//!
//! ```rust
//! use immutrie::prelude::*;
//!
//! let trie = CritbitTrie::new()
//!     .insert(b"abc/ghi", 1)
//!     .insert(b"abcd/a", 2)
//!     .insert(b"abce", 3);
//!
//! let under: Vec<&[u8]> = trie.prefixed(b"abcd").map(|(key, _)| key).collect();
//! assert_eq!(under, vec![b"abcd/a".as_slice()]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```rust
/// use immutrie::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::CollectionError;
    pub use crate::persistent::*;
}

pub mod error;
pub mod persistent;
