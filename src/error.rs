//! Error type shared by every fallible map operation.

use std::collections::TryReserveError;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    /// No live entry with a matching key sits on the key's probe chain.
    #[error("key not found")]
    NotFound,

    /// The slot buffer could not be allocated. Raised by the fallible
    /// constructors and by growth inside `put`.
    #[error("failed to allocate a buffer of {slots} slots")]
    Alloc {
        slots: usize,
        #[source]
        source: TryReserveError,
    },

    /// Doubling the capacity would overflow `usize`.
    #[error("cannot grow past a capacity of {capacity} slots")]
    CapacityOverflow { capacity: usize },
}
