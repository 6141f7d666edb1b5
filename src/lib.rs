//! oa-hashmap: a single-threaded, open-addressing hash map that keeps all
//! entries in one contiguous buffer and deletes without tombstones.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small map whose whole state is one slot buffer plus a count,
//!   with every structural rule checkable by a linear scan.
//! - Layers:
//!   - `storage`: fixed-layout slots (`Option<Entry>`), fallible
//!     allocation, occupied-slot accessors. No hashing, no probing.
//!   - `probe`: pure index arithmetic; home slot, wrapping successor, and
//!     the circular interval test used by gap repair.
//!   - `OpenAddressingMap<K, V, S>`: probing put/get/delete, growth, gap
//!     repair and iteration on top of the two above.
//!
//! Invariants
//! - At most one live slot per key.
//! - `2 * len <= capacity` after every put.
//! - Unbroken chains: for a live entry at slot `p` with home `h`, every
//!   slot from `h` to `p` (wrapping) is live. Lookups stop at the first
//!   empty slot, so this is what makes them correct.
//!
//! Growth
//! - A put that would add a key past the load factor doubles the capacity
//!   first. The new buffer is fully allocated before the old one is
//!   touched; if allocation fails, the put fails and the map is unchanged.
//! - Capacity never shrinks.
//!
//! Deletion
//! - Backward shift: after vacating a slot, later entries in the same run
//!   whose chain passes through the hole move back into it, and the hole
//!   moves forward with them, until the run ends at an empty slot.
//!
//! Hasher and rehashing invariants
//! - Each entry stores the `u64` hash computed on insertion. Growth and
//!   gap repair re-home entries from the stored hash; `K: Hash` runs only
//!   on the key passed to a put/get/delete call.
//!
//! Caller contract
//! - Keys that compare equal must hash equally, including through
//!   `Borrow<Q>`. Breaking this cannot cause memory unsafety, only missed
//!   lookups or duplicate keys.
//! - `Hash`/`Eq` must not re-enter the map. Debug builds panic if they do.
//! - Mutation during iteration is rejected by the borrow checker.
//!
//! Notes and non-goals
//! - Single-threaded: the map is `Send` when its parts are, never `Sync`.
//! - No shrinking, no ordering guarantees for iteration.
//! - Slot positions are never exposed; growth and deletion move entries.

pub mod error;
pub mod open_addressing_map;
mod open_addressing_map_proptest;
mod probe;
mod reentrancy;
mod storage;

// Public surface
pub use error::MapError;
pub use open_addressing_map::{Iter, OpenAddressingMap, DEFAULT_CAPACITY};
