//! Index arithmetic for linear probing over a circular slot buffer.

/// Home slot of a key: where it would sit with no collisions.
#[inline]
pub(crate) fn home(hash: u64, capacity: usize) -> usize {
    debug_assert!(capacity > 0);
    (hash % capacity as u64) as usize
}

/// Next slot in probe order, wrapping at `capacity`.
#[inline]
pub(crate) fn next(pos: usize, capacity: usize) -> usize {
    let pos = pos + 1;
    if pos == capacity {
        0
    } else {
        pos
    }
}

/// Whether `gap` lies on the circular interval `[home, pos]`.
///
/// An entry living at `pos` whose home slot is `home` may only be moved
/// back into `gap` when this holds: the entry stays reachable from its home
/// and the vacancy that interrupted its chain gets filled. Indices below
/// `home` are lifted by `capacity` so the comparison happens on an
/// unwrapped line.
#[inline]
pub(crate) fn chain_covers(home: usize, gap: usize, pos: usize, capacity: usize) -> bool {
    debug_assert!(home < capacity && gap < capacity && pos < capacity);
    let gap = if gap < home { gap + capacity } else { gap };
    let pos = if pos < home { pos + capacity } else { pos };
    home <= gap && gap <= pos
}
