//! Slot storage: one owned buffer of fixed-layout records.
//!
//! Each slot is either empty or holds an [`Entry`]. The buffer is allocated
//! once, at its final length, and never reallocates in place; growing the
//! map means building a second buffer and swapping it in.

use crate::error::MapError;

#[derive(Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    /// Hash of `key` computed on insertion. Re-homing during growth and gap
    /// repair reads this instead of hashing the key again.
    pub(crate) hash: u64,
}

/// `None` is an empty slot.
pub(crate) type Slot<K, V> = Option<Entry<K, V>>;

pub(crate) struct SlotBuffer<K, V> {
    slots: Box<[Slot<K, V>]>,
}

impl<K, V> SlotBuffer<K, V> {
    /// Allocate `capacity` empty slots, reporting allocator failure instead
    /// of aborting.
    pub(crate) fn try_with_capacity(capacity: usize) -> Result<Self, MapError> {
        debug_assert!(capacity > 0);
        let mut slots: Vec<Slot<K, V>> = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|source| MapError::Alloc {
                slots: capacity,
                source,
            })?;
        slots.resize_with(capacity, || None);
        Ok(Self {
            slots: slots.into_boxed_slice(),
        })
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn get(&self, pos: usize) -> Option<&Entry<K, V>> {
        self.slots[pos].as_ref()
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, pos: usize) -> Option<&mut Entry<K, V>> {
        self.slots[pos].as_mut()
    }

    #[inline]
    pub(crate) fn is_vacant(&self, pos: usize) -> bool {
        self.slots[pos].is_none()
    }

    /// Place `entry` into an empty slot.
    #[inline]
    pub(crate) fn fill(&mut self, pos: usize, entry: Entry<K, V>) {
        debug_assert!(self.is_vacant(pos), "fill into occupied slot {pos}");
        self.slots[pos] = Some(entry);
    }

    /// Empty a slot, returning what it held.
    #[inline]
    pub(crate) fn take(&mut self, pos: usize) -> Option<Entry<K, V>> {
        self.slots[pos].take()
    }

    /// Move the entry at `from` into the empty slot `to`.
    pub(crate) fn relocate(&mut self, from: usize, to: usize) {
        debug_assert!(self.is_vacant(to), "relocate into occupied slot {to}");
        let entry = self.slots[from].take();
        debug_assert!(entry.is_some(), "relocate from empty slot {from}");
        self.slots[to] = entry;
    }

    /// Slots in storage order, empty ones included.
    #[inline]
    pub(crate) fn slots(&self) -> &[Slot<K, V>] {
        &self.slots
    }

    /// Consume the buffer, yielding live entries in storage order.
    pub(crate) fn into_entries(self) -> impl Iterator<Item = Entry<K, V>> {
        self.slots.into_vec().into_iter().flatten()
    }
}
