//! OpenAddressingMap: linear probing over a single slot buffer, doubling
//! growth, and backward-shift deletion.

use crate::error::MapError;
use crate::probe;
use crate::reentrancy::DebugReentrancy;
use crate::storage::{Entry, Slot, SlotBuffer};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use core::mem;
use hashbrown::hash_map::DefaultHashBuilder;
use tracing::{debug, trace};

/// Capacity used by [`OpenAddressingMap::new`] and `Default`.
pub const DEFAULT_CAPACITY: usize = 16;

/// Outcome of walking a probe chain for a key.
enum Probe {
    /// Live slot holding the key.
    Occupied(usize),
    /// First empty slot on the chain; the key is absent.
    Vacant(usize),
}

/// Open-addressing hash map with linear probing.
///
/// All entries live in one buffer of `capacity` slots. A key is stored at
/// the first free slot at or after its home slot (`hash % capacity`), and
/// the run of slots from home to the key is never interrupted by an empty
/// slot. Growth doubles the buffer whenever a put would push the load
/// factor past one half. Deletion shifts later entries back into the hole
/// instead of leaving a tombstone.
///
/// Slot positions are never exposed; entries are reached by key only.
pub struct OpenAddressingMap<K, V, S = DefaultHashBuilder> {
    hasher: S,
    slots: SlotBuffer<K, V>,
    len: usize,
    reentrancy: DebugReentrancy,
}

impl<K, V> OpenAddressingMap<K, V>
where
    K: Eq + Hash,
{
    /// Empty map with [`DEFAULT_CAPACITY`] slots.
    ///
    /// # Panics
    /// If the initial buffer cannot be allocated.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Empty map with `capacity` slots (at least one).
    ///
    /// # Panics
    /// If the initial buffer cannot be allocated. See
    /// [`try_with_capacity`](Self::try_with_capacity).
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }

    /// Empty map with `capacity` slots (at least one), reporting allocation
    /// failure as [`MapError::Alloc`].
    pub fn try_with_capacity(capacity: usize) -> Result<Self, MapError> {
        Self::try_with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }
}

impl<K, V, S> Default for OpenAddressingMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, S::default())
    }
}

impl<K, V, S> OpenAddressingMap<K, V, S> {
    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots in the buffer. Always at least `2 * len()`.
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Iterate live entries in storage order. The order is unrelated to
    /// insertion order and changes when the map grows or deletes.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.slots.slots().iter(),
            remaining: self.len,
        }
    }

    /// Call `visit` once for every live entry, in storage order.
    ///
    /// Any state the visitor needs travels in the closure's captures. The
    /// map is borrowed shared for the whole pass, so it cannot be mutated
    /// from inside `visit`.
    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(&K, &V),
    {
        for (k, v) in self.iter() {
            visit(k, v);
        }
    }

    /// Release the slot buffer and every entry in it.
    ///
    /// Dropping the map has the same effect; this spells the release out at
    /// the call site.
    pub fn destroy(self) {
        trace!(
            len = self.len,
            capacity = self.capacity(),
            "destroying open addressing map"
        );
        drop(self);
    }
}

impl<K, V, S> OpenAddressingMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Empty map using `hasher`, with [`DEFAULT_CAPACITY`] slots.
    ///
    /// # Panics
    /// If the initial buffer cannot be allocated.
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, hasher)
    }

    /// # Panics
    /// If the initial buffer cannot be allocated.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        match Self::try_with_capacity_and_hasher(capacity, hasher) {
            Ok(map) => map,
            Err(e) => panic!("OpenAddressingMap: {e}"),
        }
    }

    /// Empty map with `capacity` slots (0 is raised to 1) using `hasher`.
    ///
    /// Every slot starts empty. Fails only if the buffer cannot be
    /// allocated.
    pub fn try_with_capacity_and_hasher(capacity: usize, hasher: S) -> Result<Self, MapError> {
        let capacity = capacity.max(1);
        let slots = SlotBuffer::try_with_capacity(capacity)?;
        trace!(capacity, "created open addressing map");
        Ok(Self {
            hasher,
            slots,
            len: 0,
            reentrancy: DebugReentrancy::new(),
        })
    }

    /// Hash `q` and walk its probe chain. This is the only place user
    /// `Hash`/`Eq` code runs, so it is the guarded section.
    fn locate<Q>(&self, op: &'static str, q: &Q) -> (u64, Probe)
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter(op);
        let hash = self.hasher.hash_one(q);
        let capacity = self.slots.capacity();
        let mut pos = probe::home(hash, capacity);
        // Terminates: the load factor keeps at least one slot empty.
        loop {
            match self.slots.get(pos) {
                None => return (hash, Probe::Vacant(pos)),
                Some(e) if e.hash == hash && e.key.borrow() == q => {
                    return (hash, Probe::Occupied(pos))
                }
                Some(_) => pos = probe::next(pos, capacity),
            }
        }
    }

    /// Reference to the value stored under `q`.
    pub fn get<Q>(&self, q: &Q) -> Result<&V, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_key_value(q).map(|(_, v)| v)
    }

    /// Stored key and value for `q`.
    pub fn get_key_value<Q>(&self, q: &Q) -> Result<(&K, &V), MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.locate("get", q).1 {
            Probe::Occupied(pos) => self
                .slots
                .get(pos)
                .map(|e| (&e.key, &e.value))
                .ok_or(MapError::NotFound),
            Probe::Vacant(_) => Err(MapError::NotFound),
        }
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Result<&mut V, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.locate("get_mut", q).1 {
            Probe::Occupied(pos) => self
                .slots
                .get_mut(pos)
                .map(|e| &mut e.value)
                .ok_or(MapError::NotFound),
            Probe::Vacant(_) => Err(MapError::NotFound),
        }
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        matches!(self.locate("contains_key", q).1, Probe::Occupied(_))
    }

    /// Insert `key -> value`, or replace the value if `key` is present.
    ///
    /// Returns the previous value on replacement; the stored key is kept and
    /// `len()` does not change. A new key that would raise the load factor
    /// above one half first doubles the capacity. Growth is all-or-nothing:
    /// on error the map is unchanged and `key`/`value` are dropped.
    pub fn put(&mut self, key: K, value: V) -> Result<Option<V>, MapError> {
        let (hash, found) = self.locate("put", &key);
        let pos = match found {
            Probe::Occupied(pos) => {
                let entry = self
                    .slots
                    .get_mut(pos)
                    .expect("probe reported an occupied slot");
                return Ok(Some(mem::replace(&mut entry.value, value)));
            }
            Probe::Vacant(pos) => pos,
        };

        let pos = if exceeds_load_factor(self.len + 1, self.slots.capacity()) {
            self.grow()?;
            first_vacant(&self.slots, hash)
        } else {
            pos
        };
        self.slots.fill(pos, Entry { key, value, hash });
        self.len += 1;
        Ok(None)
    }

    /// Remove `q`, returning the owned key and value.
    ///
    /// Entries further along the vacated slot's run are shifted back so
    /// every remaining key stays reachable from its home slot.
    pub fn delete<Q>(&mut self, q: &Q) -> Result<(K, V), MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let gap = match self.locate("delete", q).1 {
            Probe::Occupied(pos) => pos,
            Probe::Vacant(_) => return Err(MapError::NotFound),
        };
        let entry = self.slots.take(gap).ok_or(MapError::NotFound)?;
        let shifted = self.close_gap(gap);
        self.len -= 1;
        trace!(slot = gap, shifted, len = self.len, "deleted entry");
        Ok((entry.key, entry.value))
    }

    /// Backward-shift repair after `gap` was emptied. Returns how many
    /// entries moved.
    ///
    /// Scans forward from the gap until the run of live slots ends. An
    /// entry whose chain from home passes through the gap moves into it and
    /// its old slot becomes the new gap. Entries whose chain does not reach
    /// the gap stay put.
    fn close_gap(&mut self, mut gap: usize) -> usize {
        let capacity = self.slots.capacity();
        let mut shifted = 0;
        let mut pos = probe::next(gap, capacity);
        while let Some(entry) = self.slots.get(pos) {
            let home = probe::home(entry.hash, capacity);
            if probe::chain_covers(home, gap, pos, capacity) {
                trace!(from = pos, to = gap, home, "shifting entry back");
                self.slots.relocate(pos, gap);
                gap = pos;
                shifted += 1;
            }
            pos = probe::next(pos, capacity);
        }
        shifted
    }

    /// Double the capacity and re-home every entry by its stored hash.
    ///
    /// The new buffer is allocated before the old one is touched, so a
    /// failed allocation leaves the map as it was.
    fn grow(&mut self) -> Result<(), MapError> {
        let old_capacity = self.slots.capacity();
        let new_capacity = old_capacity
            .checked_mul(2)
            .ok_or(MapError::CapacityOverflow {
                capacity: old_capacity,
            })?;
        let grown = match SlotBuffer::try_with_capacity(new_capacity) {
            Ok(buffer) => buffer,
            Err(e) => {
                debug!(old_capacity, new_capacity, error = %e, "grow failed, map unchanged");
                return Err(e);
            }
        };

        for entry in mem::replace(&mut self.slots, grown).into_entries() {
            let pos = first_vacant(&self.slots, entry.hash);
            self.slots.fill(pos, entry);
        }
        debug!(
            old_capacity,
            new_capacity,
            len = self.len,
            "grew open addressing map"
        );
        Ok(())
    }

    /// Check every structural invariant, describing the first violation.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        let capacity = self.slots.capacity();
        let slots = self.slots.slots();

        let live = slots.iter().filter(|s| s.is_some()).count();
        if live != self.len {
            return Err(format!("len {} but {} live slots", self.len, live));
        }
        if exceeds_load_factor(self.len, capacity) {
            return Err(format!(
                "load factor exceeded: len {} capacity {}",
                self.len, capacity
            ));
        }

        let live: Vec<(usize, &Entry<K, V>)> = slots
            .iter()
            .enumerate()
            .filter_map(|(pos, s)| s.as_ref().map(|e| (pos, e)))
            .collect();
        for (i, &(pos, entry)) in live.iter().enumerate() {
            if self.hasher.hash_one(&entry.key) != entry.hash {
                return Err(format!("stored hash of slot {pos} is stale"));
            }
            let home = probe::home(entry.hash, capacity);
            let mut p = home;
            while p != pos {
                if self.slots.is_vacant(p) {
                    return Err(format!(
                        "empty slot {p} breaks the chain of slot {pos} (home {home})"
                    ));
                }
                p = probe::next(p, capacity);
            }
            if live[i + 1..].iter().any(|(_, other)| other.key == entry.key) {
                return Err(format!("key of slot {pos} is stored twice"));
            }
        }
        Ok(())
    }

    /// Keys by slot position, `None` for empty slots.
    #[cfg(test)]
    pub(crate) fn layout(&self) -> Vec<Option<&K>> {
        self.slots
            .slots()
            .iter()
            .map(|s| s.as_ref().map(|e| &e.key))
            .collect()
    }
}

/// True when `len` live entries would break `2 * len <= capacity`.
#[inline]
fn exceeds_load_factor(len: usize, capacity: usize) -> bool {
    len > capacity / 2
}

/// First empty slot on the chain starting at the home of `hash`. Only used
/// for keys known to be absent, so no key comparison is needed.
fn first_vacant<K, V>(slots: &SlotBuffer<K, V>, hash: u64) -> usize {
    let capacity = slots.capacity();
    let mut pos = probe::home(hash, capacity);
    while !slots.is_vacant(pos) {
        pos = probe::next(pos, capacity);
    }
    pos
}

/// Iterator over live entries of an [`OpenAddressingMap`], in storage order.
pub struct Iter<'a, K, V> {
    it: core::slice::Iter<'a, Slot<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.it.find_map(|slot| slot.as_ref())?;
        self.remaining -= 1;
        Some((&entry.key, &entry.value))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<'a, K, V, S> IntoIterator for &'a OpenAddressingMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S> Extend<(K, V)> for OpenAddressingMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// # Panics
    /// If growing the buffer fails.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            if let Err(e) = self.put(k, v) {
                panic!("OpenAddressingMap::extend: {e}");
            }
        }
    }
}

impl<K, V, S> fmt::Debug for OpenAddressingMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
