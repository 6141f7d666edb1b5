// OpenAddressingMap public API tests.
//
// Each test documents the behavior being verified. Layout-level checks
// (exact slot positions, probe-chain scans) live in the crate's unit tests;
// these only use what a caller can see.
use oa_hashmap::{MapError, OpenAddressingMap, DEFAULT_CAPACITY};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::hash::{BuildHasher, Hasher};

#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    } // force all keys onto the same home slot
}

// Test: round trip for a spread of keys.
// Verifies: every put key reads back its value; len counts distinct keys.
#[test]
fn put_get_round_trip() {
    let mut m = OpenAddressingMap::new();
    for i in 0..1_000u32 {
        assert_eq!(m.put(format!("key-{i}"), i), Ok(None));
    }
    assert_eq!(m.len(), 1_000);
    for i in 0..1_000u32 {
        assert_eq!(m.get(format!("key-{i}").as_str()), Ok(&i));
    }
    assert_eq!(m.get("key-1000"), Err(MapError::NotFound));
}

// Test: update semantics.
// Verifies: second put returns the old value, get sees the new one, len unchanged.
#[test]
fn put_existing_key_updates_in_place() {
    let mut m = OpenAddressingMap::new();
    m.put("k", 1).unwrap();
    let len = m.len();
    assert_eq!(m.put("k", 2), Ok(Some(1)));
    assert_eq!(m.get(&"k"), Ok(&2));
    assert_eq!(m.len(), len);
}

// Test: deletion removes reachability for every previously inserted key,
// including keys deleted out of insertion order.
#[test]
fn delete_makes_every_key_unreachable() {
    let mut m = OpenAddressingMap::with_capacity(4);
    for i in 0..64u64 {
        m.put(i, i * 2).unwrap();
    }
    for i in (0..64u64).rev().step_by(2) {
        assert_eq!(m.delete(&i), Ok((i, i * 2)));
        assert_eq!(m.get(&i), Err(MapError::NotFound));
    }
    for i in 0..64u64 {
        assert_eq!(m.contains_key(&i), i % 2 == 0, "key {i}");
    }
    assert_eq!(m.len(), 32);
}

// Test: survivors of a shared collision run.
// Assumes: constant hasher puts A, B, C on one home slot.
// Verifies: deleting B leaves A and C reachable; deleting A leaves C.
#[test]
fn colliding_survivors_remain_reachable() {
    let mut m = OpenAddressingMap::with_hasher(ConstBuildHasher);
    m.put("A", 1).unwrap();
    m.put("B", 2).unwrap();
    m.put("C", 3).unwrap();

    assert_eq!(m.delete(&"B"), Ok(("B", 2)));
    assert_eq!(m.get(&"A"), Ok(&1));
    assert_eq!(m.get(&"C"), Ok(&3));

    assert_eq!(m.delete(&"A"), Ok(("A", 1)));
    assert_eq!(m.get(&"C"), Ok(&3));
    assert_eq!(m.len(), 1);
}

// Test: growth threshold.
// Verifies: capacity 4 holds two keys; the third doubles it to 8 and all
// entries stay retrievable.
#[test]
fn third_insert_doubles_capacity_four() {
    let mut m = OpenAddressingMap::with_capacity_and_hasher(4, ConstBuildHasher);
    m.put("a", 1).unwrap();
    m.put("b", 2).unwrap();
    assert_eq!(m.capacity(), 4);
    m.put("c", 3).unwrap();
    assert_eq!(m.capacity(), 8);
    assert_eq!(m.len(), 3);
    for (k, v) in [("a", 1), ("b", 2), ("c", 3)] {
        assert_eq!(m.get(&k), Ok(&v));
    }

    m.delete(&"a").unwrap();
    assert_eq!(m.get(&"b"), Ok(&2));
    assert_eq!(m.get(&"c"), Ok(&3));
}

// Test: load-factor bound and monotonic capacity.
// Verifies: 2 * len <= capacity after every put; deletes never shrink.
#[test]
fn load_factor_bound_holds_and_capacity_never_shrinks() {
    let mut m = OpenAddressingMap::with_capacity(1);
    for i in 0..300u32 {
        m.put(i, ()).unwrap();
        assert!(2 * m.len() <= m.capacity(), "len {} cap {}", m.len(), m.capacity());
    }
    let cap = m.capacity();
    for i in 0..300u32 {
        m.delete(&i).unwrap();
    }
    assert!(m.is_empty());
    assert_eq!(m.capacity(), cap);
}

// Test: iteration completeness.
// Verifies: for_each and iter visit exactly the live entries, once each.
#[test]
fn iteration_visits_live_entries_once() {
    let mut m = OpenAddressingMap::new();
    for i in 0..100u32 {
        m.put(i, i.to_string()).unwrap();
    }
    for i in (0..100u32).filter(|i| i % 7 == 0) {
        m.delete(&i).unwrap();
    }

    let mut visits: BTreeMap<u32, usize> = BTreeMap::new();
    m.for_each(|k, v| {
        assert_eq!(*v, k.to_string());
        *visits.entry(*k).or_default() += 1;
    });
    assert!(visits.values().all(|&n| n == 1));
    let expected: BTreeSet<u32> = (0..100).filter(|i| i % 7 != 0).collect();
    assert_eq!(visits.keys().copied().collect::<BTreeSet<_>>(), expected);

    let iter = m.iter();
    assert_eq!(iter.len(), expected.len());
    let keys: BTreeSet<u32> = (&m).into_iter().map(|(k, _)| *k).collect();
    assert_eq!(keys, expected);
}

// Test: visitor context travels through the closure.
#[test]
fn for_each_carries_caller_context() {
    struct Totals {
        entries: usize,
        bytes: usize,
    }
    let mut m = OpenAddressingMap::new();
    m.put(1u8, "ab").unwrap();
    m.put(2u8, "cde").unwrap();

    let mut ctx = Totals {
        entries: 0,
        bytes: 0,
    };
    m.for_each(|_, v| {
        ctx.entries += 1;
        ctx.bytes += v.len();
    });
    assert_eq!((ctx.entries, ctx.bytes), (2, 5));
}

// Test: constructors and defaults.
#[test]
fn constructors() {
    let m: OpenAddressingMap<u8, u8> = OpenAddressingMap::new();
    assert_eq!(m.capacity(), DEFAULT_CAPACITY);
    assert!(m.is_empty());

    let m: OpenAddressingMap<u8, u8> = OpenAddressingMap::with_capacity(0);
    assert_eq!(m.capacity(), 1);

    let m: OpenAddressingMap<u8, u8, ConstBuildHasher> =
        OpenAddressingMap::try_with_capacity_and_hasher(3, ConstBuildHasher).unwrap();
    assert_eq!(m.capacity(), 3);
    m.destroy();
}

// Test: allocation failure is an error value, not an abort.
// Verifies: error carries the slot count and exposes the allocator error as source.
#[test]
fn oversized_create_fails_with_alloc_error() {
    let err = match OpenAddressingMap::<u64, [u64; 8]>::try_with_capacity(usize::MAX / 2) {
        Ok(_) => panic!("allocation should fail"),
        Err(e) => e,
    };
    match &err {
        MapError::Alloc { slots, .. } => assert_eq!(*slots, usize::MAX / 2),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.source().is_some());
    assert!(err.to_string().contains("slots"));
}

#[test]
fn error_messages() {
    assert_eq!(MapError::NotFound.to_string(), "key not found");
    assert_eq!(
        MapError::CapacityOverflow { capacity: 8 }.to_string(),
        "cannot grow past a capacity of 8 slots"
    );
}

// Test: Extend and Debug.
#[test]
fn extend_then_debug_print() {
    let mut m = OpenAddressingMap::with_capacity(2);
    m.extend([("x", 1), ("y", 2), ("x", 3)]);
    assert_eq!(m.len(), 2);
    assert_eq!(m.get(&"x"), Ok(&3));
    let dbg = format!("{m:?}");
    assert!(dbg.contains("\"x\": 3") && dbg.contains("\"y\": 2"), "{dbg}");
}

// Test: the map can move to another thread when its parts can.
#[test]
fn map_is_send() {
    fn assert_send<T: Send>(_: &T) {}
    let mut m = OpenAddressingMap::new();
    m.put(1u32, String::from("one")).unwrap();
    assert_send(&m);
    let handle = std::thread::spawn(move || m.get(&1).cloned());
    assert_eq!(handle.join().unwrap(), Ok("one".to_string()));
}
