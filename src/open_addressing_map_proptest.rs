#![cfg(test)]

// Property tests for OpenAddressingMap kept inside the crate so they can
// inspect slot layout through `check_invariants`.

use crate::error::MapError;
use crate::open_addressing_map::OpenAddressingMap;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap};
use std::hash::{BuildHasher, Hasher};

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum Op {
    Put(usize, i32),
    Delete(usize),
    Get(usize),
    Mutate(usize, i32),
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=24).prop_flat_map(|pool| {
        let idx = 0..pool.len();
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Put(i, v)),
            3 => idx.clone().prop_map(Op::Delete),
            2 => idx.clone().prop_map(Op::Get),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

// State-machine equivalence against std::collections::HashMap.
// Invariants checked after every op:
// - put returns the model's previous value; get/delete agree with the model.
// - len parity; 2 * len <= capacity; capacity never shrinks.
// - every live slot is reachable from its home without crossing an empty
//   slot, its stored hash is current, and no key is stored twice.
// - iteration yields each live key exactly once.
fn run_state_machine<S: BuildHasher>(
    mut sut: OpenAddressingMap<String, i32, S>,
    pool: &[String],
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<String, i32> = HashMap::new();
    let mut capacity = sut.capacity();

    for op in ops {
        match op {
            Op::Put(i, v) => {
                let k = pool[i].clone();
                let prev = sut.put(k.clone(), v).expect("put should not fail to allocate");
                prop_assert_eq!(prev, model.insert(k, v));
            }
            Op::Delete(i) => {
                let k = &pool[i];
                match (sut.delete(k.as_str()), model.remove(k)) {
                    (Ok((kk, vv)), Some(mv)) => {
                        prop_assert_eq!(&kk, k);
                        prop_assert_eq!(vv, mv);
                    }
                    (Err(MapError::NotFound), None) => {}
                    (got, want) => {
                        prop_assert!(false, "delete {:?}: got {:?}, model {:?}", k, got, want)
                    }
                }
                prop_assert!(sut.get(k.as_str()).is_err(), "deleted key still reachable");
            }
            Op::Get(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.get(k.as_str()).ok(), model.get(k));
                prop_assert_eq!(sut.contains_key(k.as_str()), model.contains_key(k));
            }
            Op::Mutate(i, d) => {
                let k = &pool[i];
                match (sut.get_mut(k.as_str()), model.get_mut(k)) {
                    (Ok(sv), Some(mv)) => {
                        *sv = sv.wrapping_add(d);
                        *mv = mv.wrapping_add(d);
                    }
                    (Err(MapError::NotFound), None) => {}
                    (got, want) => {
                        prop_assert!(false, "get_mut {:?}: got {:?}, model {:?}", k, got, want)
                    }
                }
            }
            Op::Iterate => {
                let mut visited = Vec::new();
                sut.for_each(|k, v| visited.push((k.clone(), *v)));
                let unique: BTreeSet<_> = visited.iter().map(|(k, _)| k.clone()).collect();
                prop_assert_eq!(unique.len(), visited.len(), "a key was visited twice");
                let mut expected: Vec<_> = model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                visited.sort();
                expected.sort();
                prop_assert_eq!(visited, expected);
                prop_assert_eq!(sut.iter().len(), model.len());
            }
        }

        if let Err(violation) = sut.check_invariants() {
            prop_assert!(false, "{}", violation);
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert!(sut.capacity() >= capacity, "capacity shrank");
        capacity = sut.capacity();
    }
    Ok(())
}

// Every key on one home slot: a single run, maximal gap repair.
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
    }
}

// Real hash folded onto a few values near u64::MAX: several interleaved runs,
// homes spread over the whole table once it is small, and chains that wrap
// past the last slot.
#[derive(Clone, Default)]
struct NarrowBuildHasher;
#[derive(Default)]
struct NarrowHasher(DefaultHasher);
impl BuildHasher for NarrowBuildHasher {
    type Hasher = NarrowHasher;
    fn build_hasher(&self) -> Self::Hasher {
        NarrowHasher::default()
    }
}
impl Hasher for NarrowHasher {
    fn write(&mut self, bytes: &[u8]) {
        self.0.write(bytes);
    }
    fn finish(&self) -> u64 {
        u64::MAX - self.0.finish() % 5
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario(), capacity in 0usize..=8) {
        run_state_machine(OpenAddressingMap::with_capacity(capacity), &pool, ops)?;
    }

    // Same invariants under worst-case collisions.
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario(), capacity in 0usize..=8) {
        run_state_machine(
            OpenAddressingMap::with_capacity_and_hasher(capacity, ConstBuildHasher),
            &pool,
            ops,
        )?;
    }

    // Same invariants with clustered homes and wraparound.
    #[test]
    fn prop_state_machine_with_wrapping_clusters((pool, ops) in arb_scenario(), capacity in 0usize..=8) {
        run_state_machine(
            OpenAddressingMap::with_capacity_and_hasher(capacity, NarrowBuildHasher),
            &pool,
            ops,
        )?;
    }
}
