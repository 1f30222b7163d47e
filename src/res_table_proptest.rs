#![cfg(test)]

// Property tests for ResourceTable kept inside the crate so every step can
// also check the masks and split cursor directly.

use crate::error::AddError;
use crate::id::{Identifier, IntId, TableIndex};
use crate::res_table::{Handle, Resource, ResourceTable, Visit};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug)]
struct Entry<I> {
    id: I,
    value: i32,
}

impl<I: Identifier> Resource for Entry<I> {
    type Id = I;
    fn id(&self) -> &I {
        &self.id
    }
}

// Constant hash: every resource lands in bucket 0 whatever the masks say.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Collide(u32);

impl Identifier for Collide {
    const MIN_INDEX_BIT_WIDTH: u32 = 1;
    const MAX_INDEX_BIT_WIDTH: u32 = TableIndex::BITS;
    fn hash_index(&self) -> TableIndex {
        0
    }
    fn id_eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

// Growth stops at 8 buckets.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Capped(u32);

impl Identifier for Capped {
    const MIN_INDEX_BIT_WIDTH: u32 = 1;
    const MAX_INDEX_BIT_WIDTH: u32 = 3;
    fn hash_index(&self) -> TableIndex {
        crate::id::integer_hash(1, 32, u64::from(self.0))
    }
    fn id_eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

#[derive(Clone, Debug)]
enum Op {
    Add(u32, i32),
    Remove(u32),
    RemoveHandle(u32),
    Lookup(u32),
    Mutate(u32, i32),
    // drop every resource whose id is a multiple of the argument
    TraverseRemove(u32),
    Iterate,
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let key = 0u32..96;
    let op = prop_oneof![
        4 => (key.clone(), any::<i32>()).prop_map(|(k, v)| Op::Add(k, v)),
        1 => key.clone().prop_map(Op::Remove),
        1 => key.clone().prop_map(Op::RemoveHandle),
        2 => key.clone().prop_map(Op::Lookup),
        1 => (key.clone(), any::<i32>()).prop_map(|(k, d)| Op::Mutate(k, d)),
        1 => (2u32..9).prop_map(Op::TraverseRemove),
        1 => Just(Op::Iterate),
    ];
    proptest::collection::vec(op, 1..300)
}

// State-machine equivalence against std::collections::HashMap.
// After every op: `verify` holds, len matches the model, masks stay in
// step, the bucket count never decreases and stale handles never resolve.
fn run<I, F>(make: F, ops: Vec<Op>) -> Result<(), TestCaseError>
where
    I: Identifier + Copy + core::fmt::Debug,
    F: Fn(u32) -> I,
{
    let mut sut: ResourceTable<Entry<I>> = ResourceTable::new();
    let mut model: HashMap<u32, i32> = HashMap::new();
    let mut live: HashMap<u32, Handle> = HashMap::new();
    let mut stale: Vec<Handle> = Vec::new();
    let mut buckets = sut.bucket_count();

    for op in ops {
        match op {
            Op::Add(k, v) => {
                let already = model.contains_key(&k);
                let before = sut.len();
                match sut.add(Entry { id: make(k), value: v }) {
                    Ok(h) => {
                        prop_assert!(!already, "add must fail on duplicate");
                        prop_assert_eq!(sut.len(), before + 1);
                        live.insert(k, h);
                        model.insert(k, v);
                    }
                    Err(AddError::DuplicateIdentifier(back)) => {
                        prop_assert!(already, "duplicate only when id installed");
                        prop_assert_eq!(back.value, v);
                        prop_assert_eq!(sut.len(), before);
                    }
                }
            }
            Op::Remove(k) => {
                let removed = sut.remove(&make(k));
                prop_assert_eq!(removed.map(|e| e.value), model.remove(&k));
                if let Some(h) = live.remove(&k) {
                    stale.push(h);
                }
                prop_assert!(sut.lookup(&make(k)).is_none());
            }
            Op::RemoveHandle(k) => {
                if let Some(h) = live.remove(&k) {
                    let e = sut.remove_handle(h).expect("live handle removes");
                    prop_assert_eq!(Some(e.value), model.remove(&k));
                    stale.push(h);
                } else {
                    prop_assert!(!sut.contains(&make(k)));
                }
            }
            Op::Lookup(k) => {
                let got = sut.lookup(&make(k)).map(|e| e.value);
                prop_assert_eq!(got, model.get(&k).copied());
                if let Some(&h) = live.get(&k) {
                    prop_assert_eq!(sut.find(&make(k)), Some(h));
                }
            }
            Op::Mutate(k, d) => {
                if let Some(e) = sut.lookup_mut(&make(k)) {
                    e.value = e.value.wrapping_add(d);
                    let mv = model.get_mut(&k).expect("model has mutated id");
                    *mv = mv.wrapping_add(d);
                } else {
                    prop_assert!(!model.contains_key(&k));
                }
            }
            Op::TraverseRemove(m) => {
                let targets: BTreeSet<u32> =
                    model.keys().copied().filter(|k| k % m == 0).collect();
                let mut visited = 0usize;
                sut.traverse(|e| {
                    visited += 1;
                    if targets.iter().any(|&k| make(k).id_eq(&e.id)) {
                        Visit::Remove
                    } else {
                        Visit::Keep
                    }
                });
                prop_assert_eq!(visited, model.len());
                for k in targets {
                    model.remove(&k);
                    if let Some(h) = live.remove(&k) {
                        stale.push(h);
                    }
                }
            }
            Op::Iterate => {
                let mut seen = 0usize;
                sut.traverse_const(|e| {
                    let _ = e.value;
                    seen += 1;
                });
                prop_assert_eq!(seen, model.len());
                prop_assert_eq!(sut.iter().count(), model.len());
            }
        }

        sut.verify();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert_eq!(sut.high_mask(), sut.low_mask() * 2 + 1);
        prop_assert_eq!(
            sut.bucket_count(),
            sut.low_mask() + 1 + sut.next_split_index()
        );
        prop_assert!(sut.bucket_count() >= buckets, "table must never shrink");
        buckets = sut.bucket_count();
        for &h in &stale {
            prop_assert!(sut.get(h).is_none());
        }
    }

    for (k, v) in &model {
        prop_assert_eq!(sut.lookup(&make(*k)).map(|e| e.value), Some(*v));
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn prop_state_machine(ops in arb_ops()) {
        run(IntId::<u32, 1, 32>::new, ops)?;
    }

    #[test]
    fn prop_state_machine_with_collisions(ops in arb_ops()) {
        run(Collide, ops)?;
    }

    #[test]
    fn prop_state_machine_with_capped_growth(ops in arb_ops()) {
        run(Capped, ops)?;
    }
}

#[test]
fn capped_table_stops_at_max_width() {
    let mut t: ResourceTable<Entry<Capped>> = ResourceTable::new();
    for k in 0..200 {
        assert!(t.add(Entry { id: Capped(k), value: 0 }).is_ok());
    }
    assert_eq!(t.bucket_count(), 8);
    assert_eq!(t.len(), 200);
    t.verify();
    for k in 0..200 {
        assert!(t.contains(&Capped(k)));
    }
}
