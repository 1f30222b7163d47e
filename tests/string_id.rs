// StringId hashing and comparison, alone and as a table key.
use res_table::{string_hash, Identifier, Resource, ResourceTable, StringId};

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

#[test]
fn empty_string_hash_is_stable() {
    let a = StringId::borrowed("");
    let first = a.hash_index();
    for _ in 0..10 {
        assert_eq!(a.hash_index(), first);
    }
    assert_eq!(StringId::copied("").hash_index(), first);
    assert!(a.id_eq(&StringId::copied("")));
}

// Test: distinct names spread roughly evenly over 256 buckets.
// 25,600 names give a mean of 100 per bucket.
#[test]
fn distribution_is_roughly_uniform() {
    let mut counts = [0usize; 256];
    for x in lcg(1).take(25_600) {
        counts[string_hash(key(x).as_bytes()) & 0xff] += 1;
    }
    let min = *counts.iter().min().unwrap();
    let max = *counts.iter().max().unwrap();
    assert!(min > 33, "min bucket = {min}");
    assert!(max < 300, "max bucket = {max}");
}

#[test]
fn null_identifiers_never_match() {
    let a = StringId::null();
    let b = StringId::null();
    assert!(!a.id_eq(&b));
    assert!(!a.id_eq(&a));
}

#[derive(Debug)]
struct Named<'a> {
    id: StringId<'a>,
    serial: usize,
}

impl<'a> Resource for Named<'a> {
    type Id = StringId<'a>;
    fn id(&self) -> &StringId<'a> {
        &self.id
    }
}

// Test: borrowed names index resources; the names outlive the table.
#[test]
fn borrowed_names_as_table_keys() {
    let names: Vec<String> = lcg(42).take(2000).map(key).collect();
    let mut t = ResourceTable::new();
    for (serial, name) in names.iter().enumerate() {
        t.add(Named {
            id: StringId::borrowed(name),
            serial,
        })
        .unwrap();
    }
    assert!(t.add(Named { id: StringId::copied(&names[7]), serial: 0 }).is_err());
    t.verify();
    for (serial, name) in names.iter().enumerate() {
        let found = t.lookup(&StringId::borrowed(name)).expect("name installed");
        assert_eq!(found.serial, serial);
        assert_eq!(found.id.resource_name(), Some(name.as_str()));
    }
    assert!(t.lookup(&StringId::borrowed("missing")).is_none());
    assert!(t.lookup(&StringId::null()).is_none());
}

// Test: a null-keyed resource can be installed repeatedly but is never
// found again, since its identifier matches nothing.
#[test]
fn null_keyed_resources_are_unreachable() {
    let mut t = ResourceTable::new();
    t.add(Named { id: StringId::null(), serial: 1 }).unwrap();
    t.add(Named { id: StringId::null(), serial: 2 }).unwrap();
    assert_eq!(t.len(), 2);
    assert!(t.lookup(&StringId::null()).is_none());
    assert!(t.remove(&StringId::null()).is_none());
    t.verify();
}
