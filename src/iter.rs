//! Whole-table traversal.
//!
//! `Cursor` is a plain position (bucket index plus the next entry to hand
//! out) that borrows nothing, so callers can remove the entry it just
//! returned before asking for the next one. The table must not gain entries
//! or split buckets while a cursor is in use; resuming a cursor after an
//! `add` panics.

use crate::res_table::{Handle, Resource, ResourceTable};
use slotmap::DefaultKey;

#[derive(Copy, Clone, Debug)]
pub struct Cursor {
    bucket: usize,
    next: Option<DefaultKey>,
    epoch: u64,
}

impl Cursor {
    pub(crate) fn new<T: Resource>(table: &ResourceTable<T>) -> Self {
        Cursor {
            bucket: 0,
            next: table.buckets.first().and_then(|b| b.first()),
            epoch: table.epoch,
        }
    }

    /// Advance to the next installed resource.
    ///
    /// # Panics
    /// If resources were added to `table` since this cursor was created, or
    /// if the entry the cursor was about to return has been removed.
    pub fn next<T: Resource>(&mut self, table: &ResourceTable<T>) -> Option<Handle> {
        assert_eq!(
            self.epoch, table.epoch,
            "resource table gained entries during traversal"
        );
        loop {
            if let Some(key) = self.next {
                let Some(node) = table.slots.get(key) else {
                    panic!("cursor's next resource was removed during traversal");
                };
                self.next = node.next();
                return Some(Handle(key));
            }
            if self.bucket >= table.buckets.len() {
                return None;
            }
            self.bucket += 1;
            self.next = table.buckets.get(self.bucket).and_then(|b| b.first());
        }
    }
}

/// Iterator over the resources of a table, in bucket order.
pub struct Iter<'a, T> {
    table: &'a ResourceTable<T>,
    cursor: Cursor,
    remaining: usize,
}

impl<'a, T: Resource> Iter<'a, T> {
    pub(crate) fn new(table: &'a ResourceTable<T>) -> Self {
        Iter {
            table,
            cursor: Cursor::new(table),
            remaining: table.len(),
        }
    }
}

impl<'a, T: Resource> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let table = self.table;
        let handle = self.cursor.next(table)?;
        self.remaining -= 1;
        table.slots.get(handle.0).map(|node| &node.res)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: Resource> ExactSizeIterator for Iter<'_, T> {}

#[cfg(test)]
mod tests {
    use crate::id::{Identifier, TableIndex, U32Id};
    use crate::res_table::{Resource, ResourceTable};

    struct Rec(U32Id);

    impl Resource for Rec {
        type Id = U32Id;
        fn id(&self) -> &U32Id {
            &self.0
        }
    }

    fn table(n: u32) -> ResourceTable<Rec> {
        let mut t = ResourceTable::new();
        for i in 0..n {
            assert!(t.add(Rec(U32Id::new(i))).is_ok());
        }
        t
    }

    #[test]
    fn empty_table_yields_nothing() {
        let t = table(0);
        let mut c = t.cursor();
        assert!(c.next(&t).is_none());
        assert!(c.next(&t).is_none());
        assert_eq!(t.iter().count(), 0);
    }

    #[test]
    fn iter_visits_each_once() {
        let t = table(500);
        let mut ids: Vec<u32> = t.iter().map(|r| r.0.get()).collect();
        assert_eq!(t.iter().len(), 500);
        ids.sort_unstable();
        assert_eq!(ids, (0..500).collect::<Vec<_>>());
    }

    #[test]
    fn cursor_survives_removing_current() {
        let mut t = table(200);
        let mut c = t.cursor();
        let mut seen = 0;
        while let Some(h) = c.next(&t) {
            seen += 1;
            assert!(t.remove_handle(h).is_some());
        }
        assert_eq!(seen, 200);
        assert!(t.is_empty());
        t.verify();
    }

    #[test]
    #[should_panic(expected = "gained entries during traversal")]
    fn cursor_rejects_growth_mid_traversal() {
        let mut t = table(50);
        let mut c = t.cursor();
        let _ = c.next(&t);
        let _ = t.add(Rec(U32Id::new(1000)));
        let _ = c.next(&t);
    }

    struct Flat(u32);

    impl Identifier for Flat {
        const MIN_INDEX_BIT_WIDTH: u32 = 2;
        const MAX_INDEX_BIT_WIDTH: u32 = 2;
        fn hash_index(&self) -> TableIndex {
            0
        }
        fn id_eq(&self, other: &Self) -> bool {
            self.0 == other.0
        }
    }

    struct FlatRec(Flat);

    impl Resource for FlatRec {
        type Id = Flat;
        fn id(&self) -> &Flat {
            &self.0
        }
    }

    #[test]
    #[should_panic(expected = "was removed during traversal")]
    fn cursor_rejects_removal_of_prefetched_entry() {
        let mut t = ResourceTable::new();
        for i in 0..3 {
            assert!(t.add(FlatRec(Flat(i))).is_ok());
        }
        let mut c = t.cursor();
        let first = c.next(&t).unwrap();
        assert_eq!(t.get(first).map(|r| r.0 .0), Some(0));
        // Entry 1 is the cursor's prefetched successor.
        assert!(t.remove(&Flat(1)).is_some());
        let _ = c.next(&t);
    }
}
