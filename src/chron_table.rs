//! ChronIdTable: a resource table that assigns identifiers itself, in
//! allocation order.

use crate::error::{ChronAddError, Error};
use crate::id::ChronId;
use crate::res_table::{Handle, Resource, ResourceTable, Visit};
use core::ops::Deref;

/// A resource keyed by a table-assigned `ChronId`.
pub trait ChronResource: Resource<Id = ChronId> {
    fn id_mut(&mut self) -> &mut ChronId;
}

/// Resource table whose `add` assigns each resource the next value of a
/// counter running over `1..=id_limit`.
///
/// After the counter wraps, values still held by live resources are skipped,
/// so assigned identifiers stay unique. Read-only table operations are
/// reachable through `Deref`.
#[derive(Debug)]
pub struct ChronIdTable<T> {
    table: ResourceTable<T>,
    alloc_id: u32,
    id_limit: u32,
}

impl<T: ChronResource> ChronIdTable<T> {
    pub fn new() -> Self {
        Self::with_id_limit(u32::MAX)
    }

    /// Table handing out identifiers from `1..=id_limit`.
    pub fn with_id_limit(id_limit: u32) -> Self {
        Self::from_table(ResourceTable::new(), id_limit)
    }

    pub fn try_new() -> Result<Self, Error> {
        Ok(Self::from_table(ResourceTable::try_new()?, u32::MAX))
    }

    fn from_table(table: ResourceTable<T>, id_limit: u32) -> Self {
        ChronIdTable {
            table,
            alloc_id: 1,
            id_limit,
        }
    }

    /// Identifier the next `add` tries first.
    pub fn next_id(&self) -> u32 {
        self.alloc_id
    }

    pub fn id_limit(&self) -> u32 {
        self.id_limit
    }

    /// Install `item` under a freshly assigned identifier, overwriting
    /// whatever identifier it carried.
    pub fn add(&mut self, mut item: T) -> Result<ChronId, ChronAddError<T>> {
        // every id in range is live; the retry loop below would never end
        if self.table.len() as u64 >= u64::from(self.id_limit) {
            return Err(ChronAddError {
                kind: Error::IdSpaceExhausted,
                resource: item,
            });
        }
        loop {
            let id = self.alloc_id;
            self.alloc_id = if id >= self.id_limit {
                tracing::trace!(limit = self.id_limit, "chronological id counter wrapped");
                1
            } else {
                id + 1
            };
            item.id_mut().assign(id);
            match self.table.add(item) {
                Ok(_) => return Ok(ChronId::new(id)),
                Err(err) => {
                    tracing::trace!(id, "chronological id still live; retrying");
                    item = err.into_inner();
                }
            }
        }
    }

    pub fn remove(&mut self, id: &ChronId) -> Option<T> {
        self.table.remove(id)
    }

    pub fn remove_handle(&mut self, handle: Handle) -> Option<T> {
        self.table.remove_handle(handle)
    }

    pub fn lookup_mut(&mut self, id: &ChronId) -> Option<&mut T> {
        self.table.lookup_mut(id)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.table.get_mut(handle)
    }

    pub fn traverse<F>(&mut self, visit: F)
    where
        F: FnMut(&mut T) -> Visit,
    {
        self.table.traverse(visit)
    }

    pub fn into_inner(self) -> ResourceTable<T> {
        self.table
    }
}

impl<T: ChronResource> Default for ChronIdTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for ChronIdTable<T> {
    type Target = ResourceTable<T>;

    fn deref(&self) -> &ResourceTable<T> {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Chan {
        id: ChronId,
        name: &'static str,
    }

    impl Resource for Chan {
        type Id = ChronId;
        fn id(&self) -> &ChronId {
            &self.id
        }
    }

    impl ChronResource for Chan {
        fn id_mut(&mut self) -> &mut ChronId {
            &mut self.id
        }
    }

    #[test]
    fn first_id_is_one() {
        let mut t = ChronIdTable::new();
        let id = t.add(Chan::default()).unwrap();
        assert_eq!(id.get(), 1);
        assert_eq!(t.next_id(), 2);
        assert_eq!(t.lookup(&id).unwrap().id, id);
    }

    #[test]
    fn caller_supplied_id_is_ignored() {
        let mut t = ChronIdTable::new();
        let id = t
            .add(Chan {
                id: ChronId::new(500),
                name: "preset",
            })
            .unwrap();
        assert_eq!(id.get(), 1);
        assert!(t.lookup(&ChronId::new(500)).is_none());
        assert_eq!(t.lookup(&id).unwrap().name, "preset");
    }

    #[test]
    fn full_range_is_reported() {
        let mut t = ChronIdTable::with_id_limit(2);
        t.add(Chan::default()).unwrap();
        t.add(Chan::default()).unwrap();
        let err = t
            .add(Chan {
                id: ChronId::default(),
                name: "late",
            })
            .unwrap_err();
        assert_eq!(err.kind, Error::IdSpaceExhausted);
        assert_eq!(err.resource.name, "late");
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn zero_limit_never_assigns() {
        let mut t: ChronIdTable<Chan> = ChronIdTable::with_id_limit(0);
        assert!(t.add(Chan::default()).is_err());
        assert!(t.is_empty());
    }
}
