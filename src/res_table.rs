//! ResourceTable: incrementally growing index of resources by identifier.

use crate::bucket::{Bucket, Node, Slots};
use crate::error::{AddError, Error};
use crate::id::{Identifier, TableIndex};
use crate::iter::{Cursor, Iter};
use core::fmt;
use slotmap::{DefaultKey, SlotMap};

/// A value indexed by the identifier it embeds.
///
/// The identifier of an installed resource must not change while it is in
/// a table. A resource whose identifier changed is no longer reachable by
/// `lookup`/`remove`, and `verify` reports it.
pub trait Resource {
    type Id: Identifier;

    fn id(&self) -> &Self::Id;
}

/// Stable reference to an installed resource. A handle never resolves to a
/// resource installed after its own was removed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(pub(crate) DefaultKey);

/// Returned by a `traverse` visitor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Visit {
    Keep,
    /// Unlink and drop the resource just visited.
    Remove,
}

pub struct ResourceTable<T> {
    pub(crate) buckets: Vec<Bucket>,
    pub(crate) slots: Slots<T>,
    next_split: usize,
    low_mask: usize,
    high_mask: usize,
    // bucket slots provisioned for the current growth generation
    reserved: usize,
    splits: u64,
    doublings: u32,
    // bumped by every add and split; see `Cursor`
    pub(crate) epoch: u64,
}

impl<T: Resource> ResourceTable<T> {
    const MIN_WIDTH: u32 = {
        let min = <T::Id as Identifier>::MIN_INDEX_BIT_WIDTH;
        let max = <T::Id as Identifier>::MAX_INDEX_BIT_WIDTH;
        assert!(min <= max, "identifier minimum index width exceeds its maximum");
        assert!(
            min < TableIndex::BITS - 1,
            "identifier minimum index width too large for this target"
        );
        min
    };

    const MAX_BUCKETS: usize = {
        let max = <T::Id as Identifier>::MAX_INDEX_BIT_WIDTH;
        if max >= TableIndex::BITS - 1 {
            1 << (TableIndex::BITS - 1)
        } else {
            1 << max
        }
    };

    pub fn new() -> Self {
        let initial = 1usize << Self::MIN_WIDTH;
        let mut buckets = Vec::with_capacity(initial);
        buckets.resize_with(initial, Bucket::new);
        Self::with_buckets(buckets)
    }

    /// Like `new`, but reports a failed bucket array allocation instead of
    /// aborting.
    pub fn try_new() -> Result<Self, Error> {
        let initial = 1usize << Self::MIN_WIDTH;
        let mut buckets = Vec::new();
        buckets
            .try_reserve_exact(initial)
            .map_err(|_| Error::OutOfMemory)?;
        buckets.resize_with(initial, Bucket::new);
        Ok(Self::with_buckets(buckets))
    }

    fn with_buckets(buckets: Vec<Bucket>) -> Self {
        let low_mask = buckets.len() - 1;
        Self {
            reserved: buckets.len(),
            buckets,
            slots: SlotMap::with_key(),
            next_split: 0,
            low_mask,
            high_mask: (low_mask << 1) | 1,
            splits: 0,
            doublings: 0,
            epoch: 0,
        }
    }

    /// Number of installed resources.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Buckets split since construction. Each split adds one bucket.
    pub fn splits(&self) -> u64 {
        self.splits
    }

    /// Times the bucket array was grown to hold a new growth generation.
    pub fn doublings(&self) -> u32 {
        self.doublings
    }

    pub fn low_mask(&self) -> usize {
        self.low_mask
    }

    pub fn high_mask(&self) -> usize {
        self.high_mask
    }

    pub fn next_split_index(&self) -> usize {
        self.next_split
    }

    /// Bucket that owns `id` under the current masks and split cursor.
    #[inline]
    fn bucket_index(&self, id: &T::Id) -> usize {
        let h = id.hash_index();
        let h0 = h & self.low_mask;
        if h0 >= self.next_split {
            h0
        } else {
            h & self.high_mask
        }
    }

    fn find_in(&self, index: usize, id: &T::Id) -> Option<DefaultKey> {
        self.buckets[index]
            .keys(&self.slots)
            .find(|&k| self.slots[k].res.id().id_eq(id))
    }

    /// Install `res`. Fails, handing `res` back, if an equal identifier is
    /// already installed.
    pub fn add(&mut self, res: T) -> Result<Handle, AddError<T>> {
        if self.slots.len() > self.buckets.len() {
            self.split_bucket();
        }
        let index = self.bucket_index(res.id());
        if self.find_in(index, res.id()).is_some() {
            return Err(AddError::DuplicateIdentifier(res));
        }
        let key = self.slots.insert(Node::new(res));
        self.buckets[index].push_back(&mut self.slots, key, index);
        self.epoch += 1;
        Ok(Handle(key))
    }

    pub fn remove(&mut self, id: &T::Id) -> Option<T> {
        let index = self.bucket_index(id);
        let key = self.find_in(index, id)?;
        self.unlink(index, key)
    }

    /// Remove the resource behind `handle` without scanning its bucket.
    ///
    /// The resource is unlinked from the bucket it was installed into, even
    /// if its identifier has since been rewritten through `get_mut`.
    pub fn remove_handle(&mut self, handle: Handle) -> Option<T> {
        let index = self.slots.get(handle.0)?.bucket();
        self.unlink(index, handle.0)
    }

    fn unlink(&mut self, index: usize, key: DefaultKey) -> Option<T> {
        self.buckets[index].unlink(&mut self.slots, key);
        self.slots.remove(key).map(|node| node.res)
    }

    pub fn lookup(&self, id: &T::Id) -> Option<&T> {
        let key = self.find_in(self.bucket_index(id), id)?;
        self.slots.get(key).map(|node| &node.res)
    }

    pub fn lookup_mut(&mut self, id: &T::Id) -> Option<&mut T> {
        let key = self.find_in(self.bucket_index(id), id)?;
        self.slots.get_mut(key).map(|node| &mut node.res)
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.find_in(self.bucket_index(id), id).is_some()
    }

    /// Handle of the resource installed under `id`.
    pub fn find(&self, id: &T::Id) -> Option<Handle> {
        self.find_in(self.bucket_index(id), id).map(Handle)
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots.get(handle.0).map(|node| &node.res)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots.get_mut(handle.0).map(|node| &mut node.res)
    }

    /// Split the bucket at the split cursor.
    ///
    /// When every bucket of the current generation has been split the masks
    /// move up one bit and the cursor restarts at 0. The array is grown once
    /// per generation, to twice its length; if that allocation fails, or the
    /// identifier's maximum width is reached, nothing changes.
    fn split_bucket(&mut self) {
        if self.buckets.len() >= Self::MAX_BUCKETS {
            return;
        }
        let rollover = self.next_split > self.low_mask;
        let (low_mask, high_mask) = if rollover {
            (self.high_mask, (self.high_mask << 1) | 1)
        } else {
            (self.low_mask, self.high_mask)
        };

        let target = high_mask + 1;
        if self.reserved < target {
            let additional = target - self.buckets.len();
            if let Err(err) = self.buckets.try_reserve_exact(additional) {
                tracing::warn!(
                    buckets = self.buckets.len(),
                    requested = target,
                    error = %err,
                    "bucket array growth failed; split deferred"
                );
                return;
            }
            self.reserved = target;
            self.doublings += 1;
            tracing::debug!(buckets = target, low_mask, "bucket array doubled");
        }

        if rollover {
            self.low_mask = low_mask;
            self.high_mask = high_mask;
            self.next_split = 0;
        }

        let mut moving = self.buckets[self.next_split].take();
        self.next_split += 1;
        self.buckets.push(Bucket::new());
        while let Some(key) = moving.pop_front(&mut self.slots) {
            let index = self.bucket_index(self.slots[key].res.id());
            self.buckets[index].push_back(&mut self.slots, key, index);
        }
        self.splits += 1;
        self.epoch += 1;
        tracing::trace!(
            split = self.next_split - 1,
            buckets = self.buckets.len(),
            "bucket split"
        );
    }

    /// Visit every installed resource, bucket by bucket.
    ///
    /// The position of the next resource is captured before `visit` runs, so
    /// returning `Visit::Remove` for the current one is always safe.
    pub fn traverse<F>(&mut self, mut visit: F)
    where
        F: FnMut(&mut T) -> Visit,
    {
        for index in 0..self.buckets.len() {
            let mut next = self.buckets[index].first();
            while let Some(key) = next {
                let node = &mut self.slots[key];
                next = node.next();
                if visit(&mut node.res) == Visit::Remove {
                    let _ = self.unlink(index, key);
                }
            }
        }
    }

    pub fn traverse_const<F>(&self, mut visit: F)
    where
        F: FnMut(&T),
    {
        for res in self.iter() {
            visit(res);
        }
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// Resumable position over this table. Unlike `iter`, the cursor does not
    /// borrow the table between steps.
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self)
    }

    /// Check the addressing invariants; panics on the first violation.
    pub fn verify(&self) {
        assert!(self.next_split <= self.low_mask + 1, "split cursor past generation");
        assert_eq!(self.high_mask, (self.low_mask << 1) | 1, "masks out of step");
        assert_eq!(
            self.buckets.len(),
            self.low_mask + 1 + self.next_split,
            "bucket count does not match masks"
        );
        let mut total = 0usize;
        for (index, bucket) in self.buckets.iter().enumerate() {
            let mut count = 0usize;
            for key in bucket.keys(&self.slots) {
                let id = self.slots[key].res.id();
                let expected = self.bucket_index(id);
                assert_eq!(
                    expected, index,
                    "resource in bucket {index} belongs in bucket {expected}"
                );
                let duplicates = bucket
                    .keys(&self.slots)
                    .filter(|&k| k != key && self.slots[k].res.id().id_eq(id))
                    .count();
                assert_eq!(duplicates, 0, "duplicate identifier in bucket {index}");
                count += 1;
            }
            assert_eq!(count, bucket.len(), "bucket {index} length is stale");
            total += count;
        }
        assert_eq!(total, self.slots.len(), "installed count mismatch");
    }

    /// Occupancy statistics over all buckets.
    pub fn stats(&self) -> TableStats {
        let buckets = self.buckets.len();
        let (mut sum, mut sum_sq, mut max) = (0.0f64, 0.0f64, 0usize);
        for bucket in &self.buckets {
            let n = bucket.len();
            sum += n as f64;
            sum_sq += (n * n) as f64;
            max = max.max(n);
        }
        let mean = sum / buckets as f64;
        TableStats {
            buckets,
            installed: self.slots.len(),
            counted: sum as usize,
            mean,
            std_dev: (sum_sq / buckets as f64 - mean * mean).max(0.0).sqrt(),
            max,
        }
    }

    /// Log table diagnostics. Level 1 adds occupancy statistics, level 3 also
    /// logs every resource.
    pub fn show(&self, level: u32)
    where
        T: fmt::Debug,
    {
        tracing::info!(
            buckets = self.buckets.len(),
            installed = self.slots.len(),
            "resource table"
        );
        if level >= 1 {
            let stats = self.stats();
            tracing::info!(
                mean = stats.mean,
                std_dev = stats.std_dev,
                max = stats.max,
                "entries per bucket"
            );
            if stats.counted != stats.installed {
                tracing::warn!(
                    counted = stats.counted,
                    installed = stats.installed,
                    "installed count does not match bucket contents"
                );
            }
        }
        if level >= 3 {
            for res in self.iter() {
                tracing::info!(resource = ?res, "installed");
            }
        }
    }
}

impl<T: Resource> Default for ResourceTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for ResourceTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceTable")
            .field("buckets", &self.buckets.len())
            .field("installed", &self.slots.len())
            .field("next_split", &self.next_split)
            .field("low_mask", &self.low_mask)
            .finish()
    }
}

impl<'a, T: Resource> IntoIterator for &'a ResourceTable<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

/// Snapshot produced by `ResourceTable::stats`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TableStats {
    pub buckets: usize,
    pub installed: usize,
    /// Sum of bucket lengths; equals `installed` in a consistent table.
    pub counted: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub max: usize,
}

impl fmt::Display for TableStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} buckets, {} resources installed; entries per bucket: mean = {:.3} std dev = {:.3} max = {}",
            self.buckets, self.installed, self.mean, self.std_dev, self.max
        )
    }
}
