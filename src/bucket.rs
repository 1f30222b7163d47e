//! Bucket lists threaded through the table's slot arena.
//!
//! Every installed resource lives in one `Node` of the arena and is linked
//! into exactly one `Bucket`. A bucket only stores its head, tail and length,
//! so a whole bucket can be detached in O(1) (`take`) and its nodes handed
//! back one at a time (`pop_front`) while they are re-linked elsewhere.

use slotmap::{DefaultKey, SlotMap};

pub(crate) type Slots<T> = SlotMap<DefaultKey, Node<T>>;

#[derive(Debug)]
pub(crate) struct Node<T> {
    pub(crate) res: T,
    // index of the bucket this node is linked into
    bucket: usize,
    prev: Option<DefaultKey>,
    next: Option<DefaultKey>,
}

impl<T> Node<T> {
    pub(crate) fn new(res: T) -> Self {
        Node {
            res,
            bucket: 0,
            prev: None,
            next: None,
        }
    }

    #[inline]
    pub(crate) fn next(&self) -> Option<DefaultKey> {
        self.next
    }

    /// Bucket the node was last linked into by `push_back`.
    #[inline]
    pub(crate) fn bucket(&self) -> usize {
        self.bucket
    }
}

#[derive(Debug, Default)]
pub(crate) struct Bucket {
    head: Option<DefaultKey>,
    tail: Option<DefaultKey>,
    len: usize,
}

impl Bucket {
    pub(crate) const fn new() -> Self {
        Bucket {
            head: None,
            tail: None,
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn first(&self) -> Option<DefaultKey> {
        self.head
    }

    /// Link `key` (currently unlinked) at the tail of this bucket, which sits
    /// at `index` in the table's array.
    pub(crate) fn push_back<T>(&mut self, slots: &mut Slots<T>, key: DefaultKey, index: usize) {
        let node = &mut slots[key];
        node.bucket = index;
        node.prev = self.tail;
        node.next = None;
        match self.tail {
            Some(tail) => slots[tail].next = Some(key),
            None => self.head = Some(key),
        }
        self.tail = Some(key);
        self.len += 1;
    }

    /// Unlink `key`, which must currently be linked into this bucket.
    pub(crate) fn unlink<T>(&mut self, slots: &mut Slots<T>, key: DefaultKey) {
        let node = &mut slots[key];
        let (prev, next) = (node.prev.take(), node.next.take());
        match prev {
            Some(prev) => slots[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => slots[next].prev = prev,
            None => self.tail = prev,
        }
        self.len -= 1;
    }

    pub(crate) fn pop_front<T>(&mut self, slots: &mut Slots<T>) -> Option<DefaultKey> {
        let head = self.head?;
        self.unlink(slots, head);
        Some(head)
    }

    /// Detach the whole list, leaving this bucket empty.
    pub(crate) fn take(&mut self) -> Bucket {
        core::mem::take(self)
    }

    pub(crate) fn keys<'a, T>(&self, slots: &'a Slots<T>) -> Keys<'a, T> {
        Keys {
            slots,
            next: self.head,
        }
    }
}

/// Forward walk over the keys of one bucket.
pub(crate) struct Keys<'a, T> {
    slots: &'a Slots<T>,
    next: Option<DefaultKey>,
}

impl<T> Iterator for Keys<'_, T> {
    type Item = DefaultKey;

    fn next(&mut self) -> Option<DefaultKey> {
        let key = self.next?;
        self.next = self.slots.get(key).and_then(Node::next);
        Some(key)
    }
}
