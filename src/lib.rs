//! res-table: a single-threaded resource index keyed by self-describing
//! identifiers, growing one bucket at a time.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: an embeddable index for live objects (connections, channels,
//!   allocated handles) found by id in expected O(1) without knowing the
//!   final table size up front and without ever paying for a full rehash.
//! - Layers:
//!   - `Identifier`: capability trait for ids. An id compares itself with
//!     another id of its kind, produces a raw table index, and fixes the
//!     bucket-count range through two associated constants. Integer
//!     (`IntId`), chronological (`ChronId`) and string (`StringId`) ids are
//!     provided.
//!   - `ResourceTable<T>`: the linear-hashing engine. Resources embed their
//!     id (`Resource::id`) and are routed with a dual mask and a split
//!     cursor.
//!   - `Cursor`/`Iter`: resumable traversal in bucket order.
//!   - `ChronIdTable<T>`: assigns ids from a wrapping counter on `add`,
//!     skipping ids still held by live resources.
//!
//! Growth
//! - The table starts with `2^MIN_INDEX_BIT_WIDTH` buckets. An `add` that
//!   finds more resources installed than buckets splits exactly one bucket
//!   first: the bucket at the split cursor is detached and its resources are
//!   re-routed between it and one new bucket at the end of the array.
//! - Addressing: `h0 = hash & low_mask`; buckets below the split cursor are
//!   already split this generation, so they use `hash & high_mask`.
//! - When the cursor passes the low mask the generation is complete: the
//!   masks move up one bit and the cursor restarts. The bucket array is
//!   reallocated once per generation, to twice its length. If that
//!   allocation fails the split is skipped and the table keeps working at
//!   its current size.
//! - The table never shrinks.
//!
//! Storage
//! - Resources live by value in a generational `slotmap` arena; each bucket
//!   is a doubly linked list threaded through the arena nodes. Splits move
//!   links only, never resources.
//! - `Handle`s are generational keys: stale handles never resolve.
//!
//! Constraints
//! - Single-threaded and synchronous. There is no internal locking; shared
//!   use needs external synchronization.
//! - Duplicate ids are rejected with the resource handed back.
//! - Growing the table while a `Cursor` is in flight is a precondition
//!   violation and panics when the cursor resumes.
//! - `verify` asserts the addressing invariants and is meant for tests.

mod bucket;
pub mod chron_table;
pub mod error;
pub mod id;
pub mod iter;
pub mod res_table;
mod res_table_proptest;
pub mod string_id;

// Public surface
pub use chron_table::{ChronIdTable, ChronResource};
pub use error::{AddError, ChronAddError, Error};
pub use id::{
    integer_hash, ChronId, IdInteger, Identifier, IntId, TableIndex, U32Id, U64Id, UsizeId,
};
pub use iter::{Cursor, Iter};
pub use res_table::{Handle, Resource, ResourceTable, TableStats, Visit};
pub use string_id::{string_hash, Allocation, StringId};
