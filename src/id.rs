//! Identifier capability and the integer identifiers.
//!
//! An identifier knows how to compare itself against another identifier of
//! the same kind and how to produce a table-index-shaped hash. The two
//! associated constants bound the bucket count of any table keyed by it:
//! `2^MIN_INDEX_BIT_WIDTH ..= 2^MAX_INDEX_BIT_WIDTH`.

use core::fmt;

/// Raw bucket index produced by `Identifier::hash_index`. The table masks
/// it down to its current address space.
pub type TableIndex = usize;

pub trait Identifier {
    /// A fresh table starts with `2^MIN_INDEX_BIT_WIDTH` buckets.
    const MIN_INDEX_BIT_WIDTH: u32;
    /// Splitting stops once the table reaches `2^MAX_INDEX_BIT_WIDTH` buckets.
    const MAX_INDEX_BIT_WIDTH: u32;

    fn hash_index(&self) -> TableIndex;

    /// Equivalence test used for duplicate detection and lookup. Not
    /// required to be reflexive (a null string identifier matches nothing).
    fn id_eq(&self, other: &Self) -> bool;
}

/// Fold an integer so that every bit below `max_id_width` influences the
/// low `min_index_width` bits of the result.
///
/// The value is xor-ed with right-shifted copies of itself, halving the
/// shift each round, until the shift drops to `min_index_width` or below.
/// The result is not masked; the table applies its own masks.
#[inline]
pub const fn integer_hash(min_index_width: u32, max_id_width: u32, id: u64) -> TableIndex {
    let mut hash = id;
    let mut width = if max_id_width > u64::BITS {
        u64::BITS
    } else {
        max_id_width
    };
    loop {
        width >>= 1;
        // a zero shift would cancel the value out
        if width == 0 {
            break;
        }
        hash ^= hash >> width;
        if width <= min_index_width {
            break;
        }
    }
    hash as TableIndex
}

/// Primitive integers usable inside an `IntId`.
pub trait IdInteger: Copy + Eq + fmt::Debug {
    const BITS: u32;

    /// Zero-extended bit pattern of the value.
    fn to_bits(self) -> u64;
}

macro_rules! id_integer {
    ($($t:ty => $u:ty),* $(,)?) => {
        $(
            impl IdInteger for $t {
                const BITS: u32 = <$t>::BITS;

                #[inline]
                fn to_bits(self) -> u64 {
                    self as $u as u64
                }
            }
        )*
    };
}

id_integer! {
    u8 => u8, u16 => u16, u32 => u32, u64 => u64, usize => usize,
    i8 => u8, i16 => u16, i32 => u32, i64 => u64, isize => usize,
}

/// Integer identifier.
///
/// `MIN_INDEX_WIDTH` is the minimum table index width (the table starts with
/// `2^MIN_INDEX_WIDTH` buckets). `MAX_ID_WIDTH` is the number of low bits of
/// the integer that may ever be set; hashing is cheapest when
/// `MAX_ID_WIDTH - MIN_INDEX_WIDTH` is small.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntId<T, const MIN_INDEX_WIDTH: u32, const MAX_ID_WIDTH: u32>(T);

pub type U32Id = IntId<u32, 4, 32>;
pub type U64Id = IntId<u64, 4, 64>;
pub type UsizeId = IntId<usize, 4, { usize::BITS }>;

impl<T: IdInteger, const MIN_INDEX_WIDTH: u32, const MAX_ID_WIDTH: u32>
    IntId<T, MIN_INDEX_WIDTH, MAX_ID_WIDTH>
{
    pub const fn new(id: T) -> Self {
        IntId(id)
    }

    pub fn get(&self) -> T {
        self.0
    }
}

impl<T: IdInteger, const MIN_INDEX_WIDTH: u32, const MAX_ID_WIDTH: u32> From<T>
    for IntId<T, MIN_INDEX_WIDTH, MAX_ID_WIDTH>
{
    fn from(id: T) -> Self {
        IntId(id)
    }
}

impl<T: IdInteger, const MIN_INDEX_WIDTH: u32, const MAX_ID_WIDTH: u32> Identifier
    for IntId<T, MIN_INDEX_WIDTH, MAX_ID_WIDTH>
{
    const MIN_INDEX_BIT_WIDTH: u32 = MIN_INDEX_WIDTH;
    const MAX_INDEX_BIT_WIDTH: u32 = TableIndex::BITS;

    #[inline]
    fn hash_index(&self) -> TableIndex {
        integer_hash(MIN_INDEX_WIDTH, MAX_ID_WIDTH, self.0.to_bits())
    }

    #[inline]
    fn id_eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

type ChronBase = IntId<u32, 8, { u32::BITS }>;

/// Identifier assigned by a `ChronIdTable` in allocation order.
///
/// `ChronId::default()` is the unassigned value 0; the allocator never
/// hands out 0.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChronId(ChronBase);

impl ChronId {
    pub const UNASSIGNED: ChronId = ChronId(IntId::new(0));

    pub const fn new(id: u32) -> Self {
        ChronId(IntId::new(id))
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }

    pub fn is_assigned(&self) -> bool {
        *self != Self::UNASSIGNED
    }

    pub(crate) fn assign(&mut self, id: u32) {
        self.0 = IntId::new(id);
    }
}

impl Default for ChronId {
    fn default() -> Self {
        Self::UNASSIGNED
    }
}

impl From<u32> for ChronId {
    fn from(id: u32) -> Self {
        ChronId::new(id)
    }
}

impl fmt::Display for ChronId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

impl Identifier for ChronId {
    const MIN_INDEX_BIT_WIDTH: u32 = <ChronBase as Identifier>::MIN_INDEX_BIT_WIDTH;
    const MAX_INDEX_BIT_WIDTH: u32 = <ChronBase as Identifier>::MAX_INDEX_BIT_WIDTH;

    #[inline]
    fn hash_index(&self) -> TableIndex {
        self.0.hash_index()
    }

    #[inline]
    fn id_eq(&self, other: &Self) -> bool {
        self.0.id_eq(&other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_pulls_high_bits_into_low_bits() {
        // Bit 31 must reach the low 4 bits after folding 32 -> 16 -> 8 -> 4.
        let h = integer_hash(4, 32, 1 << 31);
        assert_ne!(h & 0xf, 0);
        // Same for a 64-bit id with bit 63 set.
        let h = integer_hash(4, 64, 1 << 63);
        assert_ne!(h & 0xf, 0);
    }

    #[test]
    fn fold_of_zero_is_zero() {
        assert_eq!(integer_hash(4, 32, 0), 0);
        assert_eq!(integer_hash(8, 4, 0), 0);
    }

    #[test]
    fn fold_stops_at_min_width() {
        // 32 -> 16 only, since 16 <= 16.
        let v = 0xdead_beefu64;
        assert_eq!(integer_hash(16, 32, v), (v ^ (v >> 16)) as TableIndex);
        // A single round when the starting width is already tiny.
        assert_eq!(integer_hash(8, 4, v), (v ^ (v >> 2)) as TableIndex);
    }

    #[test]
    fn degenerate_width_does_not_zero_the_hash() {
        assert_eq!(integer_hash(0, 1, 0x55), 0x55);
        assert_eq!(integer_hash(0, 0, 0x55), 0x55);
    }

    #[test]
    fn signed_ids_hash_by_bit_pattern() {
        let a: IntId<i32, 4, 32> = IntId::new(-1);
        let b: IntId<u32, 4, 32> = IntId::new(u32::MAX);
        assert_eq!(a.hash_index(), b.hash_index());
        assert!(a.id_eq(&IntId::new(-1)));
        assert!(!a.id_eq(&IntId::new(1)));
    }

    #[test]
    fn chron_id_defaults_to_unassigned() {
        let mut id = ChronId::default();
        assert!(!id.is_assigned());
        id.assign(7);
        assert!(id.is_assigned());
        assert_eq!(id.get(), 7);
        assert!(id.id_eq(&ChronId::from(7)));
        assert_eq!(id.hash_index(), IntId::<u32, 8, 32>::new(7).hash_index());
        assert_eq!(ChronId::MIN_INDEX_BIT_WIDTH, 8);
    }
}
