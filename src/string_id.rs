//! Character string identifier hashed with a four-stream Pearson hash.

use crate::id::{integer_hash, Identifier, TableIndex};
use std::borrow::Cow;

const STRING_ID_MIN_INDEX_WIDTH: u32 = 8;
// Fold width applied to the packed 32-bit stream hash.
const STRING_ID_FOLD_WIDTH: u32 = core::mem::size_of::<u32>() as u32;

/// Whether a `StringId` keeps a private copy of its text or borrows it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Allocation {
    Owned,
    Borrowed,
}

/// String identifier.
///
/// Comparison is case-sensitive and bytewise. A null identifier (one built
/// with `StringId::null`) never matches anything, not even another null
/// identifier.
#[derive(Clone, Debug)]
pub struct StringId<'a> {
    name: Option<Cow<'a, str>>,
}

impl<'a> StringId<'a> {
    pub fn new(name: &'a str, alloc: Allocation) -> Self {
        let name = match alloc {
            Allocation::Owned => Cow::Owned(name.to_owned()),
            Allocation::Borrowed => Cow::Borrowed(name),
        };
        StringId { name: Some(name) }
    }

    /// Identifier owning a private copy of `name`.
    pub fn copied(name: &str) -> StringId<'static> {
        StringId {
            name: Some(Cow::Owned(name.to_owned())),
        }
    }

    /// Identifier referring to externally owned text.
    pub fn borrowed(name: &'a str) -> Self {
        Self::new(name, Allocation::Borrowed)
    }

    pub const fn null() -> Self {
        StringId { name: None }
    }

    pub fn resource_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn allocation(&self) -> Option<Allocation> {
        match self.name {
            Some(Cow::Owned(_)) => Some(Allocation::Owned),
            Some(Cow::Borrowed(_)) => Some(Allocation::Borrowed),
            None => None,
        }
    }

    pub fn show(&self, level: u32) {
        if level > 2 {
            tracing::info!(id = ?self.resource_name(), "resource id");
        }
    }
}

impl Identifier for StringId<'_> {
    const MIN_INDEX_BIT_WIDTH: u32 = STRING_ID_MIN_INDEX_WIDTH;
    const MAX_INDEX_BIT_WIDTH: u32 = TableIndex::BITS;

    fn hash_index(&self) -> TableIndex {
        match &self.name {
            Some(name) => string_hash(name.as_bytes()),
            None => 0,
        }
    }

    fn id_eq(&self, other: &Self) -> bool {
        match (&self.name, &other.name) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

/// Hash a byte string into a table index.
///
/// Four 8-bit accumulators take turns consuming one byte each through the
/// permutation table. Hashing stops at the end of the input or at the first
/// zero byte. The accumulators are packed little end first into a 32-bit
/// word which is then folded like an integer identifier.
pub fn string_hash(bytes: &[u8]) -> TableIndex {
    let mut h = [0u8; 4];
    'outer: for chunk in bytes.chunks(4) {
        for (acc, &c) in h.iter_mut().zip(chunk) {
            if c == 0 {
                break 'outer;
            }
            *acc = PERMUTATION[usize::from(*acc ^ c)];
        }
    }
    let packed = u32::from_le_bytes(h);
    integer_hash(
        STRING_ID_MIN_INDEX_WIDTH,
        STRING_ID_FOLD_WIDTH,
        u64::from(packed),
    )
}

/// Pearson substitution table (a fixed permutation of 0..=255).
#[rustfmt::skip]
static PERMUTATION: [u8; 256] = [
     39, 159, 180, 252,  71,   6,  13, 164, 232,  35, 226, 155,  98, 120, 154,  69,
    157,  24, 137,  29, 147,  78, 121,  85, 112,   8, 248, 130,  55, 117, 190, 160,
    176, 131, 228,  64, 211, 106,  38,  27, 140,  30,  88, 210, 227, 104,  84,  77,
     75, 107, 169, 138, 195, 184,  70,  90,  61, 166,   7, 244, 165, 108, 219,  51,
      9, 139, 209,  40,  31, 202,  58, 179, 116,  33, 207, 146,  76,  60, 242, 124,
    254, 197,  80, 167, 153, 145, 129, 233, 132,  48, 246,  86, 156, 177,  36, 187,
     45,   1,  96,  18,  19,  62, 185, 234,  99,  16, 218,  95, 128, 224, 123, 253,
     42, 109,   4, 247,  72,   5, 151, 136,   0, 152, 148, 127, 204, 133,  17,  14,
    182, 217,  54, 199, 119, 174,  82,  57, 215,  41, 114, 208, 206, 110, 239,  23,
    189,  15,   3,  22, 188,  79, 113, 172,  28,   2, 222,  21, 251, 225, 237, 105,
    102,  32,  56, 181, 126,  83, 230,  53, 158,  52,  59, 213, 118, 100,  67, 142,
    220, 170, 144, 115, 205,  26, 125, 168, 249,  66, 175,  97, 255,  92, 229,  91,
    214, 236, 178, 243,  46,  44, 201, 250, 135, 186, 150, 221, 163, 216, 162,  43,
     11, 101,  34,  37, 194,  25,  50,  12,  87, 198, 173, 240, 193, 171, 143, 231,
    111, 141, 191, 103,  74, 245, 223,  20, 161, 235, 122,  63,  89, 149,  73, 238,
    134,  68,  93, 183, 241,  81, 196,  49, 192,  65, 212,  94, 203,  10, 200,  47,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permutation_is_a_permutation() {
        let mut seen = [false; 256];
        for &p in PERMUTATION.iter() {
            assert!(!seen[usize::from(p)]);
            seen[usize::from(p)] = true;
        }
    }

    #[test]
    fn known_hash_values() {
        assert_eq!(string_hash(b""), 0);
        assert_eq!(string_hash(b"a"), 1);
        assert_eq!(string_hash(b"abcd"), 0x17d6_f801);
        assert_eq!(string_hash(b"abcde"), 0x17d6_f817);
        assert_eq!(string_hash(b"hello"), 0xa0a0_31fa);
    }

    #[test]
    fn hashing_stops_at_zero_byte() {
        assert_eq!(string_hash(b"abcd\0ignored"), string_hash(b"abcd"));
        assert_eq!(string_hash(b"\0abc"), 0);
    }

    #[test]
    fn copy_and_borrow_compare_equal() {
        let text = String::from("channel:7");
        let owned = StringId::copied(&text);
        let borrowed = StringId::borrowed(&text);
        assert!(owned.id_eq(&borrowed));
        assert_eq!(owned.hash_index(), borrowed.hash_index());
        assert_eq!(owned.allocation(), Some(Allocation::Owned));
        assert_eq!(borrowed.allocation(), Some(Allocation::Borrowed));
    }

    #[test]
    fn comparison_is_case_sensitive() {
        assert!(!StringId::borrowed("Name").id_eq(&StringId::borrowed("name")));
    }

    #[test]
    fn null_matches_nothing() {
        let null = StringId::null();
        assert!(!null.id_eq(&StringId::null()));
        assert!(!null.id_eq(&StringId::borrowed("")));
        assert!(!StringId::borrowed("").id_eq(&null));
        assert_eq!(null.hash_index(), 0);
        assert_eq!(null.resource_name(), None);
    }
}
