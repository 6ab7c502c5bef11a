// SPDX-License-Identifier: Apache-2.0

//! Character sets and their compiled tables
//!
//! A [`CharacterSet`] is compiled once into two read-only representations:
//!
//! - [`LookupTable`]: 128 booleans, used by the scalar scanner
//! - [`PackedBitmask`]: 16 bytes, used by the SIMD scanner
//!
//! ## Packed bitmask layout
//! Every ASCII code point splits into a low nibble (row) and a high nibble
//! (column). Lane `low` of the bitmask holds one bit per high nibble 0..7, and
//! the bit is SET when that code point is accepted. For the token set:
//!
//! ```text
//!                         high-nibble
//! low-nibble   0  1  2  3  4  5  6  7      lane
//!          0   0  0  0  1  0  1  1  1      0xE8
//!          1   0  0  1  1  1  1  1  1      0xFC
//!          2   0  0  0  1  1  1  1  1      0xF8
//!          ..
//!          C   0  0  0  0  1  0  1  1      0xD0
//!          D   0  0  1  0  1  0  1  0      0x54
//!          E   0  0  1  0  1  1  1  1      0xF4
//!          F   0  0  0  0  1  1  1  0      0x70
//! ```
//!
//! High nibbles 8..F have no bit. The scanners look bit positions up through
//! [`BIT_POSITIONS`](crate::constants::BIT_POSITIONS), which maps them to zero,
//! so bytes >= 0x80 are never accepted by the bitmask.

use serde::{Deserialize, Serialize};

use crate::constants::{LANES_BYTES, MAX_SET_MEMBERS, NIBBLE_MASK, TABLE_SIZE};
use crate::types::{CharsetError, Result};

/// Anything that can answer "is this code point accepted".
pub trait Membership {
    fn contains(&self, code_point: u16) -> bool;
}

// =============================================================================
// CHARACTER SET
// =============================================================================

/// A non-empty set of accepted code points.
///
/// Members are kept sorted and deduplicated, so building a set from the same
/// members in any order (with or without repeats) yields equal sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u16>", into = "Vec<u16>")]
pub struct CharacterSet {
    members: Vec<u16>,
}

#[allow(clippy::len_without_is_empty)]
impl CharacterSet {
    pub fn new(members: impl IntoIterator<Item = u16>) -> Result<Self> {
        let mut members: Vec<u16> = members.into_iter().collect();
        members.sort_unstable();
        members.dedup();

        if members.is_empty() {
            return Err(CharsetError::EmptySet);
        }
        if members.len() > MAX_SET_MEMBERS {
            return Err(CharsetError::TooManyMembers(members.len()));
        }

        Ok(Self { members })
    }

    /// Every character of `chars` is a member.
    pub fn from_chars(chars: &str) -> Result<Self> {
        let mut members = Vec::with_capacity(chars.len());
        for c in chars.chars() {
            members.push(code_point_of(c, chars)?);
        }
        Self::new(members)
    }

    /// All code points in `first..=last`.
    pub fn from_range(first: u16, last: u16) -> Result<Self> {
        Self::new(first..=last)
    }

    /// Parses a set literal.
    ///
    /// `"[...]"` is a class: `a-z` denotes a range, `\` escapes the next
    /// character (`\]`, `\-`, `\\`), and a `-` at either end is literal. Any
    /// other literal lists its members verbatim, so `"abc"` and `"[abc]"` are
    /// the same set.
    pub fn parse(literal: &str) -> Result<Self> {
        if literal.is_empty() {
            return Err(CharsetError::EmptySet);
        }

        let Some(body) = literal.strip_prefix('[') else {
            return Self::from_chars(literal);
        };
        let Some(body) = body.strip_suffix(']') else {
            return Err(invalid_literal(literal, "missing closing ']'"));
        };

        let mut members = Vec::new();
        let mut chars = body.chars().peekable();

        while let Some(c) = chars.next() {
            let first = if c == '\\' {
                match chars.next() {
                    Some(escaped) => escaped,
                    None => return Err(invalid_literal(literal, "dangling escape")),
                }
            } else {
                c
            };
            let first = code_point_of(first, literal)?;

            // `x-` at the end of the class keeps the dash literal.
            let is_range = chars.peek() == Some(&'-') && {
                let mut lookahead = chars.clone();
                lookahead.next();
                lookahead.peek().is_some()
            };

            if !is_range {
                members.push(first);
                continue;
            }

            chars.next();
            let last = match chars.next() {
                Some('\\') => match chars.next() {
                    Some(escaped) => escaped,
                    None => return Err(invalid_literal(literal, "dangling escape")),
                },
                Some(last) => last,
                None => return Err(invalid_literal(literal, "unterminated range")),
            };
            let last = code_point_of(last, literal)?;

            if last < first {
                return Err(invalid_literal(
                    literal,
                    &format!("range {:#06X}-{:#06X} is out of order", first, last),
                ));
            }
            members.extend(first..=last);
        }

        Self::new(members)
    }

    /// Members of either set.
    pub fn union(&self, other: &CharacterSet) -> Result<Self> {
        Self::new(self.members.iter().chain(other.members.iter()).copied())
    }

    /// The ASCII code points that are not members.
    pub fn ascii_complement(&self) -> Result<Self> {
        Self::new((0..TABLE_SIZE as u16).filter(|&c| !self.contains(c)))
    }

    #[inline]
    pub fn members(&self) -> &[u16] {
        &self.members
    }

    /// Members >= 0x80, in ascending order.
    #[inline]
    pub fn non_ascii_members(&self) -> &[u16] {
        let split = self.members.partition_point(|&c| (c as usize) < TABLE_SIZE);
        &self.members[split..]
    }

    /// Number of distinct members.
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True when every member is below 0x80: the precondition for building a
    /// vectorized scan over this set.
    #[inline]
    pub fn is_ascii(&self) -> bool {
        self.first_non_ascii().is_none()
    }

    #[inline]
    pub fn first_non_ascii(&self) -> Option<u16> {
        self.non_ascii_members().first().copied()
    }

    /// Compiles the lookup table and the packed bitmask.
    pub fn tables(&self) -> SetTables {
        SetTables::from_set(self)
    }
}

impl Membership for CharacterSet {
    #[inline]
    fn contains(&self, code_point: u16) -> bool {
        self.members.binary_search(&code_point).is_ok()
    }
}

impl TryFrom<Vec<u16>> for CharacterSet {
    type Error = CharsetError;

    fn try_from(members: Vec<u16>) -> Result<Self> {
        Self::new(members)
    }
}

impl From<CharacterSet> for Vec<u16> {
    fn from(set: CharacterSet) -> Self {
        set.members
    }
}

fn code_point_of(c: char, literal: &str) -> Result<u16> {
    u16::try_from(c as u32).map_err(|_| {
        invalid_literal(
            literal,
            &format!("U+{:X} is outside the Basic Multilingual Plane", c as u32),
        )
    })
}

fn invalid_literal(literal: &str, reason: &str) -> CharsetError {
    CharsetError::InvalidLiteral {
        literal: literal.to_string(),
        reason: reason.to_string(),
    }
}

// =============================================================================
// LOOKUP TABLE
// =============================================================================

/// `table[c]` is true iff ASCII code point `c` is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LookupTable([bool; TABLE_SIZE]);

impl LookupTable {
    pub fn from_set(set: &CharacterSet) -> Self {
        let mut table = [false; TABLE_SIZE];
        for &c in set.members() {
            if (c as usize) < TABLE_SIZE {
                table[c as usize] = true;
            }
        }
        LookupTable(table)
    }

    #[inline]
    pub fn as_array(&self) -> &[bool; TABLE_SIZE] {
        &self.0
    }
}

impl Membership for LookupTable {
    #[inline(always)]
    fn contains(&self, code_point: u16) -> bool {
        (code_point as usize) < TABLE_SIZE && self.0[code_point as usize]
    }
}

// =============================================================================
// PACKED BITMASK
// =============================================================================

/// 16 lanes, one per low nibble, with bit `h` set when code point
/// `(h << 4) | low` is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackedBitmask([u8; LANES_BYTES]);

impl PackedBitmask {
    /// Members >= 0x80 have no place in the layout and are skipped; callers
    /// must check [`CharacterSet::is_ascii`] before scanning with the result.
    pub fn from_set(set: &CharacterSet) -> Self {
        let mut lanes = [0u8; LANES_BYTES];
        for &c in set.members() {
            if (c as usize) < TABLE_SIZE {
                let low_nibble = (c as u8 & NIBBLE_MASK) as usize;
                let high_nibble = (c >> 4) as u8;
                lanes[low_nibble] |= 1 << high_nibble;
            }
        }
        PackedBitmask(lanes)
    }

    #[inline]
    pub fn lanes(&self) -> &[u8; LANES_BYTES] {
        &self.0
    }

    /// The lanes reinterpreted as signed bytes, as the x86 shuffle sees them.
    #[inline]
    pub fn to_signed(&self) -> [i8; LANES_BYTES] {
        self.0.map(|lane| lane as i8)
    }
}

impl Membership for PackedBitmask {
    #[inline]
    fn contains(&self, code_point: u16) -> bool {
        if code_point as usize >= TABLE_SIZE {
            return false;
        }
        let low_nibble = (code_point as u8 & NIBBLE_MASK) as usize;
        let high_nibble = code_point >> 4;
        self.0[low_nibble] & (1 << high_nibble) != 0
    }
}

// =============================================================================
// SET TABLES
// =============================================================================

/// Both compiled forms of one set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SetTables {
    pub lookup: LookupTable,
    pub bitmask: PackedBitmask,
}

impl SetTables {
    pub fn from_set(set: &CharacterSet) -> Self {
        let (lookup, bitmask) = build(set);
        SetTables { lookup, bitmask }
    }
}

/// Compiles `set` into its lookup table and packed bitmask.
pub fn build(set: &CharacterSet) -> (LookupTable, PackedBitmask) {
    (LookupTable::from_set(set), PackedBitmask::from_set(set))
}

/// Compiles raw members, failing on an empty (or oversized) member list.
pub fn build_tables(members: &[u16]) -> Result<SetTables> {
    CharacterSet::new(members.iter().copied()).map(|set| SetTables::from_set(&set))
}
