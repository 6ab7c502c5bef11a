// SPDX-License-Identifier: Apache-2.0

// types.rs for charscan
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CharsetError {
    #[error("character set must not be empty")]
    EmptySet,
    #[error("character set has {0} distinct members, at most 128 are supported")]
    TooManyMembers(usize),
    #[error("invalid set literal {literal:?}: {reason}")]
    InvalidLiteral { literal: String, reason: String },
    #[error("member U+{0:04X} is not ASCII, the set cannot use a vectorized strategy")]
    NonAsciiVectorized(u16),
    #[error("extended scans only support the exclude policy")]
    ExtendedRequiresExclude,
    #[error("character set has {0} distinct members, the small-set strategy takes at most 5")]
    NotASmallSet(usize),
}

pub type Result<T> = std::result::Result<T, CharsetError>;

/// How a registered set is searched.
///
/// Chosen once per set by the [`specialize`](crate::specialize) module and stored
/// next to the compiled tables, so a scan call never re-decides it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStrategy {
    /// Unrolled compare chain over at most five members.
    NativeSmallSet,
    /// Linear table scan. Required for sets with non-ASCII members.
    Scalar,
    /// Nibble-bitmask SIMD scan.
    Vectorized,
    /// Nibble-bitmask SIMD scan that never reports code units >= 0x80.
    VectorizedExtended,
}

impl ScanStrategy {
    #[inline]
    pub fn is_vectorized(self) -> bool {
        matches!(self, ScanStrategy::Vectorized | ScanStrategy::VectorizedExtended)
    }
}

/// Element types a scanner accepts: bytes and UTF-16 code units.
pub trait CodeUnit: Copy {
    fn code_point(self) -> u16;
}

impl CodeUnit for u8 {
    #[inline(always)]
    fn code_point(self) -> u16 {
        self as u16
    }
}

impl CodeUnit for u16 {
    #[inline(always)]
    fn code_point(self) -> u16 {
        self
    }
}
