// SPDX-License-Identifier: Apache-2.0

//! Common constants used across implementations
//!
//! This module centralizes lane counts, dispatch thresholds, and the fixed lookup
//! vectors shared by the scalar and SIMD scanners.

// =============================================================================
// TABLE DIMENSIONS
// =============================================================================

/// Number of entries in a [`LookupTable`](crate::charset::LookupTable).
/// Code points at or above this value are never members of an ASCII table.
pub const TABLE_SIZE: usize = 128;

/// Maximum number of distinct members a character set may hold.
pub const MAX_SET_MEMBERS: usize = 128;

// =============================================================================
// SIMD Lane Counts
// =============================================================================

// Every backend works on 128-bit registers (SSE4.1, NEON, portable).
pub const LANES_BYTES: usize = 16; // 128/8 = 16 byte elements
pub const LANES_U16: usize = 8; // 128/16 = 8 u16 elements

// =============================================================================
// NIBBLE BITMASK CONSTANTS
// =============================================================================

pub const NIBBLE_MASK: u8 = 0x0F;

/// `(unit & ASCII_MASK_U16) == 0` holds exactly for code units below 0x80.
pub const ASCII_MASK_U16: u16 = 0xFF80;

/// Maps a high nibble to the bit it owns inside a packed-bitmask lane.
///
/// High nibbles 8..F map to zero, so `bit_position & lane` is zero for every
/// byte >= 0x80 no matter what the lane holds.
pub const BIT_POSITIONS: [u8; 16] = [
    0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, // high-nibble 0..7
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // high-nibble 8..F
];

// =============================================================================
// SPECIALIZATION THRESHOLDS
// =============================================================================

/// Sets with at most this many distinct members are searched with an unrolled
/// compare chain instead of the bitmask tables.
pub const NATIVE_SMALL_SET_MAX: usize = 5;

// When disable-simd feature is enabled, set all thresholds to usize::MAX to force scalar implementations
#[cfg(feature = "disable-simd")]
mod thresholds {
    pub const SIMD_THRESHOLD_BYTES: usize = usize::MAX; // Byte scans
    pub const SIMD_THRESHOLD_U16: usize = usize::MAX; // Code-unit scans
}

// Normal thresholds when SIMD is enabled (default)
#[cfg(not(feature = "disable-simd"))]
mod thresholds {
    pub const SIMD_THRESHOLD_BYTES: usize = super::LANES_BYTES; // One full byte vector
    pub const SIMD_THRESHOLD_U16: usize = super::LANES_U16; // One half-width load
}

pub use thresholds::*;
