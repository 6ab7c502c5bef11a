// SPDX-License-Identifier: Apache-2.0

//! Set membership scans
//!
//! Scalar and nibble-bitmask SIMD scanners over bytes and UTF-16 code units.
//! The scalar scanners are the reference: every vectorized scanner returns
//! exactly what its scalar counterpart returns, for every input.
//!
//! ## Vectorized algorithm
//! Per 16-byte vector `v`:
//!
//! ```text
//! bit_from_mask = shuffle(bitmask,       v & 0xF)
//! bit_position  = shuffle(BIT_POSITIONS, v >> 4)
//! accepted      = (bit_from_mask & bit_position) != 0
//! report        = policy(accepted)
//! ```
//!
//! and the answer is the first set lane of `report`. Code units are narrowed to
//! bytes with unsigned saturation first, so every unit >= 0x80 lands on a high
//! nibble >= 8 and is never accepted.
//!
//! A trailing partial vector is never scanned element by element: the window
//! moves back to end at the last element and one more full vector is scanned.
//! The overlap was already found clear, so the first hit is still the first.
//!
//! ## Performance notes
//! The generic kernels are `#[inline(always)]` so that they are compiled inside
//! the `#[target_feature]` entry points and the intrinsics inline.

// Some clippy lints are noisy for low-level SIMD code; we opt out at the module level.
#![allow(unsafe_op_in_unsafe_fn)]
#![allow(clippy::missing_safety_doc)]

use crate::charset::{Membership, PackedBitmask};
use crate::constants::{BIT_POSITIONS, LANES_BYTES, LANES_U16, NIBBLE_MASK, TABLE_SIZE};
use crate::lanes::{Lanes, PortableLanes};
use crate::policy::{Exclude, Negator};
use crate::types::CodeUnit;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
use crate::lanes::Sse41Lanes;

#[cfg(target_arch = "aarch64")]
use crate::lanes::NeonLanes;

// =============================================================================
// SCALAR
// =============================================================================

/// Index of the first element the policy reports.
///
/// With [`Exclude`] and a [`LookupTable`](crate::charset::LookupTable) this is
/// the first element that is >= 128 or absent from the table; with
/// [`Include`](crate::policy::Include) the first element below 128 that is
/// present.
#[inline]
pub fn index_of_match_scalar<N, T, M>(input: &[T], set: &M) -> Option<usize>
where
    N: Negator,
    T: CodeUnit,
    M: Membership + ?Sized,
{
    for (i, &unit) in input.iter().enumerate() {
        if N::negate_if_needed(set.contains(unit.code_point())) {
            return Some(i);
        }
    }
    None
}

/// Index of the first ASCII element that is not a member. Elements >= 0x80 are
/// always let through.
#[inline]
pub fn index_of_invalid_extended_scalar<T, M>(input: &[T], set: &M) -> Option<usize>
where
    T: CodeUnit,
    M: Membership + ?Sized,
{
    for (i, &unit) in input.iter().enumerate() {
        let c = unit.code_point();
        if (c as usize) < TABLE_SIZE && Exclude::negate_if_needed(set.contains(c)) {
            return Some(i);
        }
    }
    None
}

// =============================================================================
// VECTORIZED KERNELS
// =============================================================================

/// Broadcast constants of one scan.
#[derive(Clone, Copy)]
struct NibbleTables<V> {
    bitmask: V,
    bit_positions: V,
    nibble_mask: V,
}

impl<V: Lanes> NibbleTables<V> {
    #[inline(always)]
    unsafe fn new(bitmask: &PackedBitmask) -> Self {
        NibbleTables {
            bitmask: V::from_array(bitmask.lanes()),
            bit_positions: V::from_array(&BIT_POSITIONS),
            nibble_mask: V::splat(NIBBLE_MASK),
        }
    }

    /// 0xFF for every lane whose byte is in the set.
    #[inline(always)]
    unsafe fn accepted(&self, values: V) -> V {
        let high_nibbles = values.high_nibbles();
        let low_nibbles = values.and(self.nibble_mask);

        let bit_from_mask = V::shuffle(self.bitmask, low_nibbles);
        let bit_position = V::shuffle(self.bit_positions, high_nibbles);

        bit_position.and(bit_from_mask).nonzero()
    }
}

#[inline(always)]
unsafe fn scan_bytes<V: Lanes>(input: &[u8], report: impl Fn(V) -> V) -> Option<usize> {
    debug_assert!(input.len() >= LANES_BYTES);

    let len = input.len();
    let ptr = input.as_ptr();
    let mut idx = 0usize;

    while idx + LANES_BYTES <= len {
        if let Some(offset) = report(V::load(ptr.add(idx))).first_set() {
            return Some(idx + offset);
        }
        idx += LANES_BYTES;
    }

    if idx < len {
        let base = len - LANES_BYTES;
        if let Some(offset) = report(V::load(ptr.add(base))).first_set() {
            return Some(base + offset);
        }
    }

    None
}

/// `report(lo, hi)` classifies the 8 units at `lo` followed by the 8 at `hi`.
#[inline(always)]
unsafe fn scan_u16<V: Lanes>(
    input: &[u16],
    report: impl Fn(*const u16, *const u16) -> V,
) -> Option<usize> {
    debug_assert!(input.len() >= LANES_U16);

    let len = input.len();
    let ptr = input.as_ptr();
    let mut idx = 0usize;

    while idx + 2 * LANES_U16 <= len {
        let lo = ptr.add(idx);
        if let Some(offset) = report(lo, lo.add(LANES_U16)).first_set() {
            return Some(idx + offset);
        }
        idx += 2 * LANES_U16;
    }

    // 8..15 units left. Both halves hold the same units, so a hit is always
    // in the lower half.
    if idx + LANES_U16 <= len {
        let lo = ptr.add(idx);
        if let Some(offset) = report(lo, lo).first_set() {
            return Some(idx + offset);
        }
        idx += LANES_U16;
    }

    if idx < len {
        let base = len - LANES_U16;
        let lo = ptr.add(base);
        if let Some(offset) = report(lo, lo).first_set() {
            return Some(base + offset);
        }
    }

    None
}

/// Vectorized [`index_of_match_scalar`] over bytes.
///
/// # Safety
/// `input.len() >= 16`, and `V`'s target features are available.
#[inline(always)]
pub unsafe fn index_of_match_bytes_vectorized<V: Lanes, N: Negator>(
    input: &[u8],
    bitmask: &PackedBitmask,
) -> Option<usize> {
    let tables = NibbleTables::<V>::new(bitmask);
    scan_bytes::<V>(input, |values| {
        N::negate_lanes_if_needed(tables.accepted(values))
    })
}

/// Vectorized [`index_of_match_scalar`] over code units.
///
/// # Safety
/// `input.len() >= 8`, and `V`'s target features are available.
#[inline(always)]
pub unsafe fn index_of_match_u16_vectorized<V: Lanes, N: Negator>(
    input: &[u16],
    bitmask: &PackedBitmask,
) -> Option<usize> {
    let tables = NibbleTables::<V>::new(bitmask);
    scan_u16::<V>(input, |lo, hi| {
        N::negate_lanes_if_needed(tables.accepted(V::load_narrowed(lo, hi)))
    })
}

/// Vectorized [`index_of_invalid_extended_scalar`] over bytes.
///
/// # Safety
/// `input.len() >= 16`, and `V`'s target features are available.
#[inline(always)]
pub unsafe fn index_of_invalid_bytes_extended_vectorized<V: Lanes>(
    input: &[u8],
    bitmask: &PackedBitmask,
) -> Option<usize> {
    let tables = NibbleTables::<V>::new(bitmask);
    scan_bytes::<V>(input, |values| {
        Exclude::negate_lanes_if_needed(tables.accepted(values)).and(values.ascii())
    })
}

/// Vectorized [`index_of_invalid_extended_scalar`] over code units.
///
/// The ASCII mask comes from the 16-bit units: after saturation every
/// non-ASCII unit looks like a forced mismatch and would otherwise be reported.
///
/// # Safety
/// `input.len() >= 8`, and `V`'s target features are available.
#[inline(always)]
pub unsafe fn index_of_invalid_u16_extended_vectorized<V: Lanes>(
    input: &[u16],
    bitmask: &PackedBitmask,
) -> Option<usize> {
    let tables = NibbleTables::<V>::new(bitmask);
    scan_u16::<V>(input, |lo, hi| {
        let (values, ascii) = V::load_narrowed_ascii(lo, hi);
        Exclude::negate_lanes_if_needed(tables.accepted(values)).and(ascii)
    })
}

// =============================================================================
// BACKEND ENTRY POINTS
// =============================================================================

// SSE4.1 optimized scans.
//
// # Safety
// Requires SSSE3 and SSE4.1. Use `is_x86_feature_detected!("sse4.1")` before
// calling, and pass at least one full vector of input.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[target_feature(enable = "sse2,ssse3,sse4.1")]
pub unsafe fn index_of_match_bytes_sse41<N: Negator>(
    input: &[u8],
    bitmask: &PackedBitmask,
) -> Option<usize> {
    index_of_match_bytes_vectorized::<Sse41Lanes, N>(input, bitmask)
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[target_feature(enable = "sse2,ssse3,sse4.1")]
pub unsafe fn index_of_match_u16_sse41<N: Negator>(
    input: &[u16],
    bitmask: &PackedBitmask,
) -> Option<usize> {
    index_of_match_u16_vectorized::<Sse41Lanes, N>(input, bitmask)
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[target_feature(enable = "sse2,ssse3,sse4.1")]
pub unsafe fn index_of_invalid_bytes_extended_sse41(
    input: &[u8],
    bitmask: &PackedBitmask,
) -> Option<usize> {
    index_of_invalid_bytes_extended_vectorized::<Sse41Lanes>(input, bitmask)
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[target_feature(enable = "sse2,ssse3,sse4.1")]
pub unsafe fn index_of_invalid_u16_extended_sse41(
    input: &[u16],
    bitmask: &PackedBitmask,
) -> Option<usize> {
    index_of_invalid_u16_extended_vectorized::<Sse41Lanes>(input, bitmask)
}

// NEON optimized scans.
//
// # Safety
// Pass at least one full vector of input.
#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
pub unsafe fn index_of_match_bytes_neon<N: Negator>(
    input: &[u8],
    bitmask: &PackedBitmask,
) -> Option<usize> {
    index_of_match_bytes_vectorized::<NeonLanes, N>(input, bitmask)
}

#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
pub unsafe fn index_of_match_u16_neon<N: Negator>(
    input: &[u16],
    bitmask: &PackedBitmask,
) -> Option<usize> {
    index_of_match_u16_vectorized::<NeonLanes, N>(input, bitmask)
}

#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
pub unsafe fn index_of_invalid_bytes_extended_neon(
    input: &[u8],
    bitmask: &PackedBitmask,
) -> Option<usize> {
    index_of_invalid_bytes_extended_vectorized::<NeonLanes>(input, bitmask)
}

#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
pub unsafe fn index_of_invalid_u16_extended_neon(
    input: &[u16],
    bitmask: &PackedBitmask,
) -> Option<usize> {
    index_of_invalid_u16_extended_vectorized::<NeonLanes>(input, bitmask)
}

// Portable scans, available on every target.
//
// # Safety
// Pass at least one full vector of input.
pub unsafe fn index_of_match_bytes_portable<N: Negator>(
    input: &[u8],
    bitmask: &PackedBitmask,
) -> Option<usize> {
    index_of_match_bytes_vectorized::<PortableLanes, N>(input, bitmask)
}

pub unsafe fn index_of_match_u16_portable<N: Negator>(
    input: &[u16],
    bitmask: &PackedBitmask,
) -> Option<usize> {
    index_of_match_u16_vectorized::<PortableLanes, N>(input, bitmask)
}

pub unsafe fn index_of_invalid_bytes_extended_portable(
    input: &[u8],
    bitmask: &PackedBitmask,
) -> Option<usize> {
    index_of_invalid_bytes_extended_vectorized::<PortableLanes>(input, bitmask)
}

pub unsafe fn index_of_invalid_u16_extended_portable(
    input: &[u16],
    bitmask: &PackedBitmask,
) -> Option<usize> {
    index_of_invalid_u16_extended_vectorized::<PortableLanes>(input, bitmask)
}
