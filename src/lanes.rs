// SPDX-License-Identifier: Apache-2.0

//! 128-bit lane primitives
//!
//! The nibble-bitmask scanners are written once against the [`Lanes`] trait and
//! instantiated per backend:
//!
//! - [`Sse41Lanes`] on x86/x86_64 (`pshufb`, `packuswb`, `pmovmskb`)
//! - [`NeonLanes`] on aarch64 (`tbl`, `uqxtn`, `shrn`)
//! - [`PortableLanes`], a plain `[u8; 16]` implementation that gives the same
//!   results on any target and serves as the reference for the other two
//!
//! Comparison results are always "all ones" (0xFF) or "all zeros" per lane.

// Some clippy lints are noisy for low-level SIMD code; we opt out at the module level.
#![allow(unsafe_op_in_unsafe_fn)]
#![allow(clippy::missing_safety_doc)]

use crate::constants::{ASCII_MASK_U16, LANES_BYTES, LANES_U16};

// x86 SIMD intrinsics imports (SSE2/SSSE3/SSE4.1)
#[cfg(target_arch = "x86")]
use std::arch::x86::{
    __m128i, _mm_and_si128, _mm_cmpeq_epi16, _mm_cmpeq_epi8, _mm_cmpgt_epi8, _mm_loadu_si128,
    _mm_min_epu16, _mm_movemask_epi8, _mm_packs_epi16, _mm_packus_epi16, _mm_set1_epi16,
    _mm_set1_epi8, _mm_setzero_si128, _mm_shuffle_epi8, _mm_srli_epi16, _mm_xor_si128,
};
#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::{
    __m128i, _mm_and_si128, _mm_cmpeq_epi16, _mm_cmpeq_epi8, _mm_cmpgt_epi8, _mm_loadu_si128,
    _mm_min_epu16, _mm_movemask_epi8, _mm_packs_epi16, _mm_packus_epi16, _mm_set1_epi16,
    _mm_set1_epi8, _mm_setzero_si128, _mm_shuffle_epi8, _mm_srli_epi16, _mm_xor_si128,
};

// ARM NEON imports
#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::{
    uint8x16_t, vandq_u16, vandq_u8, vceqq_u16, vcltq_u8, vcombine_u8, vdupq_n_u16, vdupq_n_u8,
    vget_lane_u64, vld1q_u16, vld1q_u8, vmovn_u16, vmvnq_u8, vqmovn_u16, vqtbl1q_u8,
    vreinterpret_u64_u8, vreinterpretq_u16_u8, vshrn_n_u16, vshrq_n_u8, vtstq_u8,
};

/// A 16 x u8 vector and the handful of operations the nibble-bitmask scan needs.
///
/// # Safety
/// Hardware implementations must only be used from code compiled with (or
/// dispatched after detecting) their target features. Load functions read 16
/// bytes (or 2 x 8 code units) starting at the given pointers.
pub trait Lanes: Copy {
    unsafe fn splat(byte: u8) -> Self;

    unsafe fn from_array(bytes: &[u8; LANES_BYTES]) -> Self;

    unsafe fn load(ptr: *const u8) -> Self;

    /// Loads 8 code units from `lo` and 8 from `hi` and narrows them into one
    /// byte vector with unsigned saturation: units above 0xFF become 0xFF.
    unsafe fn load_narrowed(lo: *const u16, hi: *const u16) -> Self;

    /// Like [`Lanes::load_narrowed`], also returning a byte mask that is set
    /// where the 16-bit code unit was below 0x80.
    unsafe fn load_narrowed_ascii(lo: *const u16, hi: *const u16) -> (Self, Self);

    /// 0xFF where the byte is below 0x80.
    unsafe fn ascii(self) -> Self;

    unsafe fn and(self, other: Self) -> Self;

    unsafe fn not(self) -> Self;

    /// `(self >> 4) & 0xF` per byte.
    unsafe fn high_nibbles(self) -> Self;

    /// `table[indices[i]]` per byte; every index is in `0..16`.
    unsafe fn shuffle(table: Self, indices: Self) -> Self;

    /// 0xFF where the byte is non-zero.
    unsafe fn nonzero(self) -> Self;

    /// Index of the first lane that is set, if any.
    unsafe fn first_set(self) -> Option<usize>;
}

// =============================================================================
// PORTABLE
// =============================================================================

/// Software lanes. Slower than a scalar loop, but bit-identical to the hardware
/// backends, which makes it the reference for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortableLanes(pub [u8; LANES_BYTES]);

impl PortableLanes {
    #[inline(always)]
    fn map(self, f: impl Fn(u8) -> u8) -> Self {
        let mut out = [0u8; LANES_BYTES];
        for i in 0..LANES_BYTES {
            out[i] = f(self.0[i]);
        }
        PortableLanes(out)
    }

    #[inline(always)]
    fn zip(self, other: Self, f: impl Fn(u8, u8) -> u8) -> Self {
        let mut out = [0u8; LANES_BYTES];
        for i in 0..LANES_BYTES {
            out[i] = f(self.0[i], other.0[i]);
        }
        PortableLanes(out)
    }

    #[inline(always)]
    unsafe fn load_units(lo: *const u16, hi: *const u16) -> [u16; LANES_BYTES] {
        let mut units = [0u16; LANES_BYTES];
        for i in 0..LANES_U16 {
            units[i] = lo.add(i).read_unaligned();
            units[LANES_U16 + i] = hi.add(i).read_unaligned();
        }
        units
    }
}

impl Lanes for PortableLanes {
    #[inline(always)]
    unsafe fn splat(byte: u8) -> Self {
        PortableLanes([byte; LANES_BYTES])
    }

    #[inline(always)]
    unsafe fn from_array(bytes: &[u8; LANES_BYTES]) -> Self {
        PortableLanes(*bytes)
    }

    #[inline(always)]
    unsafe fn load(ptr: *const u8) -> Self {
        PortableLanes((ptr as *const [u8; LANES_BYTES]).read_unaligned())
    }

    #[inline(always)]
    unsafe fn load_narrowed(lo: *const u16, hi: *const u16) -> Self {
        let units = Self::load_units(lo, hi);
        let mut out = [0u8; LANES_BYTES];
        for i in 0..LANES_BYTES {
            out[i] = units[i].min(0xFF) as u8;
        }
        PortableLanes(out)
    }

    #[inline(always)]
    unsafe fn load_narrowed_ascii(lo: *const u16, hi: *const u16) -> (Self, Self) {
        let units = Self::load_units(lo, hi);
        let mut narrowed = [0u8; LANES_BYTES];
        let mut ascii = [0u8; LANES_BYTES];
        for i in 0..LANES_BYTES {
            narrowed[i] = units[i].min(0xFF) as u8;
            ascii[i] = if units[i] & ASCII_MASK_U16 == 0 { 0xFF } else { 0 };
        }
        (PortableLanes(narrowed), PortableLanes(ascii))
    }

    #[inline(always)]
    unsafe fn ascii(self) -> Self {
        self.map(|b| if b < 0x80 { 0xFF } else { 0 })
    }

    #[inline(always)]
    unsafe fn and(self, other: Self) -> Self {
        self.zip(other, |a, b| a & b)
    }

    #[inline(always)]
    unsafe fn not(self) -> Self {
        self.map(|b| !b)
    }

    #[inline(always)]
    unsafe fn high_nibbles(self) -> Self {
        self.map(|b| b >> 4)
    }

    #[inline(always)]
    unsafe fn shuffle(table: Self, indices: Self) -> Self {
        indices.map(|i| table.0[(i & 0x0F) as usize])
    }

    #[inline(always)]
    unsafe fn nonzero(self) -> Self {
        self.map(|b| if b != 0 { 0xFF } else { 0 })
    }

    #[inline(always)]
    unsafe fn first_set(self) -> Option<usize> {
        self.0.iter().position(|&b| b != 0)
    }
}

// =============================================================================
// SSE4.1
// =============================================================================

/// SSE2 + SSSE3 + SSE4.1 lanes.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[derive(Debug, Clone, Copy)]
pub struct Sse41Lanes(__m128i);

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
impl Sse41Lanes {
    #[inline(always)]
    unsafe fn load_u16_pair(lo: *const u16, hi: *const u16) -> (__m128i, __m128i) {
        (
            _mm_loadu_si128(lo as *const __m128i),
            _mm_loadu_si128(hi as *const __m128i),
        )
    }

    #[inline(always)]
    unsafe fn narrow(source0: __m128i, source1: __m128i) -> __m128i {
        // packus treats its input as signed, so clamp to 0xFF first: otherwise
        // units >= 0x8000 would saturate to 0 instead of 0xFF.
        let max = _mm_set1_epi16(0xFF);
        _mm_packus_epi16(_mm_min_epu16(source0, max), _mm_min_epu16(source1, max))
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
impl Lanes for Sse41Lanes {
    #[inline(always)]
    unsafe fn splat(byte: u8) -> Self {
        Sse41Lanes(_mm_set1_epi8(byte as i8))
    }

    #[inline(always)]
    unsafe fn from_array(bytes: &[u8; LANES_BYTES]) -> Self {
        Sse41Lanes(_mm_loadu_si128(bytes.as_ptr() as *const __m128i))
    }

    #[inline(always)]
    unsafe fn load(ptr: *const u8) -> Self {
        Sse41Lanes(_mm_loadu_si128(ptr as *const __m128i))
    }

    #[inline(always)]
    unsafe fn load_narrowed(lo: *const u16, hi: *const u16) -> Self {
        let (source0, source1) = Self::load_u16_pair(lo, hi);
        Sse41Lanes(Self::narrow(source0, source1))
    }

    #[inline(always)]
    unsafe fn load_narrowed_ascii(lo: *const u16, hi: *const u16) -> (Self, Self) {
        let (source0, source1) = Self::load_u16_pair(lo, hi);
        let non_ascii = _mm_set1_epi16(ASCII_MASK_U16 as i16);
        let zero = _mm_setzero_si128();
        let ascii0 = _mm_cmpeq_epi16(_mm_and_si128(source0, non_ascii), zero);
        let ascii1 = _mm_cmpeq_epi16(_mm_and_si128(source1, non_ascii), zero);
        // 0xFFFF is -1 as i16 and survives signed saturation as 0xFF.
        (
            Sse41Lanes(Self::narrow(source0, source1)),
            Sse41Lanes(_mm_packs_epi16(ascii0, ascii1)),
        )
    }

    #[inline(always)]
    unsafe fn ascii(self) -> Self {
        Sse41Lanes(_mm_cmpgt_epi8(self.0, _mm_set1_epi8(-1)))
    }

    #[inline(always)]
    unsafe fn and(self, other: Self) -> Self {
        Sse41Lanes(_mm_and_si128(self.0, other.0))
    }

    #[inline(always)]
    unsafe fn not(self) -> Self {
        Sse41Lanes(_mm_xor_si128(self.0, _mm_set1_epi8(-1)))
    }

    #[inline(always)]
    unsafe fn high_nibbles(self) -> Self {
        // There is no 8-bit shift, the 16-bit one drags bits in from the
        // neighbouring byte which the mask removes again.
        Sse41Lanes(_mm_and_si128(_mm_srli_epi16(self.0, 4), _mm_set1_epi8(0x0F)))
    }

    #[inline(always)]
    unsafe fn shuffle(table: Self, indices: Self) -> Self {
        Sse41Lanes(_mm_shuffle_epi8(table.0, indices.0))
    }

    #[inline(always)]
    unsafe fn nonzero(self) -> Self {
        Sse41Lanes(_mm_cmpeq_epi8(self.0, _mm_setzero_si128())).not()
    }

    #[inline(always)]
    unsafe fn first_set(self) -> Option<usize> {
        let mask = _mm_movemask_epi8(self.0) as u32;
        if mask == 0 {
            None
        } else {
            Some(mask.trailing_zeros() as usize)
        }
    }
}

// =============================================================================
// NEON
// =============================================================================

/// AArch64 NEON lanes.
#[cfg(target_arch = "aarch64")]
#[derive(Debug, Clone, Copy)]
pub struct NeonLanes(uint8x16_t);

#[cfg(target_arch = "aarch64")]
impl Lanes for NeonLanes {
    #[inline(always)]
    unsafe fn splat(byte: u8) -> Self {
        NeonLanes(vdupq_n_u8(byte))
    }

    #[inline(always)]
    unsafe fn from_array(bytes: &[u8; LANES_BYTES]) -> Self {
        NeonLanes(vld1q_u8(bytes.as_ptr()))
    }

    #[inline(always)]
    unsafe fn load(ptr: *const u8) -> Self {
        NeonLanes(vld1q_u8(ptr))
    }

    #[inline(always)]
    unsafe fn load_narrowed(lo: *const u16, hi: *const u16) -> Self {
        NeonLanes(vcombine_u8(
            vqmovn_u16(vld1q_u16(lo)),
            vqmovn_u16(vld1q_u16(hi)),
        ))
    }

    #[inline(always)]
    unsafe fn load_narrowed_ascii(lo: *const u16, hi: *const u16) -> (Self, Self) {
        let source0 = vld1q_u16(lo);
        let source1 = vld1q_u16(hi);
        let non_ascii = vdupq_n_u16(ASCII_MASK_U16);
        let zero = vdupq_n_u16(0);
        let ascii0 = vceqq_u16(vandq_u16(source0, non_ascii), zero);
        let ascii1 = vceqq_u16(vandq_u16(source1, non_ascii), zero);
        (
            NeonLanes(vcombine_u8(vqmovn_u16(source0), vqmovn_u16(source1))),
            NeonLanes(vcombine_u8(vmovn_u16(ascii0), vmovn_u16(ascii1))),
        )
    }

    #[inline(always)]
    unsafe fn ascii(self) -> Self {
        NeonLanes(vcltq_u8(self.0, vdupq_n_u8(0x80)))
    }

    #[inline(always)]
    unsafe fn and(self, other: Self) -> Self {
        NeonLanes(vandq_u8(self.0, other.0))
    }

    #[inline(always)]
    unsafe fn not(self) -> Self {
        NeonLanes(vmvnq_u8(self.0))
    }

    #[inline(always)]
    unsafe fn high_nibbles(self) -> Self {
        NeonLanes(vshrq_n_u8(self.0, 4))
    }

    #[inline(always)]
    unsafe fn shuffle(table: Self, indices: Self) -> Self {
        NeonLanes(vqtbl1q_u8(table.0, indices.0))
    }

    #[inline(always)]
    unsafe fn nonzero(self) -> Self {
        NeonLanes(vtstq_u8(self.0, self.0))
    }

    #[inline(always)]
    unsafe fn first_set(self) -> Option<usize> {
        // No movemask on NEON: shift-narrow packs 4 bits per lane into a u64.
        let nibbles = vshrn_n_u16(vreinterpretq_u16_u8(self.0), 4);
        let bits = vget_lane_u64(vreinterpret_u64_u8(nibbles), 0);
        if bits == 0 {
            None
        } else {
            Some((bits.trailing_zeros() / 4) as usize)
        }
    }
}
