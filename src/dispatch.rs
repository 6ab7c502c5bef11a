// SPDX-License-Identifier: Apache-2.0

//! # Scan dispatch
//!
//! This module chooses between the scalar scanners and the hardware-accelerated
//! backends based on target capabilities, the strategy stored with a
//! [`CompiledSet`], and input sizes.
//!
//! Backend detection runs once per process and is cached. Nothing on the scan
//! path logs or allocates.

use std::sync::atomic::{AtomicU8, Ordering};

use log::debug;

use super::constants::*;

#[cfg(target_arch = "aarch64")]
use std::arch::is_aarch64_feature_detected;

use crate::charset::SetTables;
use crate::policy::{Exclude, Include, Negator};
use crate::scan;
use crate::specialize::CompiledSet;
use crate::types::CodeUnit;

// =============================================================================
//  HARDWARE DETECTION & SIMD CAPABILITIES
// =============================================================================

/// Hardware capability detection used by the dispatch layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareCapabilities {
    pub has_sse41: bool,
    pub has_neon: bool,
}

impl HardwareCapabilities {
    #[inline]
    pub fn detect() -> Self {
        HardwareCapabilities {
            has_sse41: Self::detect_sse41(),
            has_neon: Self::detect_neon(),
        }
    }

    fn detect_sse41() -> bool {
        #[allow(unused_mut)]
        let mut detected_sse41 = false;

        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        if is_x86_feature_detected!("ssse3") && is_x86_feature_detected!("sse4.1") {
            detected_sse41 = true;
        }

        detected_sse41
    }

    fn detect_neon() -> bool {
        #[allow(unused_mut)]
        let mut detected_neon = false;

        #[cfg(target_arch = "aarch64")]
        if is_aarch64_feature_detected!("neon") {
            detected_neon = true;
        }

        detected_neon
    }
}

/// Get information about available SIMD capabilities
#[inline]
pub fn get_hw_capabilities() -> HardwareCapabilities {
    HardwareCapabilities::detect()
}

/// Check if a specific SIMD instruction set is available
#[inline]
pub fn has_hw_support(instruction_set: &str) -> bool {
    match instruction_set {
        "sse4.1" | "sse41" => get_hw_capabilities().has_sse41,
        "neon" => get_hw_capabilities().has_neon,
        "portable" => true,
        _ => false,
    }
}

// =============================================================================
//  BACKEND SELECTION
// =============================================================================

/// Implementation a vectorized scan runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimdBackend {
    /// No vector code at all.
    Scalar,
    /// [`PortableLanes`](crate::lanes::PortableLanes): same results as the
    /// hardware backends on any target.
    Portable,
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    Sse41,
    #[cfg(target_arch = "aarch64")]
    Neon,
}

const BACKEND_UNKNOWN: u8 = u8::MAX;
const BACKEND_SCALAR: u8 = 0;
const BACKEND_PORTABLE: u8 = 1;
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
const BACKEND_SSE41: u8 = 2;
#[cfg(target_arch = "aarch64")]
const BACKEND_NEON: u8 = 3;

static DETECTED_BACKEND: AtomicU8 = AtomicU8::new(BACKEND_UNKNOWN);

impl SimdBackend {
    /// The fastest backend this process can run, detected once and cached.
    ///
    /// Targets without a hardware backend (and builds with `disable-simd`)
    /// get [`SimdBackend::Scalar`]: the portable lanes are a reference, not a
    /// speedup.
    pub fn detect() -> Self {
        let cached = DETECTED_BACKEND.load(Ordering::Relaxed);
        if cached != BACKEND_UNKNOWN {
            return Self::from_code(cached);
        }

        let backend = Self::probe();
        debug!(
            "SCAN BACKEND: selected {} (caps={:?})",
            backend.name(),
            get_hw_capabilities()
        );
        DETECTED_BACKEND.store(backend.code(), Ordering::Relaxed);
        backend
    }

    fn probe() -> Self {
        if cfg!(feature = "disable-simd") {
            return SimdBackend::Scalar;
        }

        #[allow(unused_variables)]
        let caps = get_hw_capabilities();

        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        if caps.has_sse41 {
            return SimdBackend::Sse41;
        }

        #[cfg(target_arch = "aarch64")]
        if caps.has_neon {
            return SimdBackend::Neon;
        }

        SimdBackend::Scalar
    }

    /// Every backend that can run here, scalar first.
    pub fn available() -> Vec<Self> {
        let mut backends = vec![SimdBackend::Scalar, SimdBackend::Portable];

        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        if SimdBackend::Sse41.is_supported() {
            backends.push(SimdBackend::Sse41);
        }

        #[cfg(target_arch = "aarch64")]
        if SimdBackend::Neon.is_supported() {
            backends.push(SimdBackend::Neon);
        }

        backends
    }

    #[inline]
    pub fn is_supported(self) -> bool {
        match self {
            SimdBackend::Scalar | SimdBackend::Portable => true,
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            SimdBackend::Sse41 => get_hw_capabilities().has_sse41,
            #[cfg(target_arch = "aarch64")]
            SimdBackend::Neon => get_hw_capabilities().has_neon,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SimdBackend::Scalar => "scalar",
            SimdBackend::Portable => "portable",
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            SimdBackend::Sse41 => "sse4.1",
            #[cfg(target_arch = "aarch64")]
            SimdBackend::Neon => "neon",
        }
    }

    fn code(self) -> u8 {
        match self {
            SimdBackend::Scalar => BACKEND_SCALAR,
            SimdBackend::Portable => BACKEND_PORTABLE,
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            SimdBackend::Sse41 => BACKEND_SSE41,
            #[cfg(target_arch = "aarch64")]
            SimdBackend::Neon => BACKEND_NEON,
        }
    }

    fn from_code(code: u8) -> Self {
        match code {
            BACKEND_PORTABLE => SimdBackend::Portable,
            #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
            BACKEND_SSE41 => SimdBackend::Sse41,
            #[cfg(target_arch = "aarch64")]
            BACKEND_NEON => SimdBackend::Neon,
            _ => SimdBackend::Scalar,
        }
    }
}

// =============================================================================
//  TABLE SCANS ON AN EXPLICIT BACKEND
// =============================================================================

// These run the nibble-bitmask scan of `tables` on `backend`. Inputs below the
// SIMD threshold, and backends this CPU cannot run, fall back to the scalar
// scanner over the lookup table, so the result never depends on the backend.

/// First element reported by policy `N`.
#[inline]
pub fn index_of_match_bytes_on<N: Negator>(
    backend: SimdBackend,
    input: &[u8],
    tables: &SetTables,
) -> Option<usize> {
    if input.len() < SIMD_THRESHOLD_BYTES || !backend.is_supported() {
        return scan::index_of_match_scalar::<N, _, _>(input, &tables.lookup);
    }

    match backend {
        SimdBackend::Scalar => scan::index_of_match_scalar::<N, _, _>(input, &tables.lookup),
        SimdBackend::Portable => unsafe {
            scan::index_of_match_bytes_portable::<N>(input, &tables.bitmask)
        },
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        SimdBackend::Sse41 => unsafe {
            scan::index_of_match_bytes_sse41::<N>(input, &tables.bitmask)
        },
        #[cfg(target_arch = "aarch64")]
        SimdBackend::Neon => unsafe {
            scan::index_of_match_bytes_neon::<N>(input, &tables.bitmask)
        },
    }
}

/// First code unit reported by policy `N`.
#[inline]
pub fn index_of_match_u16_on<N: Negator>(
    backend: SimdBackend,
    input: &[u16],
    tables: &SetTables,
) -> Option<usize> {
    if input.len() < SIMD_THRESHOLD_U16 || !backend.is_supported() {
        return scan::index_of_match_scalar::<N, _, _>(input, &tables.lookup);
    }

    match backend {
        SimdBackend::Scalar => scan::index_of_match_scalar::<N, _, _>(input, &tables.lookup),
        SimdBackend::Portable => unsafe {
            scan::index_of_match_u16_portable::<N>(input, &tables.bitmask)
        },
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        SimdBackend::Sse41 => unsafe {
            scan::index_of_match_u16_sse41::<N>(input, &tables.bitmask)
        },
        #[cfg(target_arch = "aarch64")]
        SimdBackend::Neon => unsafe { scan::index_of_match_u16_neon::<N>(input, &tables.bitmask) },
    }
}

/// First ASCII byte outside the set; bytes >= 0x80 are let through.
#[inline]
pub fn index_of_invalid_bytes_extended_on(
    backend: SimdBackend,
    input: &[u8],
    tables: &SetTables,
) -> Option<usize> {
    if input.len() < SIMD_THRESHOLD_BYTES || !backend.is_supported() {
        return scan::index_of_invalid_extended_scalar(input, &tables.lookup);
    }

    match backend {
        SimdBackend::Scalar => scan::index_of_invalid_extended_scalar(input, &tables.lookup),
        SimdBackend::Portable => unsafe {
            scan::index_of_invalid_bytes_extended_portable(input, &tables.bitmask)
        },
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        SimdBackend::Sse41 => unsafe {
            scan::index_of_invalid_bytes_extended_sse41(input, &tables.bitmask)
        },
        #[cfg(target_arch = "aarch64")]
        SimdBackend::Neon => unsafe {
            scan::index_of_invalid_bytes_extended_neon(input, &tables.bitmask)
        },
    }
}

/// First ASCII code unit outside the set; units >= 0x80 are let through.
#[inline]
pub fn index_of_invalid_u16_extended_on(
    backend: SimdBackend,
    input: &[u16],
    tables: &SetTables,
) -> Option<usize> {
    if input.len() < SIMD_THRESHOLD_U16 || !backend.is_supported() {
        return scan::index_of_invalid_extended_scalar(input, &tables.lookup);
    }

    match backend {
        SimdBackend::Scalar => scan::index_of_invalid_extended_scalar(input, &tables.lookup),
        SimdBackend::Portable => unsafe {
            scan::index_of_invalid_u16_extended_portable(input, &tables.bitmask)
        },
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        SimdBackend::Sse41 => unsafe {
            scan::index_of_invalid_u16_extended_sse41(input, &tables.bitmask)
        },
        #[cfg(target_arch = "aarch64")]
        SimdBackend::Neon => unsafe {
            scan::index_of_invalid_u16_extended_neon(input, &tables.bitmask)
        },
    }
}

/// Element types with a vectorized scan: bytes and UTF-16 code units.
pub trait ScanUnit: CodeUnit {
    /// Length below which the vector step is never taken for this element type.
    const LANES: usize;

    fn index_of_match_on<N: Negator>(
        backend: SimdBackend,
        input: &[Self],
        tables: &SetTables,
    ) -> Option<usize>;

    fn index_of_invalid_extended_on(
        backend: SimdBackend,
        input: &[Self],
        tables: &SetTables,
    ) -> Option<usize>;
}

impl ScanUnit for u8 {
    const LANES: usize = LANES_BYTES;

    #[inline(always)]
    fn index_of_match_on<N: Negator>(
        backend: SimdBackend,
        input: &[u8],
        tables: &SetTables,
    ) -> Option<usize> {
        index_of_match_bytes_on::<N>(backend, input, tables)
    }

    #[inline(always)]
    fn index_of_invalid_extended_on(
        backend: SimdBackend,
        input: &[u8],
        tables: &SetTables,
    ) -> Option<usize> {
        index_of_invalid_bytes_extended_on(backend, input, tables)
    }
}

impl ScanUnit for u16 {
    const LANES: usize = LANES_U16;

    #[inline(always)]
    fn index_of_match_on<N: Negator>(
        backend: SimdBackend,
        input: &[u16],
        tables: &SetTables,
    ) -> Option<usize> {
        index_of_match_u16_on::<N>(backend, input, tables)
    }

    #[inline(always)]
    fn index_of_invalid_extended_on(
        backend: SimdBackend,
        input: &[u16],
        tables: &SetTables,
    ) -> Option<usize> {
        index_of_invalid_u16_extended_on(backend, input, tables)
    }
}

// =============================================================================
//  COMPILED SET SCANS
// =============================================================================

/// True if any byte is outside `set`.
///
/// # Examples
/// ```rust
/// use charscan::{contains_disallowed, CharacterSet, CompiledSet, ScanPolicy};
///
/// let digits = CompiledSet::new(CharacterSet::parse("[0-9]")?, ScanPolicy::Exclude, false)?;
/// assert!(!contains_disallowed(b"20240611", &digits));
/// assert!(contains_disallowed(b"2024-06-11", &digits));
/// # Ok::<(), charscan::CharsetError>(())
/// ```
#[inline]
pub fn contains_disallowed(bytes: &[u8], set: &CompiledSet) -> bool {
    index_of_first_disallowed(bytes, set).is_some()
}

/// True if any code unit is outside `set`.
#[inline]
pub fn contains_disallowed_u16(code_units: &[u16], set: &CompiledSet) -> bool {
    index_of_first_disallowed_u16(code_units, set).is_some()
}

/// Index of the first byte outside `set`. Bytes >= 0x80 are outside every
/// ASCII set.
#[inline]
pub fn index_of_first_disallowed(bytes: &[u8], set: &CompiledSet) -> Option<usize> {
    set.find::<Exclude, u8>(bytes)
}

/// Index of the first code unit outside `set`.
#[inline]
pub fn index_of_first_disallowed_u16(code_units: &[u16], set: &CompiledSet) -> Option<usize> {
    set.find::<Exclude, u16>(code_units)
}

/// Index of the first code unit below 0x80 that is outside `set`; code units
/// >= 0x80 are never reported.
#[inline]
pub fn index_of_first_disallowed_extended_u16(
    code_units: &[u16],
    set: &CompiledSet,
) -> Option<usize> {
    set.find_extended::<u16>(code_units)
}

/// Byte form of [`index_of_first_disallowed_extended_u16`]: UTF-8 sequences
/// pass untouched.
#[inline]
pub fn index_of_first_disallowed_extended(bytes: &[u8], set: &CompiledSet) -> Option<usize> {
    set.find_extended::<u8>(bytes)
}

/// Index of the first byte inside `set`.
#[inline]
pub fn index_of_first_allowed(bytes: &[u8], set: &CompiledSet) -> Option<usize> {
    set.find::<Include, u8>(bytes)
}

/// Index of the first code unit inside `set`.
#[inline]
pub fn index_of_first_allowed_u16(code_units: &[u16], set: &CompiledSet) -> Option<usize> {
    set.find::<Include, u16>(code_units)
}
