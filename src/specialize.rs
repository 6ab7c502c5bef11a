// SPDX-License-Identifier: Apache-2.0

//! Strategy selection
//!
//! A set is registered once: its tables are compiled, a [`ScanStrategy`] is
//! chosen, and both are stored in a [`CompiledSet`]. Scans never re-decide.
//!
//! | set                                   | strategy                 |
//! |---------------------------------------|--------------------------|
//! | at most 5 distinct members            | `NativeSmallSet`         |
//! | any member >= 0x80                    | `Scalar`                 |
//! | otherwise, extended + Exclude         | `VectorizedExtended`     |
//! | otherwise                             | `Vectorized`             |

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::charset::{CharacterSet, Membership, SetTables};
use crate::constants::{LANES_BYTES, LANES_U16, NATIVE_SMALL_SET_MAX, TABLE_SIZE};
use crate::dispatch::{ScanUnit, SimdBackend};
use crate::policy::{Exclude, Include, Negator, ScanPolicy};
use crate::scan;
use crate::types::{CharsetError, Result, ScanStrategy};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Tunables for [`select_strategy`] and for the scans of the resulting set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecializerConfig {
    /// Sets with at most this many members use the compare chain. Values
    /// above 5 are clamped.
    pub small_set_max: usize,
    /// Byte inputs shorter than this are scanned with the scalar loop.
    pub min_vector_bytes: usize,
    /// Code-unit inputs shorter than this are scanned with the scalar loop.
    pub min_vector_code_units: usize,
    /// Never pick a vectorized strategy.
    pub force_scalar: bool,
}

impl Default for SpecializerConfig {
    fn default() -> Self {
        SpecializerConfig {
            small_set_max: NATIVE_SMALL_SET_MAX,
            min_vector_bytes: LANES_BYTES,
            min_vector_code_units: LANES_U16,
            force_scalar: false,
        }
    }
}

impl SpecializerConfig {
    pub fn effective_small_set_max(&self) -> usize {
        if self.small_set_max > NATIVE_SMALL_SET_MAX {
            trace!(
                "SPECIALIZER CONFIG: small_set_max={} clamped to {}",
                self.small_set_max,
                NATIVE_SMALL_SET_MAX
            );
            return NATIVE_SMALL_SET_MAX;
        }
        self.small_set_max
    }

    pub fn effective_min_vector_bytes(&self) -> usize {
        if self.min_vector_bytes < LANES_BYTES {
            trace!(
                "SPECIALIZER CONFIG: min_vector_bytes={} raised to {}",
                self.min_vector_bytes,
                LANES_BYTES
            );
            return LANES_BYTES;
        }
        self.min_vector_bytes
    }

    pub fn effective_min_vector_code_units(&self) -> usize {
        if self.min_vector_code_units < LANES_U16 {
            trace!(
                "SPECIALIZER CONFIG: min_vector_code_units={} raised to {}",
                self.min_vector_code_units,
                LANES_U16
            );
            return LANES_U16;
        }
        self.min_vector_code_units
    }
}

/// Picks the strategy for `set`.
///
/// Fails only for `allow_extended` with [`ScanPolicy::Include`]: "never report
/// non-ASCII" is meaningless when members are what gets reported.
pub fn select_strategy(
    set: &CharacterSet,
    policy: ScanPolicy,
    allow_extended: bool,
    config: &SpecializerConfig,
) -> Result<ScanStrategy> {
    if allow_extended && !policy.is_exclude() {
        return Err(CharsetError::ExtendedRequiresExclude);
    }

    let strategy = if set.len() <= config.effective_small_set_max() {
        ScanStrategy::NativeSmallSet
    } else if !set.is_ascii() || config.force_scalar {
        ScanStrategy::Scalar
    } else if allow_extended {
        ScanStrategy::VectorizedExtended
    } else {
        ScanStrategy::Vectorized
    };

    debug!(
        "SPECIALIZE: members={} ascii={} policy={:?} extended={} -> {:?}",
        set.len(),
        set.is_ascii(),
        policy,
        allow_extended,
        strategy
    );
    Ok(strategy)
}

// =============================================================================
// NATIVE SMALL SET
// =============================================================================

/// Up to five members compared one after the other.
///
/// Unused slots repeat the first member, so the chain is always five
/// comparisons long and needs no length check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SmallSet {
    members: [u16; NATIVE_SMALL_SET_MAX],
    len: usize,
}

impl SmallSet {
    pub fn new(set: &CharacterSet) -> Result<Self> {
        let members = set.members();
        if members.len() > NATIVE_SMALL_SET_MAX {
            return Err(CharsetError::NotASmallSet(members.len()));
        }

        let mut slots = [members[0]; NATIVE_SMALL_SET_MAX];
        slots[..members.len()].copy_from_slice(members);
        Ok(SmallSet {
            members: slots,
            len: members.len(),
        })
    }

    pub fn members(&self) -> &[u16] {
        &self.members[..self.len]
    }
}

impl Membership for SmallSet {
    #[inline(always)]
    fn contains(&self, code_point: u16) -> bool {
        let m = &self.members;
        code_point == m[0]
            || code_point == m[1]
            || code_point == m[2]
            || code_point == m[3]
            || code_point == m[4]
    }
}

// =============================================================================
// COMPILED SET
// =============================================================================

/// A set ready to scan: members, tables, policy and strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledSet {
    set: CharacterSet,
    tables: SetTables,
    small: Option<SmallSet>,
    policy: ScanPolicy,
    allow_extended: bool,
    strategy: ScanStrategy,
    min_vector_bytes: usize,
    min_vector_code_units: usize,
}

impl CompiledSet {
    /// Registers `set` with the default configuration.
    pub fn new(set: CharacterSet, policy: ScanPolicy, allow_extended: bool) -> Result<Self> {
        Self::with_config(set, policy, allow_extended, &SpecializerConfig::default())
    }

    pub fn with_config(
        set: CharacterSet,
        policy: ScanPolicy,
        allow_extended: bool,
        config: &SpecializerConfig,
    ) -> Result<Self> {
        let strategy = select_strategy(&set, policy, allow_extended, config)?;
        Self::assemble(set, policy, allow_extended, strategy, config)
    }

    /// Registers `set` with a caller-chosen strategy. `VectorizedExtended`
    /// implies the extended reading.
    pub fn with_strategy(
        set: CharacterSet,
        policy: ScanPolicy,
        strategy: ScanStrategy,
    ) -> Result<Self> {
        let allow_extended = strategy == ScanStrategy::VectorizedExtended;
        if allow_extended && !policy.is_exclude() {
            return Err(CharsetError::ExtendedRequiresExclude);
        }
        if strategy.is_vectorized() {
            if let Some(c) = set.first_non_ascii() {
                return Err(CharsetError::NonAsciiVectorized(c));
            }
        }
        Self::assemble(
            set,
            policy,
            allow_extended,
            strategy,
            &SpecializerConfig::default(),
        )
    }

    /// Registers a set literal such as `"[0-9A-Fa-f]"`.
    pub fn from_literal(literal: &str, policy: ScanPolicy, allow_extended: bool) -> Result<Self> {
        Self::new(CharacterSet::parse(literal)?, policy, allow_extended)
    }

    fn assemble(
        set: CharacterSet,
        policy: ScanPolicy,
        allow_extended: bool,
        strategy: ScanStrategy,
        config: &SpecializerConfig,
    ) -> Result<Self> {
        let small = match strategy {
            ScanStrategy::NativeSmallSet => Some(SmallSet::new(&set)?),
            _ => None,
        };

        Ok(CompiledSet {
            tables: set.tables(),
            set,
            small,
            policy,
            allow_extended,
            strategy,
            min_vector_bytes: config.effective_min_vector_bytes(),
            min_vector_code_units: config.effective_min_vector_code_units(),
        })
    }

    #[inline]
    pub fn set(&self) -> &CharacterSet {
        &self.set
    }

    #[inline]
    pub fn tables(&self) -> &SetTables {
        &self.tables
    }

    #[inline]
    pub fn policy(&self) -> ScanPolicy {
        self.policy
    }

    #[inline]
    pub fn allows_extended(&self) -> bool {
        self.allow_extended
    }

    #[inline]
    pub fn strategy(&self) -> ScanStrategy {
        self.strategy
    }

    /// Scans bytes with the policy and extended reading chosen at registration.
    pub fn index_of(&self, bytes: &[u8]) -> Option<usize> {
        self.index_of_units(bytes)
    }

    /// Code-unit form of [`CompiledSet::index_of`].
    pub fn index_of_u16(&self, code_units: &[u16]) -> Option<usize> {
        self.index_of_units(code_units)
    }

    fn index_of_units<T: ScanUnit>(&self, input: &[T]) -> Option<usize> {
        match (self.policy, self.allow_extended) {
            (ScanPolicy::Exclude, true) => self.find_extended(input),
            (ScanPolicy::Exclude, false) => self.find::<Exclude, T>(input),
            (ScanPolicy::Include, _) => self.find::<Include, T>(input),
        }
    }

    /// First element reported by policy `N`, whatever policy the set was
    /// registered with.
    pub fn find<N: Negator, T: ScanUnit>(&self, input: &[T]) -> Option<usize> {
        match self.strategy {
            ScanStrategy::NativeSmallSet => match &self.small {
                Some(small) => scan::index_of_match_scalar::<N, _, _>(input, small),
                None => scan::index_of_match_scalar::<N, _, _>(input, self),
            },
            ScanStrategy::Scalar => scan::index_of_match_scalar::<N, _, _>(input, self),
            ScanStrategy::Vectorized | ScanStrategy::VectorizedExtended => {
                if input.len() < self.min_vector_len::<T>() {
                    return scan::index_of_match_scalar::<N, _, _>(input, &self.tables.lookup);
                }
                T::index_of_match_on::<N>(SimdBackend::detect(), input, &self.tables)
            }
        }
    }

    /// First ASCII element outside the set; elements >= 0x80 are never reported.
    pub fn find_extended<T: ScanUnit>(&self, input: &[T]) -> Option<usize> {
        match self.strategy {
            ScanStrategy::NativeSmallSet => match &self.small {
                Some(small) => scan::index_of_invalid_extended_scalar(input, small),
                None => scan::index_of_invalid_extended_scalar(input, self),
            },
            ScanStrategy::Scalar => scan::index_of_invalid_extended_scalar(input, self),
            ScanStrategy::Vectorized | ScanStrategy::VectorizedExtended => {
                if input.len() < self.min_vector_len::<T>() {
                    return scan::index_of_invalid_extended_scalar(input, &self.tables.lookup);
                }
                T::index_of_invalid_extended_on(SimdBackend::detect(), input, &self.tables)
            }
        }
    }

    #[inline(always)]
    fn min_vector_len<T: ScanUnit>(&self) -> usize {
        if T::LANES == LANES_BYTES {
            self.min_vector_bytes
        } else {
            self.min_vector_code_units
        }
    }
}

impl Membership for CompiledSet {
    #[inline]
    fn contains(&self, code_point: u16) -> bool {
        if (code_point as usize) < TABLE_SIZE {
            return self.tables.lookup.contains(code_point);
        }
        self.set
            .non_ascii_members()
            .binary_search(&code_point)
            .is_ok()
    }
}

// =============================================================================
// REGISTRATION
// =============================================================================

/// A set registration as it appears in configuration.
///
/// ```rust
/// use charscan::{ScanStrategy, SetRegistration, SpecializerConfig};
///
/// let registration: SetRegistration =
///     serde_json::from_str(r#"{ "literal": "[0-9A-Fa-f]", "policy": "exclude" }"#).unwrap();
/// let hex = registration.compile(&SpecializerConfig::default()).unwrap();
/// assert_eq!(hex.strategy(), ScanStrategy::Vectorized);
/// assert_eq!(hex.index_of(b"deadbeefcafebabe!"), Some(16));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRegistration {
    pub literal: String,
    #[serde(default)]
    pub policy: ScanPolicy,
    #[serde(default)]
    pub allow_extended: bool,
}

impl SetRegistration {
    pub fn compile(&self, config: &SpecializerConfig) -> Result<CompiledSet> {
        CompiledSet::with_config(
            CharacterSet::parse(&self.literal)?,
            self.policy,
            self.allow_extended,
            config,
        )
    }
}
