// SPDX-License-Identifier: Apache-2.0

//! Scan policy
//!
//! A scan classifies every element as "member" or "not member" of a set and
//! reports the first element the policy asks for:
//!
//! - [`Include`] reports the first member ("find first allowed")
//! - [`Exclude`] reports the first non-member ("find first disallowed")
//!
//! The policy is a type parameter of every scanner. Scalar and vectorized code
//! both go through [`Negator`], so the two paths cannot disagree on polarity.

use serde::{Deserialize, Serialize};

use crate::lanes::Lanes;

/// Turns a membership result into a "report this element" result.
pub trait Negator: Copy + Default + 'static {
    const POLICY: ScanPolicy;

    fn negate_if_needed(is_member: bool) -> bool;

    /// Vector form of [`Negator::negate_if_needed`] over 0x00/0xFF lanes.
    ///
    /// # Safety
    /// Same requirements as the [`Lanes`] implementation in use.
    unsafe fn negate_lanes_if_needed<V: Lanes>(accepted: V) -> V;
}

/// Report members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Include;

/// Report non-members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Exclude;

impl Negator for Include {
    const POLICY: ScanPolicy = ScanPolicy::Include;

    #[inline(always)]
    fn negate_if_needed(is_member: bool) -> bool {
        is_member
    }

    #[inline(always)]
    unsafe fn negate_lanes_if_needed<V: Lanes>(accepted: V) -> V {
        accepted
    }
}

impl Negator for Exclude {
    const POLICY: ScanPolicy = ScanPolicy::Exclude;

    #[inline(always)]
    fn negate_if_needed(is_member: bool) -> bool {
        !is_member
    }

    #[inline(always)]
    unsafe fn negate_lanes_if_needed<V: Lanes>(accepted: V) -> V {
        accepted.not()
    }
}

/// Runtime counterpart of the [`Negator`] types, stored with a registered set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPolicy {
    Include,
    #[default]
    Exclude,
}

impl ScanPolicy {
    #[inline]
    pub fn is_exclude(self) -> bool {
        self == ScanPolicy::Exclude
    }

    /// The opposite policy.
    #[inline]
    pub fn inverted(self) -> Self {
        match self {
            ScanPolicy::Include => ScanPolicy::Exclude,
            ScanPolicy::Exclude => ScanPolicy::Include,
        }
    }

    /// Applies the policy to a membership result.
    #[inline]
    pub fn reports(self, is_member: bool) -> bool {
        match self {
            ScanPolicy::Include => Include::negate_if_needed(is_member),
            ScanPolicy::Exclude => Exclude::negate_if_needed(is_member),
        }
    }
}
