// SPDX-License-Identifier: Apache-2.0

//! HTTP character sets
//!
//! Process-wide compiled sets for HTTP request validation and the named checks
//! built on them. Every set is ASCII-only and larger than the small-set limit,
//! so all of them scan with the vectorized strategy.
//!
//! - alphanumeric: `0-9 A-Z a-z` (RFC 5234 ALPHA / DIGIT)
//! - authority: alphanumeric and `: . [ ] @` (RFC 3986 section 3.2)
//! - token: alphanumeric and ``! # $ % & ' * + - . ^ _ ` | ~`` (RFC 7230 tchar)
//! - host: alphanumeric and `! $ & ' ( ) - . _ ~`; RFC 3986 minus the
//!   characters Http.Sys rejects
//! - field value: `0x20..=0x7E` (RFC 7230 VCHAR and SP)
//!
//! ```rust
//! use charscan::http;
//!
//! assert!(!http::contains_invalid_authority_char(b"user@[fe80::]:8080"));
//! assert_eq!(http::index_of_invalid_token_byte(b"1234567\x01"), Some(7));
//! ```

use lazy_static::lazy_static;
use log::debug;

use crate::charset::CharacterSet;
use crate::dispatch::{
    contains_disallowed, index_of_first_disallowed, index_of_first_disallowed_extended,
    index_of_first_disallowed_extended_u16, index_of_first_disallowed_u16,
};
use crate::policy::ScanPolicy;
use crate::specialize::CompiledSet;
use crate::types::Result;

const AUTHORITY_SPECIFIC: &str = ":.[]@";
const TOKEN_SPECIFIC: &str = "!#$%&'*+-.^_`|~";
const HOST_SPECIFIC: &str = "!$&'()-._~";

fn alphanumeric() -> Result<CharacterSet> {
    CharacterSet::parse("[0-9A-Za-z]")
}

fn alphanumeric_with(extra: &str) -> Result<CharacterSet> {
    alphanumeric()?.union(&CharacterSet::from_chars(extra)?)
}

fn field_value() -> Result<CharacterSet> {
    CharacterSet::from_range(0x20, 0x7E)
}

fn compile(name: &str, set: Result<CharacterSet>) -> CompiledSet {
    set.and_then(|set| CompiledSet::new(set, ScanPolicy::Exclude, false))
        .unwrap_or_else(|e| panic!("predefined {} set is invalid: {}", name, e))
}

lazy_static! {
    pub static ref ALPHANUMERIC: CompiledSet = compile("alphanumeric", alphanumeric());
    pub static ref AUTHORITY: CompiledSet =
        compile("authority", alphanumeric_with(AUTHORITY_SPECIFIC));
    pub static ref TOKEN: CompiledSet = compile("token", alphanumeric_with(TOKEN_SPECIFIC));
    pub static ref HOST: CompiledSet = compile("host", alphanumeric_with(HOST_SPECIFIC));
    pub static ref FIELD_VALUE: CompiledSet = compile("field value", field_value());
}

/// Builds every predefined set now instead of on first use.
pub fn initialize() {
    for (name, set) in [
        ("alphanumeric", &*ALPHANUMERIC),
        ("authority", &*AUTHORITY),
        ("token", &*TOKEN),
        ("host", &*HOST),
        ("field value", &*FIELD_VALUE),
    ] {
        debug!(
            "HTTP SETS: {} members={} strategy={:?}",
            name,
            set.set().len(),
            set.strategy()
        );
    }
}

// =============================================================================
// CODE UNIT / BYTE CHECKS
// =============================================================================

#[inline]
pub fn contains_invalid_authority_char(bytes: &[u8]) -> bool {
    contains_disallowed(bytes, &AUTHORITY)
}

#[inline]
pub fn index_of_invalid_host_char(code_units: &[u16]) -> Option<usize> {
    index_of_first_disallowed_u16(code_units, &HOST)
}

#[inline]
pub fn index_of_invalid_token_char(code_units: &[u16]) -> Option<usize> {
    index_of_first_disallowed_u16(code_units, &TOKEN)
}

#[inline]
pub fn index_of_invalid_token_byte(bytes: &[u8]) -> Option<usize> {
    index_of_first_disallowed(bytes, &TOKEN)
}

#[inline]
pub fn index_of_invalid_field_value_char(code_units: &[u16]) -> Option<usize> {
    index_of_first_disallowed_u16(code_units, &FIELD_VALUE)
}

/// Like [`index_of_invalid_field_value_char`], but code units >= 0x80 are
/// accepted.
#[inline]
pub fn index_of_invalid_field_value_char_extended(code_units: &[u16]) -> Option<usize> {
    index_of_first_disallowed_extended_u16(code_units, &FIELD_VALUE)
}

// =============================================================================
// STR CONVENIENCES
// =============================================================================

// These scan the UTF-8 bytes and return byte offsets. Any non-ASCII character
// is invalid except in the extended field-value check.

#[inline]
pub fn contains_invalid_authority_str(s: &str) -> bool {
    contains_invalid_authority_char(s.as_bytes())
}

#[inline]
pub fn index_of_invalid_host_str(s: &str) -> Option<usize> {
    index_of_first_disallowed(s.as_bytes(), &HOST)
}

#[inline]
pub fn index_of_invalid_token_str(s: &str) -> Option<usize> {
    index_of_invalid_token_byte(s.as_bytes())
}

#[inline]
pub fn index_of_invalid_field_value_str(s: &str) -> Option<usize> {
    index_of_first_disallowed(s.as_bytes(), &FIELD_VALUE)
}

#[inline]
pub fn index_of_invalid_field_value_str_extended(s: &str) -> Option<usize> {
    index_of_first_disallowed_extended(s.as_bytes(), &FIELD_VALUE)
}
