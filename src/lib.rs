// SPDX-License-Identifier: Apache-2.0

//! charscan library
//!
//! Membership scans of byte and UTF-16 buffers against small ASCII character
//! sets, with a nibble-bitmask SIMD implementation and a scalar reference that
//! always agrees with it.
//!
//! - Character sets, lookup tables and packed bitmasks ([`charset`])
//! - Scalar and vectorized scanners ([`scan`], [`lanes`])
//! - Include / Exclude policies ([`policy`])
//! - Strategy selection per set ([`specialize`])
//! - Predefined HTTP sets and checks ([`http`])
//!
//! ## Hardware support
//! - **SSE4.1** on x86 / x86_64 and **NEON** on aarch64, detected at runtime
//! - A portable software backend with identical results on every target
//! - The `disable-simd` feature forces the scalar scanners everywhere
//!
//! ## Usage
//!
//! ```rust
//! use charscan::{CharacterSet, CompiledSet, ScanPolicy, ScanStrategy};
//!
//! let set = CharacterSet::parse("[0-9A-Za-z_-]")?;
//! let identifier = CompiledSet::new(set, ScanPolicy::Exclude, false)?;
//! assert_eq!(identifier.strategy(), ScanStrategy::Vectorized);
//!
//! assert_eq!(charscan::index_of_first_disallowed(b"request_id-42", &identifier), None);
//! assert_eq!(charscan::index_of_first_disallowed(b"request id", &identifier), Some(7));
//!
//! // Check available SIMD capabilities
//! let caps = charscan::get_hw_capabilities();
//! println!("Has SSE4.1: {}", caps.has_sse41);
//! # Ok::<(), charscan::CharsetError>(())
//! ```

#![allow(clippy::missing_safety_doc)]

pub mod charset;
pub mod constants;
pub mod dispatch;
pub mod http;
pub mod lanes;
pub mod policy;
pub mod scan;
pub mod specialize;
pub mod types;

pub use types::*;

#[cfg(test)]
pub mod test_utils;

#[cfg(test)]
#[path = "tests/charset_tests.rs"]
mod charset_tests;
#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod http_tests;
#[cfg(test)]
#[path = "tests/policy_tests.rs"]
mod policy_tests;
#[cfg(test)]
#[path = "tests/scan_tests.rs"]
mod scan_tests;
#[cfg(test)]
#[path = "tests/specialize_tests.rs"]
mod specialize_tests;

pub use charset::{build, build_tables, CharacterSet, LookupTable, Membership, PackedBitmask, SetTables};
pub use dispatch::*;
pub use policy::{Exclude, Include, Negator, ScanPolicy};
pub use specialize::{select_strategy, CompiledSet, SetRegistration, SmallSet, SpecializerConfig};
