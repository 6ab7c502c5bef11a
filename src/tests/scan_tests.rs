// SPDX-License-Identifier: Apache-2.0

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::charset::{CharacterSet, SetTables};
    use crate::dispatch::{
        index_of_invalid_bytes_extended_on, index_of_invalid_u16_extended_on,
        index_of_match_bytes_on, index_of_match_u16_on, SimdBackend,
    };
    use crate::policy::{Exclude, Include, Negator};
    use crate::scan::{index_of_invalid_extended_scalar, index_of_match_scalar};
    use crate::test_utils::config_test_logger;

    const LENGTHS: [usize; 7] = [1, 7, 8, 9, 15, 16, 113];
    const BYTE_LENGTHS: [usize; 11] = [1, 7, 8, 9, 15, 16, 17, 31, 32, 33, 113];

    /// Code units around every boundary the narrowing and the bitmask care about.
    const BOUNDARY_UNITS: [u16; 14] = [
        0x7F, 0x80, 0x81, 0xA5, 0xFF, 0x100, 0x101, 0x17F, 0x1FF, 0x2764, 0x7FFF, 0x8000,
        0xFF7F, 0xFFFF,
    ];

    fn token_set() -> CharacterSet {
        CharacterSet::parse("[0-9A-Za-z!#$%&'*+\\-.^_`|~]").unwrap()
    }

    fn test_sets() -> Vec<CharacterSet> {
        vec![
            token_set(),
            CharacterSet::parse("[0-9A-Za-z:.\\[\\]@]").unwrap(),
            CharacterSet::from_range(0x20, 0x7E).unwrap(),
            // Every high nibble 0..7 accepted for low nibble 1.
            CharacterSet::new((0..8).map(|h| (h << 4) | 1).chain(0x30..0x3A)).unwrap(),
            CharacterSet::from_range(0, 127).unwrap(),
        ]
    }

    /// A code unit every scan of `N` passes over.
    fn filler<N: Negator>(set: &CharacterSet) -> u16 {
        if N::POLICY.is_exclude() {
            set.members()[0]
        } else {
            // Include needs a non-member; 0x80 is never one of an ASCII table.
            (0..0x80).find(|c| !set.members().contains(c)).unwrap_or(0x80)
        }
    }

    /// Test helper - compares the SCALAR path against every vectorized backend
    fn check_u16_all_paths<N: Negator>(tables: &SetTables, input: &[u16]) {
        let expected = index_of_match_scalar::<N, _, _>(input, &tables.lookup);
        for backend in SimdBackend::available() {
            assert_eq!(
                index_of_match_u16_on::<N>(backend, input, tables),
                expected,
                "{:?} u16 path on {:?} diverged from SCALAR, len={}, input={:04X?}",
                N::POLICY,
                backend,
                input.len(),
                input
            );
        }

        if N::POLICY.is_exclude() {
            let expected = index_of_invalid_extended_scalar(input, &tables.lookup);
            for backend in SimdBackend::available() {
                assert_eq!(
                    index_of_invalid_u16_extended_on(backend, input, tables),
                    expected,
                    "extended u16 path on {:?} diverged from SCALAR, len={}, input={:04X?}",
                    backend,
                    input.len(),
                    input
                );
            }
        }
    }

    fn check_bytes_all_paths<N: Negator>(tables: &SetTables, input: &[u8]) {
        let expected = index_of_match_scalar::<N, _, _>(input, &tables.lookup);
        for backend in SimdBackend::available() {
            assert_eq!(
                index_of_match_bytes_on::<N>(backend, input, tables),
                expected,
                "{:?} byte path on {:?} diverged from SCALAR, len={}, input={:02X?}",
                N::POLICY,
                backend,
                input.len(),
                input
            );
        }

        if N::POLICY.is_exclude() {
            let expected = index_of_invalid_extended_scalar(input, &tables.lookup);
            for backend in SimdBackend::available() {
                assert_eq!(
                    index_of_invalid_bytes_extended_on(backend, input, tables),
                    expected,
                    "extended byte path on {:?} diverged from SCALAR, len={}, input={:02X?}",
                    backend,
                    input.len(),
                    input
                );
            }
        }
    }

    /// Every code unit 0..=0xFFFF in the last position, the way a trailing
    /// partial vector sees it.
    fn sweep_last_position<N: Negator>(set: &CharacterSet) {
        let tables = set.tables();
        let fill = filler::<N>(set);
        for len in LENGTHS {
            let mut input = vec![fill; len];
            for value in 0..=u16::MAX {
                input[len - 1] = value;
                check_u16_all_paths::<N>(&tables, &input);
            }
        }
    }

    /// Boundary code units and every byte value, in every position.
    fn sweep_all_positions<N: Negator>(set: &CharacterSet) {
        let tables = set.tables();
        let fill = filler::<N>(set);
        let values: Vec<u16> = (0..=0xFFu16).chain(BOUNDARY_UNITS).collect();

        for len in LENGTHS {
            let clean = vec![fill; len];
            check_u16_all_paths::<N>(&tables, &clean);
            for position in 0..len {
                let mut input = clean.clone();
                for &value in &values {
                    input[position] = value;
                    check_u16_all_paths::<N>(&tables, &input);
                }
            }
        }
    }

    fn sweep_bytes<N: Negator>(set: &CharacterSet) {
        let tables = set.tables();
        let fill = filler::<N>(set).min(0xFF) as u8;

        for len in BYTE_LENGTHS {
            let clean = vec![fill; len];
            check_bytes_all_paths::<N>(&tables, &clean);
            for position in 0..len {
                let mut input = clean.clone();
                for value in 0..=u8::MAX {
                    input[position] = value;
                    check_bytes_all_paths::<N>(&tables, &input);
                }
            }
        }
    }

    #[test]
    fn test_u16_every_value_last_position_exclude() {
        config_test_logger();
        sweep_last_position::<Exclude>(&token_set());
    }

    #[test]
    fn test_u16_every_value_last_position_include() {
        config_test_logger();
        sweep_last_position::<Include>(&token_set());
    }

    #[test]
    fn test_u16_every_position() {
        config_test_logger();
        for set in test_sets() {
            sweep_all_positions::<Exclude>(&set);
            sweep_all_positions::<Include>(&set);
        }
    }

    #[test]
    fn test_bytes_every_position() {
        config_test_logger();
        for set in test_sets() {
            sweep_bytes::<Exclude>(&set);
            sweep_bytes::<Include>(&set);
        }
    }

    #[test]
    fn test_tail_window_reports_absolute_index() {
        config_test_logger();
        let tables = token_set().tables();
        for backend in SimdBackend::available() {
            // 17 bytes: one full vector, then a window moved back to 1..17.
            let mut bytes = vec![b'a'; 17];
            bytes[16] = b' ';
            assert_eq!(index_of_match_bytes_on::<Exclude>(backend, &bytes, &tables), Some(16));
            bytes[16] = b'a';
            bytes[3] = b' ';
            assert_eq!(index_of_match_bytes_on::<Exclude>(backend, &bytes, &tables), Some(3));

            // 23 units: one 16-wide step, then a window moved back to 15..23.
            let mut units = vec![b'a' as u16; 23];
            units[22] = 0x2764;
            assert_eq!(index_of_match_u16_on::<Exclude>(backend, &units, &tables), Some(22));
            assert_eq!(index_of_invalid_u16_extended_on(backend, &units, &tables), None);

            // 12 units: one 8-wide step, then a window moved back to 4..12.
            let mut units = vec![b'a' as u16; 12];
            units[8] = b'"' as u16;
            units[11] = b' ' as u16;
            assert_eq!(index_of_match_u16_on::<Exclude>(backend, &units, &tables), Some(8));
            assert_eq!(index_of_match_u16_on::<Include>(backend, &units, &tables), Some(0));
        }
    }

    #[test]
    fn test_high_nibble_lanes_never_accept_non_ascii() {
        config_test_logger();
        // Lane 1 accepts every high nibble 0..7, so only the bit positions keep
        // 0x81, 0x91, .. 0xF1 out of the set.
        let set = CharacterSet::new((0..8).map(|h| (h << 4) | 1)).unwrap();
        let tables = set.tables();
        for backend in SimdBackend::available() {
            for high in 8..16u16 {
                let mut bytes = vec![0x01u8; 32];
                bytes[20] = ((high << 4) | 1) as u8;
                assert_eq!(
                    index_of_match_bytes_on::<Exclude>(backend, &bytes, &tables),
                    Some(20),
                    "byte {:#04X} on {:?}",
                    bytes[20],
                    backend
                );

                let mut units = vec![0x01u16; 32];
                units[20] = (high << 4) | 1;
                units[25] = 0xFF01;
                assert_eq!(index_of_match_u16_on::<Exclude>(backend, &units, &tables), Some(20));
                assert_eq!(index_of_match_u16_on::<Include>(backend, &units, &tables), Some(0));
            }
        }
    }

    #[test]
    fn test_extended_never_reports_non_ascii() {
        config_test_logger();
        let tables = token_set().tables();
        let units: Vec<u16> = (0x80..=u16::MAX).collect();
        for backend in SimdBackend::available() {
            assert_eq!(index_of_invalid_u16_extended_on(backend, &units, &tables), None);
            let mut with_space = units.clone();
            with_space[1000] = b' ' as u16;
            assert_eq!(
                index_of_invalid_u16_extended_on(backend, &with_space, &tables),
                Some(1000)
            );
        }

        let utf8 = "token\u{2764}\u{1F600}value\u{e9}".as_bytes();
        for backend in SimdBackend::available() {
            assert_eq!(index_of_invalid_bytes_extended_on(backend, utf8, &tables), None);
            assert_eq!(index_of_match_bytes_on::<Exclude>(backend, utf8, &tables), Some(5));
        }
    }

    #[test]
    fn test_empty_input() {
        config_test_logger();
        let tables = token_set().tables();
        for backend in SimdBackend::available() {
            assert_eq!(index_of_match_bytes_on::<Exclude>(backend, &[], &tables), None);
            assert_eq!(index_of_match_u16_on::<Include>(backend, &[], &tables), None);
            assert_eq!(index_of_invalid_bytes_extended_on(backend, &[], &tables), None);
            assert_eq!(index_of_invalid_u16_extended_on(backend, &[], &tables), None);
        }
    }

    /// Input mostly drawn from the set, with a random code unit roughly every
    /// sixteenth element.
    fn mixed_input(members: &[u16], raw: &[(u8, u16, usize)]) -> Vec<u16> {
        raw.iter()
            .map(|&(tag, value, pick)| {
                if tag == 0 {
                    value
                } else {
                    members[pick % members.len()]
                }
            })
            .collect()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_vectorized_matches_scalar(
            members in proptest::collection::vec(0u16..0x80, 1..64),
            raw in proptest::collection::vec((0u8..16, any::<u16>(), any::<usize>()), 0..300),
        ) {
            let set = CharacterSet::new(members).unwrap();
            let tables = set.tables();
            let units = mixed_input(set.members(), &raw);
            let bytes: Vec<u8> = units.iter().map(|&u| u as u8).collect();

            let exclude = index_of_match_scalar::<Exclude, _, _>(&units, &tables.lookup);
            let include = index_of_match_scalar::<Include, _, _>(&units, &tables.lookup);
            let extended = index_of_invalid_extended_scalar(&units, &tables.lookup);
            let exclude_bytes = index_of_match_scalar::<Exclude, _, _>(&bytes, &tables.lookup);
            let extended_bytes = index_of_invalid_extended_scalar(&bytes, &tables.lookup);

            for backend in SimdBackend::available() {
                prop_assert_eq!(index_of_match_u16_on::<Exclude>(backend, &units, &tables), exclude);
                prop_assert_eq!(index_of_match_u16_on::<Include>(backend, &units, &tables), include);
                prop_assert_eq!(index_of_invalid_u16_extended_on(backend, &units, &tables), extended);
                prop_assert_eq!(
                    index_of_match_bytes_on::<Exclude>(backend, &bytes, &tables),
                    exclude_bytes
                );
                prop_assert_eq!(
                    index_of_invalid_bytes_extended_on(backend, &bytes, &tables),
                    extended_bytes
                );
            }

            if let Some(index) = extended {
                prop_assert!(units[index] < 0x80);
            }
        }
    }
}
