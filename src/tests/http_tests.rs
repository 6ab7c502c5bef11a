// SPDX-License-Identifier: Apache-2.0

#[cfg(test)]
mod tests {
    use crate::charset::Membership;
    use crate::constants::TABLE_SIZE;
    use crate::http::{
        self, contains_invalid_authority_char, index_of_invalid_field_value_char,
        index_of_invalid_field_value_char_extended, index_of_invalid_host_char,
        index_of_invalid_token_byte, index_of_invalid_token_char,
    };
    use crate::policy::Exclude;
    use crate::scan::{index_of_invalid_extended_scalar, index_of_match_scalar};
    use crate::test_utils::{config_test_logger, utf16};
    use crate::types::ScanStrategy;

    /// Prefixes of the lengths a single trailing character lands on.
    const PREFIXES: [&str; 6] = [
        "1",
        "1234567",
        "12345678",
        "12345678901234",
        "123456789012345",
        "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
    ];

    fn is_alphanumeric(c: u16) -> bool {
        (c as usize) < TABLE_SIZE && (c as u8).is_ascii_alphanumeric()
    }

    #[test]
    fn test_predefined_membership() {
        config_test_logger();
        http::initialize();

        for c in 0..=u16::MAX {
            let alnum = is_alphanumeric(c);
            let ch = char::from_u32(c as u32).unwrap_or('\u{FFFD}');
            assert_eq!(http::ALPHANUMERIC.contains(c), alnum, "alphanumeric {:#06X}", c);
            assert_eq!(
                http::AUTHORITY.contains(c),
                alnum || ":.[]@".contains(ch),
                "authority {:#06X}",
                c
            );
            assert_eq!(
                http::TOKEN.contains(c),
                alnum || "!#$%&'*+-.^_`|~".contains(ch),
                "token {:#06X}",
                c
            );
            assert_eq!(
                http::HOST.contains(c),
                alnum || "!$&'()-._~".contains(ch),
                "host {:#06X}",
                c
            );
            assert_eq!(
                http::FIELD_VALUE.contains(c),
                (0x20..=0x7E).contains(&c),
                "field value {:#06X}",
                c
            );
        }

        for set in [
            &*http::ALPHANUMERIC,
            &*http::AUTHORITY,
            &*http::TOKEN,
            &*http::HOST,
            &*http::FIELD_VALUE,
        ] {
            assert_eq!(set.strategy(), ScanStrategy::Vectorized);
        }
    }

    #[test]
    fn test_concrete_scenarios() {
        config_test_logger();
        assert!(!contains_invalid_authority_char(b"hostname:8080"));
        assert!(!contains_invalid_authority_char(b"[::]:8080"));
        assert!(!contains_invalid_authority_char(b"user:password@host.com"));
        assert!(contains_invalid_authority_char(b"host name"));
        assert!(!contains_invalid_authority_char(b""));

        assert_eq!(index_of_invalid_host_char(&utf16("host\u{1}name")), Some(4));
        assert_eq!(index_of_invalid_host_char(&utf16("microsoft.com")), None);
        assert_eq!(index_of_invalid_host_char(&utf16("fe80::1")), Some(4));

        assert_eq!(index_of_invalid_token_byte(b"1234567\x01"), Some(7));
        assert_eq!(index_of_invalid_token_byte(b"gzip"), None);
        assert_eq!(index_of_invalid_token_char(&utf16("text/html")), Some(4));

        let mut field_value = vec![b'a' as u16; 113];
        field_value[112] = 0x01;
        assert_eq!(index_of_invalid_field_value_char(&field_value), Some(112));

        let token = utf16("0123456789abcdefghij\u{2764}k");
        assert_eq!(index_of_invalid_field_value_char_extended(&token), None);
        assert_eq!(index_of_invalid_field_value_char(&token), Some(20));
    }

    #[test]
    fn test_str_conveniences() {
        config_test_logger();
        assert!(!http::contains_invalid_authority_str("127.0.0.1"));
        assert!(http::contains_invalid_authority_str("caf\u{e9}.com"));
        assert_eq!(http::index_of_invalid_host_str("caf\u{e9}.com"), Some(3));
        assert_eq!(http::index_of_invalid_token_str("keep-alive"), None);
        assert_eq!(http::index_of_invalid_token_str("keep alive"), Some(4));
        assert_eq!(http::index_of_invalid_field_value_str("max-age=0\r\n"), Some(9));
        assert_eq!(
            http::index_of_invalid_field_value_str_extended("na\u{ef}ve \u{2764}\u{1F600} ok\t"),
            Some(17)
        );
    }

    /// Every character appended to every prefix, checked against the scalar
    /// scanner over the same tables.
    #[test]
    fn test_every_char_matches_scalar() {
        config_test_logger();
        let authority = http::AUTHORITY.tables().lookup;
        let token = http::TOKEN.tables().lookup;
        let host = http::HOST.tables().lookup;
        let field_value = http::FIELD_VALUE.tables().lookup;

        for prefix in PREFIXES {
            let mut units = utf16(prefix);
            units.push(0);
            let last = units.len() - 1;

            for c in 0..=u16::MAX {
                units[last] = c;
                assert_eq!(
                    index_of_invalid_host_char(&units),
                    index_of_match_scalar::<Exclude, _, _>(&units, &host),
                    "host, len={}, char={:#06X}",
                    units.len(),
                    c
                );
                assert_eq!(
                    index_of_invalid_token_char(&units),
                    index_of_match_scalar::<Exclude, _, _>(&units, &token),
                    "token, len={}, char={:#06X}",
                    units.len(),
                    c
                );
                assert_eq!(
                    index_of_invalid_field_value_char(&units),
                    index_of_match_scalar::<Exclude, _, _>(&units, &field_value),
                    "field value, len={}, char={:#06X}",
                    units.len(),
                    c
                );
                assert_eq!(
                    index_of_invalid_field_value_char_extended(&units),
                    index_of_invalid_extended_scalar(&units, &field_value),
                    "extended field value, len={}, char={:#06X}",
                    units.len(),
                    c
                );

                // Surrogates have no UTF-8 form.
                if let Some(ch) = char::from_u32(c as u32) {
                    let mut text = String::from(prefix);
                    text.push(ch);
                    let bytes = text.as_bytes();
                    assert_eq!(
                        contains_invalid_authority_char(bytes),
                        index_of_match_scalar::<Exclude, _, _>(bytes, &authority).is_some(),
                        "authority, len={}, char={:#06X}",
                        bytes.len(),
                        c
                    );
                    assert_eq!(
                        index_of_invalid_token_byte(bytes),
                        index_of_match_scalar::<Exclude, _, _>(bytes, &token),
                        "token bytes, len={}, char={:#06X}",
                        bytes.len(),
                        c
                    );
                }
            }
        }
    }
}
