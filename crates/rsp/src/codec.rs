//! ASCII-hex and checksum primitives shared by the framer and the command
//! handlers.
//!
//! All protocol numbers travel as hex text. Parsing is deliberately
//! forgiving: a non-hex byte ends the number instead of raising an error,
//! and callers decide whether "zero digits consumed" is acceptable for the
//! grammar they are reading.

/// Maps an ASCII hex digit to its value. `None` means "not a hex digit",
/// which callers treat as end-of-number, not as a failure.
pub fn hex_digit_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Inverse of [`hex_digit_value`] for values 0..=15, lowercase.
pub fn value_to_hex_digit(v: u8) -> u8 {
    debug_assert!(v < 16);
    if v < 10 {
        b'0' + v
    } else {
        b'a' + (v - 10)
    }
}

/// Greedily parses hex digits from the front of `s`, left to right.
///
/// Returns the accumulated value and the number of digits consumed. Stops at
/// the first non-hex byte or end of input; `(0, 0)` when the first byte is
/// not hex. Accumulation wraps rather than overflowing so hostile input
/// cannot panic the engine.
pub fn parse_hex(s: &[u8]) -> (u32, usize) {
    let mut value: u32 = 0;
    let mut consumed = 0;
    for &c in s {
        match hex_digit_value(c) {
            Some(d) => {
                value = value.wrapping_mul(16).wrapping_add(d as u32);
                consumed += 1;
            }
            None => break,
        }
    }
    (value, consumed)
}

/// Appends `value` to `out` as `byte_width * 2` hex characters,
/// most-significant byte first. Widths up to 4 bytes cover a `u32`.
pub fn write_hex(out: &mut String, value: u32, byte_width: usize) {
    debug_assert!(byte_width <= 4);
    for i in (0..byte_width).rev() {
        let byte = (value >> (i * 8)) as u8;
        out.push(value_to_hex_digit(byte >> 4) as char);
        out.push(value_to_hex_digit(byte & 0x0f) as char);
    }
}

/// Packet checksum: sum of the body bytes, modulo 256.
pub fn checksum(body: &[u8]) -> u8 {
    body.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_mapping_both_cases() {
        assert_eq!(hex_digit_value(b'0'), Some(0));
        assert_eq!(hex_digit_value(b'9'), Some(9));
        assert_eq!(hex_digit_value(b'a'), Some(10));
        assert_eq!(hex_digit_value(b'F'), Some(15));
        assert_eq!(hex_digit_value(b'g'), None);
        assert_eq!(hex_digit_value(b','), None);
        for v in 0..16u8 {
            assert_eq!(hex_digit_value(value_to_hex_digit(v)), Some(v));
        }
    }

    #[test]
    fn parse_stops_at_first_non_hex() {
        assert_eq!(parse_hex(b"1f,200"), (0x1f, 2));
        assert_eq!(parse_hex(b"deadbeef"), (0xdeadbeef, 8));
        assert_eq!(parse_hex(b",10"), (0, 0));
        assert_eq!(parse_hex(b""), (0, 0));
    }

    #[test]
    fn write_hex_is_fixed_width_msb_first() {
        let mut out = String::new();
        write_hex(&mut out, 0xab, 4);
        assert_eq!(out, "000000ab");

        let mut out = String::new();
        write_hex(&mut out, 0x12345678, 4);
        assert_eq!(out, "12345678");

        let mut out = String::new();
        write_hex(&mut out, 0x05, 1);
        assert_eq!(out, "05");
    }

    #[test]
    fn hex_round_trip() {
        for &v in &[0u32, 1, 0xff, 0x8000_0000, 0xdead_beef, u32::MAX] {
            let mut out = String::new();
            write_hex(&mut out, v, 4);
            let (parsed, consumed) = parse_hex(out.as_bytes());
            assert_eq!(parsed, v);
            assert_eq!(consumed, 8);
        }
    }

    #[test]
    fn checksum_matches_known_values() {
        // ASCII sum of "m0,4" = 109 + 48 + 44 + 52 = 253.
        assert_eq!(checksum(b"m0,4"), 0xfd);
        assert_eq!(checksum(b"c"), 0x63);
        assert_eq!(checksum(b""), 0x00);
    }

    #[test]
    fn checksum_is_sensitive_to_single_byte_edits() {
        let base = checksum(b"g");
        assert_ne!(checksum(b"h"), base);
        assert_ne!(checksum(b"G"), base);
    }
}
