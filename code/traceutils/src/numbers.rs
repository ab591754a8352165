// Strict parsers for the integer tokens in simulator logs.
//
// The std `FromStr` implementations accept a leading `+`, which the simulator never writes; a token
// like `+5` is more likely a corrupted record than a number, so we reject it.  Neither parser
// allocates.

/// A nonempty run of ASCII digits that fits in a u64.

pub fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() {
        return None;
    }
    let mut n = 0u64;
    for b in s.bytes() {
        if !b.is_ascii_digit() {
            return None;
        }
        n = n.checked_mul(10)?.checked_add((b - b'0') as u64)?;
    }
    Some(n)
}

/// An optional `-` followed by a nonempty run of ASCII digits, fitting in an i64.

pub fn parse_signed(s: &str) -> Option<i64> {
    if let Some(digits) = s.strip_prefix('-') {
        let n = parse_digits(digits)?;
        if n <= i64::MAX as u64 {
            Some(-(n as i64))
        } else if n == i64::MAX as u64 + 1 {
            Some(i64::MIN)
        } else {
            None
        }
    } else {
        i64::try_from(parse_digits(s)?).ok()
    }
}

#[test]
fn test_parse_digits() {
    assert!(parse_digits("0") == Some(0));
    assert!(parse_digits("120") == Some(120));
    assert!(parse_digits("007") == Some(7));
    assert!(parse_digits("18446744073709551615") == Some(u64::MAX));
    assert!(parse_digits("18446744073709551616").is_none());
    assert!(parse_digits("").is_none());
    assert!(parse_digits("+5").is_none());
    assert!(parse_digits("-5").is_none());
    assert!(parse_digits("5a").is_none());
    assert!(parse_digits("LEAVE_CPU").is_none());
}

#[test]
fn test_parse_signed() {
    assert!(parse_signed("-1") == Some(-1));
    assert!(parse_signed("42") == Some(42));
    assert!(parse_signed("-").is_none());
    assert!(parse_signed("--1").is_none());
    assert!(parse_signed("-9223372036854775808") == Some(i64::MIN));
    assert!(parse_signed("9223372036854775808").is_none());
}
