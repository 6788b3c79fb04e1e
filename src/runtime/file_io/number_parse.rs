//! Number parsing for text files: decimal, `0x` hexadecimal and `0b` binary
//! integers, and decimal or scientific reals.

fn split_sign(text: &str) -> (bool, &str) {
    match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    }
}

fn strip_radix_prefix(text: &str) -> Option<(u32, &str)> {
    let prefix = text.get(..2)?;
    match prefix {
        "0x" | "0X" => Some((16, &text[2..])),
        "0b" | "0B" => Some((2, &text[2..])),
        _ => None,
    }
}

/// Parses an integer. Hexadecimal and binary literals cover the full 64-bit
/// pattern, so `0xFFFFFFFFFFFFFFFF` is `-1`.
pub fn parse_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, digits) = split_sign(text);
    if let Some((radix, digits)) = strip_radix_prefix(digits) {
        if digits.is_empty() || digits.starts_with(['+', '-']) {
            return None;
        }
        let bits = u64::from_str_radix(digits, radix).ok()? as i64;
        return Some(if negative { bits.wrapping_neg() } else { bits });
    }
    text.parse::<i64>().ok()
}

/// Parses a real. Integer literals in any radix are accepted too.
pub fn parse_real(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let (_, digits) = split_sign(trimmed);
    if strip_radix_prefix(digits).is_some() {
        return parse_integer(trimmed).map(|v| v as f64);
    }
    trimmed.parse::<f64>().ok()
}

/// Parses `true`/`false` or a number, which is true when non-zero.
pub fn parse_boolean(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        return Some(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return Some(false);
    }
    parse_real(text).map(|v| v != 0.0)
}
