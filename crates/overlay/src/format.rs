/// Format with exactly two decimals, rounding half away from zero.
///
/// Rounding works on the shortest decimal representation of the value, so
/// `1.005` becomes `"1.01"` even though the nearest `f32` is slightly
/// below it. Results that round to zero never carry a minus sign.
pub fn fixed2(value: f32) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    // Display for floats never uses exponent notation.
    let text = value.abs().to_string();
    let (int, frac) = text.split_once('.').unwrap_or((text.as_str(), ""));

    let mut digits: Vec<u8> = int
        .bytes()
        .chain(frac.bytes().chain(std::iter::repeat(b'0')).take(2))
        .map(|b| b - b'0')
        .collect();
    if frac.as_bytes().get(2).is_some_and(|&d| d >= b'5') {
        carry(&mut digits);
    }

    let split = digits.len() - 2;
    let render = |ds: &[u8]| ds.iter().map(|&d| char::from(b'0' + d)).collect::<String>();
    let sign = if value.is_sign_negative() && digits.iter().any(|&d| d != 0) {
        "-"
    } else {
        ""
    };
    format!("{sign}{}.{}", render(&digits[..split]), render(&digits[split..]))
}

/// Add one unit in the last place of a decimal digit string.
fn carry(digits: &mut Vec<u8>) {
    for d in digits.iter_mut().rev() {
        if *d == 9 {
            *d = 0;
        } else {
            *d += 1;
            return;
        }
    }
    digits.insert(0, 1);
}
