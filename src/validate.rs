//! Price sanity check shared by the table, the chart series and the axis range.

/// Longest accepted canonical rendering of a price.
const MAX_RENDERED_LEN: usize = 10;

/// True when `raw` starts with a finite number whose canonical decimal
/// rendering is at most 10 characters long.
pub fn is_valid_price(raw: &str) -> bool {
    parse_price(raw).is_some()
}

/// The numeric value of `raw`, only if it passes [`is_valid_price`].
pub fn parse_price(raw: &str) -> Option<f64> {
    let value = leading_number(raw)?;
    if !value.is_finite() {
        return None;
    }
    (render_canonical(value).len() <= MAX_RENDERED_LEN).then_some(value)
}

/// Parses the longest numeric prefix of `raw` after leading whitespace,
/// so `"12.5 BGN"` yields 12.5 and `"abc"` yields nothing.
fn leading_number(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    if s[end..].starts_with("Infinity") {
        return s[..end + "Infinity".len()].replace("Infinity", "inf").parse().ok();
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}

/// Shortest round-trip rendering; exponent form outside [1e-6, 1e21).
fn render_canonical(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return value.to_string();
    }
    let exp = format!("{:e}", value);
    match exp.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => format!("{}e+{}", mantissa, power),
        _ => exp,
    }
}
