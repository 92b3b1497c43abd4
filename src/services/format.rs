//! Display formatting for log and console output.

/// US-dollar amount with two decimals and thousands separators: `$1,234.56`,
/// `-$12.00`.
pub fn format_currency(amount: f64) -> String {
    let body = format_number(amount.abs(), 2);
    if amount < 0.0 && body.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        format!("-${}", body)
    } else {
        format!("${}", body)
    }
}

/// Percentage with one decimal, input already scaled to 0..100.
pub fn format_percentage(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Fixed decimals with thousands separators.
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::with_capacity(fixed.len() + fixed.len() / 3 + 1);
    if value < 0.0 && fixed.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Compact magnitude: `1.5K`, `2.3M`, `1.0B`. Values under a thousand are
/// printed as-is.
pub fn format_compact_number(value: f64) -> String {
    let magnitude = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };

    if magnitude >= 1_000_000_000.0 {
        format!("{}{:.1}B", sign, magnitude / 1_000_000_000.0)
    } else if magnitude >= 1_000_000.0 {
        format!("{}{:.1}M", sign, magnitude / 1_000_000.0)
    } else if magnitude >= 1_000.0 {
        format!("{}{:.1}K", sign, magnitude / 1_000.0)
    } else {
        value.to_string()
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1234.56), "$1,234.56");
        assert_eq!(format_currency(-12.0), "-$12.00");
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(1_000_000.0), "$1,000,000.00");
    }

    #[test]
    fn test_format_currency_negative_rounding_to_zero() {
        assert_eq!(format_currency(-0.001), "$0.00");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(50.0), "50.0%");
        assert_eq!(format_percentage(-3.456), "-3.5%");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(999.0, 0), "999");
        assert_eq!(format_number(-1000.5, 1), "-1,000.5");
        assert_eq!(format_number(12.0, 4), "12.0000");
    }

    #[test]
    fn test_format_compact_number() {
        assert_eq!(format_compact_number(1_500.0), "1.5K");
        assert_eq!(format_compact_number(2_340_000.0), "2.3M");
        assert_eq!(format_compact_number(1_000_000_000.0), "1.0B");
        assert_eq!(format_compact_number(-45_000.0), "-45.0K");
        assert_eq!(format_compact_number(999.0), "999");
        assert_eq!(format_compact_number(12.5), "12.5");
    }
}
