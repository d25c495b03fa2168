//! Engineering notation for component values.
//!
//! Formatting picks the largest SI prefix not exceeding the magnitude and
//! prints three significant digits, dropping trailing zeros:
//!
//! ```text
//! 4700    Ω -> 4.7kΩ
//! 0.0001  F -> 100µF
//! 0.047   H -> 47mH
//! ```
//!
//! Parsing accepts the same prefixes (and an optional unit symbol), so values
//! can be typed the way they are printed.

/// SI prefixes from largest to smallest.
const SI_PREFIXES: [(f64, &str); 8] = [
    (1e9, "G"),
    (1e6, "M"),
    (1e3, "k"),
    (1.0, ""),
    (1e-3, "m"),
    (1e-6, "µ"),
    (1e-9, "n"),
    (1e-12, "p"),
];

/// Significant digits used when a scaled value is not a whole number.
const PRECISION: usize = 3;

/// Format `value` with an SI prefix and `unit`, e.g. `engineering_notation(4700.0, "Ω")` is `4.7kΩ`.
///
/// Values outside the prefix table fall back to plain general formatting.
pub fn engineering_notation(value: f64, unit: &str) -> String {
    if value == 0.0 {
        return format!("0{unit}");
    }
    if !value.is_finite() {
        return format!("{value}{unit}");
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let magnitude = value.abs();

    // Compare after rounding, so 999.96µ prints as 1m and 0.9996p as 1p
    for &(scale, prefix) in &SI_PREFIXES {
        let scaled = magnitude / scale;
        if round_significant(scaled, PRECISION) >= 1.0 {
            return format!("{sign}{}{prefix}{unit}", format_scaled(scaled));
        }
    }

    format!("{}{unit}", format_general(value, PRECISION))
}

/// Parse a value with an optional SI suffix and unit symbol.
///
/// `"10k"`, `"100n"`, `"4.7u"`, `"4.7µF"`, `"0.72mH"`, `"2500Hz"`, `"8Ω"`.
pub fn parse_value(text: &str) -> Option<f64> {
    let mut text = text.trim();
    for unit in ["Hz", "ohm", "Ω", "F", "H"] {
        if let Some(stripped) = text.strip_suffix(unit) {
            text = stripped.trim_end();
            break;
        }
    }
    if text.is_empty() {
        return None;
    }

    let (num_str, multiplier) = match text.chars().last() {
        Some(last) => {
            let mult = match last {
                'p' => 1e-12,
                'n' => 1e-9,
                'u' | 'µ' | 'μ' => 1e-6,
                'm' => 1e-3,
                'k' | 'K' => 1e3,
                'M' => 1e6,
                'G' => 1e9,
                _ => 1.0,
            };
            if mult != 1.0 {
                (&text[..text.len() - last.len_utf8()], mult)
            } else {
                (text, 1.0)
            }
        }
        None => (text, 1.0),
    };

    num_str.trim().parse::<f64>().ok().map(|v| v * multiplier)
}

/// Whole numbers print without a decimal point; everything else gets
/// [`PRECISION`] significant digits.
fn format_scaled(scaled: f64) -> String {
    let rounded = round_significant(scaled, PRECISION);
    if scaled.fract() == 0.0 && scaled < 1e15 {
        format!("{}", scaled as i64)
    } else if (1000.0..1e15).contains(&rounded) {
        // Above the largest prefix: 999.96G is 1000G
        format!("{}", rounded as i64)
    } else {
        format_general(scaled, PRECISION)
    }
}

/// `printf("%.{precision}g")`-style formatting with trailing zeros removed.
fn format_general(x: f64, precision: usize) -> String {
    let precision = precision.max(1);
    let sci = format!("{:.*e}", precision - 1, x);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);

    if exp < -4 || exp >= precision as i32 {
        format!("{}e{exp}", trim_zeros(mantissa))
    } else {
        let decimals = (precision as i32 - 1 - exp).max(0) as usize;
        trim_zeros(&format!("{x:.decimals$}")).to_string()
    }
}

fn round_significant(x: f64, precision: usize) -> f64 {
    format!("{:.*e}", precision.max(1) - 1, x)
        .parse()
        .unwrap_or(x)
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: Option<f64>, b: Option<f64>) -> bool {
        match (a, b) {
            (Some(x), Some(y)) => (x - y).abs() < x.abs() * 1e-10 + 1e-15,
            (None, None) => true,
            _ => false,
        }
    }

    #[test]
    fn test_prefixes() {
        assert_eq!(engineering_notation(1000.0, "Ω"), "1kΩ");
        assert_eq!(engineering_notation(1e6, "Ω"), "1MΩ");
        assert_eq!(engineering_notation(0.0001, "F"), "100µF");
        assert_eq!(engineering_notation(0.047, "H"), "47mH");
        assert_eq!(engineering_notation(1e-9, "F"), "1nF");
        assert_eq!(engineering_notation(100e-12, "F"), "100pF");
        assert_eq!(engineering_notation(2.2e9, "Ω"), "2.2GΩ");
    }

    #[test]
    fn test_fractional_and_plain() {
        assert_eq!(engineering_notation(4700.0, "Ω"), "4.7kΩ");
        assert_eq!(engineering_notation(1000.0, ""), "1k");
        assert_eq!(engineering_notation(100.0, "Ω"), "100Ω");
        assert_eq!(engineering_notation(5.627e-6, "F"), "5.63µF");
        assert_eq!(engineering_notation(39.857, "Ω"), "39.9Ω");
    }

    #[test]
    fn test_zero_negative_and_out_of_range() {
        assert_eq!(engineering_notation(0.0, "Ω"), "0Ω");
        assert_eq!(engineering_notation(-1000.0, "Ω"), "-1kΩ");
        assert_eq!(engineering_notation(1e-15, "F"), "1e-15F");
    }

    #[test]
    fn test_rounding_carries_to_next_prefix() {
        assert_eq!(engineering_notation(999.96e-6, "H"), "1mH");
        assert_eq!(engineering_notation(0.9996e-12, "F"), "1pF");
        assert_eq!(engineering_notation(999.4e-12, "F"), "999pF");
    }

    #[test]
    fn test_beyond_largest_prefix() {
        assert_eq!(engineering_notation(999.96e9, "Ω"), "1000GΩ");
        assert_eq!(engineering_notation(5e12, "Ω"), "5000GΩ");
        assert_eq!(engineering_notation(1234.5e9, "Ω"), "1230GΩ");
    }

    #[test]
    fn test_parse_value() {
        assert!(approx_eq(parse_value("10k"), Some(10_000.0)));
        assert!(approx_eq(parse_value("100n"), Some(100e-9)));
        assert!(approx_eq(parse_value("4.7u"), Some(4.7e-6)));
        assert!(approx_eq(parse_value("4.7µF"), Some(4.7e-6)));
        assert!(approx_eq(parse_value("0.72mH"), Some(0.72e-3)));
        assert!(approx_eq(parse_value("1M"), Some(1_000_000.0)));
        assert!(approx_eq(parse_value("2500Hz"), Some(2500.0)));
        assert!(approx_eq(parse_value("8Ω"), Some(8.0)));
        assert!(approx_eq(parse_value("1e-9"), Some(1e-9)));
        assert!(approx_eq(parse_value("abc"), None));
        assert!(approx_eq(parse_value(""), None));
    }
}
