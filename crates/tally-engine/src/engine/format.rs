/// Format a number for display.
///
/// Integral values print without a fractional part. Without a
/// `decimal_places` cap, other values print the shortest text that parses
/// back to the same `f64`, so a chain of formulas reading each other's
/// display loses nothing. With a cap, at most that many digits are kept and
/// trailing zeros are trimmed.
pub fn format_number(n: f64, decimal_places: Option<usize>) -> String {
    if n.is_nan() {
        "#NAN!".to_string()
    } else if n.is_infinite() {
        "#INF!".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        normalize_negative_zero(format!("{:.0}", n))
    } else if let Some(places) = decimal_places {
        let fixed = format!("{:.*}", places, n);
        let trimmed = if fixed.contains('.') {
            fixed.trim_end_matches('0').trim_end_matches('.')
        } else {
            fixed.as_str()
        };
        normalize_negative_zero(trimmed.to_string())
    } else {
        normalize_negative_zero(n.to_string())
    }
}

fn normalize_negative_zero(s: String) -> String {
    if s == "-0" { "0".to_string() } else { s }
}

#[cfg(test)]
mod tests {
    use super::format_number;

    #[test]
    fn test_integers_have_no_fraction() {
        assert_eq!(format_number(5.0, None), "5");
        assert_eq!(format_number(-27.0, Some(2)), "-27");
        assert_eq!(format_number(-0.0, None), "0");
        assert_eq!(format_number(-0.0, Some(2)), "0");
    }

    #[test]
    fn test_uncapped_fractions_round_trip() {
        let third = 1.0 / 3.0;
        assert_eq!(format_number(third, None), "0.3333333333333333");
        assert_eq!(format_number(third, None).parse::<f64>().unwrap(), third);
        assert_eq!(format_number(2.5, None), "2.5");
        assert_eq!(format_number(-0.001, None), "-0.001");
        assert_eq!(format_number(0.1 + 0.2, None), "0.30000000000000004");
    }

    #[test]
    fn test_capped_fractions_are_trimmed() {
        assert_eq!(format_number(2.5, Some(2)), "2.5");
        assert_eq!(format_number(1.0 / 3.0, Some(2)), "0.33");
        assert_eq!(format_number(1.0 / 3.0, Some(4)), "0.3333");
        assert_eq!(format_number(-0.001, Some(2)), "0");
    }

    #[test]
    fn test_non_finite_markers() {
        assert_eq!(format_number(f64::NAN, None), "#NAN!");
        assert_eq!(format_number(f64::INFINITY, Some(2)), "#INF!");
    }
}
