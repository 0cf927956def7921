/// `numerator / denominator`, or zero when the denominator is not positive.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Nearest integer with halves rounded towards positive infinity, so display
/// values match what chart tooling shows for the same figures.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_is_zero_for_empty_denominator() {
        assert_eq!(ratio(45_000.0, 0.0), 0.0);
        assert_eq!(ratio(0.0, 0.0), 0.0);
        assert_eq!(ratio(10.0, -2.0), 0.0);
    }

    #[test]
    fn ratio_divides_for_positive_denominator() {
        assert_eq!(ratio(45_000.0, 140.0), 45_000.0 / 140.0);
    }

    #[test]
    fn round_half_up_matches_display_rounding() {
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(2.49), 2);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(6_500.0), 6_500);
    }
}
