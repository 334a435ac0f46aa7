//! Rounding helpers for prices and measurements.

/// Round `value` up (toward positive infinity) to `decimals` places.
#[must_use]
pub fn round_up(value: f64, decimals: i32) -> f64 {
    let multiplier = 10_f64.powi(decimals);
    (value * multiplier).ceil() / multiplier
}

/// Round `value` half-up to a multiple of `10^level`, e.g. `level = 3`
/// rounds to the nearest thousand.
#[must_use]
pub fn money_round_up(value: f64, level: i32) -> f64 {
    let multiplier = 10_f64.powi(level);
    (value / multiplier).round() * multiplier
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(left: f64, right: f64) -> bool {
        (left - right).abs() < 1e-9
    }

    #[test]
    fn round_up_ceils_at_the_requested_precision() {
        assert!(close(round_up(1.231, 2), 1.24));
        assert!(close(round_up(1.2, 0), 2.0));
        assert!(close(round_up(-1.25, 1), -1.2));
    }

    #[test]
    fn money_round_up_rounds_half_away_from_zero() {
        assert!(close(money_round_up(12_500.0, 3), 13_000.0));
        assert!(close(money_round_up(12_499.0, 3), 12_000.0));
        assert!(close(money_round_up(149.0, 2), 100.0));
        assert!(close(money_round_up(150.0, 2), 200.0));
    }
}
