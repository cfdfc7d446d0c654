//! Money helpers. Amounts are stored as `f64` and computed as `Decimal`.

use rust_decimal::prelude::*;

/// Places kept when an amount is written back to storage.
const DECIMAL_PLACES: u32 = 2;

pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(
            value = ?value,
            "Non-finite f64 in monetary calculation, defaulting to zero"
        );
        Decimal::ZERO
    })
}

/// Converts back to `f64`, rounded half away from zero to 2 places.
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Rounds to the nearest whole currency unit.
pub fn round_to_unit(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn decimal_sum_avoids_float_drift() {
        let sum = to_decimal(0.1) + to_decimal(0.2);
        assert_eq!(to_f64(sum), 0.3);
    }

    #[test]
    fn storage_rounding_is_half_away_from_zero() {
        assert_eq!(to_f64(dec!(10.005)), 10.01);
        assert_eq!(to_f64(dec!(10.004)), 10.0);
    }

    #[test]
    fn unit_rounding() {
        assert_eq!(round_to_unit(dec!(59.5)), dec!(60));
        assert_eq!(round_to_unit(dec!(59.49)), dec!(59));
    }

    #[test]
    fn non_finite_input_becomes_zero() {
        assert_eq!(to_decimal(f64::NAN), Decimal::ZERO);
    }
}
