//! Amounts travel as `Decimal` with two places and are stored as integer
//! minor units (paise for INR).

use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::error::{AppError, AppResult};

const MINOR_SCALE: u32 = 2;

pub fn to_minor_units(amount: Decimal) -> AppResult<i64> {
    if amount.is_sign_negative() {
        return Err(AppError::Validation("amount must not be negative".into()));
    }
    if amount.round_dp(MINOR_SCALE) != amount {
        return Err(AppError::Validation(
            "amount must have at most two decimal places".into(),
        ));
    }
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|minor| minor.to_i64())
        .ok_or_else(|| AppError::Validation("amount is out of range".into()))
}

pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, MINOR_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn converts_whole_and_fractional_amounts() {
        assert_eq!(to_minor_units(Decimal::from_str("4999.00").unwrap()).unwrap(), 499_900);
        assert_eq!(to_minor_units(Decimal::from_str("12.5").unwrap()).unwrap(), 1_250);
        assert_eq!(to_minor_units(Decimal::from(7)).unwrap(), 700);
    }

    #[test]
    fn rejects_sub_minor_precision_and_negatives() {
        assert!(to_minor_units(Decimal::from_str("1.005").unwrap()).is_err());
        assert!(to_minor_units(Decimal::from_str("-1").unwrap()).is_err());
    }

    #[test]
    fn rejects_amounts_beyond_minor_unit_range() {
        assert!(matches!(
            to_minor_units(Decimal::MAX),
            Err(AppError::Validation(_))
        ));
        let too_big = Decimal::from(i64::MAX / 100 + 1);
        assert!(matches!(to_minor_units(too_big), Err(AppError::Validation(_))));
    }

    #[test]
    fn minor_units_render_with_two_places() {
        assert_eq!(from_minor_units(499_900).to_string(), "4999.00");
        assert_eq!(from_minor_units(5).to_string(), "0.05");
    }
}
