//! NUMERIC(8,4) fixed-point values.

use crate::domain::error::StockdataError;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use std::str::FromStr;

/// Total significant digits of a price column.
pub const PRECISION: u32 = 8;
/// Fractional digits of a price column.
pub const SCALE: u32 = 4;

/// An exact decimal that fits a NUMERIC(8,4) column: at most 4 integer digits
/// and always exactly 4 fractional digits, i.e. within ±9999.9999.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Numeric84(Decimal);

impl Numeric84 {
    /// Largest representable magnitude plus one unit of the integer part.
    fn limit() -> Decimal {
        Decimal::from(10_i64.pow(PRECISION - SCALE))
    }

    /// Round to 4 fractional digits (half away from zero) and reject values
    /// whose integer part needs more than 4 digits.
    pub fn new(value: Decimal) -> Option<Self> {
        let mut rounded =
            value.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero);
        if rounded.abs() >= Self::limit() {
            return None;
        }
        rounded.rescale(SCALE);
        Some(Self(rounded))
    }

    /// Like [`Numeric84::new`], reporting overflow against a column.
    pub fn for_column(value: Decimal, table: &str, column: &str) -> Result<Self, StockdataError> {
        Self::new(value).ok_or_else(|| StockdataError::NumericOverflow {
            table: table.into(),
            column: column.into(),
            value: value.to_string(),
        })
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Numeric84 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Numeric84 {
    type Err = StockdataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s.trim()).map_err(|e| StockdataError::InvalidInput {
            field: "decimal".into(),
            reason: format!("{s:?}: {e}"),
        })?;
        Self::new(decimal).ok_or_else(|| StockdataError::InvalidInput {
            field: "decimal".into(),
            reason: format!("{s} does not fit NUMERIC({PRECISION},{SCALE})"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn pads_to_four_fractional_digits() {
        let n = Numeric84::new(dec!(12.3)).unwrap();
        assert_eq!(n.to_string(), "12.3000");
        assert_eq!(n.value().scale(), SCALE);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(Numeric84::new(dec!(1.23455)).unwrap().value(), dec!(1.2346));
        assert_eq!(Numeric84::new(dec!(-1.23455)).unwrap().value(), dec!(-1.2346));
        assert_eq!(Numeric84::new(dec!(1.23454)).unwrap().value(), dec!(1.2345));
    }

    #[test]
    fn accepts_range_boundaries() {
        assert!(Numeric84::new(dec!(9999.9999)).is_some());
        assert!(Numeric84::new(dec!(-9999.9999)).is_some());
        assert!(Numeric84::new(dec!(0)).is_some());
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(Numeric84::new(dec!(10000)).is_none());
        assert!(Numeric84::new(dec!(-10000.0000)).is_none());
        // rounds up past the limit
        assert!(Numeric84::new(dec!(9999.99995)).is_none());
    }

    #[test]
    fn for_column_reports_overflow() {
        match Numeric84::for_column(dec!(12345.6), "trade", "last_price") {
            Err(StockdataError::NumericOverflow { table, column, value }) => {
                assert_eq!(table, "trade");
                assert_eq!(column, "last_price");
                assert_eq!(value, "12345.6");
            }
            other => panic!("expected NumericOverflow, got: {other:?}"),
        }
    }

    #[test]
    fn parses_from_text() {
        let n: Numeric84 = "12.3456".parse().unwrap();
        assert_eq!(n.value(), dec!(12.3456));
        assert!("abc".parse::<Numeric84>().is_err());
        assert!("123456".parse::<Numeric84>().is_err());
    }

    proptest! {
        #[test]
        fn every_four_digit_scaled_value_is_exact(mantissa in -99_999_999i64..=99_999_999i64) {
            let value = Decimal::new(mantissa, SCALE);
            let n = Numeric84::new(value).unwrap();
            prop_assert_eq!(n.value(), value);
            prop_assert_eq!(n.value().scale(), SCALE);
        }
    }
}
