//! Parsing of user-supplied column values.
//!
//! Dates are ISO `YYYY-MM-DD`; the US `MM/DD/YYYY` form of the disclosure
//! pages is accepted too. Counts and decimals may carry `,` thousands
//! separators.

use crate::domain::error::StockdataError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

pub fn parse_date(s: &str) -> Result<NaiveDate, StockdataError> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
        .map_err(|_| StockdataError::InvalidInput {
            field: "date".into(),
            reason: format!("{s:?} (expected YYYY-MM-DD or MM/DD/YYYY)"),
        })
}

pub fn parse_count(s: &str) -> Result<i64, StockdataError> {
    strip_separators(s)
        .parse()
        .map_err(|e| StockdataError::InvalidInput {
            field: "count".into(),
            reason: format!("{s:?}: {e}"),
        })
}

pub fn parse_decimal(s: &str) -> Result<Decimal, StockdataError> {
    Decimal::from_str(&strip_separators(s)).map_err(|e| StockdataError::InvalidInput {
        field: "decimal".into(),
        reason: format!("{s:?}: {e}"),
    })
}

fn strip_separators(s: &str) -> String {
    s.trim().replace(',', "")
}
