//! Daily OHLCV price bars.

use crate::domain::error::StockdataError;
use crate::domain::numeric::Numeric84;
use crate::domain::schema::PRICE;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// A price bar as submitted for insertion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPrice {
    pub stock: Option<i32>,
    pub date: Option<NaiveDate>,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    pub volume: Option<i64>,
}

impl NewPrice {
    pub fn new(
        date: NaiveDate,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: i64,
    ) -> Self {
        Self {
            stock: None,
            date: Some(date),
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: Some(volume),
        }
    }

    pub fn with_stock(mut self, stock: i32) -> Self {
        self.stock = Some(stock);
        self
    }

    pub fn validate(&self) -> Result<Price, StockdataError> {
        let date = self
            .date
            .ok_or_else(|| StockdataError::not_null(PRICE, "date"))?;
        let open = price_column(self.open, "open")?;
        let high = price_column(self.high, "high")?;
        let low = price_column(self.low, "low")?;
        let close = price_column(self.close, "close")?;
        let volume = self
            .volume
            .ok_or_else(|| StockdataError::not_null(PRICE, "volume"))?;

        Ok(Price {
            stock: self.stock,
            date,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

fn price_column(value: Option<Decimal>, column: &str) -> Result<Numeric84, StockdataError> {
    let value = value.ok_or_else(|| StockdataError::not_null(PRICE, column))?;
    Numeric84::for_column(value, PRICE, column)
}

/// A stored price row. The table has no surrogate key.
#[derive(Debug, Clone, PartialEq)]
pub struct Price {
    pub stock: Option<i32>,
    pub date: NaiveDate,
    pub open: Numeric84,
    pub high: Numeric84,
    pub low: Numeric84,
    pub close: Numeric84,
    pub volume: i64,
}
