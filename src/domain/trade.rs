//! Insider-trade records.

use crate::domain::error::StockdataError;
use crate::domain::numeric::Numeric84;
use crate::domain::schema::TRADE;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// A trade as submitted for insertion. Every column may be absent; the
/// required ones are checked by [`NewTrade::validate`] before any write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTrade {
    pub stock: Option<i32>,
    pub insider: Option<String>,
    pub relation: Option<String>,
    pub last_date: Option<NaiveDate>,
    pub transaction: Option<String>,
    pub owner_type: Option<String>,
    pub shares_traded: Option<i64>,
    pub last_price: Option<Decimal>,
    pub shares_held: Option<i64>,
}

impl NewTrade {
    /// A trade with every required column filled in.
    pub fn new(insider: &str, shares_traded: i64, last_price: Decimal, shares_held: i64) -> Self {
        Self {
            insider: Some(insider.to_string()),
            shares_traded: Some(shares_traded),
            last_price: Some(last_price),
            shares_held: Some(shares_held),
            ..Self::default()
        }
    }

    pub fn with_stock(mut self, stock: i32) -> Self {
        self.stock = Some(stock);
        self
    }

    pub fn with_relation(mut self, relation: &str) -> Self {
        self.relation = Some(relation.to_string());
        self
    }

    pub fn with_last_date(mut self, last_date: NaiveDate) -> Self {
        self.last_date = Some(last_date);
        self
    }

    pub fn with_transaction(mut self, transaction: &str) -> Self {
        self.transaction = Some(transaction.to_string());
        self
    }

    pub fn with_owner_type(mut self, owner_type: &str) -> Self {
        self.owner_type = Some(owner_type.to_string());
        self
    }

    /// Check the not-null columns (in declaration order) and fit `last_price`
    /// to NUMERIC(8,4).
    pub fn validate(&self) -> Result<TradeRecord, StockdataError> {
        let insider = self
            .insider
            .clone()
            .ok_or_else(|| StockdataError::not_null(TRADE, "insider"))?;
        let shares_traded = self
            .shares_traded
            .ok_or_else(|| StockdataError::not_null(TRADE, "shares_traded"))?;
        let last_price = self
            .last_price
            .ok_or_else(|| StockdataError::not_null(TRADE, "last_price"))?;
        let last_price = Numeric84::for_column(last_price, TRADE, "last_price")?;
        let shares_held = self
            .shares_held
            .ok_or_else(|| StockdataError::not_null(TRADE, "shares_held"))?;

        Ok(TradeRecord {
            stock: self.stock,
            insider,
            relation: self.relation.clone(),
            last_date: self.last_date,
            transaction: self.transaction.clone(),
            owner_type: self.owner_type.clone(),
            shares_traded,
            last_price,
            shares_held,
        })
    }
}

/// A trade whose columns satisfy the not-null and precision rules.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub stock: Option<i32>,
    pub insider: String,
    pub relation: Option<String>,
    pub last_date: Option<NaiveDate>,
    pub transaction: Option<String>,
    pub owner_type: Option<String>,
    pub shares_traded: i64,
    pub last_price: Numeric84,
    pub shares_held: i64,
}

impl TradeRecord {
    pub fn into_trade(self, id: i32) -> Trade {
        Trade {
            id,
            stock: self.stock,
            insider: self.insider,
            relation: self.relation,
            last_date: self.last_date,
            transaction: self.transaction,
            owner_type: self.owner_type,
            shares_traded: self.shares_traded,
            last_price: self.last_price,
            shares_held: self.shares_held,
        }
    }
}

/// A stored trade row.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub id: i32,
    pub stock: Option<i32>,
    pub insider: String,
    pub relation: Option<String>,
    pub last_date: Option<NaiveDate>,
    pub transaction: Option<String>,
    pub owner_type: Option<String>,
    pub shares_traded: i64,
    pub last_price: Numeric84,
    pub shares_held: i64,
}
