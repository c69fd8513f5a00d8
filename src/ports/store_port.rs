//! Storage port: the write contract of the stock/trade/price schema.

use crate::domain::error::StockdataError;
use crate::domain::price::{NewPrice, Price};
use crate::domain::stock::Stock;
use crate::domain::trade::{NewTrade, Trade};

/// A backend holding the three tables. Every write either succeeds in full
/// or leaves the store unchanged and returns the violated constraint.
pub trait StockStore {
    /// Create the tables and constraints. Safe to call on an existing store.
    fn initialize_schema(&self) -> Result<(), StockdataError>;

    fn insert_stock(&self, name: &str) -> Result<Stock, StockdataError>;

    fn find_stock(&self, name: &str) -> Result<Option<Stock>, StockdataError>;

    /// All stocks, ordered by id.
    fn list_stocks(&self) -> Result<Vec<Stock>, StockdataError>;

    fn insert_trade(&self, trade: &NewTrade) -> Result<Trade, StockdataError>;

    fn insert_price(&self, price: &NewPrice) -> Result<Price, StockdataError>;

    /// Insert a stock and its price bars in one transaction. Each bar's
    /// `stock` is replaced by the new stock's id.
    fn insert_stock_with_prices(
        &self,
        name: &str,
        prices: &[NewPrice],
    ) -> Result<Stock, StockdataError>;

    /// Insert a batch of trades for one stock in one transaction.
    fn insert_trades(
        &self,
        stock_id: i32,
        trades: &[NewTrade],
    ) -> Result<Vec<Trade>, StockdataError>;

    /// Trades referencing `stock_id`, ordered by id.
    fn trades_for_stock(&self, stock_id: i32) -> Result<Vec<Trade>, StockdataError>;

    /// Price bars referencing `stock_id`, ordered by date.
    fn prices_for_stock(&self, stock_id: i32) -> Result<Vec<Price>, StockdataError>;

    /// Delete every row, dependents first, in one transaction.
    fn clear(&self) -> Result<(), StockdataError>;

    fn require_stock(&self, name: &str) -> Result<Stock, StockdataError> {
        self.find_stock(name)?
            .ok_or_else(|| StockdataError::StockNotFound {
                name: name.to_string(),
            })
    }
}
