//! In-memory store. Enforces the same constraint contract as the SQL
//! backends with explicit checks, so it can stand in for them in tests.

use crate::domain::error::StockdataError;
use crate::domain::price::{NewPrice, Price};
use crate::domain::schema::{PRICE_DATE_KEY, PRICE_STOCK_FKEY, STOCK_NAME_KEY, TRADE_STOCK_FKEY};
use crate::domain::stock::Stock;
use crate::domain::trade::{NewTrade, Trade};
use crate::ports::store_port::StockStore;
use log::{debug, info};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone)]
struct Tables {
    stocks: Vec<Stock>,
    trades: Vec<Trade>,
    prices: Vec<Price>,
    next_stock_id: i32,
    next_trade_id: i32,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            stocks: Vec::new(),
            trades: Vec::new(),
            prices: Vec::new(),
            next_stock_id: 1,
            next_trade_id: 1,
        }
    }
}

fn next_id(id: i32, table: &str) -> Result<i32, StockdataError> {
    id.checked_add(1).ok_or_else(|| StockdataError::Database {
        reason: format!("{table} id sequence exhausted at {id}"),
    })
}

impl Tables {
    fn check_stock_ref(&self, stock: Option<i32>, constraint: &str) -> Result<(), StockdataError> {
        match stock {
            Some(id) if !self.stocks.iter().any(|s| s.id == id) => {
                Err(StockdataError::ForeignKeyViolation {
                    constraint: constraint.into(),
                    stock: id,
                })
            }
            _ => Ok(()),
        }
    }

    fn insert_stock(&mut self, name: &str) -> Result<Stock, StockdataError> {
        if self.stocks.iter().any(|s| s.has_name(name)) {
            return Err(StockdataError::UniqueViolation {
                constraint: STOCK_NAME_KEY.into(),
            });
        }
        let stock = Stock::new(self.next_stock_id, name);
        self.next_stock_id = next_id(self.next_stock_id, "stock")?;
        self.stocks.push(stock.clone());
        Ok(stock)
    }

    fn insert_trade(&mut self, trade: &NewTrade) -> Result<Trade, StockdataError> {
        let record = trade.validate()?;
        self.check_stock_ref(record.stock, TRADE_STOCK_FKEY)?;
        let next = next_id(self.next_trade_id, "trade")?;
        let trade = record.into_trade(self.next_trade_id);
        self.next_trade_id = next;
        self.trades.push(trade.clone());
        Ok(trade)
    }

    fn insert_price(&mut self, price: &NewPrice) -> Result<Price, StockdataError> {
        let price = price.validate()?;
        // SQL backends check the unique index before the foreign key
        if self.prices.iter().any(|p| p.date == price.date) {
            return Err(StockdataError::UniqueViolation {
                constraint: PRICE_DATE_KEY.into(),
            });
        }
        self.check_stock_ref(price.stock, PRICE_STOCK_FKEY)?;
        self.prices.push(price.clone());
        Ok(price)
    }
}

#[derive(Default)]
pub struct MemoryAdapter {
    tables: Mutex<Tables>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StockdataError> {
        self.tables.lock().map_err(|e| StockdataError::Database {
            reason: e.to_string(),
        })
    }

    /// Run `f` against a copy of the tables and publish the copy only if it
    /// succeeds.
    fn transaction<T>(
        &self,
        f: impl FnOnce(&mut Tables) -> Result<T, StockdataError>,
    ) -> Result<T, StockdataError> {
        let mut guard = self.lock()?;
        let mut working = guard.clone();
        let out = f(&mut working)?;
        *guard = working;
        Ok(out)
    }
}

impl StockStore for MemoryAdapter {
    fn initialize_schema(&self) -> Result<(), StockdataError> {
        debug!("memory store needs no schema");
        Ok(())
    }

    fn insert_stock(&self, name: &str) -> Result<Stock, StockdataError> {
        let stock = self.lock()?.insert_stock(name)?;
        debug!("inserted stock {stock}");
        Ok(stock)
    }

    fn find_stock(&self, name: &str) -> Result<Option<Stock>, StockdataError> {
        Ok(self.lock()?.stocks.iter().find(|s| s.has_name(name)).cloned())
    }

    fn list_stocks(&self) -> Result<Vec<Stock>, StockdataError> {
        Ok(self.lock()?.stocks.clone())
    }

    fn insert_trade(&self, trade: &NewTrade) -> Result<Trade, StockdataError> {
        let trade = self.lock()?.insert_trade(trade)?;
        debug!("inserted trade {} for {}", trade.id, trade.insider);
        Ok(trade)
    }

    fn insert_price(&self, price: &NewPrice) -> Result<Price, StockdataError> {
        let price = self.lock()?.insert_price(price)?;
        debug!("inserted price bar for {}", price.date);
        Ok(price)
    }

    fn insert_stock_with_prices(
        &self,
        name: &str,
        prices: &[NewPrice],
    ) -> Result<Stock, StockdataError> {
        let stock = self.transaction(|tables| {
            let stock = tables.insert_stock(name)?;
            for price in prices {
                tables.insert_price(&price.clone().with_stock(stock.id))?;
            }
            Ok(stock)
        })?;
        info!("inserted {} with {} price bars", stock, prices.len());
        Ok(stock)
    }

    fn insert_trades(
        &self,
        stock_id: i32,
        trades: &[NewTrade],
    ) -> Result<Vec<Trade>, StockdataError> {
        let inserted = self.transaction(|tables| {
            trades
                .iter()
                .map(|trade| tables.insert_trade(&trade.clone().with_stock(stock_id)))
                .collect::<Result<Vec<_>, _>>()
        })?;
        info!("inserted {} trades for stock {}", inserted.len(), stock_id);
        Ok(inserted)
    }

    fn trades_for_stock(&self, stock_id: i32) -> Result<Vec<Trade>, StockdataError> {
        Ok(self
            .lock()?
            .trades
            .iter()
            .filter(|t| t.stock == Some(stock_id))
            .cloned()
            .collect())
    }

    fn prices_for_stock(&self, stock_id: i32) -> Result<Vec<Price>, StockdataError> {
        let mut prices: Vec<Price> = self
            .lock()?
            .prices
            .iter()
            .filter(|p| p.stock == Some(stock_id))
            .cloned()
            .collect();
        prices.sort_by_key(|p| p.date);
        Ok(prices)
    }

    fn clear(&self) -> Result<(), StockdataError> {
        let mut tables = self.lock()?;
        tables.prices.clear();
        tables.trades.clear();
        tables.stocks.clear();
        info!("cleared price, trade and stock");
        Ok(())
    }
}
