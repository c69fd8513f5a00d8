//! SQLite storage adapter.

use super::pool_size;
use crate::domain::error::StockdataError;
use crate::domain::numeric::Numeric84;
use crate::domain::price::{NewPrice, Price};
use crate::domain::schema::{self, Dialect, PRICE, STOCK, TRADE};
use crate::domain::stock::Stock;
use crate::domain::trade::{NewTrade, Trade};
use crate::ports::config_port::ConfigPort;
use crate::ports::store_port::StockStore;
use chrono::NaiveDate;
use log::{debug, info};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, Row, ffi, params};

const DATE_FORMAT: &str = "%Y-%m-%d";

const TRADE_COLUMNS: &str = "id, stock, insider, relation, last_date, \"transaction\", owner_type, \
                             shares_traded, last_price, shares_held";

const PRICE_COLUMNS: &str = "stock, date, open, high, low, close, volume";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn enable_foreign_keys(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, StockdataError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| StockdataError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = pool_size(config, "sqlite")?;

        debug!("opening sqlite database {db_path}");
        let manager = SqliteConnectionManager::file(&db_path).with_init(enable_foreign_keys);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| StockdataError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, StockdataError> {
        let manager = SqliteConnectionManager::memory().with_init(enable_foreign_keys);
        // a single connection that is never recycled, or the database is lost
        let pool = Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .build(manager)
            .map_err(|e: r2d2::Error| StockdataError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, StockdataError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| StockdataError::Database {
                reason: e.to_string(),
            })
    }
}

fn query_error(e: rusqlite::Error) -> StockdataError {
    StockdataError::DatabaseQuery {
        reason: e.to_string(),
    }
}

/// `"UNIQUE constraint failed: stock.name"` -> `("stock", "name")`
fn failed_column(message: &str) -> Option<(&str, &str)> {
    message.rsplit(": ").next()?.split_once('.')
}

/// Translate a failed write into `table` to the violated constraint.
fn write_error(table: &str, stock: Option<i32>, e: rusqlite::Error) -> StockdataError {
    if let rusqlite::Error::SqliteFailure(err, Some(message)) = &e {
        match err.extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                if let Some(constraint) =
                    failed_column(message).and_then(|(t, c)| schema::unique_constraint(t, c))
                {
                    return StockdataError::UniqueViolation {
                        constraint: constraint.into(),
                    };
                }
            }
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                if let (Some(constraint), Some(stock)) = (schema::foreign_key(table), stock) {
                    return StockdataError::ForeignKeyViolation {
                        constraint: constraint.into(),
                        stock,
                    };
                }
            }
            ffi::SQLITE_CONSTRAINT_NOTNULL => {
                if let Some((t, c)) = failed_column(message) {
                    return StockdataError::not_null(t, c);
                }
            }
            _ => {}
        }
    }
    query_error(e)
}

fn row_id(conn: &Connection) -> Result<i32, StockdataError> {
    let rowid = conn.last_insert_rowid();
    i32::try_from(rowid).map_err(|_| StockdataError::Database {
        reason: format!("row id {rowid} exceeds the serial range"),
    })
}

fn conversion_error(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT).map_err(|e| conversion_error(idx, e))
}

fn optional_date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| NaiveDate::parse_from_str(&t, DATE_FORMAT).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn decimal_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Numeric84> {
    let text: String = row.get(idx)?;
    text.parse::<Numeric84>()
        .map_err(|e| conversion_error(idx, e))
}

fn stock_from_row(row: &Row<'_>) -> rusqlite::Result<Stock> {
    Ok(Stock {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

fn trade_from_row(row: &Row<'_>) -> rusqlite::Result<Trade> {
    Ok(Trade {
        id: row.get(0)?,
        stock: row.get(1)?,
        insider: row.get(2)?,
        relation: row.get(3)?,
        last_date: optional_date_column(row, 4)?,
        transaction: row.get(5)?,
        owner_type: row.get(6)?,
        shares_traded: row.get(7)?,
        last_price: decimal_column(row, 8)?,
        shares_held: row.get(9)?,
    })
}

fn price_from_row(row: &Row<'_>) -> rusqlite::Result<Price> {
    Ok(Price {
        stock: row.get(0)?,
        date: date_column(row, 1)?,
        open: decimal_column(row, 2)?,
        high: decimal_column(row, 3)?,
        low: decimal_column(row, 4)?,
        close: decimal_column(row, 5)?,
        volume: row.get(6)?,
    })
}

fn write_stock(conn: &Connection, name: &str) -> Result<Stock, StockdataError> {
    conn.execute("INSERT INTO stock (name) VALUES (?1)", params![name])
        .map_err(|e| write_error(STOCK, None, e))?;
    Ok(Stock::new(row_id(conn)?, name))
}

fn write_trade(conn: &Connection, trade: &NewTrade) -> Result<Trade, StockdataError> {
    let record = trade.validate()?;
    conn.execute(
        "INSERT INTO trade (stock, insider, relation, last_date, \"transaction\", owner_type,
                            shares_traded, last_price, shares_held)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            record.stock,
            record.insider,
            record.relation,
            record.last_date.map(|d| d.format(DATE_FORMAT).to_string()),
            record.transaction,
            record.owner_type,
            record.shares_traded,
            record.last_price.to_string(),
            record.shares_held
        ],
    )
    .map_err(|e| write_error(TRADE, record.stock, e))?;
    let id = row_id(conn)?;
    Ok(record.into_trade(id))
}

fn write_price(conn: &Connection, price: &NewPrice) -> Result<Price, StockdataError> {
    let price = price.validate()?;
    conn.execute(
        "INSERT INTO price (stock, date, open, high, low, close, volume)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            price.stock,
            price.date.format(DATE_FORMAT).to_string(),
            price.open.to_string(),
            price.high.to_string(),
            price.low.to_string(),
            price.close.to_string(),
            price.volume
        ],
    )
    .map_err(|e| write_error(PRICE, price.stock, e))?;
    Ok(price)
}

fn query_rows<T>(
    conn: &Connection,
    query: &str,
    stock_id: i32,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>, StockdataError> {
    let mut stmt = conn.prepare(query).map_err(query_error)?;
    let rows = stmt.query_map(params![stock_id], map).map_err(query_error)?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(query_error)?);
    }
    Ok(out)
}

impl StockStore for SqliteAdapter {
    fn initialize_schema(&self) -> Result<(), StockdataError> {
        let conn = self.conn()?;
        conn.execute_batch(Dialect::Sqlite.ddl())
            .map_err(query_error)?;
        info!("sqlite schema ready");
        Ok(())
    }

    fn insert_stock(&self, name: &str) -> Result<Stock, StockdataError> {
        let conn = self.conn()?;
        let stock = write_stock(&conn, name)?;
        debug!("inserted stock {stock}");
        Ok(stock)
    }

    fn find_stock(&self, name: &str) -> Result<Option<Stock>, StockdataError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT id, name FROM stock WHERE name = ?1")
            .map_err(query_error)?;
        let mut rows = stmt
            .query_map(params![name], stock_from_row)
            .map_err(query_error)?;
        rows.next().transpose().map_err(query_error)
    }

    fn list_stocks(&self) -> Result<Vec<Stock>, StockdataError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT id, name FROM stock ORDER BY id")
            .map_err(query_error)?;
        let rows = stmt.query_map([], stock_from_row).map_err(query_error)?;

        let mut stocks = Vec::new();
        for row in rows {
            stocks.push(row.map_err(query_error)?);
        }
        Ok(stocks)
    }

    fn insert_trade(&self, trade: &NewTrade) -> Result<Trade, StockdataError> {
        let conn = self.conn()?;
        let trade = write_trade(&conn, trade)?;
        debug!("inserted trade {} for {}", trade.id, trade.insider);
        Ok(trade)
    }

    fn insert_price(&self, price: &NewPrice) -> Result<Price, StockdataError> {
        let conn = self.conn()?;
        let price = write_price(&conn, price)?;
        debug!("inserted price bar for {}", price.date);
        Ok(price)
    }

    fn insert_stock_with_prices(
        &self,
        name: &str,
        prices: &[NewPrice],
    ) -> Result<Stock, StockdataError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        let stock = write_stock(&tx, name)?;
        for price in prices {
            write_price(&tx, &price.clone().with_stock(stock.id))?;
        }

        tx.commit().map_err(query_error)?;
        info!("inserted {} with {} price bars", stock, prices.len());
        Ok(stock)
    }

    fn insert_trades(
        &self,
        stock_id: i32,
        trades: &[NewTrade],
    ) -> Result<Vec<Trade>, StockdataError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        let mut inserted = Vec::with_capacity(trades.len());
        for trade in trades {
            inserted.push(write_trade(&tx, &trade.clone().with_stock(stock_id))?);
        }

        tx.commit().map_err(query_error)?;
        info!("inserted {} trades for stock {}", inserted.len(), stock_id);
        Ok(inserted)
    }

    fn trades_for_stock(&self, stock_id: i32) -> Result<Vec<Trade>, StockdataError> {
        let conn = self.conn()?;
        let query = format!("SELECT {TRADE_COLUMNS} FROM trade WHERE stock = ?1 ORDER BY id");
        query_rows(&conn, &query, stock_id, trade_from_row)
    }

    fn prices_for_stock(&self, stock_id: i32) -> Result<Vec<Price>, StockdataError> {
        let conn = self.conn()?;
        let query = format!("SELECT {PRICE_COLUMNS} FROM price WHERE stock = ?1 ORDER BY date");
        query_rows(&conn, &query, stock_id, price_from_row)
    }

    fn clear(&self) -> Result<(), StockdataError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;
        tx.execute_batch("DELETE FROM price; DELETE FROM trade; DELETE FROM stock;")
            .map_err(query_error)?;
        tx.commit().map_err(query_error)?;
        info!("cleared price, trade and stock");
        Ok(())
    }
}
