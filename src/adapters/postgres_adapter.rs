//! PostgreSQL storage adapter.

use super::pool_size;
use crate::domain::error::StockdataError;
use crate::domain::numeric::Numeric84;
use crate::domain::price::{NewPrice, Price};
use crate::domain::schema::{self, Dialect, PRICE, STOCK, TRADE};
use crate::domain::stock::Stock;
use crate::domain::trade::{NewTrade, Trade};
use crate::ports::config_port::ConfigPort;
use crate::ports::store_port::StockStore;
use log::{debug, info};
use postgres::error::SqlState;
use postgres::{GenericClient, NoTls, Row};
use r2d2::{Pool, PooledConnection};
use r2d2_postgres::PostgresConnectionManager;
use rust_decimal::Decimal;

type Manager = PostgresConnectionManager<NoTls>;

pub struct PostgresAdapter {
    pool: Pool<Manager>,
}

impl PostgresAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, StockdataError> {
        // Try [postgres] connection_string first, fall back to [database] conninfo
        let connection_string = config
            .get_string("postgres", "connection_string")
            .or_else(|| config.get_string("database", "conninfo"))
            .ok_or_else(|| StockdataError::ConfigMissing {
                section: "database".into(),
                key: "conninfo".into(),
            })?;

        let pg_config: postgres::Config =
            connection_string
                .parse()
                .map_err(|e: postgres::Error| StockdataError::ConfigInvalid {
                    section: "postgres".into(),
                    key: "connection_string".into(),
                    reason: e.to_string(),
                })?;

        let pool_size = pool_size(config, "postgres")?;
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(PostgresConnectionManager::new(pg_config, NoTls))
            .map_err(|e: r2d2::Error| StockdataError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<Manager>, StockdataError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| StockdataError::Database {
                reason: e.to_string(),
            })
    }
}

fn query_error(e: postgres::Error) -> StockdataError {
    StockdataError::DatabaseQuery {
        reason: e.to_string(),
    }
}

/// Translate a failed write into `table` to the violated constraint.
fn write_error(table: &str, stock: Option<i32>, e: postgres::Error) -> StockdataError {
    if let Some(db) = e.as_db_error() {
        let code = db.code();
        if *code == SqlState::UNIQUE_VIOLATION {
            if let Some(constraint) = db.constraint() {
                return StockdataError::UniqueViolation {
                    constraint: constraint.into(),
                };
            }
        } else if *code == SqlState::FOREIGN_KEY_VIOLATION {
            let constraint = db.constraint().or_else(|| schema::foreign_key(table));
            if let (Some(constraint), Some(stock)) = (constraint, stock) {
                return StockdataError::ForeignKeyViolation {
                    constraint: constraint.into(),
                    stock,
                };
            }
        } else if *code == SqlState::NOT_NULL_VIOLATION {
            if let Some(column) = db.column() {
                return StockdataError::not_null(db.table().unwrap_or(table), column);
            }
        }
    }
    query_error(e)
}

fn numeric(row: &Row, idx: usize) -> Result<Numeric84, StockdataError> {
    let value: Decimal = row.try_get(idx).map_err(query_error)?;
    Numeric84::new(value).ok_or_else(|| StockdataError::DatabaseQuery {
        reason: format!("stored value {value} does not fit NUMERIC(8,4)"),
    })
}

fn stock_from_row(row: &Row) -> Stock {
    Stock {
        id: row.get(0),
        name: row.get(1),
    }
}

fn trade_from_row(row: &Row) -> Result<Trade, StockdataError> {
    Ok(Trade {
        id: row.get(0),
        stock: row.get(1),
        insider: row.get(2),
        relation: row.get(3),
        last_date: row.get(4),
        transaction: row.get(5),
        owner_type: row.get(6),
        shares_traded: row.get(7),
        last_price: numeric(row, 8)?,
        shares_held: row.get(9),
    })
}

fn price_from_row(row: &Row) -> Result<Price, StockdataError> {
    Ok(Price {
        stock: row.get(0),
        date: row.get(1),
        open: numeric(row, 2)?,
        high: numeric(row, 3)?,
        low: numeric(row, 4)?,
        close: numeric(row, 5)?,
        volume: row.get(6),
    })
}

fn write_stock(client: &mut impl GenericClient, name: &str) -> Result<Stock, StockdataError> {
    let row = client
        .query_one("INSERT INTO stock (name) VALUES ($1) RETURNING id", &[&name])
        .map_err(|e| write_error(STOCK, None, e))?;
    Ok(Stock::new(row.get(0), name))
}

fn write_trade(client: &mut impl GenericClient, trade: &NewTrade) -> Result<Trade, StockdataError> {
    let record = trade.validate()?;
    let last_price = record.last_price.value();
    let row = client
        .query_one(
            "INSERT INTO trade (stock, insider, relation, last_date, \"transaction\", owner_type, \
                                shares_traded, last_price, shares_held) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING id",
            &[
                &record.stock,
                &record.insider,
                &record.relation,
                &record.last_date,
                &record.transaction,
                &record.owner_type,
                &record.shares_traded,
                &last_price,
                &record.shares_held,
            ],
        )
        .map_err(|e| write_error(TRADE, record.stock, e))?;
    Ok(record.into_trade(row.get(0)))
}

fn write_price(client: &mut impl GenericClient, price: &NewPrice) -> Result<Price, StockdataError> {
    let price = price.validate()?;
    client
        .execute(
            "INSERT INTO price (stock, date, open, high, low, close, volume) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
            &[
                &price.stock,
                &price.date,
                &price.open.value(),
                &price.high.value(),
                &price.low.value(),
                &price.close.value(),
                &price.volume,
            ],
        )
        .map_err(|e| write_error(PRICE, price.stock, e))?;
    Ok(price)
}

impl StockStore for PostgresAdapter {
    fn initialize_schema(&self) -> Result<(), StockdataError> {
        self.conn()?
            .batch_execute(Dialect::Postgres.ddl())
            .map_err(query_error)?;
        info!("postgres schema ready");
        Ok(())
    }

    fn insert_stock(&self, name: &str) -> Result<Stock, StockdataError> {
        let mut conn = self.conn()?;
        let stock = write_stock(&mut *conn, name)?;
        debug!("inserted stock {stock}");
        Ok(stock)
    }

    fn find_stock(&self, name: &str) -> Result<Option<Stock>, StockdataError> {
        let rows = self
            .conn()?
            .query("SELECT id, name FROM stock WHERE name = $1", &[&name])
            .map_err(query_error)?;
        Ok(rows.first().map(stock_from_row))
    }

    fn list_stocks(&self) -> Result<Vec<Stock>, StockdataError> {
        let rows = self
            .conn()?
            .query("SELECT id, name FROM stock ORDER BY id", &[])
            .map_err(query_error)?;
        Ok(rows.iter().map(stock_from_row).collect())
    }

    fn insert_trade(&self, trade: &NewTrade) -> Result<Trade, StockdataError> {
        let mut conn = self.conn()?;
        let trade = write_trade(&mut *conn, trade)?;
        debug!("inserted trade {} for {}", trade.id, trade.insider);
        Ok(trade)
    }

    fn insert_price(&self, price: &NewPrice) -> Result<Price, StockdataError> {
        let mut conn = self.conn()?;
        let price = write_price(&mut *conn, price)?;
        debug!("inserted price bar for {}", price.date);
        Ok(price)
    }

    fn insert_stock_with_prices(
        &self,
        name: &str,
        prices: &[NewPrice],
    ) -> Result<Stock, StockdataError> {
        let mut conn = self.conn()?;
        let mut tx = conn.transaction().map_err(query_error)?;

        let stock = write_stock(&mut tx, name)?;
        for price in prices {
            write_price(&mut tx, &price.clone().with_stock(stock.id))?;
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
        let mut tx = conn.transaction().map_err(query_error)?;

        let mut inserted = Vec::with_capacity(trades.len());
        for trade in trades {
            inserted.push(write_trade(&mut tx, &trade.clone().with_stock(stock_id))?);
        }

        tx.commit().map_err(query_error)?;
        info!("inserted {} trades for stock {}", inserted.len(), stock_id);
        Ok(inserted)
    }

    fn trades_for_stock(&self, stock_id: i32) -> Result<Vec<Trade>, StockdataError> {
        let rows = self
            .conn()?
            .query(
                "SELECT id, stock, insider, relation, last_date, \"transaction\", owner_type, \
                        shares_traded, last_price, shares_held \
                 FROM trade WHERE stock = $1 ORDER BY id",
                &[&stock_id],
            )
            .map_err(query_error)?;
        rows.iter().map(trade_from_row).collect()
    }

    fn prices_for_stock(&self, stock_id: i32) -> Result<Vec<Price>, StockdataError> {
        let rows = self
            .conn()?
            .query(
                "SELECT stock, date, open, high, low, close, volume \
                 FROM price WHERE stock = $1 ORDER BY date",
                &[&stock_id],
            )
            .map_err(query_error)?;
        rows.iter().map(price_from_row).collect()
    }

    fn clear(&self) -> Result<(), StockdataError> {
        let mut conn = self.conn()?;
        let mut tx = conn.transaction().map_err(query_error)?;
        tx.batch_execute("DELETE FROM price; DELETE FROM trade; DELETE FROM stock;")
            .map_err(query_error)?;
        tx.commit().map_err(query_error)?;
        info!("cleared price, trade and stock");
        Ok(())
    }
}
