//! Table layout and constraint names shared by every storage backend.
//!
//! Constraint names follow the names PostgreSQL generates for the declared
//! DDL, so every backend reports violations under the same identifiers.

use crate::domain::error::StockdataError;
use std::fmt;
use std::str::FromStr;

pub const STOCK: &str = "stock";
pub const TRADE: &str = "trade";
pub const PRICE: &str = "price";

pub const STOCK_PKEY: &str = "stock_pkey";
pub const STOCK_NAME_KEY: &str = "stock_name_key";
pub const TRADE_PKEY: &str = "trade_pkey";
pub const TRADE_STOCK_FKEY: &str = "trade_stock_fkey";
pub const PRICE_DATE_KEY: &str = "price_date_key";
pub const PRICE_STOCK_FKEY: &str = "price_stock_fkey";

/// Name of the unique constraint covering `table.column`, if any.
pub fn unique_constraint(table: &str, column: &str) -> Option<&'static str> {
    match (table, column) {
        (STOCK, "id") => Some(STOCK_PKEY),
        (STOCK, "name") => Some(STOCK_NAME_KEY),
        (TRADE, "id") => Some(TRADE_PKEY),
        (PRICE, "date") => Some(PRICE_DATE_KEY),
        _ => None,
    }
}

/// Name of the foreign key held by `table`, if any.
pub fn foreign_key(table: &str) -> Option<&'static str> {
    match table {
        TRADE => Some(TRADE_STOCK_FKEY),
        PRICE => Some(PRICE_STOCK_FKEY),
        _ => None,
    }
}

/// SQL dialects the schema can be rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

impl Dialect {
    pub fn ddl(self) -> &'static str {
        match self {
            Dialect::Sqlite => SQLITE_DDL,
            Dialect::Postgres => POSTGRES_DDL,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Sqlite => write!(f, "sqlite"),
            Dialect::Postgres => write!(f, "postgres"),
        }
    }
}

impl FromStr for Dialect {
    type Err = StockdataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(Dialect::Sqlite),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            other => Err(StockdataError::InvalidInput {
                field: "dialect".into(),
                reason: format!("unknown dialect {other:?} (expected sqlite or postgres)"),
            }),
        }
    }
}

const POSTGRES_DDL: &str = r#"CREATE TABLE IF NOT EXISTS stock (
    id serial CONSTRAINT stock_pkey PRIMARY KEY,
    name varchar CONSTRAINT stock_name_key UNIQUE
);

CREATE TABLE IF NOT EXISTS trade (
    id serial CONSTRAINT trade_pkey PRIMARY KEY,
    stock integer CONSTRAINT trade_stock_fkey REFERENCES stock (id),
    insider varchar NOT NULL,
    relation varchar,
    last_date date,
    "transaction" varchar,
    owner_type varchar,
    shares_traded bigint NOT NULL,
    last_price numeric(8, 4) NOT NULL,
    shares_held bigint NOT NULL
);

-- date is unique system-wide, not per stock
CREATE TABLE IF NOT EXISTS price (
    stock integer CONSTRAINT price_stock_fkey REFERENCES stock (id),
    date date NOT NULL CONSTRAINT price_date_key UNIQUE,
    open numeric(8, 4) NOT NULL,
    high numeric(8, 4) NOT NULL,
    low numeric(8, 4) NOT NULL,
    close numeric(8, 4) NOT NULL,
    volume bigint NOT NULL
);
"#;

// Decimals are kept as TEXT so values stay exact; dates as ISO-8601 TEXT.
const SQLITE_DDL: &str = r#"CREATE TABLE IF NOT EXISTS stock (
    id INTEGER CONSTRAINT stock_pkey PRIMARY KEY AUTOINCREMENT,
    name TEXT CONSTRAINT stock_name_key UNIQUE
);

CREATE TABLE IF NOT EXISTS trade (
    id INTEGER CONSTRAINT trade_pkey PRIMARY KEY AUTOINCREMENT,
    stock INTEGER CONSTRAINT trade_stock_fkey REFERENCES stock (id),
    insider TEXT NOT NULL,
    relation TEXT,
    last_date TEXT,
    "transaction" TEXT,
    owner_type TEXT,
    shares_traded INTEGER NOT NULL,
    last_price TEXT NOT NULL,
    shares_held INTEGER NOT NULL
);

-- date is unique system-wide, not per stock
CREATE TABLE IF NOT EXISTS price (
    stock INTEGER CONSTRAINT price_stock_fkey REFERENCES stock (id),
    date TEXT NOT NULL CONSTRAINT price_date_key UNIQUE,
    open TEXT NOT NULL,
    high TEXT NOT NULL,
    low TEXT NOT NULL,
    close TEXT NOT NULL,
    volume INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_trade_stock ON trade(stock);
CREATE INDEX IF NOT EXISTS idx_price_stock ON price(stock);
"#;
