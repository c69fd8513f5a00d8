#![allow(dead_code)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use stockdata::adapters::memory_adapter::MemoryAdapter;
use stockdata::domain::price::NewPrice;
use stockdata::domain::trade::NewTrade;
use stockdata::ports::store_port::StockStore;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// The reference trade: J. Doe, 1000 shares at 12.3456, 5000 held.
pub fn doe_trade() -> NewTrade {
    NewTrade::new("J. Doe", 1000, dec!(12.3456), 5000)
}

pub fn make_bar(date: &str, close: Decimal) -> NewPrice {
    NewPrice::new(
        NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        close - dec!(1),
        close + dec!(1),
        close - dec!(2),
        close,
        1000,
    )
}

pub fn generate_bars(start_date: &str, count: usize, start_price: Decimal) -> Vec<NewPrice> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| {
            let close = start_price + Decimal::from(i as i64);
            NewPrice::new(
                start + chrono::Duration::days(i as i64),
                close,
                close + dec!(0.5),
                close - dec!(0.5),
                close,
                1000 + i as i64,
            )
        })
        .collect()
}

/// Every backend that can run without external services, schema initialised.
pub fn stores() -> Vec<(&'static str, Box<dyn StockStore>)> {
    let mut stores: Vec<(&'static str, Box<dyn StockStore>)> = Vec::new();
    stores.push(("memory", Box::new(MemoryAdapter::new())));

    #[cfg(feature = "sqlite")]
    {
        let sqlite = stockdata::adapters::sqlite_adapter::SqliteAdapter::in_memory().unwrap();
        stores.push(("sqlite", Box::new(sqlite)));
    }

    for (_, store) in &stores {
        store.initialize_schema().unwrap();
    }
    stores
}
