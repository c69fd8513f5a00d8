//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use log::{LevelFilter, error, info};
use rust_decimal::Decimal;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::open_store;
use crate::domain::error::StockdataError;
use crate::domain::parse::{parse_count, parse_date, parse_decimal};
use crate::domain::price::{NewPrice, Price};
use crate::domain::schema::Dialect;
use crate::domain::trade::{NewTrade, Trade};
use crate::ports::config_port::ConfigPort;
use crate::ports::store_port::StockStore;

#[derive(Parser, Debug)]
#[command(
    name = "stockdata",
    about = "Issuer registry, insider trades and daily price bars"
)]
pub struct Cli {
    /// INI configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the schema DDL
    Schema {
        #[arg(long, default_value = "postgres")]
        dialect: Dialect,
    },
    /// Create the tables
    Init,
    /// Delete every stock, trade and price row
    Clear,
    /// Register an issuer and print its id
    AddStock { name: String },
    /// Record an insider trade and print its id
    AddTrade(TradeArgs),
    /// Record a daily price bar
    AddPrice(PriceArgs),
    /// Show a stock with its trades and prices
    Show { name: String },
}

/// Identifies the referenced stock, by name or by raw id.
#[derive(Args, Debug, Default)]
pub struct StockRef {
    /// Name of the referenced stock
    #[arg(long, conflicts_with = "stock_id")]
    pub stock: Option<String>,
    /// Id of the referenced stock
    #[arg(long)]
    pub stock_id: Option<i32>,
}

impl StockRef {
    fn resolve(&self, store: &dyn StockStore) -> Result<Option<i32>, StockdataError> {
        match (&self.stock, self.stock_id) {
            (Some(name), _) => Ok(Some(store.require_stock(name)?.id)),
            (None, id) => Ok(id),
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct TradeArgs {
    #[command(flatten)]
    pub stock: StockRef,
    #[arg(long)]
    pub insider: Option<String>,
    #[arg(long)]
    pub relation: Option<String>,
    #[arg(long, value_parser = parse_date)]
    pub last_date: Option<NaiveDate>,
    #[arg(long)]
    pub transaction: Option<String>,
    #[arg(long)]
    pub owner_type: Option<String>,
    #[arg(long, value_parser = parse_count, allow_hyphen_values = true)]
    pub shares_traded: Option<i64>,
    #[arg(long, value_parser = parse_decimal, allow_hyphen_values = true)]
    pub last_price: Option<Decimal>,
    #[arg(long, value_parser = parse_count, allow_hyphen_values = true)]
    pub shares_held: Option<i64>,
}

impl TradeArgs {
    fn into_new_trade(self, stock: Option<i32>) -> NewTrade {
        NewTrade {
            stock,
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

#[derive(Args, Debug, Default)]
pub struct PriceArgs {
    #[command(flatten)]
    pub stock: StockRef,
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,
    #[arg(long, value_parser = parse_decimal, allow_hyphen_values = true)]
    pub open: Option<Decimal>,
    #[arg(long, value_parser = parse_decimal, allow_hyphen_values = true)]
    pub high: Option<Decimal>,
    #[arg(long, value_parser = parse_decimal, allow_hyphen_values = true)]
    pub low: Option<Decimal>,
    #[arg(long, value_parser = parse_decimal, allow_hyphen_values = true)]
    pub close: Option<Decimal>,
    #[arg(long, value_parser = parse_count, allow_hyphen_values = true)]
    pub volume: Option<i64>,
}

impl PriceArgs {
    fn into_new_price(self, stock: Option<i32>) -> NewPrice {
        NewPrice {
            stock,
            date: self.date,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    let config = match cli.config.as_deref().map(load_config).transpose() {
        Ok(c) => c,
        Err(e) => {
            init_logging(LevelFilter::Info);
            error!("{e}");
            return (&e).into();
        }
    };

    match log_level(cli.verbose, config.as_ref().map(|c| c as &dyn ConfigPort)) {
        Ok(level) => init_logging(level),
        Err(e) => {
            init_logging(LevelFilter::Info);
            error!("{e}");
            return (&e).into();
        }
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match execute(cli.command, config.as_ref(), &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, StockdataError> {
    FileConfigAdapter::from_file(path).map_err(|e| StockdataError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// `-v` flags win over `[logging] level`; the default is `info`.
pub fn log_level(
    verbose: u8,
    config: Option<&dyn ConfigPort>,
) -> Result<LevelFilter, StockdataError> {
    match verbose {
        0 => match config.and_then(|c| c.get_string("logging", "level")) {
            Some(level) => level
                .trim()
                .parse()
                .map_err(|_| StockdataError::ConfigInvalid {
                    section: "logging".into(),
                    key: "level".into(),
                    reason: format!("unknown level {level:?}"),
                }),
            None => Ok(LevelFilter::Info),
        },
        1 => Ok(LevelFilter::Debug),
        _ => Ok(LevelFilter::Trace),
    }
}

fn init_logging(level: LevelFilter) {
    let mut builder = colog::default_builder();
    builder.filter(None, level);
    if builder.try_init().is_err() {
        // already installed (tests run several commands per process)
        log::set_max_level(level);
    }
}

pub fn execute(
    command: Command,
    config: Option<&FileConfigAdapter>,
    out: &mut dyn Write,
) -> Result<(), StockdataError> {
    if let Command::Schema { dialect } = command {
        write!(out, "{}", dialect.ddl())?;
        return Ok(());
    }

    let config = config.ok_or_else(|| StockdataError::InvalidInput {
        field: "--config".into(),
        reason: "required for this command".into(),
    })?;
    let store = open_store(config)?;
    execute_with_store(command, store.as_ref(), out)
}

/// Run a store command against an already opened store.
pub fn execute_with_store(
    command: Command,
    store: &dyn StockStore,
    out: &mut dyn Write,
) -> Result<(), StockdataError> {
    match command {
        Command::Schema { dialect } => write!(out, "{}", dialect.ddl())?,
        Command::Init => {
            store.initialize_schema()?;
            info!("schema initialized");
        }
        Command::Clear => {
            store.clear()?;
        }
        Command::AddStock { name } => {
            let stock = store.insert_stock(&name)?;
            writeln!(out, "{}", stock.id)?;
        }
        Command::AddTrade(args) => {
            let stock = args.stock.resolve(store)?;
            let trade = store.insert_trade(&args.into_new_trade(stock))?;
            writeln!(out, "{}", trade.id)?;
        }
        Command::AddPrice(args) => {
            let stock = args.stock.resolve(store)?;
            let price = store.insert_price(&args.into_new_price(stock))?;
            info!("stored price bar for {}", price.date);
        }
        Command::Show { name } => {
            let stock = store.require_stock(&name)?;
            writeln!(out, "{stock}")?;

            let trades = store.trades_for_stock(stock.id)?;
            writeln!(out, "trades: {}", trades.len())?;
            for trade in &trades {
                writeln!(out, "  {}", format_trade(trade))?;
            }

            let prices = store.prices_for_stock(stock.id)?;
            writeln!(out, "prices: {}", prices.len())?;
            for price in &prices {
                writeln!(out, "  {}", format_price(price))?;
            }
        }
    }
    Ok(())
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

pub fn format_trade(trade: &Trade) -> String {
    format!(
        "#{} {} | {} | {} | {} | {} | traded {} @ {} | held {}",
        trade.id,
        trade.insider,
        or_dash(trade.relation.as_deref()),
        trade
            .last_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string()),
        or_dash(trade.transaction.as_deref()),
        or_dash(trade.owner_type.as_deref()),
        trade.shares_traded,
        trade.last_price,
        trade.shares_held,
    )
}

pub fn format_price(price: &Price) -> String {
    format!(
        "{} O {} H {} L {} C {} V {}",
        price.date, price.open, price.high, price.low, price.close, price.volume
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_adapter::MemoryAdapter;
    use rust_decimal_macros::dec;

    #[test]
    fn parse_add_trade_arguments() {
        let cli = Cli::try_parse_from([
            "stockdata",
            "-c",
            "stockdata.ini",
            "add-trade",
            "--stock",
            "ACME",
            "--insider",
            "J. Doe",
            "--last-date",
            "03/14/2018",
            "--shares-traded",
            "-1,000",
            "--last-price",
            "12.3456",
            "--shares-held",
            "5,000",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("stockdata.ini")));
        match cli.command {
            Command::AddTrade(args) => {
                assert_eq!(args.stock.stock.as_deref(), Some("ACME"));
                assert_eq!(args.last_date, NaiveDate::from_ymd_opt(2018, 3, 14));
                assert_eq!(args.shares_traded, Some(-1000));
                assert_eq!(args.last_price, Some(dec!(12.3456)));
                assert_eq!(args.shares_held, Some(5000));
                assert_eq!(args.relation, None);
            }
            other => panic!("expected AddTrade, got: {other:?}"),
        }
    }

    #[test]
    fn negative_values_parse_as_separate_arguments() {
        let cli = Cli::try_parse_from([
            "stockdata", "add-price", "--date", "2018-03-14", "--open", "-0.5", "--high",
            "-0.25", "--low", "-1", "--close", "-0.75", "--volume", "-3",
        ])
        .unwrap();
        match cli.command {
            Command::AddPrice(args) => {
                assert_eq!(args.open, Some(dec!(-0.5)));
                assert_eq!(args.low, Some(dec!(-1)));
                assert_eq!(args.close, Some(dec!(-0.75)));
                assert_eq!(args.volume, Some(-3));
            }
            other => panic!("expected AddPrice, got: {other:?}"),
        }

        let cli = Cli::try_parse_from([
            "stockdata", "add-trade", "--last-price", "-5.25", "--shares-held", "-3",
        ])
        .unwrap();
        match cli.command {
            Command::AddTrade(args) => {
                assert_eq!(args.last_price, Some(dec!(-5.25)));
                assert_eq!(args.shares_held, Some(-3));
            }
            other => panic!("expected AddTrade, got: {other:?}"),
        }
    }

    #[test]
    fn stock_and_stock_id_conflict() {
        let result = Cli::try_parse_from([
            "stockdata",
            "add-price",
            "--stock",
            "ACME",
            "--stock-id",
            "1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn bad_date_is_rejected_by_the_parser() {
        let result = Cli::try_parse_from(["stockdata", "add-price", "--date", "yesterday"]);
        assert!(result.is_err());
    }

    #[test]
    fn schema_dialect_defaults_to_postgres() {
        let cli = Cli::try_parse_from(["stockdata", "schema"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Schema {
                dialect: Dialect::Postgres
            }
        ));
    }

    #[test]
    fn log_level_precedence() {
        let config = FileConfigAdapter::from_string("[logging]\nlevel = warn\n").unwrap();
        assert_eq!(log_level(0, None).unwrap(), LevelFilter::Info);
        assert_eq!(log_level(0, Some(&config)).unwrap(), LevelFilter::Warn);
        assert_eq!(log_level(1, Some(&config)).unwrap(), LevelFilter::Debug);
        assert_eq!(log_level(3, None).unwrap(), LevelFilter::Trace);
    }

    #[test]
    fn log_level_rejects_unknown_names() {
        let config = FileConfigAdapter::from_string("[logging]\nlevel = loud\n").unwrap();
        assert!(matches!(
            log_level(0, Some(&config)),
            Err(StockdataError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn store_commands_require_config() {
        let mut out = Vec::new();
        let result = execute(Command::Init, None, &mut out);
        match result {
            Err(StockdataError::InvalidInput { field, .. }) => assert_eq!(field, "--config"),
            other => panic!("expected InvalidInput, got: {other:?}"),
        }
    }

    #[test]
    fn add_trade_with_unknown_stock_name() {
        let store = MemoryAdapter::new();
        let args = TradeArgs {
            stock: StockRef {
                stock: Some("NOPE".into()),
                stock_id: None,
            },
            ..TradeArgs::default()
        };
        let mut out = Vec::new();
        match execute_with_store(Command::AddTrade(args), &store, &mut out) {
            Err(StockdataError::StockNotFound { name }) => assert_eq!(name, "NOPE"),
            other => panic!("expected StockNotFound, got: {other:?}"),
        }
    }

    #[test]
    fn format_trade_uses_dashes_for_missing_columns() {
        let trade = NewTrade::new("J. Doe", 1000, dec!(12.3456), 5000)
            .validate()
            .unwrap()
            .into_trade(1);
        assert_eq!(
            format_trade(&trade),
            "#1 J. Doe | - | - | - | - | traded 1000 @ 12.3456 | held 5000"
        );
    }
}
