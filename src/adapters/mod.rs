//! Concrete adapter implementations for ports.

pub mod file_config_adapter;
pub mod memory_adapter;
#[cfg(feature = "postgres")]
pub mod postgres_adapter;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;

use crate::domain::error::StockdataError;
use crate::ports::config_port::ConfigPort;
use crate::ports::store_port::StockStore;
use std::fmt;
use std::str::FromStr;

/// Storage backends selectable with `[database] backend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Sqlite,
    Postgres,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Memory => write!(f, "memory"),
            Backend::Sqlite => write!(f, "sqlite"),
            Backend::Postgres => write!(f, "postgres"),
        }
    }
}

impl FromStr for Backend {
    type Err = StockdataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(Backend::Memory),
            "sqlite" => Ok(Backend::Sqlite),
            "postgres" | "postgresql" => Ok(Backend::Postgres),
            other => Err(StockdataError::ConfigInvalid {
                section: "database".into(),
                key: "backend".into(),
                reason: format!("unknown backend {other:?}"),
            }),
        }
    }
}

impl Backend {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, StockdataError> {
        match config.get_string("database", "backend") {
            Some(name) => name.parse(),
            None => Ok(Backend::Sqlite),
        }
    }
}

/// `[<section>] pool_size`, default 4.
pub(crate) fn pool_size(config: &dyn ConfigPort, section: &str) -> Result<u32, StockdataError> {
    let size = config.get_int(section, "pool_size", 4);
    u32::try_from(size)
        .ok()
        .filter(|s| *s >= 1)
        .ok_or_else(|| StockdataError::ConfigInvalid {
            section: section.into(),
            key: "pool_size".into(),
            reason: format!("must be at least 1, got {size}"),
        })
}

/// Open the store named by `[database] backend`.
pub fn open_store(
    config: &dyn ConfigPort,
) -> Result<Box<dyn StockStore + Send + Sync>, StockdataError> {
    let backend = Backend::from_config(config)?;
    log::debug!("using {backend} backend");
    match backend {
        Backend::Memory => Ok(Box::new(memory_adapter::MemoryAdapter::new())),
        #[cfg(feature = "sqlite")]
        Backend::Sqlite => Ok(Box::new(sqlite_adapter::SqliteAdapter::from_config(config)?)),
        #[cfg(feature = "postgres")]
        Backend::Postgres => Ok(Box::new(postgres_adapter::PostgresAdapter::from_config(
            config,
        )?)),
        #[allow(unreachable_patterns)]
        other => Err(StockdataError::ConfigInvalid {
            section: "database".into(),
            key: "backend".into(),
            reason: format!("{other} feature is not enabled in this build"),
        }),
    }
}
