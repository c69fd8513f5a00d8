//! Domain error types.

/// Top-level error type for stockdata.
#[derive(Debug, thiserror::Error)]
pub enum StockdataError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("duplicate key value violates unique constraint \"{constraint}\"")]
    UniqueViolation { constraint: String },

    #[error("insert violates foreign key constraint \"{constraint}\": stock {stock} is not present")]
    ForeignKeyViolation { constraint: String, stock: i32 },

    #[error("null value in column \"{column}\" of relation \"{table}\" violates not-null constraint")]
    NotNullViolation { table: String, column: String },

    #[error("numeric field overflow in {table}.{column}: {value} does not fit NUMERIC(8,4)")]
    NumericOverflow {
        table: String,
        column: String,
        value: String,
    },

    #[error("invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("no stock named {name}")]
    StockNotFound { name: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StockdataError {
    pub(crate) fn not_null(table: &str, column: &str) -> Self {
        StockdataError::NotNullViolation {
            table: table.into(),
            column: column.into(),
        }
    }

    /// True for the write-time constraint failures of the storage contract.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            StockdataError::UniqueViolation { .. }
                | StockdataError::ForeignKeyViolation { .. }
                | StockdataError::NotNullViolation { .. }
                | StockdataError::NumericOverflow { .. }
        )
    }
}

impl From<&StockdataError> for std::process::ExitCode {
    fn from(err: &StockdataError) -> Self {
        let code: u8 = match err {
            StockdataError::Io(_) => 1,
            StockdataError::ConfigParse { .. }
            | StockdataError::ConfigMissing { .. }
            | StockdataError::ConfigInvalid { .. } => 2,
            StockdataError::Database { .. } | StockdataError::DatabaseQuery { .. } => 3,
            StockdataError::UniqueViolation { .. }
            | StockdataError::ForeignKeyViolation { .. }
            | StockdataError::NotNullViolation { .. }
            | StockdataError::NumericOverflow { .. } => 4,
            StockdataError::InvalidInput { .. } | StockdataError::StockNotFound { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
