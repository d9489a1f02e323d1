use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExpenseError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a non-negative integer, got '{value}'")]
    InvalidNumber { value: String },

    #[error("Invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid month '{0}' (expected YYYY-MM)")]
    InvalidMonth(String),

    #[error("Only read-only statements can be executed here")]
    ReadOnly,

    #[error("Unknown insight: {0}")]
    UnknownInsight(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ExpenseError>;
