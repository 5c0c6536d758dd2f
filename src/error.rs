use thiserror::Error;

/// Rejections produced while validating a raw filter specification.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FilterError {
    #[error("{field} must be a number, got '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{field} is out of range: {value}")]
    OutOfRange { field: &'static str, value: String },

    #[error("{min_field} ({min}) is greater than {max_field} ({max})")]
    InvertedBounds {
        min_field: &'static str,
        max_field: &'static str,
        min: f64,
        max: f64
    },

    #[error("{0} cannot be combined with {1}")]
    Conflicting(&'static str, &'static str),

    #[error("Unknown position '{0}' (expected P, IF, OF or FLEX)")]
    UnknownPosition(String)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error
    },

    #[error("Failed to parse exclusion list: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Cache TTL must be a positive number of seconds within range, got {0}")]
    InvalidCacheTtl(i64)
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid filter: {0}")]
    InvalidFilter(#[from] FilterError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Fact store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Player {0} not found")]
    UnknownPlayer(i32),

    #[error("Draft entry '{0}' not found")]
    UnknownEntry(String),

    #[error("User '{0}' not found")]
    UnknownUser(String),

    #[error("Failed to serialize output: {0}")]
    Output(#[from] serde_json::Error)
}
