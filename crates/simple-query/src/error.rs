//! Error types for simple-query

use thiserror::Error;

/// Result type alias for simple-query operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Error types for query construction and execution
#[derive(Debug, Error)]
pub enum QueryError {
    /// A builder or clause argument was rejected before any SQL was sent
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Query execution error reported by tokio-postgres
    #[error("Query error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// Statement error reported by any other driver, passed through verbatim
    #[error("Statement error: {0}")]
    Statement(String),

    /// Scope name not present in the source's registry
    #[error("Unknown scope: {0}")]
    UnknownScope(String),

    /// The connection's dialect has no streaming strategy
    #[error("Streaming is not supported for {0}")]
    UnsupportedStreaming(String),

    /// SQL rendered for one dialect was about to run on a connection of another
    #[error("Dialect mismatch: query rendered for {expected} but the connection is {actual}")]
    DialectMismatch { expected: String, actual: String },

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Error raised by a streaming callback
    #[error("Callback error: {0}")]
    Callback(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl QueryError {
    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Wrap an error returned from a streaming callback
    pub fn callback(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Callback(err.into())
    }

    /// Create a statement error from a driver message
    pub fn statement(message: impl Into<String>) -> Self {
        Self::Statement(message.into())
    }

    /// Check if this is an invalid argument error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Check if this error came from the database or driver
    pub fn is_database(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Statement(_))
    }

    /// Check if this is a streaming configuration error
    pub fn is_unsupported_streaming(&self) -> bool {
        matches!(self, Self::UnsupportedStreaming(_))
    }

    /// Check if the source and connection dialects disagreed
    pub fn is_dialect_mismatch(&self) -> bool {
        matches!(self, Self::DialectMismatch { .. })
    }

    /// Parse a tokio_postgres error, keeping the server message verbatim.
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        Self::Database(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for QueryError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Other(format!("Pool error: {err}"))
    }
}
