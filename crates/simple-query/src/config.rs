//! Execution configuration.

use tracing::Level;

use crate::logging::SqlLogger;

/// Rows fetched per `FETCH` when streaming, unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Prefix of server-side cursor names.
pub const DEFAULT_CURSOR_PREFIX: &str = "simple_query_cursor";

/// Settings applied when a builder executes.
///
/// # Example
/// ```ignore
/// use simple_query::ExecConfig;
///
/// let config = ExecConfig::new()
///     .batch_size(500)
///     .log_level(tracing::Level::INFO)
///     .max_sql_length(1000);
/// ```
#[derive(Debug, Clone)]
pub struct ExecConfig {
    /// Rows per fetch when streaming through a cursor.
    pub batch_size: usize,
    /// Cursor names are `<prefix>_<builder id>`.
    pub cursor_prefix: String,
    /// SQL logging.
    pub logger: SqlLogger,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            cursor_prefix: DEFAULT_CURSOR_PREFIX.to_string(),
            logger: SqlLogger::default(),
        }
    }
}

impl ExecConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn cursor_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cursor_prefix = prefix.into();
        self
    }

    pub fn log_level(mut self, level: Level) -> Self {
        self.logger = self.logger.level(level);
        self
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.logger = self.logger.max_sql_length(len);
        self
    }

    pub fn no_truncate(mut self) -> Self {
        self.logger = self.logger.no_truncate();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ExecConfig::new();
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.cursor_prefix, "simple_query_cursor");
        assert_eq!(config.logger.level, Level::DEBUG);
        assert_eq!(config.logger.max_sql_length, Some(200));
    }

    #[test]
    fn builder_setters() {
        let config = ExecConfig::new()
            .batch_size(10)
            .cursor_prefix("export")
            .log_level(Level::INFO)
            .no_truncate();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.cursor_prefix, "export");
        assert_eq!(config.logger.level, Level::INFO);
        assert_eq!(config.logger.max_sql_length, None);
    }
}
