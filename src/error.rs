//! Error types for the query pipeline.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Each variant maps to one error kind the caller can act on: an unsafe query
//! blocked by the validator needs a different response than a database outage
//! or a failing translation backend.

use serde::Serialize;
use thiserror::Error;

/// Serializable error kind reported to callers of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Connection,
    Backend,
    UnsafeQuery,
    Execution,
    InvalidInput,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Connection => "connection",
            Self::Backend => "backend",
            Self::UnsafeQuery => "unsafe_query",
            Self::Execution => "execution",
            Self::InvalidInput => "invalid_input",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Translation backend failed: {message}")]
    Backend { message: String },

    #[error("Unsafe SQL generated: {reason}")]
    UnsafeQuery {
        /// The rejected statement, verbatim.
        sql: String,
        reason: String,
    },

    #[error("Database error: {message}")]
    Execution {
        message: String,
        /// e.g., "42P01" for undefined table
        sql_state: Option<String>,
    },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Request cancelled during {operation}")]
    Cancelled { operation: String },
}

impl PipelineError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Create an unsafe query error carrying the offending statement.
    pub fn unsafe_query(sql: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsafeQuery {
            sql: sql.into(),
            reason: reason.into(),
        }
    }

    /// Create an execution error with optional SQL state.
    pub fn execution(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::Execution {
            message: message.into(),
            sql_state,
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a cancellation error.
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// Wrap any introspection failure as a connection error.
    ///
    /// Schema inspection is the first database contact of every request, so
    /// both connect-time and query-time failures surface as `Connection`.
    pub fn introspection(err: sqlx::Error) -> Self {
        match Self::from(err) {
            err @ Self::Connection { .. } => err,
            other => Self::connection(
                format!("Schema introspection failed: {}", other),
                "Check that the database is reachable and the schema is readable",
            ),
        }
    }

    /// Get the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Backend { .. } => ErrorKind::Backend,
            Self::UnsafeQuery { .. } => ErrorKind::UnsafeQuery,
            Self::Execution { .. } => ErrorKind::Execution,
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// The statement the validator refused, if this is an unsafe query.
    pub fn rejected_sql(&self) -> Option<&str> {
        match self {
            Self::UnsafeQuery { sql, .. } => Some(sql),
            _ => None,
        }
    }
}

/// Convert sqlx errors to PipelineError.
///
/// Transport-level failures become `Connection`; everything the database
/// reports about the statement itself becomes `Execution`.
impl From<sqlx::Error> for PipelineError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => PipelineError::connection(
                msg.to_string(),
                "Check the connection string format and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                PipelineError::execution(db_err.message(), code)
            }
            sqlx::Error::PoolTimedOut => PipelineError::connection(
                "Timed out acquiring a database connection",
                "Check database server load and the connect timeout",
            ),
            sqlx::Error::PoolClosed => {
                PipelineError::connection("Connection pool is closed", "Restart the service")
            }
            sqlx::Error::Io(io_err) => PipelineError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => PipelineError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => PipelineError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnDecode { index, source } => {
                PipelineError::execution(format!("Failed to decode column {}: {}", index, source), None)
            }
            sqlx::Error::Decode(source) => {
                PipelineError::execution(format!("Decode error: {}", source), None)
            }
            sqlx::Error::WorkerCrashed => PipelineError::connection(
                "Database worker crashed",
                "Restart the service",
            ),
            other => PipelineError::execution(format!("Database error: {}", other), None),
        }
    }
}

/// Result type alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::connection("Failed to connect", "Check credentials");
        assert!(err.to_string().contains("Connection failed"));
    }

    #[test]
    fn test_unsafe_query_keeps_statement() {
        let err = PipelineError::unsafe_query("DROP TABLE \"Invoice\";", "forbidden keyword 'drop'");
        match &err {
            PipelineError::UnsafeQuery { sql, .. } => assert_eq!(sql, "DROP TABLE \"Invoice\";"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().contains("Unsafe SQL generated"));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(PipelineError::configuration("x").kind(), ErrorKind::Configuration);
        assert_eq!(PipelineError::connection("x", "y").kind(), ErrorKind::Connection);
        assert_eq!(PipelineError::backend("x").kind(), ErrorKind::Backend);
        assert_eq!(PipelineError::unsafe_query("x", "y").kind(), ErrorKind::UnsafeQuery);
        assert_eq!(PipelineError::execution("x", None).kind(), ErrorKind::Execution);
        assert_eq!(PipelineError::invalid_input("x").kind(), ErrorKind::InvalidInput);
        assert_eq!(PipelineError::cancelled("x").kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::UnsafeQuery).unwrap();
        assert_eq!(json, "\"unsafe_query\"");
        assert_eq!(ErrorKind::UnsafeQuery.to_string(), "unsafe_query");
    }

    #[test]
    fn test_error_suggestion() {
        let err = PipelineError::connection("refused", "Check the host");
        assert_eq!(err.suggestion(), Some("Check the host"));
        assert_eq!(PipelineError::backend("x").suggestion(), None);
    }

    #[test]
    fn test_rejected_sql() {
        let err = PipelineError::unsafe_query("DELETE\"x\"", "forbidden keyword 'delete'");
        assert_eq!(err.rejected_sql(), Some("DELETE\"x\""));
        assert_eq!(PipelineError::execution("x", None).rejected_sql(), None);
    }

    #[test]
    fn test_sqlx_pool_timeout_is_connection() {
        let err: PipelineError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.kind(), ErrorKind::Connection);
    }

    #[test]
    fn test_sqlx_row_not_found_is_execution() {
        let err: PipelineError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.kind(), ErrorKind::Execution);
    }

    #[test]
    fn test_introspection_always_connection() {
        let err = PipelineError::introspection(sqlx::Error::RowNotFound);
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(err.to_string().contains("Schema introspection failed"));
    }
}
