/// Connector-level database error
///
/// Raised while establishing or probing a connection; query errors stay in
/// the driver's own error type.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// MongoDB driver error
    #[cfg(feature = "mongodb")]
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// Connection failed after retries
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Health check failed
    #[error("Health check failed: {0}")]
    HealthCheckFailed(String),
}

/// Result type alias for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;
