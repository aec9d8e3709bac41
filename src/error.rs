use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbMakerError {
    /// Opening a connection failed. On the native path this triggers the ODBC fallback; it only
    /// reaches the caller when the fallback fails too.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A prepare/execute/fetch/transaction call against the driver failed.
    #[error("Driver execution error: {0}")]
    DriverExecutionError(String),

    /// The DBMaker dialect cannot express the requested operation.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A catalog lookup returned no row or an empty value.
    #[error("Catalog introspection error: {0}")]
    CatalogIntrospection(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Parameter error: {0}")]
    ParameterError(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("Other database error: {0}")]
    Other(String),
}

impl DbMakerError {
    pub(crate) fn unsupported(what: &str) -> Self {
        DbMakerError::UnsupportedOperation(format!("DBMaker does not support {what}."))
    }
}
