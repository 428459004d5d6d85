use thiserror::Error;

/// Errors that can occur during CLI command execution.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// I/O error
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Database could not be opened
    #[error("Database error: {0}")]
    Schema(#[from] meeple_db::SchemaError),

    /// Database query or write failed
    #[error("Database error: {0}")]
    Operation(#[from] meeple_db::OperationError),

    /// Storage failure surfaced through the store contract
    #[error(transparent)]
    Store(#[from] meeple_catalog::StoreError),

    /// Import or refresh failed
    #[error(transparent)]
    Reconcile(#[from] meeple_import::ReconcileError),

    /// BoardGameGeek client setup failed
    #[error("BoardGameGeek: {0}")]
    Bgg(#[from] meeple_bgg::BggError),

    /// Requested game does not exist
    #[error("{0}")]
    NotFound(String),

    /// Runtime creation or async error
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl CliError {
    pub(crate) fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub(crate) fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }
}
