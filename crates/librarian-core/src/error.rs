use thiserror::Error;

/// The severity of an [`ErrorCategory`] event, mirrored into the `errors`
/// catalog table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// Error categories a background task or request handler can report. See
/// spec §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    LibrarianNetworkAvailability,
    DataAvailability,
    Transfer,
    Programming,
    Store,
}

#[derive(Error, Debug)]
pub enum LibrarianError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store error: {0}")]
    Store(String),

    #[error("staged file not found: {0}")]
    NotStaged(String),

    #[error("file already present at destination: {0}")]
    AlreadyPresent(String),

    #[error("no store available to hold {requested} bytes (largest free: {largest_free})")]
    NoStoreAvailable { requested: u64, largest_free: u64 },

    #[error("store not found: {0}")]
    StoreNotFound(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("instance not found: {0}")]
    InstanceNotFound(String),

    #[error("librarian not found: {0}")]
    LibrarianNotFound(String),

    #[error("invalid instance type: {0}")]
    InvalidInstanceType(String),

    #[error("transfer error: {0}")]
    Transfer(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, LibrarianError>;
