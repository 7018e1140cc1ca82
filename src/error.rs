//! Typed errors and their stable codes.

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("duplicate record: {0}")]
    DuplicateRecord(String),
    #[error("duplicate column: record {record} column {column}")]
    DuplicateColumn { record: String, column: String },
    #[error("more than one primary column on record {0}")]
    MultiplePrimary(String),
    #[error("auto-generated column must be primary: record {record} column {column}")]
    InvalidAutoColumn { record: String, column: String },
    #[error("config load: {0}")]
    Load(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("schema: {0}")]
    Schema(String),
    #[error("permission: {0}")]
    Permission(String),
    #[error("nullability: {0}")]
    Nullability(String),
    #[error("length: {0}")]
    Length(String),
    #[error("uniqueness: {0}")]
    Uniqueness(String),
    #[error("execution: {0}")]
    Execution(#[source] BoxError),
}

/// Discriminant of [`AppError`], for callers that branch on the failure kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Config,
    Schema,
    Permission,
    Nullability,
    Length,
    Uniqueness,
    Execution,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Config => "config_error",
            ErrorKind::Schema => "schema_error",
            ErrorKind::Permission => "permission_error",
            ErrorKind::Nullability => "nullability_error",
            ErrorKind::Length => "length_error",
            ErrorKind::Uniqueness => "uniqueness_error",
            ErrorKind::Execution => "execution_error",
        }
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Config(_) => ErrorKind::Config,
            AppError::Schema(_) => ErrorKind::Schema,
            AppError::Permission(_) => ErrorKind::Permission,
            AppError::Nullability(_) => ErrorKind::Nullability,
            AppError::Length(_) => ErrorKind::Length,
            AppError::Uniqueness(_) => ErrorKind::Uniqueness,
            AppError::Execution(_) => ErrorKind::Execution,
        }
    }

    /// Wrap any store-side failure without altering it.
    pub fn execution<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        AppError::Execution(err.into())
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Execution(Box::new(err))
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Execution(Box::new(err))
    }
}
