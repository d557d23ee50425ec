//! Error type shared by the persistence layer and the API.

use thiserror::Error;

use crate::workflow::WorkflowError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// A write would break the origin linkage or another store constraint.
    #[error("Integrity conflict: {0}")]
    IntegrityConflict(String),

    #[error("Database error: {0}")]
    Database(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::IntegrityConflict(message.unwrap_or_else(|| failure.to_string()))
            }
            other => Self::Database(other),
        }
    }
}

impl Error {
    /// Whether the error is caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Database(_))
    }
}
