//! Error types for the bookmark store.
//!
//! Every store operation returns [`StoreError`] via [`StoreResult`].

use rusqlite::ErrorCode;
use thiserror::Error;

/// Alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while talking to the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A table definition was rejected: bad identifier, empty column list,
    /// or a column clause the engine could not parse.
    #[error("schema error: {0}")]
    Schema(String),

    /// The engine refused a row because of a NOT NULL, UNIQUE, CHECK or
    /// foreign key constraint.
    #[error("constraint violation: {0}")]
    ConstraintViolation(#[source] rusqlite::Error),

    /// The store was used after [`crate::TableStore::close`].
    #[error("store closed")]
    StoreClosed,

    /// Any other SQLite failure, passed through unchanged.
    #[error("sqlite error: {0}")]
    Engine(#[from] rusqlite::Error),

    /// Configuration could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),
}

impl StoreError {
    /// Classify an engine error raised by a row write.
    pub(crate) fn from_write(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => Self::ConstraintViolation(err),
            _ => Self::Engine(err),
        }
    }

    /// Classify an engine error raised by DDL.
    ///
    /// Syntax errors arrive as [`rusqlite::Error::SqlInputError`] with the
    /// offending offset. Semantic rejections such as a duplicate column name
    /// arrive as the generic `SQLITE_ERROR`, which rusqlite exposes as
    /// [`ErrorCode::Unknown`].
    pub(crate) fn from_ddl(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqlInputError { .. } = err {
            return Self::Schema(err.to_string());
        }
        match err.sqlite_error_code() {
            Some(ErrorCode::Unknown) => Self::Schema(err.to_string()),
            _ => Self::Engine(err),
        }
    }

    /// True if the engine reported that the target table does not exist.
    pub fn is_no_such_table(&self) -> bool {
        match self {
            Self::Engine(err) => err.to_string().contains("no such table"),
            _ => false,
        }
    }
}
