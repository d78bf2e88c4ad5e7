//! Store error types.

use std::path::PathBuf;

/// Store error type.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O error while writing an uploaded file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record with the given id does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Record kind (e.g., "static file").
        entity: &'static str,
        /// Primary key that was looked up.
        id: i64,
    },

    /// No active page with the given permalink.
    #[error("Page not found: {0}")]
    PageNotFound(String),

    /// Field failed validation.
    #[error("Invalid {field}: {message}")]
    Invalid {
        /// Field name (e.g., "permalink").
        field: &'static str,
        /// What is wrong with the value.
        message: String,
    },

    /// A page with this permalink already exists.
    #[error("A page with permalink {0:?} already exists")]
    DuplicatePermalink(String),

    /// A static file with this name already exists on disk or in the database.
    #[error(
        "Static file {0:?} already exists. Choose a unique name; \
         use foldername/filename to upload into a folder"
    )]
    DuplicateFilename(String),

    /// Removing a previously stored file failed for a reason other than absence.
    #[error("Failed to remove {}: {source}", path.display())]
    FileCleanup {
        /// File that could not be removed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Create an [`StoreError::Invalid`] error.
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Check whether a sqlx error is a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Check whether a sqlx error is a FOREIGN KEY constraint violation.
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}
