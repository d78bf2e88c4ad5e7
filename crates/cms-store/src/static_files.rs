//! Static-file records and their on-disk files.
//!
//! Every mutation keeps the `static_files` table and the uploads directory in
//! step:
//!
//! - **create**: validate, write the file (never overwriting), insert the row.
//!   If the insert fails the new file is removed again.
//! - **replace**: validate, write the new file, then inside one transaction
//!   update the row and remove the old file. A failed removal rolls the row
//!   back and removes the new file. The old file is removed before the
//!   commit, so a failed commit also removes the new file and leaves the
//!   record pointing at a missing file (logged as an error).
//! - **delete**: inside one transaction delete the row and remove the file.
//!   A failed removal rolls the row back. A failed commit leaves the record
//!   pointing at a missing file (logged as an error).
//!
//! Removing a file that is already gone is not an error.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{StoreError, is_unique_violation};
use crate::models::StaticFile;
use crate::placement::validate_filename;
use crate::store::Store;

impl Store {
    /// All static files, ordered by name.
    pub async fn list_static_files(&self) -> Result<Vec<StaticFile>, StoreError> {
        let files = sqlx::query_as("SELECT * FROM static_files ORDER BY filename")
            .fetch_all(&self.pool)
            .await?;
        Ok(files)
    }

    /// Look up a static file by id.
    pub async fn get_static_file(&self, id: i64) -> Result<Option<StaticFile>, StoreError> {
        let file = sqlx::query_as("SELECT * FROM static_files WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(file)
    }

    /// Absolute on-disk location of a static file.
    #[must_use]
    pub fn static_file_path(&self, file: &StaticFile) -> PathBuf {
        self.uploads.resolve(&file.file)
    }

    /// Store `content` under `filename` and record it.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Invalid`] if `filename` is not a safe relative name
    /// - [`StoreError::DuplicateFilename`] if a file named `filename` exists in
    ///   the uploads root, at its routed location, or in the database
    pub async fn create_static_file(
        &self,
        filename: &str,
        content: &[u8],
    ) -> Result<StaticFile, StoreError> {
        validate_filename(filename)?;
        self.uploads.check_available(filename)?;

        let relative = self.uploads.relative_path(filename);
        let path = self.uploads.resolve(&relative);
        write_new_file(&path, content, filename)?;

        let inserted = sqlx::query("INSERT INTO static_files (filename, file) VALUES (?, ?)")
            .bind(filename)
            .bind(&relative)
            .execute(&self.pool)
            .await;

        let id = match inserted {
            Ok(result) => result.last_insert_rowid(),
            Err(e) => {
                discard_file(&path);
                return Err(filename_error(e, filename));
            }
        };

        tracing::info!(id, filename, path = %path.display(), "Static file created");
        Ok(StaticFile {
            id,
            filename: filename.to_owned(),
            file: relative,
        })
    }

    /// Bind new `content` (and possibly a new `filename`) to an existing record.
    ///
    /// If the new location differs from the old one, the old file is removed.
    /// If it is the same location, the file is replaced atomically.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if no record has this id
    /// - [`StoreError::Invalid`] / [`StoreError::DuplicateFilename`] as for
    ///   [`Store::create_static_file`] (the uploads-root check only applies
    ///   when the name changes)
    /// - [`StoreError::FileCleanup`] if the old file could not be removed; the
    ///   record is left unchanged
    pub async fn replace_static_file(
        &self,
        id: i64,
        filename: &str,
        content: &[u8],
    ) -> Result<StaticFile, StoreError> {
        let existing = self
            .get_static_file(id)
            .await?
            .ok_or(StoreError::NotFound { entity: "static file", id })?;

        validate_filename(filename)?;
        if filename != existing.filename {
            self.uploads.check_available(filename)?;
        }

        let relative = self.uploads.relative_path(filename);
        let new_path = self.uploads.resolve(&relative);

        if relative == existing.file {
            overwrite_file(&new_path, content)?;
            tracing::info!(id, filename, path = %new_path.display(), "Static file content replaced");
            return Ok(existing);
        }

        let old_path = self.uploads.resolve(&existing.file);
        write_new_file(&new_path, content, filename)?;

        let mut tx = match self.pool.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                discard_file(&new_path);
                return Err(e.into());
            }
        };

        let updated = sqlx::query("UPDATE static_files SET filename = ?, file = ? WHERE id = ?")
            .bind(filename)
            .bind(&relative)
            .bind(id)
            .execute(&mut *tx)
            .await;
        if let Err(e) = updated {
            discard_file(&new_path);
            return Err(filename_error(e, filename));
        }

        if let Err(source) = remove_file_if_exists(&old_path) {
            discard_file(&new_path);
            tx.rollback().await?;
            return Err(StoreError::FileCleanup {
                path: old_path,
                source,
            });
        }

        if let Err(e) = tx.commit().await {
            discard_file(&new_path);
            tracing::error!(
                id,
                path = %old_path.display(),
                error = %e,
                "Commit failed after removing old file; record points at a missing file"
            );
            return Err(e.into());
        }
        tracing::info!(
            id,
            filename,
            old = %old_path.display(),
            new = %new_path.display(),
            "Static file replaced"
        );

        Ok(StaticFile {
            id,
            filename: filename.to_owned(),
            file: relative,
        })
    }

    /// Delete a static-file record and its file.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if no record has this id
    /// - [`StoreError::FileCleanup`] if the file exists but could not be
    ///   removed; the record is kept
    pub async fn delete_static_file(&self, id: i64) -> Result<(), StoreError> {
        let existing = self
            .get_static_file(id)
            .await?
            .ok_or(StoreError::NotFound { entity: "static file", id })?;
        let path = self.uploads.resolve(&existing.file);

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM static_files WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "static file", id });
        }

        if let Err(source) = remove_file_if_exists(&path) {
            tx.rollback().await?;
            return Err(StoreError::FileCleanup { path, source });
        }

        if let Err(e) = tx.commit().await {
            tracing::error!(
                id,
                path = %path.display(),
                error = %e,
                "Commit failed after removing file; record points at a missing file"
            );
            return Err(e.into());
        }
        tracing::info!(id, filename = %existing.filename, path = %path.display(), "Static file deleted");
        Ok(())
    }
}

/// Map a UNIQUE violation on `static_files.filename` to a duplicate error.
fn filename_error(err: sqlx::Error, filename: &str) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::DuplicateFilename(filename.to_owned())
    } else {
        err.into()
    }
}

/// Write `content` to `path`, failing if a file is already there.
fn write_new_file(path: &Path, content: &[u8], filename: &str) -> Result<(), StoreError> {
    let tmp = write_temp_sibling(path, content)?;
    tmp.persist_noclobber(path).map_err(|e| {
        if e.error.kind() == io::ErrorKind::AlreadyExists {
            StoreError::DuplicateFilename(filename.to_owned())
        } else {
            StoreError::Io(e.error)
        }
    })?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "Wrote upload");
    Ok(())
}

/// Atomically replace the file at `path` with `content`.
fn overwrite_file(path: &Path, content: &[u8]) -> Result<(), StoreError> {
    let tmp = write_temp_sibling(path, content)?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

/// Write `content` to a temporary file in the same directory as `path`.
fn write_temp_sibling(path: &Path, content: &[u8]) -> io::Result<NamedTempFile> {
    let parent = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(parent)?;
    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

/// Remove `path`, treating a missing file as success.
///
/// Returns whether a file was removed.
fn remove_file_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Removed file");
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "File already absent");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Best-effort removal of a file written by a failed operation.
fn discard_file(path: &Path) {
    if let Err(e) = remove_file_if_exists(path) {
        tracing::warn!(path = %path.display(), error = %e, "Failed to remove orphaned upload");
    }
}
