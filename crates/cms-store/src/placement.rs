//! Upload placement policy.
//!
//! Maps a declared static-file name to its location under the uploads root.
//! The extension (case-sensitive, including the leading dot) selects a
//! subdirectory:
//!
//! ```text
//! .jpg .png .jpeg -> images/
//! .pdf            -> pdf/
//! .css            -> css/
//! .js             -> js/
//! .ttf            -> fonts/
//! anything else   -> (uploads root)
//! ```
//!
//! The declared name may itself contain folders (`docs/manual.pdf`), which
//! are kept below the subdirectory: `pdf/docs/manual.pdf`.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use crate::error::StoreError;
use crate::models::{FILENAME_MAX, require_text};

/// Built-in extension-to-subdirectory table.
pub const DEFAULT_SUBDIRECTORIES: &[(&str, &str)] = &[
    (".jpg", "images"),
    (".png", "images"),
    (".jpeg", "images"),
    (".pdf", "pdf"),
    (".css", "css"),
    (".js", "js"),
    (".ttf", "fonts"),
];

/// Where uploaded static files are stored.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    root: PathBuf,
    subdirectories: BTreeMap<String, String>,
}

impl UploadPolicy {
    /// Create a policy rooted at `root` with the built-in subdirectory table.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            subdirectories: DEFAULT_SUBDIRECTORIES
                .iter()
                .map(|(ext, dir)| ((*ext).to_owned(), (*dir).to_owned()))
                .collect(),
        }
    }

    /// Route `extension` (e.g. `.svg`) into `subdirectory`.
    ///
    /// An empty `subdirectory` removes the routing, so files with that
    /// extension land directly in the uploads root.
    #[must_use]
    pub fn with_subdirectory(
        mut self,
        extension: impl Into<String>,
        subdirectory: impl Into<String>,
    ) -> Self {
        let extension = extension.into();
        let subdirectory = subdirectory.into();
        if subdirectory.is_empty() {
            self.subdirectories.remove(&extension);
        } else {
            self.subdirectories.insert(extension, subdirectory);
        }
        self
    }

    /// Uploads root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Subdirectory for `filename`, if its extension is routed.
    #[must_use]
    pub fn subdirectory_for(&self, filename: &str) -> Option<&str> {
        let extension = extension_of(filename)?;
        self.subdirectories.get(&extension).map(String::as_str)
    }

    /// Stored location of `filename`, relative to the uploads root.
    ///
    /// Always uses `/` separators so the value can be persisted and used in URLs.
    #[must_use]
    pub fn relative_path(&self, filename: &str) -> String {
        match self.subdirectory_for(filename) {
            Some(subdir) => format!("{subdir}/{filename}"),
            None => filename.to_owned(),
        }
    }

    /// Absolute location of a stored file given its relative path.
    #[must_use]
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Absolute location `filename` will be stored at.
    #[must_use]
    pub fn storage_path(&self, filename: &str) -> PathBuf {
        self.resolve(&self.relative_path(filename))
    }

    /// Reject `filename` if a file already exists at `<root>/<filename>`.
    ///
    /// Only the flat location is checked, not the routed subdirectory. The
    /// no-clobber write in the store catches collisions at the routed path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateFilename`] when the path exists.
    pub fn check_available(&self, filename: &str) -> Result<(), StoreError> {
        if self.root.join(filename).exists() {
            return Err(StoreError::DuplicateFilename(filename.to_owned()));
        }
        Ok(())
    }
}

/// Validate a declared static-file name.
///
/// The name must be non-empty, at most [`FILENAME_MAX`] characters and a
/// relative path made only of normal components (no `..`, `.` or root).
///
/// # Errors
///
/// Returns [`StoreError::Invalid`] for names that fail any rule.
pub fn validate_filename(filename: &str) -> Result<(), StoreError> {
    require_text("filename", filename, FILENAME_MAX)?;

    let safe = Path::new(filename)
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !safe || filename.ends_with('/') {
        return Err(StoreError::invalid(
            "filename",
            format!("{filename:?} must be a relative path like name.ext or folder/name.ext"),
        ));
    }
    Ok(())
}

/// Extension of the final path component, with its leading dot.
///
/// Dotfiles such as `.htaccess` have no extension.
fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
}
