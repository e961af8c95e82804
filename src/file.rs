use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Extension admitted into the reference set.
pub(crate) const NOTE_EXTENSION: &str = "md";

/// Extensions accepted for the primary content file.
pub(crate) const CONTENT_EXTENSIONS: &[&str] = &["txt", "md"];

/// Extensions accepted for a file staged for export.
pub(crate) const CODE_EXTENSIONS: &[&str] = &[
    "jsx", "js", "ts", "tsx", "py", "html", "css", "json", "md", "txt",
];

static CODE_EXTENSION_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| CODE_EXTENSIONS.iter().copied().collect());

/// A file picked by the user, before its content is read.
///
/// `relative_path` always uses `/` separators. For files found by walking a
/// directory it starts with that directory's name, for individually picked
/// files it is just the file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// Location on disk
    pub path: PathBuf,

    /// Path as presented to the user
    pub relative_path: String,
}

impl SelectedFile {
    /// Creates a selection for an individually picked file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let relative_path = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        Self {
            path,
            relative_path,
        }
    }

    /// Creates a selection with an explicit relative path.
    #[must_use]
    pub fn with_relative_path(path: impl Into<PathBuf>, relative_path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            relative_path: relative_path.into().replace('\\', "/"),
        }
    }

    /// Returns the final component of the relative path.
    #[must_use]
    pub fn name(&self) -> &str {
        self.relative_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.relative_path)
    }

    /// Returns true if the name ends with `.{ext}`.
    #[must_use]
    pub fn has_extension(&self, ext: &str) -> bool {
        self.name()
            .strip_suffix(ext)
            .is_some_and(|stem| stem.ends_with('.'))
    }

    /// Returns true if the file is a markdown note.
    #[must_use]
    pub fn is_note(&self) -> bool {
        self.has_extension(NOTE_EXTENSION)
    }

    /// Returns true if any path component below the top-level folder is hidden.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.relative_path.contains("/.")
    }

    /// Reads the full text content of the file.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read or is not valid UTF-8.
    pub async fn read_text(&self) -> Result<String> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::io(&self.path, e))
    }
}

/// Checks if a file name carries one of the given extensions.
#[must_use]
pub(crate) fn has_any_extension(file: &SelectedFile, accepted: &[&str]) -> bool {
    accepted.iter().any(|ext| file.has_extension(ext))
}

/// Checks if a file extension is accepted for export staging.
#[must_use]
pub(crate) fn has_code_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| CODE_EXTENSION_SET.contains(ext))
        .unwrap_or(false)
}
