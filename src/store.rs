//! In-memory holder for the material an article is generated from.

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Maximum number of reference documents held at any time.
pub const MAX_REFERENCE_FILES: usize = 50;

/// Identity of a reference document within one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DocumentId(u64);

impl DocumentId {
    /// Returns the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for DocumentId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A note supplied to convey style and structure, not content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceDocument {
    /// Relative path or file name shown to the user
    pub name: String,

    /// Raw text
    pub content: String,

    /// Identity within the store; names may repeat
    pub id: DocumentId,
}

/// The single file supplying the substance of the article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrimaryDocument {
    /// Name of the file the content came from
    pub file_name: String,

    /// Raw text
    pub content: String,
}

/// A file that has been read but not yet placed in a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    /// Relative path or file name
    pub name: String,

    /// Raw text
    pub content: String,
}

impl LoadedFile {
    /// Creates a loaded file record.
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Reference documents plus the optional primary document.
#[derive(Debug, Default, Clone)]
pub struct DocumentStore {
    references: Vec<ReferenceDocument>,
    folder_label: String,
    primary: Option<PrimaryDocument>,
    next_id: u64,
}

impl DocumentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn issue_id(&mut self) -> DocumentId {
        self.next_id += 1;
        DocumentId(self.next_id)
    }

    fn wrap(&mut self, files: Vec<LoadedFile>) -> Vec<ReferenceDocument> {
        files
            .into_iter()
            .map(|f| ReferenceDocument {
                name: f.name,
                content: f.content,
                id: self.issue_id(),
            })
            .collect()
    }

    /// Appends documents to the reference set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OverCapacity`] and leaves the store unchanged if the
    /// batch would take the set past [`MAX_REFERENCE_FILES`].
    pub fn add_references(&mut self, files: Vec<LoadedFile>) -> Result<usize> {
        self.check_capacity(files.len())?;

        let added = files.len();
        let docs = self.wrap(files);
        self.references.extend(docs);

        debug!("Added {} reference documents ({} total)", added, self.len());
        Ok(added)
    }

    /// Replaces the whole reference set with a folder load.
    ///
    /// Anything beyond [`MAX_REFERENCE_FILES`] is dropped.
    pub fn replace_references(&mut self, folder_label: impl Into<String>, files: Vec<LoadedFile>) {
        let files = files.into_iter().take(MAX_REFERENCE_FILES).collect();
        self.references = self.wrap(files);
        self.folder_label = folder_label.into();
    }

    /// Fails if `incoming` more documents would exceed the cap.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OverCapacity`] when the cap would be exceeded.
    pub fn check_capacity(&self, incoming: usize) -> Result<()> {
        if self.references.len() + incoming > MAX_REFERENCE_FILES {
            return Err(Error::OverCapacity {
                current: self.references.len(),
                incoming,
                limit: MAX_REFERENCE_FILES,
            });
        }
        Ok(())
    }

    /// Removes the document with the given id. Returns true if one was removed.
    pub fn remove(&mut self, id: DocumentId) -> bool {
        match self.references.iter().position(|d| d.id == id) {
            Some(index) => {
                self.references.remove(index);
                true
            }
            None => false,
        }
    }

    /// Empties the reference set and forgets the folder label.
    pub fn clear_all(&mut self) {
        self.references.clear();
        self.folder_label.clear();
    }

    /// Sets the primary document, discarding any previous one.
    pub fn set_primary(&mut self, doc: PrimaryDocument) {
        self.primary = Some(doc);
    }

    /// Removes the primary document.
    pub fn clear_primary(&mut self) {
        self.primary = None;
    }

    /// Reference documents in iteration order.
    #[must_use]
    pub fn references(&self) -> &[ReferenceDocument] {
        &self.references
    }

    /// Primary document, if one is loaded.
    #[must_use]
    pub const fn primary(&self) -> Option<&PrimaryDocument> {
        self.primary.as_ref()
    }

    /// Name of the folder the references were loaded from, or empty.
    #[must_use]
    pub fn folder_label(&self) -> &str {
        &self.folder_label
    }

    /// Number of reference documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.references.len()
    }

    /// Returns true if no reference documents are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// References plus the primary document, if any.
    #[must_use]
    pub fn material_count(&self) -> usize {
        self.references.len() + usize::from(self.primary.is_some())
    }

    /// Returns true if there is nothing to generate from.
    #[must_use]
    pub fn has_no_material(&self) -> bool {
        self.references.is_empty() && self.primary.is_none()
    }
}
