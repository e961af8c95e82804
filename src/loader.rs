//! Reads user-selected files into store-ready records.
//!
//! Three entry shapes are supported: a whole vault folder, an incremental
//! batch of individually picked notes, and the single primary content file.

use crate::{
    error::{Error, Result},
    file::{
        CODE_EXTENSIONS, CONTENT_EXTENSIONS, SelectedFile, has_any_extension, has_code_extension,
    },
    store::{LoadedFile, MAX_REFERENCE_FILES, PrimaryDocument},
};
use futures::future::join_all;
use tracing::{debug, warn};

/// Vault entries that survived filtering, plus the folder they came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VaultSelection {
    /// Top-level folder name taken from the first entry
    pub folder_label: String,

    /// Entries to read, in the order given
    pub entries: Vec<SelectedFile>,
}

/// Outcome of an incremental batch load.
#[derive(Debug, Clone, Default)]
pub struct BatchLoad {
    /// Files read successfully, in selection order
    pub files: Vec<LoadedFile>,

    /// Files that could not be read
    pub failures: Vec<Error>,
}

/// Picks the notes worth loading from a folder selection.
///
/// The folder label is the first component of the first entry's relative
/// path. Entries are kept when they are markdown notes outside any hidden
/// component, then truncated to [`MAX_REFERENCE_FILES`].
#[must_use]
pub fn select_vault_entries(entries: &[SelectedFile]) -> VaultSelection {
    let folder_label = entries
        .first()
        .and_then(|f| f.relative_path.split('/').next())
        .unwrap_or_default()
        .to_string();

    let entries = entries
        .iter()
        .filter(|f| f.is_note() && !f.is_hidden())
        .take(MAX_REFERENCE_FILES)
        .cloned()
        .collect();

    VaultSelection {
        folder_label,
        entries,
    }
}

/// Reads every selected vault entry, one at a time.
///
/// # Errors
///
/// Returns the first read failure. Files read before it are discarded.
pub async fn load_vault(selection: &VaultSelection) -> Result<Vec<LoadedFile>> {
    let mut loaded = Vec::with_capacity(selection.entries.len());

    for entry in &selection.entries {
        let content = entry.read_text().await?;
        loaded.push(LoadedFile::new(entry.relative_path.clone(), content));
    }

    debug!(
        "Loaded {} notes from '{}'",
        loaded.len(),
        selection.folder_label
    );
    Ok(loaded)
}

/// Reads a batch of individually picked notes.
///
/// Non-markdown files are dropped first. The batch is rejected as a whole if
/// it would take the reference set past the cap. Reads run concurrently and
/// results keep selection order; unreadable files are reported in
/// [`BatchLoad::failures`] while the rest are kept.
///
/// # Errors
///
/// Returns [`Error::OverCapacity`] without reading anything when the cap
/// would be exceeded.
pub async fn load_references(current_count: usize, batch: &[SelectedFile]) -> Result<BatchLoad> {
    let notes: Vec<&SelectedFile> = batch.iter().filter(|f| f.is_note()).collect();

    if current_count + notes.len() > MAX_REFERENCE_FILES {
        return Err(Error::OverCapacity {
            current: current_count,
            incoming: notes.len(),
            limit: MAX_REFERENCE_FILES,
        });
    }

    let reads = join_all(notes.iter().map(|f| f.read_text())).await;

    let mut result = BatchLoad::default();
    for (file, read) in notes.into_iter().zip(reads) {
        match read {
            Ok(content) => result
                .files
                .push(LoadedFile::new(file.name().to_string(), content)),
            Err(e) => {
                warn!("Failed to read {}: {}", file.path.display(), e);
                result.failures.push(e);
            }
        }
    }

    Ok(result)
}

/// Reads the primary content file.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] unless the file is `.txt` or `.md`,
/// or an IO error if it cannot be read.
pub async fn load_primary(file: &SelectedFile) -> Result<PrimaryDocument> {
    if !has_any_extension(file, CONTENT_EXTENSIONS) {
        return Err(Error::unsupported_format(file.name(), CONTENT_EXTENSIONS));
    }

    let content = file.read_text().await?;
    Ok(PrimaryDocument {
        file_name: file.name().to_string(),
        content,
    })
}

/// Reads a file staged for export.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for extensions outside the code
/// list, or an IO error if it cannot be read.
pub async fn load_code_file(file: &SelectedFile) -> Result<LoadedFile> {
    if !has_code_extension(&file.path) {
        return Err(Error::unsupported_format(file.name(), CODE_EXTENSIONS));
    }

    let content = file.read_text().await?;
    Ok(LoadedFile::new(file.name().to_string(), content))
}
