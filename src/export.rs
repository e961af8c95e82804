use crate::{
    client::GenerationResult,
    config::Config,
    error::{Error, Result},
    store::LoadedFile,
};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::SystemTime,
};
use tracing::{debug, info};

/// Page for creating a new repository.
pub const GITHUB_NEW_REPO_URL: &str = "https://github.com/new";

/// GitHub home page.
pub const GITHUB_URL: &str = "https://github.com";

/// Manual steps for getting an exported file into a repository.
pub const UPLOAD_STEPS: &[&str] = &[
    "Pick the file you want to upload (export --file)",
    "Save it under the name you want (export --name)",
    "Create a new repository or open an existing one",
    "Choose \"Add file\" -> \"Upload files\" and drop the saved file in",
    "Click \"Commit changes\" and you're done",
];

/// Text staged for saving, with the name it will be saved under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDraft {
    /// Target file name, editable by the user
    pub file_name: String,

    /// Content to write
    pub content: String,
}

impl ExportDraft {
    /// Stages a generated article under a timestamped markdown name.
    #[must_use]
    pub fn from_result(result: &GenerationResult) -> Self {
        Self {
            file_name: format!(
                "article-{}.md",
                result.generated_at.format("%Y%m%d-%H%M%S")
            ),
            content: result.text.clone(),
        }
    }

    /// Stages a loaded file under its own name.
    #[must_use]
    pub fn from_file(file: LoadedFile) -> Self {
        Self {
            file_name: file.name,
            content: file.content,
        }
    }
}

/// Checks that a name can be used as a single file name.
///
/// # Errors
///
/// Returns [`Error::InvalidFileName`] for empty names, names with path
/// separators, and `.`/`..`.
pub fn validate_file_name(name: &str) -> Result<()> {
    let reason = if name.trim().is_empty() {
        Some("name is empty")
    } else if name.contains('/') || name.contains('\\') {
        Some("name must not contain path separators")
    } else if name == "." || name == ".." {
        Some("name must refer to a file")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(Error::invalid_file_name(name, reason)),
        None => Ok(()),
    }
}

/// Writes drafts to disk with atomic replacement.
pub struct Exporter {
    output_dir: PathBuf,
    backup_existing: bool,
}

impl Exporter {
    /// Creates an exporter from configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            output_dir: config.export_dir.clone(),
            backup_existing: config.backup_existing,
        }
    }

    /// Creates an exporter writing into `output_dir`.
    #[must_use]
    pub fn to_dir(output_dir: impl Into<PathBuf>, backup_existing: bool) -> Self {
        Self {
            output_dir: output_dir.into(),
            backup_existing,
        }
    }

    /// Writes the draft and returns the path it was written to.
    ///
    /// # Errors
    ///
    /// Returns an error if the file name is invalid or any file operation
    /// fails.
    pub fn write(&self, draft: &ExportDraft) -> Result<PathBuf> {
        validate_file_name(&draft.file_name)?;

        fs::create_dir_all(&self.output_dir).map_err(|e| Error::io(&self.output_dir, e))?;

        let path = self.output_dir.join(&draft.file_name);
        self.write_file_atomic(&path, &draft.content)?;

        info!(
            "Saved {} ({} characters)",
            path.display(),
            draft.content.chars().count()
        );
        Ok(path)
    }

    /// Writes a file atomically with optional backup.
    ///
    /// # Process
    ///
    /// 1. Creates backup if file exists and backup is enabled
    /// 2. Writes content to temporary file
    /// 3. Syncs temporary file to disk
    /// 4. Atomically renames temporary file to target path
    fn write_file_atomic(&self, path: &Path, content: &str) -> Result<()> {
        if path.exists() && self.backup_existing {
            self.backup_file(path)?;
        }

        let temp_path = temp_path_for(path);
        let mut temp_file = fs::File::create(&temp_path).map_err(|e| Error::io(&temp_path, e))?;

        temp_file
            .write_all(content.as_bytes())
            .map_err(|e| Error::io(&temp_path, e))?;

        temp_file
            .sync_all()
            .map_err(|e| Error::io(&temp_path, e))?;

        drop(temp_file);

        fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;

        Ok(())
    }

    /// Creates a timestamped backup of an existing file.
    fn backup_file(&self, path: &Path) -> Result<()> {
        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_err(|e| Error::config(e.to_string()))?
            .as_nanos();

        let filename = path
            .file_name()
            .ok_or_else(|| Error::config("Invalid file path"))?
            .to_string_lossy();

        let backup_path = self
            .output_dir
            .join(format!("{filename}.backup.{timestamp}"));

        fs::copy(path, &backup_path).map_err(|e| Error::io(&backup_path, e))?;

        debug!("Created backup: {}", backup_path.display());
        Ok(())
    }
}

/// Sibling path used while writing, e.g. `notes.md` -> `.notes.md.tmp`.
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

/// Renders the manual upload instructions.
#[must_use]
pub fn upload_guide() -> String {
    let mut guide = String::from("Uploading to GitHub\n\n");
    for (i, step) in UPLOAD_STEPS.iter().enumerate() {
        guide.push_str(&format!("  {}. {}\n", i + 1, step));
    }
    guide.push_str(&format!(
        "\nNew repository: {GITHUB_NEW_REPO_URL}\nGitHub:         {GITHUB_URL}\n\n\
         notegen does not upload anything itself; the steps above are manual.\n"
    ));
    guide
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    fn draft(name: &str, content: &str) -> ExportDraft {
        ExportDraft {
            file_name: name.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_write_creates_directory_and_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let out = temp.child("exports");

        let exporter = Exporter::to_dir(out.path(), true);
        let path = exporter.write(&draft("article.md", "body")).unwrap();

        assert_eq!(path, out.child("article.md").path());
        out.child("article.md").assert("body");
        assert!(!out.child(".article.md.tmp").exists());
    }

    #[test]
    fn test_write_creates_backup() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("article.md").write_str("old content").unwrap();

        let exporter = Exporter::to_dir(temp.path(), true);
        exporter.write(&draft("article.md", "new content")).unwrap();

        temp.child("article.md").assert("new content");
        let entries: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert!(entries.iter().any(|name| name.starts_with("article.md.backup.")));
    }

    #[test]
    fn test_write_without_backup() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("article.md").write_str("old").unwrap();

        let exporter = Exporter::to_dir(temp.path(), false);
        exporter.write(&draft("article.md", "new")).unwrap();

        let count = fs::read_dir(temp.path()).unwrap().count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_invalid_file_names() {
        assert!(validate_file_name("").is_err());
        assert!(validate_file_name("  ").is_err());
        assert!(validate_file_name("../escape.md").is_err());
        assert!(validate_file_name("dir\\file.md").is_err());
        assert!(validate_file_name("..").is_err());
        assert!(validate_file_name("App.jsx").is_ok());
    }

    #[test]
    fn test_draft_from_result() {
        let result = GenerationResult::new("text");
        let draft = ExportDraft::from_result(&result);
        assert!(draft.file_name.starts_with("article-"));
        assert!(draft.file_name.ends_with(".md"));
        assert_eq!(draft.content, "text");
    }

    #[test]
    fn test_upload_guide_lists_steps_and_links() {
        let guide = upload_guide();
        assert!(guide.contains("1. "));
        assert!(guide.contains("5. "));
        assert!(guide.contains(GITHUB_NEW_REPO_URL));
    }
}
