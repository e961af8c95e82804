use crate::{
    error::{Error, Result},
    file::SelectedFile,
};
use ignore::WalkBuilder;
use std::path::Path;
use tracing::{debug, trace, warn};

/// Statistics collected during a directory walk.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    /// Regular files found
    pub total_files: usize,

    /// Entries that could not be visited
    pub errors: usize,
}

/// Walks a directory the way a folder picker would report it.
///
/// Every regular file below `root` is returned, hidden ones included, with a
/// relative path that starts with the name of `root` itself. No ignore rules
/// are applied; filtering happens later over the flat list.
///
/// # Errors
///
/// Returns an error if `root` is not a readable directory.
pub fn walk_vault(root: &Path) -> Result<Vec<SelectedFile>> {
    walk_vault_with_stats(root).map(|(files, _)| files)
}

/// Same as [`walk_vault`], also reporting how many entries could not be
/// visited.
///
/// # Errors
///
/// Returns an error if `root` is not a readable directory.
pub fn walk_vault_with_stats(root: &Path) -> Result<(Vec<SelectedFile>, ScanStats)> {
    if !root.is_dir() {
        return Err(Error::io(
            root,
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        ));
    }

    let root = root
        .canonicalize()
        .map_err(|e| Error::io(root, e))?;

    let base = root.parent().unwrap_or(&root).to_path_buf();
    let mut stats = ScanStats::default();
    let mut files = Vec::new();

    debug!("Walking {}", root.display());

    let walker = WalkBuilder::new(&root)
        .standard_filters(false)
        .follow_links(false)
        .build();

    for result in walker {
        match result {
            Ok(entry) if entry.file_type().is_some_and(|ft| ft.is_file()) => {
                let path = entry.path();
                let relative_path = pathdiff::diff_paths(path, &base)
                    .unwrap_or_else(|| path.to_path_buf())
                    .to_string_lossy()
                    .to_string();

                trace!("Found {}", relative_path);
                stats.total_files += 1;
                files.push(SelectedFile::with_relative_path(path, relative_path));
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Walk error: {}", e);
                stats.errors += 1;
            }
        }
    }

    // Sort for deterministic ordering
    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    debug!(
        "Walk complete: {} files, {} errors",
        stats.total_files, stats.errors
    );

    Ok((files, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_walk_includes_folder_name() {
        let temp = assert_fs::TempDir::new().unwrap();
        let vault = temp.child("vault");
        vault.child("a.md").write_str("a").unwrap();
        vault.child("sub/b.md").write_str("b").unwrap();

        let files = walk_vault(vault.path()).unwrap();

        let paths: Vec<_> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["vault/a.md", "vault/sub/b.md"]);
    }

    #[test]
    fn test_walk_keeps_hidden_and_ignored_entries() {
        let temp = assert_fs::TempDir::new().unwrap();
        let vault = temp.child("vault");
        vault.child(".gitignore").write_str("ignored.md\n").unwrap();
        vault.child("ignored.md").write_str("x").unwrap();
        vault.child(".obsidian/app.md").write_str("x").unwrap();

        let files = walk_vault(vault.path()).unwrap();

        assert_eq!(files.len(), 3);
        assert!(files.iter().any(|f| f.relative_path == "vault/.obsidian/app.md"));
        assert!(files.iter().any(|f| f.relative_path == "vault/ignored.md"));
    }

    #[test]
    fn test_walk_empty_directory() {
        let temp = assert_fs::TempDir::new().unwrap();
        let vault = temp.child("empty");
        vault.create_dir_all().unwrap();

        let files = walk_vault(vault.path()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_walk_stats_count_files() {
        let temp = assert_fs::TempDir::new().unwrap();
        let vault = temp.child("vault");
        vault.child("a.md").write_str("a").unwrap();
        vault.child("nested/b.txt").write_str("b").unwrap();

        let (files, stats) = walk_vault_with_stats(vault.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(
            stats,
            ScanStats {
                total_files: 2,
                errors: 0
            }
        );
    }

    #[test]
    fn test_walk_missing_directory() {
        let result = walk_vault(Path::new("/nonexistent/path/that/should/not/exist"));
        assert!(result.is_err());
    }
}
