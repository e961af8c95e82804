use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use tera::Tera;
use tracing::debug;

/// Largest prompt template accepted, in bytes.
const MAX_TEMPLATE_BYTES: u64 = 1024 * 1024;

/// Fields a prompt template has to use to carry the user's material.
const REQUIRED_FIELDS: &[&str] = &["reference_context", "primary_content", "style"];

/// Fields offered to templates that may be left out.
const OPTIONAL_FIELDS: &[&str] = &["title", "tone", "references", "reference_count", "primary_file"];

/// Checks user-supplied prompt templates before they replace the built-in one.
pub(crate) struct TemplateValidator;

impl TemplateValidator {
    /// Reads a prompt template and returns its source once it passes every
    /// check: a regular file no larger than 1 MiB, not blank, compilable by
    /// Tera, and referring to each required `ctx` field.
    ///
    /// # Errors
    ///
    /// Returns an IO error when the file cannot be found or read, and
    /// [`Error::TemplateValidation`] for every other failed check.
    pub(crate) fn validate_template(path: &Path) -> Result<String> {
        let reject = |reason: String| Error::template_validation(path.to_string_lossy(), reason);

        let metadata = fs::metadata(path).map_err(|e| Error::io(path, e))?;
        if !metadata.is_file() {
            return Err(reject("not a regular file".to_string()));
        }
        if metadata.len() > MAX_TEMPLATE_BYTES {
            return Err(reject(format!(
                "{} bytes exceeds the {MAX_TEMPLATE_BYTES} byte limit",
                metadata.len()
            )));
        }

        let source = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        if source.trim().is_empty() {
            return Err(reject("template is blank".to_string()));
        }

        Tera::default()
            .add_raw_template("candidate", &source)
            .map_err(|e| reject(format!("does not compile: {e}")))?;

        let missing = unused_fields(&source, REQUIRED_FIELDS);
        if !missing.is_empty() {
            return Err(reject(format!(
                "never uses required field(s) {}",
                missing
                    .iter()
                    .map(|f| format!("ctx.{f}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        let skipped = unused_fields(&source, OPTIONAL_FIELDS);
        if !skipped.is_empty() {
            debug!("Template leaves out optional fields: {}", skipped.join(", "));
        }

        Ok(source)
    }
}

/// Fields from `fields` that the source never mentions as `ctx.<field>`.
///
/// A plain text search; a field mentioned only inside a comment still counts.
fn unused_fields<'a>(source: &str, fields: &[&'a str]) -> Vec<&'a str> {
    fields
        .iter()
        .copied()
        .filter(|field| !source.contains(&format!("ctx.{field}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    fn reason(path: &Path) -> String {
        TemplateValidator::validate_template(path)
            .unwrap_err()
            .to_string()
    }

    #[test]
    fn test_accepts_minimal_template() {
        let temp = assert_fs::TempDir::new().unwrap();
        let template = temp.child("article.tera");
        template
            .write_str("Style: {{ ctx.style }}\n{{ ctx.reference_context }}\n{{ ctx.primary_content }}")
            .unwrap();

        let source = TemplateValidator::validate_template(template.path()).unwrap();
        assert!(source.starts_with("Style:"));
    }

    #[test]
    fn test_missing_file_is_io() {
        let err = TemplateValidator::validate_template(Path::new("/nonexistent/article.tera"))
            .unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_rejects_directory() {
        let temp = assert_fs::TempDir::new().unwrap();
        assert!(reason(temp.path()).contains("not a regular file"));
    }

    #[test]
    fn test_rejects_blank() {
        let temp = assert_fs::TempDir::new().unwrap();
        let template = temp.child("blank.tera");
        template.write_str("  \n\t\n").unwrap();
        assert!(reason(template.path()).contains("blank"));
    }

    #[test]
    fn test_rejects_unclosed_block() {
        let temp = assert_fs::TempDir::new().unwrap();
        let template = temp.child("broken.tera");
        template.write_str("{% if ctx.title %}never closed").unwrap();
        assert!(reason(template.path()).contains("does not compile"));
    }

    #[test]
    fn test_names_every_missing_field() {
        let temp = assert_fs::TempDir::new().unwrap();
        let template = temp.child("partial.tera");
        template.write_str("Write like this: {{ ctx.style }}").unwrap();

        let message = reason(template.path());
        assert!(message.contains("ctx.reference_context, ctx.primary_content"));
        assert!(!message.contains("ctx.style"));
    }

    #[test]
    fn test_rejects_oversized() {
        let temp = assert_fs::TempDir::new().unwrap();
        let template = temp.child("huge.tera");
        let limit = usize::try_from(MAX_TEMPLATE_BYTES).unwrap();
        template.write_str(&"x".repeat(limit + 1)).unwrap();
        assert!(reason(template.path()).contains("byte limit"));
    }

    #[test]
    fn test_unused_fields() {
        let source = "{{ ctx.style }} {{ ctx.title }}";
        assert_eq!(unused_fields(source, &["style", "tone", "title"]), vec!["tone"]);
    }
}
