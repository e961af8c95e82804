use crate::{
    error::{Error, Result},
    store::DocumentStore,
    template_validator::TemplateValidator,
    token::{SimpleTokenizer, TokenEstimator},
    tone::Tone,
};
use serde::Serialize;
use std::path::Path;
use tera::{Context, Tera};
use tracing::debug;

const TEMPLATE_NAME: &str = "article";

/// Stand-in for a section with no material.
pub const NONE_PLACEHOLDER: &str = "(none)";

/// Separator placed between reference sections.
pub const SECTION_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Serialize)]
struct PromptContext<'a> {
    style: &'static str,
    tone: &'static str,
    title: Option<&'a str>,
    reference_context: String,
    reference_count: usize,
    references: Vec<ReferenceView<'a>>,
    primary_content: &'a str,
    primary_file: Option<&'a str>,
}

#[derive(Serialize)]
struct ReferenceView<'a> {
    name: &'a str,
    content: &'a str,
}

/// A rendered prompt ready to be sent, with the inputs it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// The complete prompt text
    pub prompt: String,

    /// Tone the prompt was rendered with
    pub tone: Tone,

    /// Title hint, if one was given
    pub title_hint: Option<String>,

    /// Number of reference documents included
    pub reference_count: usize,

    /// Whether a primary document was included
    pub has_primary: bool,

    /// Rough size of the prompt in tokens
    pub estimated_tokens: usize,
}

/// Renders store contents and options into a prompt.
pub struct PromptAssembler {
    tera: Tera,
}

impl PromptAssembler {
    /// Creates an assembler using the built-in article template.
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in template fails to compile.
    pub fn new() -> Result<Self> {
        Self::from_source(include_str!("../templates/article.tera"))
    }

    /// Creates an assembler from a user template file.
    ///
    /// The file is validated before use.
    ///
    /// # Errors
    ///
    /// Returns an error if the template is unreadable or fails validation.
    pub fn from_template_file(path: &Path) -> Result<Self> {
        let source = TemplateValidator::validate_template(path)?;
        debug!("Using custom template {}", path.display());
        Self::from_source(&source)
    }

    fn from_source(source: &str) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, source)
            .map_err(|e| Error::template(TEMPLATE_NAME, e))?;
        Ok(Self { tera })
    }

    /// Builds a generation request from the store and the user's options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyInput`] when there are neither references nor a
    /// primary document, or a template error if rendering fails.
    pub fn assemble(
        &self,
        store: &DocumentStore,
        title_hint: &str,
        tone: Tone,
    ) -> Result<GenerationRequest> {
        if store.has_no_material() {
            return Err(Error::EmptyInput);
        }

        let title = (!title_hint.is_empty()).then_some(title_hint);
        let primary = store.primary();

        let context = PromptContext {
            style: tone.directive(),
            tone: tone.id(),
            title,
            reference_context: reference_context(store),
            reference_count: store.len(),
            references: store
                .references()
                .iter()
                .map(|d| ReferenceView {
                    name: &d.name,
                    content: &d.content,
                })
                .collect(),
            primary_content: primary.map_or(NONE_PLACEHOLDER, |p| p.content.as_str()),
            primary_file: primary.map(|p| p.file_name.as_str()),
        };

        let mut tera_context = Context::new();
        tera_context.insert("ctx", &context);

        let prompt = self
            .tera
            .render(TEMPLATE_NAME, &tera_context)
            .map_err(|e| Error::template(TEMPLATE_NAME, e))?;

        let estimated_tokens = SimpleTokenizer.estimate(&prompt);
        debug!(
            "Assembled prompt: {} references, primary={}, ~{} tokens",
            store.len(),
            primary.is_some(),
            estimated_tokens
        );

        Ok(GenerationRequest {
            prompt,
            tone,
            title_hint: title.map(str::to_string),
            reference_count: store.len(),
            has_primary: primary.is_some(),
            estimated_tokens,
        })
    }
}

/// Joins reference documents into labeled sections.
fn reference_context(store: &DocumentStore) -> String {
    if store.is_empty() {
        return NONE_PLACEHOLDER.to_string();
    }

    store
        .references()
        .iter()
        .map(|d| format!("### {}\n{}", d.name, d.content))
        .collect::<Vec<_>>()
        .join(SECTION_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{LoadedFile, PrimaryDocument};
    use assert_fs::prelude::*;

    fn store_with_refs() -> DocumentStore {
        let mut store = DocumentStore::new();
        store
            .add_references(vec![
                LoadedFile::new("vault/one.md", "First note"),
                LoadedFile::new("vault/two.md", "Second note"),
            ])
            .unwrap();
        store
    }

    #[test]
    fn test_empty_store_is_rejected() {
        let assembler = PromptAssembler::new().unwrap();
        let err = assembler
            .assemble(&DocumentStore::new(), "", Tone::Casual)
            .unwrap_err();
        assert!(matches!(err, Error::EmptyInput));
    }

    #[test]
    fn test_sections_are_labeled_and_separated() {
        let assembler = PromptAssembler::new().unwrap();
        let request = assembler
            .assemble(&store_with_refs(), "", Tone::Casual)
            .unwrap();

        assert!(request.prompt.contains(
            "### vault/one.md\nFirst note\n\n---\n\n### vault/two.md\nSecond note"
        ));
        assert_eq!(request.reference_count, 2);
        assert!(!request.has_primary);
    }

    #[test]
    fn test_missing_primary_uses_placeholder() {
        let assembler = PromptAssembler::new().unwrap();
        let request = assembler
            .assemble(&store_with_refs(), "", Tone::Casual)
            .unwrap();

        assert!(request.prompt.contains("## Details\n(none)\n"));
    }

    #[test]
    fn test_primary_only_uses_reference_placeholder() {
        let mut store = DocumentStore::new();
        store.set_primary(PrimaryDocument {
            file_name: "draft.txt".to_string(),
            content: "The actual story.".to_string(),
        });

        let assembler = PromptAssembler::new().unwrap();
        let request = assembler.assemble(&store, "", Tone::Essay).unwrap();

        assert!(request.prompt.contains("## Reference material\n(none)\n"));
        assert!(request.prompt.contains("## Details\nThe actual story.\n"));
        assert!(request.has_primary);
    }

    #[test]
    fn test_every_tone_renders_its_directive() {
        let assembler = PromptAssembler::new().unwrap();
        let store = store_with_refs();

        for tone in Tone::all() {
            let request = assembler.assemble(&store, "", *tone).unwrap();
            assert!(request.prompt.contains(tone.directive()));
            assert!(!request.prompt.contains("{{"));
            assert!(!request.prompt.contains("{%"));
            assert!(!request.prompt.contains("ctx."));
        }
    }

    #[test]
    fn test_title_line_only_when_given() {
        let assembler = PromptAssembler::new().unwrap();
        let store = store_with_refs();

        let without = assembler.assemble(&store, "", Tone::Casual).unwrap();
        assert!(!without.prompt.contains("Suggested title"));
        assert_eq!(without.title_hint, None);

        let with = assembler
            .assemble(&store, "Why I quit sugar", Tone::Casual)
            .unwrap();
        assert!(with.prompt.contains("## Suggested title: Why I quit sugar"));
        assert_eq!(with.title_hint.as_deref(), Some("Why I quit sugar"));
    }

    #[test]
    fn test_content_is_not_escaped() {
        let mut store = DocumentStore::new();
        store
            .add_references(vec![LoadedFile::new("a.md", "<b>bold</b> & \"quotes\"")])
            .unwrap();

        let assembler = PromptAssembler::new().unwrap();
        let request = assembler.assemble(&store, "", Tone::Casual).unwrap();
        assert!(request.prompt.contains("<b>bold</b> & \"quotes\""));
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let assembler = PromptAssembler::new().unwrap();
        let store = store_with_refs();

        let first = assembler.assemble(&store, "Title", Tone::Storytelling).unwrap();
        let second = assembler.assemble(&store, "Title", Tone::Storytelling).unwrap();
        assert_eq!(first.prompt.as_bytes(), second.prompt.as_bytes());
        assert!(first.estimated_tokens > 0);
    }

    #[test]
    fn test_order_follows_store_after_removal() {
        let mut store = DocumentStore::new();
        store
            .add_references(vec![
                LoadedFile::new("a.md", "A"),
                LoadedFile::new("b.md", "B"),
                LoadedFile::new("c.md", "C"),
            ])
            .unwrap();
        let middle = store.references()[1].id;
        store.remove(middle);

        let assembler = PromptAssembler::new().unwrap();
        let request = assembler.assemble(&store, "", Tone::Casual).unwrap();
        assert!(request.prompt.contains("### a.md\nA\n\n---\n\n### c.md\nC"));
    }

    #[test]
    fn test_custom_template_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let template = temp.child("short.tera");
        template
            .write_str(
                "[{{ ctx.tone }}] {{ ctx.style }}\n{{ ctx.reference_context }}\n{{ ctx.primary_content }}",
            )
            .unwrap();

        let assembler = PromptAssembler::from_template_file(template.path()).unwrap();
        let request = assembler
            .assemble(&store_with_refs(), "", Tone::Professional)
            .unwrap();
        assert!(request.prompt.starts_with("[professional] "));
        assert!(request.prompt.ends_with("(none)"));
    }
}
