//! State and actions behind one article-generation session.
//!
//! A [`Session`] owns everything a user works with: the loaded documents,
//! generation options, the last result, the file staged for export, the
//! current view and a single notice describing the outcome of the most
//! recent action. Front ends drive it through its methods and render what
//! its accessors return.

use crate::{
    client::{GenerationClient, GenerationResult},
    clipboard::Clipboard,
    config::Config,
    error::{Error, Result},
    export::{ExportDraft, Exporter},
    file::SelectedFile,
    loader::{self, VaultSelection},
    prompt::{GenerationRequest, PromptAssembler},
    scanner::walk_vault_with_stats,
    store::{DocumentId, DocumentStore, LoadedFile},
    tone::Tone,
};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Screen the user is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// Loading references and the primary document
    #[default]
    Upload,
    /// Tone and title options
    Settings,
    /// Generated article
    Result,
    /// Saving a file for upload
    Export,
}

/// Outcome message of the most recent action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Something went wrong
    Error(String),
    /// The action completed
    Success(String),
}

impl Notice {
    /// Returns the message text.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Error(message) | Self::Success(message) => message,
        }
    }

    /// Returns true for error notices.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// One user's working state.
pub struct Session {
    assembler: PromptAssembler,
    store: DocumentStore,
    view: View,
    notice: Option<Notice>,
    loading_vault: bool,
    generating: bool,
    title_hint: String,
    tone: Tone,
    result: Option<GenerationResult>,
    export: Option<ExportDraft>,
}

impl Session {
    /// Creates an empty session rendering prompts with `assembler`.
    #[must_use]
    pub fn new(assembler: PromptAssembler) -> Self {
        Self {
            assembler,
            store: DocumentStore::new(),
            view: View::default(),
            notice: None,
            loading_vault: false,
            generating: false,
            title_hint: String::new(),
            tone: Tone::default(),
            result: None,
            export: None,
        }
    }

    /// Creates an empty session using the configured template, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the template cannot be loaded.
    pub fn from_config(config: &Config) -> Result<Self> {
        let assembler = match config.template_path {
            Some(ref path) => PromptAssembler::from_template_file(path)?,
            None => PromptAssembler::new()?,
        };
        Ok(Self::new(assembler))
    }

    /// Loads a vault folder, replacing every reference document.
    ///
    /// Entries the walk could not visit are skipped and counted in the
    /// success notice.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoFiles`] when the folder has no usable notes; the
    /// references are then emptied and relabeled to the new folder. A walk
    /// or read failure leaves the store as it was.
    #[instrument(skip_all, fields(root = %root.display()))]
    pub async fn load_vault(&mut self, root: &Path) -> Result<usize> {
        self.clear_notice();

        let (entries, stats) = match walk_vault_with_stats(root) {
            Ok(walk) => walk,
            Err(e) => return Err(self.fail(format!("Failed to load folder: {e}"), e)),
        };

        self.load_selection(root, &entries, stats.errors).await
    }

    /// Loads an already listed folder selection, replacing every reference
    /// document.
    ///
    /// # Errors
    ///
    /// Same as [`Session::load_vault`].
    pub async fn load_vault_entries(
        &mut self,
        root: &Path,
        entries: &[SelectedFile],
    ) -> Result<usize> {
        self.clear_notice();
        self.load_selection(root, entries, 0).await
    }

    async fn load_selection(
        &mut self,
        root: &Path,
        entries: &[SelectedFile],
        unreadable: usize,
    ) -> Result<usize> {
        let selection: VaultSelection = loader::select_vault_entries(entries);
        if selection.entries.is_empty() {
            let label = if selection.folder_label.is_empty() {
                root.file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default()
            } else {
                selection.folder_label
            };
            self.store.replace_references(label, Vec::new());
            return Err(self.fail("No markdown files found", Error::no_files(root)));
        }

        let outcome = {
            let _loading = BusyFlag::raise(&mut self.loading_vault);
            loader::load_vault(&selection).await
        };

        match outcome {
            Ok(files) => {
                let count = files.len();
                self.store.replace_references(selection.folder_label, files);
                info!("Loaded {} notes from '{}'", count, self.store.folder_label());
                if unreadable > 0 {
                    warn!("{} entries in the folder could not be read", unreadable);
                    self.succeed(format!(
                        "Loaded {count} markdown files ({unreadable} entries could not be read)"
                    ));
                } else {
                    self.succeed(format!("Loaded {count} markdown files"));
                }
                Ok(count)
            }
            Err(e) => Err(self.fail(format!("Failed to load folder: {e}"), e)),
        }
    }

    /// Adds individually picked notes to the reference set.
    ///
    /// Unreadable files are skipped; the notice reports how many were added.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OverCapacity`] and leaves the store unchanged when
    /// the batch would exceed the cap.
    pub async fn add_references(&mut self, files: &[SelectedFile]) -> Result<usize> {
        self.clear_notice();

        let batch = match loader::load_references(self.store.len(), files).await {
            Ok(batch) => batch,
            Err(e) => return Err(self.fail(e.to_string(), e)),
        };

        let failed = batch.failures.len();
        let added = match self.store.add_references(batch.files) {
            Ok(added) => added,
            Err(e) => return Err(self.fail(e.to_string(), e)),
        };

        if failed > 0 {
            warn!("{} of {} files could not be read", failed, added + failed);
            self.succeed(format!("Added {added} files ({failed} could not be read)"));
        } else {
            self.succeed(format!("Added {added} files"));
        }
        Ok(added)
    }

    /// Loads the primary content file, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] or an IO error. The previous
    /// primary document is kept on failure.
    pub async fn load_primary(&mut self, file: &SelectedFile) -> Result<()> {
        self.clear_notice();

        match loader::load_primary(file).await {
            Ok(doc) => {
                debug!("Primary document: {}", doc.file_name);
                self.store.set_primary(doc);
                self.succeed("Loaded content file");
                Ok(())
            }
            Err(e) => Err(self.fail(e.to_string(), e)),
        }
    }

    /// Removes one reference document. Returns true if it existed.
    pub fn remove_reference(&mut self, id: DocumentId) -> bool {
        self.clear_notice();
        self.store.remove(id)
    }

    /// Drops every reference document and the folder label.
    pub fn clear_references(&mut self) {
        self.clear_notice();
        self.store.clear_all();
    }

    /// Drops the primary document.
    pub fn clear_primary(&mut self) {
        self.clear_notice();
        self.store.clear_primary();
    }

    /// Sets the suggested title passed to generation.
    pub fn set_title_hint(&mut self, title: impl Into<String>) {
        self.clear_notice();
        self.title_hint = title.into();
    }

    /// Sets the writing tone.
    pub fn set_tone(&mut self, tone: Tone) {
        self.clear_notice();
        self.tone = tone;
    }

    /// Switches to another view.
    pub fn navigate(&mut self, view: View) {
        self.clear_notice();
        self.view = view;
    }

    /// Starts a generation: assembles the prompt, marks the session busy and
    /// switches to the result view.
    ///
    /// Returns `Ok(None)` without touching anything while a generation is
    /// already running.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyInput`] when nothing is loaded, or a template
    /// error. The view is not changed.
    pub fn begin_generation(&mut self) -> Result<Option<GenerationRequest>> {
        if self.generating {
            debug!("Generation already running; ignoring request");
            return Ok(None);
        }
        self.clear_notice();

        let request = match self
            .assembler
            .assemble(&self.store, &self.title_hint, self.tone)
        {
            Ok(request) => request,
            Err(e) => return Err(self.fail(e.to_string(), e)),
        };

        self.generating = true;
        self.view = View::Result;
        Ok(Some(request))
    }

    /// Records the outcome of a generation started with
    /// [`Session::begin_generation`] and clears the busy flag.
    ///
    /// A successful result replaces the previous one. The file staged for
    /// export is never touched.
    pub fn finish_generation(&mut self, outcome: Result<GenerationResult>) {
        self.clear_notice();
        self.generating = false;

        match outcome {
            Ok(result) => {
                self.result = Some(result);
                self.succeed("Article generated!");
            }
            Err(e) => {
                warn!("Generation failed: {}", e);
                self.notice = Some(Notice::Error(format!("Article generation failed: {e}")));
            }
        }
    }

    /// Runs one generation end to end.
    ///
    /// Returns `Ok(false)` if a generation was already running.
    ///
    /// # Errors
    ///
    /// Returns the error that ended the generation. It is also reported as
    /// the session notice.
    pub async fn generate(
        &mut self,
        client: &GenerationClient,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let Some(request) = self.begin_generation()? else {
            return Ok(false);
        };

        // Dropping this future mid-request must not leave the session busy.
        let outcome = {
            let _busy = BusyFlag::raise(&mut self.generating);
            client.generate(&request, cancel).await
        };
        let failure = outcome.as_ref().err().cloned();
        self.finish_generation(outcome);

        match failure {
            Some(e) => Err(e),
            None => Ok(true),
        }
    }

    /// Copies the generated article to `clipboard`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoResult`] before the first generation, or the
    /// clipboard failure.
    pub fn copy_result(&mut self, clipboard: &mut dyn Clipboard) -> Result<()> {
        self.clear_notice();

        let Some(text) = self.result.as_ref().map(|r| r.text.clone()) else {
            return Err(self.fail(Error::NoResult.to_string(), Error::NoResult));
        };

        match clipboard.set_text(&text) {
            Ok(()) => {
                self.succeed("Copied to clipboard");
                Ok(())
            }
            Err(e) => Err(self.fail(e.to_string(), e)),
        }
    }

    /// Saves the generated article and returns where it was written.
    ///
    /// The article is saved as `file_name`, or under a timestamped
    /// `article-*.md` name when none is given. The staged export is left
    /// alone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoResult`] before the first generation, or the name
    /// or write failure.
    pub fn save_result(&mut self, exporter: &Exporter, file_name: Option<&str>) -> Result<PathBuf> {
        self.clear_notice();

        let Some(result) = self.result.as_ref() else {
            return Err(self.fail(Error::NoResult.to_string(), Error::NoResult));
        };

        let mut draft = ExportDraft::from_result(result);
        if let Some(name) = file_name {
            draft.file_name = name.to_string();
        }
        self.write_draft(exporter, &draft)
    }

    /// Stages a code file for export under its own name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] or an IO error. The previous
    /// draft is kept on failure.
    pub async fn load_code_file(&mut self, file: &SelectedFile) -> Result<()> {
        self.clear_notice();

        match loader::load_code_file(file).await {
            Ok(loaded) => {
                let name = loaded.name.clone();
                self.stage(loaded);
                self.succeed(format!("Loaded {name}"));
                Ok(())
            }
            Err(e) => Err(self.fail(e.to_string(), e)),
        }
    }

    /// Renames the staged export. Does nothing if nothing is staged.
    pub fn set_export_file_name(&mut self, name: impl Into<String>) {
        self.clear_notice();
        if let Some(draft) = self.export.as_mut() {
            draft.file_name = name.into();
        }
    }

    /// Saves the staged export and returns where it was written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NothingToExport`] when nothing is staged, or the
    /// name or write failure.
    pub fn export_to(&mut self, exporter: &Exporter) -> Result<PathBuf> {
        self.clear_notice();

        let Some(draft) = self.export.clone() else {
            return Err(self.fail(Error::NothingToExport.to_string(), Error::NothingToExport));
        };

        self.write_draft(exporter, &draft)
    }

    fn write_draft(&mut self, exporter: &Exporter, draft: &ExportDraft) -> Result<PathBuf> {
        match exporter.write(draft) {
            Ok(path) => {
                self.succeed(format!("Saved {}", path.display()));
                Ok(path)
            }
            Err(e) => Err(self.fail(e.to_string(), e)),
        }
    }

    /// Text of the last generated article, if any.
    #[must_use]
    pub fn result_text(&self) -> Option<&str> {
        self.result.as_ref().map(|r| r.text.as_str())
    }

    /// Forgets the current notice.
    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    /// Loaded documents.
    #[must_use]
    pub const fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Current view.
    #[must_use]
    pub const fn view(&self) -> View {
        self.view
    }

    /// Outcome of the last action, if it left one.
    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// True while a vault folder is being read.
    #[must_use]
    pub const fn is_loading_vault(&self) -> bool {
        self.loading_vault
    }

    /// True while a generation is in flight.
    #[must_use]
    pub const fn is_generating(&self) -> bool {
        self.generating
    }

    /// Suggested title, possibly empty.
    #[must_use]
    pub fn title_hint(&self) -> &str {
        &self.title_hint
    }

    /// Selected tone.
    #[must_use]
    pub const fn tone(&self) -> Tone {
        self.tone
    }

    /// Last successful generation.
    #[must_use]
    pub const fn result(&self) -> Option<&GenerationResult> {
        self.result.as_ref()
    }

    /// File staged for export.
    #[must_use]
    pub const fn export_draft(&self) -> Option<&ExportDraft> {
        self.export.as_ref()
    }

    fn stage(&mut self, file: LoadedFile) {
        self.export = Some(ExportDraft::from_file(file));
    }

    fn succeed(&mut self, message: impl Into<String>) {
        self.notice = Some(Notice::Success(message.into()));
    }

    /// Records an error notice and hands the error back for propagation.
    fn fail(&mut self, message: impl Into<String>, err: Error) -> Error {
        self.notice = Some(Notice::Error(message.into()));
        err
    }
}

/// Raises a busy flag and lowers it again when dropped.
struct BusyFlag<'a>(&'a mut bool);

impl<'a> BusyFlag<'a> {
    fn raise(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for BusyFlag<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}
