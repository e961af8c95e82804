//! # notegen
//!
//! Turns personal notes into a blog-style article with a hosted language model.
//!
//! ## Features
//!
//! - Vault loading: walks a notes folder and keeps up to 50 markdown notes
//! - Incremental reference uploads with a hard cap
//! - One primary content file carrying the substance of the article
//! - Four writing tones rendered through a Tera prompt template
//! - Generation with timeout and cancellation
//! - Clipboard copy and atomic export with automatic backups
//!
//! ## Quick Start
//!
//! ```no_run
//! use notegen::{Config, GenerationClient, SelectedFile, Session, Tone};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::builder().api_key("sk-...").build()?;
//! let client = GenerationClient::new(&config)?;
//!
//! let mut session = Session::from_config(&config)?;
//! session.load_vault("./vault".as_ref()).await?;
//! session.load_primary(&SelectedFile::new("draft.txt")).await?;
//! session.set_tone(Tone::Storytelling);
//!
//! session.generate(&client, &CancellationToken::new()).await?;
//! println!("{}", session.result_text().unwrap_or_default());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! 1. **Scanner / Loader**: list a folder and read the notes worth keeping
//! 2. **Store**: holds references and the primary document
//! 3. **Prompt**: renders the store and options into one prompt
//! 4. **Client**: sends the prompt and extracts the article text
//! 5. **Session**: ties the steps together and reports one notice per action

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod client;
mod clipboard;
mod config;
mod error;
mod export;
mod file;
mod loader;
mod prompt;
mod scanner;
mod session;
mod store;
mod template_validator;
mod token;

pub mod tone;

pub use client::{
    CompletionTransport, GenerationClient, GenerationResult, HttpTransport, Message,
    MessagesRequest, RawResponse, parse_response,
};
pub use clipboard::{Clipboard, SystemClipboard};
pub use config::{ANTHROPIC_VERSION, Config, ConfigBuilder, DEFAULT_API_URL, DEFAULT_MODEL};
pub use error::{Error, Result};
pub use export::{
    ExportDraft, Exporter, GITHUB_NEW_REPO_URL, GITHUB_URL, UPLOAD_STEPS, upload_guide,
    validate_file_name,
};
pub use file::SelectedFile;
pub use loader::{
    BatchLoad, VaultSelection, load_code_file, load_primary, load_references, load_vault,
    select_vault_entries,
};
pub use prompt::{GenerationRequest, NONE_PLACEHOLDER, PromptAssembler, SECTION_SEPARATOR};
pub use scanner::{ScanStats, walk_vault, walk_vault_with_stats};
pub use session::{Notice, Session, View};
pub use store::{
    DocumentId, DocumentStore, LoadedFile, MAX_REFERENCE_FILES, PrimaryDocument,
    ReferenceDocument,
};
pub use token::{SimpleTokenizer, TokenEstimator};
pub use tone::Tone;
