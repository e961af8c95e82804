use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use notegen::{
    Config, ConfigBuilder, DEFAULT_API_URL, DEFAULT_MODEL, Exporter, GenerationClient, SelectedFile,
    Session, SystemClipboard, Tone, upload_guide,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "notegen",
    version,
    author,
    about = "Generate blog-style articles from your notes",
    long_about = "Generate blog-style articles from your notes with a hosted language model.\n\n\
    Reference notes (a vault folder or individual markdown files) set the style and \
    structure; an optional content file supplies what the article is about.\n\n\
    USAGE EXAMPLES:\n  \
      # Use a whole vault as reference and a draft as content\n  \
      notegen generate --vault ~/Notes --content draft.txt\n\n  \
      # Pick references by hand and choose a tone\n  \
      notegen generate --reference a.md --reference b.md --tone storytelling\n\n  \
      # Inspect the prompt without calling the service\n  \
      notegen prompt --vault ~/Notes --title \"Why I walk\"\n\n  \
      # Save a code file under a new name for upload\n  \
      notegen export --file App.jsx --name Main.jsx --out ./upload"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate an article and print it to stdout
    Generate {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        api: ApiArgs,

        /// Also save the article to this file
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Also copy the article to the clipboard
        #[arg(long)]
        copy: bool,
    },

    /// Print the assembled prompt without calling the service
    Prompt {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Save a code file under a chosen name and show the upload steps
    Export {
        /// File to export
        #[arg(long, value_name = "FILE")]
        file: PathBuf,

        /// Name to save it under (defaults to the file's own name)
        #[arg(long, value_name = "NAME")]
        name: Option<String>,

        /// Directory to save into
        #[arg(long, default_value = ".", value_name = "DIR")]
        out: PathBuf,

        /// Overwrite without keeping a backup of an existing file
        #[arg(long)]
        no_backup: bool,
    },

    /// Print the manual upload steps and links
    Guide,
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Notes folder; every markdown note outside hidden folders becomes a reference (max 50)
    #[arg(long, value_name = "DIR")]
    vault: Option<PathBuf>,

    /// Reference note, may be repeated
    #[arg(short, long, value_name = "FILE")]
    reference: Vec<PathBuf>,

    /// Content file (.txt or .md) with the substance of the article
    #[arg(short, long, value_name = "FILE")]
    content: Option<PathBuf>,

    /// Suggested title
    #[arg(short, long)]
    title: Option<String>,

    /// Writing tone
    #[arg(long, value_enum, default_value = "casual")]
    tone: CliTone,

    /// Path to custom Tera template file
    ///
    /// The template receives everything under `ctx` and must use
    /// `ctx.reference_context`, `ctx.primary_content` and `ctx.style`.
    #[arg(long, value_name = "FILE")]
    template: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ApiArgs {
    /// API key for the completion service
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Messages endpoint
    #[arg(long, env = "NOTEGEN_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Model identifier
    #[arg(long, env = "NOTEGEN_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Max tokens to generate
    #[arg(long, env = "NOTEGEN_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: u32,

    /// Request timeout in seconds
    #[arg(long, env = "NOTEGEN_TIMEOUT_SECS", default_value_t = 120)]
    timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliTone {
    /// Friendly and conversational
    Casual,
    /// Clear and businesslike
    Professional,
    /// Narrative, built around experiences
    Storytelling,
    /// Reflective and argued
    Essay,
}

impl From<CliTone> for Tone {
    fn from(t: CliTone) -> Self {
        match t {
            CliTone::Casual => Self::Casual,
            CliTone::Professional => Self::Professional,
            CliTone::Storytelling => Self::Storytelling,
            CliTone::Essay => Self::Essay,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose)?;

    match cli.command {
        Command::Generate {
            input,
            api,
            out,
            copy,
        } => generate(input, api, out, copy).await,
        Command::Prompt { input } => prompt(input).await,
        Command::Export {
            file,
            name,
            out,
            no_backup,
        } => export(file, name, out, no_backup).await,
        Command::Guide => {
            print!("{}", upload_guide());
            Ok(())
        }
    }
}

async fn generate(
    input: InputArgs,
    api: ApiArgs,
    out: Option<PathBuf>,
    copy: bool,
) -> anyhow::Result<()> {
    let mut builder = Config::builder()
        .api_url(api.api_url)
        .model(api.model)
        .max_tokens(api.max_tokens)
        .timeout(Duration::from_secs(api.timeout_secs));

    if let Some(key) = api.api_key {
        builder = builder.api_key(key);
    }
    if let Some(ref path) = out {
        builder = builder.export_dir(parent_dir(path));
    }

    let config = with_template(builder, input.template.as_deref())
        .build()
        .context("Failed to build configuration")?;

    let client = GenerationClient::new(&config).context("Failed to create client")?;
    let mut session = prepare_session(&config, &input).await?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    session
        .generate(&client, &cancel)
        .await
        .context("Article generation failed")?;
    report(&session);

    let text = session.result_text().unwrap_or_default().to_string();
    println!("{text}");

    if let Some(path) = out {
        let name = path.file_name().map(|n| n.to_string_lossy().to_string());
        session
            .save_result(&Exporter::new(&config), name.as_deref())
            .context("Failed to save article")?;
        report(&session);
    }

    if copy {
        // The process exits right after copying, so hold the clipboard until
        // something else owns the contents.
        let mut clipboard = SystemClipboard::handoff();
        let copied = tokio::task::block_in_place(|| session.copy_result(&mut clipboard));

        // Clipboard trouble should not lose an article that was already printed.
        if let Err(e) = copied {
            warn!("{}", e);
        } else {
            report(&session);
        }
    }

    Ok(())
}

async fn prompt(input: InputArgs) -> anyhow::Result<()> {
    let config = with_template(Config::builder(), input.template.as_deref())
        .build()
        .context("Failed to build configuration")?;

    let mut session = prepare_session(&config, &input).await?;

    let request = session
        .begin_generation()
        .context("Failed to assemble prompt")?
        .context("A generation is already running")?;

    println!("{}", request.prompt);
    eprintln!(
        "\n~{} tokens ({} references, content file: {})",
        request.estimated_tokens,
        request.reference_count,
        if request.has_primary { "yes" } else { "no" }
    );

    Ok(())
}

async fn export(
    file: PathBuf,
    name: Option<String>,
    out: PathBuf,
    no_backup: bool,
) -> anyhow::Result<()> {
    let config = Config::builder()
        .export_dir(out)
        .backup_existing(!no_backup)
        .build()
        .context("Failed to build configuration")?;

    let mut session = Session::from_config(&config).context("Failed to create session")?;

    session
        .load_code_file(&SelectedFile::new(&file))
        .await
        .with_context(|| format!("Failed to load {}", file.display()))?;

    if let Some(name) = name {
        session.set_export_file_name(name);
    }

    let path = session
        .export_to(&Exporter::new(&config))
        .context("Export failed")?;
    report(&session);

    println!("Saved {}\n", path.display());
    print!("{}", upload_guide());
    Ok(())
}

/// Builds a session from the command line inputs.
async fn prepare_session(config: &Config, input: &InputArgs) -> anyhow::Result<Session> {
    let mut session = Session::from_config(config).context("Failed to load template")?;

    if let Some(ref vault) = input.vault {
        session
            .load_vault(vault)
            .await
            .with_context(|| format!("Failed to load vault {}", vault.display()))?;
        report(&session);
    }

    if !input.reference.is_empty() {
        let files: Vec<SelectedFile> = input.reference.iter().map(SelectedFile::new).collect();
        session
            .add_references(&files)
            .await
            .context("Failed to add reference notes")?;
        report(&session);
    }

    if let Some(ref content) = input.content {
        session
            .load_primary(&SelectedFile::new(content))
            .await
            .with_context(|| format!("Failed to load content file {}", content.display()))?;
        report(&session);
    }

    if let Some(ref title) = input.title {
        session.set_title_hint(title.as_str());
    }
    session.set_tone(input.tone.into());

    Ok(session)
}

fn with_template(builder: ConfigBuilder, template: Option<&Path>) -> ConfigBuilder {
    match template {
        Some(path) => builder.template_path(path),
        None => builder,
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn report(session: &Session) {
    if let Some(notice) = session.notice() {
        if notice.is_error() {
            warn!("{}", notice.message());
        } else {
            info!("{}", notice.message());
        }
    }
}

fn setup_tracing(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => EnvFilter::new("notegen=info"),
        1 => EnvFilter::new("notegen=debug"),
        _ => EnvFilter::new("notegen=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false),
        )
        .init();

    Ok(())
}
