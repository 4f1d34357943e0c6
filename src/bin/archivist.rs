//! CLI binary for archive-assistant.
//!
//! `archivist serve` runs the interactive HTTP surface; `archivist build`
//! processes a set of scans headlessly and writes the document.

use anyhow::{Context, Result};
use archive_assistant::server::{start_server, AppState};
use archive_assistant::{
    finalize, process_batch, ArchiveAssistant, AssistantConfig, BatchProgressCallback,
    NoticeLevel, ProcessingStyle, ProgressCallback, ServerConfig, Session, UploadedFile,
};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar plus a log line per file.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} scans  \
                 ⏱ {elapsed_precise}  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Reading");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.reset_eta();
    }

    fn on_file_start(&self, _index: usize, _total: usize, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn on_file_complete(&self, index: usize, total: usize, name: &str, text_len: usize) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3} {}  {}",
            green("✓"),
            index,
            total,
            name,
            dim(&format!("{text_len} chars")),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, total: usize, name: &str, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(['\u{2026}']).collect()
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {:>3}/{:<3} {}  {}",
            red("✗"),
            index,
            total,
            name,
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!("{} {} scans processed", green("✔"), bold(&success_count.to_string()));
        } else {
            eprintln!(
                "{} {}/{} scans clean  ({} with problems)",
                yellow("⚠"),
                bold(&success_count.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

// ── CLI definition ───────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the interactive web UI on http://127.0.0.1:8501
  archivist serve

  # Headless: proofread three scans into one document
  archivist build --style correction-only page1.jpg page2.jpg page3.png -o volume.docx

  # Use OpenAI instead of Gemini
  archivist --provider openai --model gpt-4.1-mini serve

STYLES:
  literary-edit     titled article, corrected and split into paragraphs (default)
  correction-only   spelling and grammar fixed, structure untouched
  bullet-summary    key points as bullets

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY       API key for the default provider (required)
  OPENAI_API_KEY       API key when --provider openai
  ANTHROPIC_API_KEY    API key when --provider anthropic
  MISTRAL_API_KEY      API key when --provider mistral
  RUST_LOG             Log filter, overrides -v / -q
"#;

/// Turn scanned archive pages into an edited, summarised Word document.
#[derive(Parser, Debug)]
#[command(
    name = "archivist",
    version,
    about = "Turn scanned archive pages into an edited, summarised Word document",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    model: ModelArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "ARCHIVIST_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "ARCHIVIST_QUIET")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// LLM provider: gemini, openai, anthropic, mistral.
    #[arg(long, global = true, env = "ARCHIVIST_PROVIDER")]
    provider: Option<String>,

    /// Model ID (e.g. gemini-2.0-flash, gpt-4.1-mini).
    #[arg(long, global = true, env = "ARCHIVIST_MODEL")]
    model: Option<String>,

    /// Language of the scanned documents, named in the OCR instruction.
    #[arg(long, global = true, env = "ARCHIVIST_LANGUAGE", default_value = "Ukrainian")]
    language: String,

    /// LLM temperature (0.0–2.0).
    #[arg(long, global = true, env = "ARCHIVIST_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max output tokens per model call.
    #[arg(long, global = true, env = "ARCHIVIST_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// Per-call timeout in seconds.
    #[arg(long, global = true, env = "ARCHIVIST_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the interactive web UI.
    Serve {
        /// Address to listen on.
        #[arg(long, env = "ARCHIVIST_BIND", default_value = "127.0.0.1:8501")]
        bind: String,

        /// Maximum upload request size in MiB.
        #[arg(long, env = "ARCHIVIST_MAX_UPLOAD_MB", default_value_t = 64)]
        max_upload_mb: usize,

        /// End sessions idle for this many minutes.
        #[arg(long, env = "ARCHIVIST_SESSION_IDLE_MINS", default_value_t = 60)]
        session_idle_mins: u64,
    },

    /// Process scans and write the document without the UI.
    Build {
        /// PNG or JPEG scans, in document order.
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Editorial style.
        #[arg(short, long, value_enum, default_value = "literary-edit")]
        style: StyleArg,

        /// Output document path.
        #[arg(short, long, default_value = archive_assistant::DOCX_FILE_NAME)]
        output: PathBuf,

        /// Leave out scans whose processed text is empty.
        #[arg(long)]
        exclude_empty: bool,

        /// Print the session snapshot as JSON to stdout when done.
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum StyleArg {
    LiteraryEdit,
    CorrectionOnly,
    BulletSummary,
}

impl From<StyleArg> for ProcessingStyle {
    fn from(v: StyleArg) -> Self {
        match v {
            StyleArg::LiteraryEdit => ProcessingStyle::LiteraryEdit,
            StyleArg::CorrectionOnly => ProcessingStyle::CorrectionOnly,
            StyleArg::BulletSummary => ProcessingStyle::BulletSummary,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar is the feedback for `build`; keep library logs quiet
    // under it unless asked for.
    let show_progress = matches!(cli.command, Command::Build { json: false, .. }) && !cli.quiet;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli.model, progress)?;
    // Missing credential is fatal: refuse to start.
    let assistant = ArchiveAssistant::from_config(config).context("Cannot start the assistant")?;

    match cli.command {
        Command::Serve {
            bind,
            max_upload_mb,
            session_idle_mins,
        } => {
            let server_config = ServerConfig {
                bind_addr: bind,
                max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
                session_idle_secs: session_idle_mins.saturating_mul(60).max(1),
            };
            start_server(AppState::new(assistant), &server_config)
                .await
                .with_context(|| format!("Server on {} stopped", server_config.bind_addr))?;
        }
        Command::Build {
            images,
            style,
            output,
            exclude_empty,
            json,
        } => {
            run_build(&assistant, images, style.into(), &output, exclude_empty, json, cli.quiet).await?;
        }
    }

    Ok(())
}

/// Map CLI args to `AssistantConfig`.
fn build_config(args: &ModelArgs, progress: Option<ProgressCallback>) -> Result<AssistantConfig> {
    let mut builder = AssistantConfig::builder()
        .document_language(args.language.clone())
        .temperature(args.temperature)
        .max_tokens(args.max_tokens)
        .api_timeout_secs(args.api_timeout);

    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref model) = args.model {
        builder = builder.model(model.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

async fn run_build(
    assistant: &ArchiveAssistant,
    images: Vec<PathBuf>,
    style: ProcessingStyle,
    output: &Path,
    exclude_empty: bool,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let mut uploads = Vec::with_capacity(images.len());
    for path in &images {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        uploads.push(UploadedFile::new(name, bytes)?);
    }

    let mut session = Session::new();
    process_batch(assistant, &mut session, uploads, style)
        .await
        .context("Batch processing failed")?;
    if !quiet {
        print_problems(&session);
    }

    if exclude_empty {
        let empty: Vec<_> = session
            .records()
            .iter()
            .filter(|r| r.processed_text.trim().is_empty())
            .map(|r| r.id)
            .collect();
        for id in empty {
            session.set_included(id, false)?;
        }
    }

    finalize(assistant, &mut session)
        .await
        .context("Could not build the document")?;

    if !quiet {
        print_problems(&session);
    }

    if json {
        let snapshot = serde_json::to_string_pretty(&session.snapshot())
            .context("Failed to serialise session")?;
        println!("{snapshot}");
    }

    let document = session
        .take_document()
        .context("Finalize finished without a document")?;
    document.write_to(output).await?;

    if !quiet {
        eprintln!(
            "{}  {} articles  →  {}",
            green("✔"),
            session.included_count(),
            bold(&output.display().to_string()),
        );
    }
    Ok(())
}

/// Warnings and errors recorded on the session; cleared by the next action.
fn print_problems(session: &Session) {
    for notice in session.notices() {
        if matches!(notice.level, NoticeLevel::Warning | NoticeLevel::Error) {
            eprintln!("{} {}", yellow("⚠"), notice.message);
        }
    }
}
