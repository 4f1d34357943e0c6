//! # archive-assistant
//!
//! Turn a pile of scanned archive pages into one edited Word document.
//!
//! Each scan is transcribed by a vision model, rewritten by a language
//! model in the chosen editorial style, and kept as a reviewable record.
//! The user picks which records to keep, optionally corrects them by hand,
//! and finalizes: the model writes a title page with a table of contents,
//! and everything is assembled into a `.docx`.
//!
//! ## Pipeline Overview
//!
//! ```text
//! scans (PNG/JPEG)
//!  │
//!  ├─ 1. Extract    vision model transcribes each scan      (memoized)
//!  ├─ 2. Transform  language model rewrites per style       (memoized)
//!  ├─ 3. Review     user toggles and edits records
//!  ├─ 4. Summary    title page + contents over the selection (memoized)
//!  └─ 5. Assemble   heading, summary, articles → .docx
//! ```
//!
//! Remote failures never abort a batch: extraction yields no text,
//! a failed rewrite keeps the raw text, a failed summary uses a fixed
//! fallback. Each is reported as a [`Notice`] on the session.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use archive_assistant::{
//!     finalize, process_batch, ArchiveAssistant, AssistantConfig, ProcessingStyle, Session,
//!     UploadedFile,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads GEMINI_API_KEY for the default provider.
//!     let assistant = ArchiveAssistant::from_config(AssistantConfig::default())?;
//!     let mut session = Session::new();
//!
//!     let scan = UploadedFile::new("page1.jpg", std::fs::read("page1.jpg")?)?;
//!     process_batch(&assistant, &mut session, vec![scan], ProcessingStyle::CorrectionOnly).await?;
//!     finalize(&assistant, &mut session).await?;
//!
//!     if let Some(doc) = session.take_document() {
//!         std::fs::write(doc.file_name(), &doc.bytes)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | axum HTTP surface ([`server`]) |
//! | `cli`    | on      | The `archivist` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod assistant;
pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod notice;
pub mod pipeline;
pub mod progress;
pub mod prompts;
#[cfg(feature = "server")]
pub mod server;
pub mod session;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use assistant::ArchiveAssistant;
pub use cache::{CacheKey, CacheStats, ContentCache, StageCache};
pub use config::{AssistantConfig, AssistantConfigBuilder, ProcessingStyle, ServerConfig};
pub use document::{assemble_document, OutputDocument, DOCX_FILE_NAME, DOCX_MIME};
pub use error::{AssistantError, ModelError, SessionError};
pub use notice::{Notice, NoticeLevel, StageOutput};
pub use pipeline::llm::{LanguageModel, ProviderModel};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use session::{FileRecord, Session, SessionPhase, SessionSnapshot, UploadedFile};
pub use workflow::{finalize, process_batch};
