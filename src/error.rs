//! Error types for the archive-assistant library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`AssistantError`]: **Fatal** for the current action, e.g. a missing
//!   credential or a failed document write.
//!   Returned as `Err(AssistantError)` from workflow and config functions.
//!
//! * [`SessionError`]: the user asked for something the session state
//!   does not allow (finalize with nothing selected, edit an unknown record).
//!   Nothing is lost; the session is left as it was.
//!
//! * [`ModelError`]: **Non-fatal**: a single remote call failed. Adapters
//!   catch it at their boundary and turn it into a sentinel value plus a
//!   [`crate::notice::Notice`].

use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// All fatal errors returned by the archive-assistant library.
#[derive(Debug, Error)]
pub enum AssistantError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// The API key for the selected provider is not set.
    #[error(
        "Missing API credential for provider '{provider}'.\n\
Set {var}=<your key> in the environment before starting the assistant."
    )]
    MissingCredential { provider: String, var: String },

    /// The provider could not be created (unknown name, bad model id, …).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// The uploaded file is neither PNG nor JPEG.
    #[error("'{name}' is not a supported image (expected PNG or JPEG)")]
    UnsupportedImage { name: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The document writer failed to serialise the output.
    #[error("Failed to assemble document: {0}")]
    Document(String),

    /// Could not create or write the output document file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Session errors ────────────────────────────────────────────────────
    #[error(transparent)]
    Session(#[from] SessionError),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A user action that the current session state rejects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// "Process batch" was triggered without any uploaded file.
    #[error("No files were uploaded")]
    EmptyBatch,

    /// "Finalize" was triggered while no record is included.
    #[error("No article is selected for the document")]
    NothingSelected,

    /// A toggle or edit named a record that is not in the current batch.
    #[error("Record {0} is not part of the current batch")]
    UnknownRecord(Uuid),

    /// The action is not valid in the session's current phase.
    #[error("Cannot {action} while the session is {phase}")]
    InvalidTransition {
        phase: &'static str,
        action: &'static str,
    },
}

/// A failed remote model call.
///
/// Never escapes an adapter: it is logged, reported as a notice, and
/// replaced by the adapter's fallback value.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// The provider returned an error.
    #[error("{0}")]
    Api(String),

    /// The call did not complete within the configured timeout.
    #[error("model call timed out after {secs}s")]
    Timeout { secs: u64 },
}
