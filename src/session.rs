//! Session state: uploaded files, per-file records, and the phase machine.
//!
//! ```text
//!            process batch             batch done
//!   Empty ───────────────▶ Processing ───────────▶ Reviewing ◀──────────┐
//!                              ▲                      │   ▲             │
//!                              │ new batch (reset)    │   │ edit/toggle │
//!                              └──────────────────────┤   │ download    │
//!                                                     ▼   │             │
//!                                       finalize   Finalizing ──────▶ Done
//! ```
//!
//! A [`Session`] owns everything one user works on: the records of the most
//! recent batch, the notices to display, the last finalized document and
//! the memo tables of the stage adapters. Nothing is shared between
//! sessions and nothing outlives one.

use crate::cache::StageCache;
use crate::config::ProcessingStyle;
use crate::document::OutputDocument;
use crate::error::{AssistantError, SessionError};
use crate::notice::Notice;
use crate::pipeline::encode::ImageKind;
use serde::Serialize;
use std::fmt;
use tracing::warn;
use uuid::Uuid;

/// An image received from the user. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub id: Uuid,
    pub name: String,
    pub bytes: Vec<u8>,
    pub kind: ImageKind,
}

impl UploadedFile {
    /// Accept an upload, assigning a fresh identity token.
    ///
    /// Only PNG and JPEG are accepted.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, AssistantError> {
        let name = name.into();
        let kind = ImageKind::detect(&bytes)
            .ok_or_else(|| AssistantError::UnsupportedImage { name: name.clone() })?;
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            bytes,
            kind,
        })
    }
}

/// The per-file unit of state shown for review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub id: Uuid,
    pub name: String,
    /// `None` when extraction failed.
    pub raw_text: Option<String>,
    /// Falls back to the raw text when the transform failed; edited in place.
    pub processed_text: String,
    pub included: bool,
}

impl FileRecord {
    pub fn new(id: Uuid, name: impl Into<String>, raw_text: Option<String>, processed_text: String) -> Self {
        Self {
            id,
            name: name.into(),
            raw_text,
            processed_text,
            included: true,
        }
    }
}

/// Where a session is in the upload → review → finalize flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    #[default]
    Empty,
    Processing,
    Reviewing,
    Finalizing,
    Done,
}

impl SessionPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionPhase::Empty => "empty",
            SessionPhase::Processing => "processing",
            SessionPhase::Reviewing => "reviewing",
            SessionPhase::Finalizing => "finalizing",
            SessionPhase::Done => "done",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user's interactive session.
pub struct Session {
    id: Uuid,
    phase: SessionPhase,
    style: Option<ProcessingStyle>,
    records: Vec<FileRecord>,
    notices: Vec<Notice>,
    summary: Option<String>,
    document: Option<OutputDocument>,
    pub(crate) cache: StageCache,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            phase: SessionPhase::Empty,
            style: None,
            records: Vec::new(),
            notices: Vec::new(),
            summary: None,
            document: None,
            cache: StageCache::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn style(&self) -> Option<ProcessingStyle> {
        self.style
    }

    /// Records of the last completed batch, in upload order.
    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn record(&self, id: Uuid) -> Option<&FileRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn document(&self) -> Option<&OutputDocument> {
        self.document.as_ref()
    }

    pub fn cache(&self) -> &StageCache {
        &self.cache
    }

    pub fn included_count(&self) -> usize {
        self.records.iter().filter(|r| r.included).count()
    }

    /// Processed texts of the included records, in upload order.
    pub fn included_articles(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.included)
            .map(|r| r.processed_text.clone())
            .collect()
    }

    pub fn can_finalize(&self) -> bool {
        matches!(self.phase, SessionPhase::Reviewing | SessionPhase::Done) && self.included_count() > 0
    }

    pub(crate) fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    // ── Transitions ──────────────────────────────────────────────────────

    /// Enter `Processing`, discarding the previous batch entirely.
    pub(crate) fn begin_batch(&mut self, style: ProcessingStyle) -> Result<(), SessionError> {
        if self.phase == SessionPhase::Finalizing {
            return Err(self.invalid("process a batch"));
        }
        self.phase = SessionPhase::Processing;
        self.style = Some(style);
        self.records.clear();
        self.notices.clear();
        self.summary = None;
        self.document = None;
        Ok(())
    }

    /// Publish the records of a finished batch and enter `Reviewing`.
    pub(crate) fn complete_batch(&mut self, records: Vec<FileRecord>) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Processing {
            return Err(self.invalid("complete a batch"));
        }
        self.records = records;
        self.phase = SessionPhase::Reviewing;
        Ok(())
    }

    /// Return to `Empty` when a batch stops before its records are published.
    pub(crate) fn abort_batch(&mut self) {
        if self.phase == SessionPhase::Processing {
            self.style = None;
            self.phase = SessionPhase::Empty;
        }
    }

    /// Toggle whether a record goes into the document.
    pub fn set_included(&mut self, id: Uuid, included: bool) -> Result<(), SessionError> {
        self.ensure_editable("change the selection")?;
        self.record_mut(id)?.included = included;
        self.invalidate_output();
        Ok(())
    }

    /// Replace a record's processed text with a manual correction.
    pub fn edit_text(&mut self, id: Uuid, text: impl Into<String>) -> Result<(), SessionError> {
        self.ensure_editable("edit a record")?;
        self.record_mut(id)?.processed_text = text.into();
        self.invalidate_output();
        Ok(())
    }

    /// Enter `Finalizing` and return the included articles.
    ///
    /// With nothing included, a warning notice is recorded, the phase is
    /// left unchanged, and [`SessionError::NothingSelected`] is returned.
    pub(crate) fn begin_finalize(&mut self) -> Result<Vec<String>, SessionError> {
        if !matches!(self.phase, SessionPhase::Reviewing | SessionPhase::Done) {
            return Err(self.invalid("finalize"));
        }
        let articles = self.included_articles();
        if articles.is_empty() {
            warn!("Finalize requested with no article selected");
            self.notify(Notice::warning("No article is selected for the document."));
            return Err(SessionError::NothingSelected);
        }
        self.notices.clear();
        self.summary = None;
        self.document = None;
        self.phase = SessionPhase::Finalizing;
        Ok(articles)
    }

    pub(crate) fn complete_finalize(&mut self, summary: String, document: OutputDocument) {
        self.summary = Some(summary);
        self.document = Some(document);
        self.phase = SessionPhase::Done;
    }

    /// Return to `Reviewing` after a failed finalize.
    pub(crate) fn abort_finalize(&mut self) {
        if self.phase == SessionPhase::Finalizing {
            self.phase = SessionPhase::Reviewing;
        }
    }

    /// Hand out the finished document. It is not retained afterwards.
    pub fn take_document(&mut self) -> Option<OutputDocument> {
        let doc = self.document.take()?;
        self.phase = SessionPhase::Reviewing;
        Some(doc)
    }

    fn ensure_editable(&self, action: &'static str) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Reviewing | SessionPhase::Done => Ok(()),
            _ => Err(self.invalid(action)),
        }
    }

    fn record_mut(&mut self, id: Uuid) -> Result<&mut FileRecord, SessionError> {
        self.records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(SessionError::UnknownRecord(id))
    }

    /// A finished document no longer matches edited records.
    fn invalidate_output(&mut self) {
        if self.phase == SessionPhase::Done {
            self.document = None;
            self.summary = None;
            self.phase = SessionPhase::Reviewing;
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            phase: self.phase.as_str(),
            action,
        }
    }

    /// Serializable view of the session for the HTTP surface and `--json`.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            phase: self.phase,
            style: self.style,
            records: self.records.clone(),
            included_count: self.included_count(),
            can_finalize: self.can_finalize(),
            notices: self.notices.clone(),
            summary: self.summary.clone(),
            download_ready: self.document.is_some(),
        }
    }
}

/// Point-in-time view of a [`Session`].
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub phase: SessionPhase,
    pub style: Option<ProcessingStyle>,
    pub records: Vec<FileRecord>,
    pub included_count: usize,
    pub can_finalize: bool,
    pub notices: Vec<Notice>,
    pub summary: Option<String>,
    pub download_ready: bool,
}
