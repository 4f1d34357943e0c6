//! Batch orchestration: the two long-running user actions.
//!
//! * [`process_batch`]: run extraction then transform for every uploaded
//!   file, strictly in upload order, and publish the records at the end.
//! * [`finalize`]: summarise the included records and assemble the
//!   document.
//!
//! Both take the session by `&mut`, so one session runs one action at a
//! time. Remote failures surface as notices on the session; only session
//! rule violations and document serialisation failures return `Err`.
//!
//! If an action's future is dropped before it finishes, the session falls
//! back to the phase it can resume from (`Empty` after an unfinished batch,
//! `Reviewing` after an unfinished finalize).

use crate::assistant::ArchiveAssistant;
use crate::config::ProcessingStyle;
use crate::error::{AssistantError, SessionError};
use crate::notice::Notice;
use crate::session::{FileRecord, Session, UploadedFile};
use std::ops::{Deref, DerefMut};
use std::time::Instant;
use tracing::{info, warn};

/// Rolls the session back out of a transient phase unless disarmed.
struct PhaseGuard<'a> {
    session: &'a mut Session,
    rollback: fn(&mut Session),
    armed: bool,
}

impl<'a> PhaseGuard<'a> {
    fn new(session: &'a mut Session, rollback: fn(&mut Session)) -> Self {
        Self {
            session,
            rollback,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Deref for PhaseGuard<'_> {
    type Target = Session;

    fn deref(&self) -> &Session {
        &*self.session
    }
}

impl DerefMut for PhaseGuard<'_> {
    fn deref_mut(&mut self) -> &mut Session {
        &mut *self.session
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let from = self.session.phase();
            (self.rollback)(&mut *self.session);
            warn!(
                "Session {} left {} without finishing; now {}",
                self.session.id(),
                from.as_str(),
                self.session.phase().as_str()
            );
        }
    }
}

/// Process a batch of uploads, replacing the session's records.
///
/// Returns the number of files that went through both stages without a
/// notice. An empty upload set is rejected before the session is touched.
pub async fn process_batch(
    assistant: &ArchiveAssistant,
    session: &mut Session,
    uploads: Vec<UploadedFile>,
    style: ProcessingStyle,
) -> Result<usize, AssistantError> {
    if uploads.is_empty() {
        return Err(SessionError::EmptyBatch.into());
    }
    session.begin_batch(style)?;
    let mut session = PhaseGuard::new(session, Session::abort_batch);

    let start = Instant::now();
    let total = uploads.len();
    let progress = assistant.progress();
    progress.on_batch_start(total);
    info!("Processing {} files with style '{}'", total, style);

    let mut records = Vec::with_capacity(total);
    let mut success = 0usize;

    for (i, upload) in uploads.into_iter().enumerate() {
        let index = i + 1;
        progress.on_file_start(index, total, &upload.name);

        let extracted = assistant
            .extract_text(&session.cache, &upload.bytes, &upload.name)
            .await;
        let transformed = assistant
            .transform_text(&session.cache, extracted.value.as_deref(), style, &upload.name)
            .await;

        let mut file_notices = Vec::new();
        file_notices.extend(extracted.notice);
        file_notices.extend(transformed.notice);

        if file_notices.is_empty() {
            success += 1;
            progress.on_file_complete(index, total, &upload.name, transformed.value.len());
        } else {
            let message = file_notices
                .iter()
                .map(|n| n.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            progress.on_file_error(index, total, &upload.name, &message);
        }
        for notice in file_notices {
            session.notify(notice);
        }

        records.push(FileRecord::new(
            upload.id,
            upload.name,
            extracted.value,
            transformed.value,
        ));
    }

    session.complete_batch(records)?;
    session.notify(Notice::success(format!("All {total} files processed.")));
    session.disarm();
    progress.on_batch_complete(total, success);
    info!(
        "Batch done: {}/{} clean in {:?}",
        success,
        total,
        start.elapsed()
    );
    Ok(success)
}

/// Summarise the included records and assemble the output document.
///
/// With nothing included the session records a warning and
/// [`SessionError::NothingSelected`] is returned; no document is produced.
/// A serialisation failure returns the session to review and propagates.
pub async fn finalize(assistant: &ArchiveAssistant, session: &mut Session) -> Result<(), AssistantError> {
    let articles = session.begin_finalize()?;
    let mut session = PhaseGuard::new(session, Session::abort_finalize);
    info!("Finalizing document with {} articles", articles.len());
    session.notify(Notice::info(format!(
        "The document will contain {} selected articles.",
        articles.len()
    )));

    let summary = assistant.synthesize_summary(&session.cache, &articles).await;
    let summary_notice = summary.notice;
    let summary_text = summary.value;

    let assembled = assistant.assemble(&session.cache, &summary_text, &articles);
    if let Some(notice) = summary_notice {
        session.notify(notice);
    }

    let document = assembled?;
    info!("Document ready: {} bytes", document.len());
    session.complete_finalize(summary_text, document);
    session.disarm();
    Ok(())
}
