//! End-to-end tests over the library API with a recording model.
//!
//! These run the full batch → review → finalize → download flow without
//! network access.

mod common;

use archive_assistant::prompts::SUMMARY_FALLBACK;
use archive_assistant::{
    finalize, process_batch, ArchiveAssistant, AssistantConfig, AssistantError, NoticeLevel,
    ProcessingStyle, Session, SessionError, SessionPhase, UploadedFile, DOCX_FILE_NAME,
};
use common::{scan_png, RecordingModel};
use std::sync::Arc;

fn assistant_with(model: Arc<RecordingModel>) -> ArchiveAssistant {
    ArchiveAssistant::with_model(model, AssistantConfig::default())
}

fn scans(n: u8) -> Vec<UploadedFile> {
    (0..n)
        .map(|i| UploadedFile::new(format!("scan-{i}.png"), scan_png(i * 40)).unwrap())
        .collect()
}

#[tokio::test]
async fn correction_only_batch_sends_raw_text_with_structure_rules() {
    let model = Arc::new(RecordingModel::new("Привіт свет"));
    let assistant = assistant_with(Arc::clone(&model));
    let mut session = Session::new();

    let ok = process_batch(&assistant, &mut session, scans(2), ProcessingStyle::CorrectionOnly)
        .await
        .unwrap();

    assert_eq!(ok, 2);
    assert_eq!(session.phase(), SessionPhase::Reviewing);
    assert_eq!(session.records().len(), 2);
    assert!(session.records().iter().all(|r| r.included));
    assert_eq!(model.image_calls(), 2);

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 2);
    for prompt in &prompts {
        assert!(prompt.contains("Привіт свет"));
        assert!(prompt.contains("Do NOT change the paragraph structure and do NOT add a title."));
    }
    assert_eq!(session.records()[0].processed_text, "model reply #1");
    assert_eq!(session.records()[1].processed_text, "model reply #2");
}

#[tokio::test]
async fn finalize_with_nothing_selected_produces_no_document() {
    let model = Arc::new(RecordingModel::new("text"));
    let assistant = assistant_with(Arc::clone(&model));
    let mut session = Session::new();
    process_batch(&assistant, &mut session, scans(2), ProcessingStyle::LiteraryEdit)
        .await
        .unwrap();

    let ids: Vec<_> = session.records().iter().map(|r| r.id).collect();
    for id in ids {
        session.set_included(id, false).unwrap();
    }
    assert!(!session.can_finalize());

    let err = finalize(&assistant, &mut session).await.unwrap_err();
    assert!(matches!(err, AssistantError::Session(SessionError::NothingSelected)));
    assert_eq!(session.phase(), SessionPhase::Reviewing);
    assert!(session.take_document().is_none());
    assert!(session
        .notices()
        .iter()
        .any(|n| n.level == NoticeLevel::Warning));
}

#[tokio::test]
async fn repeated_finalize_yields_identical_documents() {
    let model = Arc::new(RecordingModel::new("archive page"));
    let assistant = assistant_with(Arc::clone(&model));
    let mut session = Session::new();
    process_batch(&assistant, &mut session, scans(3), ProcessingStyle::BulletSummary)
        .await
        .unwrap();
    let batch_prompts = model.prompts().len();

    finalize(&assistant, &mut session).await.unwrap();
    assert_eq!(session.phase(), SessionPhase::Done);
    assert_eq!(model.prompts().len(), batch_prompts + 1);
    let first = session.take_document().unwrap();
    let prompts_after_first = model.prompts().len();

    finalize(&assistant, &mut session).await.unwrap();
    let second = session.take_document().unwrap();

    assert_eq!(first.bytes, second.bytes);
    assert_eq!(model.prompts().len(), prompts_after_first);
    assert_eq!(session.phase(), SessionPhase::Reviewing);
}

#[tokio::test]
async fn editing_after_finalize_changes_the_document() {
    let model = Arc::new(RecordingModel::new("archive page"));
    let assistant = assistant_with(Arc::clone(&model));
    let mut session = Session::new();
    process_batch(&assistant, &mut session, scans(1), ProcessingStyle::LiteraryEdit)
        .await
        .unwrap();

    finalize(&assistant, &mut session).await.unwrap();
    let before = session.document().unwrap().bytes.clone();

    let id = session.records()[0].id;
    session.edit_text(id, "Hand-corrected article").unwrap();
    assert_eq!(session.phase(), SessionPhase::Reviewing);
    assert!(session.document().is_none());

    finalize(&assistant, &mut session).await.unwrap();
    let summary_prompt = model.prompts().last().cloned().unwrap();
    assert!(summary_prompt.contains("Hand-corrected article"));
    assert_ne!(session.document().unwrap().bytes, before);
}

#[tokio::test]
async fn model_outage_keeps_raw_text_and_uses_summary_fallback() {
    let model = Arc::new(RecordingModel::failing_generation("raw scan text"));
    let assistant = assistant_with(Arc::clone(&model));
    let mut session = Session::new();

    let ok = process_batch(&assistant, &mut session, scans(2), ProcessingStyle::LiteraryEdit)
        .await
        .unwrap();
    assert_eq!(ok, 0);
    assert!(session
        .records()
        .iter()
        .all(|r| r.processed_text == "raw scan text"));
    assert!(session
        .notices()
        .iter()
        .any(|n| n.level == NoticeLevel::Warning));

    finalize(&assistant, &mut session).await.unwrap();
    assert_eq!(session.summary(), Some(SUMMARY_FALLBACK));
    assert!(session.document().is_some());
}

#[tokio::test]
async fn document_writes_to_disk() {
    let model = Arc::new(RecordingModel::new("page"));
    let assistant = assistant_with(model);
    let mut session = Session::new();
    process_batch(&assistant, &mut session, scans(1), ProcessingStyle::CorrectionOnly)
        .await
        .unwrap();
    finalize(&assistant, &mut session).await.unwrap();

    let doc = session.take_document().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DOCX_FILE_NAME);
    doc.write_to(&path).await.unwrap();

    let written = std::fs::read(&path).unwrap();
    assert_eq!(written.len(), doc.len());
    // .docx is a zip container.
    assert_eq!(&written[..2], b"PK");
}

#[tokio::test]
async fn empty_batch_leaves_session_untouched() {
    let model = Arc::new(RecordingModel::new("page"));
    let assistant = assistant_with(Arc::clone(&model));
    let mut session = Session::new();

    let err = process_batch(&assistant, &mut session, Vec::new(), ProcessingStyle::LiteraryEdit)
        .await
        .unwrap_err();
    assert!(matches!(err, AssistantError::Session(SessionError::EmptyBatch)));
    assert_eq!(session.phase(), SessionPhase::Empty);
    assert_eq!(model.image_calls(), 0);
}
