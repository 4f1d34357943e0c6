//! Live end-to-end test against a real provider.
//!
//! Uses a scan in `./test_cases/` and makes real API calls. Gated behind
//! `E2E_ENABLED` so it does not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 GEMINI_API_KEY=... cargo test --test e2e -- --nocapture

use archive_assistant::{
    finalize, process_batch, ArchiveAssistant, AssistantConfig, ProcessingStyle, Session,
    SessionPhase, UploadedFile,
};
use std::path::PathBuf;

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

/// Skip unless E2E_ENABLED is set and the scan at `path` exists.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP: test scan not found: {}", p.display());
            return;
        }
        p
    }};
}

#[tokio::test]
async fn test_scan_to_document() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("newspaper_page.jpg"));

    let assistant = ArchiveAssistant::from_config(AssistantConfig::default())
        .expect("provider must be configured for e2e");
    let mut session = Session::new();
    let bytes = std::fs::read(&path).expect("read scan");
    let scan = UploadedFile::new("newspaper_page.jpg", bytes).expect("scan must be an image");

    let ok = process_batch(&assistant, &mut session, vec![scan], ProcessingStyle::CorrectionOnly)
        .await
        .expect("batch");
    for notice in session.notices() {
        println!("{notice}");
    }
    assert_eq!(ok, 1, "extraction and transform should both succeed");

    let record = &session.records()[0];
    println!("--- raw ---\n{}", record.raw_text.as_deref().unwrap_or(""));
    println!("--- processed ---\n{}", record.processed_text);
    assert!(!record.processed_text.trim().is_empty());

    finalize(&assistant, &mut session).await.expect("finalize");
    assert_eq!(session.phase(), SessionPhase::Done);
    println!("--- summary ---\n{}", session.summary().unwrap_or(""));

    let doc = session.take_document().expect("document");
    assert!(doc.len() > 1000);
}
