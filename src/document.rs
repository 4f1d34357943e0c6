//! Document assembly: summary + articles → `.docx` bytes.
//!
//! The layout is fixed:
//!
//! ```text
//! Heading 1   "Automatic summary and document analysis"
//! Paragraph   <summary text>
//! ─ page break ─
//! Paragraph   <article 1>
//! ─ page break ─
//! …
//! ```
//!
//! Line breaks inside a text become soft breaks within one paragraph, so a
//! model reply keeps its visual shape without any Markdown interpretation.

use crate::error::AssistantError;
use docx_rs::{BreakType, Docx, Paragraph, Run, Style, StyleType};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Heading written at the top of every document.
pub const DOCUMENT_HEADING: &str = "Automatic summary and document analysis";

/// File name offered for download.
pub const DOCX_FILE_NAME: &str = "PRO_Archive_Document.docx";

/// MIME type of the download.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const HEADING_STYLE: &str = "Heading1";

/// An assembled document ready to be offered for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDocument {
    pub bytes: Arc<[u8]>,
}

impl OutputDocument {
    pub fn file_name(&self) -> &'static str {
        DOCX_FILE_NAME
    }

    pub fn mime_type(&self) -> &'static str {
        DOCX_MIME
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Write the document to `path`.
    pub async fn write_to(&self, path: &Path) -> Result<(), AssistantError> {
        tokio::fs::write(path, &self.bytes)
            .await
            .map_err(|source| AssistantError::OutputWriteFailed {
                path: path.to_path_buf(),
                source,
            })?;
        info!("Wrote {} bytes to {}", self.bytes.len(), path.display());
        Ok(())
    }
}

/// Serialise the summary page and articles into a `.docx`.
///
/// No network, no options. The only failure is the writer itself.
pub fn assemble_document(summary: &str, articles: &[String]) -> Result<Vec<u8>, AssistantError> {
    let heading_style = Style::new(HEADING_STYLE, StyleType::Paragraph)
        .name("Heading 1")
        .size(32)
        .bold();

    let mut docx = Docx::new()
        .add_style(heading_style)
        .add_paragraph(
            Paragraph::new()
                .style(HEADING_STYLE)
                .add_run(Run::new().add_text(DOCUMENT_HEADING)),
        )
        .add_paragraph(text_paragraph(summary))
        .add_paragraph(page_break());

    for article in articles {
        docx = docx
            .add_paragraph(text_paragraph(article))
            .add_paragraph(page_break());
    }

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| AssistantError::Document(e.to_string()))?;

    let bytes = buf.into_inner();
    debug!(
        "Assembled document: {} articles, {} bytes",
        articles.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// One paragraph holding `text`, with `\n` rendered as soft line breaks.
fn text_paragraph(text: &str) -> Paragraph {
    let mut run = Run::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        run = run.add_text(line);
    }
    Paragraph::new().add_run(run)
}

fn page_break() -> Paragraph {
    Paragraph::new().add_run(Run::new().add_break(BreakType::Page))
}
