//! Prompts for every remote model call.
//!
//! All prompt text lives here so unit tests can inspect it directly
//! without spinning up a model, and so a wording change touches exactly one
//! place. The pipeline only ever calls the builder functions below.

use crate::config::ProcessingStyle;

/// Instruction sent together with each scanned image.
///
/// `{language}` is replaced with [`crate::config::AssistantConfig::document_language`].
const OCR_INSTRUCTION: &str = "You are an expert OCR system. Transcribe all {language} text \
on this image as accurately as possible. Return only the plain text.";

const LITERARY_EDIT_TEMPLATE: &str = r#"You are an experienced literary editor. Your task is to take raw text and turn it into a complete, clean and readable article.
Instructions:
1. Invent a fitting title.
2. Carefully fix all spelling and grammar mistakes.
3. Split the text into logical paragraphs.
4. Remove any OCR artefacts.
5. Return ONLY the formatted article with its title. Do not write any comments.
Here is the raw text: --- {raw_text} ---"#;

const CORRECTION_ONLY_TEMPLATE: &str = r#"You are a careful proofreader. Your task is to fix the mistakes in the text without changing its structure.
Instructions:
1. Fix spelling, grammar and punctuation mistakes.
2. Do NOT change the paragraph structure and do NOT add a title.
3. Return only the corrected text.
Here is the raw text: --- {raw_text} ---"#;

const BULLET_SUMMARY_TEMPLATE: &str = r#"You are an analyst. Read this text and write a concise summary of it as bullet points (the key ideas).
Return only the bullet points.
Here is the raw text: --- {raw_text} ---"#;

const SUMMARY_TEMPLATE: &str = r#"You are a research assistant. Analyse the set of articles given below.
Your task is to create a title page and a table of contents for a research volume.

Structure of the answer:
1. **Overall title**: Invent an overall title for the whole collection of articles.
2. **Contents**: For EACH article write:
   - Its sequence number and title.
   - A short recap (1-2 sentences).
   - The key people, organisations and places it mentions.
3. **Overall keywords**: At the end write 5-7 keywords for the whole document.

Return only this page, without any extra comments.
Here are the articles:
---
{articles}
---"#;

/// Separator placed between articles in the summary prompt.
pub const ARTICLE_SEPARATOR: &str = "\n\n--- NEW ARTICLE ---\n\n";

/// Returned by the summary stage when the model call fails.
pub const SUMMARY_FALLBACK: &str = "Could not auto-generate the summary.";

/// Build the OCR instruction for the given document language.
pub fn ocr_instruction(language: &str) -> String {
    OCR_INSTRUCTION.replace("{language}", language)
}

/// Build the rewrite prompt for `style`, embedding `raw_text` verbatim.
pub fn style_prompt(style: ProcessingStyle, raw_text: &str) -> String {
    let template = match style {
        ProcessingStyle::LiteraryEdit => LITERARY_EDIT_TEMPLATE,
        ProcessingStyle::CorrectionOnly => CORRECTION_ONLY_TEMPLATE,
        ProcessingStyle::BulletSummary => BULLET_SUMMARY_TEMPLATE,
    };
    template.replace("{raw_text}", raw_text)
}

/// Build the title-page prompt over the selected articles, in order.
pub fn summary_prompt(articles: &[String]) -> String {
    SUMMARY_TEMPLATE.replace("{articles}", &articles.join(ARTICLE_SEPARATOR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correction_prompt_embeds_text_and_keeps_structure() {
        let p = style_prompt(ProcessingStyle::CorrectionOnly, "Привіт свет");
        assert!(p.contains("--- Привіт свет ---"));
        assert!(p.contains("Do NOT change the paragraph structure"));
        assert!(p.contains("do NOT add a title"));
    }

    #[test]
    fn every_style_embeds_raw_text() {
        for style in ProcessingStyle::ALL {
            let p = style_prompt(style, "needle-42");
            assert!(p.contains("needle-42"), "{style:?} dropped the text");
            assert!(!p.contains("{raw_text}"));
        }
    }

    #[test]
    fn literary_prompt_asks_for_title() {
        let p = style_prompt(ProcessingStyle::LiteraryEdit, "x");
        assert!(p.contains("Invent a fitting title"));
    }

    #[test]
    fn summary_prompt_separates_articles() {
        let p = summary_prompt(&["first".to_string(), "second".to_string()]);
        assert!(p.contains("first\n\n--- NEW ARTICLE ---\n\nsecond"));
        assert!(p.contains("5-7 keywords"));
    }

    #[test]
    fn ocr_instruction_names_language() {
        assert!(ocr_instruction("Ukrainian").contains("all Ukrainian text"));
    }
}
