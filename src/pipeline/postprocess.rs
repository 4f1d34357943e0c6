//! Post-processing: deterministic cleanup of model replies.
//!
//! Models sometimes wrap a transcription in a code fence or echo the `---`
//! delimiters the prompt put around the raw text. Replies can also carry
//! `\r\n` endings or zero-width characters lifted from the scan. The rules
//! below remove that noise and never touch the words themselves.
//!
//! Cleanup runs only on successful replies. Fallback values (the raw text
//! returned when a transform fails) are passed through untouched.

use once_cell::sync::Lazy;
use regex::Regex;

/// Cleanup rules, applied in order.
const RULES: &[fn(&str) -> String] = &[
    unfence,
    to_lf,
    rstrip_lines,
    drop_echoed_delimiters,
    squeeze_blank_runs,
    drop_invisible,
];

/// Apply every cleanup rule to a model reply and trim the result.
pub fn clean_response(input: &str) -> String {
    let cleaned = RULES
        .iter()
        .fold(input.to_string(), |text, rule| rule(&text));
    cleaned.trim().to_string()
}

static RE_OUTER_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```(?:markdown|md|text|plaintext)?\r?\n(.*?)\r?\n```\s*$").unwrap()
});

static RE_BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Characters that render as nothing but break search and spell-checking.
const INVISIBLE: [char; 6] = [
    '\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}', '\u{00AD}',
];

/// The whole reply is a single fenced block: keep its body.
fn unfence(text: &str) -> String {
    RE_OUTER_FENCE
        .captures(text.trim())
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| text.to_string())
}

fn to_lf(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn rstrip_lines(text: &str) -> String {
    text.split('\n').map(str::trim_end).collect::<Vec<_>>().join("\n")
}

/// The reply starts and ends with a bare `---` line: the prompt's framing
/// came back with the text.
fn drop_echoed_delimiters(text: &str) -> String {
    let lines: Vec<&str> = text.trim().split('\n').collect();
    match (lines.first(), lines.last()) {
        (Some(&"---"), Some(&"---")) if lines.len() >= 3 => lines[1..lines.len() - 1].join("\n"),
        _ => text.to_string(),
    }
}

fn squeeze_blank_runs(text: &str) -> String {
    RE_BLANK_RUN.replace_all(text, "\n\n").into_owned()
}

fn drop_invisible(text: &str) -> String {
    text.replace(INVISIBLE, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fence_with_language_tag_is_removed() {
        assert_eq!(unfence("```text\nПривіт\nсвіт\n```"), "Привіт\nсвіт");
        assert_eq!(unfence("```\nHello\n```"), "Hello");
    }

    #[test]
    fn inner_fence_is_kept() {
        let input = "Intro\n```\ncode\n```";
        assert_eq!(unfence(input), input);
    }

    #[test]
    fn echoed_delimiters_are_dropped() {
        assert_eq!(drop_echoed_delimiters("---\nТекст статті\n---"), "Текст статті");
        // A horizontal rule inside the text stays.
        let ruled = "Part one\n---\nPart two";
        assert_eq!(drop_echoed_delimiters(ruled), ruled);
        assert_eq!(drop_echoed_delimiters("---"), "---");
    }

    #[test]
    fn line_level_rules() {
        assert_eq!(to_lf("a\r\nb\rc"), "a\nb\nc");
        assert_eq!(rstrip_lines("  hello   \nworld  "), "  hello\nworld");
        assert_eq!(squeeze_blank_runs("a\n\n\n\n\nb\n\nc"), "a\n\nb\n\nc");
        assert_eq!(drop_invisible("a\u{200B}b\u{FEFF}c\u{00AD}d"), "abcd");
    }

    #[test]
    fn full_cleanup() {
        let input = "```markdown\r\n---\r\n# Заголовок  \r\n\r\n\r\n\r\nТекст\u{200B}\r\n---\r\n```\n";
        assert_eq!(clean_response(input), "# Заголовок\n\nТекст");
    }

    #[test]
    fn blank_reply_cleans_to_empty() {
        assert_eq!(clean_response("  \n\n "), "");
    }
}
