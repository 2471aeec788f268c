//! Rendering of a fetched file into the outbound message text.

use crate::types::FileRecord;

/// Inserted between adjacent backticks so they cannot close a code block.
const ZERO_WIDTH_SPACE: char = '\u{200B}';

/// Stands in for a backtick inside the one-backtick subject span.
const MODIFIER_GRAVE: char = '\u{02CB}';

/// Renders a file as:
///
/// ```text
/// New email
/// Subject: `<subject>`
///
/// ```<content>```
/// ```
///
/// The subject is escaped with [`escape_inline`] and the content with
/// [`escape_literal`], so each displays as one literal span or block.
pub fn format_message(record: &FileRecord) -> String {
    format!(
        "New email\nSubject: `{}`\n\n```{}```",
        escape_inline(&record.subject),
        escape_literal(&record.content),
    )
}

/// Escapes text for display inside a single-backtick code span.
///
/// `&`, `<` and `>` become entities and every backtick becomes U+02CB, since
/// any backtick would close the span.
pub fn escape_inline(text: &str) -> String {
    escape_entities(text)
        .chars()
        .map(|c| if c == '`' { MODIFIER_GRAVE } else { c })
        .collect()
}

fn escape_entities(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escapes text for display inside a triple-backtick code block.
///
/// `&`, `<` and `>` become entities. A zero-width space follows every
/// backtick that is followed by another backtick, and pads a leading or
/// trailing backtick, so the text never contains a run that merges with
/// the surrounding delimiters.
pub fn escape_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    if text.starts_with('`') {
        out.push(ZERO_WIDTH_SPACE);
    }

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '`' => {
                out.push('`');
                if matches!(chars.peek(), Some('`') | None) {
                    out.push(ZERO_WIDTH_SPACE);
                }
            }
            other => out.push(other),
        }
    }
    out
}
