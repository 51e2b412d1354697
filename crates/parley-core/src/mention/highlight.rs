//! Display-layer mention highlighting.
//!
//! Matches bare `@word` tokens anywhere in prose so a UI can style them. No
//! directory validation is performed and nothing here affects routing.

use regex::Regex;
use serde::Serialize;
use std::ops::Range;
use std::sync::OnceLock;

/// Sentence-terminal punctuation trimmed from the end of a captured name.
pub const TRAILING_PUNCTUATION: &[char] = &[
    '.', ',', '!', '?', ';', ':', '。', '，', '！', '？', '；', '：', '、',
];

fn bare_mention_regex() -> &'static Regex {
    static BARE_RE: OnceLock<Regex> = OnceLock::new();
    BARE_RE.get_or_init(|| {
        Regex::new(r"@([^\s@*()\[\]{}<>]+)").expect("bare mention pattern is valid")
    })
}

/// A mention found for display purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayMention {
    /// Name without the `@` and without trailing punctuation
    pub name: String,
    /// Byte range of `@name` in the source text
    pub range: Range<usize>,
}

/// Find every bare `@word` mention in `text`.
///
/// An `@` directly preceded by a letter or digit (an e-mail address) is
/// not a mention.
#[must_use]
pub fn display_mentions(text: &str) -> Vec<DisplayMention> {
    bare_mention_regex()
        .captures_iter(text)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let raw = cap.get(1)?;

            let preceded_by_word = text[..whole.start()]
                .chars()
                .next_back()
                .is_some_and(char::is_alphanumeric);
            if preceded_by_word {
                return None;
            }

            let name = raw.as_str().trim_end_matches(TRAILING_PUNCTUATION);
            if name.is_empty() {
                return None;
            }

            Some(DisplayMention {
                name: name.to_string(),
                range: whole.start()..raw.start() + name.len(),
            })
        })
        .collect()
}

/// Wrap every display mention in `open` / `close` markers.
#[must_use]
pub fn render_highlighted(text: &str, open: &str, close: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut cursor = 0;

    for mention in display_mentions(text) {
        output.push_str(&text[cursor..mention.range.start]);
        output.push_str(open);
        output.push_str(&text[mention.range.clone()]);
        output.push_str(close);
        cursor = mention.range.end;
    }
    output.push_str(&text[cursor..]);
    output
}
