//! `<think>` tag splitting across chunk boundaries.

/// Opening reasoning tag
pub const OPEN_TAG: &str = "<think>";
/// Closing reasoning tag
pub const CLOSE_TAG: &str = "</think>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SplitState {
    #[default]
    Outside,
    Inside,
}

/// One chunk split into its visible and reasoning parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitChunk {
    /// Text outside reasoning tags
    pub visible: String,
    /// Text inside reasoning tags
    pub reasoning: String,
}

impl SplitChunk {
    /// Whether both parts are empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.visible.is_empty() && self.reasoning.is_empty()
    }
}

/// Stateful splitter for a stream of chunks.
///
/// A tag may open in one chunk and close in a later one, and a chunk may end
/// in the middle of a tag (`"<thi"`). Such partial tags are held back until
/// the next chunk disambiguates them.
#[derive(Debug, Clone, Default)]
pub struct ReasoningSplitter {
    state: SplitState,
    held: String,
}

impl ReasoningSplitter {
    /// Create a splitter outside any reasoning section.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a reasoning section is open
    #[must_use]
    pub fn is_reasoning(&self) -> bool {
        self.state == SplitState::Inside
    }

    /// Split the next chunk.
    pub fn push(&mut self, chunk: &str) -> SplitChunk {
        let mut buffer = std::mem::take(&mut self.held);
        buffer.push_str(chunk);

        let mut out = SplitChunk::default();
        let mut rest = buffer.as_str();

        while !rest.is_empty() {
            let tag = self.awaited_tag();
            match rest.find(tag) {
                Some(pos) => {
                    self.section(&mut out).push_str(&rest[..pos]);
                    self.state = match self.state {
                        SplitState::Outside => SplitState::Inside,
                        SplitState::Inside => SplitState::Outside,
                    };
                    rest = &rest[pos + tag.len()..];
                }
                None => {
                    let split = rest.len() - partial_tag_suffix(rest, tag);
                    self.section(&mut out).push_str(&rest[..split]);
                    self.held.push_str(&rest[split..]);
                    break;
                }
            }
        }

        out
    }

    fn awaited_tag(&self) -> &'static str {
        match self.state {
            SplitState::Outside => OPEN_TAG,
            SplitState::Inside => CLOSE_TAG,
        }
    }

    fn section<'o>(&self, out: &'o mut SplitChunk) -> &'o mut String {
        match self.state {
            SplitState::Outside => &mut out.visible,
            SplitState::Inside => &mut out.reasoning,
        }
    }

    /// Release any held partial tag as plain text of the current section.
    pub fn flush(&mut self) -> SplitChunk {
        let held = std::mem::take(&mut self.held);
        match self.state {
            SplitState::Outside => SplitChunk {
                visible: held,
                reasoning: String::new(),
            },
            SplitState::Inside => SplitChunk {
                visible: String::new(),
                reasoning: held,
            },
        }
    }

    /// Return to the initial state, discarding held text.
    pub fn reset(&mut self) {
        self.state = SplitState::Outside;
        self.held.clear();
    }
}

/// Length of the longest suffix of `text` that is a proper prefix of `tag`.
fn partial_tag_suffix(text: &str, tag: &str) -> usize {
    (1..tag.len())
        .rev()
        .find(|&len| text.ends_with(&tag[..len]))
        .unwrap_or(0)
}

/// Split reasoning embedded in a complete message body.
///
/// Handles closed `<think>…</think>` sections, an unclosed trailing section
/// and a stray leading `</think>` whose preceding text is reasoning. Returns
/// the visible text (trimmed, no markers) and the reasoning (trimmed).
#[must_use]
pub fn extract_embedded_reasoning(content: &str) -> (String, String) {
    let mut reasoning = String::new();
    let mut body = content;

    if let Some(pos) = content.find(CLOSE_TAG) {
        if !content[..pos].contains(OPEN_TAG) {
            reasoning.push_str(&content[..pos]);
            body = &content[pos + CLOSE_TAG.len()..];
        }
    }

    let mut splitter = ReasoningSplitter::new();
    let mut split = splitter.push(body);
    let tail = splitter.flush();
    split.visible.push_str(&tail.visible);
    split.reasoning.push_str(&tail.reasoning);

    reasoning.push_str(&split.reasoning);
    let visible = split.visible.replace(CLOSE_TAG, "");

    (visible.trim().to_string(), reasoning.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(chunks: &[&str]) -> SplitChunk {
        let mut splitter = ReasoningSplitter::new();
        let mut total = SplitChunk::default();
        for chunk in chunks {
            let part = splitter.push(chunk);
            total.visible.push_str(&part.visible);
            total.reasoning.push_str(&part.reasoning);
        }
        let tail = splitter.flush();
        total.visible.push_str(&tail.visible);
        total.reasoning.push_str(&tail.reasoning);
        total
    }

    #[test]
    fn test_plain_text_passes_through() {
        let out = feed(&["Hello ", "world"]);
        assert_eq!(out.visible, "Hello world");
        assert!(out.reasoning.is_empty());
    }

    #[test]
    fn test_complete_pair_in_one_chunk() {
        let out = feed(&["Hello <think>plan</think>world"]);
        assert_eq!(out.visible, "Hello world");
        assert_eq!(out.reasoning, "plan");
    }

    #[test]
    fn test_section_spanning_chunks() {
        let mut splitter = ReasoningSplitter::new();

        let first = splitter.push("<think>step one, ");
        assert!(first.visible.is_empty());
        assert_eq!(first.reasoning, "step one, ");
        assert!(splitter.is_reasoning());

        let second = splitter.push("step two</think>Answer");
        assert_eq!(second.reasoning, "step two");
        assert_eq!(second.visible, "Answer");
        assert!(!splitter.is_reasoning());
    }

    #[test]
    fn test_tags_split_across_chunks() {
        let mut splitter = ReasoningSplitter::new();

        let first = splitter.push("Hi <thi");
        assert_eq!(first.visible, "Hi ");

        let second = splitter.push("nk>hidden</th");
        assert!(second.visible.is_empty());
        assert_eq!(second.reasoning, "hidden");

        let third = splitter.push("ink> shown");
        assert_eq!(third.visible, " shown");
        assert!(third.reasoning.is_empty());
    }

    #[test]
    fn test_false_partial_tag_is_released() {
        let mut splitter = ReasoningSplitter::new();
        assert_eq!(splitter.push("a <").visible, "a ");
        assert_eq!(splitter.push("b").visible, "<b");
    }

    #[test]
    fn test_flush_releases_held_text() {
        let mut splitter = ReasoningSplitter::new();
        splitter.push("x <th");
        assert_eq!(splitter.flush().visible, "<th");
        splitter.reset();
        assert!(!splitter.is_reasoning());
    }

    #[test]
    fn test_extract_embedded_pairs() {
        let (visible, reasoning) =
            extract_embedded_reasoning("<think>first</think>Hello <think>second</think>world");
        assert_eq!(visible, "Hello world");
        assert_eq!(reasoning, "firstsecond");
    }

    #[test]
    fn test_extract_unclosed_section() {
        let (visible, reasoning) = extract_embedded_reasoning("Answer <think>trailing thoughts");
        assert_eq!(visible, "Answer");
        assert_eq!(reasoning, "trailing thoughts");
    }

    #[test]
    fn test_extract_stray_close_tag() {
        let (visible, reasoning) =
            extract_embedded_reasoning("thinking aloud</think>The answer is 4.");
        assert_eq!(visible, "The answer is 4.");
        assert_eq!(reasoning, "thinking aloud");
    }

    #[test]
    fn test_extract_without_markers() {
        let (visible, reasoning) = extract_embedded_reasoning("  just text  ");
        assert_eq!(visible, "just text");
        assert!(reasoning.is_empty());
    }
}
