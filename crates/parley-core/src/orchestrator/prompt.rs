//! Default contextual prompt
//!
//! Frames collaboration rules, recent history and optional loop guidance
//! inside an internal `<collaboration_context>` wrapper, followed by the
//! triggering message. The wrapper is stripped from any content that is
//! forwarded between agents so it never surfaces to end users.

use crate::model::{Message, SenderKind};
use crate::ports::{PromptBuilder, PromptRequest};
use regex::Regex;
use std::fmt::Write;
use std::sync::OnceLock;

/// Opening marker of the internal wrapper
pub const WRAPPER_OPEN: &str = "<collaboration_context>";
/// Closing marker of the internal wrapper
pub const WRAPPER_CLOSE: &str = "</collaboration_context>";

const DEFAULT_MAX_ENTRY_CHARS: usize = 500;

fn wrapper_regex() -> &'static Regex {
    static WRAPPER_RE: OnceLock<Regex> = OnceLock::new();
    WRAPPER_RE.get_or_init(|| {
        Regex::new(r"(?s)<collaboration_context>.*?</collaboration_context>")
            .expect("wrapper pattern is valid")
    })
}

/// Remove every internal wrapper block and stray wrapper marker.
#[must_use]
pub fn strip_internal_wrapper(text: &str) -> String {
    let stripped = wrapper_regex().replace_all(text, "");
    let stripped = match stripped.find(WRAPPER_OPEN) {
        // Unterminated block: everything after the marker is internal.
        Some(pos) => &stripped[..pos],
        None => &stripped[..],
    };
    stripped.replace(WRAPPER_CLOSE, "").trim().to_string()
}

/// Default [`PromptBuilder`].
#[derive(Debug, Clone)]
pub struct CollaborationPrompt {
    silence_token: String,
    max_entry_chars: usize,
}

impl Default for CollaborationPrompt {
    fn default() -> Self {
        Self::new("[SILENT]")
    }
}

impl CollaborationPrompt {
    /// Create a builder that tells agents to stay silent with `silence_token`.
    pub fn new(silence_token: impl Into<String>) -> Self {
        Self {
            silence_token: silence_token.into(),
            max_entry_chars: DEFAULT_MAX_ENTRY_CHARS,
        }
    }

    /// Truncate each history entry to this many characters
    #[must_use]
    pub fn with_max_entry_chars(mut self, max: usize) -> Self {
        self.max_entry_chars = max;
        self
    }

    fn history_line(&self, message: &Message) -> String {
        let content = strip_internal_wrapper(&message.content);
        let content = if content.chars().count() > self.max_entry_chars {
            let cut: String = content.chars().take(self.max_entry_chars).collect();
            format!("{}…", cut)
        } else {
            content
        };
        format!("[{}]: {}", message.sender_name, content)
    }
}

impl PromptBuilder for CollaborationPrompt {
    fn build(&self, request: &PromptRequest<'_>) -> String {
        let mut out = String::new();
        let target = request.target;

        out.push_str(WRAPPER_OPEN);
        out.push('\n');
        let _ = writeln!(
            out,
            "You are {}, an agent in this conversation.",
            target.display_name
        );

        let others: Vec<String> = request
            .members
            .iter()
            .filter(|m| m.id != target.id)
            .map(|m| m.display_name.clone())
            .collect();
        if !others.is_empty() {
            let _ = writeln!(out, "Other agents present: {}.", others.join(", "));
            out.push_str(
                "To hand work to another agent, mention them as **@Name**. \
                 Only mention an agent when you need them to act.\n",
            );
        }
        let _ = writeln!(
            out,
            "If you have nothing to add, reply with exactly {} and nothing else.",
            self.silence_token
        );

        let history: Vec<&Message> = request
            .history
            .iter()
            .filter(|m| m.id != request.trigger.id)
            .collect();
        if !history.is_empty() {
            out.push_str("\nRecent conversation:\n");
            for message in history {
                out.push_str(&self.history_line(message));
                out.push('\n');
            }
        }

        if let Some(guidance) = request.loop_guidance {
            let _ = write!(out, "\n{}\n", guidance);
        }
        out.push_str(WRAPPER_CLOSE);
        out.push_str("\n\n");

        let trigger = strip_internal_wrapper(&request.trigger.content);
        match request.trigger.sender {
            SenderKind::User => out.push_str(&trigger),
            SenderKind::Agent => {
                let _ = write!(out, "{} says: {}", request.trigger.sender_name, trigger);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AgentIdentity, MessageKind};

    fn members() -> Vec<AgentIdentity> {
        vec![
            AgentIdentity::new("backend", "Sindri"),
            AgentIdentity::new("pm", "Athena"),
        ]
    }

    #[test]
    fn test_strip_wrapper_blocks() {
        let text = "<collaboration_context>rules</collaboration_context>\n\nHello";
        assert_eq!(strip_internal_wrapper(text), "Hello");
        assert_eq!(strip_internal_wrapper("a </collaboration_context> b"), "a  b");
        assert_eq!(
            strip_internal_wrapper("visible <collaboration_context>leaked rules"),
            "visible"
        );
        assert_eq!(strip_internal_wrapper("plain"), "plain");
    }

    #[test]
    fn test_prompt_frames_context() {
        let members = members();
        let trigger = Message::user("g1", "alice", "**@Sindri** build the API");
        let earlier = Message::agent("m0", "g1", &members[1], MessageKind::Assistant, "Plan ready");
        let history = vec![earlier, trigger.clone()];

        let prompt = CollaborationPrompt::default().build(&PromptRequest {
            session_id: "g1",
            target: &members[0],
            members: &members,
            trigger: &trigger,
            history: &history,
            loop_guidance: None,
        });

        assert!(prompt.starts_with(WRAPPER_OPEN));
        assert!(prompt.contains("You are Sindri"));
        assert!(prompt.contains("Other agents present: Athena."));
        assert!(prompt.contains("[Athena]: Plan ready"));
        assert!(prompt.ends_with("**@Sindri** build the API"));
        // The trigger is not repeated inside the history block.
        assert_eq!(prompt.matches("build the API").count(), 1);
        assert_eq!(strip_internal_wrapper(&prompt), "**@Sindri** build the API");
    }

    #[test]
    fn test_prompt_includes_guidance_and_strips_forwarded_wrapper() {
        let members = members();
        let trigger = Message::agent(
            "m1",
            "g1",
            &members[1],
            MessageKind::Assistant,
            "<collaboration_context>internal</collaboration_context>**@Sindri** over to you",
        );

        let prompt = CollaborationPrompt::new("[QUIET]").build(&PromptRequest {
            session_id: "g1",
            target: &members[0],
            members: &members,
            trigger: &trigger,
            history: &[],
            loop_guidance: Some("Consider staying quiet."),
        });

        assert!(prompt.contains("Consider staying quiet."));
        assert!(prompt.contains("[QUIET]"));
        assert!(!prompt.contains("internal"));
        assert!(prompt.ends_with("Athena says: **@Sindri** over to you"));
    }

    #[test]
    fn test_history_entries_truncated() {
        let members = members();
        let long = Message::agent("m0", "g1", &members[1], MessageKind::Assistant, "x".repeat(50));
        let trigger = Message::user("g1", "alice", "go");

        let prompt = CollaborationPrompt::default()
            .with_max_entry_chars(10)
            .build(&PromptRequest {
                session_id: "g1",
                target: &members[0],
                members: &members,
                trigger: &trigger,
                history: &[long],
                loop_guidance: None,
            });
        assert!(prompt.contains(&format!("[Athena]: {}…", "x".repeat(10))));
    }
}
