//! Silence protocol
//!
//! Decides at finalization time whether an agent turn is dropped entirely
//! (not persisted, not broadcast). The policy is an ordered list of
//! [`SilenceRule`]s; the first rule that objects wins.
//!
//! Default rules, in order:
//! 1. [`StopTokenRule`]: trimmed content equals a stop token (case-insensitive)
//! 2. [`MetaTalkRule`]: short "should I reply?" chatter
//! 3. [`EmptyBubbleRule`]: no text and no tool data
//!
//! Error-kind messages are never suppressed.

mod rules;

pub use rules::{EmptyBubbleRule, MetaTalkRule, StopTokenRule};

use crate::error::Result;
use crate::model::MessageKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Why a turn was suppressed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum SuppressReason {
    /// Content was a designated stop token
    StopToken {
        /// The matched token
        token: String,
    },
    /// Content was meta-discussion about replying
    MetaTalk {
        /// Index of the matched pattern
        pattern: usize,
    },
    /// No text and no tool data
    EmptyBubble,
}

impl fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StopToken { token } => write!(f, "stop token {}", token),
            Self::MetaTalk { pattern } => write!(f, "meta talk (pattern {})", pattern),
            Self::EmptyBubble => f.write_str("empty bubble"),
        }
    }
}

/// What the rules get to see of a finalized turn.
#[derive(Debug, Clone, Copy)]
pub struct SilenceCandidate<'a> {
    /// Visible content after reasoning extraction
    pub content: &'a str,
    /// Whether tool calls or results are attached
    pub has_tool_data: bool,
    /// Message kind
    pub kind: MessageKind,
}

/// A single suppression predicate.
pub trait SilenceRule: Send + Sync + fmt::Debug {
    /// Rule name for logs
    fn name(&self) -> &str;

    /// `Some(reason)` to suppress the turn
    fn check(&self, candidate: &SilenceCandidate<'_>) -> Option<SuppressReason>;
}

/// Silence protocol settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SilenceConfig {
    /// Exact-match stop tokens
    pub stop_tokens: Vec<String>,
    /// Regex patterns for meta-discussion
    pub meta_patterns: Vec<String>,
    /// Longer content is never treated as meta talk
    pub meta_max_chars: usize,
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self {
            stop_tokens: vec!["[SILENT]".to_string(), "NO_REPLY".to_string()],
            meta_patterns: default_meta_patterns(),
            meta_max_chars: 200,
        }
    }
}

fn default_meta_patterns() -> Vec<String> {
    [
        r"(?i)^\(?\s*(staying|remaining|keeping)\s+silent\.?\s*\)?$",
        r"(?i)^(i\s+)?(will|should|shall|am going to)\s+(stay|remain|keep)\s+(silent|quiet)\b.*$",
        r"(?i)^(there\s+is\s+)?no\s+(need|reason)\s+(for\s+me\s+)?to\s+(reply|respond|answer)\b.*$",
        r"(?i)^(i\s+have\s+)?nothing\s+(new\s+|more\s+|further\s+)?to\s+add\.?$",
        r"(?i)^(should|do)\s+i\s+(reply|respond)\b.*\?$",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Ordered list of silence rules.
#[derive(Debug, Clone)]
pub struct SilencePolicy {
    rules: Vec<Arc<dyn SilenceRule>>,
}

impl Default for SilencePolicy {
    fn default() -> Self {
        // Default patterns are static and known to compile.
        Self::from_config(&SilenceConfig::default()).unwrap_or_else(|_| Self::empty())
    }
}

impl SilencePolicy {
    /// A policy that never suppresses.
    #[must_use]
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Build the default rule chain from config.
    ///
    /// Fails with [`Error::InvalidConfig`](crate::Error::InvalidConfig) on a bad pattern.
    pub fn from_config(config: &SilenceConfig) -> Result<Self> {
        Ok(Self::empty()
            .with_rule(StopTokenRule::new(config.stop_tokens.clone()))
            .with_rule(MetaTalkRule::new(&config.meta_patterns, config.meta_max_chars)?)
            .with_rule(EmptyBubbleRule))
    }

    /// Append a rule at the end of the chain.
    #[must_use]
    pub fn with_rule(mut self, rule: impl SilenceRule + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Names of the active rules, in order
    #[must_use]
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// First objection from the rule chain, if any.
    #[must_use]
    pub fn evaluate(&self, candidate: &SilenceCandidate<'_>) -> Option<SuppressReason> {
        if candidate.kind == MessageKind::Error {
            return None;
        }
        self.rules.iter().find_map(|rule| rule.check(candidate))
    }
}

#[cfg(test)]
mod tests;
