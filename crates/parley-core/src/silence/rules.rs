use super::{SilenceCandidate, SilenceRule, SuppressReason};
use crate::error::{Error, Result};
use regex::Regex;

/// Suppresses content that is exactly a stop token.
#[derive(Debug, Clone)]
pub struct StopTokenRule {
    tokens: Vec<String>,
}

impl StopTokenRule {
    /// Create the rule. Blank tokens are ignored.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(Into::into)
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }
}

impl SilenceRule for StopTokenRule {
    fn name(&self) -> &str {
        "stop_token"
    }

    fn check(&self, candidate: &SilenceCandidate<'_>) -> Option<SuppressReason> {
        if candidate.has_tool_data {
            return None;
        }
        let content = candidate.content.trim();
        self.tokens
            .iter()
            .find(|token| token.to_lowercase() == content.to_lowercase())
            .map(|token| SuppressReason::StopToken {
                token: token.clone(),
            })
    }
}

/// Suppresses short meta-discussion about whether to reply.
#[derive(Debug, Clone)]
pub struct MetaTalkRule {
    patterns: Vec<Regex>,
    max_chars: usize,
}

impl MetaTalkRule {
    /// Compile the patterns.
    pub fn new(patterns: &[String], max_chars: usize) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    Error::invalid_config(
                        "engine.silence.meta_patterns",
                        format!("{}: {}", p, e),
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            patterns,
            max_chars,
        })
    }
}

impl SilenceRule for MetaTalkRule {
    fn name(&self) -> &str {
        "meta_talk"
    }

    fn check(&self, candidate: &SilenceCandidate<'_>) -> Option<SuppressReason> {
        let content = candidate.content.trim();
        if candidate.has_tool_data
            || content.is_empty()
            || content.chars().count() > self.max_chars
        {
            return None;
        }
        self.patterns
            .iter()
            .position(|re| re.is_match(content))
            .map(|pattern| SuppressReason::MetaTalk { pattern })
    }
}

/// Suppresses bubbles with no text and no tool data.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyBubbleRule;

impl SilenceRule for EmptyBubbleRule {
    fn name(&self) -> &str {
        "empty_bubble"
    }

    fn check(&self, candidate: &SilenceCandidate<'_>) -> Option<SuppressReason> {
        (candidate.content.trim().is_empty() && !candidate.has_tool_data)
            .then_some(SuppressReason::EmptyBubble)
    }
}
