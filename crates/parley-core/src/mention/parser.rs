use crate::model::AgentIdentity;
use crate::ports::AgentDirectory;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::debug;

fn strict_mention_regex() -> &'static Regex {
    static STRICT_RE: OnceLock<Regex> = OnceLock::new();
    STRICT_RE.get_or_init(|| {
        Regex::new(r"\*\*@([A-Za-z0-9_-]+)\*\*").expect("strict mention pattern is valid")
    })
}

/// One `**@Name**` occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MentionToken {
    /// Literal matched text, e.g. `**@Sindri**`
    pub literal: String,
    /// Extracted candidate name, e.g. `Sindri`
    pub candidate: String,
    /// Directory match, `None` when unresolved
    pub resolved: Option<AgentIdentity>,
}

/// Strict, directory-validated mention parser.
pub struct MentionParser<'a> {
    directory: &'a dyn AgentDirectory,
}

impl<'a> MentionParser<'a> {
    /// Create a parser backed by the given directory.
    pub fn new(directory: &'a dyn AgentDirectory) -> Self {
        Self { directory }
    }

    /// All strict mention tokens in `text`, including unresolved ones.
    #[must_use]
    pub fn tokens(&self, text: &str) -> Vec<MentionToken> {
        strict_mention_regex()
            .captures_iter(text)
            .filter_map(|cap| {
                let literal = cap.get(0)?.as_str().to_string();
                let candidate = cap.get(1)?.as_str().to_string();
                let resolved = self.resolve(&candidate);
                if resolved.is_none() {
                    debug!(candidate = %candidate, "Dropping unresolved mention");
                }
                Some(MentionToken {
                    literal,
                    candidate,
                    resolved,
                })
            })
            .collect()
    }

    /// Resolve a candidate name: exact, then prefix, then substring match.
    #[must_use]
    pub fn resolve(&self, candidate: &str) -> Option<AgentIdentity> {
        if let Some(agent) = self.directory.resolve_by_name_or_id(candidate) {
            return Some(agent);
        }
        resolve_candidate(candidate, &self.directory.all_agents())
    }

    /// Display names of every resolved mention, de-duplicated in first-seen order.
    #[must_use]
    pub fn parse_mentions(&self, text: &str) -> Vec<String> {
        self.resolved_agents(text)
            .into_iter()
            .map(|agent| agent.display_name)
            .collect()
    }

    /// Resolved agents, de-duplicated by ID in first-seen order.
    #[must_use]
    pub fn resolved_agents(&self, text: &str) -> Vec<AgentIdentity> {
        let mut seen = HashSet::new();
        self.tokens(text)
            .into_iter()
            .filter_map(|token| token.resolved)
            .filter(|agent| seen.insert(agent.id.clone()))
            .collect()
    }
}

/// Three-stage cascade against a list of agents.
///
/// 1. exact case-insensitive match on display name or ID
/// 2. case-insensitive prefix match
/// 3. case-insensitive substring match
///
/// Ties within a stage go to the earliest agent in the list.
#[must_use]
pub fn resolve_candidate(candidate: &str, agents: &[AgentIdentity]) -> Option<AgentIdentity> {
    let needle = candidate.to_lowercase();
    if needle.is_empty() {
        return None;
    }

    let lowered: Vec<[String; 2]> = agents
        .iter()
        .map(|a| [a.display_name.to_lowercase(), a.id.to_lowercase()])
        .collect();

    [MatchStage::Exact, MatchStage::Prefix, MatchStage::Substring]
        .into_iter()
        .find_map(|stage| {
            lowered
                .iter()
                .position(|keys| keys.iter().any(|key| stage.matches(key, &needle)))
                .map(|idx| agents[idx].clone())
        })
}

#[derive(Debug, Clone, Copy)]
enum MatchStage {
    Exact,
    Prefix,
    Substring,
}

impl MatchStage {
    fn matches(self, key: &str, needle: &str) -> bool {
        match self {
            Self::Exact => key == needle,
            Self::Prefix => key.starts_with(needle),
            Self::Substring => key.contains(needle),
        }
    }
}

/// Whether `text` contains the wrapped form `**@agent_name**` (case-insensitive).
#[must_use]
pub fn is_mentioned(text: &str, agent_name: &str) -> bool {
    if agent_name.is_empty() {
        return false;
    }
    let needle = format!("**@{}**", agent_name.to_lowercase());
    text.to_lowercase().contains(&needle)
}
