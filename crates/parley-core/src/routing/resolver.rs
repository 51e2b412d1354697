//! Responder Resolver
//!
//! Decides which member agents answer an inbound message. Rules are tried in
//! order of specificity and the first one that yields agents wins:
//!
//! ```text
//! 1. direct    "@sindri fix it"        -> members whose name/ID follows an '@'
//! 2. mention   "**@Sindri** fix it"    -> validated strict mentions that are members
//! 3. sticky    "and the tests?"        -> the agent that spoke last (user messages only)
//! 4. orchestrator                      -> the session orchestrator, if a member
//! 5. first member                      -> never leave a non-empty group silent
//! ```

use crate::mention::MentionParser;
use crate::model::{AgentIdentity, Message, SenderKind};
use crate::ports::AgentDirectory;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Which rule produced a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionRule {
    /// `@name` / `@id` substring of a member
    DirectMembership,
    /// Strict `**@Name**` mention of a member
    ValidatedMention,
    /// Last agent that spoke
    StickyContinuation,
    /// Session orchestrator
    Orchestrator,
    /// First session member
    FirstMember,
    /// Session has no members
    NoMembers,
}

impl fmt::Display for ResolutionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DirectMembership => "direct_membership",
            Self::ValidatedMention => "validated_mention",
            Self::StickyContinuation => "sticky_continuation",
            Self::Orchestrator => "orchestrator",
            Self::FirstMember => "first_member",
            Self::NoMembers => "no_members",
        };
        f.write_str(name)
    }
}

/// Ordered responders and the rule that selected them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Agent IDs, in member order
    pub responders: Vec<String>,
    /// Rule that fired
    pub rule: ResolutionRule,
}

impl Resolution {
    fn new(responders: Vec<String>, rule: ResolutionRule) -> Self {
        Self { responders, rule }
    }
}

/// Selects the agents that must respond to a message.
pub struct ResponderResolver<'a> {
    directory: &'a dyn AgentDirectory,
}

impl<'a> ResponderResolver<'a> {
    /// Create a resolver backed by the given directory.
    pub fn new(directory: &'a dyn AgentDirectory) -> Self {
        Self { directory }
    }

    /// Ordered agent IDs that should respond to `message`.
    #[must_use]
    pub fn determine_responders(
        &self,
        message: &Message,
        members: &[AgentIdentity],
        orchestrator: Option<&AgentIdentity>,
        history: &[Message],
    ) -> Vec<String> {
        self.resolve(message, members, orchestrator, history)
            .responders
    }

    /// Like [`determine_responders`](Self::determine_responders), also reporting the rule.
    #[must_use]
    pub fn resolve(
        &self,
        message: &Message,
        members: &[AgentIdentity],
        orchestrator: Option<&AgentIdentity>,
        history: &[Message],
    ) -> Resolution {
        let Some(first) = members.first() else {
            return Resolution::new(Vec::new(), ResolutionRule::NoMembers);
        };

        let resolution = direct_membership(&message.content, members)
            .map(|ids| Resolution::new(ids, ResolutionRule::DirectMembership))
            .or_else(|| {
                self.validated_mentions(&message.content, members)
                    .map(|ids| Resolution::new(ids, ResolutionRule::ValidatedMention))
            })
            .or_else(|| {
                (message.sender == SenderKind::User)
                    .then(|| sticky_speaker(history, members))
                    .flatten()
                    .map(|id| Resolution::new(vec![id], ResolutionRule::StickyContinuation))
            })
            .or_else(|| {
                orchestrator
                    .filter(|o| members.iter().any(|m| m.id == o.id))
                    .map(|o| Resolution::new(vec![o.id.clone()], ResolutionRule::Orchestrator))
            })
            .unwrap_or_else(|| {
                Resolution::new(vec![first.id.clone()], ResolutionRule::FirstMember)
            });

        debug!(
            session_id = %message.session_id,
            rule = %resolution.rule,
            responders = ?resolution.responders,
            "Responders resolved"
        );
        resolution
    }

    fn validated_mentions(&self, content: &str, members: &[AgentIdentity]) -> Option<Vec<String>> {
        let mentioned = MentionParser::new(self.directory).resolved_agents(content);
        let ids: Vec<String> = members
            .iter()
            .filter(|m| mentioned.iter().any(|a| a.id == m.id))
            .map(|m| m.id.clone())
            .collect();
        (!ids.is_empty()).then_some(ids)
    }
}

/// Members whose `@name` or `@id` appears anywhere in the lowercased content.
fn direct_membership(content: &str, members: &[AgentIdentity]) -> Option<Vec<String>> {
    let lower = content.to_lowercase();
    let ids: Vec<String> = members
        .iter()
        .filter(|m| {
            lower.contains(&format!("@{}", m.display_name.to_lowercase()))
                || lower.contains(&format!("@{}", m.id.to_lowercase()))
        })
        .map(|m| m.id.clone())
        .collect();
    (!ids.is_empty()).then_some(ids)
}

/// The most recent agent-authored message's sender, if still a member.
fn sticky_speaker(history: &[Message], members: &[AgentIdentity]) -> Option<String> {
    let last = history.iter().rev().find(|m| m.is_agent())?;
    members
        .iter()
        .find(|m| m.id == last.sender_id || m.display_name.eq_ignore_ascii_case(&last.sender_name))
        .map(|m| m.id.clone())
}
