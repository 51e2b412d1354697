//! Conversation data model
//!
//! Sessions, agents and messages as seen by the engine. Sessions and agents
//! are owned by external collaborators and are read-only here; messages are
//! produced once per completed turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Generate a fresh message identifier.
#[must_use]
pub fn new_message_id() -> String {
    Uuid::new_v4().to_string()
}

/// Kind of conversation container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// One user, one agent
    Direct,
    /// One user, many agents
    Group,
}

/// A conversation container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier
    pub id: String,
    /// Direct or group
    pub kind: SessionKind,
    /// Member agent IDs, in display order
    pub members: Vec<String>,
    /// Distinguished coordinating agent, if any
    #[serde(default)]
    pub orchestrator: Option<String>,
    /// Last modification time
    #[serde(default = "chrono::Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a direct session with a single agent.
    pub fn direct(id: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: SessionKind::Direct,
            members: vec![agent_id.into()],
            orchestrator: None,
            updated_at: Utc::now(),
        }
    }

    /// Create a group session.
    pub fn group<I, S>(id: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            kind: SessionKind::Group,
            members: members.into_iter().map(Into::into).collect(),
            orchestrator: None,
            updated_at: Utc::now(),
        }
    }

    /// Set the orchestrator agent.
    #[must_use]
    pub fn with_orchestrator(mut self, agent_id: impl Into<String>) -> Self {
        self.orchestrator = Some(agent_id.into());
        self
    }

    /// Whether the agent is a member of this session.
    #[must_use]
    pub fn is_member(&self, agent_id: &str) -> bool {
        self.members.iter().any(|m| m == agent_id)
    }
}

/// An addressable agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentIdentity {
    /// Stable identifier
    pub id: String,
    /// Name shown in the transcript and used in mentions
    pub display_name: String,
}

impl AgentIdentity {
    /// Create a new agent identity.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    /// Exact, case-insensitive match on ID or display name.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.id.eq_ignore_ascii_case(candidate)
            || self.display_name.to_lowercase() == candidate.to_lowercase()
    }
}

impl fmt::Display for AgentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name)
    }
}

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderKind {
    /// The human user
    User,
    /// An AI agent
    Agent,
}

/// What a message carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// User-authored text
    Text,
    /// Agent reply
    Assistant,
    /// Agent requested a tool
    ToolCall,
    /// Result of a tool call
    ToolResult,
    /// Generation failed
    Error,
}

/// A tool invocation requested by an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Call ID from the runtime
    #[serde(default)]
    pub id: Option<String>,
    /// Tool name
    pub name: String,
    /// Arguments as sent by the model
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// The outcome of a tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultRecord {
    /// Call ID this result answers
    #[serde(default)]
    pub call_id: Option<String>,
    /// Tool name
    #[serde(default)]
    pub name: Option<String>,
    /// Tool output
    #[serde(default)]
    pub output: serde_json::Value,
    /// Whether the tool failed
    #[serde(default)]
    pub is_error: bool,
}

/// A chat message.
///
/// The same `id` is used for the streaming projection and the finalized
/// record so a UI can update a bubble in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message identifier
    pub id: String,
    /// Owning session
    pub session_id: String,
    /// Author kind
    pub sender: SenderKind,
    /// Author identifier (user ID or agent ID)
    pub sender_id: String,
    /// Author display name
    pub sender_name: String,
    /// Visible text
    pub content: String,
    /// Separated reasoning text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    /// Tool calls attached to this turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRecord>,
    /// Tool results attached to this turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_results: Vec<ToolResultRecord>,
    /// Message kind
    pub kind: MessageKind,
    /// Whether this is a live streaming projection
    #[serde(default)]
    pub is_streaming: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a user-authored message.
    pub fn user(
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let user_id = user_id.into();
        Self {
            id: new_message_id(),
            session_id: session_id.into(),
            sender: SenderKind::User,
            sender_name: user_id.clone(),
            sender_id: user_id,
            content: content.into(),
            reasoning: None,
            tool_calls: Vec::new(),
            tool_results: Vec::new(),
            kind: MessageKind::Text,
            is_streaming: false,
            created_at: Utc::now(),
        }
    }

    /// Create an agent-authored message.
    pub fn agent(
        id: impl Into<String>,
        session_id: impl Into<String>,
        agent: &AgentIdentity,
        kind: MessageKind,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            session_id: session_id.into(),
            sender: SenderKind::Agent,
            sender_id: agent.id.clone(),
            sender_name: agent.display_name.clone(),
            content: content.into(),
            reasoning: None,
            tool_calls: Vec::new(),
            tool_results: Vec::new(),
            kind,
            is_streaming: false,
            created_at: Utc::now(),
        }
    }

    /// Attach reasoning text.
    #[must_use]
    pub fn with_reasoning(mut self, reasoning: Option<String>) -> Self {
        self.reasoning = reasoning.filter(|r| !r.is_empty());
        self
    }

    /// Attach tool calls.
    #[must_use]
    pub fn with_tool_calls(mut self, calls: Vec<ToolCallRecord>) -> Self {
        self.tool_calls = calls;
        self
    }

    /// Attach tool results.
    #[must_use]
    pub fn with_tool_results(mut self, results: Vec<ToolResultRecord>) -> Self {
        self.tool_results = results;
        self
    }

    /// Set the display name of a user sender.
    #[must_use]
    pub fn with_sender_name(mut self, name: impl Into<String>) -> Self {
        self.sender_name = name.into();
        self
    }

    /// Whether an agent authored this message.
    #[must_use]
    pub fn is_agent(&self) -> bool {
        self.sender == SenderKind::Agent
    }

    /// Whether this message was authored by the given agent.
    #[must_use]
    pub fn is_from(&self, agent: &AgentIdentity) -> bool {
        self.is_agent() && self.sender_id == agent.id
    }

    /// Whether the message carries tool call or tool result data.
    #[must_use]
    pub fn has_tool_data(&self) -> bool {
        !self.tool_calls.is_empty() || !self.tool_results.is_empty()
    }
}

/// Key of a (session, agent) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairKey {
    /// Session identifier
    pub session_id: String,
    /// Runtime agent identifier
    pub agent_id: String,
}

impl PairKey {
    /// Create a new pair key.
    pub fn new(session_id: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            agent_id: agent_id.into(),
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.session_id, self.agent_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_matches_case_insensitive() {
        let agent = AgentIdentity::new("backend", "Sindri");
        assert!(agent.matches("SINDRI"));
        assert!(agent.matches("Backend"));
        assert!(!agent.matches("sin"));
    }

    #[test]
    fn test_message_serialization_skips_empty() {
        let msg = Message::user("s1", "alice", "hello");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"sender\":\"user\""));
        assert!(!json.contains("reasoning"));
        assert!(!json.contains("tool_calls"));
    }

    #[test]
    fn test_empty_reasoning_is_dropped() {
        let agent = AgentIdentity::new("a", "A");
        let msg = Message::agent("m1", "s1", &agent, MessageKind::Assistant, "hi")
            .with_reasoning(Some(String::new()));
        assert!(msg.reasoning.is_none());
        assert!(msg.is_from(&agent));
    }

    #[test]
    fn test_pair_key_display() {
        assert_eq!(PairKey::new("s1", "bob").to_string(), "s1/bob");
    }
}
