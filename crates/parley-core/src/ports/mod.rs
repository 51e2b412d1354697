//! Ports to external collaborators
//!
//! The engine never owns persistence, the agent registry or the model
//! runtime. It talks to them through these traits:
//!
//! - [`AgentDirectory`]: agent and session lookups
//! - [`HistoryStore`] / [`MessageSink`]: reading recent messages, persisting finalized ones
//! - [`AgentDispatcher`]: fire-and-forget prompt delivery to an agent runtime
//! - [`PromptBuilder`]: contextual prompt assembly

pub mod memory;

use crate::error::Result;
use crate::model::{AgentIdentity, Message, Session};
use async_trait::async_trait;

pub use memory::{DispatchRecord, InMemoryMessageStore, RecordingDispatcher, StaticDirectory};

/// Lookup of registered agents and session membership.
#[cfg_attr(test, mockall::automock)]
pub trait AgentDirectory: Send + Sync {
    /// Every registered agent, in registration order.
    fn all_agents(&self) -> Vec<AgentIdentity>;

    /// Exact, case-insensitive lookup by display name or ID.
    fn resolve_by_name_or_id(&self, candidate: &str) -> Option<AgentIdentity>;

    /// Session metadata.
    fn session(&self, session_id: &str) -> Option<Session>;

    /// Member agents of a session, in member order.
    fn list_session_members(&self, session_id: &str) -> Vec<AgentIdentity>;

    /// The session's orchestrator agent, if one is configured.
    fn get_orchestrator(&self, session_id: &str) -> Option<AgentIdentity>;
}

/// Read access to recent session history.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// The last `limit` messages of a session, oldest first.
    async fn recent(&self, session_id: &str, limit: usize) -> Result<Vec<Message>>;
}

/// Persistence of finalized messages.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Store a finalized message. Storing an existing ID replaces it.
    async fn persist(&self, message: &Message) -> Result<()>;
}

/// Delivery of prompts to agent runtimes.
///
/// Completion is observed through later runtime events, never through the
/// return value.
#[async_trait]
pub trait AgentDispatcher: Send + Sync {
    /// Send a prompt to an agent within a session.
    async fn send_to_agent(&self, session_id: &str, agent_id: &str, prompt: &str) -> Result<()>;
}

/// Everything a prompt builder gets to see for one dispatch.
#[derive(Debug, Clone, Copy)]
pub struct PromptRequest<'a> {
    /// Session the dispatch belongs to
    pub session_id: &'a str,
    /// Agent that will receive the prompt
    pub target: &'a AgentIdentity,
    /// All session members (including the target)
    pub members: &'a [AgentIdentity],
    /// Message that triggered the dispatch
    pub trigger: &'a Message,
    /// Recent history, oldest first
    pub history: &'a [Message],
    /// Loop guidance to inject, if the governor produced any
    pub loop_guidance: Option<&'a str>,
}

/// Assembly of the contextual prompt sent to an agent.
pub trait PromptBuilder: Send + Sync {
    /// Build the prompt text.
    fn build(&self, request: &PromptRequest<'_>) -> String;
}
