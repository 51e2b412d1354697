//! In-memory port implementations.
//!
//! Used by the CLI replay command and by tests. `InMemoryMessageStore` keeps a
//! bounded per-session history (older entries are trimmed) and updates
//! messages in place when the same ID is persisted twice.

use super::{AgentDirectory, AgentDispatcher, HistoryStore, MessageSink};
use crate::error::Result;
use crate::model::{AgentIdentity, Message, Session};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Agent directory backed by a fixed list of agents and sessions.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    agents: Vec<AgentIdentity>,
    sessions: HashMap<String, Session>,
}

impl StaticDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent. A later registration with the same ID replaces it.
    #[must_use]
    pub fn with_agent(mut self, agent: AgentIdentity) -> Self {
        self.agents.retain(|a| a.id != agent.id);
        self.agents.push(agent);
        self
    }

    /// Register a session.
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.sessions.insert(session.id.clone(), session);
        self
    }

    /// Number of registered sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn by_id(&self, agent_id: &str) -> Option<&AgentIdentity> {
        self.agents.iter().find(|a| a.id == agent_id)
    }
}

impl AgentDirectory for StaticDirectory {
    fn all_agents(&self) -> Vec<AgentIdentity> {
        self.agents.clone()
    }

    fn resolve_by_name_or_id(&self, candidate: &str) -> Option<AgentIdentity> {
        self.agents.iter().find(|a| a.matches(candidate)).cloned()
    }

    fn session(&self, session_id: &str) -> Option<Session> {
        self.sessions.get(session_id).cloned()
    }

    fn list_session_members(&self, session_id: &str) -> Vec<AgentIdentity> {
        let Some(session) = self.sessions.get(session_id) else {
            return Vec::new();
        };
        session
            .members
            .iter()
            .map(|id| {
                self.by_id(id).cloned().unwrap_or_else(|| {
                    debug!(session_id, agent_id = %id, "Member not registered, using ID as name");
                    AgentIdentity::new(id.clone(), id.clone())
                })
            })
            .collect()
    }

    fn get_orchestrator(&self, session_id: &str) -> Option<AgentIdentity> {
        let session = self.sessions.get(session_id)?;
        let id = session.orchestrator.as_deref()?;
        Some(
            self.by_id(id)
                .cloned()
                .unwrap_or_else(|| AgentIdentity::new(id, id)),
        )
    }
}

/// Bounded in-memory message history.
#[derive(Debug)]
pub struct InMemoryMessageStore {
    history: RwLock<HashMap<String, Vec<Message>>>,
    max_history: usize,
}

impl InMemoryMessageStore {
    /// Create a store keeping at most `max_history` messages per session.
    #[must_use]
    pub fn new(max_history: usize) -> Self {
        Self {
            history: RwLock::new(HashMap::new()),
            max_history,
        }
    }

    /// All stored messages of a session.
    pub async fn session_messages(&self, session_id: &str) -> Vec<Message> {
        let history = self.history.read().await;
        history.get(session_id).cloned().unwrap_or_default()
    }

    /// Number of stored messages in a session.
    pub async fn len(&self, session_id: &str) -> usize {
        let history = self.history.read().await;
        history.get(session_id).map(Vec::len).unwrap_or(0)
    }

    /// Whether the session has no stored messages.
    pub async fn is_empty(&self, session_id: &str) -> bool {
        self.len(session_id).await == 0
    }

    /// Remove a session's history.
    pub async fn clear_session(&self, session_id: &str) {
        let mut history = self.history.write().await;
        history.remove(session_id);
    }
}

impl Default for InMemoryMessageStore {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[async_trait]
impl MessageSink for InMemoryMessageStore {
    async fn persist(&self, message: &Message) -> Result<()> {
        let mut history = self.history.write().await;
        let entries = history.entry(message.session_id.clone()).or_default();

        if let Some(existing) = entries.iter_mut().find(|m| m.id == message.id) {
            *existing = message.clone();
            return Ok(());
        }

        entries.push(message.clone());
        if entries.len() > self.max_history {
            let excess = entries.len() - self.max_history;
            entries.drain(..excess);
        }
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for InMemoryMessageStore {
    async fn recent(&self, session_id: &str, limit: usize) -> Result<Vec<Message>> {
        let history = self.history.read().await;
        let Some(entries) = history.get(session_id) else {
            return Ok(Vec::new());
        };
        let start = entries.len().saturating_sub(limit);
        Ok(entries[start..].to_vec())
    }
}

/// One prompt delivered through [`RecordingDispatcher`].
#[derive(Debug, Clone)]
pub struct DispatchRecord {
    /// Session ID
    pub session_id: String,
    /// Target agent ID
    pub agent_id: String,
    /// Prompt text
    pub prompt: String,
    /// When it was sent
    pub sent_at: DateTime<Utc>,
}

/// Dispatcher that records prompts instead of delivering them.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<DispatchRecord>>,
}

impl RecordingDispatcher {
    /// Create an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every prompt sent so far.
    pub async fn records(&self) -> Vec<DispatchRecord> {
        self.sent.lock().await.clone()
    }

    /// Prompts sent to one agent.
    pub async fn records_for(&self, agent_id: &str) -> Vec<DispatchRecord> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|r| r.agent_id == agent_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AgentDispatcher for RecordingDispatcher {
    async fn send_to_agent(&self, session_id: &str, agent_id: &str, prompt: &str) -> Result<()> {
        info!(session_id, agent_id, prompt_len = prompt.len(), "Prompt dispatched");
        self.sent.lock().await.push(DispatchRecord {
            session_id: session_id.to_string(),
            agent_id: agent_id.to_string(),
            prompt: prompt.to_string(),
            sent_at: Utc::now(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests;
