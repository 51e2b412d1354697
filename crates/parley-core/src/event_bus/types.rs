use crate::model::Message;
use crate::silence::SuppressReason;
use crate::stream::TypingUpdate;
use serde::Serialize;

/// Events emitted by the engine.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Live streaming update for a bubble
    Typing(TypingUpdate),
    /// A turn was finalized and persisted
    MessageFinalized {
        /// The finalized message
        message: Message,
    },
    /// A turn was dropped by the silence protocol
    MessageSuppressed {
        /// Session
        session_id: String,
        /// Agent
        agent_id: String,
        /// ID of the dropped bubble
        message_id: String,
        /// Rule that fired
        reason: SuppressReason,
    },
    /// A prompt was sent to an agent
    Dispatched {
        /// Session
        session_id: String,
        /// Target agent
        agent_id: String,
        /// ID of the message that triggered the dispatch
        trigger_id: String,
        /// Whether loop guidance was injected
        loop_guidance: bool,
    },
    /// Agent-to-agent routing was blocked by the loop governor
    CollaborationBlocked {
        /// Session
        session_id: String,
        /// Agent whose message mentioned the target
        from_agent: String,
        /// Blocked target
        to_agent: String,
        /// Mutual-mention chain length
        chain_length: usize,
    },
}

impl EngineEvent {
    /// Session this event belongs to
    #[must_use]
    pub fn session_id(&self) -> &str {
        match self {
            Self::Typing(update) => &update.session_id,
            Self::MessageFinalized { message } => &message.session_id,
            Self::MessageSuppressed { session_id, .. }
            | Self::Dispatched { session_id, .. }
            | Self::CollaborationBlocked { session_id, .. } => session_id,
        }
    }

    /// Agent this event concerns
    #[must_use]
    pub fn agent_id(&self) -> &str {
        match self {
            Self::Typing(update) => &update.agent_id,
            Self::MessageFinalized { message } => &message.sender_id,
            Self::MessageSuppressed { agent_id, .. } | Self::Dispatched { agent_id, .. } => {
                agent_id
            }
            Self::CollaborationBlocked { to_agent, .. } => to_agent,
        }
    }
}
