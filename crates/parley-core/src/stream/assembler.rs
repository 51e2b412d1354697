//! Stream Assembler
//!
//! Turns the runtime event stream of one (session, agent) pair into live
//! typing updates and exactly one finalized message per turn.
//!
//! ```text
//! Idle ──started──▶ Thinking ──chunk──▶ Typing* ──tool──▶ UsingTool* ──stopped──▶ Stopped
//!                                                                                   │
//!                                    Idle ◀──completion (finalize or suppress)──────┘
//! ```
//!
//! The assembler is owned by exactly one pair worker and does no I/O; the
//! caller persists and broadcasts what it returns.
//!
//! After a tool result the pair is idle but keeps a reserved bubble ID for
//! the follow-up turn. If the runtime never starts that turn, the external
//! generation timeout calls [`StreamAssembler::abandon`] to release it.

use super::events::{CompletionPayload, RuntimeEvent, TypingStatus, TypingUpdate};
use super::reasoning::extract_embedded_reasoning;
use super::state::{LastDelta, StreamPhase, StreamState};
use crate::error::{format_error_for_chat, Error};
use crate::model::{new_message_id, AgentIdentity, Message, MessageKind};
use crate::silence::{SilenceCandidate, SilencePolicy, SuppressReason};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Default duplicate-chunk window
pub const DEFAULT_DEDUP_WINDOW: Duration = Duration::from_millis(50);

/// What applying one event produced.
#[derive(Debug, Clone, PartialEq)]
pub enum AssemblerOutput {
    /// Live indicator / delta update
    Typing(TypingUpdate),
    /// A turn completed and should be persisted and broadcast
    Finalized(Message),
    /// A turn completed but was silenced
    Suppressed {
        /// ID of the dropped bubble
        message_id: String,
        /// Rule that fired
        reason: SuppressReason,
    },
}

/// Per-pair streaming state machine.
#[derive(Debug)]
pub struct StreamAssembler {
    session_id: String,
    agent: AgentIdentity,
    silence: Arc<SilencePolicy>,
    dedup_window: Duration,
    state: Option<StreamState>,
    tool_wait: Option<ToolWait>,
    reserved_id: Option<String>,
    last_delta: Option<LastDelta>,
}

/// A tool call was finalized mid-turn and its result is still pending.
#[derive(Debug, Clone)]
struct ToolWait {
    tool_name: Option<String>,
}

impl StreamAssembler {
    /// Create an idle assembler for one pair.
    pub fn new(
        session_id: impl Into<String>,
        agent: AgentIdentity,
        silence: Arc<SilencePolicy>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            agent,
            silence,
            dedup_window: DEFAULT_DEDUP_WINDOW,
            state: None,
            tool_wait: None,
            reserved_id: None,
            last_delta: None,
        }
    }

    /// Set the duplicate-chunk window
    #[must_use]
    pub fn with_dedup_window(mut self, window: Duration) -> Self {
        self.dedup_window = window;
        self
    }

    /// Session of this pair
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Agent of this pair
    #[must_use]
    pub fn agent(&self) -> &AgentIdentity {
        &self.agent
    }

    /// Live state, if a turn is in progress
    #[must_use]
    pub fn state(&self) -> Option<&StreamState> {
        self.state.as_ref()
    }

    /// Whether no turn is in progress
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state.is_none() && self.tool_wait.is_none()
    }

    /// Bubble ID held for the turn that follows a tool result
    #[must_use]
    pub fn reserved_message_id(&self) -> Option<&str> {
        self.reserved_id.as_deref()
    }

    /// Drop the live turn without output (external timeout).
    pub fn abandon(&mut self) {
        if let Some(state) = self.state.take() {
            info!(
                session_id = %self.session_id,
                agent_id = %self.agent.id,
                message_id = ?state.message_id,
                "Abandoning stream"
            );
        }
        self.tool_wait = None;
        self.reserved_id = None;
        self.last_delta = None;
    }

    /// Apply an event at the current instant.
    pub fn apply(&mut self, event: RuntimeEvent) -> Vec<AssemblerOutput> {
        self.apply_at(event, Instant::now())
    }

    /// Apply an event observed at `now`.
    pub fn apply_at(&mut self, event: RuntimeEvent, now: Instant) -> Vec<AssemblerOutput> {
        match event {
            RuntimeEvent::GenerationStarted { message_id } => self.on_started(message_id),
            RuntimeEvent::TextChunk { text, id } => self.on_chunk(&text, id, now),
            RuntimeEvent::ToolInvocationStarted { tool_name } => self.on_tool_started(tool_name),
            RuntimeEvent::GenerationStopped { stop_reason } => self.on_stopped(stop_reason),
            RuntimeEvent::AssistantMessage(payload) => {
                self.on_completion(MessageKind::Assistant, payload)
            }
            RuntimeEvent::ToolCallMessage(payload) => {
                self.on_completion(MessageKind::ToolCall, payload)
            }
            RuntimeEvent::ToolResultMessage(payload) => {
                self.on_completion(MessageKind::ToolResult, payload)
            }
            RuntimeEvent::ErrorMessage(payload) => self.on_completion(MessageKind::Error, payload),
        }
    }

    fn on_started(&mut self, message_id: Option<String>) -> Vec<AssemblerOutput> {
        // A follow-up turn after a tool result keeps the ID reserved for it.
        let reserved = self.reserved_id.take();
        let message_id = match (&self.state, message_id) {
            (_, Some(id)) => Some(id),
            (Some(state), None) if state.is_pristine() => state.message_id.clone(),
            (_, None) => reserved,
        };

        if let Some(previous) = self.state.as_ref().filter(|s| !s.is_pristine()) {
            debug!(
                session_id = %self.session_id,
                agent_id = %self.agent.id,
                message_id = ?previous.message_id,
                "Retiring unfinished stream"
            );
        }

        self.tool_wait = None;
        self.last_delta = None;
        let state = StreamState::new(message_id);
        let update = typing_update(
            &self.session_id,
            &self.agent.id,
            Some(&state),
            TypingStatus::Thinking,
        );
        self.state = Some(state);
        vec![AssemblerOutput::Typing(update)]
    }

    fn on_chunk(&mut self, text: &str, id: Option<String>, now: Instant) -> Vec<AssemblerOutput> {
        if text.is_empty() {
            return Vec::new();
        }

        // Checked across turns so a re-emit after finalization is dropped too.
        if self
            .last_delta
            .as_ref()
            .is_some_and(|last| last.repeats(text, now, self.dedup_window))
        {
            debug!(
                session_id = %self.session_id,
                agent_id = %self.agent.id,
                "Dropping duplicate chunk"
            );
            return Vec::new();
        }

        let delta = LastDelta::new(text, now);
        self.last_delta = Some(delta.clone());

        let reserved = &mut self.reserved_id;
        let state = self
            .state
            .get_or_insert_with(|| StreamState::new(reserved.take()));
        if state.message_id.is_none() {
            state.message_id = Some(id.unwrap_or_else(new_message_id));
        }
        state.last_delta = Some(delta);

        let split = state.splitter.push(text);
        if split.is_empty() {
            return Vec::new();
        }

        state.text.push_str(&split.visible);
        state.reasoning.push_str(&split.reasoning);

        let status = if split.visible.is_empty() {
            TypingStatus::Thinking
        } else {
            state.phase = StreamPhase::Typing;
            TypingStatus::Typing
        };

        let mut update = typing_update(&self.session_id, &self.agent.id, Some(&*state), status);
        update.text_delta = Some(split.visible).filter(|s| !s.is_empty());
        update.reasoning_delta = Some(split.reasoning).filter(|s| !s.is_empty());
        vec![AssemblerOutput::Typing(update)]
    }

    fn on_tool_started(&mut self, tool_name: String) -> Vec<AssemblerOutput> {
        let reserved = &mut self.reserved_id;
        let state = self
            .state
            .get_or_insert_with(|| StreamState::new(reserved.take()));
        state.tool_name = Some(tool_name);
        state.phase = StreamPhase::UsingTool;

        vec![AssemblerOutput::Typing(typing_update(
            &self.session_id,
            &self.agent.id,
            Some(&*state),
            TypingStatus::UsingTool,
        ))]
    }

    fn on_stopped(&mut self, stop_reason: Option<String>) -> Vec<AssemblerOutput> {
        let Some(state) = self.state.as_mut() else {
            debug!(
                session_id = %self.session_id,
                agent_id = %self.agent.id,
                "Stop without a live stream"
            );
            return Vec::new();
        };
        state.stop_reason = stop_reason;
        state.phase = StreamPhase::Stopped;

        vec![AssemblerOutput::Typing(typing_update(
            &self.session_id,
            &self.agent.id,
            Some(&*state),
            TypingStatus::Stopped,
        ))]
    }

    fn on_completion(
        &mut self,
        kind: MessageKind,
        payload: CompletionPayload,
    ) -> Vec<AssemblerOutput> {
        let state = self.state.take();
        let tool_wait = self.tool_wait.take();
        let reserved = self.reserved_id.take();

        let message_id = state
            .as_ref()
            .and_then(|s| s.message_id.clone())
            .or(reserved)
            .or_else(|| payload.id.clone())
            .unwrap_or_else(new_message_id);

        let mut outputs = vec![self.finalize(message_id, kind, payload, state.as_ref())];

        let stopped_for_tool = state.as_ref().is_some_and(StreamState::stopped_for_tool);
        match kind {
            MessageKind::ToolCall if stopped_for_tool => {
                let wait = ToolWait {
                    tool_name: state.as_ref().and_then(|s| s.tool_name.clone()),
                };
                let mut update = typing_update(
                    &self.session_id,
                    &self.agent.id,
                    None,
                    TypingStatus::UsingTool,
                );
                update.tool_name = wait.tool_name.clone();
                outputs.push(AssemblerOutput::Typing(update));
                self.tool_wait = Some(wait);
            }
            MessageKind::ToolResult if tool_wait.is_some() || stopped_for_tool => {
                // Keep the bubble busy and reserve the follow-up turn's ID.
                let reserved = new_message_id();
                let mut update = typing_update(
                    &self.session_id,
                    &self.agent.id,
                    None,
                    TypingStatus::Thinking,
                );
                update.message_id = Some(reserved.clone());
                outputs.push(AssemblerOutput::Typing(update));
                self.reserved_id = Some(reserved);
            }
            _ => {}
        }

        outputs
    }

    fn finalize(
        &self,
        message_id: String,
        kind: MessageKind,
        payload: CompletionPayload,
        state: Option<&StreamState>,
    ) -> AssemblerOutput {
        let (streamed_text, streamed_reasoning) = match state {
            Some(s) => {
                let mut splitter = s.splitter.clone();
                let tail = splitter.flush();
                (
                    format!("{}{}", s.text, tail.visible),
                    format!("{}{}", s.reasoning, tail.reasoning),
                )
            }
            None => (String::new(), String::new()),
        };

        let raw = if payload.content.trim().is_empty() {
            streamed_text
        } else {
            payload.content
        };
        let (visible, embedded_reasoning) = extract_embedded_reasoning(&raw);

        let reasoning = if streamed_reasoning.trim().is_empty() {
            embedded_reasoning
        } else {
            streamed_reasoning.trim().to_string()
        };

        let content = if kind == MessageKind::Error {
            format_error_for_chat(&Error::Generation(visible))
        } else {
            visible
        };

        let has_tool_data = !payload.tool_calls.is_empty() || !payload.tool_results.is_empty();
        let candidate = SilenceCandidate {
            content: &content,
            has_tool_data,
            kind,
        };
        if let Some(reason) = self.silence.evaluate(&candidate) {
            info!(
                session_id = %self.session_id,
                agent_id = %self.agent.id,
                message_id = %message_id,
                reason = %reason,
                "Suppressing silent turn"
            );
            return AssemblerOutput::Suppressed { message_id, reason };
        }

        let message = Message::agent(message_id, &self.session_id, &self.agent, kind, content)
            .with_reasoning(Some(reasoning))
            .with_tool_calls(payload.tool_calls)
            .with_tool_results(payload.tool_results);

        debug!(
            session_id = %self.session_id,
            agent_id = %self.agent.id,
            message_id = %message.id,
            kind = ?kind,
            "Turn finalized"
        );
        AssemblerOutput::Finalized(message)
    }
}

fn typing_update(
    session_id: &str,
    agent_id: &str,
    state: Option<&StreamState>,
    status: TypingStatus,
) -> TypingUpdate {
    TypingUpdate {
        session_id: session_id.to_string(),
        agent_id: agent_id.to_string(),
        message_id: state.and_then(|s| s.message_id.clone()),
        status,
        text_delta: None,
        reasoning_delta: None,
        tool_name: state.and_then(|s| s.tool_name.clone()),
    }
}
