//! Parley Core - Conversation Orchestration Engine
//!
//! This crate turns raw generation events from agent runtimes into stable chat
//! messages and decides which agents respond to every message, including:
//! - Mentions: strict `**@Name**` parsing and display-layer highlighting
//! - Routing: responder resolution and collaboration loop governance
//! - Streaming: per-pair assembly of typing updates, reasoning and final messages
//! - Silence: suppression of empty and meta-conversational turns
//! - Orchestration: per-pair workers and deferred agent-to-agent dispatch
//! - Ports: traits for the directory, persistence and dispatch collaborators

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod event_bus;
pub mod mention;
pub mod model;
pub mod orchestrator;
pub mod ports;
pub mod routing;
pub mod silence;
pub mod stream;

pub use error::{format_error_for_chat, format_error_for_cli, Error, Result, UserFriendlyError};
pub use event_bus::{EngineEvent, EventBus};
pub use mention::{is_mentioned, MentionParser, MentionToken};
pub use model::{AgentIdentity, Message, MessageKind, PairKey, SenderKind, Session, SessionKind};
pub use orchestrator::{
    strip_internal_wrapper, CollaborationPrompt, EngineConfig, Orchestrator, OrchestratorBuilder,
};
pub use ports::{
    AgentDirectory, AgentDispatcher, HistoryStore, InMemoryMessageStore, MessageSink,
    PromptBuilder, PromptRequest, RecordingDispatcher, StaticDirectory,
};
pub use routing::{
    LoopDecision, LoopGovernor, LoopPolicyConfig, Resolution, ResolutionRule, ResponderResolver,
    RoutingDecision,
};
pub use silence::{SilenceConfig, SilencePolicy, SilenceRule, SuppressReason};
pub use stream::{
    AssemblerOutput, CompletionPayload, RuntimeEvent, StreamAssembler, TypingStatus, TypingUpdate,
};
