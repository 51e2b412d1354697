//! Orchestrator - the conversation loop
//!
//! Ties the components together:
//!
//! ```text
//! inbound message ─▶ ResponderResolver ─▶ Dispatch ─▶ agent runtime (external)
//!                                                          │ RuntimeEvent
//!                                                          ▼
//!          LoopGovernor ◀─ MentionParser ◀─ finalized ◀─ StreamAssembler (per pair)
//!               │
//!               └─▶ deferred Dispatch to the mentioned agent ─▶ ...
//! ```
//!
//! # Module Structure
//!
//! - `config`: `EngineConfig`
//! - `core`: `Orchestrator`, its builder and the worker registry
//! - `worker`: per-pair ordered command processing
//! - `collaboration`: mention-driven re-dispatch with loop governance
//! - `prompt`: default contextual prompt and wrapper stripping

mod collaboration;
mod config;
mod core;
mod prompt;
mod worker;


pub use config::EngineConfig;
pub use core::{Orchestrator, OrchestratorBuilder};
pub use prompt::{strip_internal_wrapper, CollaborationPrompt, WRAPPER_CLOSE, WRAPPER_OPEN};
pub use worker::{DispatchRequest, PairCommand};
