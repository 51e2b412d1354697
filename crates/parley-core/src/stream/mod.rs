//! Streaming assembly
//!
//! Everything between the agent runtime's raw generation events and a
//! finalized [`Message`](crate::model::Message):
//!
//! - [`RuntimeEvent`]: the tagged event protocol consumed from runtimes
//! - [`ReasoningSplitter`]: `<think>` tag state machine that survives chunk boundaries
//! - [`StreamAssembler`]: per-pair state machine producing typing updates and finalized turns

pub mod assembler;
pub mod events;
pub mod reasoning;
pub mod state;

pub use assembler::{AssemblerOutput, StreamAssembler, DEFAULT_DEDUP_WINDOW};
pub use events::{CompletionPayload, RuntimeEvent, TypingStatus, TypingUpdate};
pub use reasoning::{extract_embedded_reasoning, ReasoningSplitter, SplitChunk};
pub use state::{LastDelta, StreamPhase, StreamState, TOOL_USE_STOP_REASON};
