//! EventBus - broadcast-based event system for live engine events.
//!
//! Publishes typing updates, finalized messages and routing decisions so that
//! UI transports and internal subscribers can follow a conversation live.

/// Core event bus implementation (broadcast channel).
pub mod bus;
/// Event type definitions for the engine.
pub mod types;

pub use bus::EventBus;
pub use types::EngineEvent;
