use super::events::TypingStatus;
use super::reasoning::ReasoningSplitter;
use std::time::Duration;
use tokio::time::Instant;

/// Phase of a live turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    /// Started, nothing visible yet
    Thinking,
    /// Visible text streaming
    Typing,
    /// A tool is running
    UsingTool,
    /// Stopped, awaiting the completion notification
    Stopped,
}

impl StreamPhase {
    /// Indicator status for this phase
    #[must_use]
    pub fn status(self) -> TypingStatus {
        match self {
            Self::Thinking => TypingStatus::Thinking,
            Self::Typing => TypingStatus::Typing,
            Self::UsingTool => TypingStatus::UsingTool,
            Self::Stopped => TypingStatus::Stopped,
        }
    }
}

/// Accumulated state of one live turn for a (session, agent) pair.
#[derive(Debug, Clone)]
pub struct StreamState {
    /// Bubble ID, assigned at start or on the first content event
    pub message_id: Option<String>,
    /// Current phase
    pub phase: StreamPhase,
    /// Accumulated visible text
    pub text: String,
    /// Accumulated reasoning text
    pub reasoning: String,
    /// Tag splitter
    pub splitter: ReasoningSplitter,
    /// Last accepted chunk of this turn
    pub last_delta: Option<LastDelta>,
    /// Stop reason from the last `generation_stopped`
    pub stop_reason: Option<String>,
    /// Tool currently in use
    pub tool_name: Option<String>,
}

impl StreamState {
    /// Fresh state in the Thinking phase.
    #[must_use]
    pub fn new(message_id: Option<String>) -> Self {
        Self {
            message_id,
            phase: StreamPhase::Thinking,
            text: String::new(),
            reasoning: String::new(),
            splitter: ReasoningSplitter::new(),
            last_delta: None,
            stop_reason: None,
            tool_name: None,
        }
    }

    /// Whether this turn has produced no content yet
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        self.text.is_empty() && self.reasoning.is_empty() && self.last_delta.is_none()
    }

    /// Whether the model is inside an open reasoning section
    #[must_use]
    pub fn is_reasoning(&self) -> bool {
        self.splitter.is_reasoning()
    }

    /// Whether generation stopped to run a tool
    #[must_use]
    pub fn stopped_for_tool(&self) -> bool {
        self.stop_reason.as_deref() == Some(TOOL_USE_STOP_REASON)
    }
}

/// A chunk and the instant it was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastDelta {
    /// Raw chunk text
    pub text: String,
    /// Arrival time
    pub at: Instant,
}

impl LastDelta {
    /// Record a chunk.
    pub fn new(text: impl Into<String>, at: Instant) -> Self {
        Self {
            text: text.into(),
            at,
        }
    }

    /// Whether `text` repeats this chunk within `window` of it.
    #[must_use]
    pub fn repeats(&self, text: &str, now: Instant, window: Duration) -> bool {
        self.text == text && now.saturating_duration_since(self.at) <= window
    }
}

/// Stop reason reported when generation pauses for a tool call
pub const TOOL_USE_STOP_REASON: &str = "tool_use";
