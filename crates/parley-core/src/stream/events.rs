use crate::model::{ToolCallRecord, ToolResultRecord};
use serde::{Deserialize, Serialize};

/// Payload of a completion notification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionPayload {
    /// Stable message ID, when the runtime has one
    pub id: Option<String>,
    /// Final text content
    pub content: String,
    /// Structured tool calls
    pub tool_calls: Vec<ToolCallRecord>,
    /// Structured tool results
    pub tool_results: Vec<ToolResultRecord>,
}

impl CompletionPayload {
    /// Text-only payload
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Set the payload ID
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Attach tool calls
    #[must_use]
    pub fn with_tool_calls(mut self, calls: Vec<ToolCallRecord>) -> Self {
        self.tool_calls = calls;
        self
    }

    /// Attach tool results
    #[must_use]
    pub fn with_tool_results(mut self, results: Vec<ToolResultRecord>) -> Self {
        self.tool_results = results;
        self
    }
}

/// Generation event from an agent runtime.
///
/// Serialized with a `type` tag, e.g.
/// `{"type":"text_chunk","text":"Hello"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    /// A new turn started
    GenerationStarted {
        /// Runtime-assigned message ID
        #[serde(default)]
        message_id: Option<String>,
    },
    /// Incremental text
    TextChunk {
        /// Chunk text
        text: String,
        /// Runtime-assigned message ID
        #[serde(default)]
        id: Option<String>,
    },
    /// The agent started using a tool
    ToolInvocationStarted {
        /// Tool name
        tool_name: String,
    },
    /// Generation paused or ended; not authoritative for content
    GenerationStopped {
        /// Provider stop reason, e.g. `end_turn` or `tool_use`
        #[serde(default)]
        stop_reason: Option<String>,
    },
    /// Authoritative assistant reply
    AssistantMessage(CompletionPayload),
    /// Authoritative tool call
    ToolCallMessage(CompletionPayload),
    /// Authoritative tool result
    ToolResultMessage(CompletionPayload),
    /// Generation failed
    ErrorMessage(CompletionPayload),
}

impl RuntimeEvent {
    /// Text chunk without an ID
    pub fn chunk(text: impl Into<String>) -> Self {
        Self::TextChunk {
            text: text.into(),
            id: None,
        }
    }

    /// Whether this event finalizes a turn
    #[must_use]
    pub fn is_completion(&self) -> bool {
        matches!(
            self,
            Self::AssistantMessage(_)
                | Self::ToolCallMessage(_)
                | Self::ToolResultMessage(_)
                | Self::ErrorMessage(_)
        )
    }

    /// Event name for logs
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::GenerationStarted { .. } => "generation_started",
            Self::TextChunk { .. } => "text_chunk",
            Self::ToolInvocationStarted { .. } => "tool_invocation_started",
            Self::GenerationStopped { .. } => "generation_stopped",
            Self::AssistantMessage(_) => "assistant_message",
            Self::ToolCallMessage(_) => "tool_call_message",
            Self::ToolResultMessage(_) => "tool_result_message",
            Self::ErrorMessage(_) => "error_message",
        }
    }
}

/// Status shown by a live typing indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypingStatus {
    /// Generating, nothing visible yet (or reasoning)
    Thinking,
    /// Visible text is streaming
    Typing,
    /// A tool is running
    UsingTool,
    /// Generation stopped, awaiting completion
    Stopped,
}

/// Live update for a streaming bubble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypingUpdate {
    /// Session
    pub session_id: String,
    /// Agent
    pub agent_id: String,
    /// Message ID of the bubble, once assigned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Indicator status
    pub status: TypingStatus,
    /// Visible text delta
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_delta: Option<String>,
    /// Reasoning text delta
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_delta: Option<String>,
    /// Tool in use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}
