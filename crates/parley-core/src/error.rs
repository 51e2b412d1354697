//! Error types for parley-core
//!
//! This module provides error types and user-friendly error formatting.
//! Most failure modes in the engine degrade to "no message" or "one visible
//! error message"; these variants cover the cases that are reported to a caller.

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration
    #[error("invalid configuration: {field}")]
    InvalidConfig {
        /// Config field name
        field: String,
        /// Detailed message
        message: String,
    },

    /// The generation runtime reported a failure for a turn
    #[error("generation error: {0}")]
    Generation(String),

    /// Sending a prompt to an agent failed
    #[error("dispatch error: {0}")]
    Dispatch(String),

    /// Persisting or loading messages failed
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The session is not known to the agent directory
    #[error("unknown session: {0}")]
    UnknownSession(String),

    /// The per-pair worker is gone (engine shut down)
    #[error("worker closed: {0}")]
    WorkerClosed(String),

    /// Internal error (serialization, etc.)
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for an [`Error::InvalidConfig`].
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Trait for user-friendly error messages
///
/// Provides human-readable error messages and suggestions for fixing.
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get a suggestion for how to fix the error
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for Error {
    fn user_message(&self) -> String {
        match self {
            Error::InvalidConfig { field, message } => {
                format!("⚙️ Configuration error in '{}': {}", field, message)
            }
            Error::Generation(msg) => {
                if msg.trim().is_empty() {
                    "⚠️ The agent failed to generate a response.".to_string()
                } else {
                    format!("⚠️ The agent failed to generate a response: {}", msg.trim())
                }
            }
            Error::Dispatch(msg) => format!("📨 Could not reach the agent: {}", msg),
            Error::Persistence(msg) => format!("💾 Storage error: {}", msg),
            Error::UnknownSession(id) => format!("❓ Unknown session '{}'.", id),
            Error::WorkerClosed(pair) => format!("🛑 Conversation engine stopped ({}).", pair),
            Error::Internal(msg) => format!("❌ Internal error: {}", msg),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Error::InvalidConfig { field, .. } => Some(format!(
                "💡 Check the '{}' setting in config/default.toml or the PARLEY_ environment.",
                field
            )),
            Error::Generation(_) => {
                Some("💡 Send your message again, or address another agent.".to_string())
            }
            Error::Dispatch(_) => {
                Some("💡 Check that the agent runtime is running and reachable.".to_string())
            }
            Error::UnknownSession(_) => {
                Some("💡 Register the session with the agent directory first.".to_string())
            }
            _ => None,
        }
    }
}

/// Format an error for display in the CLI
pub fn format_error_for_cli(error: &Error) -> String {
    let mut output = String::new();

    output.push_str(&error.user_message());
    output.push_str("\n\n");

    if let Some(suggestion) = error.suggestion() {
        output.push_str(&suggestion);
        output.push('\n');
    }

    output
}

/// Format an error for display in a chat message
pub fn format_error_for_chat(error: &Error) -> String {
    let mut output = error.user_message();

    if let Some(suggestion) = error.suggestion() {
        output.push_str("\n\n");
        output.push_str(&suggestion);
    }

    output
}
