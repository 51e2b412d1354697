//! Loop Governor
//!
//! Scores mutual-mention chains between two agents over a bounded history
//! window and gates agent-to-agent routing:
//!
//! | chain length   | decision                     |
//! |----------------|------------------------------|
//! | `0`            | allow                        |
//! | `>= soft`      | allow with soft guidance     |
//! | `>= critical`  | allow with critical guidance |
//! | `>= block`     | block                        |
//!
//! Pure: no I/O, no clock.

use crate::error::{Error, Result};
use crate::mention::is_mentioned;
use crate::model::{AgentIdentity, Message};
use serde::{Deserialize, Serialize};

/// Loop policy thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopPolicyConfig {
    /// Number of most recent messages inspected
    pub window: usize,
    /// Chain length that triggers soft guidance
    pub soft: usize,
    /// Chain length that triggers critical guidance
    pub critical: usize,
    /// Chain length at which routing is blocked
    pub block: usize,
    /// Token an agent replies with to stay silent
    pub silence_token: String,
}

impl Default for LoopPolicyConfig {
    fn default() -> Self {
        Self {
            window: 10,
            soft: 1,
            critical: 3,
            block: 10,
            silence_token: "[SILENT]".to_string(),
        }
    }
}

impl LoopPolicyConfig {
    /// Set the history window size
    #[must_use]
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Set the soft, critical and block thresholds
    #[must_use]
    pub fn with_thresholds(mut self, soft: usize, critical: usize, block: usize) -> Self {
        self.soft = soft;
        self.critical = critical;
        self.block = block;
        self
    }

    /// Set the silence token mentioned in guidance
    #[must_use]
    pub fn with_silence_token(mut self, token: impl Into<String>) -> Self {
        self.silence_token = token.into();
        self
    }

    /// Check that the window is non-zero and `0 < soft <= critical <= block`.
    pub fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(Error::invalid_config(
                "engine.loop_policy.window",
                "window must be greater than zero",
            ));
        }
        let field = if self.soft == 0 || self.soft > self.critical {
            Some("engine.loop_policy.soft")
        } else if self.critical > self.block {
            Some("engine.loop_policy.critical")
        } else {
            None
        };
        if let Some(field) = field {
            return Err(Error::invalid_config(
                field,
                format!(
                    "expected 0 < soft <= critical <= block, got {} / {} / {}",
                    self.soft, self.critical, self.block
                ),
            ));
        }
        if self.silence_token.trim().is_empty() {
            return Err(Error::invalid_config(
                "engine.loop_policy.silence_token",
                "silence token must not be empty",
            ));
        }
        Ok(())
    }
}

/// Strength of injected loop guidance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceLevel {
    /// Stay silent if the exchange feels complete
    Soft,
    /// Stay silent unless there is materially new information
    Critical,
}

/// Per-target governor decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopDecision {
    /// Route normally
    Allow,
    /// Route with guidance appended to the target's prompt
    Guide {
        /// Chain length observed
        chain_length: usize,
        /// Guidance strength
        level: GuidanceLevel,
        /// Guidance text
        text: String,
    },
    /// Do not route
    Block {
        /// Chain length observed
        chain_length: usize,
    },
}

impl LoopDecision {
    /// Guidance text, if any
    #[must_use]
    pub fn guidance(&self) -> Option<&str> {
        match self {
            Self::Guide { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Whether the target is blocked
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Block { .. })
    }
}

/// A target that will be routed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutedTarget {
    /// Agent ID
    pub agent_id: String,
    /// Guidance to inject into this target's prompt
    pub loop_guidance: Option<String>,
}

/// A target that was blocked
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockedTarget {
    /// Agent ID
    pub agent_id: String,
    /// Chain length that caused the block
    pub chain_length: usize,
}

/// Outcome of gating every target of one message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoutingDecision {
    /// Targets to dispatch, in input order
    pub targets: Vec<RoutedTarget>,
    /// Targets suppressed by the block threshold
    pub blocked: Vec<BlockedTarget>,
}

impl RoutingDecision {
    /// Whether nothing will be routed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Mutual-mention loop detector.
#[derive(Debug, Clone, Default)]
pub struct LoopGovernor {
    config: LoopPolicyConfig,
}

impl LoopGovernor {
    /// Create a governor with the given policy.
    #[must_use]
    pub fn new(config: LoopPolicyConfig) -> Self {
        Self { config }
    }

    /// Active policy
    #[must_use]
    pub fn config(&self) -> &LoopPolicyConfig {
        &self.config
    }

    /// Agent messages in the window where one of the pair mentions the other.
    #[must_use]
    pub fn chain_length(
        &self,
        source: &AgentIdentity,
        target: &AgentIdentity,
        history: &[Message],
    ) -> usize {
        let start = history.len().saturating_sub(self.config.window);
        history[start..]
            .iter()
            .filter(|m| {
                (m.is_from(source) && mentions(m, target))
                    || (m.is_from(target) && mentions(m, source))
            })
            .count()
    }

    /// Decide whether `source` may route to `target`.
    #[must_use]
    pub fn evaluate(
        &self,
        source: &AgentIdentity,
        target: &AgentIdentity,
        history: &[Message],
    ) -> LoopDecision {
        let chain_length = self.chain_length(source, target, history);
        let token = &self.config.silence_token;

        if chain_length >= self.config.block {
            LoopDecision::Block { chain_length }
        } else if chain_length >= self.config.critical {
            LoopDecision::Guide {
                chain_length,
                level: GuidanceLevel::Critical,
                text: format!(
                    "Loop warning: you and {} have addressed each other {} times \
                     in recent messages. Reply with exactly {} and nothing else \
                     unless you have materially new information to add. \
                     Do not discuss whether you should reply.",
                    source.display_name, chain_length, token
                ),
            }
        } else if chain_length >= self.config.soft {
            LoopDecision::Guide {
                chain_length,
                level: GuidanceLevel::Soft,
                text: format!(
                    "You are in an ongoing exchange with {}. \
                     If this exchange already feels complete, reply with exactly {} \
                     and nothing else. Do not discuss whether you should reply.",
                    source.display_name, token
                ),
            }
        } else {
            LoopDecision::Allow
        }
    }

    /// Gate every target; a blocked target never prevents routing the others.
    #[must_use]
    pub fn route(
        &self,
        source: &AgentIdentity,
        targets: &[AgentIdentity],
        history: &[Message],
    ) -> RoutingDecision {
        let mut decision = RoutingDecision::default();
        for target in targets {
            match self.evaluate(source, target, history) {
                LoopDecision::Block { chain_length } => decision.blocked.push(BlockedTarget {
                    agent_id: target.id.clone(),
                    chain_length,
                }),
                other => decision.targets.push(RoutedTarget {
                    agent_id: target.id.clone(),
                    loop_guidance: other.guidance().map(str::to_string),
                }),
            }
        }
        decision
    }
}

fn mentions(message: &Message, agent: &AgentIdentity) -> bool {
    is_mentioned(&message.content, &agent.display_name) || is_mentioned(&message.content, &agent.id)
}

#[cfg(test)]
mod tests;
