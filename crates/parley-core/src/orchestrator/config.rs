//! Engine configuration
//!
//! `EngineConfig` bundles every tunable of the engine: stream assembly
//! timing, history sizes, the loop policy and the silence protocol. It
//! deserializes from the `[engine]` section of the application config.

use crate::error::{Error, Result};
use crate::routing::LoopPolicyConfig;
use crate::silence::SilenceConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Identical chunks closer than this are dropped (milliseconds)
    pub dedup_window_ms: u64,
    /// Delay before an agent-to-agent re-dispatch (milliseconds)
    pub collaboration_delay_ms: u64,
    /// Messages of history handed to the prompt builder
    pub history_window: usize,
    /// Event bus channel capacity
    pub event_bus_capacity: usize,
    /// Loop governor policy
    pub loop_policy: LoopPolicyConfig,
    /// Silence protocol
    pub silence: SilenceConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dedup_window_ms: 50,
            collaboration_delay_ms: 800,
            history_window: 20,
            event_bus_capacity: 256,
            loop_policy: LoopPolicyConfig::default(),
            silence: SilenceConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Create a new configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duplicate-chunk window
    #[must_use]
    pub fn with_dedup_window(mut self, window: Duration) -> Self {
        self.dedup_window_ms = duration_ms(window);
        self
    }

    /// Set the collaboration re-dispatch delay
    #[must_use]
    pub fn with_collaboration_delay(mut self, delay: Duration) -> Self {
        self.collaboration_delay_ms = duration_ms(delay);
        self
    }

    /// Set the prompt history window
    #[must_use]
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    /// Set the event bus capacity
    #[must_use]
    pub fn with_event_bus_capacity(mut self, capacity: usize) -> Self {
        self.event_bus_capacity = capacity;
        self
    }

    /// Set the loop policy
    #[must_use]
    pub fn with_loop_policy(mut self, policy: LoopPolicyConfig) -> Self {
        self.loop_policy = policy;
        self
    }

    /// Set the silence protocol
    #[must_use]
    pub fn with_silence(mut self, silence: SilenceConfig) -> Self {
        self.silence = silence;
        self
    }

    /// Duplicate-chunk window
    #[must_use]
    pub fn dedup_window(&self) -> Duration {
        Duration::from_millis(self.dedup_window_ms)
    }

    /// Collaboration re-dispatch delay
    #[must_use]
    pub fn collaboration_delay(&self) -> Duration {
        Duration::from_millis(self.collaboration_delay_ms)
    }

    /// History fetched for governor checks: a full loop window on top of the trigger.
    #[must_use]
    pub(crate) fn collaboration_history(&self) -> usize {
        self.history_window.max(self.loop_policy.window + 1)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.history_window == 0 {
            return Err(Error::invalid_config(
                "engine.history_window",
                "history window must be greater than zero",
            ));
        }
        if self.event_bus_capacity == 0 {
            return Err(Error::invalid_config(
                "engine.event_bus_capacity",
                "event bus capacity must be greater than zero",
            ));
        }
        self.loop_policy.validate()
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
