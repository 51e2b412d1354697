//! Responder selection and collaboration loop governance.

pub mod governor;
pub mod resolver;

pub use governor::{
    BlockedTarget, GuidanceLevel, LoopDecision, LoopGovernor, LoopPolicyConfig, RoutedTarget,
    RoutingDecision,
};
pub use resolver::{Resolution, ResolutionRule, ResponderResolver};
