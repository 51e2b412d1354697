//! Agent-to-agent collaboration
//!
//! After an agent's reply is finalized, strict mentions in it are resolved
//! to session members, gated by the loop governor and re-dispatched after
//! the collaboration delay. Each deferred dispatch is a task holding a
//! per-session child token, so `cancel_pending` and `shutdown` can stop it
//! before it reaches the target's worker queue.

use super::core::Inner;
use super::worker::{DispatchRequest, PairCommand};
use crate::event_bus::EngineEvent;
use crate::mention::MentionParser;
use crate::model::{AgentIdentity, Message, PairKey};
use std::sync::Arc;
use tracing::{debug, info, warn};

impl Inner {
    pub(crate) async fn collaborate(self: Arc<Self>, message: Message) {
        let session_id = message.session_id.clone();
        let members = self.directory.list_session_members(&session_id);
        let source = members
            .iter()
            .find(|m| m.id == message.sender_id)
            .cloned()
            .unwrap_or_else(|| {
                AgentIdentity::new(message.sender_id.clone(), message.sender_name.clone())
            });

        let targets: Vec<AgentIdentity> = MentionParser::new(self.directory.as_ref())
            .resolved_agents(&message.content)
            .into_iter()
            .filter(|a| a.id != source.id && members.iter().any(|m| m.id == a.id))
            .collect();

        if targets.is_empty() {
            return;
        }

        // Chains count prior exchanges; the trigger itself is not one yet.
        let history: Vec<Message> = self
            .recent(&session_id, self.config.collaboration_history())
            .await
            .into_iter()
            .filter(|m| m.id != message.id)
            .collect();
        let decision = self.governor.route(&source, &targets, &history);

        for blocked in &decision.blocked {
            warn!(
                session_id = %session_id,
                from_agent = %source.id,
                to_agent = %blocked.agent_id,
                chain_length = blocked.chain_length,
                "Collaboration loop blocked"
            );
            self.bus.publish(EngineEvent::CollaborationBlocked {
                session_id: session_id.clone(),
                from_agent: source.id.clone(),
                to_agent: blocked.agent_id.clone(),
                chain_length: blocked.chain_length,
            });
        }

        for target in decision.targets {
            info!(
                session_id = %session_id,
                from_agent = %source.id,
                to_agent = %target.agent_id,
                guided = target.loop_guidance.is_some(),
                "Scheduling collaboration dispatch"
            );
            self.schedule_dispatch(
                PairKey::new(session_id.clone(), target.agent_id),
                DispatchRequest {
                    trigger: message.clone(),
                    loop_guidance: target.loop_guidance,
                },
            );
        }
    }

    fn schedule_dispatch(self: &Arc<Self>, pair: PairKey, request: DispatchRequest) {
        let token = self.session_token(&pair.session_id);
        let delay = self.config.collaboration_delay();
        let inner = Arc::downgrade(self);

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(pair = %pair, "Collaboration dispatch cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    let Some(inner) = inner.upgrade() else {
                        return;
                    };
                    if let Err(e) = inner.enqueue(&pair, PairCommand::Dispatch(request)) {
                        warn!(pair = %pair, error = %e, "Failed to enqueue collaboration dispatch");
                    }
                }
            }
        });
    }
}
