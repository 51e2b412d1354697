//! Per-pair worker
//!
//! One task per (session, agent) pair processes that pair's commands in
//! arrival order and exclusively owns its [`StreamAssembler`]. Workers stop
//! when the engine shuts down or is dropped.

use super::core::Inner;
use crate::event_bus::EngineEvent;
use crate::model::{AgentIdentity, Message, MessageKind, PairKey};
use crate::ports::PromptRequest;
use crate::stream::{AssemblerOutput, RuntimeEvent, StreamAssembler};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A prompt to send to the pair's agent.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    /// Message the agent responds to
    pub trigger: Message,
    /// Loop guidance to inject into the prompt
    pub loop_guidance: Option<String>,
}

/// Work item for a pair worker
#[derive(Debug, Clone)]
pub enum PairCommand {
    /// Generation event from the agent runtime
    Runtime(RuntimeEvent),
    /// Send a prompt to the agent
    Dispatch(DispatchRequest),
    /// Drop the live stream without output
    Abandon,
}

pub(crate) async fn run(
    inner: Weak<Inner>,
    pair: PairKey,
    agent: AgentIdentity,
    shutdown: CancellationToken,
    mut rx: mpsc::UnboundedReceiver<PairCommand>,
) {
    let mut assembler = match inner.upgrade() {
        Some(inner) => StreamAssembler::new(
            pair.session_id.clone(),
            agent.clone(),
            Arc::clone(&inner.silence),
        )
        .with_dedup_window(inner.config.dedup_window()),
        None => return,
    };

    loop {
        let command = tokio::select! {
            _ = shutdown.cancelled() => break,
            command = rx.recv() => match command {
                Some(command) => command,
                None => break,
            },
        };

        let Some(inner) = inner.upgrade() else {
            break;
        };

        match command {
            PairCommand::Runtime(event) => inner.apply_event(&mut assembler, event).await,
            PairCommand::Dispatch(request) => inner.dispatch(&pair, &agent, request).await,
            PairCommand::Abandon => assembler.abandon(),
        }
    }

    debug!(pair = %pair, "Pair worker stopped");
}

impl Inner {
    async fn apply_event(self: &Arc<Self>, assembler: &mut StreamAssembler, event: RuntimeEvent) {
        for output in assembler.apply(event) {
            match output {
                AssemblerOutput::Typing(update) => {
                    self.bus.publish(EngineEvent::Typing(update));
                }
                AssemblerOutput::Finalized(message) => self.on_finalized(message).await,
                AssemblerOutput::Suppressed { message_id, reason } => {
                    self.bus.publish(EngineEvent::MessageSuppressed {
                        session_id: assembler.session_id().to_string(),
                        agent_id: assembler.agent().id.clone(),
                        message_id,
                        reason,
                    });
                }
            }
        }
    }

    async fn on_finalized(self: &Arc<Self>, message: Message) {
        if let Err(e) = self.sink.persist(&message).await {
            warn!(
                session_id = %message.session_id,
                message_id = %message.id,
                error = %e,
                "Failed to persist finalized message"
            );
        }

        self.bus.publish(EngineEvent::MessageFinalized {
            message: message.clone(),
        });

        if message.kind == MessageKind::Assistant {
            let inner = Arc::clone(self);
            tokio::spawn(async move { inner.collaborate(message).await });
        }
    }

    async fn dispatch(&self, pair: &PairKey, agent: &AgentIdentity, request: DispatchRequest) {
        let session_id = pair.session_id.as_str();
        let members = self.directory.list_session_members(session_id);
        let history = self.recent(session_id, self.config.history_window).await;

        let prompt = self.prompts.build(&PromptRequest {
            session_id,
            target: agent,
            members: &members,
            trigger: &request.trigger,
            history: &history,
            loop_guidance: request.loop_guidance.as_deref(),
        });

        match self
            .dispatcher
            .send_to_agent(session_id, &agent.id, &prompt)
            .await
        {
            Ok(()) => {
                info!(
                    session_id,
                    agent_id = %agent.id,
                    trigger_id = %request.trigger.id,
                    guided = request.loop_guidance.is_some(),
                    "Dispatched prompt"
                );
                self.bus.publish(EngineEvent::Dispatched {
                    session_id: session_id.to_string(),
                    agent_id: agent.id.clone(),
                    trigger_id: request.trigger.id.clone(),
                    loop_guidance: request.loop_guidance.is_some(),
                });
            }
            Err(e) => {
                warn!(session_id, agent_id = %agent.id, error = %e, "Failed to dispatch prompt");
            }
        }
    }
}
