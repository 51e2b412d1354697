//! Orchestrator core
//!
//! Owns the ports, the per-pair worker registry and the pending
//! collaboration dispatches.

use super::config::EngineConfig;
use super::prompt::CollaborationPrompt;
use super::worker::{self, DispatchRequest, PairCommand};
use crate::error::{Error, Result};
use crate::event_bus::{EngineEvent, EventBus};
use crate::model::{AgentIdentity, Message, PairKey};
use crate::ports::{AgentDirectory, AgentDispatcher, HistoryStore, MessageSink, PromptBuilder};
use crate::routing::{LoopGovernor, ResponderResolver};
use crate::silence::SilencePolicy;
use crate::stream::RuntimeEvent;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Shared engine state.
pub(crate) struct Inner {
    pub(crate) config: EngineConfig,
    pub(crate) directory: Arc<dyn AgentDirectory>,
    pub(crate) history: Arc<dyn HistoryStore>,
    pub(crate) sink: Arc<dyn MessageSink>,
    pub(crate) dispatcher: Arc<dyn AgentDispatcher>,
    pub(crate) prompts: Arc<dyn PromptBuilder>,
    pub(crate) silence: Arc<SilencePolicy>,
    pub(crate) governor: LoopGovernor,
    pub(crate) bus: EventBus,
    workers: DashMap<PairKey, mpsc::UnboundedSender<PairCommand>>,
    pending: DashMap<String, CancellationToken>,
    shutdown: CancellationToken,
}

/// The Conversation Orchestration Engine.
///
/// Cheap to clone; all clones drive the same engine. Every method that
/// enqueues work must be called from within a Tokio runtime.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

/// Builder for [`Orchestrator`]
pub struct OrchestratorBuilder {
    config: EngineConfig,
    directory: Arc<dyn AgentDirectory>,
    history: Arc<dyn HistoryStore>,
    sink: Arc<dyn MessageSink>,
    dispatcher: Arc<dyn AgentDispatcher>,
    prompts: Option<Arc<dyn PromptBuilder>>,
    silence: Option<SilencePolicy>,
    bus: Option<EventBus>,
}

impl OrchestratorBuilder {
    /// Use a custom prompt builder
    #[must_use]
    pub fn with_prompt_builder(mut self, prompts: Arc<dyn PromptBuilder>) -> Self {
        self.prompts = Some(prompts);
        self
    }

    /// Use a custom silence policy instead of the configured one
    #[must_use]
    pub fn with_silence_policy(mut self, policy: SilencePolicy) -> Self {
        self.silence = Some(policy);
        self
    }

    /// Publish on an existing event bus
    #[must_use]
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Validate the configuration and build the engine.
    pub fn build(self) -> Result<Orchestrator> {
        self.config.validate()?;

        let silence = match self.silence {
            Some(policy) => policy,
            None => SilencePolicy::from_config(&self.config.silence)?,
        };
        let prompts = self.prompts.unwrap_or_else(|| {
            Arc::new(CollaborationPrompt::new(
                self.config.loop_policy.silence_token.clone(),
            ))
        });
        let bus = self
            .bus
            .unwrap_or_else(|| EventBus::new(self.config.event_bus_capacity));

        info!(
            collaboration_delay_ms = self.config.collaboration_delay_ms,
            loop_window = self.config.loop_policy.window,
            silence_rules = ?silence.rule_names(),
            "Orchestrator initialized"
        );

        Ok(Orchestrator {
            inner: Arc::new(Inner {
                governor: LoopGovernor::new(self.config.loop_policy.clone()),
                config: self.config,
                directory: self.directory,
                history: self.history,
                sink: self.sink,
                dispatcher: self.dispatcher,
                prompts,
                silence: Arc::new(silence),
                bus,
                workers: DashMap::new(),
                pending: DashMap::new(),
                shutdown: CancellationToken::new(),
            }),
        })
    }
}

impl Orchestrator {
    /// Start building an engine over the given ports.
    pub fn builder(
        config: EngineConfig,
        directory: Arc<dyn AgentDirectory>,
        history: Arc<dyn HistoryStore>,
        sink: Arc<dyn MessageSink>,
        dispatcher: Arc<dyn AgentDispatcher>,
    ) -> OrchestratorBuilder {
        OrchestratorBuilder {
            config,
            directory,
            history,
            sink,
            dispatcher,
            prompts: None,
            silence: None,
            bus: None,
        }
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Event bus the engine publishes on
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.inner.bus
    }

    /// Subscribe to engine events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.inner.bus.subscribe()
    }

    /// Number of live pair workers
    #[must_use]
    pub fn active_workers(&self) -> usize {
        self.inner.workers.len()
    }

    /// Route an inbound message to its responders.
    ///
    /// The message is persisted, the responders are resolved and a dispatch
    /// is queued on each responder's pair worker. Returns the responder IDs;
    /// an empty list is a valid outcome.
    pub async fn handle_inbound(&self, message: &Message) -> Result<Vec<String>> {
        let inner = &self.inner;
        let session_id = message.session_id.as_str();

        if inner.directory.session(session_id).is_none() {
            return Err(Error::UnknownSession(session_id.to_string()));
        }

        if let Err(e) = inner.sink.persist(message).await {
            warn!(
                session_id,
                message_id = %message.id,
                error = %e,
                "Failed to persist inbound message"
            );
        }

        let members = inner.directory.list_session_members(session_id);
        let orchestrator = inner.directory.get_orchestrator(session_id);
        let history = inner.recent(session_id, inner.config.history_window).await;

        let resolution = ResponderResolver::new(inner.directory.as_ref()).resolve(
            message,
            &members,
            orchestrator.as_ref(),
            &history,
        );

        let responders: Vec<String> = resolution
            .responders
            .into_iter()
            .filter(|id| !(message.is_agent() && *id == message.sender_id))
            .collect();

        if responders.is_empty() {
            debug!(session_id, "No responders for inbound message");
            return Ok(responders);
        }

        info!(
            session_id,
            message_id = %message.id,
            rule = %resolution.rule,
            responders = ?responders,
            "Routing inbound message"
        );

        for agent_id in &responders {
            let pair = PairKey::new(session_id, agent_id.clone());
            inner.enqueue(
                &pair,
                PairCommand::Dispatch(DispatchRequest {
                    trigger: message.clone(),
                    loop_guidance: None,
                }),
            )?;
        }

        Ok(responders)
    }

    /// Queue a runtime event on the pair's ordered worker.
    pub fn handle_runtime_event(&self, pair: &PairKey, event: RuntimeEvent) -> Result<()> {
        self.inner.enqueue(pair, PairCommand::Runtime(event))
    }

    /// Clear the pair's live stream without output (external timeout).
    pub fn abandon(&self, pair: &PairKey) -> Result<()> {
        if !self.inner.workers.contains_key(pair) {
            return Ok(());
        }
        self.inner.enqueue(pair, PairCommand::Abandon)
    }

    /// Cancel every not-yet-fired collaboration dispatch of a session.
    ///
    /// Returns whether anything was pending.
    pub fn cancel_pending(&self, session_id: &str) -> bool {
        match self.inner.pending.remove(session_id) {
            Some((_, token)) => {
                token.cancel();
                info!(session_id, "Cancelled pending collaboration dispatches");
                true
            }
            None => false,
        }
    }

    /// Stop all workers and cancel all pending dispatches.
    pub fn shutdown(&self) {
        info!(workers = self.inner.workers.len(), "Shutting down orchestrator");
        self.inner.shutdown.cancel();
        self.inner.workers.clear();
        self.inner.pending.clear();
    }

    /// Whether [`shutdown`](Self::shutdown) was called
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }
}

impl Inner {
    /// Recent history; a failing store degrades to no history.
    pub(crate) async fn recent(&self, session_id: &str, limit: usize) -> Vec<Message> {
        match self.history.recent(session_id, limit).await {
            Ok(history) => history,
            Err(e) => {
                warn!(session_id, error = %e, "Failed to load history");
                Vec::new()
            }
        }
    }

    /// Identity of an agent, falling back to its ID as display name.
    pub(crate) fn agent_identity(&self, pair: &PairKey) -> AgentIdentity {
        self.directory
            .list_session_members(&pair.session_id)
            .into_iter()
            .find(|a| a.id == pair.agent_id)
            .or_else(|| {
                self.directory
                    .resolve_by_name_or_id(&pair.agent_id)
                    .filter(|a| a.id == pair.agent_id)
            })
            .unwrap_or_else(|| AgentIdentity::new(pair.agent_id.clone(), pair.agent_id.clone()))
    }

    /// Send a command to the pair's worker, spawning it on first use.
    pub(crate) fn enqueue(self: &Arc<Self>, pair: &PairKey, command: PairCommand) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(Error::WorkerClosed(pair.to_string()));
        }

        let sender = self
            .workers
            .entry(pair.clone())
            .or_insert_with(|| self.spawn_worker(pair))
            .clone();

        match sender.send(command) {
            Ok(()) => Ok(()),
            Err(mpsc::error::SendError(command)) => {
                warn!(pair = %pair, "Pair worker gone, respawning");
                let sender = self.spawn_worker(pair);
                self.workers.insert(pair.clone(), sender.clone());
                sender
                    .send(command)
                    .map_err(|_| Error::WorkerClosed(pair.to_string()))
            }
        }
    }

    fn spawn_worker(self: &Arc<Self>, pair: &PairKey) -> mpsc::UnboundedSender<PairCommand> {
        let (tx, rx) = mpsc::unbounded_channel();
        let agent = self.agent_identity(pair);
        debug!(pair = %pair, "Spawning pair worker");
        tokio::spawn(worker::run(
            Arc::downgrade(self),
            pair.clone(),
            agent,
            self.shutdown.child_token(),
            rx,
        ));
        tx
    }

    /// Cancellation token shared by a session's pending dispatches.
    pub(crate) fn session_token(&self, session_id: &str) -> CancellationToken {
        self.pending
            .entry(session_id.to_string())
            .or_insert_with(|| self.shutdown.child_token())
            .clone()
    }
}
