//! Engine integration tests
//!
//! Drive the orchestrator end to end through its public API with the
//! in-memory ports: inbound routing, streamed replies, agent-to-agent
//! collaboration and loop blocking.

use parley_core::ports::MessageSink;
use parley_core::{
    AgentIdentity, CompletionPayload, EngineConfig, EngineEvent, InMemoryMessageStore, Message,
    MessageKind, Orchestrator, PairKey, RecordingDispatcher, RuntimeEvent, Session,
    StaticDirectory,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

fn sindri() -> AgentIdentity {
    AgentIdentity::new("backend", "Sindri")
}

fn athena() -> AgentIdentity {
    AgentIdentity::new("pm", "Athena")
}

fn heimdall() -> AgentIdentity {
    AgentIdentity::new("qa", "Heimdall")
}

fn directory() -> StaticDirectory {
    StaticDirectory::new()
        .with_agent(AgentIdentity::new("orchestrator", "Cratos"))
        .with_agent(sindri())
        .with_agent(athena())
        .with_agent(heimdall())
        .with_session(
            Session::group("team", ["orchestrator", "backend", "pm", "qa"])
                .with_orchestrator("orchestrator"),
        )
        .with_session(Session::group("pair", ["backend", "pm"]))
        .with_session(Session::group("empty", Vec::<String>::new()))
}

fn engine(
    store: &Arc<InMemoryMessageStore>,
    dispatcher: &Arc<RecordingDispatcher>,
) -> Orchestrator {
    Orchestrator::builder(
        EngineConfig::new().with_collaboration_delay(Duration::from_millis(20)),
        Arc::new(directory()),
        store.clone(),
        store.clone(),
        dispatcher.clone(),
    )
    .build()
    .unwrap()
}

async fn wait_for<F>(rx: &mut broadcast::Receiver<EngineEvent>, pred: F) -> EngineEvent
where
    F: Fn(&EngineEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = rx.recv().await.unwrap();
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

fn stream_reply(engine: &Orchestrator, session: &str, agent: &str, text: &str) {
    let pair = PairKey::new(session, agent);
    let (head, tail) = text.split_at(text.len() / 2);
    for event in [
        RuntimeEvent::GenerationStarted { message_id: None },
        RuntimeEvent::chunk(head),
        RuntimeEvent::chunk(tail),
        RuntimeEvent::AssistantMessage(CompletionPayload::text(text)),
    ] {
        engine.handle_runtime_event(&pair, event).unwrap();
    }
}

// ============================================================================
// Inbound routing
// ============================================================================

#[tokio::test]
async fn test_resolution_precedence_through_engine() {
    let store = Arc::new(InMemoryMessageStore::default());
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let engine = engine(&store, &dispatcher);

    // Nothing addressed and no agent has spoken: the orchestrator answers.
    let first = Message::user("team", "alice", "kick off the sprint");
    assert_eq!(engine.handle_inbound(&first).await.unwrap(), vec!["orchestrator"]);

    // Direct address beats everything else, in member order.
    let direct = Message::user("team", "alice", "@qa and @sindri, status?");
    assert_eq!(
        engine.handle_inbound(&direct).await.unwrap(),
        vec!["backend", "qa"]
    );

    // Once an agent has spoken, a bare follow-up sticks to it.
    store
        .persist(&Message::agent(
            "m-athena",
            "team",
            &athena(),
            MessageKind::Assistant,
            "Backlog is groomed.",
        ))
        .await
        .unwrap();
    let follow_up = Message::user("team", "alice", "what is left?");
    assert_eq!(engine.handle_inbound(&follow_up).await.unwrap(), vec!["pm"]);

    // A session without members resolves to nobody.
    let lonely = Message::user("empty", "alice", "hello?");
    assert!(engine.handle_inbound(&lonely).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_group_message_always_gets_a_responder() {
    let store = Arc::new(InMemoryMessageStore::default());
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let engine = engine(&store, &dispatcher);

    for text in ["hi", "**@Nobody** there?", "@", "   "] {
        let msg = Message::user("pair", "alice", text);
        let responders = engine.handle_inbound(&msg).await.unwrap();
        assert!(!responders.is_empty(), "no responder for {text:?}");
    }
}

// ============================================================================
// Collaboration
// ============================================================================

#[tokio::test]
async fn test_user_request_flows_into_agent_handoff() {
    let store = Arc::new(InMemoryMessageStore::default());
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let engine = engine(&store, &dispatcher);
    let mut rx = engine.subscribe();

    let request = Message::user("pair", "alice", "@sindri build the login endpoint");
    assert_eq!(engine.handle_inbound(&request).await.unwrap(), vec!["backend"]);
    wait_for(&mut rx, |e| {
        matches!(e, EngineEvent::Dispatched { agent_id, .. } if agent_id == "backend")
    })
    .await;

    stream_reply(
        &engine,
        "pair",
        "backend",
        "Endpoint is live. **@Athena** can you update the roadmap?",
    );

    let event = wait_for(&mut rx, |e| {
        matches!(e, EngineEvent::Dispatched { agent_id, .. } if agent_id == "pm")
    })
    .await;
    let EngineEvent::Dispatched {
        trigger_id,
        loop_guidance,
        ..
    } = event
    else {
        unreachable!()
    };
    // First hand-off between the two agents carries no loop guidance.
    assert!(!loop_guidance);

    let history = store.session_messages("pair").await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].id, trigger_id);
    assert_eq!(history[1].sender_name, "Sindri");

    let records = dispatcher.records_for("pm").await;
    assert_eq!(records.len(), 1);
    assert!(records[0].prompt.contains("Sindri says:"));
    assert!(!records[0].prompt.contains("ongoing exchange"));
    assert!(records[0].prompt.contains("[alice]: @sindri build the login endpoint"));
}

#[tokio::test]
async fn test_loop_block_spares_unrelated_targets() {
    let store = Arc::new(InMemoryMessageStore::default());
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let engine = engine(&store, &dispatcher);
    let mut rx = engine.subscribe();

    // Ten alternating hand-offs between Sindri and Athena.
    for i in 0..10 {
        let (author, other) = if i % 2 == 0 {
            (sindri(), athena())
        } else {
            (athena(), sindri())
        };
        let content = format!("**@{}** round {}", other.display_name, i);
        store
            .persist(&Message::agent(
                format!("m{i}"),
                "team",
                &author,
                MessageKind::Assistant,
                content,
            ))
            .await
            .unwrap();
    }

    // A further mention of Athena is blocked; Heimdall is a first contact.
    stream_reply(
        &engine,
        "team",
        "backend",
        "**@Athena** one more thing. **@Heimdall** please run the suite.",
    );

    let blocked = wait_for(&mut rx, |e| {
        matches!(e, EngineEvent::CollaborationBlocked { .. })
    })
    .await;
    let EngineEvent::CollaborationBlocked {
        from_agent,
        to_agent,
        chain_length,
        ..
    } = blocked
    else {
        unreachable!()
    };
    assert_eq!(from_agent, "backend");
    assert_eq!(to_agent, "pm");
    assert_eq!(chain_length, 10);

    let dispatched = wait_for(&mut rx, |e| matches!(e, EngineEvent::Dispatched { .. })).await;
    let EngineEvent::Dispatched {
        agent_id,
        loop_guidance,
        ..
    } = dispatched
    else {
        unreachable!()
    };
    assert_eq!(agent_id, "qa");
    assert!(!loop_guidance);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(dispatcher.records_for("pm").await.is_empty());
}

#[tokio::test]
async fn test_silent_reply_ends_the_exchange() {
    let store = Arc::new(InMemoryMessageStore::default());
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let engine = engine(&store, &dispatcher);
    let mut rx = engine.subscribe();

    stream_reply(&engine, "pair", "pm", "[SILENT]");

    let event = wait_for(&mut rx, |e| {
        matches!(
            e,
            EngineEvent::MessageFinalized { .. } | EngineEvent::MessageSuppressed { .. }
        )
    })
    .await;
    assert!(matches!(event, EngineEvent::MessageSuppressed { .. }));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(store.is_empty("pair").await);
    assert!(dispatcher.records().await.is_empty());
}
