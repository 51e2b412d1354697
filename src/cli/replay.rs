//! `parley replay`: drive the engine from a JSONL transcript
//!
//! Each line is either an inbound user message or a runtime event for a
//! (session, agent) pair:
//!
//! ```text
//! {"kind":"user","session":"team","text":"@sindri add a login endpoint"}
//! {"kind":"runtime","session":"team","agent":"backend","event":{"type":"text_chunk","text":"On it"}}
//! ```
//!
//! Dispatches are recorded instead of delivered; finalized messages,
//! suppressions and blocked hand-offs are printed as they happen.

use crate::app::AppConfig;
use anyhow::{Context, Result};
use parley_core::{
    EngineEvent, InMemoryMessageStore, Message, Orchestrator, PairKey, RecordingDispatcher,
    RuntimeEvent,
};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// One transcript line
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranscriptEntry {
    /// Inbound user message
    User {
        session: String,
        text: String,
        #[serde(default = "default_user")]
        user: String,
        #[serde(default)]
        delay_ms: u64,
    },
    /// Event from an agent runtime
    Runtime {
        session: String,
        agent: String,
        event: RuntimeEvent,
        #[serde(default)]
        delay_ms: u64,
    },
}

fn default_user() -> String {
    "user".to_string()
}

impl TranscriptEntry {
    fn delay(&self) -> Duration {
        match self {
            Self::User { delay_ms, .. } | Self::Runtime { delay_ms, .. } => {
                Duration::from_millis(*delay_ms)
            }
        }
    }
}

/// Parse a transcript, skipping blank lines and `#` comments.
pub fn parse_transcript(content: &str) -> Result<Vec<TranscriptEntry>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("Invalid transcript line {}", i + 1))
        })
        .collect()
}

pub async fn run(app: &AppConfig, path: &Path, settle_ms: u64) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read transcript {}", path.display()))?;
    let entries = parse_transcript(&content)?;

    let store = Arc::new(InMemoryMessageStore::default());
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let engine = Orchestrator::builder(
        app.engine.clone(),
        Arc::new(app.directory()),
        store.clone(),
        store.clone(),
        dispatcher.clone(),
    )
    .build()
    .context("Failed to start engine")?;

    let printer = tokio::spawn(print_events(engine.subscribe()));

    info!(entries = entries.len(), transcript = %path.display(), "Replaying transcript");
    for entry in entries {
        tokio::time::sleep(entry.delay()).await;
        match entry {
            TranscriptEntry::User {
                session,
                text,
                user,
                ..
            } => {
                println!("[{}] {}: {}", session, user, text);
                let message = Message::user(session, user, text);
                if let Err(e) = engine.handle_inbound(&message).await {
                    warn!(error = %e, "Inbound message rejected");
                }
            }
            TranscriptEntry::Runtime {
                session,
                agent,
                event,
                ..
            } => {
                debug!(session = %session, agent = %agent, event = event.name(), "Runtime event");
                engine.handle_runtime_event(&PairKey::new(session, agent), event)?;
            }
        }
    }

    // Deferred collaboration fires after the configured delay.
    tokio::time::sleep(engine.config().collaboration_delay() + Duration::from_millis(settle_ms))
        .await;
    engine.shutdown();
    drop(engine);
    if tokio::time::timeout(Duration::from_secs(1), printer)
        .await
        .is_err()
    {
        debug!("Event printer still subscribed after shutdown");
    }

    let records = dispatcher.records().await;
    println!("\n{} dispatch(es):", records.len());
    for record in &records {
        println!("  {} -> {}", record.session_id, record.agent_id);
    }
    for session in &app.sessions {
        let stored = store.len(&session.id).await;
        if stored > 0 {
            println!("{}: {} message(s) stored", session.id, stored);
        }
    }
    Ok(())
}

async fn print_events(mut rx: broadcast::Receiver<EngineEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => print_event(&event),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(skipped = n, "Event printer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn print_event(event: &EngineEvent) {
    match event {
        EngineEvent::Typing(_) => {}
        EngineEvent::MessageFinalized { message } => {
            let reasoning = message
                .reasoning
                .as_ref()
                .map(|r| format!(" (reasoning: {} chars)", r.chars().count()))
                .unwrap_or_default();
            println!(
                "[{}] {}: {}{}",
                message.session_id, message.sender_name, message.content, reasoning
            );
        }
        EngineEvent::MessageSuppressed {
            session_id,
            agent_id,
            reason,
            ..
        } => println!("[{}] {} stayed silent ({})", session_id, agent_id, reason),
        EngineEvent::Dispatched {
            session_id,
            agent_id,
            loop_guidance,
            ..
        } => {
            let guided = if *loop_guidance { " with loop guidance" } else { "" };
            println!("[{}] -> prompt sent to {}{}", session_id, agent_id, guided);
        }
        EngineEvent::CollaborationBlocked {
            session_id,
            from_agent,
            to_agent,
            chain_length,
        } => println!(
            "[{}] hand-off {} -> {} blocked after {} exchanges",
            session_id, from_agent, to_agent, chain_length
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transcript() {
        let content = r#"
# kickoff
{"kind":"user","session":"team","text":"@sindri hi"}

{"kind":"runtime","session":"team","agent":"backend","event":{"type":"text_chunk","text":"Hey"},"delay_ms":5}
"#;
        let entries = parse_transcript(content).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(matches!(&entries[0], TranscriptEntry::User { user, .. } if user == "user"));
        assert_eq!(entries[1].delay(), Duration::from_millis(5));
        assert!(matches!(
            &entries[1],
            TranscriptEntry::Runtime { event: RuntimeEvent::TextChunk { .. }, .. }
        ));
    }

    #[test]
    fn test_parse_error_names_line() {
        let err = parse_transcript("{\"kind\":\"user\"}\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }
}
