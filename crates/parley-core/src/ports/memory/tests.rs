use super::*;
use crate::model::{MessageKind, Session};

fn directory() -> StaticDirectory {
    StaticDirectory::new()
        .with_agent(AgentIdentity::new("conductor", "Conductor"))
        .with_agent(AgentIdentity::new("backend", "Sindri"))
        .with_session(
            Session::group("s1", ["backend", "conductor", "ghost"]).with_orchestrator("conductor"),
        )
}

#[test]
fn test_directory_resolves_name_and_id() {
    let dir = directory();
    assert_eq!(dir.resolve_by_name_or_id("sindri").unwrap().id, "backend");
    assert_eq!(dir.resolve_by_name_or_id("BACKEND").unwrap().id, "backend");
    assert!(dir.resolve_by_name_or_id("sin").is_none());
}

#[test]
fn test_directory_members_keep_order() {
    let dir = directory();
    let members = dir.list_session_members("s1");
    let ids: Vec<_> = members.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["backend", "conductor", "ghost"]);
    // Unregistered member falls back to its ID as display name
    assert_eq!(members[2].display_name, "ghost");
    assert!(dir.list_session_members("missing").is_empty());
}

#[test]
fn test_directory_orchestrator() {
    let dir = directory();
    assert_eq!(dir.get_orchestrator("s1").unwrap().display_name, "Conductor");
    assert!(dir.get_orchestrator("missing").is_none());
}

#[tokio::test]
async fn test_store_recent_and_limit() {
    let store = InMemoryMessageStore::new(3);
    for i in 0..5 {
        store
            .persist(&Message::user("s1", "alice", format!("msg {}", i)))
            .await
            .unwrap();
    }

    assert_eq!(store.len("s1").await, 3);
    let recent = store.recent("s1", 2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].content, "msg 3");
    assert_eq!(recent[1].content, "msg 4");
    assert!(store.recent("other", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_store_updates_in_place() {
    let store = InMemoryMessageStore::default();
    let agent = AgentIdentity::new("backend", "Sindri");
    let mut msg = Message::agent("m1", "s1", &agent, MessageKind::Assistant, "draft");
    store.persist(&msg).await.unwrap();

    msg.content = "final".to_string();
    store.persist(&msg).await.unwrap();

    let all = store.session_messages("s1").await;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].content, "final");
}

#[tokio::test]
async fn test_recording_dispatcher() {
    let dispatcher = RecordingDispatcher::new();
    dispatcher.send_to_agent("s1", "backend", "hi").await.unwrap();
    dispatcher.send_to_agent("s1", "qa", "hello").await.unwrap();

    assert_eq!(dispatcher.records().await.len(), 2);
    let backend = dispatcher.records_for("backend").await;
    assert_eq!(backend.len(), 1);
    assert_eq!(backend[0].prompt, "hi");
}

#[test]
fn test_store_clear_session() {
    let store = InMemoryMessageStore::default();
    tokio_test::block_on(async {
        store.persist(&Message::user("s1", "alice", "one")).await.unwrap();
        store.persist(&Message::user("s2", "alice", "two")).await.unwrap();

        store.clear_session("s1").await;
        assert!(store.is_empty("s1").await);
        assert_eq!(store.len("s2").await, 1);
    });
}
