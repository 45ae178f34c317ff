use std::time::Duration;

use tokio::time::sleep;

use minicom_app::config::{Config, StorageBackend};
use minicom_app::{execute, AppState, Command, Outcome};
use minicom_persist::StorageAdapter;
use minicom_types::{MessageStatus, SenderId};

fn memory_config() -> Config {
    let mut config = Config::default();
    config.storage.backend = StorageBackend::Memory;
    config
}

async fn run(state: &AppState, line: &str) -> Outcome {
    let command: Command = line.parse().unwrap();
    execute(state, command).await.unwrap()
}

fn lines(outcome: Outcome) -> Vec<String> {
    match outcome {
        Outcome::Lines(lines) => lines,
        _ => panic!("expected printed lines"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_visitor_message_reaches_the_agent_inbox() {
    let state = AppState::new(memory_config()).await.unwrap();

    let Outcome::Pending(pending) = run(&state, "visitor Hello").await else {
        panic!("expected a pending send");
    };
    assert_eq!(pending.message().status, MessageStatus::Sending);
    assert_eq!(pending.confirmed().await.unwrap().status, MessageStatus::Sent);
    sleep(Duration::from_millis(10)).await;

    let inbox = lines(run(&state, "/threads").await);
    assert_eq!(inbox.len(), 1);
    assert!(inbox[0].contains("[1 unread]"));
    assert!(inbox[0].ends_with("Visitor: Hello"));
}

#[tokio::test(start_paused = true)]
async fn test_opening_a_thread_marks_it_read_and_lets_the_agent_reply() {
    let state = AppState::new(memory_config()).await.unwrap();
    let thread_id = state.visitor.visitor_thread_id().await.unwrap();

    state.visitor.send_message("Hello", SenderId::Visitor).await.unwrap();
    sleep(Duration::from_millis(10)).await;

    let shown = lines(run(&state, &format!("/open {}", &thread_id[..8])).await);
    assert!(shown.iter().any(|l| l.contains("Visitor: Hello")));
    assert_eq!(state.agent.unread_total().await, 0);

    let Outcome::Pending(reply) = run(&state, "agent Hi, how can I help?").await else {
        panic!("expected a pending send");
    };
    assert_eq!(reply.message().thread_id, thread_id);
    reply.confirmed().await.unwrap();
    sleep(Duration::from_millis(10)).await;

    let visitor_view = lines(run(&state, "/show visitor").await);
    assert!(visitor_view.iter().any(|l| l.contains("Agent: Hi, how can I help?")));
    // the visitor's own message now carries the read receipt
    assert!(visitor_view.iter().any(|l| l.contains("Hello (✓✓)")));
}

#[tokio::test(start_paused = true)]
async fn test_offline_send_can_be_retried_by_prefix() {
    let state = AppState::new(memory_config()).await.unwrap();

    run(&state, "/offline").await;
    let Outcome::Pending(pending) = run(&state, "visitor Hello").await else {
        panic!("expected a pending send");
    };
    let failed = pending.confirmed().await.unwrap();
    assert_eq!(failed.status, MessageStatus::Error);

    run(&state, "/online").await;
    let Outcome::Pending(retry) = run(&state, &format!("/retry {}", &failed.id[..8])).await else {
        panic!("expected a pending retry");
    };
    let retried = retry.confirmed().await.unwrap();
    assert_ne!(retried.id, failed.id);
    assert_eq!(retried.status, MessageStatus::Sent);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_targets_are_errors() {
    let state = AppState::new(memory_config()).await.unwrap();

    assert!(execute(&state, "/open zzzz".parse().unwrap()).await.is_err());
    assert!(execute(&state, "/retry zzzz".parse().unwrap()).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_typing_shows_in_the_inbox_until_idle() {
    let state = AppState::new(memory_config()).await.unwrap();
    state.visitor.send_message("Hello", SenderId::Visitor).await.unwrap();

    run(&state, "/type visitor").await;
    sleep(Duration::from_millis(10)).await;
    let inbox = lines(run(&state, "/threads").await);
    assert!(inbox[0].ends_with("Visitor is typing…"));

    sleep(Duration::from_millis(600)).await;
    let inbox = lines(run(&state, "/threads").await);
    assert!(inbox[0].ends_with("Visitor: Hello"));
}

#[tokio::test(start_paused = true)]
async fn test_reset_clears_conversations() {
    let state = AppState::new(memory_config()).await.unwrap();
    state.visitor.send_message("Hello", SenderId::Visitor).await.unwrap();
    sleep(Duration::from_millis(10)).await;

    run(&state, "/reset").await;

    let inbox = lines(run(&state, "/threads").await);
    assert_eq!(inbox, vec!["No conversations yet.".to_string()]);
    assert!(state.visitor.visitor_thread_id().await.is_some());
}

#[tokio::test]
async fn test_file_backend_shares_threads_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.storage.directory = dir.path().to_string_lossy().into_owned();
    config.chat.send_delay_ms = 10;

    let first = AppState::new(config.clone()).await.unwrap();
    let sent = first
        .visitor
        .send_message("Persist me", SenderId::Visitor)
        .await
        .unwrap();
    sleep(Duration::from_millis(50)).await;
    first.shutdown();

    let second = AppState::new(config).await.unwrap();
    let threads = second.agent.threads().await;
    let thread = &threads[&sent.thread_id];
    assert_eq!(thread.messages[0].text, "Persist me");
    assert_eq!(thread.messages[0].status, MessageStatus::Sent);
}

#[tokio::test]
async fn test_reset_keeps_both_visitor_threads_in_durable_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.storage.directory = dir.path().to_string_lossy().into_owned();
    config.chat.send_delay_ms = 10;

    let state = AppState::new(config).await.unwrap();
    state
        .visitor
        .send_message("Hello", SenderId::Visitor)
        .await
        .unwrap();
    sleep(Duration::from_millis(50)).await;

    let outcome = lines(run(&state, "/reset").await);
    assert_eq!(outcome, vec!["Chat data cleared.".to_string()]);

    let visitor_thread = state.visitor.visitor_thread_id().await.unwrap();
    let agent_thread = state.agent.visitor_thread_id().await.unwrap();

    let reopened = StorageAdapter::builder()
        .directory(dir.path())
        .build()
        .await
        .unwrap();
    let durable = reopened.load_threads().await;
    assert!(durable.contains_key(&visitor_thread));
    assert!(durable.contains_key(&agent_thread));
    assert!(durable.values().all(|t| t.messages.is_empty()));

    // both instances hold the same map as the snapshot
    assert_eq!(state.visitor.threads().await, durable);
    assert_eq!(state.agent.threads().await, durable);
}
