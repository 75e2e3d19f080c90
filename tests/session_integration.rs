//! End-to-end chat session scenarios against a mock answering service

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lexi::config::{ConcurrencyPolicy, ServiceConfig};
use lexi::conversation::{Conversation, Role};
use lexi::dispatch::{NoDelay, QueryDispatcher, REFERENCE_CITATION_SOURCE, REFERENCE_QUESTION};
use lexi::service::HttpAnsweringService;
use lexi::session::{ChatSession, SessionEvent};

fn session_for(endpoint: &str) -> ChatSession {
    session_with_policy(endpoint, ConcurrencyPolicy::Allow)
}

fn session_with_policy(endpoint: &str, policy: ConcurrencyPolicy) -> ChatSession {
    let service = HttpAnsweringService::new(&ServiceConfig {
        endpoint: endpoint.to_string(),
        request_timeout_seconds: 5,
    })
    .unwrap();
    let dispatcher = QueryDispatcher::new(Arc::new(service), Arc::new(NoDelay), Duration::ZERO);
    ChatSession::new(dispatcher, Conversation::new(policy))
}

#[tokio::test]
async fn test_simple_question_appends_two_turns() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_json(json!({ "query": "Hello" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "Hi there",
            "citations": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&server.uri());
    session.ask("Hello").await.unwrap();

    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].text, "Hello");
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].text, "Hi there");
    assert!(messages[1].citations.is_empty());
    assert!(messages[0].id < messages[1].id);
    assert!(!session.is_composing());
}

#[tokio::test]
async fn test_reference_question_is_answered_locally() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let session = session_for(&server.uri());
    let reply = session.ask(REFERENCE_QUESTION).await.unwrap();

    assert!(reply.text.starts_with("Yes, under Section 166"));
    assert_eq!(reply.citations.len(), 1);
    assert_eq!(
        reply.citations.by_marker(1).unwrap().source.as_deref(),
        Some(REFERENCE_CITATION_SOURCE)
    );
}

#[tokio::test]
async fn test_reference_question_with_crlf_line_breaks() {
    let session = session_for("http://127.0.0.1:9");
    let reply = session
        .ask(&REFERENCE_QUESTION.replace('\n', "\r\n"))
        .await
        .unwrap();
    assert_eq!(reply.citations.len(), 1);
    assert!(reply.text.starts_with("Yes, under Section 166"));
}

#[tokio::test]
async fn test_unreachable_service_gives_connectivity_guidance() {
    let session = session_for("http://127.0.0.1:9");
    let reply = session.ask("Is a verbal lease binding?").await.unwrap();

    assert_eq!(reply.role, Role::Assistant);
    assert!(reply.citations.is_empty());
    assert!(reply.text.contains("backend"));
    assert_eq!(session.len(), 2);
}

#[tokio::test]
async fn test_blank_questions_leave_log_unchanged() {
    let session = session_for("http://127.0.0.1:9");
    assert!(session.ask("").await.is_none());
    assert!(session.ask("   \r\n\t").await.is_none());
    assert!(session.is_empty());
}

#[tokio::test]
async fn test_open_citation_from_reference_answer() {
    let session = session_for("http://127.0.0.1:9");
    let reply = session.ask(REFERENCE_QUESTION).await.unwrap();

    let citation = session.open_latest_citation(1).unwrap();
    assert_eq!(citation.source.as_deref(), Some(REFERENCE_CITATION_SOURCE));
    assert_eq!(session.selected_citation(), Some(citation.clone()));
    assert_eq!(session.open_citation(reply.id, 1).unwrap(), citation);

    assert!(session.open_latest_citation(2).is_err());
    session.close_citation();
    assert!(session.selected_citation().is_none());
}

#[tokio::test]
async fn test_concurrent_replies_append_in_resolution_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_json(json!({ "query": "slow" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "answer": "slow answer" }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_json(json!({ "query": "fast" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": "fast answer" })))
        .mount(&server)
        .await;

    let session = session_for(&server.uri());
    let (slow, fast) = tokio::join!(session.ask("slow"), session.ask("fast"));
    let (slow, fast) = (slow.unwrap(), fast.unwrap());

    let texts: Vec<String> = session.messages().into_iter().map(|m| m.text).collect();
    assert_eq!(texts, vec!["slow", "fast", "fast answer", "slow answer"]);
    assert!(fast.id < slow.id);

    let ids: Vec<u64> = session.messages().iter().map(|m| m.id).collect();
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(!session.is_composing());
}

#[tokio::test]
async fn test_events_describe_the_exchange() {
    let session = session_for("http://127.0.0.1:9");
    let mut events = session.subscribe();

    session.ask("Hello").await.unwrap();

    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }
    assert_eq!(received.len(), 4);
    assert!(matches!(&received[0], SessionEvent::MessageAppended(m) if m.text == "Hello"));
    assert_eq!(received[1], SessionEvent::ComposingChanged(true));
    assert!(matches!(&received[2], SessionEvent::MessageAppended(m) if m.is_assistant()));
    assert_eq!(received[3], SessionEvent::ComposingChanged(false));
}

#[tokio::test]
async fn test_timed_out_ask_does_not_block_later_questions() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_json(json!({ "query": "Hello" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "answer": "late answer" }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_json(json!({ "query": "second" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "answer": "second answer" })),
        )
        .mount(&server)
        .await;

    let session = session_with_policy(&server.uri(), ConcurrencyPolicy::Reject);
    let timed_out = tokio::time::timeout(Duration::from_millis(50), session.ask("Hello")).await;
    assert!(timed_out.is_err());

    assert!(!session.is_composing());
    assert_eq!(session.len(), 2);
    assert!(session.messages()[1].text.contains("backend"));

    let reply = session.ask("second").await.unwrap();
    assert_eq!(reply.text, "second answer");
    assert_eq!(session.len(), 4);
    assert!(!session.is_composing());
}
