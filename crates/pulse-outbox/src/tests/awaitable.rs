//! Single-attempt requests and volatile emits.

use super::{emitter, emitter_with, settle};
use crate::{EmitterConfig, OutboxError};
use pulse_connection::{AckBehavior, MemoryConnection};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn awaitable_fails_fast_when_disconnected() {
    let conn = Arc::new(MemoryConnection::disconnected());
    let emitter = emitter(&conn);

    let err = emitter
        .enqueue_awaitable("client:get-contact-list", json!({}))
        .await
        .unwrap_err();

    assert!(matches!(err, OutboxError::NotConnected));
    assert!(emitter.is_empty());
    assert_eq!(conn.total_emits(), 0);
}

#[tokio::test(start_paused = true)]
async fn awaitable_resolves_with_server_data() {
    let conn = MemoryConnection::shared();
    conn.respond_with(AckBehavior::success(json!({"contacts": []})));
    let emitter = emitter(&conn);

    let response = emitter
        .enqueue_awaitable("client:get-contact-list", json!({}))
        .await
        .unwrap();

    assert_eq!(response.data, Some(json!({"contacts": []})));
    assert!(emitter.is_empty());
    assert!(conn.emitted()[0].with_ack);
}

#[tokio::test(start_paused = true)]
async fn awaitable_rejection_is_not_retried() {
    let conn = MemoryConnection::shared();
    conn.respond_with(AckBehavior::Respond(json!({
        "success": false,
        "message": "Conversation archived"
    })));
    let emitter = emitter(&conn);

    let err = emitter
        .enqueue_awaitable("client:send-message", json!({"text": "hi"}))
        .await
        .unwrap_err();

    assert_eq!(err.server_reason().as_deref(), Some("Conversation archived"));
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(conn.total_emits(), 1);
}

#[tokio::test(start_paused = true)]
async fn awaitable_times_out() {
    let conn = MemoryConnection::shared();
    conn.respond_with(AckBehavior::Silent);
    let emitter = emitter_with(
        &conn,
        EmitterConfig {
            ack_timeout_ms: 2_000,
            ..Default::default()
        },
    );

    let err = emitter
        .enqueue_awaitable("client:get-messages", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, OutboxError::AckTimeout(d) if d == Duration::from_secs(2)));
}

#[tokio::test(start_paused = true)]
async fn volatile_emit_skips_queue_and_ack() {
    let conn = MemoryConnection::shared();
    let emitter = emitter(&conn);

    emitter
        .emit_volatile("client:typing", json!({"isTyping": true}))
        .unwrap();
    settle().await;

    assert!(emitter.is_empty());
    let emitted = conn.emitted();
    assert_eq!(emitted.len(), 1);
    assert!(!emitted[0].with_ack);
}

#[tokio::test(start_paused = true)]
async fn volatile_emit_reports_disconnection() {
    let conn = Arc::new(MemoryConnection::disconnected());
    let emitter = emitter(&conn);

    let err = emitter.emit_volatile("client:typing", json!({})).unwrap_err();
    assert!(matches!(err, OutboxError::NotConnected));
    assert!(emitter.is_empty());
}
