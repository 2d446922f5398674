//! Outbound delivery of [`AnalyticsEvent`]s.
//!
//! [`AnalyticsDispatcher`] queues events on a bounded channel and a single
//! background task POSTs them to `<analytics_url>/events`. The engine only
//! ever sees [`EventSink::emit`], which never blocks: a full queue drops the
//! event with a warning, and delivery failures are logged and forgotten.

use std::time::Duration;

use mentor_core::events::{AnalyticsEvent, EventSink};
use tokio::{
  sync::mpsc::{self, error::TrySendError},
  task::JoinHandle,
};
use tracing::{debug, info, warn};

// ─── Dispatcher ───────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AnalyticsDispatcher {
  tx: mpsc::Sender<AnalyticsEvent>,
}

impl AnalyticsDispatcher {
  /// Start the delivery task. It runs until every clone of the returned
  /// dispatcher has been dropped and the queue is drained.
  pub fn spawn(
    analytics_url: &str,
    timeout: Duration,
    capacity: usize,
  ) -> reqwest::Result<(Self, JoinHandle<()>)> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let endpoint = format!("{}/events", analytics_url.trim_end_matches('/'));
    let (tx, rx) = mpsc::channel(capacity.max(1));

    info!(%endpoint, capacity, "analytics dispatcher started");
    let handle = tokio::spawn(deliver(client, endpoint, rx));
    Ok((Self { tx }, handle))
  }
}

impl EventSink for AnalyticsDispatcher {
  fn emit(&self, event: AnalyticsEvent) {
    match self.tx.try_send(event) {
      Ok(()) => {}
      Err(TrySendError::Full(event)) => {
        warn!(user_id = %event.user_id, event_type = %event.event_type, "analytics queue full, dropping event");
      }
      Err(TrySendError::Closed(event)) => {
        debug!(user_id = %event.user_id, "analytics dispatcher stopped, dropping event");
      }
    }
  }
}

async fn deliver(
  client: reqwest::Client,
  endpoint: String,
  mut rx: mpsc::Receiver<AnalyticsEvent>,
) {
  while let Some(event) = rx.recv().await {
    let result = client
      .post(&endpoint)
      .json(&event)
      .send()
      .await
      .and_then(reqwest::Response::error_for_status);

    match result {
      Ok(_) => debug!(user_id = %event.user_id, event_type = %event.event_type, "analytics event delivered"),
      Err(e) => warn!(user_id = %event.user_id, error = %e, "analytics delivery failed"),
    }
  }
  debug!("analytics dispatcher drained");
}

/// Wait up to `grace` for the delivery task to flush what is still queued.
/// Every dispatcher clone must already be dropped or this only times out.
pub async fn drain(handle: JoinHandle<()>, grace: Duration) {
  match tokio::time::timeout(grace, handle).await {
    Ok(Ok(())) => info!("analytics queue flushed"),
    Ok(Err(e)) => warn!(error = %e, "analytics delivery task failed"),
    Err(_) => warn!(?grace, "analytics queue not flushed before shutdown, dropping remaining events"),
  }
}

// ─── Log-only sink ────────────────────────────────────────────────────────────

/// Used when no analytics endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
  fn emit(&self, event: AnalyticsEvent) {
    debug!(
      user_id = %event.user_id,
      event_type = %event.event_type,
      data = %event.event_data,
      "analytics event (no endpoint configured)"
    );
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{Json, Router, extract::State, routing::post};
  use chrono::Utc;
  use mentor_core::{
    MasteryEngine,
    memory::MemoryStore,
    review::{Performance, ReviewItem},
  };
  use tokio::net::TcpListener;

  use super::*;

  /// A stand-in collector that forwards every received event to a channel.
  async fn collector() -> (String, mpsc::Receiver<AnalyticsEvent>) {
    let (tx, rx) = mpsc::channel(16);
    let app = Router::new()
      .route(
        "/events",
        post(|State(tx): State<mpsc::Sender<AnalyticsEvent>>, Json(event): Json<AnalyticsEvent>| async move {
          tx.send(event).await.unwrap();
          Json(serde_json::json!({ "status": "ok" }))
        }),
      )
      .with_state(tx);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    (format!("http://{addr}/"), rx)
  }

  #[tokio::test]
  async fn delivers_events_to_collector() {
    let (url, mut received) = collector().await;
    let (dispatcher, _handle) = AnalyticsDispatcher::spawn(&url, Duration::from_secs(5), 8).unwrap();

    let now = Utc::now();
    let mut item = ReviewItem::new("loops", now);
    item.apply_review(Performance::Easy, now);
    dispatcher.emit(AnalyticsEvent::review("alice", &item, Performance::Easy, now));

    let event = tokio::time::timeout(Duration::from_secs(5), received.recv())
      .await
      .unwrap()
      .unwrap();
    assert_eq!(event.user_id, "alice");
    assert_eq!(event.event_type, "spaced_repetition_review");
    assert_eq!(event.event_data["performance"], "easy");
  }

  #[tokio::test]
  async fn unreachable_collector_does_not_affect_reviews() {
    // Nothing listens on the discard port.
    let (dispatcher, handle) =
      AnalyticsDispatcher::spawn("http://127.0.0.1:9", Duration::from_millis(200), 4).unwrap();
    let engine = MasteryEngine::new(Arc::new(MemoryStore::new())).with_sink(Arc::new(dispatcher));

    let outcome = engine.submit_review("alice", "loops", Performance::Good).await.unwrap();
    assert_eq!(outcome.points_awarded, 15);

    drop(engine);
    tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
  }

  #[tokio::test]
  async fn full_queue_drops_instead_of_blocking() {
    let (dispatcher, _handle) =
      AnalyticsDispatcher::spawn("http://127.0.0.1:9", Duration::from_millis(200), 1).unwrap();

    let now = Utc::now();
    let item = ReviewItem::new("loops", now);
    for _ in 0..100 {
      dispatcher.emit(AnalyticsEvent::review("alice", &item, Performance::Hard, now));
    }
  }

  #[tokio::test]
  async fn drain_flushes_queued_events() {
    let (url, mut received) = collector().await;
    let (dispatcher, handle) = AnalyticsDispatcher::spawn(&url, Duration::from_secs(5), 8).unwrap();

    let now = Utc::now();
    let item = ReviewItem::new("loops", now);
    for user in ["alice", "bob", "carol"] {
      dispatcher.emit(AnalyticsEvent::review(user, &item, Performance::Good, now));
    }
    drop(dispatcher);
    drain(handle, Duration::from_secs(5)).await;

    let mut users = Vec::new();
    while let Ok(event) = received.try_recv() {
      users.push(event.user_id);
    }
    assert_eq!(users, ["alice", "bob", "carol"]);
  }
}
