//! JSON REST API for Mentor.
//!
//! Exposes an axum [`Router`] backed by a [`MasteryEngine`] over any
//! [`mentor_core::store::MasteryStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", mentor_api::api_router(engine.clone()))
//! ```

pub mod error;
pub mod gamification;
pub mod progress;
pub mod schedule;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use mentor_core::{MasteryEngine, store::MasteryStore};

pub use error::ApiError;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(engine: Arc<MasteryEngine<S>>) -> Router<()>
where
  S: MasteryStore + 'static,
{
  Router::new()
    // Scheduler
    .route("/spaced-repetition/update", post(schedule::submit_review::<S>))
    .route("/spaced-repetition/{user_id}", get(schedule::get_schedule::<S>))
    .route("/spaced-repetition/{user_id}/due", get(schedule::get_due::<S>))
    // Ledger and badges
    .route("/gamification/points", post(gamification::add_points::<S>))
    .route("/gamification/badges", post(gamification::award_badge::<S>))
    .route("/gamification/{user_id}", get(gamification::summary::<S>))
    .route("/gamification/{user_id}/points", get(gamification::points::<S>))
    .route("/gamification/{user_id}/badges", get(gamification::badges::<S>))
    .route("/badges", get(gamification::catalog::<S>))
    // Progress
    .route("/progress/{user_id}", put(progress::handler::<S>))
    .with_state(engine)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use chrono::{DateTime, TimeZone, Utc};
  use mentor_core::{
    clock::ManualClock,
    events::RecordingSink,
    fixtures::seed_sample_user,
    memory::MemoryStore,
  };
  use serde_json::{Value, json};
  use tower::ServiceExt;

  use super::*;

  fn t0() -> DateTime<Utc> { Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap() }

  struct Fixture {
    router: Router,
    sink:   RecordingSink,
  }

  async fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    seed_sample_user(store.as_ref(), "demo_user", t0()).await.unwrap();

    let sink = RecordingSink::new();
    let engine = MasteryEngine::new(store)
      .with_clock(Arc::new(ManualClock::new(t0())))
      .with_sink(Arc::new(sink.clone()));
    Fixture { router: api_router(Arc::new(engine)), sink }
  }

  async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };

    let resp = router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
  }

  // ─── Scheduler ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn schedule_lists_due_items_first() {
    let f = fixture().await;
    let (status, body) = send(&f.router, "GET", "/spaced-repetition/demo_user", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_items"], 3);
    assert_eq!(body["items_due"], 1);
    assert_eq!(body["schedule"][0]["item_id"], "loops");
    assert_eq!(body["schedule"][0]["due"], true);
    assert_eq!(body["schedule"][0]["overdue_hours"], 2);
    assert_eq!(body["schedule"][0]["last_reviewed"], Value::Null);
    assert_eq!(body["due_items"].as_array().unwrap().len(), 1);

    let entry = body["schedule"][1].as_object().unwrap();
    let mut keys: Vec<&str> = entry.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
      keys,
      [
        "due",
        "ease_factor",
        "interval",
        "item_id",
        "last_reviewed",
        "next_review",
        "overdue_hours",
        "repetitions",
        "topic",
      ]
    );
  }

  #[tokio::test]
  async fn due_endpoint_returns_only_due_entries() {
    let f = fixture().await;
    let (status, body) = send(&f.router, "GET", "/spaced-repetition/demo_user/due", None).await;
    assert_eq!(status, StatusCode::OK);
    let due = body.as_array().unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0]["topic"], "Loops and Iteration");
  }

  #[tokio::test]
  async fn unknown_user_gets_empty_schedule() {
    let f = fixture().await;
    let (status, body) = send(&f.router, "GET", "/spaced-repetition/nobody", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_items"], 0);
    assert_eq!(body["schedule"], json!([]));
  }

  #[tokio::test]
  async fn submit_review_updates_item_and_emits_event() {
    let f = fixture().await;
    let (status, body) = send(
      &f.router,
      "POST",
      "/spaced-repetition/update",
      Some(json!({ "user_id": "demo_user", "item_id": "loops", "performance": "good" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated_item"]["interval"], 6);
    assert_eq!(body["updated_item"]["repetitions"], 2);
    assert_eq!(body["updated_item"]["due"], false);
    assert_eq!(body["points_awarded"], 15);
    assert_eq!(body["total_points"], 65);

    let events = f.sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_data["item_id"], "loops");
  }

  #[tokio::test]
  async fn bad_performance_is_400_and_changes_nothing() {
    let f = fixture().await;
    let (status, body) = send(
      &f.router,
      "POST",
      "/spaced-repetition/update",
      Some(json!({ "user_id": "demo_user", "item_id": "loops", "performance": "great" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("easy, good, hard, forgot"));

    let (_, points) = send(&f.router, "GET", "/gamification/demo_user/points", None).await;
    assert_eq!(points["total_points"], 50);
    assert!(f.sink.events().is_empty());
  }

  // ─── Gamification ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn summary_reports_seeded_state() {
    let f = fixture().await;
    let (status, body) = send(&f.router, "GET", "/gamification/demo_user", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["total_points"], 50);
    assert_eq!(body["stats"]["total_badges"], 1);
    assert_eq!(body["stats"]["current_streak"], 3);
    assert_eq!(body["stats"]["items_due_for_review"], 1);
    assert_eq!(body["badges"][0]["id"], "first_chat");
    assert_eq!(body["badges"][0]["name"], "First Conversation");
    assert_eq!(body["next_milestone"], json!({ "points": 100, "progress": 50 }));
  }

  #[tokio::test]
  async fn points_history_respects_limit() {
    let f = fixture().await;
    let (status, body) =
      send(&f.router, "GET", "/gamification/demo_user/points?limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_points"], 50);
    let history = body["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1]["reason"], "Asked a great question");
  }

  #[tokio::test]
  async fn adding_points_can_unlock_century_club() {
    let f = fixture().await;
    let (status, body) = send(
      &f.router,
      "POST",
      "/gamification/points",
      Some(json!({ "user_id": "demo_user", "points": 60, "reason": "Finished course" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_points"], 160);
    assert_eq!(body["badges_earned"][0]["id"], "points_100");

    let (_, badges) = send(&f.router, "GET", "/gamification/demo_user/badges", None).await;
    let ids: Vec<&str> = badges
      .as_array()
      .unwrap()
      .iter()
      .map(|b| b["id"].as_str().unwrap())
      .collect();
    assert_eq!(ids, ["first_chat", "points_100"]);
  }

  #[tokio::test]
  async fn oversized_award_is_400_and_changes_nothing() {
    let f = fixture().await;
    let (status, body) = send(
      &f.router,
      "POST",
      "/gamification/points",
      Some(json!({ "user_id": "demo_user", "points": i64::MAX, "reason": "huge" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("points must be within"));

    let (_, summary) = send(&f.router, "GET", "/gamification/demo_user", None).await;
    assert_eq!(summary["stats"]["total_points"], 50);
    assert_eq!(summary["stats"]["total_badges"], 1);
  }

  #[tokio::test]
  async fn award_unknown_badge_is_400() {
    let f = fixture().await;
    let (status, _) = send(
      &f.router,
      "POST",
      "/gamification/badges",
      Some(json!({ "user_id": "demo_user", "badge_id": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn catalog_lists_every_badge() {
    let f = fixture().await;
    let (status, body) = send(&f.router, "GET", "/badges", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), mentor_core::badge::catalog().len());
  }

  // ─── Progress ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn streak_update_grants_streak_badge() {
    let f = fixture().await;
    let (status, body) = send(
      &f.router,
      "PUT",
      "/progress/demo_user",
      Some(json!({ "current_streak": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_streak"], 5);
    assert_eq!(body["badges_earned"][0]["id"], "streak_5");
    assert_eq!(body["badges_earned"][1]["id"], "points_100");
  }

  #[tokio::test]
  async fn negative_streak_is_400() {
    let f = fixture().await;
    let (status, _) = send(
      &f.router,
      "PUT",
      "/progress/demo_user",
      Some(json!({ "current_streak": -1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }
}
