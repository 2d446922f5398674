//! Async HTTP client wrapping the mentor JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use mentor_core::{
  badge::{Badge, EarnedBadge},
  ledger::{LedgerUpdate, PointsEntry},
  review::{Performance, ScheduleEntry},
  summary::{GamificationSummary, ReviewOutcome, ScheduleView},
};
use reqwest::{Client, Response};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};

/// `GET /api/gamification/:user_id/points`
#[derive(Debug, Deserialize)]
pub struct PointsView {
  pub total_points: i64,
  pub history:      Vec<PointsEntry>,
}

/// `PUT /api/progress/:user_id`
#[derive(Debug, Deserialize)]
pub struct ProgressView {
  pub current_streak: u32,
  pub badges_earned:  Vec<Badge>,
}

/// Async HTTP client for the mentor JSON REST API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client:   Client,
  base_url: String,
}

impl ApiClient {
  pub fn new(base_url: impl Into<String>) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, base_url: base_url.into() })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.base_url.trim_end_matches('/'), path)
  }

  // ── Scheduler ─────────────────────────────────────────────────────────────

  /// `GET /api/spaced-repetition/:user_id`
  pub async fn schedule(&self, user_id: &str) -> Result<ScheduleView> {
    let path = format!("/spaced-repetition/{user_id}");
    let resp = self.client.get(self.url(&path)).send().await;
    decode(resp, "GET", &path).await
  }

  /// `GET /api/spaced-repetition/:user_id/due`
  pub async fn due(&self, user_id: &str) -> Result<Vec<ScheduleEntry>> {
    let path = format!("/spaced-repetition/{user_id}/due");
    let resp = self.client.get(self.url(&path)).send().await;
    decode(resp, "GET", &path).await
  }

  /// `POST /api/spaced-repetition/update`
  pub async fn review(
    &self,
    user_id: &str,
    item_id: &str,
    performance: Performance,
  ) -> Result<ReviewOutcome> {
    let path = "/spaced-repetition/update";
    let resp = self
      .client
      .post(self.url(path))
      .json(&json!({ "user_id": user_id, "item_id": item_id, "performance": performance }))
      .send()
      .await;
    decode(resp, "POST", path).await
  }

  // ── Gamification ──────────────────────────────────────────────────────────

  /// `GET /api/gamification/:user_id`
  pub async fn summary(&self, user_id: &str) -> Result<GamificationSummary> {
    let path = format!("/gamification/{user_id}");
    let resp = self.client.get(self.url(&path)).send().await;
    decode(resp, "GET", &path).await
  }

  /// `GET /api/gamification/:user_id/points[?limit=<n>]`
  pub async fn points(&self, user_id: &str, limit: Option<usize>) -> Result<PointsView> {
    let path = format!("/gamification/{user_id}/points");
    let mut req = self.client.get(self.url(&path));
    if let Some(limit) = limit {
      req = req.query(&[("limit", limit)]);
    }
    decode(req.send().await, "GET", &path).await
  }

  /// `POST /api/gamification/points`
  pub async fn add_points(&self, user_id: &str, points: i64, reason: &str) -> Result<LedgerUpdate> {
    let path = "/gamification/points";
    let resp = self
      .client
      .post(self.url(path))
      .json(&json!({ "user_id": user_id, "points": points, "reason": reason }))
      .send()
      .await;
    decode(resp, "POST", path).await
  }

  /// `GET /api/gamification/:user_id/badges`
  pub async fn earned_badges(&self, user_id: &str) -> Result<Vec<EarnedBadge>> {
    let path = format!("/gamification/{user_id}/badges");
    let resp = self.client.get(self.url(&path)).send().await;
    decode(resp, "GET", &path).await
  }

  /// `POST /api/gamification/badges`
  pub async fn award_badge(&self, user_id: &str, badge_id: &str) -> Result<LedgerUpdate> {
    let path = "/gamification/badges";
    let resp = self
      .client
      .post(self.url(path))
      .json(&json!({ "user_id": user_id, "badge_id": badge_id }))
      .send()
      .await;
    decode(resp, "POST", path).await
  }

  /// `GET /api/badges`
  pub async fn catalog(&self) -> Result<Vec<Badge>> {
    let resp = self.client.get(self.url("/badges")).send().await;
    decode(resp, "GET", "/badges").await
  }

  // ── Progress ──────────────────────────────────────────────────────────────

  /// `PUT /api/progress/:user_id`
  pub async fn set_streak(&self, user_id: &str, current_streak: u32) -> Result<ProgressView> {
    let path = format!("/progress/{user_id}");
    let resp = self
      .client
      .put(self.url(&path))
      .json(&json!({ "current_streak": current_streak }))
      .send()
      .await;
    decode(resp, "PUT", &path).await
  }
}

/// Turn a response into `T`, surfacing the server's `{"error": ...}` message
/// on failure.
async fn decode<T: DeserializeOwned>(
  resp: reqwest::Result<Response>,
  method: &str,
  path: &str,
) -> Result<T> {
  let resp = resp.with_context(|| format!("{method} {path} failed"))?;
  let status = resp.status();
  if !status.is_success() {
    let message = resp
      .json::<Value>()
      .await
      .ok()
      .and_then(|body| body["error"].as_str().map(str::to_owned))
      .unwrap_or_default();
    return Err(anyhow!("{method} {path} → {status} {message}"));
  }
  resp.json().await.with_context(|| format!("deserialising {path}"))
}
