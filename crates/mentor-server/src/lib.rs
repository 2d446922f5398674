//! HTTP service shell for Mentor.
//!
//! Wires a [`MasteryEngine`] into the JSON API under `/api`, adds `/health`
//! and request tracing, and owns the analytics delivery task.

pub mod analytics;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{Json, Router, routing::get};
use mentor_core::{MasteryEngine, store::MasteryStore};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `MENTOR_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                   String,
  #[serde(default = "default_port")]
  pub port:                   u16,
  /// SQLite file; `:memory:` keeps everything in process.
  #[serde(default = "default_store_path")]
  pub store_path:             PathBuf,
  /// Base URL of the learning-analytics collector. Events are only logged
  /// when unset.
  #[serde(default)]
  pub analytics_url:          Option<String>,
  #[serde(default = "default_analytics_timeout_secs")]
  pub analytics_timeout_secs: u64,
  #[serde(default = "default_event_queue_capacity")]
  pub event_queue_capacity:   usize,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8000 }
fn default_store_path() -> PathBuf { PathBuf::from("mentor.db") }
fn default_analytics_timeout_secs() -> u64 { 5 }
fn default_event_queue_capacity() -> usize { 1024 }

impl ServerConfig {
  pub fn analytics_timeout(&self) -> Duration { Duration::from_secs(self.analytics_timeout_secs) }

  pub fn is_in_memory(&self) -> bool { self.store_path.as_os_str() == ":memory:" }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the service router: `/health` plus the API nested under `/api`.
pub fn router<S>(engine: Arc<MasteryEngine<S>>) -> Router
where
  S: MasteryStore + 'static,
{
  Router::new()
    .route("/health", get(health))
    .nest("/api", mentor_api::api_router(engine))
    .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> {
  Json(json!({ "status": "healthy", "service": "mentor" }))
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use config::{Config, File, FileFormat};
  use mentor_core::memory::MemoryStore;
  use tower::ServiceExt;

  use super::*;

  async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
  }

  fn app() -> Router {
    router(Arc::new(MasteryEngine::new(Arc::new(MemoryStore::new()))))
  }

  #[tokio::test]
  async fn health_is_ok() {
    let (status, body) = get_json(app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
  }

  #[tokio::test]
  async fn api_is_nested() {
    let (status, body) = get_json(app(), "/api/badges").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().is_some_and(|b| !b.is_empty()));

    let (status, _) = get_json(app(), "/badges").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[test]
  fn config_defaults_fill_missing_keys() {
    let cfg: ServerConfig = Config::builder()
      .add_source(File::from_str("port = 9100\nstore_path = \":memory:\"", FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap();

    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 9100);
    assert!(cfg.is_in_memory());
    assert_eq!(cfg.analytics_url, None);
    assert_eq!(cfg.analytics_timeout(), Duration::from_secs(5));
    assert_eq!(cfg.event_queue_capacity, 1024);
  }
}
