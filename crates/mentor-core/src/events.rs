//! Outbound analytics events.
//!
//! The engine hands one event to its [`EventSink`] after each committed
//! review. Delivery is the sink's business: `emit` must return promptly and
//! must never fail back into the engine.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::review::{Performance, ReviewItem};

pub const SPACED_REPETITION_REVIEW: &str = "spaced_repetition_review";

/// The payload accepted by the learning-analytics collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
  pub user_id:    String,
  pub event_type: String,
  pub event_data: serde_json::Value,
  pub timestamp:  DateTime<Utc>,
}

impl AnalyticsEvent {
  /// The event describing a review that produced `item`.
  pub fn review(
    user_id: &str,
    item: &ReviewItem,
    performance: Performance,
    timestamp: DateTime<Utc>,
  ) -> Self {
    Self {
      user_id: user_id.to_owned(),
      event_type: SPACED_REPETITION_REVIEW.to_owned(),
      event_data: json!({
        "item_id":      item.item_id,
        "performance":  performance,
        "new_interval": item.interval,
        "ease_factor":  item.ease_factor,
      }),
      timestamp,
    }
  }
}

/// Receives events from the engine. Implementations must not block.
pub trait EventSink: Send + Sync {
  fn emit(&self, event: AnalyticsEvent);
}

/// Any `Fn(AnalyticsEvent)` closure can serve as a sink.
impl<F> EventSink for F
where
  F: Fn(AnalyticsEvent) + Send + Sync,
{
  fn emit(&self, event: AnalyticsEvent) { self(event) }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
  fn emit(&self, _event: AnalyticsEvent) {}
}

/// Keeps every event in memory; handy for tests and for inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
  events: Arc<Mutex<Vec<AnalyticsEvent>>>,
}

impl RecordingSink {
  pub fn new() -> Self { Self::default() }

  pub fn events(&self) -> Vec<AnalyticsEvent> {
    self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
  }
}

impl EventSink for RecordingSink {
  fn emit(&self, event: AnalyticsEvent) {
    self.events.lock().unwrap_or_else(|e| e.into_inner()).push(event);
  }
}
