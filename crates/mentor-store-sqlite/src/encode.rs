//! Encoding and decoding helpers between Rust domain types and the plain-text
//! and integer representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings in UTC.

use chrono::{DateTime, Utc};
use mentor_core::{
  badge::BadgeGrant,
  ledger::PointsEntry,
  review::ReviewItem,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Counters ────────────────────────────────────────────────────────────────

pub fn decode_u32(column: &'static str, value: i64) -> Result<u32> {
  u32::try_from(value).map_err(|_| Error::Corrupt { column, value })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `review_items` row.
pub struct RawReviewItem {
  pub item_id:       String,
  pub topic:         String,
  pub interval_days: i64,
  pub ease_factor:   f64,
  pub repetitions:   i64,
  pub next_review:   String,
  pub last_reviewed: Option<String>,
}

impl RawReviewItem {
  pub const COLUMNS: &'static str =
    "item_id, topic, interval_days, ease_factor, repetitions, next_review, last_reviewed";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      item_id:       row.get(0)?,
      topic:         row.get(1)?,
      interval_days: row.get(2)?,
      ease_factor:   row.get(3)?,
      repetitions:   row.get(4)?,
      next_review:   row.get(5)?,
      last_reviewed: row.get(6)?,
    })
  }

  pub fn into_item(self) -> Result<ReviewItem> {
    Ok(ReviewItem {
      item_id:       self.item_id,
      topic:         self.topic,
      interval:      decode_u32("interval_days", self.interval_days)?,
      ease_factor:   self.ease_factor,
      repetitions:   decode_u32("repetitions", self.repetitions)?,
      next_review:   decode_dt(&self.next_review)?,
      last_reviewed: self.last_reviewed.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw values read directly from a `points_ledger` row.
pub struct RawPointsEntry {
  pub recorded_at: String,
  pub points:      i64,
  pub reason:      String,
}

impl RawPointsEntry {
  pub fn into_entry(self) -> Result<PointsEntry> {
    Ok(PointsEntry {
      timestamp: decode_dt(&self.recorded_at)?,
      points:    self.points,
      reason:    self.reason,
    })
  }
}

/// Raw values read directly from a `user_badges` row.
pub struct RawBadgeGrant {
  pub badge_id:  String,
  pub earned_at: String,
}

impl RawBadgeGrant {
  pub fn into_grant(self) -> Result<BadgeGrant> {
    Ok(BadgeGrant { badge_id: self.badge_id, earned_at: decode_dt(&self.earned_at)? })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dt_roundtrip_preserves_instant() {
    let now = Utc::now();
    assert_eq!(decode_dt(&encode_dt(now)).unwrap(), now);
  }

  #[test]
  fn negative_counter_is_corrupt() {
    assert!(matches!(
      decode_u32("repetitions", -1),
      Err(Error::Corrupt { column: "repetitions", value: -1 })
    ));
    assert_eq!(decode_u32("repetitions", 7).unwrap(), 7);
  }
}
