//! The mastery ledger: an append-only log of point awards per user.
//!
//! A user's total is the sum of their entries. Stores may cache it, but every
//! append must keep the cache and the log consistent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::badge::Badge;

/// Size of a milestone step in points.
pub const MILESTONE_STEP: i64 = 100;

/// Largest magnitude a single manual award may have.
pub const MAX_AWARD_POINTS: i64 = 1_000_000;

/// One award in the ledger. Never updated or removed once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsEntry {
  pub timestamp: DateTime<Utc>,
  pub points:    i64,
  pub reason:    String,
}

impl PointsEntry {
  pub fn new(points: i64, reason: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
    Self { timestamp, points, reason: reason.into() }
  }
}

/// Result of crediting points: the new total and every badge granted as a
/// consequence, in grant order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerUpdate {
  pub total_points: i64,
  pub badges_earned: Vec<Badge>,
}

/// Ledger reason for a spaced-repetition review.
pub fn review_reason(topic: &str) -> String { format!("Spaced repetition: {topic}") }

/// Ledger reason for a badge bonus.
pub fn badge_reason(badge_name: &str) -> String { format!("Badge earned: {badge_name}") }

/// The next round-hundred target and how far the user is into the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
  pub points:   i64,
  pub progress: i64,
}

impl Milestone {
  pub fn for_total(total: i64) -> Self {
    Self {
      points:   total
        .div_euclid(MILESTONE_STEP)
        .saturating_add(1)
        .saturating_mul(MILESTONE_STEP),
      progress: total.rem_euclid(MILESTONE_STEP),
    }
  }
}

/// Keep the most recent `limit` entries of a chronological log, oldest first.
pub fn most_recent(mut entries: Vec<PointsEntry>, limit: Option<usize>) -> Vec<PointsEntry> {
  if let Some(limit) = limit
    && entries.len() > limit
  {
    entries.drain(..entries.len() - limit);
  }
  entries
}
