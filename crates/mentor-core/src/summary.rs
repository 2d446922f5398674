//! Read models combining the scheduler, ledger and badge state of one user.

use serde::{Deserialize, Serialize};

use crate::{
  badge::{Badge, EarnedBadge},
  ledger::{Milestone, PointsEntry},
  review::ScheduleEntry,
};

/// Number of ledger entries included in a [`GamificationSummary`].
pub const RECENT_POINTS_LIMIT: usize = 10;

/// Result of a review submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewOutcome {
  pub updated_item:   ScheduleEntry,
  pub points_awarded: i64,
  pub total_points:   i64,
  /// Badges granted in the same call chain, in grant order.
  pub badges_earned:  Vec<Badge>,
}

/// A user's full schedule with the due subset split out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleView {
  pub schedule:    Vec<ScheduleEntry>,
  pub due_items:   Vec<ScheduleEntry>,
  pub total_items: usize,
  pub items_due:   usize,
}

impl From<Vec<ScheduleEntry>> for ScheduleView {
  fn from(schedule: Vec<ScheduleEntry>) -> Self {
    let due_items: Vec<ScheduleEntry> = schedule.iter().filter(|e| e.due).cloned().collect();
    Self {
      total_items: schedule.len(),
      items_due: due_items.len(),
      schedule,
      due_items,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
  pub total_points:         i64,
  pub total_badges:         usize,
  pub current_streak:       u32,
  pub items_due_for_review: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamificationSummary {
  pub stats:          UserStats,
  pub badges:         Vec<EarnedBadge>,
  /// The last [`RECENT_POINTS_LIMIT`] ledger entries, oldest first.
  pub recent_points:  Vec<PointsEntry>,
  pub next_milestone: Milestone,
}
