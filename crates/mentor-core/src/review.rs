//! Review items and the SM-2-derived scheduling rule.
//!
//! One [`ReviewItem`] exists per `(user_id, item_id)`. It is created lazily on
//! the first review of an unseen item and is never deleted. Whether an item is
//! due is not stored: it is computed on read into a [`ScheduleEntry`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::{Error, Result};

// ─── Bounds ──────────────────────────────────────────────────────────────────

pub const MIN_EASE_FACTOR: f64 = 1.3;
pub const MAX_EASE_FACTOR: f64 = 4.0;
pub const INITIAL_EASE_FACTOR: f64 = 2.5;
pub const INITIAL_INTERVAL: u32 = 1;

/// Interval used for the second consecutive successful review.
const SECOND_INTERVAL: u32 = 6;

const FORGOT_EASE_PENALTY: f64 = 0.2;
const EASE_STEP: f64 = 0.15;

// ─── Performance ─────────────────────────────────────────────────────────────

/// How well the learner recalled an item.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Performance {
  /// Recalled without effort.
  Easy,
  /// Recalled with some effort.
  Good,
  /// Recalled with difficulty.
  Hard,
  /// Not recalled at all.
  Forgot,
}

impl Performance {
  /// Parse the wire form (`easy`, `good`, `hard`, `forgot`). Matching is exact.
  pub fn parse(s: &str) -> Result<Self> {
    s.parse().map_err(|_| {
      Error::InvalidArgument(format!(
        "performance must be one of: easy, good, hard, forgot (got {s:?})"
      ))
    })
  }

  /// Points credited to the ledger for a review with this outcome.
  pub fn points(self) -> i64 {
    match self {
      Self::Easy => 20,
      Self::Good => 15,
      Self::Hard => 10,
      // Partial credit for attempting.
      Self::Forgot => 5,
    }
  }
}

// ─── ReviewItem ──────────────────────────────────────────────────────────────

/// Scheduling state for one learning item of one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
  pub item_id:       String,
  /// Human-readable label, derived from `item_id` on creation.
  pub topic:         String,
  /// Days until the next review; always at least 1.
  pub interval:      u32,
  /// Always within [`MIN_EASE_FACTOR`, `MAX_EASE_FACTOR`].
  pub ease_factor:   f64,
  /// Consecutive reviews that were not `forgot`.
  pub repetitions:   u32,
  pub next_review:   DateTime<Utc>,
  pub last_reviewed: Option<DateTime<Utc>>,
}

impl ReviewItem {
  /// A fresh item with default scheduling state, due immediately.
  pub fn new(item_id: impl Into<String>, now: DateTime<Utc>) -> Self {
    let item_id = item_id.into();
    Self {
      topic: topic_for(&item_id),
      item_id,
      interval: INITIAL_INTERVAL,
      ease_factor: INITIAL_EASE_FACTOR,
      repetitions: 0,
      next_review: now,
      last_reviewed: None,
    }
  }

  /// Apply one review outcome at `now` and return the points it earns.
  ///
  /// The next interval is derived from the repetition count and ease factor
  /// as they were *before* this review.
  pub fn apply_review(&mut self, performance: Performance, now: DateTime<Utc>) -> i64 {
    match performance {
      Performance::Forgot => {
        self.ease_factor = (self.ease_factor - FORGOT_EASE_PENALTY).max(MIN_EASE_FACTOR);
        self.interval = INITIAL_INTERVAL;
        self.repetitions = 0;
      }
      Performance::Easy | Performance::Good | Performance::Hard => {
        self.interval = match self.repetitions {
          0 => INITIAL_INTERVAL,
          1 => SECOND_INTERVAL,
          // Truncation toward zero, not rounding.
          n => ((f64::from(n) * self.ease_factor) as u32).max(INITIAL_INTERVAL),
        };
        self.repetitions += 1;

        self.ease_factor = match performance {
          Performance::Easy => (self.ease_factor + EASE_STEP).min(MAX_EASE_FACTOR),
          Performance::Hard => (self.ease_factor - EASE_STEP).max(MIN_EASE_FACTOR),
          _ => self.ease_factor,
        };
      }
    }

    self.next_review = now + Duration::days(i64::from(self.interval));
    self.last_reviewed = Some(now);
    performance.points()
  }
}

/// Derive a display label from an item id: `"loops_and_iteration"` becomes
/// `"Topic: Loops And Iteration"`.
pub fn topic_for(item_id: &str) -> String {
  format!("Topic: {}", title_case(&item_id.replace('_', " ")))
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
fn title_case(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  let mut in_word = false;
  for c in s.chars() {
    if c.is_alphabetic() {
      if in_word {
        out.extend(c.to_lowercase());
      } else {
        out.extend(c.to_uppercase());
      }
      in_word = true;
    } else {
      out.push(c);
      in_word = false;
    }
  }
  out
}

// ─── ScheduleEntry ───────────────────────────────────────────────────────────

/// A [`ReviewItem`] as presented to clients, with due status computed at read
/// time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
  pub item_id:       String,
  pub topic:         String,
  pub interval:      u32,
  pub ease_factor:   f64,
  pub repetitions:   u32,
  pub next_review:   DateTime<Utc>,
  pub due:           bool,
  /// Whole hours past `next_review`; 0 when not due.
  pub overdue_hours: i64,
  pub last_reviewed: Option<DateTime<Utc>>,
}

impl ScheduleEntry {
  /// Evaluate `item` as of `now`.
  pub fn at(item: ReviewItem, now: DateTime<Utc>) -> Self {
    let due = now >= item.next_review;
    let overdue_hours = if due {
      (now - item.next_review).num_hours().max(0)
    } else {
      0
    };

    Self {
      item_id: item.item_id,
      topic: item.topic,
      interval: item.interval,
      ease_factor: item.ease_factor,
      repetitions: item.repetitions,
      next_review: item.next_review,
      due,
      overdue_hours,
      last_reviewed: item.last_reviewed,
    }
  }

  /// The entry handed back right after a review: never due.
  pub fn just_reviewed(item: ReviewItem) -> Self {
    Self {
      due: false,
      overdue_hours: 0,
      ..Self::at(item, DateTime::<Utc>::MIN_UTC)
    }
  }
}

/// Evaluate and order a user's items: due items first, then by ascending
/// `next_review` within each group. The sort is stable.
pub fn build_schedule(items: Vec<ReviewItem>, now: DateTime<Utc>) -> Vec<ScheduleEntry> {
  let mut entries: Vec<ScheduleEntry> =
    items.into_iter().map(|item| ScheduleEntry::at(item, now)).collect();
  entries.sort_by(|a, b| (!a.due, a.next_review).cmp(&(!b.due, b.next_review)));
  entries
}
