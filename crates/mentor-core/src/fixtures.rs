//! Deterministic sample data for tests.
//!
//! Compiled only for this crate's tests or with the `fixtures` feature;
//! production startup never seeds anything.

use chrono::{DateTime, Duration, Utc};

use crate::{
  badge::BadgeGrant,
  ledger::PointsEntry,
  review::ReviewItem,
  store::MasteryStore,
};

/// Three review items relative to `now`: one due two hours ago, two upcoming.
pub fn sample_items(now: DateTime<Utc>) -> Vec<ReviewItem> {
  vec![
    ReviewItem {
      item_id:       "python_basics".into(),
      topic:         "Python Variables and Data Types".into(),
      interval:      1,
      ease_factor:   2.5,
      repetitions:   2,
      next_review:   now + Duration::days(1),
      last_reviewed: Some(now - Duration::days(1)),
    },
    ReviewItem {
      item_id:       "functions".into(),
      topic:         "Python Functions and Scope".into(),
      interval:      3,
      ease_factor:   2.8,
      repetitions:   3,
      next_review:   now + Duration::days(3),
      last_reviewed: Some(now - Duration::days(3)),
    },
    ReviewItem {
      item_id:       "loops".into(),
      topic:         "Loops and Iteration".into(),
      interval:      1,
      ease_factor:   2.3,
      repetitions:   1,
      next_review:   now - Duration::hours(2),
      last_reviewed: None,
    },
  ]
}

/// Three ledger entries worth 50 points in total, oldest first.
pub fn sample_ledger(now: DateTime<Utc>) -> Vec<PointsEntry> {
  vec![
    PointsEntry::new(25, "Completed Python quiz", now - Duration::days(1)),
    PointsEntry::new(10, "Daily study session", now - Duration::hours(6)),
    PointsEntry::new(15, "Asked a great question", now - Duration::hours(2)),
  ]
}

pub fn sample_badges(now: DateTime<Utc>) -> Vec<BadgeGrant> {
  vec![BadgeGrant { badge_id: "first_chat".into(), earned_at: now - Duration::days(2) }]
}

pub const SAMPLE_STREAK: u32 = 3;

/// Seed `user_id` with the sample items, ledger, badges and streak. Writes
/// directly to the store, so no badge rules run and no bonuses are credited.
pub async fn seed_sample_user<S: MasteryStore>(
  store: &S,
  user_id: &str,
  now: DateTime<Utc>,
) -> Result<(), S::Error> {
  for item in sample_items(now) {
    store.put_item(user_id, &item).await?;
  }
  for entry in sample_ledger(now) {
    store.append_points(user_id, &entry).await?;
  }
  for grant in sample_badges(now) {
    store.grant_badge(user_id, &grant.badge_id, grant.earned_at).await?;
  }
  store.set_streak(user_id, SAMPLE_STREAK).await
}
