//! [`MemoryStore`] — a process-lifetime [`MasteryStore`] over hash maps.

use std::{
  collections::HashMap,
  sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
  badge::BadgeGrant,
  ledger::{PointsEntry, most_recent},
  review::ReviewItem,
  store::MasteryStore,
};

#[derive(Debug, Error)]
pub enum MemoryError {
  /// The append would push the running total past `i64`.
  #[error("points total would overflow")]
  TotalOverflow,
}

type Result<T, E = MemoryError> = std::result::Result<T, E>;

#[derive(Debug, Default)]
struct UserState {
  /// Creation order is preserved.
  items:  Vec<ReviewItem>,
  ledger: Vec<PointsEntry>,
  total:  i64,
  badges: Vec<BadgeGrant>,
  streak: u32,
}

impl UserState {
  fn owns(&self, badge_id: &str) -> bool { self.badges.iter().any(|g| g.badge_id == badge_id) }

  fn upsert_item(&mut self, item: &ReviewItem) {
    match self.items.iter_mut().find(|i| i.item_id == item.item_id) {
      Some(existing) => *existing = item.clone(),
      None => self.items.push(item.clone()),
    }
  }

  /// The total after `entry`, without appending it.
  fn total_after(&self, entry: &PointsEntry) -> Result<i64> {
    self.total.checked_add(entry.points).ok_or(MemoryError::TotalOverflow)
  }

  fn append(&mut self, entry: &PointsEntry, total: i64) -> i64 {
    self.ledger.push(entry.clone());
    self.total = total;
    total
  }
}

/// Keeps everything in memory; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
  users: Mutex<HashMap<String, UserState>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  fn users(&self) -> MutexGuard<'_, HashMap<String, UserState>> {
    self.users.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// Run `f` against the user's state, if any.
  fn read<T>(&self, user_id: &str, f: impl FnOnce(&UserState) -> T) -> Option<T> {
    self.users().get(user_id).map(f)
  }

  /// Run `f` against the user's state, creating it on demand.
  fn write<T>(&self, user_id: &str, f: impl FnOnce(&mut UserState) -> T) -> T {
    f(self.users().entry(user_id.to_owned()).or_default())
  }
}

impl MasteryStore for MemoryStore {
  type Error = MemoryError;

  async fn get_item(&self, user_id: &str, item_id: &str) -> Result<Option<ReviewItem>> {
    Ok(
      self
        .read(user_id, |u| u.items.iter().find(|i| i.item_id == item_id).cloned())
        .flatten(),
    )
  }

  async fn put_item(&self, user_id: &str, item: &ReviewItem) -> Result<()> {
    self.write(user_id, |u| u.upsert_item(item));
    Ok(())
  }

  async fn list_items(&self, user_id: &str) -> Result<Vec<ReviewItem>> {
    Ok(self.read(user_id, |u| u.items.clone()).unwrap_or_default())
  }

  async fn record_review(
    &self,
    user_id: &str,
    item: &ReviewItem,
    entry: &PointsEntry,
  ) -> Result<i64> {
    self.write(user_id, |u| {
      let total = u.total_after(entry)?;
      u.upsert_item(item);
      Ok(u.append(entry, total))
    })
  }

  async fn append_points(&self, user_id: &str, entry: &PointsEntry) -> Result<i64> {
    self.write(user_id, |u| {
      let total = u.total_after(entry)?;
      Ok(u.append(entry, total))
    })
  }

  async fn total_points(&self, user_id: &str) -> Result<i64> {
    Ok(self.read(user_id, |u| u.total).unwrap_or(0))
  }

  async fn points_history(&self, user_id: &str, limit: Option<usize>) -> Result<Vec<PointsEntry>> {
    let ledger = self.read(user_id, |u| u.ledger.clone()).unwrap_or_default();
    Ok(most_recent(ledger, limit))
  }

  async fn earned_badges(&self, user_id: &str) -> Result<Vec<BadgeGrant>> {
    Ok(self.read(user_id, |u| u.badges.clone()).unwrap_or_default())
  }

  async fn grant_badge(
    &self,
    user_id: &str,
    badge_id: &str,
    earned_at: DateTime<Utc>,
  ) -> Result<bool> {
    Ok(self.write(user_id, |u| {
      if u.owns(badge_id) {
        return false;
      }
      u.badges.push(BadgeGrant { badge_id: badge_id.to_owned(), earned_at });
      true
    }))
  }

  async fn grant_badge_with_bonus(
    &self,
    user_id: &str,
    badge_id: &str,
    bonus: &PointsEntry,
  ) -> Result<Option<i64>> {
    self.write(user_id, |u| {
      if u.owns(badge_id) {
        return Ok(None);
      }
      let total = u.total_after(bonus)?;
      u.badges.push(BadgeGrant { badge_id: badge_id.to_owned(), earned_at: bonus.timestamp });
      Ok(Some(u.append(bonus, total)))
    })
  }

  async fn current_streak(&self, user_id: &str) -> Result<u32> {
    Ok(self.read(user_id, |u| u.streak).unwrap_or(0))
  }

  async fn set_streak(&self, user_id: &str, streak: u32) -> Result<()> {
    self.write(user_id, |u| u.streak = streak);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn put_item_replaces_in_place() {
    let store = MemoryStore::new();
    let now = Utc::now();
    store.put_item("u", &ReviewItem::new("a", now)).await.unwrap();
    store.put_item("u", &ReviewItem::new("b", now)).await.unwrap();

    let mut a = ReviewItem::new("a", now);
    a.repetitions = 4;
    store.put_item("u", &a).await.unwrap();

    let items = store.list_items("u").await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].item_id, "a");
    assert_eq!(items[0].repetitions, 4);
  }

  #[tokio::test]
  async fn total_tracks_ledger() {
    let store = MemoryStore::new();
    let now = Utc::now();
    assert_eq!(store.append_points("u", &PointsEntry::new(15, "x", now)).await.unwrap(), 15);
    assert_eq!(store.append_points("u", &PointsEntry::new(20, "y", now)).await.unwrap(), 35);
    assert_eq!(store.total_points("u").await.unwrap(), 35);
    assert_eq!(store.total_points("nobody").await.unwrap(), 0);
    assert_eq!(store.points_history("u", Some(1)).await.unwrap()[0].reason, "y");
  }

  #[tokio::test]
  async fn grant_badge_is_idempotent() {
    let store = MemoryStore::new();
    let now = Utc::now();
    assert!(store.grant_badge("u", "streak_5", now).await.unwrap());
    assert!(!store.grant_badge("u", "streak_5", now).await.unwrap());
    assert_eq!(store.earned_badges("u").await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn overflowing_append_changes_nothing() {
    let store = MemoryStore::new();
    let now = Utc::now();
    store.append_points("u", &PointsEntry::new(i64::MAX - 10, "huge", now)).await.unwrap();

    let err = store.append_points("u", &PointsEntry::new(11, "one too many", now)).await;
    assert!(matches!(err, Err(MemoryError::TotalOverflow)));
    let err = store.record_review("u", &ReviewItem::new("loops", now), &PointsEntry::new(15, "r", now)).await;
    assert!(matches!(err, Err(MemoryError::TotalOverflow)));
    let err = store.grant_badge_with_bonus("u", "streak_5", &PointsEntry::new(100, "b", now)).await;
    assert!(matches!(err, Err(MemoryError::TotalOverflow)));

    assert_eq!(store.total_points("u").await.unwrap(), i64::MAX - 10);
    assert_eq!(store.points_history("u", None).await.unwrap().len(), 1);
    assert!(store.list_items("u").await.unwrap().is_empty());
    assert!(store.earned_badges("u").await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn bonus_is_paid_only_with_a_new_grant() {
    let store = MemoryStore::new();
    let now = Utc::now();
    let bonus = PointsEntry::new(100, "Badge earned: Study Streak", now);
    assert_eq!(store.grant_badge_with_bonus("u", "streak_5", &bonus).await.unwrap(), Some(100));
    assert_eq!(store.grant_badge_with_bonus("u", "streak_5", &bonus).await.unwrap(), None);
    assert_eq!(store.total_points("u").await.unwrap(), 100);
    assert_eq!(store.earned_badges("u").await.unwrap()[0].earned_at, now);
  }
}
