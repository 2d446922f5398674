//! The `MasteryStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `mentor-store-sqlite`,
//! or [`crate::memory::MemoryStore`]). The engine depends on this abstraction,
//! never on a concrete backend, so the scheduling rules do not change when
//! the backing store does.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{badge::BadgeGrant, ledger::PointsEntry, review::ReviewItem};

/// Per-user state owned by the engine.
///
/// Backends need no locking of their own beyond what keeps a single call
/// consistent: the engine serialises all mutating calls for a given user.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait MasteryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Review items ──────────────────────────────────────────────────────

  /// Retrieve one item. Returns `None` if the user has never reviewed it.
  fn get_item<'a>(
    &'a self,
    user_id: &'a str,
    item_id: &'a str,
  ) -> impl Future<Output = Result<Option<ReviewItem>, Self::Error>> + Send + 'a;

  /// Insert or replace the item keyed by `(user_id, item.item_id)`.
  fn put_item<'a>(
    &'a self,
    user_id: &'a str,
    item: &'a ReviewItem,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// All items for a user, in creation order.
  fn list_items<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Vec<ReviewItem>, Self::Error>> + Send + 'a;

  /// Store the reviewed `item` and append the `entry` it earned as one
  /// change, returning the user's new total. On error neither is written.
  fn record_review<'a>(
    &'a self,
    user_id: &'a str,
    item: &'a ReviewItem,
    entry: &'a PointsEntry,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + 'a;

  // ── Ledger ────────────────────────────────────────────────────────────

  /// Append an entry and return the user's new total. The append and any
  /// cached total must change together; on error neither does.
  fn append_points<'a>(
    &'a self,
    user_id: &'a str,
    entry: &'a PointsEntry,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + 'a;

  /// Sum of all entries; 0 for unknown users.
  fn total_points<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + 'a;

  /// The most recent `limit` entries (all when `None`), oldest first.
  fn points_history<'a>(
    &'a self,
    user_id: &'a str,
    limit: Option<usize>,
  ) -> impl Future<Output = Result<Vec<PointsEntry>, Self::Error>> + Send + 'a;

  // ── Badges ────────────────────────────────────────────────────────────

  /// The user's earned set, in grant order.
  fn earned_badges<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Vec<BadgeGrant>, Self::Error>> + Send + 'a;

  /// Add `badge_id` to the earned set. Returns `false` (and changes nothing)
  /// if it was already present.
  fn grant_badge<'a>(
    &'a self,
    user_id: &'a str,
    badge_id: &'a str,
    earned_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Grant `badge_id` and append its `bonus` entry as one change, stamped
  /// with the bonus timestamp. Returns the new total, or `None` (and changes
  /// nothing) if the badge was already present. On error neither is written.
  fn grant_badge_with_bonus<'a>(
    &'a self,
    user_id: &'a str,
    badge_id: &'a str,
    bonus: &'a PointsEntry,
  ) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send + 'a;

  // ── User progress ─────────────────────────────────────────────────────

  /// Consecutive study days; 0 for unknown users.
  fn current_streak<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + 'a;

  fn set_streak<'a>(
    &'a self,
    user_id: &'a str,
    streak: u32,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
