//! [`MasteryEngine`] — the review scheduler, mastery ledger and badge
//! evaluator wired together over a [`MasteryStore`].
//!
//! Mutating operations for one user run one at a time under that user's lock;
//! different users never contend. Reads take no lock. The analytics event for
//! a review is emitted after the lock is released, and nothing the sink does
//! can affect the outcome of the call.

use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use crate::{
  Error, Result,
  badge::{self, Badge, Counters, EarnedBadge},
  clock::{Clock, SystemClock},
  events::{AnalyticsEvent, EventSink, NoopSink},
  ledger::{LedgerUpdate, MAX_AWARD_POINTS, Milestone, PointsEntry, badge_reason, review_reason},
  review::{Performance, ReviewItem, ScheduleEntry, build_schedule},
  store::MasteryStore,
  summary::{GamificationSummary, RECENT_POINTS_LIMIT, ReviewOutcome, UserStats},
};

pub struct MasteryEngine<S> {
  store: Arc<S>,
  sink:  Arc<dyn EventSink>,
  clock: Arc<dyn Clock>,
  /// One lock per user key, created on first use and removed once no task
  /// holds or awaits it.
  locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Holds one user's lock; releasing it drops the map entry if it is unused.
struct UserGuard<'a> {
  locks:   &'a DashMap<String, Arc<Mutex<()>>>,
  user_id: &'a str,
  guard:   Option<OwnedMutexGuard<()>>,
}

impl Drop for UserGuard<'_> {
  fn drop(&mut self) {
    self.guard.take();
    // The map's own reference is the only one left when nobody else waits.
    self.locks.remove_if(self.user_id, |_, lock| Arc::strong_count(lock) == 1);
  }
}

impl<S> MasteryEngine<S>
where
  S: MasteryStore,
{
  /// An engine over `store` that discards analytics events and reads the
  /// system clock.
  pub fn new(store: Arc<S>) -> Self {
    Self {
      store,
      sink: Arc::new(NoopSink),
      clock: Arc::new(SystemClock),
      locks: DashMap::new(),
    }
  }

  pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
    self.sink = sink;
    self
  }

  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  async fn lock_user<'a>(&'a self, user_id: &'a str) -> UserGuard<'a> {
    let lock = Arc::clone(&self.locks.entry(user_id.to_owned()).or_default());
    UserGuard { locks: &self.locks, user_id, guard: Some(lock.lock_owned().await) }
  }

  // ── Scheduler ─────────────────────────────────────────────────────────

  /// Record one review of `item_id`, creating the item on first sight, and
  /// credit the points it earns.
  pub async fn submit_review(
    &self,
    user_id: &str,
    item_id: &str,
    performance: Performance,
  ) -> Result<ReviewOutcome> {
    require_id("user_id", user_id)?;
    require_id("item_id", item_id)?;

    let guard = self.lock_user(user_id).await;
    let now = self.clock.now();

    let mut item = match self.store.get_item(user_id, item_id).await.map_err(Error::store)? {
      Some(item) => item,
      None => {
        debug!(user_id, item_id, "creating review item");
        ReviewItem::new(item_id, now)
      }
    };

    let points_awarded = item.apply_review(performance, now);
    let entry = PointsEntry::new(points_awarded, review_reason(&item.topic), now);
    let total = self
      .store
      .record_review(user_id, &item, &entry)
      .await
      .map_err(Error::store)?;
    let ledger = self.settle_after_credit(user_id, total, now).await?;
    drop(guard);

    info!(
      user_id,
      item_id,
      %performance,
      interval = item.interval,
      ease_factor = item.ease_factor,
      points = points_awarded,
      "review recorded"
    );
    self.sink.emit(AnalyticsEvent::review(user_id, &item, performance, now));

    Ok(ReviewOutcome {
      updated_item: ScheduleEntry::just_reviewed(item),
      points_awarded,
      total_points: ledger.total_points,
      badges_earned: ledger.badges_earned,
    })
  }

  /// Every item of the user, due items first, each group by `next_review`.
  pub async fn get_schedule(&self, user_id: &str) -> Result<Vec<ScheduleEntry>> {
    let items = self.store.list_items(user_id).await.map_err(Error::store)?;
    Ok(build_schedule(items, self.clock.now()))
  }

  pub async fn get_due_items(&self, user_id: &str) -> Result<Vec<ScheduleEntry>> {
    let mut schedule = self.get_schedule(user_id).await?;
    schedule.retain(|e| e.due);
    Ok(schedule)
  }

  // ── Ledger ────────────────────────────────────────────────────────────

  /// Append an award to the ledger, then grant whatever badges it unlocks.
  /// Awards beyond ±[`MAX_AWARD_POINTS`] are rejected.
  pub async fn add_points(
    &self,
    user_id: &str,
    points: i64,
    reason: &str,
  ) -> Result<LedgerUpdate> {
    require_id("user_id", user_id)?;
    if !(-MAX_AWARD_POINTS..=MAX_AWARD_POINTS).contains(&points) {
      return Err(Error::InvalidArgument(format!(
        "points must be within ±{MAX_AWARD_POINTS}, got {points}"
      )));
    }

    let _guard = self.lock_user(user_id).await;
    let now = self.clock.now();
    let entry = PointsEntry::new(points, reason, now);
    let total = self.store.append_points(user_id, &entry).await.map_err(Error::store)?;
    debug!(user_id, points, total, reason, "points credited");
    self.settle_after_credit(user_id, total, now).await
  }

  pub async fn get_total(&self, user_id: &str) -> Result<i64> {
    self.store.total_points(user_id).await.map_err(Error::store)
  }

  /// The most recent `limit` ledger entries, oldest first.
  pub async fn points_history(
    &self,
    user_id: &str,
    limit: Option<usize>,
  ) -> Result<Vec<PointsEntry>> {
    self.store.points_history(user_id, limit).await.map_err(Error::store)
  }

  /// Grant what a committed credit unlocked. `total` is the balance right
  /// after the credit. Caller must hold the user's lock.
  async fn settle_after_credit(
    &self,
    user_id: &str,
    total: i64,
    now: DateTime<Utc>,
  ) -> Result<LedgerUpdate> {
    let badges_earned = self.settle_badges(user_id, now).await?;
    let total_points = if badges_earned.is_empty() {
      total
    } else {
      self.get_total(user_id).await?
    };

    Ok(LedgerUpdate { total_points, badges_earned })
  }

  // ── Badges ────────────────────────────────────────────────────────────

  /// Grant every badge the user now qualifies for, including those unlocked
  /// by the bonus points of other grants in the same call.
  pub async fn check_eligibility(&self, user_id: &str) -> Result<Vec<Badge>> {
    require_id("user_id", user_id)?;

    let _guard = self.lock_user(user_id).await;
    self.settle_badges(user_id, self.clock.now()).await
  }

  /// Grant a catalog badge directly. Granting an owned badge changes nothing.
  pub async fn award_badge(&self, user_id: &str, badge_id: &str) -> Result<LedgerUpdate> {
    require_id("user_id", user_id)?;
    let badge = badge::find(badge_id)
      .ok_or_else(|| Error::InvalidArgument(format!("unknown badge: {badge_id:?}")))?;

    let _guard = self.lock_user(user_id).await;
    let now = self.clock.now();

    let mut badges_earned = Vec::new();
    if self.grant(user_id, badge, now).await? {
      badges_earned.push(badge.clone());
      badges_earned.extend(self.settle_badges(user_id, now).await?);
    }

    Ok(LedgerUpdate { total_points: self.get_total(user_id).await?, badges_earned })
  }

  /// Update the user's study streak and grant any badge it unlocks.
  pub async fn record_streak(&self, user_id: &str, current_streak: u32) -> Result<Vec<Badge>> {
    require_id("user_id", user_id)?;

    let _guard = self.lock_user(user_id).await;
    self.store.set_streak(user_id, current_streak).await.map_err(Error::store)?;
    self.settle_badges(user_id, self.clock.now()).await
  }

  pub async fn get_badges(&self, user_id: &str) -> Result<Vec<EarnedBadge>> {
    let grants = self.store.earned_badges(user_id).await.map_err(Error::store)?;
    Ok(grants.iter().filter_map(EarnedBadge::from_grant).collect())
  }

  pub fn catalog(&self) -> &'static [Badge] { badge::catalog() }

  /// Fixed-point loop over the badge rules. Caller must hold the user's lock.
  async fn settle_badges(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<Badge>> {
    let mut earned = Vec::new();

    // Every pass that does not break grants at least one catalog badge.
    for _ in 0..=badge::catalog().len() {
      let counters = Counters {
        total_points:   self.get_total(user_id).await?,
        current_streak: self.store.current_streak(user_id).await.map_err(Error::store)?,
      };
      let owned: HashSet<String> = self
        .store
        .earned_badges(user_id)
        .await
        .map_err(Error::store)?
        .into_iter()
        .map(|g| g.badge_id)
        .collect();

      let eligible = badge::newly_eligible(&counters, &owned);
      if eligible.is_empty() {
        break;
      }
      for badge in eligible {
        if self.grant(user_id, badge, now).await? {
          earned.push(badge.clone());
        }
      }
    }

    Ok(earned)
  }

  /// Add `badge` to the earned set together with its bonus, unless it is
  /// already there.
  async fn grant(&self, user_id: &str, badge: &Badge, now: DateTime<Utc>) -> Result<bool> {
    let bonus = PointsEntry::new(badge.point_value, badge_reason(&badge.name), now);
    let granted = self
      .store
      .grant_badge_with_bonus(user_id, &badge.id, &bonus)
      .await
      .map_err(Error::store)?;
    let Some(total) = granted else {
      return Ok(false);
    };

    info!(user_id, badge = %badge.id, bonus = badge.point_value, total, "badge granted");
    Ok(true)
  }

  // ── Summary ───────────────────────────────────────────────────────────

  pub async fn gamification_summary(&self, user_id: &str) -> Result<GamificationSummary> {
    let total_points = self.get_total(user_id).await?;
    let badges = self.get_badges(user_id).await?;
    let current_streak = self.store.current_streak(user_id).await.map_err(Error::store)?;
    let items_due_for_review = self.get_due_items(user_id).await?.len();
    let recent_points = self.points_history(user_id, Some(RECENT_POINTS_LIMIT)).await?;

    Ok(GamificationSummary {
      stats: UserStats {
        total_points,
        total_badges: badges.len(),
        current_streak,
        items_due_for_review,
      },
      badges,
      recent_points,
      next_milestone: Milestone::for_total(total_points),
    })
  }
}

fn require_id(field: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::InvalidArgument(format!("{field} must not be empty")));
  }
  Ok(())
}
