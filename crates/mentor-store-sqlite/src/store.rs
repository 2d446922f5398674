//! [`SqliteStore`] — the SQLite implementation of [`MasteryStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;

use mentor_core::{
  badge::BadgeGrant,
  ledger::PointsEntry,
  review::ReviewItem,
  store::MasteryStore,
};

use crate::{
  encode::{RawBadgeGrant, RawPointsEntry, RawReviewItem, decode_u32, encode_dt},
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Mentor store backed by a single SQLite file.
///
/// Clones share one background connection thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a private in-memory database.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Statements shared inside transactions ─────────────────────────────────────

/// An item row ready to bind.
struct ItemParams {
  item_id:       String,
  topic:         String,
  interval_days: i64,
  ease_factor:   f64,
  repetitions:   i64,
  next_review:   String,
  last_reviewed: Option<String>,
}

impl ItemParams {
  fn new(item: &ReviewItem) -> Self {
    Self {
      item_id:       item.item_id.clone(),
      topic:         item.topic.clone(),
      interval_days: i64::from(item.interval),
      ease_factor:   item.ease_factor,
      repetitions:   i64::from(item.repetitions),
      next_review:   encode_dt(item.next_review),
      last_reviewed: item.last_reviewed.map(encode_dt),
    }
  }
}

/// A ledger row ready to bind.
struct EntryParams {
  recorded_at: String,
  points:      i64,
  reason:      String,
}

impl EntryParams {
  fn new(entry: &PointsEntry) -> Self {
    Self {
      recorded_at: encode_dt(entry.timestamp),
      points:      entry.points,
      reason:      entry.reason.clone(),
    }
  }
}

fn upsert_item(conn: &rusqlite::Connection, user_id: &str, p: &ItemParams) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO review_items (
       user_id, item_id, topic, interval_days, ease_factor,
       repetitions, next_review, last_reviewed
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
     ON CONFLICT (user_id, item_id) DO UPDATE SET
       topic         = excluded.topic,
       interval_days = excluded.interval_days,
       ease_factor   = excluded.ease_factor,
       repetitions   = excluded.repetitions,
       next_review   = excluded.next_review,
       last_reviewed = excluded.last_reviewed",
    rusqlite::params![
      user_id,
      p.item_id,
      p.topic,
      p.interval_days,
      p.ease_factor,
      p.repetitions,
      p.next_review,
      p.last_reviewed,
    ],
  )?;
  Ok(())
}

/// Insert a ledger row and return the new total. SQLite's `SUM` fails with
/// "integer overflow" rather than wrapping, which rolls the caller back.
fn append_entry(conn: &rusqlite::Connection, user_id: &str, e: &EntryParams) -> rusqlite::Result<i64> {
  conn.execute(
    "INSERT INTO points_ledger (user_id, recorded_at, points, reason)
     VALUES (?1, ?2, ?3, ?4)",
    rusqlite::params![user_id, e.recorded_at, e.points, e.reason],
  )?;
  sum_points(conn, user_id)
}

fn sum_points(conn: &rusqlite::Connection, user_id: &str) -> rusqlite::Result<i64> {
  conn.query_row(
    "SELECT COALESCE(SUM(points), 0) FROM points_ledger WHERE user_id = ?1",
    rusqlite::params![user_id],
    |r| r.get(0),
  )
}

// ─── MasteryStore impl ───────────────────────────────────────────────────────

impl MasteryStore for SqliteStore {
  type Error = Error;

  // ── Review items ──────────────────────────────────────────────────────────

  async fn get_item(&self, user_id: &str, item_id: &str) -> Result<Option<ReviewItem>> {
    let user_id = user_id.to_owned();
    let item_id = item_id.to_owned();

    let raw: Option<RawReviewItem> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM review_items WHERE user_id = ?1 AND item_id = ?2",
                RawReviewItem::COLUMNS
              ),
              rusqlite::params![user_id, item_id],
              RawReviewItem::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawReviewItem::into_item).transpose()
  }

  async fn put_item(&self, user_id: &str, item: &ReviewItem) -> Result<()> {
    let user_id = user_id.to_owned();
    let params  = ItemParams::new(item);

    self
      .conn
      .call(move |conn| Ok(upsert_item(conn, &user_id, &params)?))
      .await?;
    Ok(())
  }

  async fn list_items(&self, user_id: &str) -> Result<Vec<ReviewItem>> {
    let user_id = user_id.to_owned();

    let raws: Vec<RawReviewItem> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM review_items WHERE user_id = ?1 ORDER BY rowid",
          RawReviewItem::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_id], RawReviewItem::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReviewItem::into_item).collect()
  }

  async fn record_review(
    &self,
    user_id: &str,
    item: &ReviewItem,
    entry: &PointsEntry,
  ) -> Result<i64> {
    let user_id = user_id.to_owned();
    let item    = ItemParams::new(item);
    let entry   = EntryParams::new(entry);

    let total = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        upsert_item(&tx, &user_id, &item)?;
        let total = append_entry(&tx, &user_id, &entry)?;
        tx.commit()?;
        Ok(total)
      })
      .await?;
    Ok(total)
  }

  // ── Ledger ────────────────────────────────────────────────────────────────

  async fn append_points(&self, user_id: &str, entry: &PointsEntry) -> Result<i64> {
    let user_id = user_id.to_owned();
    let entry   = EntryParams::new(entry);

    let total = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let total = append_entry(&tx, &user_id, &entry)?;
        tx.commit()?;
        Ok(total)
      })
      .await?;
    Ok(total)
  }

  async fn total_points(&self, user_id: &str) -> Result<i64> {
    let user_id = user_id.to_owned();

    let total = self
      .conn
      .call(move |conn| Ok(sum_points(conn, &user_id)?))
      .await?;
    Ok(total)
  }

  async fn points_history(&self, user_id: &str, limit: Option<usize>) -> Result<Vec<PointsEntry>> {
    let user_id = user_id.to_owned();
    // SQLite treats a negative LIMIT as "no limit".
    let limit_val = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));

    let mut raws: Vec<RawPointsEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT recorded_at, points, reason
           FROM points_ledger
           WHERE user_id = ?1
           ORDER BY entry_id DESC
           LIMIT ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_id, limit_val], |row| {
            Ok(RawPointsEntry {
              recorded_at: row.get(0)?,
              points:      row.get(1)?,
              reason:      row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.reverse();
    raws.into_iter().map(RawPointsEntry::into_entry).collect()
  }

  // ── Badges ────────────────────────────────────────────────────────────────

  async fn earned_badges(&self, user_id: &str) -> Result<Vec<BadgeGrant>> {
    let user_id = user_id.to_owned();

    let raws: Vec<RawBadgeGrant> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT badge_id, earned_at FROM user_badges WHERE user_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_id], |row| {
            Ok(RawBadgeGrant {
              badge_id:  row.get(0)?,
              earned_at: row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBadgeGrant::into_grant).collect()
  }

  async fn grant_badge(
    &self,
    user_id:   &str,
    badge_id:  &str,
    earned_at: DateTime<Utc>,
  ) -> Result<bool> {
    let user_id       = user_id.to_owned();
    let badge_id      = badge_id.to_owned();
    let earned_at_str = encode_dt(earned_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "INSERT OR IGNORE INTO user_badges (user_id, badge_id, earned_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![user_id, badge_id, earned_at_str],
        )?;
        Ok(changed == 1)
      })
      .await?;
    Ok(inserted)
  }

  async fn grant_badge_with_bonus(
    &self,
    user_id: &str,
    badge_id: &str,
    bonus: &PointsEntry,
  ) -> Result<Option<i64>> {
    let user_id  = user_id.to_owned();
    let badge_id = badge_id.to_owned();
    let bonus    = EntryParams::new(bonus);

    let total = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "INSERT OR IGNORE INTO user_badges (user_id, badge_id, earned_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![user_id, badge_id, bonus.recorded_at],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let total = append_entry(&tx, &user_id, &bonus)?;
        tx.commit()?;
        Ok(Some(total))
      })
      .await?;
    Ok(total)
  }

  // ── User progress ─────────────────────────────────────────────────────────

  async fn current_streak(&self, user_id: &str) -> Result<u32> {
    let user_id = user_id.to_owned();

    let streak: Option<i64> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT current_streak FROM user_progress WHERE user_id = ?1",
              rusqlite::params![user_id],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    streak.map_or(Ok(0), |s| decode_u32("current_streak", s))
  }

  async fn set_streak(&self, user_id: &str, streak: u32) -> Result<()> {
    let user_id = user_id.to_owned();
    let streak  = i64::from(streak);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO user_progress (user_id, current_streak) VALUES (?1, ?2)
           ON CONFLICT (user_id) DO UPDATE SET current_streak = excluded.current_streak",
          rusqlite::params![user_id, streak],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
