//! Plain-text rendering of API responses.

use chrono::{DateTime, Utc};
use mentor_core::{
  badge::{Badge, EarnedBadge},
  ledger::{LedgerUpdate, MILESTONE_STEP, PointsEntry},
  review::ScheduleEntry,
  summary::{GamificationSummary, ReviewOutcome},
};

fn day(ts: DateTime<Utc>) -> String { ts.format("%Y-%m-%d %H:%M").to_string() }

pub fn schedule(entries: &[ScheduleEntry]) -> String {
  if entries.is_empty() {
    return "Nothing scheduled.\n".to_owned();
  }

  let mut out = String::new();
  for e in entries {
    let status = if e.due {
      format!("DUE ({}h overdue)", e.overdue_hours)
    } else {
      format!("next {}", day(e.next_review))
    };
    out.push_str(&format!(
      "{:<20} {:<36} every {:>3}d  ease {:.2}  reps {:>2}  {status}\n",
      e.item_id, e.topic, e.interval, e.ease_factor, e.repetitions,
    ));
  }
  out
}

pub fn review(outcome: &ReviewOutcome) -> String {
  let item = &outcome.updated_item;
  let mut out = format!(
    "Reviewed {}: next review {} (in {}d, ease {:.2})\n+{} points, total {}\n",
    item.topic,
    day(item.next_review),
    item.interval,
    item.ease_factor,
    outcome.points_awarded,
    outcome.total_points,
  );
  out.push_str(&earned(&outcome.badges_earned));
  out
}

pub fn ledger_update(update: &LedgerUpdate) -> String {
  let mut out = format!("Total points: {}\n", update.total_points);
  out.push_str(&earned(&update.badges_earned));
  out
}

/// One line per newly granted badge.
pub fn earned(badges: &[Badge]) -> String {
  badges
    .iter()
    .map(|b| format!("Badge earned: {} (+{})\n", b.name, b.point_value))
    .collect()
}

pub fn history(total: i64, entries: &[PointsEntry]) -> String {
  let mut out = format!("Total points: {total}\n");
  for e in entries {
    out.push_str(&format!("{}  {:>+5}  {}\n", day(e.timestamp), e.points, e.reason));
  }
  out
}

pub fn catalog(badges: &[Badge]) -> String {
  badges
    .iter()
    .map(|b| format!("{:<14} {:<20} {:>4} pts  {}\n", b.id, b.name, b.point_value, b.description))
    .collect()
}

pub fn earned_badges(badges: &[EarnedBadge]) -> String {
  if badges.is_empty() {
    return "No badges yet.\n".to_owned();
  }
  badges
    .iter()
    .map(|b| format!("{}  {} ({})\n", day(b.earned_at), b.badge.name, b.badge.id))
    .collect()
}

pub fn summary(s: &GamificationSummary) -> String {
  format!(
    "Points:        {}\n\
     Badges:        {}\n\
     Streak:        {} days\n\
     Due reviews:   {}\n\
     Next milestone: {} ({}/{MILESTONE_STEP})\n",
    s.stats.total_points,
    s.stats.total_badges,
    s.stats.current_streak,
    s.stats.items_due_for_review,
    s.next_milestone.points,
    s.next_milestone.progress,
  )
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use mentor_core::{badge, review::ReviewItem};

  use super::*;

  fn t0() -> DateTime<Utc> { Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap() }

  #[test]
  fn schedule_marks_due_entries() {
    let mut overdue = ReviewItem::new("loops", t0());
    overdue.next_review = t0() - chrono::Duration::hours(3);
    let mut upcoming = ReviewItem::new("functions", t0());
    upcoming.next_review = t0() + chrono::Duration::days(1);

    let text = schedule(&mentor_core::review::build_schedule(vec![upcoming, overdue], t0()));
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("loops"));
    assert!(lines[0].ends_with("DUE (3h overdue)"));
    assert!(lines[1].ends_with("next 2026-03-02 09:00"));
  }

  #[test]
  fn empty_schedule() {
    assert_eq!(schedule(&[]), "Nothing scheduled.\n");
  }

  #[test]
  fn ledger_update_lists_badges() {
    let update = LedgerUpdate {
      total_points:  150,
      badges_earned: vec![badge::find(badge::POINTS_100).unwrap().clone()],
    };
    assert_eq!(
      ledger_update(&update),
      "Total points: 150\nBadge earned: Century Club (+50)\n"
    );
  }

  #[test]
  fn history_shows_signed_points() {
    let entries = vec![PointsEntry::new(-5, "correction", t0())];
    assert_eq!(history(-5, &entries), "Total points: -5\n2026-03-01 09:00     -5  correction\n");
  }

  #[test]
  fn summary_lines() {
    let s = GamificationSummary {
      stats:          mentor_core::summary::UserStats {
        total_points:         150,
        total_badges:         2,
        current_streak:       5,
        items_due_for_review: 1,
      },
      badges:         Vec::new(),
      recent_points:  Vec::new(),
      next_milestone: mentor_core::ledger::Milestone::for_total(150),
    };
    assert_eq!(
      summary(&s),
      "Points:        150\nBadges:        2\nStreak:        5 days\nDue reviews:   1\nNext milestone: 200 (50/100)\n"
    );
  }
}
