//! Badge catalog and eligibility rules.
//!
//! The catalog is static. Rules are stateless predicates over a user's
//! aggregate counters; the engine applies them repeatedly until no new badge
//! qualifies (see [`crate::engine::MasteryEngine::check_eligibility`]).

use std::{collections::HashSet, sync::LazyLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// A catalog entry. `point_value` is credited once, on first grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
  pub id:          String,
  pub name:        String,
  pub description: String,
  pub point_value: i64,
}

impl Badge {
  fn new(id: &str, name: &str, description: &str, point_value: i64) -> Self {
    Self {
      id: id.to_owned(),
      name: name.to_owned(),
      description: description.to_owned(),
      point_value,
    }
  }
}

pub const POINTS_100: &str = "points_100";
pub const STREAK_5: &str = "streak_5";

static CATALOG: LazyLock<Vec<Badge>> = LazyLock::new(|| {
  vec![
    Badge::new("first_chat", "First Conversation", "Started your first chat with AI tutor", 10),
    Badge::new("quiz_master", "Quiz Master", "Completed 10 quizzes", 50),
    Badge::new(STREAK_5, "5-Day Streak", "Studied for 5 consecutive days", 100),
    Badge::new("python_basics", "Python Basics", "Mastered Python fundamentals", 75),
    Badge::new("fast_learner", "Fast Learner", "Completed 3 lessons in one day", 25),
    Badge::new("perfectionist", "Perfectionist", "Got 100% on 5 quizzes", 150),
    Badge::new(POINTS_100, "Century Club", "Earned 100 points", 50),
  ]
});

/// Every badge a user can earn.
pub fn catalog() -> &'static [Badge] { &CATALOG }

/// Look up a catalog entry by id.
pub fn find(badge_id: &str) -> Option<&'static Badge> {
  CATALOG.iter().find(|b| b.id == badge_id)
}

// ─── Rules ───────────────────────────────────────────────────────────────────

/// The aggregate counters rules are evaluated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
  pub total_points:   i64,
  /// Consecutive study days, from the user-progress store.
  pub current_streak: u32,
}

/// Threshold a counter must reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
  TotalPoints(i64),
  Streak(u32),
}

impl Criterion {
  pub fn is_met(self, counters: &Counters) -> bool {
    match self {
      Self::TotalPoints(min) => counters.total_points >= min,
      Self::Streak(min) => counters.current_streak >= min,
    }
  }
}

/// Grants `badge_id` automatically once `criterion` is met.
#[derive(Debug, Clone, Copy)]
pub struct BadgeRule {
  pub badge_id:  &'static str,
  pub criterion: Criterion,
}

pub const RULES: &[BadgeRule] = &[
  BadgeRule { badge_id: POINTS_100, criterion: Criterion::TotalPoints(100) },
  BadgeRule { badge_id: STREAK_5, criterion: Criterion::Streak(5) },
];

/// Badges whose rule is met and which are not in `owned`, in rule order.
pub fn newly_eligible(counters: &Counters, owned: &HashSet<String>) -> Vec<&'static Badge> {
  RULES
    .iter()
    .filter(|rule| !owned.contains(rule.badge_id) && rule.criterion.is_met(counters))
    .filter_map(|rule| find(rule.badge_id))
    .collect()
}

// ─── Earned badges ───────────────────────────────────────────────────────────

/// Membership of a badge in a user's earned set, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeGrant {
  pub badge_id:  String,
  pub earned_at: DateTime<Utc>,
}

/// An earned badge joined with its catalog details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarnedBadge {
  #[serde(flatten)]
  pub badge:     Badge,
  pub earned_at: DateTime<Utc>,
}

impl EarnedBadge {
  /// `None` when the grant refers to a badge no longer in the catalog.
  pub fn from_grant(grant: &BadgeGrant) -> Option<Self> {
    find(&grant.badge_id).map(|badge| Self { badge: badge.clone(), earned_at: grant.earned_at })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn owned(ids: &[&str]) -> HashSet<String> { ids.iter().map(|s| s.to_string()).collect() }

  #[test]
  fn every_rule_refers_to_a_catalog_badge() {
    for rule in RULES {
      assert!(find(rule.badge_id).is_some(), "{}", rule.badge_id);
    }
  }

  #[test]
  fn catalog_ids_are_unique() {
    let ids: HashSet<&str> = catalog().iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids.len(), catalog().len());
  }

  #[test]
  fn points_threshold_is_inclusive() {
    let below = Counters { total_points: 99, current_streak: 0 };
    let at = Counters { total_points: 100, current_streak: 0 };
    assert!(newly_eligible(&below, &owned(&[])).is_empty());

    let eligible = newly_eligible(&at, &owned(&[]));
    assert_eq!(eligible.len(), 1);
    assert_eq!(eligible[0].id, POINTS_100);
  }

  #[test]
  fn owned_badges_are_not_eligible_again() {
    let counters = Counters { total_points: 500, current_streak: 9 };
    assert_eq!(newly_eligible(&counters, &owned(&[])).len(), 2);
    assert!(newly_eligible(&counters, &owned(&[POINTS_100, STREAK_5])).is_empty());

    let only_streak = newly_eligible(&counters, &owned(&[POINTS_100]));
    assert_eq!(only_streak.len(), 1);
    assert_eq!(only_streak[0].id, STREAK_5);
  }

  #[test]
  fn earned_badge_flattens_catalog_fields() {
    let grant = BadgeGrant { badge_id: STREAK_5.into(), earned_at: Utc::now() };
    let earned = EarnedBadge::from_grant(&grant).unwrap();
    let json = serde_json::to_value(&earned).unwrap();
    assert_eq!(json["id"], STREAK_5);
    assert_eq!(json["point_value"], 100);
    assert!(json.get("earned_at").is_some());

    let unknown = BadgeGrant { badge_id: "retired".into(), earned_at: Utc::now() };
    assert!(EarnedBadge::from_grant(&unknown).is_none());
  }
}
