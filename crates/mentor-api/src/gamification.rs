//! Handlers for `/gamification` and `/badges` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/gamification/:user_id` | Stats, badges, recent points, next milestone |
//! | `GET`  | `/gamification/:user_id/points` | Optional `?limit=<n>` on the history |
//! | `GET`  | `/gamification/:user_id/badges` | Earned badges in grant order |
//! | `POST` | `/gamification/points` | Body: [`PointsBody`] |
//! | `POST` | `/gamification/badges` | Body: [`BadgeBody`]; 400 on unknown badge |
//! | `GET`  | `/badges` | The static catalog |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use mentor_core::{
  MasteryEngine,
  badge::{Badge, EarnedBadge},
  ledger::{LedgerUpdate, PointsEntry},
  store::MasteryStore,
  summary::GamificationSummary,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// ─── Summary ──────────────────────────────────────────────────────────────────

/// `GET /gamification/:user_id`
pub async fn summary<S>(
  State(engine): State<Arc<MasteryEngine<S>>>,
  Path(user_id): Path<String>,
) -> Result<Json<GamificationSummary>, ApiError>
where
  S: MasteryStore + 'static,
{
  Ok(Json(engine.gamification_summary(&user_id).await?))
}

// ─── Points ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
  pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PointsView {
  pub user_id:      String,
  pub total_points: i64,
  /// Oldest first.
  pub history:      Vec<PointsEntry>,
}

/// `GET /gamification/:user_id/points[?limit=<n>]`
pub async fn points<S>(
  State(engine): State<Arc<MasteryEngine<S>>>,
  Path(user_id): Path<String>,
  Query(params): Query<HistoryParams>,
) -> Result<Json<PointsView>, ApiError>
where
  S: MasteryStore + 'static,
{
  let total_points = engine.get_total(&user_id).await?;
  let history = engine.points_history(&user_id, params.limit).await?;
  Ok(Json(PointsView { user_id, total_points, history }))
}

#[derive(Debug, Deserialize)]
pub struct PointsBody {
  pub user_id: String,
  pub points:  i64,
  pub reason:  String,
}

/// `POST /gamification/points`
pub async fn add_points<S>(
  State(engine): State<Arc<MasteryEngine<S>>>,
  Json(body): Json<PointsBody>,
) -> Result<Json<LedgerUpdate>, ApiError>
where
  S: MasteryStore + 'static,
{
  Ok(Json(engine.add_points(&body.user_id, body.points, &body.reason).await?))
}

// ─── Badges ───────────────────────────────────────────────────────────────────

/// `GET /gamification/:user_id/badges`
pub async fn badges<S>(
  State(engine): State<Arc<MasteryEngine<S>>>,
  Path(user_id): Path<String>,
) -> Result<Json<Vec<EarnedBadge>>, ApiError>
where
  S: MasteryStore + 'static,
{
  Ok(Json(engine.get_badges(&user_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct BadgeBody {
  pub user_id:  String,
  pub badge_id: String,
}

/// `POST /gamification/badges`
pub async fn award_badge<S>(
  State(engine): State<Arc<MasteryEngine<S>>>,
  Json(body): Json<BadgeBody>,
) -> Result<Json<LedgerUpdate>, ApiError>
where
  S: MasteryStore + 'static,
{
  Ok(Json(engine.award_badge(&body.user_id, &body.badge_id).await?))
}

/// `GET /badges`
pub async fn catalog<S>(State(engine): State<Arc<MasteryEngine<S>>>) -> Json<&'static [Badge]>
where
  S: MasteryStore + 'static,
{
  Json(engine.catalog())
}
