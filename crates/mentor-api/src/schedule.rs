//! Handlers for `/spaced-repetition` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/spaced-repetition/:user_id` | Full schedule plus the due subset |
//! | `GET`  | `/spaced-repetition/:user_id/due` | Due entries only |
//! | `POST` | `/spaced-repetition/update` | Body: [`ReviewBody`]; 400 on unknown performance |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use mentor_core::{
  MasteryEngine,
  review::{Performance, ScheduleEntry},
  store::MasteryStore,
  summary::{ReviewOutcome, ScheduleView},
};
use serde::Deserialize;

use crate::error::ApiError;

// ─── Schedule ─────────────────────────────────────────────────────────────────

/// `GET /spaced-repetition/:user_id`
pub async fn get_schedule<S>(
  State(engine): State<Arc<MasteryEngine<S>>>,
  Path(user_id): Path<String>,
) -> Result<Json<ScheduleView>, ApiError>
where
  S: MasteryStore + 'static,
{
  let schedule = engine.get_schedule(&user_id).await?;
  Ok(Json(ScheduleView::from(schedule)))
}

/// `GET /spaced-repetition/:user_id/due`
pub async fn get_due<S>(
  State(engine): State<Arc<MasteryEngine<S>>>,
  Path(user_id): Path<String>,
) -> Result<Json<Vec<ScheduleEntry>>, ApiError>
where
  S: MasteryStore + 'static,
{
  Ok(Json(engine.get_due_items(&user_id).await?))
}

// ─── Review ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
  pub user_id:     String,
  pub item_id:     String,
  /// Kept as a string so an unknown value is a 400 rather than a body
  /// rejection.
  pub performance: String,
}

/// `POST /spaced-repetition/update`
pub async fn submit_review<S>(
  State(engine): State<Arc<MasteryEngine<S>>>,
  Json(body): Json<ReviewBody>,
) -> Result<Json<ReviewOutcome>, ApiError>
where
  S: MasteryStore + 'static,
{
  let performance = Performance::parse(&body.performance)?;
  let outcome = engine.submit_review(&body.user_id, &body.item_id, performance).await?;
  Ok(Json(outcome))
}
