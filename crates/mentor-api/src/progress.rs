//! `PUT /progress/:user_id` — body: `{"current_streak": 5}`.
//!
//! Streak tracking lives outside this service; the caller reports the
//! current value and gets back any badge it unlocked.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use mentor_core::{MasteryEngine, badge::Badge, store::MasteryStore};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ProgressBody {
  /// Signed so that a negative value is a 400 instead of a body rejection.
  pub current_streak: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressView {
  pub user_id:        String,
  pub current_streak: u32,
  pub badges_earned:  Vec<Badge>,
}

pub async fn handler<S>(
  State(engine): State<Arc<MasteryEngine<S>>>,
  Path(user_id): Path<String>,
  Json(body): Json<ProgressBody>,
) -> Result<Json<ProgressView>, ApiError>
where
  S: MasteryStore + 'static,
{
  let current_streak = u32::try_from(body.current_streak).map_err(|_| {
    ApiError::BadRequest(format!("current_streak out of range: {}", body.current_streak))
  })?;
  let badges_earned = engine.record_streak(&user_id, current_streak).await?;
  Ok(Json(ProgressView { user_id, current_streak, badges_earned }))
}
