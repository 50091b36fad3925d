//! Handlers for `/owners` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/owners` | Creates an owner at version 0 |
//! | `GET`  | `/owners/:id` | 404 if not found |
//! | `POST` | `/owners/:id/publish` | Bumps the version, publishes every relation |
//! | `POST` | `/owners/:id/rollback` | Reopens the latest published edits |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use weft_core::{
  id::{EditorId, OwnerId},
  owner::Owner,
  store::RelationStore,
};
use weft_engine::{
  EditContext, OwnerLifecycle, PublishOutcome, RollbackOutcome,
};

use crate::error::ApiError;

pub(crate) async fn fetch_owner<S>(
  life: &OwnerLifecycle<S>,
  id: OwnerId,
) -> Result<Owner, ApiError>
where
  S: RelationStore,
{
  life
    .store()
    .get_owner(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("owner {id} not found")))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /owners`
pub async fn create<S>(
  State(life): State<Arc<OwnerLifecycle<S>>>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RelationStore + 'static,
{
  let owner = life
    .store()
    .create_owner()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(owner)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /owners/:id`
pub async fn get_one<S>(
  State(life): State<Arc<OwnerLifecycle<S>>>,
  Path(id): Path<i64>,
) -> Result<Json<Owner>, ApiError>
where
  S: RelationStore + 'static,
{
  let owner = fetch_owner(&life, OwnerId(id)).await?;
  Ok(Json(owner))
}

// ─── Publish / rollback ───────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct TransitionBody {
  pub editor_id: Option<EditorId>,
}

/// `POST /owners/:id/publish` — body (optional): `{"editor_id":5}`
pub async fn publish<S>(
  State(life): State<Arc<OwnerLifecycle<S>>>,
  Path(id): Path<i64>,
  body: Option<Json<TransitionBody>>,
) -> Result<Json<PublishOutcome>, ApiError>
where
  S: RelationStore + 'static,
{
  let owner = fetch_owner(&life, OwnerId(id)).await?;
  let version = life
    .store()
    .bump_owner_version(owner.owner_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let body = body.map(|Json(b)| b).unwrap_or_default();
  let ctx = EditContext::new(body.editor_id, version);
  let outcome = life.publish(&ctx, owner.owner_id).await?;
  Ok(Json(outcome))
}

/// `POST /owners/:id/rollback` — body (optional): `{"editor_id":5}`.
/// Rollback reuses the owner's current version number.
pub async fn rollback<S>(
  State(life): State<Arc<OwnerLifecycle<S>>>,
  Path(id): Path<i64>,
  body: Option<Json<TransitionBody>>,
) -> Result<Json<RollbackOutcome>, ApiError>
where
  S: RelationStore + 'static,
{
  let owner = fetch_owner(&life, OwnerId(id)).await?;
  let body = body.map(|Json(b)| b).unwrap_or_default();
  let ctx = EditContext::new(body.editor_id, owner.version);
  let outcome = life.rollback(&ctx, owner.owner_id).await?;
  Ok(Json(outcome))
}
