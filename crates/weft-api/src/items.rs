//! Handlers for `/items` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`   | `/items/:id` | 404 if not found |
//! | `PATCH` | `/items/:id` | Merges fields and drives the lifecycle hooks |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use serde::Deserialize;
use weft_core::{
  fields::FieldMap,
  id::{EditorId, ItemId, OwnerId},
  item::Item,
  store::RelationStore,
};
use weft_engine::{EditContext, OwnerLifecycle};

use crate::{error::ApiError, owners::fetch_owner};

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /items/:id`
pub async fn get_one<S>(
  State(life): State<Arc<OwnerLifecycle<S>>>,
  Path(id): Path<i64>,
) -> Result<Json<Item>, ApiError>
where
  S: RelationStore + 'static,
{
  let item = life
    .store()
    .get_item(ItemId(id))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("item {id} not found")))?;
  Ok(Json(item))
}

// ─── Update ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub fields:    FieldMap,
  pub editor_id: Option<EditorId>,
  /// When given, relations linking the item under this owner react to the
  /// save: a published item flips to Editing and grows a shadow.
  pub owner_id:  Option<OwnerId>,
}

/// `PATCH /items/:id`
pub async fn update<S>(
  State(life): State<Arc<OwnerLifecycle<S>>>,
  Path(id): Path<i64>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Item>, ApiError>
where
  S: RelationStore + 'static,
{
  let item = ItemId(id);
  life
    .store()
    .get_item(item)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("item {id} not found")))?;

  life.before_item_write(item, &body.fields).await?;
  let updated = life
    .store()
    .update_item_fields(item, body.fields)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  if let Some(owner_id) = body.owner_id {
    let owner = fetch_owner(&life, owner_id).await?;
    let ctx = EditContext::new(body.editor_id, owner.version);
    life.after_item_write(&ctx, owner.owner_id, item).await?;
  }
  Ok(Json(updated))
}
