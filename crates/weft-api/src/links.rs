//! Handlers for relation listing and `/links` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/relations` | Configured relation names |
//! | `GET`    | `/relations/:rel/owners/:id/links` | Optional `?view=` and `?statuses=` |
//! | `POST`   | `/relations/:rel/owners/:id/links` | Body: `{"item":…,"extra":…,"editor_id":…}` |
//! | `DELETE` | `/relations/:rel/owners/:id/links/:item_id` | Optional `?editor_id=` |
//! | `PUT`    | `/relations/:rel/owners/:id/links/:item_id/extra` | Body: the new payload |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use weft_core::{
  fields::FieldMap,
  filter::LinkFilter,
  id::{EditorId, ItemId, OwnerId},
  link::{AddTarget, Link},
  status::{LinkStatus, View},
  store::RelationStore,
};
use weft_engine::{EditContext, OwnerLifecycle};

use crate::{error::ApiError, owners::fetch_owner};

// ─── Relations ────────────────────────────────────────────────────────────────

/// `GET /relations`
pub async fn relations<S>(
  State(life): State<Arc<OwnerLifecycle<S>>>,
) -> Json<Vec<String>>
where
  S: RelationStore + 'static,
{
  Json(life.relations().iter().map(|def| def.name.clone()).collect())
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub view:     Option<String>,
  /// Comma-separated status names; overrides the view's mapping entirely.
  pub statuses: Option<String>,
}

fn parse_statuses(raw: &str) -> Result<Vec<LinkStatus>, ApiError> {
  raw
    .split(',')
    .filter(|part| !part.trim().is_empty())
    .map(|part| LinkStatus::parse(part.trim()).map_err(ApiError::from))
    .collect()
}

/// `GET /relations/:rel/owners/:id/links[?view=…][&statuses=…]`
pub async fn list<S>(
  State(life): State<Arc<OwnerLifecycle<S>>>,
  Path((rel, id)): Path<(String, i64)>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Link>>, ApiError>
where
  S: RelationStore + 'static,
{
  let owner = fetch_owner(&life, OwnerId(id)).await?;
  let versioned = life.versioned(&rel, owner.owner_id)?;
  let statuses = match params.statuses.as_deref() {
    Some(raw) => Some(parse_statuses(raw)?),
    None => None,
  };
  let links = match params.view.as_deref() {
    Some(name) => {
      let view = View::parse(name)?;
      versioned.links_in(view, statuses.as_deref()).await?
    }
    None => {
      let filter = LinkFilter {
        statuses,
        ..versioned.set().filter()
      };
      life
        .store()
        .select_links(&filter)
        .await
        .map_err(|e| ApiError::Store(Box::new(e)))?
    }
  };
  Ok(Json(links))
}

// ─── Add ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AddBody {
  /// An existing item id (number or numeric string), or an object of field
  /// values for a brand-new item.
  pub item:      serde_json::Value,
  #[serde(default)]
  pub extra:     FieldMap,
  pub editor_id: Option<EditorId>,
}

/// `POST /relations/:rel/owners/:id/links`
pub async fn add<S>(
  State(life): State<Arc<OwnerLifecycle<S>>>,
  Path((rel, id)): Path<(String, i64)>,
  Json(body): Json<AddBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RelationStore + 'static,
{
  let owner = fetch_owner(&life, OwnerId(id)).await?;
  let versioned = life.versioned(&rel, owner.owner_id)?;
  let target = AddTarget::from_value(&body.item)?;
  // a snapshot taken by an earlier item save feeds the shadow's fields
  let pre_edit = match &target {
    AddTarget::Existing(item) => life.snapshot(*item),
    AddTarget::New(_) => None,
  };
  let ctx = EditContext::new(body.editor_id, owner.version);
  let link = versioned.add(&ctx, target, body.extra, pre_edit).await?;
  Ok((StatusCode::CREATED, Json(link)))
}

// ─── Remove ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RemoveParams {
  pub editor_id: Option<EditorId>,
}

/// `DELETE /relations/:rel/owners/:id/links/:item_id[?editor_id=…]`
pub async fn remove<S>(
  State(life): State<Arc<OwnerLifecycle<S>>>,
  Path((rel, id, item_id)): Path<(String, i64, String)>,
  Query(params): Query<RemoveParams>,
) -> Result<StatusCode, ApiError>
where
  S: RelationStore + 'static,
{
  let owner = fetch_owner(&life, OwnerId(id)).await?;
  let versioned = life.versioned(&rel, owner.owner_id)?;
  let item: ItemId = item_id.parse()?;
  let ctx = EditContext::new(params.editor_id, owner.version);
  versioned.remove_by_id(&ctx, item).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Extra payload ────────────────────────────────────────────────────────────

/// `PUT /relations/:rel/owners/:id/links/:item_id/extra` — replaces the
/// link's extra payload wholesale.
pub async fn update_extra<S>(
  State(life): State<Arc<OwnerLifecycle<S>>>,
  Path((rel, id, item_id)): Path<(String, i64, String)>,
  Json(extra): Json<FieldMap>,
) -> Result<Json<Link>, ApiError>
where
  S: RelationStore + 'static,
{
  let owner = fetch_owner(&life, OwnerId(id)).await?;
  let versioned = life.versioned(&rel, owner.owner_id)?;
  let item: ItemId = item_id.parse()?;
  let link = versioned.set().update_extra(item, extra).await?;
  Ok(Json(link))
}
