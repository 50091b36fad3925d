//! Server assembly for weft.
//!
//! Glues the pieces together: a [`ServerConfig`] read from `config.toml`,
//! an [`OwnerLifecycle`] over the configured relations, and the JSON API
//! mounted under `/api`.

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use weft_engine::{OwnerLifecycle, RelationDef};
use weft_store_sqlite::SqliteStore;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,

  /// Relation names served under `/api/relations/{rel}/`.
  pub relations: Vec<String>,

  /// Item fields whose edits count as content changes. All fields count
  /// when unset.
  #[serde(default)]
  pub tracked_fields: Option<Vec<String>>,
}

// ─── Application assembly ─────────────────────────────────────────────────────

/// Build the lifecycle engine over `store` for the configured relations.
pub fn lifecycle(
  store: Arc<SqliteStore>,
  config: &ServerConfig,
) -> Arc<OwnerLifecycle<SqliteStore>> {
  let relations = config
    .relations
    .iter()
    .map(|name| RelationDef::new(name.clone()))
    .collect();
  let mut life = OwnerLifecycle::new(store, relations);
  if let Some(tracked) = &config.tracked_fields {
    life = life.tracked_fields(tracked.clone());
  }
  Arc::new(life)
}

/// Build the top-level router: the JSON API under `/api`, with request
/// traces on every route.
pub fn router(lifecycle: Arc<OwnerLifecycle<SqliteStore>>) -> Router {
  Router::new()
    .nest("/api", weft_api::api_router(lifecycle))
    .layer(TraceLayer::new_for_http())
}

// ─── Tests ────────────────────────────────────────────────────────────────────
