//! JSON REST API for weft.
//!
//! Exposes an axum [`Router`] backed by any
//! [`weft_core::store::RelationStore`] through an
//! [`weft_engine::OwnerLifecycle`]. Auth, TLS, and transport concerns are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", weft_api::api_router(lifecycle.clone()))
//! ```

pub mod error;
pub mod items;
pub mod links;
pub mod owners;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post, put},
};
use weft_core::store::RelationStore;
use weft_engine::OwnerLifecycle;

pub use error::ApiError;

/// Build a fully-materialised API router for `lifecycle`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(lifecycle: Arc<OwnerLifecycle<S>>) -> Router<()>
where
  S: RelationStore + 'static,
{
  Router::new()
    // Owners
    .route("/owners", post(owners::create::<S>))
    .route("/owners/{id}", get(owners::get_one::<S>))
    .route("/owners/{id}/publish", post(owners::publish::<S>))
    .route("/owners/{id}/rollback", post(owners::rollback::<S>))
    // Relations & links
    .route("/relations", get(links::relations::<S>))
    .route(
      "/relations/{rel}/owners/{id}/links",
      get(links::list::<S>).post(links::add::<S>),
    )
    .route(
      "/relations/{rel}/owners/{id}/links/{item_id}",
      delete(links::remove::<S>),
    )
    .route(
      "/relations/{rel}/owners/{id}/links/{item_id}/extra",
      put(links::update_extra::<S>),
    )
    // Items
    .route(
      "/items/{id}",
      get(items::get_one::<S>).patch(items::update::<S>),
    )
    .with_state(lifecycle)
}

// ─── Integration tests ────────────────────────────────────────────────────────
