//! Error types for `weft-engine`.

use thiserror::Error;
use weft_core::id::{ItemId, OwnerId};

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] weft_core::Error),

  /// An id that parsed fine but resolves to no stored item.
  #[error("unknown item: {0}")]
  UnknownItem(ItemId),

  #[error("no link for item {item} under owner {owner}")]
  LinkNotFound { owner: OwnerId, item: ItemId },

  /// The operation needs an owner but the set was built without one.
  #[error("link set for relation {relation:?} has no owner scope")]
  MissingOwner { relation: String },

  /// A relation name with no definition in the lifecycle registry.
  #[error("unknown relation: {0:?}")]
  UnknownRelation(String),

  /// More than one live shadow claims the same item — the link graph is
  /// inconsistent and the operation refuses to make it worse.
  #[error("item {item} already has a live shadow (item {found})")]
  ShadowConflict { item: ItemId, found: ItemId },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error. The engine is generic over the store, so its
  /// error type is erased here.
  pub(crate) fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
