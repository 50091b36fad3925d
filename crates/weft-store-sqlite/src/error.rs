//! Error type for `weft-store-sqlite`.

use thiserror::Error;
use weft_core::id::{ItemId, OwnerId};

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] weft_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("owner not found: {0}")]
  OwnerNotFound(OwnerId),

  #[error("item not found: {0}")]
  ItemNotFound(ItemId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
