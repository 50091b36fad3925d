//! Error types for `weft-core`.

use thiserror::Error;

use crate::status::LinkStatus;

#[derive(Debug, Error)]
pub enum Error {
  /// The loosely-typed item identifier a caller passed could not be read as
  /// a numeric id.
  #[error("invalid item id: {0}")]
  InvalidItemId(String),

  #[error("unknown link status: {0:?}")]
  UnknownStatus(String),

  #[error("unknown view: {0:?}")]
  UnknownView(String),

  #[error("status {0} is not mapped to any view list")]
  UnmappedStatus(LinkStatus),

  #[error("status {0} is mapped more than once")]
  DuplicateMapEntry(LinkStatus),

  #[error("at least one status must map to no view at all")]
  AllStatusesVisible,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
