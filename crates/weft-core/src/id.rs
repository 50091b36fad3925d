//! Numeric identifier newtypes.
//!
//! Owners, items, editors, and link rows live in distinct id spaces; the
//! newtypes keep them from being mixed up at compile time. All are backed
//! by `i64` row ids.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Identifier of an owner record.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct OwnerId(pub i64);

impl fmt::Display for OwnerId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}

/// Identifier of an item record.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl ItemId {
  /// Read an id from the loosely-typed forms callers send: a JSON number or
  /// a numeric string. Everything else is [`Error::InvalidItemId`].
  pub fn from_value(value: &serde_json::Value) -> Result<Self> {
    match value {
      serde_json::Value::Number(n) => n
        .as_i64()
        .map(Self)
        .ok_or_else(|| Error::InvalidItemId(value.to_string())),
      serde_json::Value::String(s) => s.parse(),
      other => Err(Error::InvalidItemId(other.to_string())),
    }
  }
}

impl FromStr for ItemId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    s.trim()
      .parse::<i64>()
      .map(Self)
      .map_err(|_| Error::InvalidItemId(s.to_string()))
  }
}

impl fmt::Display for ItemId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}

/// Identifier of the person (or system) editing an owner's draft.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct EditorId(pub i64);

impl fmt::Display for EditorId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}

/// Surrogate key of a link row.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct LinkId(pub i64);

impl fmt::Display for LinkId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}

/// Monotonically increasing owner version number.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct Version(pub i64);

impl Version {
  pub fn next(self) -> Self {
    Self(self.0 + 1)
  }
}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}
