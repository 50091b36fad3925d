//! Link rows — the relationship instances between owners and items.
//!
//! One table holds every relationship and doubles as its own history
//! mechanism: a shadow pair is two rows, the edited item's row (`Editing`)
//! and its duplicate's row (`LiveCopy`) whose `linked_item_id` points back
//! at the edited item.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  fields::FieldMap,
  id::{EditorId, ItemId, LinkId, OwnerId, Version},
  status::LinkStatus,
};

// ─── Link ────────────────────────────────────────────────────────────────────

/// One stored relationship between an owner and an item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
  pub link_id:        LinkId,
  /// Name of the relationship this row belongs to.
  pub relation:       String,
  pub owner_id:       OwnerId,
  pub item_id:        ItemId,
  pub status:         LinkStatus,
  /// For a `LiveCopy` row, the item this shadow stands in for.
  pub linked_item_id: Option<ItemId>,
  pub editor_id:      Option<EditorId>,
  /// Owner version current when this row was last written.
  pub version:        Version,
  /// Free-form payload carried on the link itself; copied across shadow
  /// duplication.
  pub extra:          FieldMap,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

// ─── NewLink ─────────────────────────────────────────────────────────────────

/// Input to link inserts and upserts. Timestamps are store-assigned.
#[derive(Debug, Clone)]
pub struct NewLink {
  pub relation:       String,
  pub owner_id:       OwnerId,
  pub item_id:        ItemId,
  pub status:         LinkStatus,
  pub linked_item_id: Option<ItemId>,
  pub editor_id:      Option<EditorId>,
  pub version:        Version,
  pub extra:          FieldMap,
}

impl NewLink {
  /// Convenience constructor with the optional columns empty.
  pub fn new(
    relation: impl Into<String>,
    owner_id: OwnerId,
    item_id: ItemId,
    status: LinkStatus,
  ) -> Self {
    Self {
      relation: relation.into(),
      owner_id,
      item_id,
      status,
      linked_item_id: None,
      editor_id: None,
      version: Version(0),
      extra: FieldMap::new(),
    }
  }
}

// ─── LinkPatch ───────────────────────────────────────────────────────────────

/// Partial update applied to every link row matched by a filter.
///
/// The nullable columns use doubled options: the outer level is "change this
/// column at all", the inner level is the stored value.
#[derive(Debug, Clone, Default)]
pub struct LinkPatch {
  pub status:         Option<LinkStatus>,
  pub linked_item_id: Option<Option<ItemId>>,
  pub editor_id:      Option<Option<EditorId>>,
  pub version:        Option<Version>,
  pub extra:          Option<FieldMap>,
}

impl LinkPatch {
  pub fn is_empty(&self) -> bool {
    self.status.is_none()
      && self.linked_item_id.is_none()
      && self.editor_id.is_none()
      && self.version.is_none()
      && self.extra.is_none()
  }
}

// ─── AddTarget ───────────────────────────────────────────────────────────────

/// What an add should link: an existing item by id, or a new item created
/// from field values.
#[derive(Debug, Clone)]
pub enum AddTarget {
  Existing(ItemId),
  New(FieldMap),
}

impl AddTarget {
  /// Accepts the loosely-typed forms callers send: a JSON number or numeric
  /// string selects an existing item; an object creates a new one.
  pub fn from_value(value: &serde_json::Value) -> Result<Self> {
    match value {
      serde_json::Value::Object(fields) => Ok(Self::New(
        fields.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
      )),
      serde_json::Value::Number(_) | serde_json::Value::String(_) => {
        Ok(Self::Existing(ItemId::from_value(value)?))
      }
      other => Err(Error::InvalidItemId(other.to_string())),
    }
  }
}
