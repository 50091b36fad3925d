//! The `LinkFilter` query type.
//!
//! Filters conjoin: a row matches when every set field matches. `statuses`
//! distinguishes "unrestricted" (`None`) from "match nothing" (`Some` of an
//! empty list); renderers must emit a false predicate for the latter, never
//! drop the restriction.

use crate::{
  id::{EditorId, ItemId, LinkId, OwnerId},
  status::LinkStatus,
};

/// Parameters for link selection, counting, bulk update, and deletion.
#[derive(Debug, Clone, Default)]
pub struct LinkFilter {
  pub relation:       Option<String>,
  pub owner_id:       Option<OwnerId>,
  pub item_id:        Option<ItemId>,
  /// Matches `LiveCopy` rows by the item they stand in for.
  pub linked_item_id: Option<ItemId>,
  pub statuses:       Option<Vec<LinkStatus>>,
  pub editor_id:      Option<EditorId>,
  pub link_id:        Option<LinkId>,
}

impl LinkFilter {
  /// Scope filter for one relation under one owner — the shape every
  /// versioned operation starts from.
  pub fn scoped(relation: impl Into<String>, owner_id: OwnerId) -> Self {
    Self {
      relation: Some(relation.into()),
      owner_id: Some(owner_id),
      ..Self::default()
    }
  }
}
