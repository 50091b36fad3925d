//! [`LinkSet`] — the plain link-query/update primitive.
//!
//! A `LinkSet` is a relation name plus an optional owner scope, bound to a
//! store. It attaches no meaning to statuses; the versioned state machine
//! composes on top of it. Non-versioned relationships use it directly:
//! their links go straight to Published and never grow shadows.

use std::sync::Arc;

use weft_core::{
  fields::{self, FieldMap},
  filter::LinkFilter,
  id::{ItemId, OwnerId},
  link::{Link, NewLink},
  status::{LinkStatus, StatusViewMap, View},
  store::RelationStore,
};

use crate::{Error, Result};

pub struct LinkSet<S> {
  store:    Arc<S>,
  relation: String,
  owner:    Option<OwnerId>,
}

// Not derived: `S` itself does not need to be `Clone` behind the `Arc`.
impl<S> Clone for LinkSet<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      relation: self.relation.clone(),
      owner:    self.owner,
    }
  }
}

impl<S: RelationStore> LinkSet<S> {
  pub fn new(
    store: Arc<S>,
    relation: impl Into<String>,
    owner: Option<OwnerId>,
  ) -> Self {
    Self {
      store,
      relation: relation.into(),
      owner,
    }
  }

  pub fn relation(&self) -> &str {
    &self.relation
  }

  pub fn owner(&self) -> Option<OwnerId> {
    self.owner
  }

  pub(crate) fn store(&self) -> &Arc<S> {
    &self.store
  }

  /// The scope filter: relation plus owner when present.
  pub fn filter(&self) -> LinkFilter {
    LinkFilter {
      relation: Some(self.relation.clone()),
      owner_id: self.owner,
      ..LinkFilter::default()
    }
  }

  fn require_owner(&self) -> Result<OwnerId> {
    self.owner.ok_or_else(|| Error::MissingOwner {
      relation: self.relation.clone(),
    })
  }

  pub(crate) async fn resolve_item(&self, item: ItemId) -> Result<ItemId> {
    match self.store.get_item(item).await.map_err(Error::store)? {
      Some(_) => Ok(item),
      None => Err(Error::UnknownItem(item)),
    }
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  /// All links in scope, ordered by row id.
  pub async fn links(&self) -> Result<Vec<Link>> {
    self
      .store
      .select_links(&self.filter())
      .await
      .map_err(Error::store)
  }

  pub async fn count(&self) -> Result<u64> {
    self
      .store
      .count_links(&self.filter())
      .await
      .map_err(Error::store)
  }

  /// The link row for `item`, if any. Requires an owner scope; without one
  /// the row would be ambiguous.
  pub async fn link_for(&self, item: ItemId) -> Result<Option<Link>> {
    self.require_owner()?;
    let filter = LinkFilter {
      item_id: Some(item),
      ..self.filter()
    };
    let mut links = self
      .store
      .select_links(&filter)
      .await
      .map_err(Error::store)?;
    Ok(links.pop())
  }

  /// Compute the filter serving `view`: the scope restricted to the
  /// statuses `map` puts in that view, or to `explicit` when given. The
  /// status restriction is always present — an empty list matches nothing.
  pub fn view_filter(
    &self,
    map: &StatusViewMap,
    view: View,
    explicit: Option<&[LinkStatus]>,
  ) -> LinkFilter {
    let statuses = match explicit {
      Some(list) => list.to_vec(),
      None => map.statuses_in(view),
    };
    LinkFilter {
      statuses: Some(statuses),
      ..self.filter()
    }
  }

  /// Links as served by `view`.
  pub async fn links_in(
    &self,
    map: &StatusViewMap,
    view: View,
    explicit: Option<&[LinkStatus]>,
  ) -> Result<Vec<Link>> {
    let filter = self.view_filter(map, view, explicit);
    self
      .store
      .select_links(&filter)
      .await
      .map_err(Error::store)
  }

  // ── Writes ────────────────────────────────────────────────────────────

  /// Link `item` into the set as Published — the plain, non-versioned add.
  pub async fn add(&self, item: ItemId, extra: FieldMap) -> Result<Link> {
    let owner = self.require_owner()?;
    let item = self.resolve_item(item).await?;
    let mut link =
      NewLink::new(self.relation.clone(), owner, item, LinkStatus::Published);
    link.extra = extra;
    self.upsert(link).await
  }

  /// Raw upsert. The caller owns the status semantics.
  pub async fn upsert(&self, link: NewLink) -> Result<Link> {
    self.store.upsert_link(link).await.map_err(Error::store)
  }

  /// Delete the link row for `item`. The item record itself stays.
  pub async fn remove(&self, item: ItemId) -> Result<u64> {
    let owner = self.require_owner()?;
    let filter = LinkFilter {
      item_id: Some(item),
      ..self.filter()
    };
    let deleted = self
      .store
      .delete_links(&filter)
      .await
      .map_err(Error::store)?;
    if deleted == 0 {
      return Err(Error::LinkNotFound { owner, item });
    }
    Ok(deleted)
  }

  /// Replace the extra payload on `item`'s link, leaving every other column
  /// as it is.
  pub async fn update_extra(
    &self,
    item: ItemId,
    extra: FieldMap,
  ) -> Result<Link> {
    let owner = self.require_owner()?;
    let current = self
      .link_for(item)
      .await?
      .ok_or(Error::LinkNotFound { owner, item })?;
    self
      .upsert(NewLink {
        relation:       current.relation,
        owner_id:       current.owner_id,
        item_id:        current.item_id,
        status:         current.status,
        linked_item_id: current.linked_item_id,
        editor_id:      current.editor_id,
        version:        current.version,
        extra,
      })
      .await
  }

  /// Merge `patch` over the link's current extra payload.
  pub async fn merge_extra(
    &self,
    item: ItemId,
    patch: &FieldMap,
  ) -> Result<Link> {
    let owner = self.require_owner()?;
    let current = self
      .link_for(item)
      .await?
      .ok_or(Error::LinkNotFound { owner, item })?;
    let merged = fields::merge(&current.extra, patch);
    self.update_extra(item, merged).await
  }
}
