//! [`VersionedLinkSet`] — the lifecycle state machine over a [`LinkSet`].
//!
//! Adds move links to Editing and shadow published items so the Public view
//! keeps serving the pre-edit state; removes reconcile shadow pairs back to
//! a single Published row; publish and rollback flip whole link sets between
//! the two. Every multi-row conclusion is written through one atomic store
//! batch, under the owner's lock.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use weft_core::{
  fields::{self, FieldMap},
  filter::LinkFilter,
  id::{EditorId, ItemId, LinkId, OwnerId, Version},
  link::{AddTarget, Link, LinkPatch, NewLink},
  status::{LinkStatus, StatusViewMap, View},
  store::{RelationStore, StoreOp},
};

use crate::{Error, Result, locks::OwnerLocks, set::LinkSet};

// ─── Context & outcomes ──────────────────────────────────────────────────────

/// Who is editing and at which owner version. Carried explicitly on every
/// call; the engine has no ambient session.
#[derive(Debug, Clone, Copy)]
pub struct EditContext {
  pub editor:  Option<EditorId>,
  pub version: Version,
}

impl EditContext {
  pub fn new(editor: Option<EditorId>, version: Version) -> Self {
    Self { editor, version }
  }
}

/// What a publish changed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PublishOutcome {
  /// Items whose links went Editing → Published.
  pub published:        Vec<ItemId>,
  /// Shadow items whose links went LiveCopy → Archived.
  pub archived_shadows: Vec<ItemId>,
}

impl PublishOutcome {
  pub fn is_noop(&self) -> bool {
    self.published.is_empty() && self.archived_shadows.is_empty()
  }

  pub(crate) fn absorb(&mut self, other: PublishOutcome) {
    self.published.extend(other.published);
    self.archived_shadows.extend(other.archived_shadows);
  }
}

/// What a rollback changed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RollbackOutcome {
  /// Items whose links went Published → Editing.
  pub reopened:         Vec<ItemId>,
  /// Shadow items whose links went Archived → LiveCopy.
  pub restored_shadows: Vec<ItemId>,
}

impl RollbackOutcome {
  pub fn is_noop(&self) -> bool {
    self.reopened.is_empty() && self.restored_shadows.is_empty()
  }

  pub(crate) fn absorb(&mut self, other: RollbackOutcome) {
    self.reopened.extend(other.reopened);
    self.restored_shadows.extend(other.restored_shadows);
  }
}

fn by_id(link_id: LinkId) -> LinkFilter {
  LinkFilter {
    link_id: Some(link_id),
    ..LinkFilter::default()
  }
}

// ─── VersionedLinkSet ────────────────────────────────────────────────────────

/// One relation under one owner, with lifecycle semantics.
pub struct VersionedLinkSet<S> {
  set:   LinkSet<S>,
  owner: OwnerId,
  map:   StatusViewMap,
  locks: Arc<OwnerLocks>,
}

impl<S: RelationStore> VersionedLinkSet<S> {
  /// Wrap `set` in the state machine. The set must be owner-scoped.
  pub fn new(
    set: LinkSet<S>,
    map: StatusViewMap,
    locks: Arc<OwnerLocks>,
  ) -> Result<Self> {
    let owner = set.owner().ok_or_else(|| Error::MissingOwner {
      relation: set.relation().to_owned(),
    })?;
    Ok(Self {
      set,
      owner,
      map,
      locks,
    })
  }

  /// The underlying plain link set (for extra-payload updates and raw
  /// queries).
  pub fn set(&self) -> &LinkSet<S> {
    &self.set
  }

  pub fn owner(&self) -> OwnerId {
    self.owner
  }

  /// The ordered status list.
  pub fn states(&self) -> &'static [LinkStatus] {
    &LinkStatus::ALL
  }

  pub fn status_view_map(&self) -> &StatusViewMap {
    &self.map
  }

  /// See [`LinkSet::view_filter`].
  pub fn view_filter(
    &self,
    view: View,
    explicit: Option<&[LinkStatus]>,
  ) -> LinkFilter {
    self.set.view_filter(&self.map, view, explicit)
  }

  pub async fn links(&self) -> Result<Vec<Link>> {
    self.set.links().await
  }

  /// Links as served by `view` under this set's status map.
  pub async fn links_in(
    &self,
    view: View,
    explicit: Option<&[LinkStatus]>,
  ) -> Result<Vec<Link>> {
    self.set.links_in(&self.map, view, explicit).await
  }

  /// The live shadow standing in for `item`, if any. Finding two is a
  /// broken graph and surfaces as [`Error::ShadowConflict`].
  pub async fn live_shadow_for(&self, item: ItemId) -> Result<Option<Link>> {
    let filter = LinkFilter {
      linked_item_id: Some(item),
      statuses: Some(vec![LinkStatus::LiveCopy]),
      ..self.set.filter()
    };
    let mut shadows = self
      .set
      .store()
      .select_links(&filter)
      .await
      .map_err(Error::store)?;
    if let Some(second) = shadows.get(1) {
      warn!(
        item = item.0,
        found = second.item_id.0,
        "item has more than one live shadow"
      );
      return Err(Error::ShadowConflict {
        item,
        found: second.item_id,
      });
    }
    Ok(shadows.pop())
  }

  async fn archived_shadows_for(&self, item: ItemId) -> Result<Vec<Link>> {
    let filter = LinkFilter {
      linked_item_id: Some(item),
      statuses: Some(vec![LinkStatus::Archived]),
      ..self.set.filter()
    };
    self
      .set
      .store()
      .select_links(&filter)
      .await
      .map_err(Error::store)
  }

  // ── add ───────────────────────────────────────────────────────────────

  /// Link an item (existing or newly created) as an edit in progress.
  ///
  /// When the item is currently Published and not yet shadowed, a duplicate
  /// carrying the pre-edit field values (`pre_edit` if supplied, else the
  /// stored values) is created and linked as the LiveCopy serving the
  /// Public view in the item's place. The item's own link then becomes
  /// Editing under `ctx`'s editor and version, its extra payload overlaid
  /// with `extra`. Everything except the duplicate's creation is one atomic
  /// batch; a failure after it leaves only an orphan record visible in no
  /// view.
  pub async fn add(
    &self,
    ctx: &EditContext,
    target: AddTarget,
    extra: FieldMap,
    pre_edit: Option<FieldMap>,
  ) -> Result<Link> {
    let lock = self.locks.for_owner(self.owner);
    let _guard = lock.lock().await;

    let item = match target {
      AddTarget::Existing(id) => self.set.resolve_item(id).await?,
      AddTarget::New(fields) => {
        let created = self
          .set
          .store()
          .create_item(fields)
          .await
          .map_err(Error::store)?;
        created.item_id
      }
    };

    let existing = self.set.link_for(item).await?;
    let shadow = self.live_shadow_for(item).await?;

    let mut ops = Vec::new();

    if let Some(published) = existing.as_ref() {
      if shadow.is_none() && published.status == LinkStatus::Published {
        let pre = match pre_edit {
          Some(fields) => fields,
          None => self
            .set
            .store()
            .item_fields(item)
            .await
            .map_err(Error::store)?
            .ok_or(Error::UnknownItem(item))?,
        };
        let copy = self
          .set
          .store()
          .duplicate_item(item, Some(pre))
          .await
          .map_err(Error::store)?;
        debug!(
          relation = self.set.relation(),
          owner = self.owner.0,
          item = item.0,
          shadow = copy.item_id.0,
          "shadowing published item for edit"
        );
        ops.push(StoreOp::InsertLink(NewLink {
          relation:       self.set.relation().to_owned(),
          owner_id:       self.owner,
          item_id:        copy.item_id,
          status:         LinkStatus::LiveCopy,
          linked_item_id: Some(item),
          editor_id:      ctx.editor,
          version:        ctx.version,
          extra:          published.extra.clone(),
        }));
        ops.push(StoreOp::WriteItemToView {
          item_id: copy.item_id,
          view:    View::Draft,
        });
        ops.push(StoreOp::WriteItemToView {
          item_id: copy.item_id,
          view:    View::Public,
        });
        ops.push(StoreOp::DeleteItemFromView {
          item_id: item,
          view:    View::Public,
        });
      }
    }

    let merged_extra = match existing.as_ref() {
      Some(link) => fields::merge(&link.extra, &extra),
      None => extra,
    };

    ops.push(StoreOp::UpsertLink(NewLink {
      relation:       self.set.relation().to_owned(),
      owner_id:       self.owner,
      item_id:        item,
      status:         LinkStatus::Editing,
      linked_item_id: None,
      editor_id:      ctx.editor,
      version:        ctx.version,
      extra:          merged_extra,
    }));
    ops.push(StoreOp::WriteItemToView {
      item_id: item,
      view:    View::Draft,
    });

    self.set.store().apply(ops).await.map_err(Error::store)?;

    self.set.link_for(item).await?.ok_or(Error::LinkNotFound {
      owner: self.owner,
      item,
    })
  }

  // ── remove_by_id ──────────────────────────────────────────────────────

  /// Unlink `item`, reconciling any shadow pair back to a single Published
  /// row.
  ///
  /// With a live shadow: the item takes the shadow's field values back
  /// exactly, returns to both views, and its link becomes Published again;
  /// the shadow loses its link row and Public presence (the shadow record
  /// stays stored, visible nowhere). Without one, the link row is deleted,
  /// and the item record too when it is this editor's never-published
  /// draft. All writes are one atomic batch.
  pub async fn remove_by_id(
    &self,
    ctx: &EditContext,
    item: ItemId,
  ) -> Result<()> {
    let lock = self.locks.for_owner(self.owner);
    let _guard = lock.lock().await;

    let item = self.set.resolve_item(item).await?;
    let link = self.set.link_for(item).await?.ok_or(Error::LinkNotFound {
      owner: self.owner,
      item,
    })?;
    let shadow = self.live_shadow_for(item).await?;

    let mut ops = Vec::new();
    match shadow {
      Some(shadow) => {
        let restored = self
          .set
          .store()
          .item_fields(shadow.item_id)
          .await
          .map_err(Error::store)?
          .ok_or(Error::UnknownItem(shadow.item_id))?;
        debug!(
          relation = self.set.relation(),
          owner = self.owner.0,
          item = item.0,
          shadow = shadow.item_id.0,
          "restoring pre-edit state from shadow"
        );
        ops.push(StoreOp::ReplaceItemFields {
          item_id: item,
          fields:  restored,
        });
        ops.push(StoreOp::WriteItemToView {
          item_id: item,
          view:    View::Draft,
        });
        ops.push(StoreOp::WriteItemToView {
          item_id: item,
          view:    View::Public,
        });
        ops.push(StoreOp::DeleteItemFromView {
          item_id: shadow.item_id,
          view:    View::Public,
        });
        ops.push(StoreOp::DeleteLinks {
          filter: by_id(shadow.link_id),
        });
        ops.push(StoreOp::UpdateLinks {
          filter: by_id(link.link_id),
          patch:  LinkPatch {
            status: Some(LinkStatus::Published),
            editor_id: Some(None),
            ..LinkPatch::default()
          },
        });
      }
      None => {
        ops.push(StoreOp::DeleteLinks {
          filter: by_id(link.link_id),
        });
        // `None == None` must not count as "same editor".
        let own_draft = link.status == LinkStatus::Editing
          && link.editor_id.is_some()
          && link.editor_id == ctx.editor;
        if own_draft {
          ops.push(StoreOp::DeleteItem { item_id: item });
        }
      }
    }

    self.set.store().apply(ops).await.map_err(Error::store)?;
    Ok(())
  }

  // ── publish ───────────────────────────────────────────────────────────

  /// Promote every Editing link to Published, archiving live shadows.
  ///
  /// Per edited item: the shadow (if any) leaves the Public view and its
  /// link becomes Archived; the item's link becomes Published at `ctx`'s
  /// version with no editor; the item is written to every view mapped to
  /// Published and removed from the rest. One atomic batch for the whole
  /// set. With nothing in Editing this is a no-op.
  pub async fn publish_items(
    &self,
    ctx: &EditContext,
  ) -> Result<PublishOutcome> {
    let lock = self.locks.for_owner(self.owner);
    let _guard = lock.lock().await;

    let editing_filter = LinkFilter {
      statuses: Some(vec![LinkStatus::Editing]),
      ..self.set.filter()
    };
    let editing = self
      .set
      .store()
      .select_links(&editing_filter)
      .await
      .map_err(Error::store)?;

    let mut outcome = PublishOutcome::default();
    let mut ops = Vec::new();
    for link in &editing {
      if let Some(shadow) = self.live_shadow_for(link.item_id).await? {
        ops.push(StoreOp::DeleteItemFromView {
          item_id: shadow.item_id,
          view:    View::Public,
        });
        // `linked_item_id` stays set so rollback can find the history.
        ops.push(StoreOp::UpdateLinks {
          filter: by_id(shadow.link_id),
          patch:  LinkPatch {
            status: Some(LinkStatus::Archived),
            ..LinkPatch::default()
          },
        });
        outcome.archived_shadows.push(shadow.item_id);
      }
      ops.push(StoreOp::UpdateLinks {
        filter: by_id(link.link_id),
        patch:  LinkPatch {
          status: Some(LinkStatus::Published),
          editor_id: Some(None),
          version: Some(ctx.version),
          ..LinkPatch::default()
        },
      });
      for view in View::ALL {
        if self.map.is_visible(LinkStatus::Published, view) {
          ops.push(StoreOp::WriteItemToView {
            item_id: link.item_id,
            view,
          });
        } else {
          ops.push(StoreOp::DeleteItemFromView {
            item_id: link.item_id,
            view,
          });
        }
      }
      outcome.published.push(link.item_id);
    }

    if !ops.is_empty() {
      self.set.store().apply(ops).await.map_err(Error::store)?;
    }
    if !outcome.is_noop() {
      info!(
        relation = self.set.relation(),
        owner = self.owner.0,
        published = outcome.published.len(),
        archived = outcome.archived_shadows.len(),
        "published items"
      );
    }
    Ok(outcome)
  }

  // ── rollback ──────────────────────────────────────────────────────────

  /// Reopen the most recently published edits.
  ///
  /// For each Published link whose item has archived shadow history: the
  /// latest archived shadow (highest version, then highest row id) returns
  /// to LiveCopy and to the Public view; the item's link becomes Editing
  /// under `ctx` and leaves the Public view. Published links without
  /// history are untouched. A live shadow found next to the history aborts
  /// the whole rollback with [`Error::ShadowConflict`].
  pub async fn rollback_items(
    &self,
    ctx: &EditContext,
  ) -> Result<RollbackOutcome> {
    let lock = self.locks.for_owner(self.owner);
    let _guard = lock.lock().await;

    let published_filter = LinkFilter {
      statuses: Some(vec![LinkStatus::Published]),
      ..self.set.filter()
    };
    let published = self
      .set
      .store()
      .select_links(&published_filter)
      .await
      .map_err(Error::store)?;

    let mut outcome = RollbackOutcome::default();
    let mut ops = Vec::new();
    for link in &published {
      let mut history = self.archived_shadows_for(link.item_id).await?;
      history.sort_by_key(|shadow| (shadow.version, shadow.link_id));
      let Some(latest) = history.pop() else {
        continue;
      };
      if let Some(live) = self.live_shadow_for(link.item_id).await? {
        warn!(
          item = link.item_id.0,
          shadow = live.item_id.0,
          "live shadow already present, rollback refused"
        );
        return Err(Error::ShadowConflict {
          item:  link.item_id,
          found: live.item_id,
        });
      }
      ops.push(StoreOp::UpdateLinks {
        filter: by_id(latest.link_id),
        patch:  LinkPatch {
          status: Some(LinkStatus::LiveCopy),
          ..LinkPatch::default()
        },
      });
      ops.push(StoreOp::WriteItemToView {
        item_id: latest.item_id,
        view:    View::Public,
      });
      ops.push(StoreOp::UpdateLinks {
        filter: by_id(link.link_id),
        patch:  LinkPatch {
          status: Some(LinkStatus::Editing),
          editor_id: Some(ctx.editor),
          version: Some(ctx.version),
          ..LinkPatch::default()
        },
      });
      ops.push(StoreOp::DeleteItemFromView {
        item_id: link.item_id,
        view:    View::Public,
      });
      outcome.reopened.push(link.item_id);
      outcome.restored_shadows.push(latest.item_id);
    }

    if !ops.is_empty() {
      self.set.store().apply(ops).await.map_err(Error::store)?;
    }
    if !outcome.is_noop() {
      info!(
        relation = self.set.relation(),
        owner = self.owner.0,
        reopened = outcome.reopened.len(),
        restored = outcome.restored_shadows.len(),
        "rolled back items"
      );
    }
    Ok(outcome)
  }
}
