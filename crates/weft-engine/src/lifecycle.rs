//! [`OwnerLifecycle`] — owner-level event hooks over the versioned sets.
//!
//! The lifecycle registry names the versioned relationships an owner type
//! carries and reacts to item writes and owner transitions: a save of a
//! published item re-runs `add` (flipping its links to Editing and spawning
//! shadows), publish and rollback fan out across every relationship, and a
//! pre-write snapshot registry preserves the field values a shadow should
//! carry.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, MutexGuard},
};

use weft_core::{
  fields::{self, FieldMap},
  id::{ItemId, OwnerId},
  link::AddTarget,
  status::{LinkStatus, StatusViewMap},
  store::RelationStore,
};

use crate::{
  Error, Result,
  locks::OwnerLocks,
  set::LinkSet,
  versioned::{
    EditContext, PublishOutcome, RollbackOutcome, VersionedLinkSet,
  },
};

// ─── RelationDef ─────────────────────────────────────────────────────────────

/// A named versioned relationship and its status→view mapping.
#[derive(Debug, Clone)]
pub struct RelationDef {
  pub name: String,
  pub map:  StatusViewMap,
}

impl RelationDef {
  /// A relation with the default status→view mapping.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      map:  StatusViewMap::default(),
    }
  }

  pub fn with_map(mut self, map: StatusViewMap) -> Self {
    self.map = map;
    self
  }
}

// ─── OwnerLifecycle ──────────────────────────────────────────────────────────

/// The registry wiring owner events to the versioned link sets.
pub struct OwnerLifecycle<S> {
  store:     Arc<S>,
  relations: Vec<RelationDef>,
  /// Field names whose changes count as an edit. `None` tracks every field.
  tracked:   Option<Vec<String>>,
  locks:     Arc<OwnerLocks>,
  snapshots: Mutex<HashMap<ItemId, FieldMap>>,
}

impl<S: RelationStore> OwnerLifecycle<S> {
  pub fn new(store: Arc<S>, relations: Vec<RelationDef>) -> Self {
    Self {
      store,
      relations,
      tracked: None,
      locks: Arc::new(OwnerLocks::new()),
      snapshots: Mutex::new(HashMap::new()),
    }
  }

  /// Restrict edit detection to these field names.
  pub fn tracked_fields(mut self, fields: Vec<String>) -> Self {
    self.tracked = Some(fields);
    self
  }

  pub fn store(&self) -> &Arc<S> {
    &self.store
  }

  pub fn relations(&self) -> &[RelationDef] {
    &self.relations
  }

  /// The versioned set for a named relation under `owner`.
  pub fn versioned(
    &self,
    relation: &str,
    owner: OwnerId,
  ) -> Result<VersionedLinkSet<S>> {
    let def = self
      .relations
      .iter()
      .find(|def| def.name == relation)
      .ok_or_else(|| Error::UnknownRelation(relation.to_owned()))?;
    self.versioned_for(def, owner)
  }

  fn versioned_for(
    &self,
    def: &RelationDef,
    owner: OwnerId,
  ) -> Result<VersionedLinkSet<S>> {
    let set =
      LinkSet::new(Arc::clone(&self.store), def.name.clone(), Some(owner));
    VersionedLinkSet::new(set, def.map.clone(), Arc::clone(&self.locks))
  }

  fn snapshot_map(&self) -> MutexGuard<'_, HashMap<ItemId, FieldMap>> {
    match self.snapshots.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    }
  }

  // ── Item write hooks ──────────────────────────────────────────────────

  /// Call before writing `incoming` over an item's fields. When tracked
  /// fields are about to change, the stored values are recorded as the
  /// item's pre-edit snapshot. The first snapshot wins until the item is
  /// published. Returns whether a snapshot is in place.
  pub async fn before_item_write(
    &self,
    item: ItemId,
    incoming: &FieldMap,
  ) -> Result<bool> {
    let Some(current) =
      self.store.item_fields(item).await.map_err(Error::store)?
    else {
      return Ok(false);
    };
    if !fields::differs(&current, incoming, self.tracked.as_deref()) {
      return Ok(false);
    }
    self.snapshot_map().entry(item).or_insert(current);
    Ok(true)
  }

  /// Call after an item's fields were written. Every relationship serving
  /// the item as Editing or Published re-runs `add`, so a save of a
  /// published item flips its link to Editing and spawns a shadow carrying
  /// the pre-edit snapshot.
  pub async fn after_item_write(
    &self,
    ctx: &EditContext,
    owner: OwnerId,
    item: ItemId,
  ) -> Result<()> {
    let pre_edit = self.snapshot(item);
    for def in &self.relations {
      let versioned = self.versioned_for(def, owner)?;
      let Some(link) = versioned.set().link_for(item).await? else {
        continue;
      };
      if !matches!(link.status, LinkStatus::Editing | LinkStatus::Published)
      {
        continue;
      }
      versioned
        .add(ctx, AddTarget::Existing(item), FieldMap::new(), pre_edit.clone())
        .await?;
    }
    Ok(())
  }

  // ── Owner transitions ─────────────────────────────────────────────────

  /// Publish every relationship of `owner`, then drop the snapshots of the
  /// published items.
  pub async fn publish(
    &self,
    ctx: &EditContext,
    owner: OwnerId,
  ) -> Result<PublishOutcome> {
    let mut outcome = PublishOutcome::default();
    for def in &self.relations {
      let versioned = self.versioned_for(def, owner)?;
      outcome.absorb(versioned.publish_items(ctx).await?);
    }
    for item in &outcome.published {
      self.forget(*item);
    }
    Ok(outcome)
  }

  /// Roll back every relationship of `owner`.
  pub async fn rollback(
    &self,
    ctx: &EditContext,
    owner: OwnerId,
  ) -> Result<RollbackOutcome> {
    let mut outcome = RollbackOutcome::default();
    for def in &self.relations {
      let versioned = self.versioned_for(def, owner)?;
      outcome.absorb(versioned.rollback_items(ctx).await?);
    }
    Ok(outcome)
  }

  // ── Snapshots ─────────────────────────────────────────────────────────

  /// The pre-edit snapshot recorded for `item`, if any.
  pub fn snapshot(&self, item: ItemId) -> Option<FieldMap> {
    self.snapshot_map().get(&item).cloned()
  }

  /// Drop `item`'s pre-edit snapshot, returning it.
  pub fn forget(&self, item: ItemId) -> Option<FieldMap> {
    self.snapshot_map().remove(&item)
  }
}
