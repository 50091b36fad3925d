//! Behavior tests for the versioned state machine, run against the SQLite
//! store in memory.

use std::sync::Arc;

use serde_json::json;
use weft_core::{
  fields::FieldMap,
  filter::LinkFilter,
  id::{EditorId, ItemId, OwnerId, Version},
  link::{AddTarget, NewLink},
  status::{LinkStatus, StatusViewMap, View},
  store::RelationStore,
};
use weft_store_sqlite::SqliteStore;

use crate::{
  EditContext, Error, LinkSet, OwnerLifecycle, OwnerLocks, RelationDef,
  VersionedLinkSet,
};

async fn store() -> Arc<SqliteStore> {
  Arc::new(SqliteStore::open_in_memory().await.expect("in-memory store"))
}

fn fmap(value: serde_json::Value) -> FieldMap {
  match value {
    serde_json::Value::Object(map) => map.into_iter().collect(),
    other => panic!("expected a JSON object, got {other:?}"),
  }
}

fn ctx(editor: i64, version: i64) -> EditContext {
  EditContext::new(Some(EditorId(editor)), Version(version))
}

async fn versioned(
  s: &Arc<SqliteStore>,
  owner: OwnerId,
) -> VersionedLinkSet<SqliteStore> {
  let set = LinkSet::new(Arc::clone(s), "posts", Some(owner));
  VersionedLinkSet::new(
    set,
    StatusViewMap::default(),
    Arc::new(OwnerLocks::new()),
  )
  .unwrap()
}

/// Add a fresh item and publish it, returning its id.
async fn published_item(
  set: &VersionedLinkSet<SqliteStore>,
  fields: serde_json::Value,
) -> ItemId {
  let link = set
    .add(&ctx(1, 1), AddTarget::New(fmap(fields)), FieldMap::new(), None)
    .await
    .unwrap();
  set.publish_items(&ctx(1, 1)).await.unwrap();
  link.item_id
}

// ─── Adding ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_new_item_starts_editing_in_draft() {
  let s = store().await;
  let o = s.create_owner().await.unwrap();
  let set = versioned(&s, o.owner_id).await;

  let link = set
    .add(
      &ctx(7, 1),
      AddTarget::New(fmap(json!({ "title": "draft post" }))),
      FieldMap::new(),
      None,
    )
    .await
    .unwrap();

  assert_eq!(link.status, LinkStatus::Editing);
  assert_eq!(link.editor_id, Some(EditorId(7)));
  assert_eq!(link.version, Version(1));
  assert!(link.linked_item_id.is_none());

  let fields = s.item_fields(link.item_id).await.unwrap().unwrap();
  assert_eq!(fields, fmap(json!({ "title": "draft post" })));
  assert!(s.item_in_view(link.item_id, View::Draft).await.unwrap());
  assert!(!s.item_in_view(link.item_id, View::Public).await.unwrap());
}

#[tokio::test]
async fn add_unknown_item_is_rejected() {
  let s = store().await;
  let o = s.create_owner().await.unwrap();
  let set = versioned(&s, o.owner_id).await;

  let err = set
    .add(
      &ctx(1, 1),
      AddTarget::Existing(ItemId(4040)),
      FieldMap::new(),
      None,
    )
    .await;
  assert!(matches!(err, Err(Error::UnknownItem(ItemId(4040)))));
}

#[tokio::test]
async fn add_on_published_item_spawns_shadow() {
  let s = store().await;
  let o = s.create_owner().await.unwrap();
  let set = versioned(&s, o.owner_id).await;

  let item = published_item(&set, json!({ "headline": "as published" })).await;

  let link = set
    .add(&ctx(9, 3), AddTarget::Existing(item), FieldMap::new(), None)
    .await
    .unwrap();
  assert_eq!(link.status, LinkStatus::Editing);
  assert_eq!(link.editor_id, Some(EditorId(9)));
  assert_eq!(link.version, Version(3));

  let shadow = set.live_shadow_for(item).await.unwrap().unwrap();
  assert_eq!(shadow.status, LinkStatus::LiveCopy);
  assert_eq!(shadow.linked_item_id, Some(item));
  assert_ne!(shadow.item_id, item);

  // the shadow carries the pre-edit fields and takes over in Public
  let copy_fields = s.item_fields(shadow.item_id).await.unwrap().unwrap();
  assert_eq!(copy_fields, fmap(json!({ "headline": "as published" })));
  assert!(s.item_in_view(shadow.item_id, View::Public).await.unwrap());
  assert!(!s.item_in_view(item, View::Public).await.unwrap());
  assert!(s.item_in_view(item, View::Draft).await.unwrap());

  let public = set.links_in(View::Public, None).await.unwrap();
  let public_items: Vec<_> = public.iter().map(|l| l.item_id).collect();
  assert!(public_items.contains(&shadow.item_id));
  assert!(!public_items.contains(&item));
}

#[tokio::test]
async fn double_add_keeps_a_single_shadow() {
  let s = store().await;
  let o = s.create_owner().await.unwrap();
  let set = versioned(&s, o.owner_id).await;

  let item = published_item(&set, json!({ "title": "stable" })).await;
  for editor in [2, 3] {
    set
      .add(
        &ctx(editor, 2),
        AddTarget::Existing(item),
        FieldMap::new(),
        None,
      )
      .await
      .unwrap();
  }

  let shadows = s
    .select_links(&LinkFilter {
      linked_item_id: Some(item),
      statuses: Some(vec![LinkStatus::LiveCopy]),
      ..LinkFilter::default()
    })
    .await
    .unwrap();
  assert_eq!(shadows.len(), 1);
}

#[tokio::test]
async fn add_merges_extra_payload() {
  let s = store().await;
  let o = s.create_owner().await.unwrap();
  let set = versioned(&s, o.owner_id).await;

  let link = set
    .add(
      &ctx(1, 1),
      AddTarget::New(fmap(json!({ "title": "x" }))),
      fmap(json!({ "slot": "main", "weight": 1 })),
      None,
    )
    .await
    .unwrap();
  assert_eq!(link.extra, fmap(json!({ "slot": "main", "weight": 1 })));

  // a later add overlays; the caller wins per key
  let link = set
    .add(
      &ctx(1, 1),
      AddTarget::Existing(link.item_id),
      fmap(json!({ "weight": 2 })),
      None,
    )
    .await
    .unwrap();
  assert_eq!(link.extra, fmap(json!({ "slot": "main", "weight": 2 })));
}

#[tokio::test]
async fn shadow_link_carries_published_extra() {
  let s = store().await;
  let o = s.create_owner().await.unwrap();
  let set = versioned(&s, o.owner_id).await;

  let link = set
    .add(
      &ctx(1, 1),
      AddTarget::New(fmap(json!({ "title": "x" }))),
      fmap(json!({ "slot": "sidebar" })),
      None,
    )
    .await
    .unwrap();
  set.publish_items(&ctx(1, 1)).await.unwrap();

  set
    .add(
      &ctx(2, 2),
      AddTarget::Existing(link.item_id),
      FieldMap::new(),
      None,
    )
    .await
    .unwrap();

  let shadow = set.live_shadow_for(link.item_id).await.unwrap().unwrap();
  assert_eq!(shadow.extra, fmap(json!({ "slot": "sidebar" })));
}

// ─── Removing ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn remove_own_draft_deletes_the_item() {
  let s = store().await;
  let o = s.create_owner().await.unwrap();
  let set = versioned(&s, o.owner_id).await;

  let link = set
    .add(
      &ctx(5, 1),
      AddTarget::New(fmap(json!({ "title": "scratch" }))),
      FieldMap::new(),
      None,
    )
    .await
    .unwrap();
  set.remove_by_id(&ctx(5, 1), link.item_id).await.unwrap();

  assert!(set.links().await.unwrap().is_empty());
  assert!(s.get_item(link.item_id).await.unwrap().is_none());
}

#[tokio::test]
async fn remove_by_another_editor_keeps_the_item() {
  let s = store().await;
  let o = s.create_owner().await.unwrap();
  let set = versioned(&s, o.owner_id).await;

  let link = set
    .add(
      &ctx(5, 1),
      AddTarget::New(fmap(json!({ "title": "not yours" }))),
      FieldMap::new(),
      None,
    )
    .await
    .unwrap();
  set.remove_by_id(&ctx(6, 1), link.item_id).await.unwrap();

  assert!(set.links().await.unwrap().is_empty());
  assert!(s.get_item(link.item_id).await.unwrap().is_some());
}

#[tokio::test]
async fn remove_without_editor_keeps_the_item() {
  let s = store().await;
  let o = s.create_owner().await.unwrap();
  let set = versioned(&s, o.owner_id).await;
  let anon = EditContext::new(None, Version(1));

  let link = set
    .add(
      &anon,
      AddTarget::New(fmap(json!({ "title": "nobody's" }))),
      FieldMap::new(),
      None,
    )
    .await
    .unwrap();
  set.remove_by_id(&anon, link.item_id).await.unwrap();

  // no editor on either side must not count as "same editor"
  assert!(set.links().await.unwrap().is_empty());
  assert!(s.get_item(link.item_id).await.unwrap().is_some());
}

#[tokio::test]
async fn remove_reconciles_shadow_pair() {
  let s = store().await;
  let o = s.create_owner().await.unwrap();
  let set = versioned(&s, o.owner_id).await;

  let original = json!({ "title": "first", "body": "original" });
  let item = published_item(&set, original.clone()).await;

  set
    .add(&ctx(2, 2), AddTarget::Existing(item), FieldMap::new(), None)
    .await
    .unwrap();
  let shadow = set.live_shadow_for(item).await.unwrap().unwrap();
  s.replace_item_fields(
    item,
    fmap(json!({ "title": "second", "body": "changed" })),
  )
  .await
  .unwrap();

  set.remove_by_id(&ctx(2, 2), item).await.unwrap();

  // the pre-edit values come back exactly
  let fields = s.item_fields(item).await.unwrap().unwrap();
  assert_eq!(fields, fmap(original));

  let link = set.set().link_for(item).await.unwrap().unwrap();
  assert_eq!(link.status, LinkStatus::Published);
  assert!(link.editor_id.is_none());
  assert!(s.item_in_view(item, View::Public).await.unwrap());
  assert!(s.item_in_view(item, View::Draft).await.unwrap());

  // the shadow's link and Public presence are gone; the record stays,
  // visible nowhere that matters
  assert!(set.live_shadow_for(item).await.unwrap().is_none());
  assert!(s.get_item(shadow.item_id).await.unwrap().is_some());
  assert!(!s.item_in_view(shadow.item_id, View::Public).await.unwrap());
}

#[tokio::test]
async fn remove_unlinked_item_fails() {
  let s = store().await;
  let o = s.create_owner().await.unwrap();
  let set = versioned(&s, o.owner_id).await;

  let stray = s.create_item(fmap(json!({ "title": "stray" }))).await.unwrap();
  let err = set.remove_by_id(&ctx(1, 1), stray.item_id).await;
  assert!(matches!(err, Err(Error::LinkNotFound { .. })));
}

// ─── Publishing ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn publish_promotes_edits() {
  let s = store().await;
  let o = s.create_owner().await.unwrap();
  let set = versioned(&s, o.owner_id).await;

  let item = published_item(&set, json!({ "title": "v1" })).await;
  set
    .add(&ctx(4, 2), AddTarget::Existing(item), FieldMap::new(), None)
    .await
    .unwrap();
  let shadow = set.live_shadow_for(item).await.unwrap().unwrap();

  let outcome = set.publish_items(&ctx(4, 2)).await.unwrap();
  assert_eq!(outcome.published, vec![item]);
  assert_eq!(outcome.archived_shadows, vec![shadow.item_id]);

  let link = set.set().link_for(item).await.unwrap().unwrap();
  assert_eq!(link.status, LinkStatus::Published);
  assert_eq!(link.version, Version(2));
  assert!(link.editor_id.is_none());
  assert!(s.item_in_view(item, View::Draft).await.unwrap());
  assert!(s.item_in_view(item, View::Public).await.unwrap());

  let archived = set.set().link_for(shadow.item_id).await.unwrap().unwrap();
  assert_eq!(archived.status, LinkStatus::Archived);
  assert_eq!(archived.linked_item_id, Some(item));
  assert!(!s.item_in_view(shadow.item_id, View::Public).await.unwrap());
  assert!(set.live_shadow_for(item).await.unwrap().is_none());
}

#[tokio::test]
async fn publish_twice_is_a_noop() {
  let s = store().await;
  let o = s.create_owner().await.unwrap();
  let set = versioned(&s, o.owner_id).await;

  let item = published_item(&set, json!({ "title": "steady" })).await;
  set
    .add(&ctx(1, 2), AddTarget::Existing(item), FieldMap::new(), None)
    .await
    .unwrap();

  let first = set.publish_items(&ctx(1, 2)).await.unwrap();
  assert!(!first.is_noop());

  let second = set.publish_items(&ctx(1, 3)).await.unwrap();
  assert!(second.is_noop());

  // nothing moved: still published at the first publish's version
  let link = set.set().link_for(item).await.unwrap().unwrap();
  assert_eq!(link.status, LinkStatus::Published);
  assert_eq!(link.version, Version(2));
}

// ─── Rollback ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn rollback_restores_latest_shadow() {
  let s = store().await;
  let o = s.create_owner().await.unwrap();
  let set = versioned(&s, o.owner_id).await;

  let item = published_item(&set, json!({ "title": "v1" })).await;
  set
    .add(&ctx(2, 2), AddTarget::Existing(item), FieldMap::new(), None)
    .await
    .unwrap();
  let shadow = set.live_shadow_for(item).await.unwrap().unwrap();
  set.publish_items(&ctx(2, 2)).await.unwrap();

  let outcome = set.rollback_items(&ctx(8, 2)).await.unwrap();
  assert_eq!(outcome.reopened, vec![item]);
  assert_eq!(outcome.restored_shadows, vec![shadow.item_id]);

  let link = set.set().link_for(item).await.unwrap().unwrap();
  assert_eq!(link.status, LinkStatus::Editing);
  assert_eq!(link.editor_id, Some(EditorId(8)));

  let restored = set.live_shadow_for(item).await.unwrap().unwrap();
  assert_eq!(restored.item_id, shadow.item_id);
  assert_eq!(restored.status, LinkStatus::LiveCopy);

  // Public presence swaps back to the shadow
  assert!(!s.item_in_view(item, View::Public).await.unwrap());
  assert!(s.item_in_view(shadow.item_id, View::Public).await.unwrap());
}

#[tokio::test]
async fn rollback_without_history_is_a_noop() {
  let s = store().await;
  let o = s.create_owner().await.unwrap();
  let set = versioned(&s, o.owner_id).await;

  let item = published_item(&set, json!({ "title": "unedited" })).await;
  let outcome = set.rollback_items(&ctx(1, 1)).await.unwrap();
  assert!(outcome.is_noop());

  let link = set.set().link_for(item).await.unwrap().unwrap();
  assert_eq!(link.status, LinkStatus::Published);
}

#[tokio::test]
async fn rollback_picks_the_newest_archived_shadow() {
  let s = store().await;
  let o = s.create_owner().await.unwrap();
  let set = versioned(&s, o.owner_id).await;

  let item = published_item(&set, json!({ "n": 1 })).await;

  // first edit cycle, archived at version 2
  set
    .add(&ctx(1, 2), AddTarget::Existing(item), FieldMap::new(), None)
    .await
    .unwrap();
  s.replace_item_fields(item, fmap(json!({ "n": 2 }))).await.unwrap();
  set.publish_items(&ctx(1, 2)).await.unwrap();

  // second edit cycle, archived at version 3
  set
    .add(&ctx(1, 3), AddTarget::Existing(item), FieldMap::new(), None)
    .await
    .unwrap();
  s.replace_item_fields(item, fmap(json!({ "n": 3 }))).await.unwrap();
  set.publish_items(&ctx(1, 3)).await.unwrap();

  let outcome = set.rollback_items(&ctx(1, 3)).await.unwrap();
  let restored = set.live_shadow_for(item).await.unwrap().unwrap();
  assert_eq!(outcome.restored_shadows, vec![restored.item_id]);

  // the newer shadow carries the state published at version 2
  let fields = s.item_fields(restored.item_id).await.unwrap().unwrap();
  assert_eq!(fields, fmap(json!({ "n": 2 })));

  let archived = s
    .select_links(&LinkFilter {
      linked_item_id: Some(item),
      statuses: Some(vec![LinkStatus::Archived]),
      ..LinkFilter::default()
    })
    .await
    .unwrap();
  assert_eq!(archived.len(), 1);
}

#[tokio::test]
async fn rollback_with_live_shadow_is_refused() {
  let s = store().await;
  let o = s.create_owner().await.unwrap();
  let set = versioned(&s, o.owner_id).await;

  let item = published_item(&set, json!({ "title": "x" })).await;
  let history = s.create_item(fmap(json!({ "title": "old" }))).await.unwrap();
  let live = s.create_item(fmap(json!({ "title": "live" }))).await.unwrap();

  // manufacture a broken graph: archived history next to a live shadow
  // while the item itself sits published
  let mut archived =
    NewLink::new("posts", o.owner_id, history.item_id, LinkStatus::Archived);
  archived.linked_item_id = Some(item);
  s.insert_link(archived).await.unwrap();
  let mut shadow =
    NewLink::new("posts", o.owner_id, live.item_id, LinkStatus::LiveCopy);
  shadow.linked_item_id = Some(item);
  s.insert_link(shadow).await.unwrap();

  let err = set.rollback_items(&ctx(1, 2)).await;
  assert!(matches!(err, Err(Error::ShadowConflict { .. })));

  // refused before any write: the history row is untouched
  let link = set.set().link_for(history.item_id).await.unwrap().unwrap();
  assert_eq!(link.status, LinkStatus::Archived);
}

// ─── Views & filters ─────────────────────────────────────────────────────────

#[tokio::test]
async fn view_filters_hide_the_right_statuses() {
  let s = store().await;
  let o = s.create_owner().await.unwrap();
  let set = versioned(&s, o.owner_id).await;

  for status in LinkStatus::ALL {
    let it = s.create_item(FieldMap::new()).await.unwrap();
    s.insert_link(NewLink::new("posts", o.owner_id, it.item_id, status))
      .await
      .unwrap();
  }

  let draft: Vec<_> = set
    .links_in(View::Draft, None)
    .await
    .unwrap()
    .into_iter()
    .map(|l| l.status)
    .collect();
  assert_eq!(draft, vec![LinkStatus::Editing, LinkStatus::Published]);

  let public: Vec<_> = set
    .links_in(View::Public, None)
    .await
    .unwrap()
    .into_iter()
    .map(|l| l.status)
    .collect();
  assert_eq!(public, vec![LinkStatus::Published, LinkStatus::LiveCopy]);
}

#[tokio::test]
async fn explicit_status_list_overrides_the_map() {
  let s = store().await;
  let o = s.create_owner().await.unwrap();
  let set = versioned(&s, o.owner_id).await;

  for status in LinkStatus::ALL {
    let it = s.create_item(FieldMap::new()).await.unwrap();
    s.insert_link(NewLink::new("posts", o.owner_id, it.item_id, status))
      .await
      .unwrap();
  }

  let filter = set.view_filter(View::Draft, Some(&[LinkStatus::Archived]));
  assert_eq!(filter.statuses, Some(vec![LinkStatus::Archived]));

  let only: Vec<_> = set
    .links_in(View::Draft, Some(&[LinkStatus::Archived]))
    .await
    .unwrap()
    .into_iter()
    .map(|l| l.status)
    .collect();
  assert_eq!(only, vec![LinkStatus::Archived]);
}

#[tokio::test]
async fn empty_status_list_matches_nothing() {
  let s = store().await;
  let o = s.create_owner().await.unwrap();
  let set = versioned(&s, o.owner_id).await;

  published_item(&set, json!({ "title": "there" })).await;
  let links = set.links_in(View::Public, Some(&[])).await.unwrap();
  assert!(links.is_empty());
}

// ─── Scoping ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn versioned_set_requires_an_owner() {
  let s = store().await;
  let set = LinkSet::new(Arc::clone(&s), "posts", None);
  let err = VersionedLinkSet::new(
    set,
    StatusViewMap::default(),
    Arc::new(OwnerLocks::new()),
  );
  assert!(matches!(err, Err(Error::MissingOwner { .. })));
}

#[tokio::test]
async fn plain_set_requires_owner_for_writes() {
  let s = store().await;
  let it = s.create_item(FieldMap::new()).await.unwrap();
  let set = LinkSet::new(Arc::clone(&s), "posts", None);

  let err = set.add(it.item_id, FieldMap::new()).await;
  assert!(matches!(err, Err(Error::MissingOwner { .. })));
  let err = set.update_extra(it.item_id, FieldMap::new()).await;
  assert!(matches!(err, Err(Error::MissingOwner { .. })));
}

#[tokio::test]
async fn plain_links_go_straight_to_published() {
  let s = store().await;
  let o = s.create_owner().await.unwrap();
  let set = LinkSet::new(Arc::clone(&s), "tags", Some(o.owner_id));

  let it = s.create_item(fmap(json!({ "name": "rust" }))).await.unwrap();
  let link = set
    .add(it.item_id, fmap(json!({ "order": 1 })))
    .await
    .unwrap();
  assert_eq!(link.status, LinkStatus::Published);
  assert_eq!(set.count().await.unwrap(), 1);

  let link = set
    .update_extra(it.item_id, fmap(json!({ "order": 2 })))
    .await
    .unwrap();
  assert_eq!(link.extra, fmap(json!({ "order": 2 })));
  assert_eq!(link.status, LinkStatus::Published);

  let link = set
    .merge_extra(it.item_id, &fmap(json!({ "pinned": true })))
    .await
    .unwrap();
  assert_eq!(link.extra, fmap(json!({ "order": 2, "pinned": true })));

  set.remove(it.item_id).await.unwrap();
  assert_eq!(set.count().await.unwrap(), 0);
  let err = set.remove(it.item_id).await;
  assert!(matches!(err, Err(Error::LinkNotFound { .. })));
}

// ─── Lifecycle hooks ─────────────────────────────────────────────────────────

fn lifecycle(s: &Arc<SqliteStore>) -> OwnerLifecycle<SqliteStore> {
  OwnerLifecycle::new(Arc::clone(s), vec![RelationDef::new("posts")])
}

#[tokio::test]
async fn save_of_published_item_spawns_shadow_via_hooks() {
  let s = store().await;
  let o = s.create_owner().await.unwrap();
  let life = lifecycle(&s);
  let set = life.versioned("posts", o.owner_id).unwrap();

  let item = published_item(&set, json!({ "title": "live", "hits": 3 })).await;

  // an editor saves the published item
  let incoming = fmap(json!({ "title": "reworked", "hits": 3 }));
  assert!(life.before_item_write(item, &incoming).await.unwrap());
  s.update_item_fields(item, incoming).await.unwrap();
  life.after_item_write(&ctx(6, 2), o.owner_id, item).await.unwrap();

  let link = set.set().link_for(item).await.unwrap().unwrap();
  assert_eq!(link.status, LinkStatus::Editing);
  assert_eq!(link.editor_id, Some(EditorId(6)));

  // the shadow serves the pre-save state
  let shadow = set.live_shadow_for(item).await.unwrap().unwrap();
  let fields = s.item_fields(shadow.item_id).await.unwrap().unwrap();
  assert_eq!(fields, fmap(json!({ "title": "live", "hits": 3 })));
}

#[tokio::test]
async fn before_write_with_no_changes_takes_no_snapshot() {
  let s = store().await;
  let o = s.create_owner().await.unwrap();
  let life = lifecycle(&s);
  let set = life.versioned("posts", o.owner_id).unwrap();

  let item = published_item(&set, json!({ "title": "same" })).await;
  let unchanged = fmap(json!({ "title": "same" }));
  assert!(!life.before_item_write(item, &unchanged).await.unwrap());
  assert!(life.snapshot(item).is_none());
}

#[tokio::test]
async fn first_snapshot_wins_across_saves() {
  let s = store().await;
  let o = s.create_owner().await.unwrap();
  let life = lifecycle(&s);
  let set = life.versioned("posts", o.owner_id).unwrap();

  let item = published_item(&set, json!({ "rev": "a" })).await;

  life
    .before_item_write(item, &fmap(json!({ "rev": "b" })))
    .await
    .unwrap();
  s.update_item_fields(item, fmap(json!({ "rev": "b" }))).await.unwrap();
  life
    .before_item_write(item, &fmap(json!({ "rev": "c" })))
    .await
    .unwrap();

  assert_eq!(life.snapshot(item), Some(fmap(json!({ "rev": "a" }))));
}

#[tokio::test]
async fn tracked_fields_limit_edit_detection() {
  let s = store().await;
  let o = s.create_owner().await.unwrap();
  let life = OwnerLifecycle::new(
    Arc::clone(&s),
    vec![RelationDef::new("posts")],
  )
  .tracked_fields(vec!["title".to_owned()]);
  let set = life.versioned("posts", o.owner_id).unwrap();

  let item =
    published_item(&set, json!({ "title": "kept", "hits": 1 })).await;

  // only an untracked counter moves
  let incoming = fmap(json!({ "title": "kept", "hits": 2 }));
  assert!(!life.before_item_write(item, &incoming).await.unwrap());
  assert!(life.snapshot(item).is_none());

  let incoming = fmap(json!({ "title": "renamed", "hits": 2 }));
  assert!(life.before_item_write(item, &incoming).await.unwrap());
  assert!(life.snapshot(item).is_some());
}

#[tokio::test]
async fn publish_clears_snapshots() {
  let s = store().await;
  let o = s.create_owner().await.unwrap();
  let life = lifecycle(&s);
  let set = life.versioned("posts", o.owner_id).unwrap();

  let item = published_item(&set, json!({ "title": "v1" })).await;
  let incoming = fmap(json!({ "title": "v2" }));
  life.before_item_write(item, &incoming).await.unwrap();
  s.update_item_fields(item, incoming).await.unwrap();
  life.after_item_write(&ctx(1, 2), o.owner_id, item).await.unwrap();
  assert!(life.snapshot(item).is_some());

  let outcome = life.publish(&ctx(1, 2), o.owner_id).await.unwrap();
  assert_eq!(outcome.published, vec![item]);
  assert!(life.snapshot(item).is_none());

  let link = set.set().link_for(item).await.unwrap().unwrap();
  assert_eq!(link.status, LinkStatus::Published);
}

#[tokio::test]
async fn unknown_relation_is_rejected() {
  let s = store().await;
  let o = s.create_owner().await.unwrap();
  let life = lifecycle(&s);
  assert!(matches!(
    life.versioned("sections", o.owner_id),
    Err(Error::UnknownRelation(_))
  ));
}

#[tokio::test]
async fn lifecycle_publish_spans_relations() {
  let s = store().await;
  let o = s.create_owner().await.unwrap();
  let life = OwnerLifecycle::new(
    Arc::clone(&s),
    vec![RelationDef::new("posts"), RelationDef::new("banners")],
  );

  let posts = life.versioned("posts", o.owner_id).unwrap();
  let banners = life.versioned("banners", o.owner_id).unwrap();
  let a = posts
    .add(
      &ctx(1, 1),
      AddTarget::New(fmap(json!({ "title": "a" }))),
      FieldMap::new(),
      None,
    )
    .await
    .unwrap();
  let b = banners
    .add(
      &ctx(1, 1),
      AddTarget::New(fmap(json!({ "image": "b.png" }))),
      FieldMap::new(),
      None,
    )
    .await
    .unwrap();

  let outcome = life.publish(&ctx(1, 1), o.owner_id).await.unwrap();
  let mut published = outcome.published.clone();
  published.sort();
  let mut expected = vec![a.item_id, b.item_id];
  expected.sort();
  assert_eq!(published, expected);
}
