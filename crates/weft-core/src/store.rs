//! The `RelationStore` trait and the atomic batch vocabulary.
//!
//! The trait is implemented by storage backends (e.g. `weft-store-sqlite`).
//! The engine and the API depend on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use crate::{
  fields::FieldMap,
  filter::LinkFilter,
  id::{ItemId, OwnerId, Version},
  item::Item,
  link::{Link, LinkPatch, NewLink},
  owner::Owner,
  status::View,
};

// ─── Batch vocabulary ────────────────────────────────────────────────────────

/// One write in an atomic batch submitted to [`RelationStore::apply`].
///
/// Multi-step sequences (shadow creation, reconciliation, publish, rollback)
/// are expressed as batches so a mid-sequence failure cannot leave the link
/// graph half-written.
#[derive(Debug, Clone)]
pub enum StoreOp {
  InsertLink(NewLink),
  UpsertLink(NewLink),
  UpdateLinks { filter: LinkFilter, patch: LinkPatch },
  DeleteLinks { filter: LinkFilter },
  ReplaceItemFields { item_id: ItemId, fields: FieldMap },
  DeleteItem { item_id: ItemId },
  WriteItemToView { item_id: ItemId, view: View },
  DeleteItemFromView { item_id: ItemId, view: View },
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a weft storage backend.
///
/// Link rows are keyed by (relation, owner, item); upserts overwrite the
/// mutable columns of an existing row rather than duplicating it. View
/// presence is a separate per-(item, view) fact manipulated through the
/// `*_view` methods.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RelationStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Owners ────────────────────────────────────────────────────────────

  /// Create and persist a new owner at version 0.
  fn create_owner(
    &self,
  ) -> impl Future<Output = Result<Owner, Self::Error>> + Send + '_;

  /// Retrieve an owner by id. Returns `None` if not found.
  fn get_owner(
    &self,
    id: OwnerId,
  ) -> impl Future<Output = Result<Option<Owner>, Self::Error>> + Send + '_;

  /// Increment and return the owner's version number.
  /// Errors if the owner does not exist.
  fn bump_owner_version(
    &self,
    id: OwnerId,
  ) -> impl Future<Output = Result<Version, Self::Error>> + Send + '_;

  // ── Links ─────────────────────────────────────────────────────────────

  /// Return every link matching `filter`, ordered by row id.
  fn select_links<'a>(
    &'a self,
    filter: &'a LinkFilter,
  ) -> impl Future<Output = Result<Vec<Link>, Self::Error>> + Send + 'a;

  fn count_links<'a>(
    &'a self,
    filter: &'a LinkFilter,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Insert a link row. Errors if a row for (relation, owner, item) already
  /// exists.
  fn insert_link(
    &self,
    link: NewLink,
  ) -> impl Future<Output = Result<Link, Self::Error>> + Send + '_;

  /// Insert or, if a row for (relation, owner, item) exists, overwrite its
  /// status, back-link, editor, version, and extra payload.
  fn upsert_link(
    &self,
    link: NewLink,
  ) -> impl Future<Output = Result<Link, Self::Error>> + Send + '_;

  /// Apply `patch` to every link matching `filter`; returns the number of
  /// rows changed.
  fn update_links<'a>(
    &'a self,
    filter: &'a LinkFilter,
    patch: &'a LinkPatch,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Delete every link matching `filter`; returns the number of rows
  /// deleted.
  fn delete_links<'a>(
    &'a self,
    filter: &'a LinkFilter,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  // ── Items ─────────────────────────────────────────────────────────────

  /// Create and persist a new item with the given field values.
  fn create_item(
    &self,
    fields: FieldMap,
  ) -> impl Future<Output = Result<Item, Self::Error>> + Send + '_;

  /// Create a new item whose fields are `fields` if given, else a copy of
  /// the source item's current fields. Errors if the source is unknown.
  fn duplicate_item(
    &self,
    source: ItemId,
    fields: Option<FieldMap>,
  ) -> impl Future<Output = Result<Item, Self::Error>> + Send + '_;

  /// Retrieve an item by id. Returns `None` if not found.
  fn get_item(
    &self,
    id: ItemId,
  ) -> impl Future<Output = Result<Option<Item>, Self::Error>> + Send + '_;

  /// Current field values, or `None` for an unknown item.
  fn item_fields(
    &self,
    id: ItemId,
  ) -> impl Future<Output = Result<Option<FieldMap>, Self::Error>> + Send + '_;

  /// Merge `patch` over the stored fields. Errors if the item is unknown.
  fn update_item_fields(
    &self,
    id: ItemId,
    patch: FieldMap,
  ) -> impl Future<Output = Result<Item, Self::Error>> + Send + '_;

  /// Replace the stored fields wholesale. Errors if the item is unknown.
  fn replace_item_fields(
    &self,
    id: ItemId,
    fields: FieldMap,
  ) -> impl Future<Output = Result<Item, Self::Error>> + Send + '_;

  /// Physically delete the item and its view presence. Returns whether a
  /// row was deleted.
  fn delete_item(
    &self,
    id: ItemId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Record the item as served by `view`. Idempotent.
  fn write_item_to_view(
    &self,
    id: ItemId,
    view: View,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove the item from `view`. A no-op if it was not there.
  fn delete_item_from_view(
    &self,
    id: ItemId,
    view: View,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The views currently serving the item, in [`View::ALL`] order.
  fn item_views(
    &self,
    id: ItemId,
  ) -> impl Future<Output = Result<Vec<View>, Self::Error>> + Send + '_;

  fn item_in_view(
    &self,
    id: ItemId,
    view: View,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Batches ───────────────────────────────────────────────────────────

  /// Apply every op, in order, inside a single transaction. Any failure
  /// rolls the whole batch back.
  fn apply(
    &self,
    ops: Vec<StoreOp>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
