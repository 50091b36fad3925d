//! [`SqliteStore`] — the SQLite implementation of [`RelationStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use weft_core::{
  fields::{self, FieldMap},
  filter::LinkFilter,
  id::{ItemId, OwnerId, Version},
  item::Item,
  link::{Link, LinkPatch, NewLink},
  owner::Owner,
  status::View,
  store::{RelationStore, StoreOp},
};

use crate::{
  Error, Result,
  encode::{
    LinkValues, RawItem, RawLink, RawOwner, SqlCond, SqlOp, encode_dt,
    encode_fields, encode_new_link, encode_op, filter_where, patch_set,
  },
  schema::SCHEMA,
};

// ─── Row mapping ─────────────────────────────────────────────────────────────

const LINK_COLUMNS: &str = "link_id, relation, owner_id, item_id, status, \
                            linked_item_id, editor_id, version, extra, \
                            created_at, updated_at";

fn raw_link(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawLink> {
  Ok(RawLink {
    link_id:        row.get(0)?,
    relation:       row.get(1)?,
    owner_id:       row.get(2)?,
    item_id:        row.get(3)?,
    status:         row.get(4)?,
    linked_item_id: row.get(5)?,
    editor_id:      row.get(6)?,
    version:        row.get(7)?,
    extra:          row.get(8)?,
    created_at:     row.get(9)?,
    updated_at:     row.get(10)?,
  })
}

fn raw_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawItem> {
  Ok(RawItem {
    item_id:    row.get(0)?,
    fields:     row.get(1)?,
    created_at: row.get(2)?,
    updated_at: row.get(3)?,
  })
}

fn get_link_row(
  conn: &rusqlite::Connection,
  link_id: i64,
) -> rusqlite::Result<RawLink> {
  conn.query_row(
    &format!("SELECT {LINK_COLUMNS} FROM links WHERE link_id = ?1"),
    rusqlite::params![link_id],
    raw_link,
  )
}

// ─── Write helpers ───────────────────────────────────────────────────────────
//
// Shared between the trait methods and the batch executor; everything here
// takes a plain connection so it runs unchanged inside a transaction.

fn exec_insert_link(
  conn: &rusqlite::Connection,
  v: &LinkValues,
  now: &str,
) -> rusqlite::Result<i64> {
  conn.execute(
    "INSERT INTO links (
       relation, owner_id, item_id, status, linked_item_id, editor_id,
       version, extra, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    rusqlite::params![
      v.relation,
      v.owner_id,
      v.item_id,
      v.status,
      v.linked_item_id,
      v.editor_id,
      v.version,
      v.extra,
      now,
      now,
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

fn exec_upsert_link(
  conn: &rusqlite::Connection,
  v: &LinkValues,
  now: &str,
) -> rusqlite::Result<i64> {
  conn.execute(
    "INSERT INTO links (
       relation, owner_id, item_id, status, linked_item_id, editor_id,
       version, extra, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
     ON CONFLICT (relation, owner_id, item_id) DO UPDATE SET
       status         = excluded.status,
       linked_item_id = excluded.linked_item_id,
       editor_id      = excluded.editor_id,
       version        = excluded.version,
       extra          = excluded.extra,
       updated_at     = excluded.updated_at",
    rusqlite::params![
      v.relation,
      v.owner_id,
      v.item_id,
      v.status,
      v.linked_item_id,
      v.editor_id,
      v.version,
      v.extra,
      now,
      now,
    ],
  )?;
  // last_insert_rowid is unreliable on the conflict path; read the key back.
  conn.query_row(
    "SELECT link_id FROM links
     WHERE relation = ?1 AND owner_id = ?2 AND item_id = ?3",
    rusqlite::params![v.relation, v.owner_id, v.item_id],
    |row| row.get(0),
  )
}

fn exec_update_links(
  conn: &rusqlite::Connection,
  scope: &SqlCond,
  set: &SqlCond,
) -> rusqlite::Result<u64> {
  let sql = format!("UPDATE links {} {}", set.sql, scope.sql);
  let params: Vec<_> = set
    .params
    .iter()
    .chain(scope.params.iter())
    .cloned()
    .collect();
  let changed = conn.execute(&sql, rusqlite::params_from_iter(params))?;
  Ok(changed as u64)
}

fn exec_delete_links(
  conn: &rusqlite::Connection,
  scope: &SqlCond,
) -> rusqlite::Result<u64> {
  let sql = format!("DELETE FROM links {}", scope.sql);
  let deleted = conn
    .execute(&sql, rusqlite::params_from_iter(scope.params.iter().cloned()))?;
  Ok(deleted as u64)
}

fn exec_write_item_to_view(
  conn: &rusqlite::Connection,
  item_id: i64,
  view: &str,
  now: &str,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO item_views (item_id, view, written_at) VALUES (?1, ?2, ?3)
     ON CONFLICT (item_id, view) DO UPDATE SET
       written_at = excluded.written_at",
    rusqlite::params![item_id, view, now],
  )?;
  Ok(())
}

fn exec_delete_item_from_view(
  conn: &rusqlite::Connection,
  item_id: i64,
  view: &str,
) -> rusqlite::Result<()> {
  conn.execute(
    "DELETE FROM item_views WHERE item_id = ?1 AND view = ?2",
    rusqlite::params![item_id, view],
  )?;
  Ok(())
}

fn exec_op(
  conn: &rusqlite::Connection,
  op: &SqlOp,
  now: &str,
) -> rusqlite::Result<()> {
  match op {
    SqlOp::InsertLink(v) => {
      exec_insert_link(conn, v, now)?;
    }
    SqlOp::UpsertLink(v) => {
      exec_upsert_link(conn, v, now)?;
    }
    SqlOp::UpdateLinks { scope, set } => {
      exec_update_links(conn, scope, set)?;
    }
    SqlOp::DeleteLinks { scope } => {
      exec_delete_links(conn, scope)?;
    }
    SqlOp::ReplaceItemFields { item_id, fields } => {
      conn.execute(
        "UPDATE items SET fields = ?2, updated_at = ?3 WHERE item_id = ?1",
        rusqlite::params![item_id, fields, now],
      )?;
    }
    SqlOp::DeleteItem { item_id } => {
      conn.execute(
        "DELETE FROM items WHERE item_id = ?1",
        rusqlite::params![item_id],
      )?;
    }
    SqlOp::WriteItemToView { item_id, view } => {
      exec_write_item_to_view(conn, *item_id, view, now)?;
    }
    SqlOp::DeleteItemFromView { item_id, view } => {
      exec_delete_item_from_view(conn, *item_id, view)?;
    }
  }
  Ok(())
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A weft relation store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── RelationStore impl ──────────────────────────────────────────────────────

impl RelationStore for SqliteStore {
  type Error = Error;

  // ── Owners ────────────────────────────────────────────────────────────────

  async fn create_owner(&self) -> Result<Owner> {
    let now = Utc::now();
    let now_str = encode_dt(now);

    let owner_id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO owners (version, created_at) VALUES (0, ?1)",
          rusqlite::params![now_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Owner {
      owner_id:   OwnerId(owner_id),
      version:    Version(0),
      created_at: now,
    })
  }

  async fn get_owner(&self, id: OwnerId) -> Result<Option<Owner>> {
    let OwnerId(raw_id) = id;

    let raw: Option<RawOwner> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT owner_id, version, created_at FROM owners
               WHERE owner_id = ?1",
              rusqlite::params![raw_id],
              |row| {
                Ok(RawOwner {
                  owner_id:   row.get(0)?,
                  version:    row.get(1)?,
                  created_at: row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawOwner::into_owner).transpose()
  }

  async fn bump_owner_version(&self, id: OwnerId) -> Result<Version> {
    let OwnerId(raw_id) = id;

    let version: Option<i64> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE owners SET version = version + 1 WHERE owner_id = ?1",
          rusqlite::params![raw_id],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let version = conn.query_row(
          "SELECT version FROM owners WHERE owner_id = ?1",
          rusqlite::params![raw_id],
          |row| row.get(0),
        )?;
        Ok(Some(version))
      })
      .await?;

    version.map(Version).ok_or(Error::OwnerNotFound(id))
  }

  // ── Links ─────────────────────────────────────────────────────────────────

  async fn select_links(&self, filter: &LinkFilter) -> Result<Vec<Link>> {
    let scope = filter_where(filter);

    let raws: Vec<RawLink> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {LINK_COLUMNS} FROM links {} ORDER BY link_id",
          scope.sql
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(scope.params), raw_link)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawLink::into_link).collect()
  }

  async fn count_links(&self, filter: &LinkFilter) -> Result<u64> {
    let scope = filter_where(filter);

    let count: i64 = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT COUNT(*) FROM links {}", scope.sql);
        Ok(conn.query_row(
          &sql,
          rusqlite::params_from_iter(scope.params),
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(count as u64)
  }

  async fn insert_link(&self, link: NewLink) -> Result<Link> {
    let values = encode_new_link(&link)?;
    let now = encode_dt(Utc::now());

    let raw: RawLink = self
      .conn
      .call(move |conn| {
        let link_id = exec_insert_link(conn, &values, &now)?;
        Ok(get_link_row(conn, link_id)?)
      })
      .await?;

    raw.into_link()
  }

  async fn upsert_link(&self, link: NewLink) -> Result<Link> {
    let values = encode_new_link(&link)?;
    let now = encode_dt(Utc::now());

    let raw: RawLink = self
      .conn
      .call(move |conn| {
        let link_id = exec_upsert_link(conn, &values, &now)?;
        Ok(get_link_row(conn, link_id)?)
      })
      .await?;

    raw.into_link()
  }

  async fn update_links(
    &self,
    filter: &LinkFilter,
    patch: &LinkPatch,
  ) -> Result<u64> {
    let now = encode_dt(Utc::now());
    let scope = filter_where(filter);
    let set = patch_set(patch, &now)?;

    let changed = self
      .conn
      .call(move |conn| Ok(exec_update_links(conn, &scope, &set)?))
      .await?;

    Ok(changed)
  }

  async fn delete_links(&self, filter: &LinkFilter) -> Result<u64> {
    let scope = filter_where(filter);

    let deleted = self
      .conn
      .call(move |conn| Ok(exec_delete_links(conn, &scope)?))
      .await?;

    Ok(deleted)
  }

  // ── Items ─────────────────────────────────────────────────────────────────

  async fn create_item(&self, fields: FieldMap) -> Result<Item> {
    let now = Utc::now();
    let now_str = encode_dt(now);
    let fields_json = encode_fields(&fields)?;

    let item_id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO items (fields, created_at, updated_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![fields_json, now_str, now_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Item {
      item_id: ItemId(item_id),
      fields,
      created_at: now,
      updated_at: now,
    })
  }

  async fn duplicate_item(
    &self,
    source: ItemId,
    fields: Option<FieldMap>,
  ) -> Result<Item> {
    let current = self
      .get_item(source)
      .await?
      .ok_or(Error::ItemNotFound(source))?;
    self.create_item(fields.unwrap_or(current.fields)).await
  }

  async fn get_item(&self, id: ItemId) -> Result<Option<Item>> {
    let ItemId(raw_id) = id;

    let raw: Option<RawItem> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT item_id, fields, created_at, updated_at FROM items
               WHERE item_id = ?1",
              rusqlite::params![raw_id],
              raw_item,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawItem::into_item).transpose()
  }

  async fn item_fields(&self, id: ItemId) -> Result<Option<FieldMap>> {
    Ok(self.get_item(id).await?.map(|item| item.fields))
  }

  async fn update_item_fields(
    &self,
    id: ItemId,
    patch: FieldMap,
  ) -> Result<Item> {
    let current = self.get_item(id).await?.ok_or(Error::ItemNotFound(id))?;
    let merged = fields::merge(&current.fields, &patch);
    self.replace_item_fields(id, merged).await
  }

  async fn replace_item_fields(
    &self,
    id: ItemId,
    fields: FieldMap,
  ) -> Result<Item> {
    let ItemId(raw_id) = id;
    let now_str = encode_dt(Utc::now());
    let fields_json = encode_fields(&fields)?;

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE items SET fields = ?2, updated_at = ?3 WHERE item_id = ?1",
          rusqlite::params![raw_id, fields_json, now_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::ItemNotFound(id));
    }
    self.get_item(id).await?.ok_or(Error::ItemNotFound(id))
  }

  async fn delete_item(&self, id: ItemId) -> Result<bool> {
    let ItemId(raw_id) = id;

    let deleted: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM items WHERE item_id = ?1",
          rusqlite::params![raw_id],
        )?)
      })
      .await?;

    Ok(deleted > 0)
  }

  async fn write_item_to_view(&self, id: ItemId, view: View) -> Result<()> {
    let ItemId(raw_id) = id;
    let now = encode_dt(Utc::now());
    let view_str = view.as_str();

    self
      .conn
      .call(move |conn| {
        Ok(exec_write_item_to_view(conn, raw_id, view_str, &now)?)
      })
      .await?;
    Ok(())
  }

  async fn delete_item_from_view(&self, id: ItemId, view: View) -> Result<()> {
    let ItemId(raw_id) = id;
    let view_str = view.as_str();

    self
      .conn
      .call(move |conn| {
        Ok(exec_delete_item_from_view(conn, raw_id, view_str)?)
      })
      .await?;
    Ok(())
  }

  async fn item_views(&self, id: ItemId) -> Result<Vec<View>> {
    let ItemId(raw_id) = id;

    let names: Vec<String> = self
      .conn
      .call(move |conn| {
        // 'draft' sorts before 'public', matching View::ALL order.
        let mut stmt = conn.prepare(
          "SELECT view FROM item_views WHERE item_id = ?1 ORDER BY view",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![raw_id], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    names
      .iter()
      .map(|name| Ok(View::parse(name)?))
      .collect()
  }

  async fn item_in_view(&self, id: ItemId, view: View) -> Result<bool> {
    let ItemId(raw_id) = id;
    let view_str = view.as_str();

    let present: Option<bool> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM item_views WHERE item_id = ?1 AND view = ?2",
              rusqlite::params![raw_id, view_str],
              |_| Ok(true),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(present.unwrap_or(false))
  }

  // ── Batches ───────────────────────────────────────────────────────────────

  async fn apply(&self, ops: Vec<StoreOp>) -> Result<()> {
    let now = encode_dt(Utc::now());
    let plan: Vec<SqlOp> = ops
      .iter()
      .map(|op| encode_op(op, &now))
      .collect::<Result<_>>()?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for op in &plan {
          exec_op(&tx, op, &now)?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
