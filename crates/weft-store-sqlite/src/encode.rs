//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns, plus the SQL renderers for
//! filters, patches, and atomic batches.
//!
//! All timestamps are stored as RFC 3339 strings. Field maps are stored as
//! compact JSON objects. Statuses and views use the discriminant strings
//! defined next to their enums.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use weft_core::{
  fields::FieldMap,
  filter::LinkFilter,
  id::{EditorId, ItemId, LinkId, OwnerId, Version},
  item::Item,
  link::{Link, LinkPatch, NewLink},
  owner::Owner,
  status::{LinkStatus, View},
  store::StoreOp,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339()
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Field maps ──────────────────────────────────────────────────────────────

pub fn encode_fields(fields: &FieldMap) -> Result<String> {
  Ok(serde_json::to_string(fields)?)
}

pub fn decode_fields(s: &str) -> Result<FieldMap> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `links` row.
pub struct RawLink {
  pub link_id:        i64,
  pub relation:       String,
  pub owner_id:       i64,
  pub item_id:        i64,
  pub status:         String,
  pub linked_item_id: Option<i64>,
  pub editor_id:      Option<i64>,
  pub version:        i64,
  pub extra:          String,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawLink {
  pub fn into_link(self) -> Result<Link> {
    Ok(Link {
      link_id:        LinkId(self.link_id),
      relation:       self.relation,
      owner_id:       OwnerId(self.owner_id),
      item_id:        ItemId(self.item_id),
      status:         LinkStatus::parse(&self.status)?,
      linked_item_id: self.linked_item_id.map(ItemId),
      editor_id:      self.editor_id.map(EditorId),
      version:        Version(self.version),
      extra:          decode_fields(&self.extra)?,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from an `items` row.
pub struct RawItem {
  pub item_id:    i64,
  pub fields:     String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawItem {
  pub fn into_item(self) -> Result<Item> {
    Ok(Item {
      item_id:    ItemId(self.item_id),
      fields:     decode_fields(&self.fields)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from an `owners` row.
pub struct RawOwner {
  pub owner_id:   i64,
  pub version:    i64,
  pub created_at: String,
}

impl RawOwner {
  pub fn into_owner(self) -> Result<Owner> {
    Ok(Owner {
      owner_id:   OwnerId(self.owner_id),
      version:    Version(self.version),
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

// ─── Filter rendering ────────────────────────────────────────────────────────

/// A rendered SQL fragment with its positional `?` parameters.
pub struct SqlCond {
  pub sql:    String,
  pub params: Vec<Value>,
}

/// Render a [`LinkFilter`] as a `WHERE` clause (empty string when the filter
/// is unrestricted).
///
/// `statuses: Some([])` renders a false predicate — "match nothing" must not
/// degrade into "no restriction".
pub fn filter_where(filter: &LinkFilter) -> SqlCond {
  let mut conds: Vec<String> = Vec::new();
  let mut params: Vec<Value> = Vec::new();

  if let Some(relation) = &filter.relation {
    conds.push("relation = ?".into());
    params.push(Value::Text(relation.clone()));
  }
  if let Some(OwnerId(id)) = filter.owner_id {
    conds.push("owner_id = ?".into());
    params.push(Value::Integer(id));
  }
  if let Some(ItemId(id)) = filter.item_id {
    conds.push("item_id = ?".into());
    params.push(Value::Integer(id));
  }
  if let Some(ItemId(id)) = filter.linked_item_id {
    conds.push("linked_item_id = ?".into());
    params.push(Value::Integer(id));
  }
  match &filter.statuses {
    None => {}
    Some(statuses) if statuses.is_empty() => {
      conds.push("0 = 1".into());
    }
    Some(statuses) => {
      let marks = vec!["?"; statuses.len()].join(", ");
      conds.push(format!("status IN ({marks})"));
      params.extend(
        statuses
          .iter()
          .map(|s| Value::Text(s.as_str().to_owned())),
      );
    }
  }
  if let Some(EditorId(id)) = filter.editor_id {
    conds.push("editor_id = ?".into());
    params.push(Value::Integer(id));
  }
  if let Some(LinkId(id)) = filter.link_id {
    conds.push("link_id = ?".into());
    params.push(Value::Integer(id));
  }

  let sql = if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  };
  SqlCond { sql, params }
}

/// Render a [`LinkPatch`] as a `SET` clause. Always touches `updated_at`.
pub fn patch_set(patch: &LinkPatch, now: &str) -> Result<SqlCond> {
  let mut sets: Vec<&'static str> = Vec::new();
  let mut params: Vec<Value> = Vec::new();

  if let Some(status) = patch.status {
    sets.push("status = ?");
    params.push(Value::Text(status.as_str().to_owned()));
  }
  if let Some(linked) = patch.linked_item_id {
    sets.push("linked_item_id = ?");
    params.push(match linked {
      Some(ItemId(id)) => Value::Integer(id),
      None => Value::Null,
    });
  }
  if let Some(editor) = patch.editor_id {
    sets.push("editor_id = ?");
    params.push(match editor {
      Some(EditorId(id)) => Value::Integer(id),
      None => Value::Null,
    });
  }
  if let Some(Version(v)) = patch.version {
    sets.push("version = ?");
    params.push(Value::Integer(v));
  }
  if let Some(extra) = &patch.extra {
    sets.push("extra = ?");
    params.push(Value::Text(encode_fields(extra)?));
  }
  sets.push("updated_at = ?");
  params.push(Value::Text(now.to_owned()));

  Ok(SqlCond {
    sql: format!("SET {}", sets.join(", ")),
    params,
  })
}

// ─── Link values ─────────────────────────────────────────────────────────────

/// A [`NewLink`] with every column encoded, ready to bind.
pub struct LinkValues {
  pub relation:       String,
  pub owner_id:       i64,
  pub item_id:        i64,
  pub status:         String,
  pub linked_item_id: Option<i64>,
  pub editor_id:      Option<i64>,
  pub version:        i64,
  pub extra:          String,
}

pub fn encode_new_link(link: &NewLink) -> Result<LinkValues> {
  Ok(LinkValues {
    relation:       link.relation.clone(),
    owner_id:       link.owner_id.0,
    item_id:        link.item_id.0,
    status:         link.status.as_str().to_owned(),
    linked_item_id: link.linked_item_id.map(|id| id.0),
    editor_id:      link.editor_id.map(|id| id.0),
    version:        link.version.0,
    extra:          encode_fields(&link.extra)?,
  })
}

// ─── Batch plans ─────────────────────────────────────────────────────────────

/// A [`StoreOp`] with all values encoded; what the transaction executor runs.
pub enum SqlOp {
  InsertLink(LinkValues),
  UpsertLink(LinkValues),
  UpdateLinks { scope: SqlCond, set: SqlCond },
  DeleteLinks { scope: SqlCond },
  ReplaceItemFields { item_id: i64, fields: String },
  DeleteItem { item_id: i64 },
  WriteItemToView { item_id: i64, view: &'static str },
  DeleteItemFromView { item_id: i64, view: &'static str },
}

pub fn encode_op(op: &StoreOp, now: &str) -> Result<SqlOp> {
  Ok(match op {
    StoreOp::InsertLink(link) => SqlOp::InsertLink(encode_new_link(link)?),
    StoreOp::UpsertLink(link) => SqlOp::UpsertLink(encode_new_link(link)?),
    StoreOp::UpdateLinks { filter, patch } => SqlOp::UpdateLinks {
      scope: filter_where(filter),
      set:   patch_set(patch, now)?,
    },
    StoreOp::DeleteLinks { filter } => SqlOp::DeleteLinks {
      scope: filter_where(filter),
    },
    StoreOp::ReplaceItemFields { item_id, fields } => {
      SqlOp::ReplaceItemFields {
        item_id: item_id.0,
        fields:  encode_fields(fields)?,
      }
    }
    StoreOp::DeleteItem { item_id } => {
      SqlOp::DeleteItem { item_id: item_id.0 }
    }
    StoreOp::WriteItemToView { item_id, view } => SqlOp::WriteItemToView {
      item_id: item_id.0,
      view:    view.as_str(),
    },
    StoreOp::DeleteItemFromView { item_id, view } => {
      SqlOp::DeleteItemFromView {
        item_id: item_id.0,
        view:    view.as_str(),
      }
    }
  })
}
