//! Item rows — the child records on the far side of every link.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{fields::FieldMap, id::ItemId};

/// A stored item record.
///
/// Field values are a free-form JSON map. Which views serve the record is
/// tracked separately per (item, view); an item can exist while appearing
/// in no view at all (a torn-down shadow does exactly that).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
  pub item_id:    ItemId,
  pub fields:     FieldMap,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}
