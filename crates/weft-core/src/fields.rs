//! Free-form field maps carried by item records and link rows.

use std::collections::BTreeMap;

/// String-keyed JSON payload. A `BTreeMap` keeps serialised output
/// deterministic.
pub type FieldMap = BTreeMap<String, serde_json::Value>;

/// `patch` overlaid on `base`; patch values win on key collision.
pub fn merge(base: &FieldMap, patch: &FieldMap) -> FieldMap {
  let mut merged = base.clone();
  for (key, value) in patch {
    merged.insert(key.clone(), value.clone());
  }
  merged
}

/// Whether writing `incoming` over `current` would change any tracked field.
///
/// `tracked = None` tracks every incoming key. Keys absent from `incoming`
/// are untouched by a merge-style write and never count as changes.
pub fn differs(
  current: &FieldMap,
  incoming: &FieldMap,
  tracked: Option<&[String]>,
) -> bool {
  match tracked {
    None => incoming
      .iter()
      .any(|(key, value)| current.get(key) != Some(value)),
    Some(keys) => keys.iter().any(|key| {
      incoming
        .get(key)
        .is_some_and(|value| current.get(key) != Some(value))
    }),
  }
}
