//! Owner rows — the thin envelope on the parent side of every link.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{OwnerId, Version};

/// A stored owner record. Carries only identity and the current version
/// number; everything meaningful about the owner lives outside this engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
  pub owner_id:   OwnerId,
  /// Incremented by each publish. Link rows record the version current when
  /// they were last written.
  pub version:    Version,
  pub created_at: DateTime<Utc>,
}
