//! Link lifecycle statuses, the two serving views, and the mapping between
//! them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── LinkStatus ──────────────────────────────────────────────────────────────

/// Lifecycle status of a link row.
///
/// `LiveCopy` marks a shadow: a duplicated item standing in for an edited
/// item in the Public view until the owner publishes. `Archived` is terminal
/// except for the rollback-restore path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
  Editing,
  Published,
  LiveCopy,
  Archived,
}

impl LinkStatus {
  /// Every status, in lifecycle order.
  pub const ALL: [LinkStatus; 4] = [
    LinkStatus::Editing,
    LinkStatus::Published,
    LinkStatus::LiveCopy,
    LinkStatus::Archived,
  ];

  /// The discriminant string stored in the `status` column.
  /// Must match the `rename_all = "snake_case"` serde tags above.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Editing => "editing",
      Self::Published => "published",
      Self::LiveCopy => "live_copy",
      Self::Archived => "archived",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "editing" => Ok(Self::Editing),
      "published" => Ok(Self::Published),
      "live_copy" => Ok(Self::LiveCopy),
      "archived" => Ok(Self::Archived),
      other => Err(Error::UnknownStatus(other.to_string())),
    }
  }
}

impl fmt::Display for LinkStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── View ────────────────────────────────────────────────────────────────────

/// A serving view. Draft is the private working set; Public is what the
/// outside world reads. There are no other views, so an unreal view is
/// unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
  Draft,
  Public,
}

impl View {
  pub const ALL: [View; 2] = [View::Draft, View::Public];

  /// The discriminant string stored in the `view` column.
  /// Must match the `rename_all = "lowercase"` serde tags above.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Draft => "draft",
      Self::Public => "public",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "draft" => Ok(Self::Draft),
      "public" => Ok(Self::Public),
      other => Err(Error::UnknownView(other.to_string())),
    }
  }
}

impl fmt::Display for View {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── StatusViewMap ───────────────────────────────────────────────────────────

/// Which views serve a link of each status.
///
/// Construction validates that every status is mapped exactly once and that
/// at least one status maps to no view at all; without an invisible status,
/// rows could never leave the serving views.
#[derive(Debug, Clone)]
pub struct StatusViewMap {
  entries: Vec<(LinkStatus, Vec<View>)>,
}

impl StatusViewMap {
  pub fn new(entries: Vec<(LinkStatus, Vec<View>)>) -> Result<Self> {
    for status in LinkStatus::ALL {
      match entries.iter().filter(|(s, _)| *s == status).count() {
        0 => return Err(Error::UnmappedStatus(status)),
        1 => {}
        _ => return Err(Error::DuplicateMapEntry(status)),
      }
    }
    if entries.iter().all(|(_, views)| !views.is_empty()) {
      return Err(Error::AllStatusesVisible);
    }
    Ok(Self { entries })
  }

  /// The views serving links of `status`, in the order given at
  /// construction.
  pub fn views_for(&self, status: LinkStatus) -> &[View] {
    self
      .entries
      .iter()
      .find(|(s, _)| *s == status)
      .map(|(_, views)| views.as_slice())
      .unwrap_or(&[])
  }

  /// The statuses served by `view`, in [`LinkStatus::ALL`] order.
  pub fn statuses_in(&self, view: View) -> Vec<LinkStatus> {
    LinkStatus::ALL
      .into_iter()
      .filter(|status| self.views_for(*status).contains(&view))
      .collect()
  }

  pub fn is_visible(&self, status: LinkStatus, view: View) -> bool {
    self.views_for(status).contains(&view)
  }
}

impl Default for StatusViewMap {
  /// Editing→Draft, Published→Draft+Public, LiveCopy→Public, Archived→none.
  fn default() -> Self {
    Self {
      entries: vec![
        (LinkStatus::Editing, vec![View::Draft]),
        (LinkStatus::Published, vec![View::Draft, View::Public]),
        (LinkStatus::LiveCopy, vec![View::Public]),
        (LinkStatus::Archived, vec![]),
      ],
    }
  }
}
