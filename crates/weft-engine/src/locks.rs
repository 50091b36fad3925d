//! Per-owner serialisation of versioned operations.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex},
};

use tokio::sync::Mutex as AsyncMutex;
use weft_core::id::OwnerId;

/// Hands out one async mutex per owner.
///
/// Shadow bookkeeping reads link rows and then writes conclusions back; two
/// editors interleaving those steps on the same owner could both decide "no
/// shadow yet" and duplicate twice. Every versioned operation therefore runs
/// under its owner's lock. The store's unique shadow index backstops the
/// invariant against writers outside this process.
#[derive(Default)]
pub struct OwnerLocks {
  inner: Mutex<HashMap<OwnerId, Arc<AsyncMutex<()>>>>,
}

impl OwnerLocks {
  pub fn new() -> Self {
    Self::default()
  }

  /// The lock for `owner`, created on first use.
  pub fn for_owner(&self, owner: OwnerId) -> Arc<AsyncMutex<()>> {
    let mut map = match self.inner.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    };
    map
      .entry(owner)
      .or_insert_with(|| Arc::new(AsyncMutex::new(())))
      .clone()
  }
}
