//! The weft versioning engine.
//!
//! Builds the shadow-copy state machine on top of any
//! [`weft_core::store::RelationStore`]: [`LinkSet`] is the plain scoped link
//! primitive, [`VersionedLinkSet`] the status state machine over it, and
//! [`OwnerLifecycle`] the owner-event layer that drives publishes,
//! rollbacks, and pre-write snapshots.

pub mod error;
pub mod lifecycle;
pub mod locks;
pub mod set;
pub mod versioned;

pub use error::{Error, Result};
pub use lifecycle::{OwnerLifecycle, RelationDef};
pub use locks::OwnerLocks;
pub use set::LinkSet;
pub use versioned::{
  EditContext, PublishOutcome, RollbackOutcome, VersionedLinkSet,
};

#[cfg(test)]
mod tests;
