//! Core types and trait definitions for the weft relationship engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing heavier than serde.

pub mod error;
pub mod fields;
pub mod filter;
pub mod id;
pub mod item;
pub mod link;
pub mod owner;
pub mod status;
pub mod store;

pub use error::{Error, Result};
