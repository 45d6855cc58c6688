//! Entity storage.
//!
//! [`EntityStore`] is the in-memory collection; [`snapshot`] holds the flat-file format it
//! persists to; [`StoreConfig`] ties a store to a backing file.

mod config;
pub mod snapshot;
mod store;

pub use config::StoreConfig;
pub use snapshot::{SnapshotOptions, SnapshotReport};
pub use store::{contains_ignore_case, EntityStore, StoreState};
