//! Concrete record types.
//!
//! Each type implements [`Record`](crate::Record), [`FlatRecord`](crate::FlatRecord) and
//! [`Searchable`](crate::Searchable), so any of them can live in an
//! [`EntityStore`](crate::EntityStore) and round-trip through a snapshot file.

mod contact;
mod device;
mod job;
mod product;
mod task;
mod transaction;

pub use contact::{Contact, ContactFields, ContactPatch};
pub use device::{Device, DeviceFields, DeviceKind, DevicePatch};
pub use job::{ApplicationStatus, JobApplication, JobApplicationFields, JobApplicationPatch};
pub use product::{Product, ProductFields, ProductPatch};
pub use task::{Task, TaskFields, TaskPatch};
pub use transaction::{Transaction, TransactionFields, TransactionPatch};
