//! # flatstore - typed in-memory entity stores with flat-file snapshots
//!
//! An [`EntityStore`] owns a collection of records of one type, hands out monotonically
//! increasing ids, and supports partial updates, removal, id lookup, predicate filters and
//! case-insensitive name search. A store can be written to, and rebuilt from, a `|`-delimited
//! text snapshot. Snapshots are replaced atomically, so a failed write never corrupts the
//! previous file.
//!
//! ## Core Concepts
//!
//! - **Record**: a value type with a store-assigned [`EntityId`], creation fields and a patch type
//! - **FlatRecord**: a record with a fixed column layout for snapshot lines
//! - **Snapshot**: one record per line, `<id>|<field>|...`, no header and no escaping
//!
//! ## Usage
//!
//! ```rust
//! use flatstore::records::{Contact, ContactFields, ContactPatch};
//! use flatstore::EntityStore;
//!
//! let mut contacts: EntityStore<Contact> = EntityStore::new();
//! let alice = contacts.add(ContactFields::new("Alice", "555-1000", "a@x.com"))?;
//! contacts.add(ContactFields::new("Bob", "555-2000", "b@x.com"))?;
//!
//! contacts.update(alice, ContactPatch { phone: Some("555-1111".into()), ..Default::default() })?;
//! assert_eq!(contacts.search("ali").len(), 1);
//! assert_eq!(contacts.find_by_id(alice).map(|c| c.phone.as_str()), Some("555-1111"));
//! # Ok::<(), flatstore::StoreError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod entity;
pub mod error;
pub mod records;
pub mod storage;
pub mod validation;

pub use entity::{EntityId, FlatRecord, Record, Searchable};
pub use error::{FieldError, ParseError, StoreError, StoreResult, ValidationError};
pub use storage::{EntityStore, SnapshotOptions, SnapshotReport, StoreConfig, StoreState};
