//! The entity store.
//!
//! `EntityStore<T>` owns an insertion-ordered `Vec<T>` and a monotonic id counter. Every
//! mutation is applied in memory immediately. Persistence is a separate, explicit call
//! ([`EntityStore::snapshot`], [`EntityStore::flush`]) unless the store was opened with
//! `auto_snapshot`, in which case each successful mutation is followed by a snapshot and
//! rolled back if that snapshot fails.
//!
//! The store is not synchronized. Share it across threads behind a `Mutex`.

use std::path::{Path, PathBuf};

use crate::entity::{EntityId, FlatRecord, Record, Searchable};
use crate::error::{StoreError, StoreResult};
use crate::storage::config::StoreConfig;
use crate::storage::snapshot::{self, SnapshotOptions, SnapshotReport};

/// Case-insensitive substring test used for every name/title search.
///
/// An empty needle matches everything.
#[must_use]
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Whether the store holds anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    /// No entities.
    Empty,
    /// At least one entity.
    Populated,
}

type PersistFn<T> = fn(&Path, &[T], SnapshotOptions) -> StoreResult<SnapshotReport>;

/// Where and how a store persists itself.
struct Backing<T> {
    path: PathBuf,
    options: SnapshotOptions,
    auto: bool,
    persist: PersistFn<T>,
}

impl<T> Clone for Backing<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            options: self.options,
            auto: self.auto,
            persist: self.persist,
        }
    }
}

impl<T> std::fmt::Debug for Backing<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backing")
            .field("path", &self.path)
            .field("options", &self.options)
            .field("auto", &self.auto)
            .finish_non_exhaustive()
    }
}

/// Identity-keyed, insertion-ordered collection of records.
///
/// # Examples
///
/// ```
/// use flatstore::records::{Contact, ContactFields};
/// use flatstore::EntityStore;
///
/// let mut store: EntityStore<Contact> = EntityStore::new();
/// let alice = store.add(ContactFields::new("Alice", "555-1000", "a@x.com")).unwrap();
/// let bob = store.add(ContactFields::new("Bob", "555-2000", "b@x.com")).unwrap();
/// store.remove(alice).unwrap();
/// let carol = store.add(ContactFields::new("Carol", "555-3000", "c@x.com")).unwrap();
///
/// assert_eq!((bob.get(), carol.get()), (2, 3));
/// let names: Vec<_> = store.list_all().iter().map(|c| c.name.as_str()).collect();
/// assert_eq!(names, ["Bob", "Carol"]);
/// ```
#[derive(Debug, Clone)]
pub struct EntityStore<T> {
    entities: Vec<T>,
    next_id: EntityId,
    backing: Option<Backing<T>>,
}

impl<T: Record> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> EntityStore<T> {
    /// Create an empty, memory-only store. The first id handed out is 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            next_id: EntityId::FIRST,
            backing: None,
        }
    }

    /// Build a store around already-identified records, keeping their order.
    ///
    /// The id counter resumes after the largest id present.
    fn hydrate(entities: Vec<T>) -> Self {
        let next_id = entities
            .iter()
            .map(Record::id)
            .max()
            .map_or(EntityId::FIRST, EntityId::next);
        Self {
            entities,
            next_id,
            backing: None,
        }
    }

    /// Create a record from `fields` and append it.
    ///
    /// The id is consumed only once validation passes. With `auto_snapshot`, a failed snapshot
    /// removes the record again (its id stays consumed) and returns the I/O error.
    ///
    /// # Errors
    /// - `Validation` if `fields` break a domain constraint
    /// - `Io` if the follow-up auto-snapshot fails
    pub fn add(&mut self, fields: T::Fields) -> StoreResult<EntityId> {
        let id = self.next_id;
        let record = T::create(id, fields)?;
        debug_assert_eq!(record.id(), id, "Record::create must keep the assigned id");
        self.next_id = id.next();
        self.entities.push(record);

        if let Err(e) = self.persist_after_mutation() {
            self.entities.pop();
            tracing::warn!(%id, error = %e, "Rolled back add after failed auto-snapshot");
            return Err(e);
        }
        Ok(id)
    }

    /// Apply `patch` to the record with `id`.
    ///
    /// The patch is applied to a copy and validated before it replaces the stored record, so a
    /// rejected patch changes nothing. Fields left `None` keep their value.
    ///
    /// # Errors
    /// - `NotFound` if no record has `id`
    /// - `Validation` if the patched record breaks a constraint
    /// - `Io` if the follow-up auto-snapshot fails (the update is rolled back)
    pub fn update(&mut self, id: EntityId, patch: T::Patch) -> StoreResult<()> {
        let idx = self.position(id).ok_or(StoreError::NotFound { id })?;

        let mut candidate = self.entities[idx].clone();
        candidate.apply(patch)?;
        candidate.validate()?;
        debug_assert_eq!(candidate.id(), id, "Record::apply must not change the id");

        let previous = std::mem::replace(&mut self.entities[idx], candidate);

        if let Err(e) = self.persist_after_mutation() {
            self.entities[idx] = previous;
            tracing::warn!(%id, error = %e, "Rolled back update after failed auto-snapshot");
            return Err(e);
        }
        Ok(())
    }

    /// Remove and return the record with `id`. The id is never handed out again.
    ///
    /// # Errors
    /// - `NotFound` if no record has `id`
    /// - `Io` if the follow-up auto-snapshot fails (the record is put back in place)
    pub fn remove(&mut self, id: EntityId) -> StoreResult<T> {
        let idx = self.position(id).ok_or(StoreError::NotFound { id })?;
        let removed = self.entities.remove(idx);

        if let Err(e) = self.persist_after_mutation() {
            self.entities.insert(idx, removed);
            tracing::warn!(%id, error = %e, "Rolled back remove after failed auto-snapshot");
            return Err(e);
        }
        Ok(removed)
    }

    /// Exact lookup by id.
    #[must_use]
    pub fn find_by_id(&self, id: EntityId) -> Option<&T> {
        self.entities.iter().find(|e| e.id() == id)
    }

    /// Whether a record with `id` exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.position(id).is_some()
    }

    /// Every record matching `predicate`, in insertion order.
    pub fn find_by_predicate<P>(&self, mut predicate: P) -> Vec<&T>
    where
        P: FnMut(&T) -> bool,
    {
        self.entities.iter().filter(|e| predicate(e)).collect()
    }

    /// All records in insertion order.
    #[must_use]
    pub fn list_all(&self) -> &[T] {
        &self.entities
    }

    /// Iterate over all records in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entities.iter()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// [`StoreState::Empty`] or [`StoreState::Populated`].
    #[must_use]
    pub fn state(&self) -> StoreState {
        if self.entities.is_empty() {
            StoreState::Empty
        } else {
            StoreState::Populated
        }
    }

    /// The id the next successful [`add`](Self::add) will return.
    #[must_use]
    pub const fn next_id(&self) -> EntityId {
        self.next_id
    }

    /// The backing snapshot path, if the store was opened with one.
    #[must_use]
    pub fn backing_path(&self) -> Option<&Path> {
        self.backing.as_ref().map(|b| b.path.as_path())
    }

    fn position(&self, id: EntityId) -> Option<usize> {
        self.entities.iter().position(|e| e.id() == id)
    }

    fn persist_after_mutation(&self) -> StoreResult<()> {
        match &self.backing {
            Some(backing) if backing.auto => {
                (backing.persist)(&backing.path, &self.entities, backing.options).map(|_| ())
            }
            _ => Ok(()),
        }
    }
}

impl<T: Record + Searchable> EntityStore<T> {
    /// Records whose search text contains `query`, ignoring case, in insertion order.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&T> {
        self.find_by_predicate(|e| contains_ignore_case(e.search_text(), query))
    }
}

impl<T: FlatRecord> EntityStore<T> {
    /// Open a store as configured.
    ///
    /// If the configured file exists it is restored; otherwise the store starts empty. Temp
    /// files left by an interrupted snapshot are removed first. Without a path this is
    /// [`EntityStore::new`].
    ///
    /// # Errors
    /// - `InvalidConfig` if the configuration does not validate
    /// - `Parse` / `Io` from restoring an existing file
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        let config = config.validate()?;
        let options = config.snapshot_options();
        let Some(path) = config.path else {
            return Ok(Self::new());
        };

        let stale = snapshot::remove_stale_temps(&path);
        if stale > 0 {
            tracing::info!(path = %path.display(), stale, "Removed stale snapshot temp files");
        }

        let mut store = if path.exists() {
            Self::hydrate(snapshot::read_snapshot(&path, options)?)
        } else {
            Self::new()
        };

        tracing::info!(
            path = %path.display(),
            entities = store.len(),
            next_id = %store.next_id,
            "Opened entity store"
        );

        store.backing = Some(Backing {
            path,
            options,
            auto: config.auto_snapshot,
            persist: snapshot::write_snapshot::<T>,
        });
        Ok(store)
    }

    /// Load a store from the snapshot at `path`, all or nothing.
    ///
    /// The returned store is memory-only; use [`open`](Self::open) to keep the path attached.
    ///
    /// # Errors
    /// - `Io` if the file cannot be read
    /// - `Parse` naming the first malformed line
    pub fn restore(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let store = Self::hydrate(snapshot::read_snapshot(path, SnapshotOptions::default())?);
        tracing::info!(
            path = %path.display(),
            entities = store.len(),
            "Restored entity store"
        );
        Ok(store)
    }

    /// Write every record to `path`, atomically replacing the file.
    ///
    /// The in-memory store is never modified, whatever the outcome.
    ///
    /// # Errors
    /// - `Validation` if a field contains the reserved delimiter or a line break
    /// - `Io` if writing fails; the previous file at `path` is left intact
    pub fn snapshot(&self, path: impl AsRef<Path>) -> StoreResult<SnapshotReport> {
        let options = self
            .backing
            .as_ref()
            .map_or_else(SnapshotOptions::default, |b| b.options);
        snapshot::write_snapshot(path.as_ref(), &self.entities, options)
    }

    /// Snapshot to the backing path. Returns `None` for a memory-only store.
    ///
    /// # Errors
    /// As [`snapshot`](Self::snapshot).
    pub fn flush(&self) -> StoreResult<Option<SnapshotReport>> {
        match &self.backing {
            Some(backing) => (backing.persist)(&backing.path, &self.entities, backing.options).map(Some),
            None => Ok(None),
        }
    }

    /// Flush a final snapshot and discard the store.
    ///
    /// # Errors
    /// As [`flush`](Self::flush).
    pub fn close(self) -> StoreResult<Option<SnapshotReport>> {
        self.flush()
    }
}

impl<'a, T> IntoIterator for &'a EntityStore<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}
