//! Entry store: ordered in-memory list mirrored into durable storage.
//!
//! # Responsibility
//! - Hold the journal entries in display order (newest insertions first).
//! - Write the whole list through the repository after every mutation.
//! - Fall back to the seed list when storage is absent or unreadable.
//!
//! # Invariants
//! - Only entries passing `MemoEntry::validate()` enter the list.
//! - Ids are unique across the list.
//! - Edits replace in place; list position never changes on edit.

use crate::model::memo::{MemoEntry, MemoId, MemoValidationError};
use crate::repo::kv_repo::RepoError;
use crate::repo::memo_repo::MemoRepository;
use crate::service::seed::seed_entries;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Where the initial list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Storage,
    /// Key absent: first launch.
    SeedMissing,
    /// Stored value could not be read or decoded.
    SeedFallback,
}

/// Entry store mutation error.
#[derive(Debug)]
pub enum StoreError {
    /// Entry rejected; the list is unchanged.
    Validation(MemoValidationError),
    /// No entry with this id; the list is unchanged.
    NotFound(MemoId),
    /// An entry with this id already exists; the list is unchanged.
    DuplicateId(MemoId),
    /// The in-memory list was updated but writing it through failed.
    Persist(RepoError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "memo not found: {id}"),
            Self::DuplicateId(id) => write!(f, "memo id already present: {id}"),
            Self::Persist(err) => write!(f, "memo list not persisted: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persist(err) => Some(err),
            Self::NotFound(_) | Self::DuplicateId(_) => None,
        }
    }
}

impl From<MemoValidationError> for StoreError {
    fn from(value: MemoValidationError) -> Self {
        Self::Validation(value)
    }
}

/// In-memory entry list backed by a [`MemoRepository`].
pub struct MemoStore<R: MemoRepository> {
    repo: R,
    entries: Vec<MemoEntry>,
    source: LoadSource,
}

impl<R: MemoRepository> MemoStore<R> {
    /// Loads the persisted list, or the seed list when nothing usable is stored.
    ///
    /// Never fails: storage problems are logged and replaced by the seed.
    pub fn load_or_seed(repo: R) -> Self {
        let (entries, source) = match repo.load() {
            Ok(Some(entries)) => (entries, LoadSource::Storage),
            Ok(None) => (seed_entries(), LoadSource::SeedMissing),
            Err(err) => {
                warn!(
                    "event=memo_load module=store status=fallback error_code=memo_load_failed error={}",
                    err
                );
                (seed_entries(), LoadSource::SeedFallback)
            }
        };
        info!(
            "event=memo_load module=store status=ok source={:?} count={}",
            source,
            entries.len()
        );
        Self {
            repo,
            entries,
            source,
        }
    }

    /// Creates a store over an explicit list without reading storage.
    pub fn with_entries(repo: R, entries: Vec<MemoEntry>) -> Self {
        Self {
            repo,
            entries,
            source: LoadSource::Storage,
        }
    }

    pub fn entries(&self) -> &[MemoEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: MemoId) -> Option<&MemoEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn source(&self) -> LoadSource {
        self.source
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Inserts a new entry at the front of the list.
    pub fn prepend(&mut self, entry: MemoEntry) -> Result<(), StoreError> {
        entry.validate()?;
        if self.get(entry.id).is_some() {
            return Err(StoreError::DuplicateId(entry.id));
        }
        let id = entry.id;
        self.entries.insert(0, entry);
        self.persist("memo_create", id)
    }

    /// Replaces the entry with the same id, keeping its list position.
    pub fn replace(&mut self, entry: MemoEntry) -> Result<(), StoreError> {
        entry.validate()?;
        let id = entry.id;
        let slot = self
            .entries
            .iter_mut()
            .find(|existing| existing.id == id)
            .ok_or(StoreError::NotFound(id))?;
        *slot = entry;
        self.persist("memo_update", id)
    }

    /// Removes the entry with `id`.
    pub fn remove(&mut self, id: MemoId) -> Result<MemoEntry, StoreError> {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or(StoreError::NotFound(id))?;
        let removed = self.entries.remove(position);
        self.persist("memo_delete", id)?;
        Ok(removed)
    }

    fn persist(&self, event: &str, id: MemoId) -> Result<(), StoreError> {
        match self.repo.save(&self.entries) {
            Ok(()) => {
                info!(
                    "event={event} module=store status=ok memo_id={id} count={}",
                    self.entries.len()
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event={event} module=store status=error memo_id={id} error_code=memo_persist_failed error={}",
                    err
                );
                Err(StoreError::Persist(err))
            }
        }
    }
}
