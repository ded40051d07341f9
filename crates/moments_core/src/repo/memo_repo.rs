//! Memo list repository on top of a key-value store.
//!
//! # Responsibility
//! - Encode the full entry list as one JSON array under [`MEMOS_KEY`].
//! - Decode it back, reconstructing `date` as a timestamp value.
//!
//! # Invariants
//! - `load` returns `Ok(None)` only when the key is absent.
//! - Decoded lists contain only valid entries with unique ids.

use crate::model::memo::MemoEntry;
use crate::repo::kv_repo::{KeyValueStore, RepoError, RepoResult};
use std::collections::HashSet;

/// Storage key holding the serialized entry list.
pub const MEMOS_KEY: &str = "memos";

/// Repository interface for whole-list memo persistence.
pub trait MemoRepository {
    fn load(&self) -> RepoResult<Option<Vec<MemoEntry>>>;
    fn save(&self, entries: &[MemoEntry]) -> RepoResult<()>;
}

/// Memo repository writing JSON into any [`KeyValueStore`].
pub struct KvMemoRepository<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> KvMemoRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: KeyValueStore> MemoRepository for KvMemoRepository<S> {
    fn load(&self) -> RepoResult<Option<Vec<MemoEntry>>> {
        match self.store.get(MEMOS_KEY)? {
            Some(raw) => decode_memos(&raw).map(Some),
            None => Ok(None),
        }
    }

    fn save(&self, entries: &[MemoEntry]) -> RepoResult<()> {
        let encoded = encode_memos(entries)?;
        self.store.set(MEMOS_KEY, &encoded)
    }
}

/// Serializes an entry list into its durable JSON form.
pub fn encode_memos(entries: &[MemoEntry]) -> RepoResult<String> {
    serde_json::to_string(entries).map_err(RepoError::Encode)
}

/// Parses a durable JSON array back into validated entries.
pub fn decode_memos(raw: &str) -> RepoResult<Vec<MemoEntry>> {
    let entries: Vec<MemoEntry> = serde_json::from_str(raw)
        .map_err(|err| RepoError::InvalidData(format!("memo list is not decodable: {err}")))?;

    let mut seen = HashSet::with_capacity(entries.len());
    for entry in &entries {
        entry.validate().map_err(|err| {
            RepoError::InvalidData(format!("memo `{}` is invalid: {err}", entry.id))
        })?;
        if !seen.insert(entry.id) {
            return Err(RepoError::InvalidData(format!(
                "memo id `{}` appears more than once",
                entry.id
            )));
        }
    }

    Ok(entries)
}
