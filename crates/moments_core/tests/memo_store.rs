use chrono::{DateTime, Local};
use moments_core::db::{open_db, open_db_in_memory, DB_FILE_NAME};
use moments_core::model::memo::{MemoEntry, Mood};
use moments_core::repo::kv_repo::{KeyValueStore, RepoError, RepoResult, SqliteKvStore};
use moments_core::repo::memo_repo::{KvMemoRepository, MemoRepository, MEMOS_KEY};
use moments_core::service::memo_store::{LoadSource, MemoStore, StoreError};
use moments_core::service::seed::{local_datetime, seed_entries};
use std::cell::RefCell;

fn memory_repo() -> KvMemoRepository<SqliteKvStore> {
    KvMemoRepository::new(SqliteKvStore::new(open_db_in_memory().unwrap()))
}

fn entry(content: &str, mood: Option<Mood>, tags: &[&str]) -> MemoEntry {
    MemoEntry::new(
        content,
        local_datetime(2025, 1, 2, 8, 5),
        mood,
        tags.iter().map(|tag| tag.to_string()).collect(),
    )
}

#[test]
fn first_launch_loads_seed_list() {
    let store = MemoStore::load_or_seed(memory_repo());
    assert_eq!(store.source(), LoadSource::SeedMissing);
    assert_eq!(store.entries(), seed_entries().as_slice());
}

#[test]
fn corrupt_storage_falls_back_to_seed() {
    let repo = memory_repo();
    repo.store().set(MEMOS_KEY, "{not json").unwrap();
    let store = MemoStore::load_or_seed(repo);
    assert_eq!(store.source(), LoadSource::SeedFallback);
    assert_eq!(store.len(), seed_entries().len());
}

#[test]
fn stored_entry_with_blank_content_falls_back_to_seed() {
    let repo = memory_repo();
    let raw = format!(
        r#"[{{"id":"{}","content":"   ","date":"2024-12-25T09:30:00+08:00","mood":"hopeful","tags":[]}}]"#,
        uuid::Uuid::now_v7()
    );
    repo.store().set(MEMOS_KEY, &raw).unwrap();
    let store = MemoStore::load_or_seed(repo);
    assert_eq!(store.source(), LoadSource::SeedFallback);
}

#[test]
fn empty_store_plus_one_entry_counts_one() {
    let mut store = MemoStore::with_entries(memory_repo(), Vec::new());
    store
        .prepend(entry("今天...", Some(Mood::Peaceful), &[]))
        .unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(format!("{:02}", store.len()), "01");

    let reloaded = store.repo().load().unwrap().unwrap();
    assert_eq!(reloaded, store.entries());
}

#[test]
fn mutations_round_trip_through_storage_with_temporal_dates() {
    let mut store = MemoStore::with_entries(memory_repo(), Vec::new());
    let older = entry("older", Some(Mood::Nostalgic), &["回忆"]);
    let newer = entry("newer", None, &[]);
    store.prepend(older.clone()).unwrap();
    store.prepend(newer.clone()).unwrap();
    assert_eq!(store.entries()[0].id, newer.id);

    let mut edited = older.clone();
    edited.content = "older, revised".to_string();
    store.replace(edited.clone()).unwrap();
    assert_eq!(store.entries()[1], edited);

    let raw = store.repo().store().get(MEMOS_KEY).unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let stored_date = json[1]["date"].as_str().unwrap();
    let parsed = DateTime::parse_from_rfc3339(stored_date).unwrap();
    assert_eq!(parsed.with_timezone(&Local), older.date);
    assert!(json[0]["mood"].is_null());

    let removed = store.remove(newer.id).unwrap();
    assert_eq!(removed.id, newer.id);
    assert_eq!(store.repo().load().unwrap().unwrap(), vec![edited]);
}

#[test]
fn invalid_and_unknown_mutations_leave_list_unchanged() {
    let mut store = MemoStore::with_entries(memory_repo(), seed_entries());
    let before = store.entries().to_vec();

    assert!(matches!(
        store.prepend(entry("  \n ", None, &[])),
        Err(StoreError::Validation(_))
    ));
    assert!(matches!(
        store.prepend(before[0].clone()),
        Err(StoreError::DuplicateId(_))
    ));
    assert!(matches!(
        store.replace(entry("ghost", None, &[])),
        Err(StoreError::NotFound(_))
    ));
    assert_eq!(store.entries(), before.as_slice());
}

#[test]
fn unknown_mood_string_loads_as_unset() {
    let repo = memory_repo();
    let raw = format!(
        r#"[{{"id":"{}","content":"hi","date":"2024-12-25T09:30:00+08:00","mood":"ecstatic"}}]"#,
        uuid::Uuid::now_v7()
    );
    repo.store().set(MEMOS_KEY, &raw).unwrap();
    let store = MemoStore::load_or_seed(repo);
    assert_eq!(store.source(), LoadSource::Storage);
    assert_eq!(store.entries()[0].mood, None);
    assert!(store.entries()[0].tags.is_empty());
}

#[test]
fn file_database_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DB_FILE_NAME);
    let created = entry("persisted", Some(Mood::Accomplished), &["工作"]);
    {
        let repo = KvMemoRepository::new(SqliteKvStore::new(open_db(&path).unwrap()));
        let mut store = MemoStore::with_entries(repo, Vec::new());
        store.prepend(created.clone()).unwrap();
    }
    let repo = KvMemoRepository::new(SqliteKvStore::new(open_db(&path).unwrap()));
    let store = MemoStore::load_or_seed(repo);
    assert_eq!(store.source(), LoadSource::Storage);
    assert_eq!(store.entries(), [created].as_slice());
}

struct FailingRepo {
    saves: RefCell<usize>,
}

impl MemoRepository for FailingRepo {
    fn load(&self) -> RepoResult<Option<Vec<MemoEntry>>> {
        Ok(None)
    }

    fn save(&self, _entries: &[MemoEntry]) -> RepoResult<()> {
        *self.saves.borrow_mut() += 1;
        Err(RepoError::InvalidData("disk full".to_string()))
    }
}

#[test]
fn persist_failure_is_reported_but_mutation_stands() {
    let repo = FailingRepo {
        saves: RefCell::new(0),
    };
    let mut store = MemoStore::with_entries(repo, Vec::new());
    let result = store.prepend(entry("kept", None, &[]));
    assert!(matches!(result, Err(StoreError::Persist(_))));
    assert_eq!(store.len(), 1);
    assert_eq!(*store.repo().saves.borrow(), 1);
}
