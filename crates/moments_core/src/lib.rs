//! Core domain logic for the Moments journal.
//! Terminal front ends drive this crate with input events and a monotonic clock.

pub mod background;
pub mod config;
pub mod controller;
pub mod db;
pub mod editor;
pub mod logging;
pub mod model;
pub mod motion;
pub mod quotes;
pub mod repo;
pub mod service;
pub mod timeline;

pub use config::{load_config, ConfigError, MomentsConfig};
pub use controller::{AppController, TransitionRejected, ViewFlags, ViewState};
pub use editor::{EditorKey, EntryEditor, FocusRegion};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::memo::{MemoEntry, MemoId, MemoValidationError, Mood};
pub use repo::kv_repo::{KeyValueStore, RepoError, RepoResult, SqliteKvStore};
pub use repo::memo_repo::{KvMemoRepository, MemoRepository};
pub use service::memo_store::{LoadSource, MemoStore, StoreError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
