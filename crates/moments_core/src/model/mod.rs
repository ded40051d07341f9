//! Journaling domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//!
//! # Invariants
//! - Every entry is identified by a stable `MemoId`.
//! - Deletion is a hard removal from the entry list; no tombstones.

pub mod memo;
