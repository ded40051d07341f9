//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the durable key-value contract the entry list is mirrored into.
//! - Isolate SQLite and JSON encoding details from the entry store.
//!
//! # Invariants
//! - Memo lists are written whole under one key; there are no partial updates.
//! - Decoding rejects any entry failing `MemoEntry::validate()`.

pub mod kv_repo;
pub mod memo_repo;
