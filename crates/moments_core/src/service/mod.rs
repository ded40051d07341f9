//! Core use-case services.
//!
//! # Responsibility
//! - Keep the ordered entry list and mirror it into durable storage.
//! - Provide the fixed seed list used when storage is empty or unreadable.

pub mod memo_store;
pub mod seed;
