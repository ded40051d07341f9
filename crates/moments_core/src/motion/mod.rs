//! Explicit time model for staged transitions.
//!
//! # Responsibility
//! - Represent every delayed effect as data (`Deadline`, `Interval`, `Tween`)
//!   that owners advance with a caller-supplied `Instant`.
//! - Name the fixed durations of every staged transition in one place.
//!
//! # Invariants
//! - Nothing here reads the clock; callers pass `now` explicitly.
//! - Dropping a `Deadline`/`Interval` is the only cancellation mechanism.

pub mod timer;
pub mod timings;
pub mod tween;

pub use timer::{Deadline, Interval};
pub use tween::{ease_out, Tween};
