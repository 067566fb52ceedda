//! # Reference Manager Module
//!
//! The handle pool and its reference kinds:
//! - Slotted arena with free list and per-slot generation counters
//! - Weak, unique, qualified, and managed references
//! - Deferred handle resolution for deserialization
//!
//! Public API exposure is controlled by `lib.rs`.

pub mod kinds;
pub mod pool;
