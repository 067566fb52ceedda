//! # Entity Store Module
//!
//! The signature-driven entity/component core:
//! - Identifier families and signature bitsets
//! - The process-wide component type registry
//! - Per-type packed raw storage with lazy deletion
//! - The entity store itself and its query engine
//!
//! Public API exposure is controlled by `lib.rs`.

pub mod error;
pub mod query;
pub mod raw;
pub mod registry;
pub mod types;
pub mod world;
