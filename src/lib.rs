//! # substrate
//!
//! In-memory object graph substrate for applications that hold thousands of
//! heterogeneous domain objects, compose behavior from small reusable
//! pieces, and pass around references whose dangling hazards are caught
//! explicitly.
//!
//! Two complementary cores:
//!
//! - **Entity store** ([`World`]): entities are opaque integer handles; each
//!   carries a subset of a bounded universe of component types. Components
//!   of one type are stored contiguously; queries iterate entities matching
//!   a signature, pivoting on the smallest required store. Deletion is lazy
//!   and compacted at an explicit fence ([`World::collect_removed`]).
//! - **Reference manager** ([`ReferenceManager`]): a slotted arena of owned
//!   objects addressed by small integer handles, with weak, unique,
//!   qualified, and managed reference kinds giving different lifetime
//!   contracts. Stale references are detected through per-slot generation
//!   counters or nullified through subscriptions.
//!
//! Shared design: stable integer handles, storage separated from identity,
//! generational validity checks, and explicit ownership modes.
//!
//! ## Threading
//! Both cores are single-threaded per store. The only thread-aware piece is
//! [`Mutexed`], meant to be composed over individual shared values.

#![forbid(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![allow(clippy::module_inception)]
#![deny(dead_code)]

pub mod global;
pub mod index;
pub mod refs;
pub mod store;
pub mod sync;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (Public API)
// ─────────────────────────────────────────────────────────────────────────────

pub use index::Ix;

pub use global::{LazyGlobal, ProvidedGlobal};

pub use sync::{Mutexed, ScopedAccess};

pub use store::types::{
    build_signature, ComponentId, ComponentSet, Entity, Qualifier, Signature, Slot,
    COMPONENT_CAP, SIGNATURE_WORDS,
};

pub use store::error::{RegistryError, RegistryResult};

pub use store::registry::{
    aligned_width, component_id_of, components_frozen, freeze_components, registered_id_of,
    struct_info, try_component_id_of, type_count, CloneFn, DropFn, StructInfo,
};

#[cfg(feature = "codec")]
pub use store::registry::{register_component_with_codec, CodecHooks, PrintFn, ReadFn, WriteFn};

pub use store::raw::{RawStore, Relocation};

pub use store::world::{QualifiedEntity, World};

pub use refs::pool::{
    Generation, Handle, PendingRef, Pooled, ReferenceManager, GEN_FREED, GEN_INVALIDATED,
    GEN_NEVER_USED,
};

pub use refs::kinds::{ManagedRef, QualifiedRef, UniqueRef, WeakRef};

// ─────────────────────────────────────────────────────────────────────────────
// Prelude
// ─────────────────────────────────────────────────────────────────────────────

/// Commonly used substrate types.
///
/// Import with:
/// ```rust
/// use substrate::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        component_id_of, ComponentId, ComponentSet, Entity, ManagedRef, Pooled, QualifiedEntity,
        QualifiedRef, ReferenceManager, Signature, UniqueRef, WeakRef, World,
    };
}
