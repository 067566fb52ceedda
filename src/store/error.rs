//! Error types for component registration.
//!
//! The store's error handling is partitioned the way the public API
//! documents it: misuse of live entities and slots is a programming error and
//! panics with a precise message; absence is modelled with `Option`; and the
//! one genuinely fallible operation — registering a component type — returns
//! a structured [`RegistryError`].
//!
//! Each variant carries enough context to make the failure actionable
//! without reproducing it: the offending type name, the violated limit, or
//! the alignment that could not be honored.

use std::fmt;

use crate::store::types::COMPONENT_CAP;

/// Failure modes of component type registration.
///
/// ### Variants
/// * `CapacityExceeded` — every dense id in `[0, COMPONENT_CAP)` is taken.
/// * `Frozen` — a new type was mentioned after [`freeze_components`] locked
///   the id space.
/// * `ZeroSized` — the type has no payload bytes; the packed stores cannot
///   address it.
/// * `OverAligned` — the type's alignment exceeds the 8-byte slot alignment
///   the payload buffers guarantee.
///
/// [`freeze_components`]: crate::store::registry::freeze_components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// The component id space is exhausted.
    CapacityExceeded {
        /// The fixed id capacity that was hit.
        cap: usize,
    },

    /// Registration was attempted after the registry was frozen.
    Frozen {
        /// Name of the type that could not be registered.
        name: &'static str,
    },

    /// The component type is zero-sized.
    ZeroSized {
        /// Name of the rejected type.
        name: &'static str,
    },

    /// The component type's alignment exceeds the storage guarantee.
    OverAligned {
        /// Name of the rejected type.
        name: &'static str,

        /// The type's required alignment in bytes.
        align: usize,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::CapacityExceeded { cap } => {
                write!(f, "component type limit reached (capacity {cap})")
            }
            RegistryError::Frozen { name } => {
                write!(f, "cannot register {name}: registry is frozen")
            }
            RegistryError::ZeroSized { name } => {
                write!(f, "cannot register zero-sized component {name}")
            }
            RegistryError::OverAligned { name, align } => {
                write!(
                    f,
                    "cannot register {name}: alignment {align} exceeds the 8-byte slot guarantee"
                )
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Shorthand constructor for the capacity failure, using the crate-wide cap.
pub(crate) fn capacity_exceeded() -> RegistryError {
    RegistryError::CapacityExceeded { cap: COMPONENT_CAP }
}
