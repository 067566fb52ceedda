//! # Component Type Registry
//!
//! A process-wide registry that assigns each distinct component type a dense
//! [`ComponentId`] and records the type-erased capability table
//! ([`StructInfo`]) the raw stores need to operate on opaque payload bytes.
//!
//! ## Purpose
//! Raw component stores hold plain bytes; everything type-specific — how wide
//! a slot is, how to destroy an object, how to clone one, optionally how to
//! read/write/print one — lives here, erased into function pointers produced
//! from a generic helper at registration time.
//!
//! ## Design
//! - Ids are assigned **on first mention**: [`component_id_of`] registers the
//!   type if it has not been seen before and is idempotent afterwards.
//! - The counter is bounded by [`COMPONENT_CAP`]; exceeding it is an error.
//! - [`freeze_components`] locks the id space once a world's setup phase is
//!   done, making later first-mentions a hard error instead of a silent
//!   late registration.
//!
//! ## Invariants
//! - Ids are unique, dense, and stable for the process lifetime.
//! - Every assigned id has a matching [`StructInfo`] whose `width` is the
//!   type's size rounded up to a multiple of 8.
//!
//! ## Concurrency
//! First-use registration is thread-safe: the registry lives behind the
//! crate's [`LazyGlobal`] read/write lock. Ids are written once and read
//! thereafter.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::mem::{align_of, size_of};
use std::ptr;

use crate::global::LazyGlobal;
use crate::store::error::{capacity_exceeded, RegistryError, RegistryResult};
use crate::store::types::{ComponentId, COMPONENT_CAP};

/// Erased destructor: drops the object at `ptr` in place.
pub type DropFn = unsafe fn(*mut u8);

/// Erased copy constructor: clones the object at `source` into the
/// uninitialized slot at `target`.
pub type CloneFn = unsafe fn(*const u8, *mut u8);

#[cfg(feature = "codec")]
pub use codec::{CodecHooks, PrintFn, ReadFn, WriteFn};

/// Type-erased capability table for one registered component type.
///
/// ## Fields
/// - `name`: the Rust type name, for diagnostics and codec resolution.
/// - `id`: the dense id assigned by the registry.
/// - `width`: per-object size padded up to a multiple of 8 bytes.
/// - `type_id`: runtime type identity, checked by typed raw-store accessors.
/// - `drop_fn` / `clone_fn`: erased destructor and copy constructor.
/// - `codec`: optional read/write/print hooks (feature `codec`).
#[derive(Clone, Copy)]
pub struct StructInfo {
    /// Rust type name for diagnostics.
    pub name: &'static str,

    /// Dense id assigned by the registry.
    pub id: ComponentId,

    /// Padded per-object width in bytes (multiple of 8).
    pub width: usize,

    /// Runtime type identity of the component.
    pub type_id: TypeId,

    /// Erased in-place destructor.
    pub drop_fn: DropFn,

    /// Erased copy constructor into uninitialized memory.
    pub clone_fn: CloneFn,

    /// Optional codec hooks installed by `register_component_with_codec`.
    #[cfg(feature = "codec")]
    pub codec: Option<CodecHooks>,
}

/// Rounds a size up to the 8-byte slot width used by the raw stores.
pub const fn aligned_width(size: usize) -> usize {
    (size + 7) & !7
}

unsafe fn drop_erased<T>(object: *mut u8) {
    unsafe { ptr::drop_in_place(object.cast::<T>()) }
}

unsafe fn clone_erased<T: Clone>(source: *const u8, target: *mut u8) {
    let value = unsafe { (*source.cast::<T>()).clone() };
    unsafe { ptr::write(target.cast::<T>(), value) }
}

impl StructInfo {
    /// Builds the capability table for `T` with a placeholder id.
    fn of<T: Clone + Send + Sync + 'static>() -> Self {
        Self {
            name: type_name::<T>(),
            id: ComponentId::null(),
            width: aligned_width(size_of::<T>()),
            type_id: TypeId::of::<T>(),
            drop_fn: drop_erased::<T>,
            clone_fn: clone_erased::<T>,
            #[cfg(feature = "codec")]
            codec: None,
        }
    }

    /// Returns `true` if this table describes type `T`.
    #[inline]
    pub fn matches_type<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

/// Process-wide mapping between Rust types and dense component ids.
struct ComponentRegistry {
    next_id: u32,
    by_type: HashMap<TypeId, ComponentId>,
    by_id: Vec<Option<StructInfo>>,
    frozen: bool,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self {
            next_id: 0,
            by_type: HashMap::new(),
            by_id: vec![None; COMPONENT_CAP],
            frozen: false,
        }
    }
}

static REGISTRY: LazyGlobal<ComponentRegistry> = LazyGlobal::new();

impl ComponentRegistry {
    fn get_or_register<T: Clone + Send + Sync + 'static>(&mut self) -> RegistryResult<ComponentId> {
        let type_id = TypeId::of::<T>();
        if let Some(&existing) = self.by_type.get(&type_id) {
            return Ok(existing);
        }

        if self.frozen {
            return Err(RegistryError::Frozen { name: type_name::<T>() });
        }
        if size_of::<T>() == 0 {
            return Err(RegistryError::ZeroSized { name: type_name::<T>() });
        }
        if align_of::<T>() > 8 {
            return Err(RegistryError::OverAligned {
                name: type_name::<T>(),
                align: align_of::<T>(),
            });
        }
        if self.next_id as usize >= COMPONENT_CAP {
            return Err(capacity_exceeded());
        }

        let id = ComponentId::new(self.next_id);
        self.next_id += 1;

        let mut info = StructInfo::of::<T>();
        info.id = id;

        self.by_type.insert(type_id, id);
        self.by_id[id.index()] = Some(info);

        tracing::debug!(component = info.name, id = id.raw(), width = info.width, "registered component type");

        Ok(id)
    }
}

/// Returns the dense id for `T`, assigning one on first mention.
///
/// Idempotent: every call for the same `T` returns the same id.
///
/// ## Errors
/// Fails if the id space is exhausted, the registry is frozen, or `T` is
/// zero-sized / over-aligned.
pub fn try_component_id_of<T: Clone + Send + Sync + 'static>() -> RegistryResult<ComponentId> {
    REGISTRY.with_mut(|registry| registry.get_or_register::<T>())
}

/// Returns the dense id for `T`, assigning one on first mention.
///
/// ## Panics
/// Panics on any [`RegistryError`]; exceeding the type capacity is a
/// programming error.
pub fn component_id_of<T: Clone + Send + Sync + 'static>() -> ComponentId {
    match try_component_id_of::<T>() {
        Ok(id) => id,
        Err(error) => panic!("component registration failed: {error}"),
    }
}

/// Returns the id for `T` only if it was already registered.
pub fn registered_id_of<T: 'static>() -> Option<ComponentId> {
    REGISTRY.with(|registry| registry.by_type.get(&TypeId::of::<T>()).copied())
}

/// Locks the id space: later first-mentions of new types become errors.
pub fn freeze_components() {
    REGISTRY.with_mut(|registry| registry.frozen = true);
}

/// Returns `true` if the registry has been frozen.
pub fn components_frozen() -> bool {
    REGISTRY.with(|registry| registry.frozen)
}

/// Returns the capability table for a registered id.
pub fn struct_info(component_id: ComponentId) -> Option<StructInfo> {
    REGISTRY.with(|registry| {
        registry.by_id.get(component_id.index()).and_then(|slot| *slot)
    })
}

/// Number of component types registered so far.
pub fn type_count() -> usize {
    REGISTRY.with(|registry| registry.next_id as usize)
}

#[cfg(feature = "codec")]
mod codec {
    use super::*;
    use std::fmt;
    use std::io;

    use serde::de::DeserializeOwned;
    use serde::Serialize;

    /// Erased reader: decodes one object from the stream into the
    /// uninitialized slot at `target`.
    pub type ReadFn = unsafe fn(&mut dyn io::Read, *mut u8) -> io::Result<()>;

    /// Erased writer: encodes the object at `source` onto the stream.
    pub type WriteFn = unsafe fn(&mut dyn io::Write, *const u8) -> io::Result<()>;

    /// Erased printer: debug-formats the object at `source`.
    pub type PrintFn = unsafe fn(*const u8, &mut dyn fmt::Write) -> fmt::Result;

    /// Optional codec hooks resolved by an external serialization layer.
    ///
    /// The wire format is MessagePack; the hooks only move single objects,
    /// whole-store framing is the collaborator's concern.
    #[derive(Clone, Copy)]
    pub struct CodecHooks {
        /// Decodes one object in place.
        pub read: ReadFn,

        /// Encodes one object.
        pub write: WriteFn,

        /// Debug-formats one object.
        pub print: PrintFn,
    }

    unsafe fn read_erased<T: DeserializeOwned>(
        reader: &mut dyn io::Read,
        target: *mut u8,
    ) -> io::Result<()> {
        let value: T = rmp_serde::from_read(&mut *reader)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        unsafe { ptr::write(target.cast::<T>(), value) }
        Ok(())
    }

    unsafe fn write_erased<T: Serialize>(
        writer: &mut dyn io::Write,
        source: *const u8,
    ) -> io::Result<()> {
        let value = unsafe { &*source.cast::<T>() };
        rmp_serde::encode::write(&mut &mut *writer, value)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    unsafe fn print_erased<T: fmt::Debug>(
        source: *const u8,
        out: &mut dyn fmt::Write,
    ) -> fmt::Result {
        let value = unsafe { &*source.cast::<T>() };
        write!(out, "{value:?}")
    }

    /// Registers `T` (or finds its existing id) and installs codec hooks.
    ///
    /// Safe to call on an already-registered type: the hooks are added to
    /// the existing capability table.
    pub fn register_component_with_codec<T>() -> RegistryResult<ComponentId>
    where
        T: Clone + Send + Sync + 'static + Serialize + DeserializeOwned + fmt::Debug,
    {
        REGISTRY.with_mut(|registry| {
            let id = registry.get_or_register::<T>()?;
            let info = registry.by_id[id.index()]
                .as_mut()
                .expect("registered id has no capability table");
            info.codec = Some(CodecHooks {
                read: read_erased::<T>,
                write: write_erased::<T>,
                print: print_erased::<T>,
            });
            Ok(id)
        })
    }
}

#[cfg(feature = "codec")]
pub use codec::register_component_with_codec;
