//! Per-type packed component storage with lazy deletion.
//!
//! A [`RawStore`] owns every live component of one registered type as a
//! contiguous byte buffer, with a parallel back-reference array mapping each
//! slot to its owning entity. Deletion is lazy: the object is destructed
//! immediately but its bytes stay put until [`RawStore::pack_deletions`]
//! compacts the buffer and reports which surviving slots moved.

use std::fmt;
use std::ptr;

use crate::store::registry::StructInfo;
use crate::store::types::{Entity, Slot};

/// Initial object capacity allocated on the first insert.
const INITIAL_RESERVED: usize = 16;

/// Records one slot relocation performed during compaction.
///
/// The component that used to live at the store's top slot now lives at
/// `slot`; `new_owner` is the entity whose routing entry must be repaired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Relocation {
    /// The hole the top component was moved into.
    pub slot: Slot,

    /// Owner of the moved component.
    pub new_owner: Entity,
}

/// Packed storage for all components of a single type.
///
/// Invariants:
/// - Slot 0 is reserved; live slots are `[1, end)`.
/// - A slot is live iff its back-reference is a non-null entity. Removal
///   destructs the object, nulls the back-reference, and queues the slot in
///   `pending` until the next compaction.
/// - `payload` is backed by `u64` words so every slot is 8-byte aligned;
///   `width` is a multiple of 8.
pub struct RawStore {
    info: Option<StructInfo>,
    width: usize,
    reserved: usize,
    end: u32,
    payload: Vec<u64>,
    back_refs: Vec<Entity>,
    pending: Vec<Slot>,
}

impl Default for RawStore {
    fn default() -> Self {
        Self {
            info: None,
            width: 0,
            reserved: 0,
            end: 0,
            payload: Vec::new(),
            back_refs: Vec::new(),
            pending: Vec::new(),
        }
    }
}

impl RawStore {
    /// One past the last allocated slot. Zero until the first insert.
    #[inline]
    pub fn end(&self) -> u32 {
        self.end
    }

    /// Number of slots queued for compaction.
    #[inline]
    pub fn pending_deletions(&self) -> usize {
        self.pending.len()
    }

    /// Number of live objects.
    #[inline]
    pub fn live_count(&self) -> usize {
        (self.end as usize).saturating_sub(1) - self.pending.len()
    }

    /// The capability table this store was initialized with, if any.
    #[inline]
    pub fn info(&self) -> Option<&StructInfo> {
        self.info.as_ref()
    }

    #[inline]
    fn read_ptr(&self, slot: Slot) -> *const u8 {
        debug_assert!(slot.index() < self.reserved);
        unsafe { self.payload.as_ptr().cast::<u8>().add(slot.index() * self.width) }
    }

    #[inline]
    fn write_ptr(&mut self, slot: Slot) -> *mut u8 {
        debug_assert!(slot.index() < self.reserved);
        unsafe { self.payload.as_mut_ptr().cast::<u8>().add(slot.index() * self.width) }
    }

    fn grow(&mut self) {
        self.reserved *= 2;
        self.payload.resize(self.reserved * self.width / 8, 0);
    }

    fn initialize(&mut self, info: &StructInfo) {
        debug_assert!(info.width % 8 == 0 && info.width > 0);
        self.info = Some(*info);
        self.width = info.width;
        self.reserved = INITIAL_RESERVED;
        self.end = 1;
        self.payload = vec![0u64; self.reserved * self.width / 8];
        self.back_refs = vec![Entity::null()];
    }

    fn expect_info(&self) -> &StructInfo {
        self.info.as_ref().expect("raw store was never initialized")
    }

    fn check_typed<T: 'static>(&self) {
        let info = self.expect_info();
        assert!(
            info.matches_type::<T>(),
            "raw store holds {}, not {}",
            info.name,
            std::any::type_name::<T>()
        );
    }

    fn check_live(&self, slot: Slot) {
        assert!(slot.is_some(), "slot 0 is reserved");
        assert!(slot.raw() < self.end, "slot {slot} out of range (end {})", self.end);
        assert!(
            self.back_refs[slot.index()].is_some(),
            "slot {slot} was removed and not yet compacted"
        );
    }

    /// Appends a component owned by `owner`, returning its slot.
    ///
    /// The first insert allocates capacity for [`INITIAL_RESERVED`] objects;
    /// a full store doubles.
    pub fn add<T: 'static>(&mut self, info: &StructInfo, owner: Entity, value: T) -> Slot {
        if self.reserved == 0 {
            self.initialize(info);
        }
        self.check_typed::<T>();
        debug_assert!(owner.is_some(), "components cannot be owned by the null entity");

        if self.end as usize == self.reserved {
            self.grow();
        }

        let slot = Slot::new(self.end);
        unsafe { ptr::write(self.write_ptr(slot).cast::<T>(), value) }
        self.back_refs.push(owner);
        self.end += 1;
        slot
    }

    /// Returns the component at `slot`.
    ///
    /// ## Panics
    /// Panics on the reserved slot, an out-of-range slot, a removed slot, or
    /// a type mismatch.
    pub fn get<T: 'static>(&self, slot: Slot) -> &T {
        self.check_typed::<T>();
        self.check_live(slot);
        unsafe { &*self.read_ptr(slot).cast::<T>() }
    }

    /// Mutable form of [`RawStore::get`].
    pub fn get_mut<T: 'static>(&mut self, slot: Slot) -> &mut T {
        self.check_typed::<T>();
        self.check_live(slot);
        unsafe { &mut *self.write_ptr(slot).cast::<T>() }
    }

    /// Returns the entity owning `slot`, or the null entity if the slot was
    /// removed and awaits compaction.
    pub fn back_ref(&self, slot: Slot) -> Entity {
        assert!(slot.is_some(), "slot 0 is reserved");
        assert!(slot.raw() < self.end, "slot {slot} out of range (end {})", self.end);
        self.back_refs[slot.index()]
    }

    /// Destructs the object at `slot` and queues the slot for compaction.
    ///
    /// The payload bytes remain until [`RawStore::pack_deletions`]; reading
    /// the slot in between is a programming error.
    pub fn remove_untyped(&mut self, slot: Slot) {
        self.check_live(slot);
        let drop_fn = self.expect_info().drop_fn;
        unsafe { drop_fn(self.write_ptr(slot)) }
        self.back_refs[slot.index()] = Entity::null();
        self.pending.push(slot);
    }

    /// Copy-constructs the component at `source` into a fresh slot owned by
    /// `new_owner`.
    pub fn clone_untyped(&mut self, source: Slot, new_owner: Entity) -> Slot {
        self.check_live(source);
        debug_assert!(new_owner.is_some());

        if self.end as usize == self.reserved {
            self.grow();
        }

        let target = Slot::new(self.end);
        let clone_fn = self.expect_info().clone_fn;
        unsafe { clone_fn(self.read_ptr(source), self.write_ptr(target)) }
        self.back_refs.push(new_owner);
        self.end += 1;
        target
    }

    /// Compacts all pending deletions and reports the relocations.
    ///
    /// Deletions are processed in descending slot order so a hole at the
    /// current top is simply popped and never disturbs slots still to be
    /// processed. For every other hole, the component at the top of the
    /// buffer is memcpy'd into it and a [`Relocation`] is emitted so the
    /// entity store can repair its routing table.
    pub fn pack_deletions(&mut self) -> Vec<Relocation> {
        let mut relocations = Vec::new();
        if self.pending.is_empty() {
            return relocations;
        }

        self.pending.sort_unstable_by(|a, b| b.cmp(a));

        for index in 0..self.pending.len() {
            let hole = self.pending[index];
            let top = Slot::new(self.end - 1);

            if hole == top {
                self.back_refs.pop();
                self.end -= 1;
            } else {
                unsafe {
                    let source = self.read_ptr(top);
                    let target = self.write_ptr(hole);
                    ptr::copy_nonoverlapping(source, target, self.width);
                }
                let moved_owner = self.back_refs.pop().unwrap_or_default();
                self.back_refs[hole.index()] = moved_owner;
                self.end -= 1;
                relocations.push(Relocation { slot: hole, new_owner: moved_owner });
            }
        }

        tracing::trace!(
            store = self.info.as_ref().map(|i| i.name).unwrap_or("?"),
            deleted = self.pending.len(),
            relocated = relocations.len(),
            "packed deletions"
        );
        self.pending.clear();

        relocations
    }

    /// Raw pointer to a live slot's payload, for erased consumers.
    ///
    /// The pointee is reinterpretable as the registered type; the pointer is
    /// invalidated by any mutation of this store.
    pub fn untyped_ptr(&self, slot: Slot) -> *const u8 {
        self.check_live(slot);
        self.read_ptr(slot)
    }

    /// Debug-formats the component at `slot` through its print hook.
    ///
    /// Writes a placeholder if the type was registered without codec hooks.
    #[cfg(feature = "codec")]
    pub fn format_slot(&self, slot: Slot, out: &mut dyn fmt::Write) -> fmt::Result {
        let info = self.expect_info();
        match info.codec {
            Some(hooks) => unsafe { (hooks.print)(self.untyped_ptr(slot), out) },
            None => write!(out, "<{}>", info.name),
        }
    }
}

impl Drop for RawStore {
    fn drop(&mut self) {
        let Some(info) = self.info else { return };
        for raw in 1..self.end {
            let slot = Slot::new(raw);
            if self.back_refs[slot.index()].is_some() {
                unsafe { (info.drop_fn)(self.write_ptr(slot)) }
            }
        }
    }
}

impl fmt::Debug for RawStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawStore")
            .field("type", &self.info.as_ref().map(|i| i.name))
            .field("end", &self.end)
            .field("reserved", &self.reserved)
            .field("pending", &self.pending.len())
            .finish()
    }
}
