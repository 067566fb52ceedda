//! # Handle Pool and Reference Manager
//!
//! [`ReferenceManager`] owns a slotted arena of boxed objects addressed by
//! small integer [`Handle`]s. Each slot carries a [`Generation`] stamp that
//! is replaced every time the slot is repopulated, so references captured
//! against an earlier occupant are detectable as stale.
//!
//! ## Generation encoding
//!
//! | value    | meaning |
//! |----------|---------|
//! | `0`      | slot never used |
//! | `1`      | reference explicitly invalidated (never stored in the table) |
//! | `2`      | slot freed, awaiting reuse |
//! | odd ≥ 3  | a live generation |
//!
//! The generation counter starts at 3 and steps by 2, so live generations
//! are always odd and never collide with the sentinels.
//!
//! ## Ownership model
//!
//! The pool's interior lives in `Rc<RefCell<_>>` shared with the owning and
//! subscribing reference kinds, which lets `UniqueRef` delete on drop and
//! `ManagedRef` maintain its subscription without holding a borrow of the
//! manager. The `Rc` also makes the manager `!Send`, matching the
//! single-threaded contract.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;

use crate::index::Ix;
use crate::refs::kinds::{ManagedRef, UniqueRef, WeakRef};

/// Phantom tag for pool handles.
pub enum HandleTag {}

/// Slot handle into a [`ReferenceManager`]'s arena. `0` is the reserved
/// null handle.
pub type Handle = Ix<HandleTag>;

/// Per-slot generation stamp.
pub type Generation = u64;

/// Generation of a slot that has never held an object.
pub const GEN_NEVER_USED: Generation = 0;
/// Generation a reference rewrites itself to when explicitly invalidated.
pub const GEN_INVALIDATED: Generation = 1;
/// Generation of a freed slot awaiting reuse.
pub const GEN_FREED: Generation = 2;
/// First live generation issued by the counter.
const GEN_FIRST: Generation = 3;

/// Capability pooled object types implement so the manager can stamp them
/// at insertion.
pub trait Pooled: 'static {
    /// Stores the handle the object was inserted under.
    fn bind_handle(&mut self, handle: Handle);

    /// Returns the handle the object was inserted under.
    fn handle(&self) -> Handle;

    /// Mirrors the object's live generation, for types that carry one.
    /// The pool-side generation table is stamped regardless.
    fn set_generation(&mut self, _generation: Generation) {}
}

pub(crate) struct Pool<B> {
    pub(crate) data: Vec<Option<Box<B>>>,
    pub(crate) identifiers: Vec<Generation>,
    pub(crate) freed: Vec<Handle>,
    pub(crate) counter: Generation,
    pub(crate) managed: HashMap<Handle, Vec<Rc<Cell<Handle>>>>,
    pub(crate) incomplete: Vec<(Handle, Rc<Cell<Option<WeakRef<B>>>>)>,
}

impl<B> Pool<B> {
    fn new() -> Self {
        Self {
            data: vec![None],
            identifiers: vec![GEN_NEVER_USED],
            freed: Vec::new(),
            counter: GEN_FIRST,
            managed: HashMap::new(),
            incomplete: Vec::new(),
        }
    }

    pub(crate) fn is_live(&self, handle: Handle) -> bool {
        handle.is_some()
            && handle.index() < self.identifiers.len()
            && self.identifiers[handle.index()] >= GEN_FIRST
    }

    pub(crate) fn matches(&self, handle: Handle, generation: Generation) -> bool {
        handle.is_some()
            && handle.index() < self.identifiers.len()
            && self.identifiers[handle.index()] == generation
    }

    fn free_handle(&mut self) -> Handle {
        if let Some(handle) = self.freed.pop() {
            return handle;
        }
        let handle = Handle::new(self.data.len() as u32);
        self.data.push(None);
        self.identifiers.push(GEN_NEVER_USED);
        handle
    }
}

/// Deletes the object at `handle` if its slot is live.
///
/// Managed references subscribed under the handle are nullified and their
/// table entry dropped. The box is moved out of the slot before being
/// dropped so a re-entrant destructor cannot observe a held borrow.
pub(crate) fn delete_now<B>(pool_cell: &RefCell<Pool<B>>, handle: Handle) -> bool {
    if handle.is_null() {
        return false;
    }
    let removed = {
        let mut pool = pool_cell.borrow_mut();
        if !pool.is_live(handle) {
            return false;
        }
        if let Some(cells) = pool.managed.remove(&handle) {
            for cell in cells {
                cell.set(Handle::null());
            }
        }
        let object = pool.data[handle.index()].take();
        pool.identifiers[handle.index()] = GEN_FREED;
        pool.freed.push(handle);
        object
    };
    tracing::trace!(handle = handle.raw(), "deleted pooled object");
    drop(removed);
    true
}

/// Deletes only while the slot still holds the expected generation.
///
/// Used by `UniqueRef::drop` so an owner whose object was already deleted
/// (and whose slot possibly reused) cannot delete a stranger.
pub(crate) fn delete_expecting<B>(
    pool_cell: &RefCell<Pool<B>>,
    handle: Handle,
    generation: Generation,
) -> bool {
    if !pool_cell.borrow().matches(handle, generation) {
        return false;
    }
    delete_now(pool_cell, handle)
}

/// Shared borrow of a live slot, asserting the reference's generation.
pub(crate) fn borrow_live<B>(pool_cell: &RefCell<Pool<B>>, reference: WeakRef<B>) -> Ref<'_, B> {
    let pool = pool_cell.borrow();
    assert!(
        pool.matches(reference.handle(), reference.generation()),
        "stale weak reference (handle {})",
        reference.handle()
    );
    Ref::map(pool, |p| {
        p.data[reference.handle().index()]
            .as_deref()
            .expect("live slot holds no object")
    })
}

/// Exclusive borrow of a live slot, asserting the reference's generation.
pub(crate) fn borrow_live_mut<B>(
    pool_cell: &RefCell<Pool<B>>,
    reference: WeakRef<B>,
) -> RefMut<'_, B> {
    let pool = pool_cell.borrow_mut();
    assert!(
        pool.matches(reference.handle(), reference.generation()),
        "stale weak reference (handle {})",
        reference.handle()
    );
    RefMut::map(pool, |p| {
        p.data[reference.handle().index()]
            .as_deref_mut()
            .expect("live slot holds no object")
    })
}

pub(crate) fn subscribe_managed<B>(
    pool_cell: &RefCell<Pool<B>>,
    handle: Handle,
) -> Rc<Cell<Handle>> {
    let mut pool = pool_cell.borrow_mut();
    assert!(pool.is_live(handle), "cannot subscribe a managed reference to a dead handle");
    let cell = Rc::new(Cell::new(handle));
    pool.managed.entry(handle).or_default().push(Rc::clone(&cell));
    cell
}

pub(crate) fn unsubscribe_managed<B>(
    pool_cell: &RefCell<Pool<B>>,
    handle: Handle,
    cell: &Rc<Cell<Handle>>,
) {
    let mut pool = pool_cell.borrow_mut();
    if let Some(cells) = pool.managed.get_mut(&handle) {
        cells.retain(|candidate| !Rc::ptr_eq(candidate, cell));
        if cells.is_empty() {
            pool.managed.remove(&handle);
        }
    }
}

/// A deferred handle-to-reference binding.
///
/// Created by [`ReferenceManager::add_incomplete`] while objects are still
/// being restored; [`ReferenceManager::complete_references`] fills the cell
/// with a live weak reference once the arena is fully populated.
pub struct PendingRef<B> {
    cell: Rc<Cell<Option<WeakRef<B>>>>,
}

impl<B> PendingRef<B> {
    /// The resolved reference, once `complete_references` has run and if the
    /// handle was live at that point.
    pub fn get(&self) -> Option<WeakRef<B>> {
        self.cell.get()
    }
}

impl<B> Clone for PendingRef<B> {
    fn clone(&self) -> Self {
        Self { cell: Rc::clone(&self.cell) }
    }
}

/// Slotted arena of owned objects with generational stale-reference
/// detection.
///
/// Not thread-safe; the shared interior makes the manager `!Send` by
/// construction.
pub struct ReferenceManager<B: Pooled> {
    pub(crate) pool: Rc<RefCell<Pool<B>>>,
}

impl<B: Pooled> Default for ReferenceManager<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Pooled> ReferenceManager<B> {
    /// Creates an empty arena. Slot 0 is the permanent null sentinel.
    pub fn new() -> Self {
        Self { pool: Rc::new(RefCell::new(Pool::new())) }
    }

    /// Inserts `value` into the arena and returns a weak reference to it.
    ///
    /// The object is stamped with its handle and generation through the
    /// [`Pooled`] capability before it becomes reachable.
    pub fn make_ref(&self, value: B) -> WeakRef<B> {
        let mut pool = self.pool.borrow_mut();
        let handle = pool.free_handle();
        let generation = pool.counter;
        pool.counter += 2;

        let mut object = Box::new(value);
        object.bind_handle(handle);
        object.set_generation(generation);

        pool.identifiers[handle.index()] = generation;
        pool.data[handle.index()] = Some(object);

        WeakRef::new(handle, generation)
    }

    /// Inserts `value` and returns an owning reference that deletes the
    /// object when dropped.
    pub fn make_unique_ref(&self, value: B) -> UniqueRef<B> {
        let reference = self.make_ref(value);
        UniqueRef::new(Rc::clone(&self.pool), reference)
    }

    /// Wraps an existing live reference in owning form.
    ///
    /// ## Panics
    /// Panics if `reference` is stale.
    pub fn adopt_unique(&self, reference: WeakRef<B>) -> UniqueRef<B> {
        assert!(
            self.pool.borrow().matches(reference.handle(), reference.generation()),
            "cannot adopt a stale reference"
        );
        UniqueRef::new(Rc::clone(&self.pool), reference)
    }

    /// Subscribes a managed reference to `reference`'s object.
    ///
    /// The reference is nullified automatically when the object is deleted.
    ///
    /// ## Panics
    /// Panics if `reference` is stale.
    pub fn managed(&self, reference: WeakRef<B>) -> ManagedRef<B> {
        assert!(
            self.pool.borrow().matches(reference.handle(), reference.generation()),
            "cannot subscribe to a stale reference"
        );
        let cell = subscribe_managed(&self.pool, reference.handle());
        ManagedRef::new(Rc::clone(&self.pool), cell)
    }

    /// Returns `true` if `handle` currently addresses a live object.
    pub fn valid_handle(&self, handle: Handle) -> bool {
        self.pool.borrow().is_live(handle)
    }

    /// Returns `true` if `handle` still carries exactly `generation`.
    pub fn is_qualified(&self, handle: Handle, generation: Generation) -> bool {
        self.pool.borrow().matches(handle, generation)
    }

    /// Captures a weak reference to the current occupant of `handle`.
    pub fn weak(&self, handle: Handle) -> Option<WeakRef<B>> {
        let pool = self.pool.borrow();
        if pool.is_live(handle) {
            Some(WeakRef::new(handle, pool.identifiers[handle.index()]))
        } else {
            None
        }
    }

    /// Dereferences a weak reference.
    ///
    /// ## Panics
    /// Panics if the reference is stale — the object was deleted or the slot
    /// reused since the reference was captured.
    pub fn get(&self, reference: WeakRef<B>) -> Ref<'_, B> {
        borrow_live(&self.pool, reference)
    }

    /// Mutable form of [`ReferenceManager::get`].
    pub fn get_mut(&self, reference: WeakRef<B>) -> RefMut<'_, B> {
        borrow_live_mut(&self.pool, reference)
    }

    /// Dereferences a weak reference, or `None` if it is stale.
    pub fn try_get(&self, reference: WeakRef<B>) -> Option<Ref<'_, B>> {
        if self.is_qualified(reference.handle(), reference.generation()) {
            Some(borrow_live(&self.pool, reference))
        } else {
            None
        }
    }

    /// Deletes the object at `handle`.
    ///
    /// Nullifies every subscribed managed reference, tombstones the slot's
    /// generation, and recycles the handle. A null or already-freed handle
    /// is a silent no-op.
    pub fn delete_reference(&self, handle: Handle) {
        delete_now(&self.pool, handle);
    }

    /// Deletes through a weak reference and clears it.
    pub fn delete_weak(&self, reference: &mut WeakRef<B>) {
        delete_now(&self.pool, reference.handle());
        reference.clear();
    }

    /// Number of live objects in the arena.
    pub fn live_count(&self) -> usize {
        self.pool.borrow().data.iter().filter(|slot| slot.is_some()).count()
    }

    /// Number of managed references currently subscribed under `handle`.
    pub fn managed_subscriptions(&self, handle: Handle) -> usize {
        self.pool
            .borrow()
            .managed
            .get(&handle)
            .map(|cells| cells.len())
            .unwrap_or(0)
    }

    /// Queues a handle read during deserialization for later resolution.
    pub fn add_incomplete(&self, handle: Handle) -> PendingRef<B> {
        let cell = Rc::new(Cell::new(None));
        self.pool.borrow_mut().incomplete.push((handle, Rc::clone(&cell)));
        PendingRef { cell }
    }

    /// Resolves every queued handle into a live weak reference.
    ///
    /// Handles that are dead by resolution time leave their cell empty.
    pub fn complete_references(&self) {
        let mut pool = self.pool.borrow_mut();
        let incomplete = std::mem::take(&mut pool.incomplete);
        for (handle, cell) in incomplete {
            if pool.is_live(handle) {
                cell.set(Some(WeakRef::new(handle, pool.identifiers[handle.index()])));
            }
        }
    }

    /// Drops every object and resets the arena to its initial state.
    ///
    /// The generation counter keeps advancing across a clear, so references
    /// captured before it never qualify again.
    pub fn clear(&self) {
        let objects = {
            let mut pool = self.pool.borrow_mut();
            for cells in pool.managed.values() {
                for cell in cells {
                    cell.set(Handle::null());
                }
            }
            pool.managed.clear();
            pool.incomplete.clear();
            pool.freed.clear();
            pool.identifiers.clear();
            pool.identifiers.push(GEN_NEVER_USED);
            std::mem::replace(&mut pool.data, vec![None])
        };
        drop(objects);
    }
}
