//! Reference Kinds
//!
//! Four reference types with distinct lifetime contracts over the handle
//! pool. They are not a hierarchy; each is a value type over the same core
//! of "handle + generation", differing in ownership and validation:
//!
//! - [`WeakRef`] — copyable, non-owning. Dereferencing asserts the
//!   generation still matches; a stale dereference is a programming error.
//! - [`UniqueRef`] — owning. Dropping it deletes the object; moving
//!   transfers ownership. Move-only.
//! - [`QualifiedRef`] — copyable, validation-first: `is_valid` re-checks the
//!   captured generation, `resolve` yields the reference only while it
//!   matches.
//! - [`ManagedRef`] — subscribed: the manager nullifies it when the object
//!   is deleted. Clones re-subscribe, moves transfer the subscription, drop
//!   unsubscribes.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::refs::pool::{
    borrow_live, borrow_live_mut, delete_expecting, subscribe_managed, unsubscribe_managed,
    Generation, Handle, Pool, Pooled, ReferenceManager, GEN_INVALIDATED,
};

/// Copyable non-owning reference.
///
/// Must not be dereferenced after the object is deleted; the manager's
/// accessors enforce this with a generation check and panic on staleness.
/// Use [`QualifiedRef`] where staleness is an expected condition.
pub struct WeakRef<B> {
    handle: Handle,
    generation: Generation,
    marker: PhantomData<fn() -> B>,
}

impl<B> WeakRef<B> {
    pub(crate) fn new(handle: Handle, generation: Generation) -> Self {
        Self { handle, generation, marker: PhantomData }
    }

    /// The null reference.
    pub const fn null() -> Self {
        Self { handle: Handle::null(), generation: 0, marker: PhantomData }
    }

    /// The handle this reference was captured against.
    #[inline]
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// The generation this reference was captured against.
    #[inline]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Returns `true` if this is the null reference.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.handle.is_null()
    }

    /// Returns `true` if this reference points at a slot.
    #[inline]
    pub fn is_not_null(&self) -> bool {
        self.handle.is_some()
    }

    /// Resets to the null reference.
    pub fn clear(&mut self) {
        *self = Self::null();
    }

    /// Converts into a generation-checked reference.
    pub fn qualified(self) -> QualifiedRef<B> {
        QualifiedRef { handle: self.handle, qualifier: self.generation, marker: PhantomData }
    }
}

impl<B> Clone for WeakRef<B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B> Copy for WeakRef<B> {}

impl<B> PartialEq for WeakRef<B> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle && self.generation == other.generation
    }
}

impl<B> Eq for WeakRef<B> {}

impl<B> fmt::Debug for WeakRef<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakRef")
            .field("handle", &self.handle)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Owning reference: deletes its object when dropped.
///
/// Move-only. Assigning over a `UniqueRef` drops — and therefore deletes —
/// the previous target, matching native move semantics.
pub struct UniqueRef<B: Pooled> {
    pool: Rc<RefCell<Pool<B>>>,
    reference: WeakRef<B>,
}

impl<B: Pooled> UniqueRef<B> {
    pub(crate) fn new(pool: Rc<RefCell<Pool<B>>>, reference: WeakRef<B>) -> Self {
        Self { pool, reference }
    }

    /// The handle of the owned object.
    pub fn handle(&self) -> Handle {
        self.reference.handle()
    }

    /// A non-owning view of the owned object.
    pub fn weak(&self) -> WeakRef<B> {
        self.reference
    }

    /// A generation-checked view of the owned object.
    pub fn qualified(&self) -> QualifiedRef<B> {
        self.reference.qualified()
    }

    /// Borrows the owned object.
    ///
    /// ## Panics
    /// Panics if the object was deleted out from under this owner through
    /// the manager.
    pub fn get(&self) -> Ref<'_, B> {
        borrow_live(&self.pool, self.reference)
    }

    /// Mutably borrows the owned object.
    pub fn get_mut(&mut self) -> RefMut<'_, B> {
        borrow_live_mut(&self.pool, self.reference)
    }

    /// Forfeits ownership without deleting the object.
    ///
    /// Returns the weak reference; the object now lives until an explicit
    /// `delete_reference`.
    pub fn release(mut self) -> WeakRef<B> {
        let reference = self.reference;
        self.reference = WeakRef::null();
        reference
    }
}

impl<B: Pooled> Drop for UniqueRef<B> {
    fn drop(&mut self) {
        if self.reference.is_not_null() {
            delete_expecting(&self.pool, self.reference.handle(), self.reference.generation());
        }
    }
}

impl<B: Pooled> fmt::Debug for UniqueRef<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniqueRef")
            .field("handle", &self.reference.handle())
            .field("generation", &self.reference.generation())
            .finish()
    }
}

/// Copyable generation-checked reference.
///
/// Unlike [`WeakRef`], staleness is an expected condition: callers ask
/// [`QualifiedRef::is_valid`] or [`QualifiedRef::resolve`] instead of
/// dereferencing blindly.
pub struct QualifiedRef<B> {
    handle: Handle,
    qualifier: Generation,
    marker: PhantomData<fn() -> B>,
}

impl<B> QualifiedRef<B> {
    /// The null reference; never valid.
    pub const fn null() -> Self {
        Self { handle: Handle::null(), qualifier: 0, marker: PhantomData }
    }

    /// The captured handle.
    #[inline]
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// The captured generation.
    #[inline]
    pub fn qualifier(&self) -> Generation {
        self.qualifier
    }

    /// Returns `true` while the handle still carries the captured
    /// generation.
    pub fn is_valid(&self, manager: &ReferenceManager<B>) -> bool
    where
        B: Pooled,
    {
        manager.is_qualified(self.handle, self.qualifier)
    }

    /// The weak reference, if still valid.
    pub fn resolve(&self, manager: &ReferenceManager<B>) -> Option<WeakRef<B>>
    where
        B: Pooled,
    {
        if self.is_valid(manager) {
            Some(WeakRef::new(self.handle, self.qualifier))
        } else {
            None
        }
    }

    /// Explicitly invalidates this reference.
    ///
    /// The captured generation is rewritten to the invalidated sentinel,
    /// which no slot ever carries.
    pub fn unset(&mut self) {
        self.qualifier = GEN_INVALIDATED;
    }
}

impl<B> Clone for QualifiedRef<B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B> Copy for QualifiedRef<B> {}

impl<B> PartialEq for QualifiedRef<B> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle && self.qualifier == other.qualifier
    }
}

impl<B> Eq for QualifiedRef<B> {}

impl<B> fmt::Debug for QualifiedRef<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QualifiedRef")
            .field("handle", &self.handle)
            .field("qualifier", &self.qualifier)
            .finish()
    }
}

/// Subscribed reference, nullified automatically when its object is
/// deleted.
///
/// Internally this is a shared cell registered in the manager's
/// subscription table under the target handle. Deletion walks the table and
/// nulls every cell; afterwards [`ManagedRef::is_valid`] is `false` and
/// [`ManagedRef::get`] yields `None`.
pub struct ManagedRef<B: Pooled> {
    pool: Rc<RefCell<Pool<B>>>,
    target: Rc<Cell<Handle>>,
}

impl<B: Pooled> ManagedRef<B> {
    pub(crate) fn new(pool: Rc<RefCell<Pool<B>>>, target: Rc<Cell<Handle>>) -> Self {
        Self { pool, target }
    }

    /// Returns `true` while the target object is alive.
    pub fn is_valid(&self) -> bool {
        self.target.get().is_some()
    }

    /// Borrows the target object, or `None` after nullification.
    pub fn get(&self) -> Option<Ref<'_, B>> {
        let handle = self.target.get();
        if handle.is_null() {
            return None;
        }
        let pool = self.pool.borrow();
        if !pool.is_live(handle) {
            return None;
        }
        Some(Ref::map(pool, |p| {
            p.data[handle.index()].as_deref().expect("live slot holds no object")
        }))
    }

    /// The current weak reference to the target, or `None` after
    /// nullification.
    pub fn resolve(&self) -> Option<WeakRef<B>> {
        let handle = self.target.get();
        if handle.is_null() {
            return None;
        }
        let pool = self.pool.borrow();
        if pool.is_live(handle) {
            Some(WeakRef::new(handle, pool.identifiers[handle.index()]))
        } else {
            None
        }
    }

    /// Detaches from the target without deleting it.
    pub fn clear(&mut self) {
        let handle = self.target.get();
        if handle.is_some() {
            unsubscribe_managed(&self.pool, handle, &self.target);
            self.target.set(Handle::null());
        }
    }
}

impl<B: Pooled> Clone for ManagedRef<B> {
    /// Copies re-subscribe: the clone gets its own cell in the subscription
    /// table so both copies are nullified independently.
    fn clone(&self) -> Self {
        let handle = self.target.get();
        let target = if handle.is_some() {
            subscribe_managed(&self.pool, handle)
        } else {
            Rc::new(Cell::new(Handle::null()))
        };
        Self { pool: Rc::clone(&self.pool), target }
    }
}

impl<B: Pooled> Drop for ManagedRef<B> {
    fn drop(&mut self) {
        let handle = self.target.get();
        if handle.is_some() {
            unsubscribe_managed(&self.pool, handle, &self.target);
        }
    }
}

impl<B: Pooled> fmt::Debug for ManagedRef<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedRef").field("target", &self.target.get()).finish()
    }
}
