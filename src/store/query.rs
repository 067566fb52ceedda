//! Query execution over the entity store.
//!
//! A query names one to four component types; the engine picks the **pivot**
//! — the required type whose raw store holds the fewest slots — iterates the
//! pivot's back-reference array, and re-checks each candidate's signature
//! against the full required mask.
//!
//! Two families of entry points exist, mirroring the two callable shapes the
//! store supports:
//!
//! - `match1..match4` invoke the callable with mutable component references.
//! - `run1..run4` additionally prepend the matched [`Entity`], for callables
//!   that need the whole-entity handle.
//!
//! ## Execution model
//! 1. Resolve the required component ids (registering on first mention).
//! 2. Select the pivot by smallest store `end`.
//! 3. Walk pivot slots in ascending order, skipping slots whose owner has
//!    been removed this epoch (null back-reference).
//! 4. For multi-type queries, test the owner's signature against the
//!    required mask; single-type queries read the pivot payload directly.
//!
//! Iteration order is "pivot slot ascending" and changes across compaction;
//! callers must not rely on entity creation order.
//!
//! ## Safety
//! Multi-type queries hand out one mutable reference per required type.
//! The types are checked to be pairwise distinct, and each reference comes
//! from a different type's raw store, so the references never alias.

use crate::store::registry::component_id_of;
use crate::store::types::{build_signature, ComponentId, Entity, Slot};
use crate::store::world::World;

fn assert_distinct(ids: &[ComponentId]) {
    for i in 0..ids.len() {
        for j in i + 1..ids.len() {
            assert!(ids[i] != ids[j], "query names the same component type twice");
        }
    }
}

impl World {
    /// Picks the required type with the smallest raw store.
    ///
    /// Iterating the smallest store minimizes the number of candidates a
    /// query has to signature-test.
    pub fn select_pivot(&self, ids: &[ComponentId]) -> ComponentId {
        assert!(!ids.is_empty(), "a query requires at least one component type");
        let mut pivot = ids[0];
        let mut smallest = u32::MAX;
        for &id in ids {
            let size = self.data[id.index()].end();
            if size < smallest {
                smallest = size;
                pivot = id;
            }
        }
        pivot
    }

    fn component_ptr<T: Clone + Send + Sync + 'static>(&mut self, entity: Entity) -> *mut T {
        let id = component_id_of::<T>();
        let slot = self.data_indices[id.index()][entity.index()];
        self.data[id.index()].get_mut::<T>(slot) as *mut T
    }
}

macro_rules! impl_queries {
    // Single required type: the pivot is the type itself and every live
    // pivot slot matches, so the payload is handed out directly.
    ($match_fn:ident, $run_fn:ident; $head:ident $head_var:ident) => {
        impl World {
            /// Invokes `f` with a mutable reference to every live component
            /// of the named type.
            pub fn $match_fn<$head, F>(&mut self, mut f: F)
            where
                $head: Clone + Send + Sync + 'static,
                F: FnMut(&mut $head),
            {
                let pivot = component_id_of::<$head>();
                let end = self.data[pivot.index()].end();
                for raw in 1..end {
                    let slot = Slot::new(raw);
                    if self.data[pivot.index()].back_ref(slot).is_null() {
                        continue;
                    }
                    f(self.data[pivot.index()].get_mut::<$head>(slot));
                }
            }

            /// Like the matching `match` entry point, but prepends the
            /// owning [`Entity`].
            pub fn $run_fn<$head, F>(&mut self, mut f: F)
            where
                $head: Clone + Send + Sync + 'static,
                F: FnMut(Entity, &mut $head),
            {
                let pivot = component_id_of::<$head>();
                let end = self.data[pivot.index()].end();
                for raw in 1..end {
                    let slot = Slot::new(raw);
                    let owner = self.data[pivot.index()].back_ref(slot);
                    if owner.is_null() {
                        continue;
                    }
                    f(owner, self.data[pivot.index()].get_mut::<$head>(slot));
                }
            }
        }
    };

    // Multiple required types: pivot by smallest store, re-check signatures,
    // resolve non-pivot components through the routing table.
    ($match_fn:ident, $run_fn:ident; $head:ident $head_var:ident, $($tail:ident $tail_var:ident),+) => {
        impl World {
            /// Invokes `f` with mutable references to the named components of
            /// every entity that has all of them.
            pub fn $match_fn<$head, $($tail,)+ F>(&mut self, mut f: F)
            where
                $head: Clone + Send + Sync + 'static,
                $($tail: Clone + Send + Sync + 'static,)+
                F: FnMut(&mut $head, $(&mut $tail),+),
            {
                let ids = [component_id_of::<$head>(), $(component_id_of::<$tail>()),+];
                assert_distinct(&ids);
                let required = build_signature(&ids);
                let pivot = self.select_pivot(&ids);
                let end = self.data[pivot.index()].end();
                for raw in 1..end {
                    let slot = Slot::new(raw);
                    let owner = self.data[pivot.index()].back_ref(slot);
                    if owner.is_null() {
                        continue;
                    }
                    if !self.signatures[owner.index()].contains_all(&required) {
                        continue;
                    }
                    let $head_var = self.component_ptr::<$head>(owner);
                    $(let $tail_var = self.component_ptr::<$tail>(owner);)+
                    unsafe { f(&mut *$head_var, $(&mut *$tail_var),+) }
                }
            }

            /// Like the matching `match` entry point, but prepends the
            /// owning [`Entity`].
            pub fn $run_fn<$head, $($tail,)+ F>(&mut self, mut f: F)
            where
                $head: Clone + Send + Sync + 'static,
                $($tail: Clone + Send + Sync + 'static,)+
                F: FnMut(Entity, &mut $head, $(&mut $tail),+),
            {
                let ids = [component_id_of::<$head>(), $(component_id_of::<$tail>()),+];
                assert_distinct(&ids);
                let required = build_signature(&ids);
                let pivot = self.select_pivot(&ids);
                let end = self.data[pivot.index()].end();
                for raw in 1..end {
                    let slot = Slot::new(raw);
                    let owner = self.data[pivot.index()].back_ref(slot);
                    if owner.is_null() {
                        continue;
                    }
                    if !self.signatures[owner.index()].contains_all(&required) {
                        continue;
                    }
                    let $head_var = self.component_ptr::<$head>(owner);
                    $(let $tail_var = self.component_ptr::<$tail>(owner);)+
                    unsafe { f(owner, &mut *$head_var, $(&mut *$tail_var),+) }
                }
            }
        }
    };
}

impl_queries!(match1, run1; A a);
impl_queries!(match2, run2; A a, B b);
impl_queries!(match3, run3; A a, B b, C c);
impl_queries!(match4, run4; A a, B b, C c, D d);
