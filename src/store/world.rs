//! # Entity Store
//!
//! [`World`] owns every entity and, through one [`RawStore`] per registered
//! type, every component. It is the hub the rest of the store module routes
//! through:
//!
//! - **Identity**: entities are allocated from a free list of recycled
//!   indices; a per-entity [`Qualifier`] stamp is bumped on deletion so
//!   stale handles are detectable.
//! - **Composition**: each entity carries a [`Signature`] bitset plus a
//!   routing table mapping `(type, entity)` to the slot inside that type's
//!   raw store.
//! - **Deletion**: `remove` destructs components immediately but defers
//!   physical compaction to [`World::collect_removed`], the epoch fence.
//!
//! ## The compaction fence
//!
//! Components may be added and removed freely between `collect_removed`
//! calls. Component references obtained from `get` are valid only until the
//! next mutation of that type's raw store (add, remove, clone, or collect).
//! Entities removed in the current epoch stay allocated — and their indices
//! are not reused — until the next `collect_removed`.
//!
//! ## Failure semantics
//! Invalid entity indices, double adds, and missing components are
//! programming errors and panic. The `maybe_*` forms return `Option` for
//! callers that need to probe.

use crate::store::raw::RawStore;
use crate::store::registry::{component_id_of, struct_info, type_count};
use crate::store::types::{
    ComponentId, ComponentSet, Entity, Qualifier, Signature, Slot, COMPONENT_CAP,
};

/// Signature-driven entity store.
///
/// Not thread-safe: one `World` expects external synchronization if shared.
pub struct World {
    pub(crate) signatures: Vec<Signature>,
    pub(crate) data_indices: Vec<Vec<Slot>>,
    pub(crate) data: Vec<RawStore>,
    qualifiers: Vec<Qualifier>,
    valid: Vec<bool>,
    qualifier_counter: Qualifier,
    free_indirections: Vec<Entity>,
    removed: Vec<Entity>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates an empty world. Entity 0 is the permanent null entity; the
    /// first [`World::make`] returns entity 1.
    pub fn new() -> Self {
        Self {
            signatures: vec![Signature::default()],
            data_indices: (0..COMPONENT_CAP).map(|_| vec![Slot::null()]).collect(),
            data: (0..COMPONENT_CAP).map(|_| RawStore::default()).collect(),
            qualifiers: vec![0],
            valid: vec![false],
            qualifier_counter: 1,
            free_indirections: Vec::new(),
            removed: Vec::new(),
        }
    }

    fn next_qualifier(&mut self) -> Qualifier {
        let qualifier = self.qualifier_counter;
        self.qualifier_counter += 1;
        qualifier
    }

    /// Allocates a new, component-less entity.
    ///
    /// Recycles an index freed by an earlier collect epoch when one is
    /// available; otherwise grows the identity tables.
    pub fn make(&mut self) -> Entity {
        if let Some(entity) = self.free_indirections.pop() {
            self.valid[entity.index()] = true;
            debug_assert!(self.signatures[entity.index()].is_empty());
            return entity;
        }

        let entity = Entity::new(self.signatures.len() as u32);
        self.signatures.push(Signature::default());
        for row in &mut self.data_indices {
            row.push(Slot::null());
        }
        let qualifier = self.next_qualifier();
        self.qualifiers.push(qualifier);
        self.valid.push(true);
        entity
    }

    /// Returns `true` if `entity` is live.
    #[inline]
    pub fn is_valid_index(&self, entity: Entity) -> bool {
        entity.is_some() && self.valid.get(entity.index()).copied().unwrap_or(false)
    }

    /// Validates a raw index, returning the entity if it is live.
    pub fn maybe_get_from_index(&self, index: u32) -> Option<Entity> {
        let entity = Entity::new(index);
        if self.is_valid_index(entity) {
            Some(entity)
        } else {
            None
        }
    }

    /// Validates a raw index.
    ///
    /// ## Panics
    /// Panics if the index is null or not live.
    pub fn get_from_index(&self, index: u32) -> Entity {
        assert!(index != 0, "entity 0 is the reserved null entity");
        let entity = Entity::new(index);
        assert!(self.is_valid_index(entity), "entity index {index} is not live");
        entity
    }

    /// Returns the current qualifier stamp for `entity`.
    pub fn get_qualifier(&self, entity: Entity) -> Qualifier {
        assert!(entity.is_some(), "the null entity has no qualifier");
        self.qualifiers[entity.index()]
    }

    /// Returns `true` if `entity` still carries the stamp `qualifier`.
    pub fn is_qualified(&self, entity: Entity, qualifier: Qualifier) -> bool {
        assert!(entity.is_some(), "the null entity has no qualifier");
        self.qualifiers[entity.index()] == qualifier
    }

    /// Captures a generation-checked handle to a live entity.
    pub fn qualify(&self, entity: Entity) -> QualifiedEntity {
        assert!(self.is_valid_index(entity), "cannot qualify entity {entity}");
        QualifiedEntity { entity, qualifier: self.qualifiers[entity.index()] }
    }

    /// The signature of `entity`.
    #[inline]
    pub fn signature(&self, entity: Entity) -> &Signature {
        &self.signatures[entity.index()]
    }

    /// The raw store holding all components of type `component_id`.
    pub fn raw_store(&self, component_id: ComponentId) -> &RawStore {
        &self.data[component_id.index()]
    }

    /// Returns `true` if `entity` has a component of type `component_id`.
    #[inline]
    pub fn has_component(&self, entity: Entity, component_id: ComponentId) -> bool {
        self.signatures[entity.index()].has(component_id)
    }

    /// Returns `true` if `entity` has a component of type `T`.
    pub fn has<T: Clone + Send + Sync + 'static>(&self, entity: Entity) -> bool {
        self.has_component(entity, component_id_of::<T>())
    }

    /// Returns `true` if `entity` has every component in the group `S`.
    pub fn has_all<S: ComponentSet>(&self, entity: Entity) -> bool {
        let required = S::signature();
        self.signatures[entity.index()].contains_all(&required)
    }

    /// The raw-store slot of `entity`'s component of type `component_id`.
    ///
    /// ## Panics
    /// Panics if the component is absent.
    pub fn component_slot(&self, entity: Entity, component_id: ComponentId) -> Slot {
        assert!(
            self.has_component(entity, component_id),
            "entity {entity} has no component {component_id}"
        );
        self.data_indices[component_id.index()][entity.index()]
    }

    /// Attaches a component of type `T` to `entity`.
    ///
    /// ## Panics
    /// Panics if `entity` is not live or already has a `T`.
    pub fn add<T: Clone + Send + Sync + 'static>(&mut self, entity: Entity, value: T) -> &mut T {
        assert!(self.is_valid_index(entity), "add on invalid entity {entity}");
        let id = component_id_of::<T>();
        assert!(
            !self.signatures[entity.index()].has(id),
            "entity {entity} already has a {}",
            std::any::type_name::<T>()
        );
        let info = struct_info(id).expect("registered component has no capability table");

        let slot = self.data[id.index()].add(&info, entity, value);
        self.data_indices[id.index()][entity.index()] = slot;
        self.signatures[entity.index()].set(id);
        self.data[id.index()].get_mut::<T>(slot)
    }

    /// Returns `entity`'s component of type `T`.
    ///
    /// ## Panics
    /// Panics if the component is absent.
    pub fn get<T: Clone + Send + Sync + 'static>(&self, entity: Entity) -> &T {
        let id = component_id_of::<T>();
        let slot = self.component_slot(entity, id);
        self.data[id.index()].get::<T>(slot)
    }

    /// Mutable form of [`World::get`].
    pub fn get_mut<T: Clone + Send + Sync + 'static>(&mut self, entity: Entity) -> &mut T {
        let id = component_id_of::<T>();
        let slot = self.component_slot(entity, id);
        self.data[id.index()].get_mut::<T>(slot)
    }

    /// Returns `entity`'s component of type `T`, or `None` when the entity
    /// is not live or the component is absent.
    pub fn get_maybe<T: Clone + Send + Sync + 'static>(&self, entity: Entity) -> Option<&T> {
        if !self.is_valid_index(entity) {
            return None;
        }
        let id = component_id_of::<T>();
        if !self.has_component(entity, id) {
            return None;
        }
        let slot = self.data_indices[id.index()][entity.index()];
        Some(self.data[id.index()].get::<T>(slot))
    }

    /// Mutable form of [`World::get_maybe`].
    pub fn get_maybe_mut<T: Clone + Send + Sync + 'static>(
        &mut self,
        entity: Entity,
    ) -> Option<&mut T> {
        if !self.is_valid_index(entity) {
            return None;
        }
        let id = component_id_of::<T>();
        if !self.has_component(entity, id) {
            return None;
        }
        let slot = self.data_indices[id.index()][entity.index()];
        Some(self.data[id.index()].get_mut::<T>(slot))
    }

    /// Detaches and destructs `entity`'s component of type `component_id`.
    ///
    /// ## Panics
    /// Panics if the component is absent.
    pub fn remove_component_by_id(&mut self, entity: Entity, component_id: ComponentId) {
        assert!(
            self.signatures[entity.index()].has(component_id),
            "entity {entity} has no component {component_id} to remove"
        );
        let slot = self.data_indices[component_id.index()][entity.index()];
        self.data[component_id.index()].remove_untyped(slot);
        self.data_indices[component_id.index()][entity.index()] = Slot::null();
        self.signatures[entity.index()].clear(component_id);
    }

    /// Typed form of [`World::remove_component_by_id`].
    pub fn remove_component<T: Clone + Send + Sync + 'static>(&mut self, entity: Entity) {
        self.remove_component_by_id(entity, component_id_of::<T>());
    }

    /// Schedules `entity` for deletion.
    ///
    /// Every component is destructed immediately, the signature is cleared,
    /// and the qualifier stamp is bumped so stale qualified handles fail
    /// their check. The index itself only becomes reusable at the next
    /// [`World::collect_removed`].
    ///
    /// Removing the null entity or an already-removed entity is a silent
    /// no-op.
    pub fn remove(&mut self, entity: Entity) {
        if !self.is_valid_index(entity) {
            return;
        }

        let signature = self.signatures[entity.index()];
        for component_id in signature.iter() {
            let slot = self.data_indices[component_id.index()][entity.index()];
            self.data[component_id.index()].remove_untyped(slot);
            self.data_indices[component_id.index()][entity.index()] = Slot::null();
        }

        self.signatures[entity.index()].reset();
        self.qualifiers[entity.index()] = self.next_qualifier();
        self.removed.push(entity);
        self.valid[entity.index()] = false;
    }

    /// The compaction epoch boundary.
    ///
    /// Packs every raw store, repairs the routing entries of relocated
    /// components, and recycles the indices of entities removed this epoch.
    /// Component references and query results from before the collect are
    /// invalidated.
    pub fn collect_removed(&mut self) {
        let types = type_count();
        let mut relocated = 0usize;
        for type_index in 0..types {
            for relocation in self.data[type_index].pack_deletions() {
                self.data_indices[type_index][relocation.new_owner.index()] = relocation.slot;
                relocated += 1;
            }
        }

        for &entity in &self.removed {
            debug_assert!(self.signatures[entity.index()].is_empty());
        }
        tracing::debug!(
            freed = self.removed.len(),
            relocated,
            "collected removed entities"
        );
        self.free_indirections.extend(self.removed.drain(..));
    }

    /// Clones the listed component types from `source` onto a fresh entity.
    ///
    /// Types absent on `source` are skipped. Returns the new entity.
    pub fn clone_entity(&mut self, components: &[ComponentId], source: Entity) -> Entity {
        assert!(self.is_valid_index(source), "cannot clone invalid entity {source}");
        let target = self.make();
        for &component_id in components {
            if !self.has_component(source, component_id) {
                continue;
            }
            let source_slot = self.data_indices[component_id.index()][source.index()];
            let new_slot = self.data[component_id.index()].clone_untyped(source_slot, target);
            self.data_indices[component_id.index()][target.index()] = new_slot;
            self.signatures[target.index()].set(component_id);
        }
        target
    }

    /// Clones the component group `S` from `source` onto a fresh entity.
    pub fn clone_components<S: ComponentSet>(&mut self, source: Entity) -> Entity {
        self.clone_entity(&S::ids(), source)
    }

    /// Clones every registered component type present on `source`.
    pub fn clone_all(&mut self, source: Entity) -> Entity {
        let all: Vec<ComponentId> = (0..type_count() as u32).map(ComponentId::new).collect();
        self.clone_entity(&all, source)
    }

    /// Renders every component on `entity` through its print hook, one line
    /// per component.
    #[cfg(feature = "codec")]
    pub fn format_entity(&self, entity: Entity) -> String {
        use std::fmt::Write;

        if !self.is_valid_index(entity) {
            return String::from("<invalid entity>");
        }

        let mut out = String::new();
        for component_id in self.signatures[entity.index()].iter() {
            let store = &self.data[component_id.index()];
            let name = store.info().map(|info| info.name).unwrap_or("?");
            let slot = self.data_indices[component_id.index()][entity.index()];
            let _ = write!(out, "{name} ");
            let _ = store.format_slot(slot, &mut out);
            let _ = writeln!(out);
        }
        out
    }
}

/// Generation-checked entity handle.
///
/// Captures the qualifier stamp at creation; [`QualifiedEntity::resolve`]
/// yields the entity again only while that stamp is current.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QualifiedEntity {
    entity: Entity,
    qualifier: Qualifier,
}

impl QualifiedEntity {
    /// The captured entity index, without validation.
    #[inline]
    pub fn entity_unchecked(&self) -> Entity {
        self.entity
    }

    /// The captured qualifier stamp.
    #[inline]
    pub fn qualifier(&self) -> Qualifier {
        self.qualifier
    }

    /// Returns `true` while the underlying entity is live and has not been
    /// recycled since this handle was captured.
    pub fn is_qualified(&self, world: &World) -> bool {
        self.entity.is_some()
            && world.is_valid_index(self.entity)
            && world.is_qualified(self.entity, self.qualifier)
    }

    /// The entity, if it still matches the captured stamp.
    pub fn resolve(&self, world: &World) -> Option<Entity> {
        if self.is_qualified(world) {
            Some(self.entity)
        } else {
            None
        }
    }
}
