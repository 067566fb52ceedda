//! Core Store Types, Identifiers, and Signatures
//!
//! This module defines the **fundamental identifier families, constants, and
//! bitset signatures** shared by the entity store subsystems: entity
//! lifecycle, raw component storage, the type registry, and query matching.
//!
//! ## Identifier families
//!
//! All identifiers are phantom-tagged [`Ix`] values over `u32`:
//!
//! - [`Entity`] — opaque identity owning a set of components. `0` is the
//!   reserved null entity and is never allocated.
//! - [`ComponentId`] — dense type id in `[0, COMPONENT_CAP)`, assigned by the
//!   registry on first mention of a type.
//! - [`Slot`] — position inside one type's raw store. `0` is reserved per
//!   store.
//!
//! ## Signatures
//!
//! A [`Signature`] is a fixed-width bitset with one bit per component type.
//! Signatures describe both "which components does this entity have" and
//! "which components does this query require"; matching is a mask compare.
//!
//! ## Qualifiers
//!
//! A [`Qualifier`] is a monotonically-increasing stamp assigned per entity
//! birth and bumped on deletion, letting stale handles detect that their slot
//! was recycled.

use crate::index::Ix;
use crate::store::registry::component_id_of;

/// Phantom tag for entity indices.
pub enum EntityTag {}
/// Phantom tag for raw store slot indices.
pub enum SlotTag {}
/// Phantom tag for component type ids.
pub enum ComponentTag {}

/// Opaque entity identifier. `0` is the reserved null entity.
pub type Entity = Ix<EntityTag>;
/// Slot inside a single type's raw store. `0` is reserved.
pub type Slot = Ix<SlotTag>;
/// Dense component type identifier in `[0, COMPONENT_CAP)`.
pub type ComponentId = Ix<ComponentTag>;

/// Generation stamp detecting entity slot reuse.
pub type Qualifier = u64;

/// Maximum number of distinct component types.
pub const COMPONENT_CAP: usize = 64;

/// Number of `u64` words in a [`Signature`].
pub const SIGNATURE_WORDS: usize = (COMPONENT_CAP + 63) / 64;

/// Bitset representing a set of component types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature {
    /// Packed component bitset.
    pub words: [u64; SIGNATURE_WORDS],
}

impl Default for Signature {
    fn default() -> Self {
        Self { words: [0u64; SIGNATURE_WORDS] }
    }
}

impl Signature {
    /// Sets the bit for `component_id`.
    #[inline]
    pub fn set(&mut self, component_id: ComponentId) {
        let word = component_id.index() / 64;
        let bit = component_id.index() % 64;
        self.words[word] |= 1u64 << bit;
    }

    /// Clears the bit for `component_id`.
    #[inline]
    pub fn clear(&mut self, component_id: ComponentId) {
        let word = component_id.index() / 64;
        let bit = component_id.index() % 64;
        self.words[word] &= !(1u64 << bit);
    }

    /// Clears every bit.
    #[inline]
    pub fn reset(&mut self) {
        self.words = [0u64; SIGNATURE_WORDS];
    }

    /// Returns `true` if the bit for `component_id` is set.
    #[inline]
    pub fn has(&self, component_id: ComponentId) -> bool {
        let word = component_id.index() / 64;
        let bit = component_id.index() % 64;
        (self.words[word] >> bit) & 1 == 1
    }

    /// Returns `true` if no bit is set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Returns `true` if every bit set in `required` is also set here.
    #[inline]
    pub fn contains_all(&self, required: &Signature) -> bool {
        for (own, req) in self.words.iter().zip(required.words.iter()) {
            if (own & req) != *req {
                return false;
            }
        }
        true
    }

    /// Iterates over all component ids set in this signature.
    pub fn iter(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.words.iter().enumerate().flat_map(|(word_index, &word)| {
            let base = word_index * 64;
            let mut bits = word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let tz = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                Some(ComponentId::new((base + tz) as u32))
            })
        })
    }
}

/// Builds a signature from a list of component ids.
pub fn build_signature(component_ids: &[ComponentId]) -> Signature {
    let mut signature = Signature::default();
    for &component_id in component_ids {
        signature.set(component_id);
    }
    signature
}

/// A compile-time group of component types.
///
/// Implemented for tuples of registered component types up to arity four,
/// this is the static form of a required-component set: `has_all`, group
/// cloning, and query construction all consume it.
pub trait ComponentSet {
    /// The dense ids of every type in the group, registering on first
    /// mention.
    fn ids() -> Vec<ComponentId>;

    /// The group signature (all ids set).
    fn signature() -> Signature {
        build_signature(&Self::ids())
    }
}

macro_rules! impl_component_set {
    ($($ty:ident),+) => {
        impl<$($ty),+> ComponentSet for ($($ty,)+)
        where
            $($ty: Clone + Send + Sync + 'static,)+
        {
            fn ids() -> Vec<ComponentId> {
                vec![$(component_id_of::<$ty>()),+]
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_set_clear_roundtrip() {
        let mut signature = Signature::default();
        let id = ComponentId::new(13);
        assert!(!signature.has(id));
        signature.set(id);
        assert!(signature.has(id));
        signature.clear(id);
        assert!(signature.has(id) == false && signature.is_empty());
    }

    #[test]
    fn contains_all_is_subset_test() {
        let group = build_signature(&[ComponentId::new(1), ComponentId::new(5)]);
        let mut entity = group;
        entity.set(ComponentId::new(9));
        assert!(entity.contains_all(&group));
        assert!(!group.contains_all(&entity));
    }

    #[test]
    fn iter_yields_set_bits_ascending() {
        let signature = build_signature(&[
            ComponentId::new(3),
            ComponentId::new(0),
            ComponentId::new(63),
        ]);
        let ids: Vec<u32> = signature.iter().map(|id| id.raw()).collect();
        assert_eq!(ids, vec![0, 3, 63]);
    }
}
