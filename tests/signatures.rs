use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use substrate::{component_id_of, World};

#[derive(Clone, Copy, Debug, PartialEq)]
struct A(i32);

#[derive(Clone, Copy, Debug, PartialEq)]
struct B(i32);

#[derive(Clone, Copy, Debug, PartialEq)]
struct C(i32);

/// Counts destructor runs through a shared counter; clones share it.
#[derive(Clone)]
struct DropProbe {
    drops: Arc<AtomicUsize>,
}

impl Drop for DropProbe {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn has_checks_single_bits_and_groups() {
    let mut world = World::new();
    let entity = world.make();
    world.add(entity, A(1));
    world.add(entity, C(3));

    assert!(world.has::<A>(entity));
    assert!(world.has::<C>(entity));
    assert!(!world.has::<B>(entity));

    assert!(world.has_all::<(A,)>(entity));
    assert!(world.has_all::<(A, C)>(entity));
    assert!(world.has_all::<(C,)>(entity));
    assert!(!world.has_all::<(A, B)>(entity));
    assert!(!world.has_all::<(A, B, C)>(entity));
}

#[test]
fn added_values_read_back() {
    let mut world = World::new();
    let entity = world.make();
    world.add(entity, A(41));
    world.add(entity, B(-7));

    assert_eq!(*world.get::<A>(entity), A(41));
    assert_eq!(*world.get::<B>(entity), B(-7));

    world.get_mut::<A>(entity).0 += 1;
    assert_eq!(*world.get::<A>(entity), A(42));

    assert_eq!(world.get_maybe::<C>(entity), None);
    assert_eq!(world.get_maybe::<A>(entity), Some(&A(42)));
}

#[test]
fn component_removal_runs_the_destructor_exactly_once() {
    let drops = Arc::new(AtomicUsize::new(0));
    {
        let mut world = World::new();
        let entity = world.make();
        world.add(entity, DropProbe { drops: Arc::clone(&drops) });

        world.remove_component::<DropProbe>(entity);
        assert!(!world.has::<DropProbe>(entity));
        assert_eq!(drops.load(Ordering::SeqCst), 1);

        world.collect_removed();
        assert_eq!(drops.load(Ordering::SeqCst), 1, "compaction must not re-run destructors");
    }
    // Dropping the world must not double-free the removed slot either.
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn entity_removal_destructs_every_component_once() {
    let drops = Arc::new(AtomicUsize::new(0));
    let mut world = World::new();
    let entity = world.make();
    world.add(entity, A(1));
    world.add(entity, DropProbe { drops: Arc::clone(&drops) });

    world.remove(entity);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
    world.collect_removed();
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn world_drop_destructs_live_components() {
    let drops = Arc::new(AtomicUsize::new(0));
    {
        let mut world = World::new();
        for _ in 0..5 {
            let entity = world.make();
            world.add(entity, DropProbe { drops: Arc::clone(&drops) });
        }
    }
    assert_eq!(drops.load(Ordering::SeqCst), 5);
}

#[test]
fn clone_copies_the_requested_component_subset() {
    let mut world = World::new();
    let source = world.make();
    world.add(source, A(10));
    world.add(source, B(20));
    world.add(source, C(30));

    let partial = world.clone_components::<(A, C)>(source);
    assert_ne!(partial, source);
    assert_eq!(*world.get::<A>(partial), A(10));
    assert_eq!(*world.get::<C>(partial), C(30));
    assert!(!world.has::<B>(partial));

    let full = world.clone_all(source);
    assert_eq!(*world.get::<A>(full), A(10));
    assert_eq!(*world.get::<B>(full), B(20));
    assert_eq!(*world.get::<C>(full), C(30));

    // Requesting a type the source lacks silently skips it.
    let b_only = world.clone_entity(&[component_id_of::<B>()], partial);
    assert!(world.signature(b_only).is_empty());

    // Clones are value copies, not aliases.
    world.get_mut::<A>(source).0 = 99;
    assert_eq!(*world.get::<A>(partial), A(10));
}

#[test]
#[should_panic(expected = "already has")]
fn double_add_is_a_programming_error() {
    let mut world = World::new();
    let entity = world.make();
    world.add(entity, A(1));
    world.add(entity, A(2));
}

#[test]
#[should_panic(expected = "no component")]
fn getting_an_absent_component_is_a_programming_error() {
    let mut world = World::new();
    let entity = world.make();
    let _ = world.get::<A>(entity);
}
