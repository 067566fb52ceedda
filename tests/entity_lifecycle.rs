use substrate::{Entity, World};

#[derive(Clone, Copy, Debug, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Health(u32);

#[test]
fn fresh_world_allocates_entity_one_first() {
    let mut world = World::new();
    let first = world.make();
    assert_eq!(first.raw(), 1, "entity 0 is reserved, the first allocation must be 1");
}

#[test]
fn new_entities_are_live_and_empty() {
    let mut world = World::new();
    let entity = world.make();

    assert!(entity.is_some());
    assert!(world.is_valid_index(entity));
    assert!(world.signature(entity).is_empty());
    assert!(!world.has::<Position>(entity));
}

#[test]
fn null_and_unknown_indices_do_not_resolve() {
    let mut world = World::new();
    let entity = world.make();

    assert!(world.maybe_get_from_index(0).is_none());
    assert!(world.maybe_get_from_index(99).is_none());
    assert_eq!(world.maybe_get_from_index(entity.raw()), Some(entity));
    assert_eq!(world.get_from_index(entity.raw()), entity);
}

#[test]
fn remove_invalidates_and_bumps_qualifier() {
    let mut world = World::new();
    let entity = world.make();
    world.add(entity, Position { x: 1.0, y: 2.0 });
    world.add(entity, Health(10));

    let qualifier_before = world.get_qualifier(entity);
    world.remove(entity);

    assert!(!world.is_valid_index(entity));
    assert!(!world.has::<Position>(entity));
    assert!(!world.has::<Health>(entity));
    assert!(world.maybe_get_from_index(entity.raw()).is_none());
    assert!(world.get_qualifier(entity) > qualifier_before);
    assert!(!world.is_qualified(entity, qualifier_before));
}

#[test]
fn removed_indices_are_not_reused_before_collect() {
    let mut world = World::new();
    let first = world.make();
    world.remove(first);

    let second = world.make();
    assert_ne!(first, second, "index must stay quarantined until collect_removed");

    world.collect_removed();
    let third = world.make();
    assert_eq!(third, first, "collected index is recycled");
    assert!(world.signature(third).is_empty());
    assert!(world.is_valid_index(third));
}

#[test]
fn remove_is_a_no_op_on_null_and_stale_entities() {
    let mut world = World::new();
    world.remove(Entity::null());

    let entity = world.make();
    world.remove(entity);
    let qualifier = world.get_qualifier(entity);

    // Second removal of the same index must not double-free or re-stamp.
    world.remove(entity);
    assert_eq!(world.get_qualifier(entity), qualifier);

    world.collect_removed();
    let reused = world.make();
    assert_eq!(reused, entity);
}

#[test]
fn qualified_entity_detects_recycling() {
    let mut world = World::new();
    let entity = world.make();
    let qualified = world.qualify(entity);

    assert!(qualified.is_qualified(&world));
    assert_eq!(qualified.resolve(&world), Some(entity));

    world.remove(entity);
    world.collect_removed();
    assert!(!qualified.is_qualified(&world));
    assert!(qualified.resolve(&world).is_none());

    // The slot comes back for a new entity; the old handle must stay dead.
    let recycled = world.make();
    assert_eq!(recycled, entity);
    assert!(!qualified.is_qualified(&world));

    let fresh = world.qualify(recycled);
    assert!(fresh.is_qualified(&world));
}

#[test]
fn qualifiers_are_distinct_across_slot_history() {
    let mut world = World::new();
    let entity = world.make();
    let mut seen = vec![world.get_qualifier(entity)];

    for _ in 0..4 {
        world.remove(entity);
        world.collect_removed();
        let again = world.make();
        assert_eq!(again, entity);
        let qualifier = world.get_qualifier(again);
        assert!(!seen.contains(&qualifier), "qualifier reuse on one slot");
        seen.push(qualifier);
    }
}
