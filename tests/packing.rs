use substrate::{component_id_of, Slot, World};

#[derive(Clone, Copy, Debug, PartialEq)]
struct Weight(i64);

#[derive(Clone, Copy, Debug, PartialEq)]
struct Tag(u64);

#[test]
fn removing_the_middle_entity_relocates_the_top_component() {
    let mut world = World::new();
    let e1 = world.make();
    let e2 = world.make();
    let e3 = world.make();
    world.add(e1, Weight(1));
    world.add(e2, Weight(2));
    world.add(e3, Weight(3));

    world.remove(e2);
    world.collect_removed();

    let weight_id = component_id_of::<Weight>();
    let store = world.raw_store(weight_id);

    // Slot 0 is reserved; two live objects remain.
    assert_eq!(store.end(), 3);
    assert_eq!(store.pending_deletions(), 0);
    assert_eq!(store.live_count(), 2);

    // The top component (e3's) was moved into the hole at slot 2.
    assert_eq!(world.component_slot(e1, weight_id), Slot::new(1));
    assert_eq!(world.component_slot(e3, weight_id), Slot::new(2));
    assert_eq!(*world.get::<Weight>(e1), Weight(1));
    assert_eq!(*world.get::<Weight>(e3), Weight(3));
}

#[test]
fn removing_the_top_entity_just_shrinks_the_store() {
    let mut world = World::new();
    let e1 = world.make();
    let e2 = world.make();
    world.add(e1, Weight(10));
    world.add(e2, Weight(20));

    world.remove(e2);
    world.collect_removed();

    let weight_id = component_id_of::<Weight>();
    assert_eq!(world.raw_store(weight_id).end(), 2);
    assert_eq!(world.component_slot(e1, weight_id), Slot::new(1));
    assert_eq!(*world.get::<Weight>(e1), Weight(10));
}

#[test]
fn routing_is_repaired_for_every_live_entity_after_bulk_removal() {
    let mut world = World::new();
    let mut entities = Vec::new();
    for value in 0..64i64 {
        let entity = world.make();
        world.add(entity, Weight(value));
        if value % 2 == 0 {
            world.add(entity, Tag(value as u64));
        }
        entities.push(entity);
    }

    // Remove every third entity, then compact.
    for (index, &entity) in entities.iter().enumerate() {
        if index % 3 == 0 {
            world.remove(entity);
        }
    }
    world.collect_removed();

    let weight_id = component_id_of::<Weight>();
    let tag_id = component_id_of::<Tag>();

    for (index, &entity) in entities.iter().enumerate() {
        if index % 3 == 0 {
            assert!(!world.is_valid_index(entity));
            continue;
        }

        // Back-references must agree with the repaired routing table.
        let weight_slot = world.component_slot(entity, weight_id);
        assert_eq!(world.raw_store(weight_id).back_ref(weight_slot), entity);
        assert_eq!(*world.get::<Weight>(entity), Weight(index as i64));

        if index % 2 == 0 {
            let tag_slot = world.component_slot(entity, tag_id);
            assert_eq!(world.raw_store(tag_id).back_ref(tag_slot), entity);
            assert_eq!(*world.get::<Tag>(entity), Tag(index as u64));
        }
    }

    // Stores hold exactly the surviving objects, contiguously.
    let survivors = entities.len() - entities.len().div_ceil(3);
    assert_eq!(world.raw_store(weight_id).live_count(), survivors);
    assert_eq!(world.raw_store(weight_id).end() as usize, survivors + 1);
}

#[test]
fn component_removal_packs_at_the_next_collect() {
    let mut world = World::new();
    let keeper = world.make();
    let loser = world.make();
    world.add(keeper, Weight(7));
    world.add(loser, Weight(8));

    world.remove_component::<Weight>(loser);
    assert!(!world.has::<Weight>(loser));
    assert!(world.is_valid_index(loser), "entity survives losing a component");

    let weight_id = component_id_of::<Weight>();
    assert_eq!(world.raw_store(weight_id).pending_deletions(), 1);

    world.collect_removed();
    assert_eq!(world.raw_store(weight_id).pending_deletions(), 0);
    assert_eq!(world.raw_store(weight_id).end(), 2);
    assert_eq!(*world.get::<Weight>(keeper), Weight(7));
}

#[test]
fn store_grows_past_initial_capacity() {
    let mut world = World::new();
    let mut entities = Vec::new();
    for value in 0..100i64 {
        let entity = world.make();
        world.add(entity, Weight(value));
        entities.push(entity);
    }
    for (value, &entity) in entities.iter().enumerate() {
        assert_eq!(*world.get::<Weight>(entity), Weight(value as i64));
    }
}
