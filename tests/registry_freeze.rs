//! Freezing the registry. Lives in its own test binary because the registry
//! is process-wide.

use substrate::{
    components_frozen, freeze_components, registered_id_of, try_component_id_of, RegistryError,
};

#[derive(Clone, Copy)]
struct Early(u32);

#[derive(Clone, Copy)]
struct Late(u32);

#[test]
fn frozen_registry_rejects_new_types_but_serves_old_ones() {
    let early = try_component_id_of::<Early>().unwrap();
    assert!(!components_frozen());

    freeze_components();
    assert!(components_frozen());

    // Known types still resolve, idempotently.
    assert_eq!(try_component_id_of::<Early>().unwrap(), early);
    assert_eq!(registered_id_of::<Early>(), Some(early));

    // A first mention after the freeze is an error.
    match try_component_id_of::<Late>() {
        Err(RegistryError::Frozen { name }) => assert!(name.contains("Late")),
        other => panic!("expected a frozen error, got {other:?}"),
    }
    assert_eq!(registered_id_of::<Late>(), None);
}
