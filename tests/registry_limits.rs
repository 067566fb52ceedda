//! Exhausts the component id space. Lives in its own test binary because the
//! registry is process-wide.

use substrate::{try_component_id_of, RegistryError, COMPONENT_CAP};

macro_rules! filler_components {
    ($($name:ident),+ $(,)?) => {
        $(
            #[derive(Clone, Copy)]
            struct $name(u64);
        )+

        fn register_all() -> Vec<substrate::RegistryResult<substrate::ComponentId>> {
            vec![$(try_component_id_of::<$name>()),+]
        }
    };
}

filler_components!(
    F00, F01, F02, F03, F04, F05, F06, F07, F08, F09, F10, F11, F12, F13, F14, F15,
    F16, F17, F18, F19, F20, F21, F22, F23, F24, F25, F26, F27, F28, F29, F30, F31,
    F32, F33, F34, F35, F36, F37, F38, F39, F40, F41, F42, F43, F44, F45, F46, F47,
    F48, F49, F50, F51, F52, F53, F54, F55, F56, F57, F58, F59, F60, F61, F62, F63,
);

#[derive(Clone, Copy)]
struct Overflow(u8);

#[test]
fn ids_are_dense_idempotent_and_bounded() {
    let results = register_all();
    assert_eq!(results.len(), COMPONENT_CAP);

    let mut ids = Vec::new();
    for result in results {
        ids.push(result.expect("registration within the cap succeeds"));
    }

    // Dense and distinct.
    let mut sorted: Vec<u32> = ids.iter().map(|id| id.raw()).collect();
    sorted.sort_unstable();
    assert_eq!(sorted, (0..COMPONENT_CAP as u32).collect::<Vec<_>>());

    // Asking again yields the same id.
    assert_eq!(try_component_id_of::<F00>().unwrap(), ids[0]);
    assert_eq!(try_component_id_of::<F63>().unwrap(), ids[63]);

    // The 65th distinct type does not fit.
    assert_eq!(
        try_component_id_of::<Overflow>(),
        Err(RegistryError::CapacityExceeded { cap: COMPONENT_CAP })
    );
}
