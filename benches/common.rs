//! Shared fixtures for the criterion benches.

use substrate::World;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Flagged(pub u32);

pub const AGENTS_SMALL: usize = 10_000;
pub const AGENTS_MED: usize = 100_000;

/// Builds a world where every entity has a `Position`, every second one a
/// `Velocity`, and every `rare_stride`-th one a `Flagged`.
pub fn populate(world: &mut World, count: usize, rare_stride: usize) {
    for index in 0..count {
        let entity = world.make();
        world.add(entity, Position { x: index as f32, y: 0.0 });
        if index % 2 == 0 {
            world.add(entity, Velocity { dx: 1.0, dy: -1.0 });
        }
        if index % rare_stride == 0 {
            world.add(entity, Flagged(index as u32));
        }
    }
}
