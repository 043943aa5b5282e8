//! Shared setup helpers for quanta2d benchmarks.
//!
//! Run all:
//!   cargo bench --manifest-path benchmarks/Cargo.toml --bench physics
//! Filter by group:
//!   cargo bench --manifest-path benchmarks/Cargo.toml --bench physics -- broadphase

use hecs::World;

use quanta2d::ecs::components::body::{Body, Guid};
use quanta2d::ecs::components::shape::{Aabb, CircleShape, ConvexHullShape, HullWorldCache};
use quanta2d::ecs::resources::MixRule;
use quanta2d::fixed::{Fx, FxVec2};
use quanta2d::physics::{PhysicsConfig, PhysicsWorld};

fn empty_aabb() -> Aabb {
    Aabb { minx: Fx::ZERO, maxx: Fx::ZERO, miny: Fx::ZERO, maxy: Fx::ZERO, epoch: 0 }
}

fn box_hull(half: f64) -> ConvexHullShape {
    ConvexHullShape::new(
        vec![
            FxVec2::new(Fx::from_f64(-half), Fx::from_f64(-half)),
            FxVec2::new(Fx::from_f64(half), Fx::from_f64(-half)),
            FxVec2::new(Fx::from_f64(half), Fx::from_f64(half)),
            FxVec2::new(Fx::from_f64(-half), Fx::from_f64(half)),
        ],
        Fx::ZERO,
    )
    .unwrap()
}

/// Grid of `n` overlapping dynamic circles, roughly half colliding with a
/// neighbor.
pub fn setup_circle_world(n: usize) -> World {
    let mut world = World::new();
    let cols = (n as f64).sqrt().ceil() as usize;

    for i in 0..n {
        let x = (i % cols) as f64 * 1.5;
        let y = (i / cols) as f64 * 1.5;
        let pos = FxVec2::new(Fx::from_f64(x), Fx::from_f64(y));
        world.spawn((
            Body::new_dynamic(pos, Fx::ONE, Fx::ONE),
            Guid::new(0, i as u64),
            CircleShape::new(Fx::ONE, Fx::ZERO).unwrap(),
            empty_aabb(),
        ));
    }
    world
}

/// Mixed scene: half dynamic circles, half static boxes.
pub fn setup_mixed_world(n: usize) -> World {
    let mut world = World::new();
    let cols = (n as f64).sqrt().ceil() as usize;

    for i in 0..n {
        let x = (i % cols) as f64 * 1.5;
        let y = (i / cols) as f64 * 1.5;
        let pos = FxVec2::new(Fx::from_f64(x), Fx::from_f64(y));

        if i % 2 == 0 {
            world.spawn((Body::new_dynamic(pos, Fx::ONE, Fx::ONE), Guid::new(0, i as u64), CircleShape::new(Fx::ONE, Fx::ZERO).unwrap(), empty_aabb()));
        } else {
            world.spawn((Body::new_static(pos), Guid::new(0, i as u64), box_hull(0.5), HullWorldCache::default(), empty_aabb()));
        }
    }
    world
}

/// Bodies spread far apart; broadphase should find no pairs.
pub fn setup_sparse_world(n: usize) -> World {
    let mut world = World::new();
    let cols = (n as f64).sqrt().ceil() as usize;

    for i in 0..n {
        let x = (i % cols) as f64 * 10.0;
        let y = (i / cols) as f64 * 10.0;
        let pos = FxVec2::new(Fx::from_f64(x), Fx::from_f64(y));
        world.spawn((
            Body::new_dynamic(pos, Fx::ONE, Fx::ONE),
            Guid::new(0, i as u64),
            CircleShape::new(Fx::from_f64(0.5), Fx::ZERO).unwrap(),
            empty_aabb(),
        ));
    }
    world
}

/// Ground box + `n` dynamic circles stacked above it, wired through a fresh
/// [`PhysicsWorld`] ready to step.
pub fn setup_scene(n: usize) -> (World, PhysicsWorld) {
    let mut world = World::new();
    world.spawn((Body::new_static(FxVec2::new(Fx::ZERO, -Fx::from_int(2))), Guid::new(0, 0), box_hull(50.0), HullWorldCache::default(), empty_aabb()));

    let cols = (n as f64).sqrt().ceil() as usize;
    for i in 0..n {
        let x = (i % cols) as f64 * 1.2 - (cols as f64 * 0.6);
        let y = (i / cols) as f64 * 1.2 + 1.0;
        let pos = FxVec2::new(Fx::from_f64(x), Fx::from_f64(y));
        world.spawn((
            Body::new_dynamic(pos, Fx::ONE, Fx::ONE),
            Guid::new(0, (i + 1) as u64),
            CircleShape::new(Fx::from_f64(0.4), Fx::ZERO).unwrap(),
            empty_aabb(),
        ));
    }

    let physics = PhysicsWorld::new(PhysicsConfig::default(), quanta2d::ecs::resources::MaterialTable::new(MixRule::Min, MixRule::Max), 1);
    (world, physics)
}

/// `n` dynamic circles resting in contact with their right-hand neighbor, a
/// scene shaped to keep the solver busy with a long contact chain.
pub fn setup_contact_chain(n: usize) -> (World, PhysicsWorld) {
    let mut world = World::new();
    world.spawn((Body::new_static(FxVec2::new(-Fx::from_int(2), Fx::ZERO)), Guid::new(0, 0), box_hull(1.0), HullWorldCache::default(), empty_aabb()));

    for i in 0..n {
        let x = (i as f64) * 0.95;
        let pos = FxVec2::new(Fx::from_f64(x), Fx::ZERO);
        world.spawn((Body::new_dynamic(pos, Fx::ONE, Fx::ONE), Guid::new(0, (i + 1) as u64), CircleShape::new(Fx::from_f64(0.5), Fx::ZERO).unwrap(), empty_aabb()));
    }

    let physics = PhysicsWorld::new(PhysicsConfig::default(), quanta2d::ecs::resources::MaterialTable::new(MixRule::Min, MixRule::Max), 1);
    (world, physics)
}
