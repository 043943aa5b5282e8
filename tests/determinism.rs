//! Cross-run determinism tests (spec.md §8 invariants 1 and 6), exercised
//! at the `PhysicsWorld::step` level rather than the unit-level coverage
//! already in `src/physics/determinism.rs`.

use hecs::World;

use quanta2d::ecs::components::body::{Body, Guid};
use quanta2d::ecs::components::shape::{Aabb, CircleShape, ConvexHullShape, HullWorldCache};
use quanta2d::ecs::resources::MixRule;
use quanta2d::fixed::{Fx, FxVec2};
use quanta2d::physics::{determinism, PhysicsConfig, PhysicsWorld};

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

fn build_scene() -> World {
    let mut world = World::new();
    world.spawn((Body::new_static(FxVec2::ZERO), Guid::new(0, 1), box_hull(2.0), HullWorldCache::default(), empty_aabb()));

    let mut falling = Body::new_dynamic(FxVec2::new(Fx::from_f64(0.3), Fx::from_int(4)), Fx::ONE, Fx::ONE);
    falling.vel = FxVec2::new(Fx::from_f64(0.2), -Fx::from_int(3));
    world.spawn((falling, Guid::new(0, 2), CircleShape::new(Fx::from_f64(0.5), Fx::from_f64(0.01)).unwrap(), empty_aabb()));

    world
}

/// Invariant 1: two independent runs from identical initial state and an
/// identical (trivial, no-input) command stream produce identical frame
/// hash sequences.
#[test]
fn identical_initial_state_produces_identical_frame_hash_sequence() {
    fn run() -> Vec<u64> {
        let mut world = build_scene();
        let mut physics = PhysicsWorld::new(PhysicsConfig::default(), quanta2d::ecs::resources::MaterialTable::new(MixRule::Min, MixRule::Max), 99);
        let dt = physics.config.fixed_timestep;
        (0..40).flat_map(|_| physics.step(&mut world, dt)).map(|s| s.frame_hash).collect()
    }

    let a = run();
    let b = run();
    assert_eq!(a, b);
    // Sanity: the scene actually moves/collides, so this isn't vacuously
    // checking a sequence of identical static hashes.
    assert!(a.windows(2).any(|w| w[0] != w[1]), "frame hash never changed across 40 steps");
}

/// Invariant 6: warm-start idempotence. Running a frame with zero body
/// motion (a body resting exactly at its equilibrium contact) twice in a
/// row produces identical `(jn, jt)` sequences both times.
#[test]
fn zero_motion_frame_is_idempotent_under_repeated_stepping() {
    let mut world = World::new();
    world.spawn((Body::new_static(FxVec2::ZERO), Guid::new(0, 1), box_hull(2.0), HullWorldCache::default(), empty_aabb()));
    // Circle resting exactly on top of the ground box, no velocity: this
    // frame should reach the same steady-state impulses every time it's
    // repeated, since nothing about the configuration changes.
    let resting = Body::new_dynamic(FxVec2::new(Fx::ZERO, Fx::from_f64(2.5)), Fx::ONE, Fx::ONE);
    world.spawn((resting, Guid::new(0, 2), CircleShape::new(Fx::from_f64(0.5), Fx::ZERO).unwrap(), empty_aabb()));

    let mut physics = PhysicsWorld::new(PhysicsConfig::default(), quanta2d::ecs::resources::MaterialTable::new(MixRule::Min, MixRule::Max), 1);
    let dt = physics.config.fixed_timestep;

    physics.step(&mut world, dt);
    let first_cache: Vec<_> = {
        let mut entries: Vec<_> = physics.contacts().warm_start_cache.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by_key(|(k, _)| *k);
        entries
    };
    let first_hash = determinism::frame_hash(&world, physics.contacts());

    // Re-zero velocity so the next step replays an equivalent zero-motion
    // frame rather than drifting further under whatever small residual
    // velocity the first step left behind.
    for (_, body) in world.query::<&mut Body>().iter() {
        if !body.is_static() {
            body.vel = FxVec2::ZERO;
        }
    }

    physics.step(&mut world, dt);
    let second_cache: Vec<_> = {
        let mut entries: Vec<_> = physics.contacts().warm_start_cache.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by_key(|(k, _)| *k);
        entries
    };
    let second_hash = determinism::frame_hash(&world, physics.contacts());

    assert_eq!(first_cache.len(), second_cache.len());
    for ((k1, v1), (k2, v2)) in first_cache.iter().zip(second_cache.iter()) {
        assert_eq!(k1, k2);
        assert_eq!(v1.normal_impulse, v2.normal_impulse);
        assert_eq!(v1.tangent_impulse, v2.tangent_impulse);
    }
    assert_eq!(first_hash, second_hash);
}
