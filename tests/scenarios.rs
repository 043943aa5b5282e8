//! End-to-end scenario tests (spec.md §8's concrete scenarios E1-E6), driven
//! entirely through [`quanta2d::physics::PhysicsWorld::step`] the way a
//! collaborator would: spawn components into a plain `hecs::World`, step,
//! read back the published state.
//!
//! Grounded on the teacher's own integration-test style: scenario-named
//! functions under `tests/`, plain `assert!`/`assert_eq!`, no custom harness.

use hecs::World;

use quanta2d::ecs::components::body::{Body, Guid};
use quanta2d::ecs::components::joint::DistanceJoint;
use quanta2d::ecs::components::shape::{Aabb, CircleShape, ConvexHullShape, HullWorldCache};
use quanta2d::ecs::resources::MixRule;
use quanta2d::fixed::{Fx, FxVec2};
use quanta2d::physics::{PhysicsConfig, PhysicsWorld};

fn empty_aabb() -> Aabb {
    Aabb { minx: Fx::ZERO, maxx: Fx::ZERO, miny: Fx::ZERO, maxy: Fx::ZERO, epoch: 0 }
}

fn box_hull(half_x: f64, half_y: f64) -> ConvexHullShape {
    ConvexHullShape::new(
        vec![
            FxVec2::new(Fx::from_f64(-half_x), Fx::from_f64(-half_y)),
            FxVec2::new(Fx::from_f64(half_x), Fx::from_f64(-half_y)),
            FxVec2::new(Fx::from_f64(half_x), Fx::from_f64(half_y)),
            FxVec2::new(Fx::from_f64(-half_x), Fx::from_f64(half_y)),
        ],
        Fx::ZERO,
    )
    .unwrap()
}

fn spawn_box(world: &mut World, guid: u64, pos: FxVec2, half_x: f64, half_y: f64, dynamic: bool) -> hecs::Entity {
    let body = if dynamic { Body::new_dynamic(pos, Fx::ONE, Fx::ONE) } else { Body::new_static(pos) };
    world.spawn((body, Guid::new(0, guid), box_hull(half_x, half_y), HullWorldCache::default(), empty_aabb()))
}

fn fresh_physics() -> PhysicsWorld {
    PhysicsWorld::new(PhysicsConfig::default(), quanta2d::ecs::resources::MaterialTable::new(MixRule::Min, MixRule::Max), 1)
}

/// E1: two 2x2 boxes, A at (0,0), B at (1.5, 0), both dynamic. One contact,
/// normal pointing roughly +x, penetration roughly 0.5.
#[test]
fn e1_overlapping_boxes_yield_one_contact_along_x() {
    let mut world = World::new();
    spawn_box(&mut world, 1, FxVec2::new(Fx::ZERO, Fx::ZERO), 1.0, 1.0, true);
    spawn_box(&mut world, 2, FxVec2::new(Fx::from_f64(1.5), Fx::ZERO), 1.0, 1.0, true);

    let mut physics = fresh_physics();
    physics.step(&mut world, physics.config.fixed_timestep);

    let contacts = physics.contacts();
    assert_eq!(contacts.manifolds.len(), 1);
    let manifold = &contacts.manifolds[0];
    assert!(manifold.normal.x.abs() > Fx::from_f64(0.9), "normal.x = {:?}", manifold.normal.x);
    assert!(manifold.normal.y.abs() < Fx::from_f64(0.2));
    assert_eq!(manifold.points.len(), 1);
    let pen = manifold.points[0].penetration.to_f64();
    assert!((pen - 0.5).abs() < 0.05, "penetration = {pen}");
}

/// E2: same boxes, B moved out to (5, 0). No contact.
#[test]
fn e2_separated_boxes_yield_no_contact() {
    let mut world = World::new();
    spawn_box(&mut world, 1, FxVec2::new(Fx::ZERO, Fx::ZERO), 1.0, 1.0, true);
    spawn_box(&mut world, 2, FxVec2::new(Fx::from_int(5), Fx::ZERO), 1.0, 1.0, true);

    let mut physics = fresh_physics();
    physics.step(&mut world, physics.config.fixed_timestep);

    assert!(physics.contacts().manifolds.is_empty());
}

/// E3: ground box 4x2 at (0, -0.5), top box 2x2 at (0, 1). The boxes overlap
/// by 0.5 along y; contact normal should point mostly +y (from ground to
/// top box).
#[test]
fn e3_stacked_boxes_yield_mostly_vertical_contact() {
    let mut world = World::new();
    spawn_box(&mut world, 1, FxVec2::new(Fx::ZERO, Fx::from_f64(-0.5)), 2.0, 1.0, false);
    spawn_box(&mut world, 2, FxVec2::new(Fx::ZERO, Fx::ONE), 1.0, 1.0, true);

    let mut physics = fresh_physics();
    physics.step(&mut world, physics.config.fixed_timestep);

    let contacts = physics.contacts();
    assert_eq!(contacts.manifolds.len(), 1);
    let manifold = &contacts.manifolds[0];
    assert!(manifold.normal.y.abs().to_f64() > 0.9, "normal = {:?}", manifold.normal);
    assert!(manifold.points[0].penetration > Fx::ZERO);
}

/// E4: a static thin wall (half-width 0.1) and a fast bullet circle that
/// would tunnel through it in a single discrete step without CCD. Across
/// several fixed steps the bullet must never end up past the wall's
/// inflated far surface.
#[test]
fn e4_fast_bullet_does_not_tunnel_through_thin_wall() {
    let mut world = World::new();
    let wall_x = Fx::from_int(3);
    world.spawn((
        Body::new_static(FxVec2::new(wall_x, Fx::ZERO)),
        Guid::new(0, 1),
        box_hull(0.1, 5.0),
        HullWorldCache::default(),
        empty_aabb(),
    ));

    let bullet_radius = Fx::from_f64(0.08);
    let mut bullet_body = Body::new_dynamic(FxVec2::new(-Fx::ONE, Fx::ZERO), Fx::ONE, Fx::ONE);
    bullet_body.vel = FxVec2::new(Fx::from_int(120), Fx::ZERO);
    world.spawn((bullet_body, Guid::new(0, 2), CircleShape::new(bullet_radius, Fx::ZERO).unwrap(), empty_aabb()));

    let mut physics = fresh_physics();
    let boundary = Fx::from_int(3) - Fx::from_f64(0.1) - bullet_radius;

    for _ in 0..10 {
        physics.step(&mut world, physics.config.fixed_timestep);
        let bullet = world.query::<(&Body, &Guid)>().iter().find(|(_, (_, g))| g.lo == 2).map(|(_, (b, _))| *b).unwrap();
        assert!(bullet.pos.x < boundary + Fx::from_f64(0.01), "bullet tunneled: pos.x = {:?}, boundary = {:?}", bullet.pos.x, boundary);
    }
}

/// E5: a circle sliding under an externally-applied constant velocity bias
/// (gravity is a collaborator concern, not part of the core) against a
/// sloped hull. Three independent runs from identical initial state must
/// produce identical frame-hash sequences.
#[test]
fn e5_slope_slide_is_deterministic_across_repeated_runs() {
    fn build_world() -> World {
        let mut world = World::new();
        // Right-triangle "slope": flat base, vertical left edge, hypotenuse
        // facing up-right, wound CCW.
        let slope = ConvexHullShape::new(
            vec![
                FxVec2::new(Fx::from_int(-4), Fx::from_int(-2)),
                FxVec2::new(Fx::from_int(4), Fx::from_int(-2)),
                FxVec2::new(Fx::from_int(-4), Fx::from_int(2)),
            ],
            Fx::ZERO,
        )
        .unwrap();
        world.spawn((Body::new_static(FxVec2::ZERO), Guid::new(0, 1), slope, HullWorldCache::default(), empty_aabb()));

        let ball = Body::new_dynamic(FxVec2::new(Fx::ZERO, Fx::from_int(3)), Fx::ONE, Fx::ONE);
        world.spawn((ball, Guid::new(0, 2), CircleShape::new(Fx::from_f64(0.3), Fx::ZERO).unwrap(), empty_aabb()));
        world
    }

    fn run() -> Vec<u64> {
        let mut world = build_world();
        let mut physics = fresh_physics();
        let gravity_dv = Fx::from_f64(-9.8) * physics.config.fixed_timestep;

        let mut hashes = Vec::new();
        for _ in 0..10 {
            for (_, body) in world.query::<&mut Body>().iter() {
                if !body.is_static() {
                    body.vel.y += gravity_dv;
                }
            }
            let stats = physics.step(&mut world, physics.config.fixed_timestep);
            hashes.extend(stats.iter().map(|s| s.frame_hash));
        }
        hashes
    }

    let run_a = run();
    let run_b = run();
    let run_c = run();
    assert_eq!(run_a, run_b);
    assert_eq!(run_b, run_c);
}

/// E6: a static anchor and a dynamic ball held at distance 2 by a distance
/// joint, given an initial tangential velocity so it orbits. Over 100 frames
/// the ball must stay within the spec's tolerance band of the rest length,
/// and the joint's accumulated impulse (its warm-start state) must be
/// nonzero, i.e. actually engaged.
#[test]
fn e6_pendulum_distance_joint_holds_length_over_many_frames() {
    let mut world = World::new();
    let anchor = world.spawn((Body::new_static(FxVec2::ZERO), Guid::new(0, 1)));
    let mut ball_body = Body::new_dynamic(FxVec2::new(Fx::from_int(2), Fx::ZERO), Fx::ONE, Fx::ONE);
    ball_body.vel = FxVec2::new(Fx::ZERO, Fx::from_int(5));
    let ball = world.spawn((ball_body, Guid::new(0, 2)));

    let joint = DistanceJoint::new(anchor, ball, FxVec2::ZERO, FxVec2::ZERO, Fx::from_int(2), Fx::ZERO, Fx::from_f64(0.2)).unwrap();
    world.spawn((joint,));

    let mut physics = fresh_physics();
    for _ in 0..100 {
        physics.step(&mut world, physics.config.fixed_timestep);
        let anchor_pos = world.get::<&Body>(anchor).unwrap().pos;
        let ball_pos = world.get::<&Body>(ball).unwrap().pos;
        let dist = (ball_pos - anchor_pos).length().to_f64();
        assert!((1.85..=2.15).contains(&dist), "distance drifted to {dist}");
    }

    let joint_after = world.query::<&DistanceJoint>().iter().next().unwrap().1.accumulated_impulse;
    assert!(joint_after.abs() > Fx::ZERO, "joint never accumulated any impulse");
}
