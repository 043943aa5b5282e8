//! Velocity-level sequential-impulse solver (C8): contacts and joints.
//!
//! Grounded on the teacher's `physics/solver.rs` (`solve_contacts` iterating
//! `solver_iterations` times over every manifold, per-contact relative
//! velocity / impulse / friction-clamp structure) but split from position
//! correction per the spec: this stage only ever touches velocities, never
//! positions (C9 in `position_correction.rs` handles penetration).
//! Restitution (missing from the teacher's Baumgarte-only contact solve) is
//! folded in here as a closing-velocity bias, the standard sequential-impulse
//! treatment.

use hecs::World;

use crate::ecs::components::body::Body;
use crate::ecs::components::joint::{DistanceJoint, PrismaticJoint, RevoluteJoint};
use crate::ecs::resources::{ContactManifold, Contacts2D};
use crate::fixed::{Fx, FxVec2};
use crate::physics::joints;
use crate::physics::material::MixedSurface;

struct ContactRow {
    ra: FxVec2,
    rb: FxVec2,
    normal: FxVec2,
    tangent: FxVec2,
    normal_mass: Fx,
    tangent_mass: Fx,
}

fn prepare_row(body_a: &Body, body_b: &Body, point_pos: FxVec2, normal: FxVec2) -> ContactRow {
    let ra = point_pos - body_a.pos;
    let rb = point_pos - body_b.pos;
    let tangent = normal.perp();

    let ra_cross_n = ra.cross(normal);
    let rb_cross_n = rb.cross(normal);
    let k_normal = body_a.inv_mass + body_b.inv_mass + body_a.inv_inertia * ra_cross_n * ra_cross_n + body_b.inv_inertia * rb_cross_n * rb_cross_n;

    let ra_cross_t = ra.cross(tangent);
    let rb_cross_t = rb.cross(tangent);
    let k_tangent = body_a.inv_mass + body_b.inv_mass + body_a.inv_inertia * ra_cross_t * ra_cross_t + body_b.inv_inertia * rb_cross_t * rb_cross_t;

    ContactRow {
        ra,
        rb,
        normal,
        tangent,
        normal_mass: if k_normal.is_zero() { Fx::ZERO } else { Fx::ONE / k_normal },
        tangent_mass: if k_tangent.is_zero() { Fx::ZERO } else { Fx::ONE / k_tangent },
    }
}

/// Closing-velocity restitution bias for one contact point, read from the
/// bodies' velocities *before* this frame's warm-start or any solve
/// iteration has touched them (Box2D's `InitVelocityConstraints` moment).
/// Computed once per point per frame, never inside the Gauss-Seidel loop —
/// recomputing it every iteration would keep re-measuring an
/// already-decelerated closing speed and the bounce would decay toward
/// zero instead of converging to `-e * vn_initial`.
fn restitution_bias(body_a: &Body, body_b: &Body, point_pos: FxVec2, normal: FxVec2, restitution: Fx, bounce_threshold: Fx) -> Fx {
    let ra = point_pos - body_a.pos;
    let rb = point_pos - body_b.pos;
    let rel_vel = (body_b.vel + FxVec2::cross_scalar(body_b.omega, rb)) - (body_a.vel + FxVec2::cross_scalar(body_a.omega, ra));
    let closing_speed = rel_vel.dot(normal);
    if -closing_speed > bounce_threshold {
        -restitution * closing_speed
    } else {
        Fx::ZERO
    }
}

fn apply_impulse(body_a: &mut Body, body_b: &mut Body, row: &ContactRow, impulse: FxVec2) {
    body_a.vel = body_a.vel - impulse * body_a.inv_mass;
    body_a.omega -= body_a.inv_inertia * row.ra.cross(impulse);
    body_b.vel = body_b.vel + impulse * body_b.inv_mass;
    body_b.omega += body_b.inv_inertia * row.rb.cross(impulse);
}

fn relative_velocity(body_a: &Body, body_b: &Body, row: &ContactRow) -> FxVec2 {
    (body_b.vel + FxVec2::cross_scalar(body_b.omega, row.rb)) - (body_a.vel + FxVec2::cross_scalar(body_a.omega, row.ra))
}

/// Runs warm-start, then `iterations` velocity-solve passes over every
/// manifold and joint, in that fixed order: manifolds first (sorted by pair
/// key, already the iteration order `Contacts2D::manifolds` was built in),
/// then joints (queried in a stable order by the caller).
pub fn solve(world: &mut World, contacts: &mut Contacts2D, surfaces: &[MixedSurface], iterations: u32, joint_beta: Fx, inv_dt: Fx) {
    prepare_joints_once(world);
    let biases = prepare_contact_biases(world, contacts, surfaces);
    warm_start(world, contacts);
    warm_start_joints(world);

    for _ in 0..iterations {
        solve_contacts_once(world, contacts, surfaces, &biases);
        solve_joints_once(world, joint_beta, inv_dt);
    }

    write_back_warm_start(contacts);
}

/// Computes each manifold's per-point restitution bias exactly once, before
/// warm-start perturbs any velocity this frame.
fn prepare_contact_biases(world: &World, contacts: &Contacts2D, surfaces: &[MixedSurface]) -> Vec<Vec<Fx>> {
    contacts
        .manifolds
        .iter()
        .zip(surfaces.iter())
        .map(|(manifold, surface)| {
            let (Ok(body_a), Ok(body_b)) = (world.get::<&Body>(manifold.entity_a), world.get::<&Body>(manifold.entity_b)) else {
                return vec![Fx::ZERO; manifold.points.len()];
            };
            manifold
                .points
                .iter()
                .map(|point| restitution_bias(&body_a, &body_b, point.position, manifold.normal, surface.restitution, surface.bounce_threshold))
                .collect()
        })
        .collect()
}

/// Compiles every joint's effective mass once per frame (spec §4.6: "each
/// joint is compiled once per frame into a row of a typed batch"), skipping
/// any joint flagged `broken` (spec §4.12).
fn prepare_joints_once(world: &mut World) {
    let distance_entities: Vec<hecs::Entity> = world.query::<&DistanceJoint>().iter().filter(|(_, j)| !j.broken).map(|(e, _)| e).collect();
    for entity in distance_entities {
        let (body_a_entity, body_b_entity) = {
            let joint = world.get::<&DistanceJoint>(entity).unwrap();
            (joint.body_a, joint.body_b)
        };
        let Ok([body_a, body_b]) = world.query_many_mut::<&Body, 2>([body_a_entity, body_b_entity]) else {
            continue;
        };
        let mut joint = world.get::<&mut DistanceJoint>(entity).unwrap();
        joints::prepare_distance(&mut joint, &body_a, &body_b);
    }

    let revolute_entities: Vec<hecs::Entity> = world.query::<&RevoluteJoint>().iter().map(|(e, _)| e).collect();
    for entity in revolute_entities {
        let (body_a_entity, body_b_entity) = {
            let joint = world.get::<&RevoluteJoint>(entity).unwrap();
            (joint.body_a, joint.body_b)
        };
        let Ok([body_a, body_b]) = world.query_many_mut::<&Body, 2>([body_a_entity, body_b_entity]) else {
            continue;
        };
        let mut joint = world.get::<&mut RevoluteJoint>(entity).unwrap();
        joints::prepare_revolute(&mut joint, &body_a, &body_b);
    }

    let prismatic_entities: Vec<hecs::Entity> = world.query::<&PrismaticJoint>().iter().map(|(e, _)| e).collect();
    for entity in prismatic_entities {
        let (body_a_entity, body_b_entity) = {
            let joint = world.get::<&PrismaticJoint>(entity).unwrap();
            (joint.body_a, joint.body_b)
        };
        let Ok([body_a, body_b]) = world.query_many_mut::<&Body, 2>([body_a_entity, body_b_entity]) else {
            continue;
        };
        let mut joint = world.get::<&mut PrismaticJoint>(entity).unwrap();
        joints::prepare_prismatic(&mut joint, &body_a, &body_b);
    }
}

/// Injects every joint's impulse from the previous frame before the first
/// velocity iteration, matching the contact warm-start convention.
fn warm_start_joints(world: &mut World) {
    let distance_entities: Vec<hecs::Entity> = world.query::<&DistanceJoint>().iter().filter(|(_, j)| !j.broken).map(|(e, _)| e).collect();
    for entity in distance_entities {
        let (body_a_entity, body_b_entity) = {
            let joint = world.get::<&DistanceJoint>(entity).unwrap();
            (joint.body_a, joint.body_b)
        };
        let Ok([mut body_a, mut body_b]) = world.query_many_mut::<&mut Body, 2>([body_a_entity, body_b_entity]) else {
            continue;
        };
        let joint = world.get::<&DistanceJoint>(entity).unwrap();
        joints::warm_start_distance(&joint, &mut body_a, &mut body_b);
    }

    let revolute_entities: Vec<hecs::Entity> = world.query::<&RevoluteJoint>().iter().map(|(e, _)| e).collect();
    for entity in revolute_entities {
        let (body_a_entity, body_b_entity) = {
            let joint = world.get::<&RevoluteJoint>(entity).unwrap();
            (joint.body_a, joint.body_b)
        };
        let Ok([mut body_a, mut body_b]) = world.query_many_mut::<&mut Body, 2>([body_a_entity, body_b_entity]) else {
            continue;
        };
        let joint = world.get::<&RevoluteJoint>(entity).unwrap();
        joints::warm_start_revolute(&joint, &mut body_a, &mut body_b);
    }

    let prismatic_entities: Vec<hecs::Entity> = world.query::<&PrismaticJoint>().iter().map(|(e, _)| e).collect();
    for entity in prismatic_entities {
        let (body_a_entity, body_b_entity) = {
            let joint = world.get::<&PrismaticJoint>(entity).unwrap();
            (joint.body_a, joint.body_b)
        };
        let Ok([mut body_a, mut body_b]) = world.query_many_mut::<&mut Body, 2>([body_a_entity, body_b_entity]) else {
            continue;
        };
        let joint = world.get::<&PrismaticJoint>(entity).unwrap();
        joints::warm_start_prismatic(&joint, &mut body_a, &mut body_b);
    }
}

fn warm_start(world: &mut World, contacts: &Contacts2D) {
    for manifold in &contacts.manifolds {
        let Ok([mut body_a, mut body_b]) = world.query_many_mut::<&mut Body, 2>([manifold.entity_a, manifold.entity_b]) else {
            continue;
        };
        for point in &manifold.points {
            let row = prepare_row(&body_a, &body_b, point.position, manifold.normal);
            let impulse = row.normal * point.warm_start.normal_impulse + row.tangent * point.warm_start.tangent_impulse;
            apply_impulse(&mut body_a, &mut body_b, &row, impulse);
        }
    }
}

fn solve_contacts_once(world: &mut World, contacts: &mut Contacts2D, surfaces: &[MixedSurface], biases: &[Vec<Fx>]) {
    for ((manifold, surface), point_biases) in contacts.manifolds.iter_mut().zip(surfaces.iter()).zip(biases.iter()) {
        solve_manifold(world, manifold, *surface, point_biases);
    }
}

fn solve_manifold(world: &mut World, manifold: &mut ContactManifold, surface: MixedSurface, point_biases: &[Fx]) {
    let Ok([mut body_a, mut body_b]) = world.query_many_mut::<&mut Body, 2>([manifold.entity_a, manifold.entity_b]) else {
        return;
    };
    if body_a.is_static() && body_b.is_static() {
        return;
    }

    for (point, bias) in manifold.points.iter_mut().zip(point_biases.iter()) {
        let row = prepare_row(&body_a, &body_b, point.position, manifold.normal);

        // Normal impulse. `bias` was computed once before warm-start this
        // frame, not re-derived from the iteration's current (already
        // partially resolved) closing speed.
        let rel_vel = relative_velocity(&body_a, &body_b, &row);
        let vn = rel_vel.dot(row.normal);
        let mut jn = -(vn - *bias) * row.normal_mass;
        let new_accum = (point.warm_start.normal_impulse + jn).max(Fx::ZERO);
        jn = new_accum - point.warm_start.normal_impulse;
        point.warm_start.normal_impulse = new_accum;
        apply_impulse(&mut body_a, &mut body_b, &row, row.normal * jn);

        // Friction impulse, Coulomb-clamped to this point's current normal
        // impulse.
        let rel_vel = relative_velocity(&body_a, &body_b, &row);
        let vt = rel_vel.dot(row.tangent);
        let mut jt = -vt * row.tangent_mass;
        let max_friction = surface.friction * point.warm_start.normal_impulse;
        let new_tangent = (point.warm_start.tangent_impulse + jt).clamp(-max_friction, max_friction);
        jt = new_tangent - point.warm_start.tangent_impulse;
        point.warm_start.tangent_impulse = new_tangent;
        apply_impulse(&mut body_a, &mut body_b, &row, row.tangent * jt);
    }
}

fn solve_joints_once(world: &mut World, beta: Fx, inv_dt: Fx) {
    let distance_entities: Vec<hecs::Entity> = world.query::<&DistanceJoint>().iter().filter(|(_, j)| !j.broken).map(|(e, _)| e).collect();
    for entity in distance_entities {
        let (body_a_entity, body_b_entity) = {
            let joint = world.get::<&DistanceJoint>(entity).unwrap();
            (joint.body_a, joint.body_b)
        };
        let Ok([mut body_a, mut body_b]) = world.query_many_mut::<&mut Body, 2>([body_a_entity, body_b_entity]) else {
            continue;
        };
        let mut joint = world.get::<&mut DistanceJoint>(entity).unwrap();
        joints::solve_distance(&mut joint, &mut body_a, &mut body_b, beta, inv_dt);
    }

    let revolute_entities: Vec<hecs::Entity> = world.query::<&RevoluteJoint>().iter().map(|(e, _)| e).collect();
    for entity in revolute_entities {
        let (body_a_entity, body_b_entity) = {
            let joint = world.get::<&RevoluteJoint>(entity).unwrap();
            (joint.body_a, joint.body_b)
        };
        let Ok([mut body_a, mut body_b]) = world.query_many_mut::<&mut Body, 2>([body_a_entity, body_b_entity]) else {
            continue;
        };
        let mut joint = world.get::<&mut RevoluteJoint>(entity).unwrap();
        joints::solve_revolute(&mut joint, &mut body_a, &mut body_b, beta, inv_dt);
    }

    let prismatic_entities: Vec<hecs::Entity> = world.query::<&PrismaticJoint>().iter().map(|(e, _)| e).collect();
    for entity in prismatic_entities {
        let (body_a_entity, body_b_entity) = {
            let joint = world.get::<&PrismaticJoint>(entity).unwrap();
            (joint.body_a, joint.body_b)
        };
        let Ok([mut body_a, mut body_b]) = world.query_many_mut::<&mut Body, 2>([body_a_entity, body_b_entity]) else {
            continue;
        };
        let mut joint = world.get::<&mut PrismaticJoint>(entity).unwrap();
        joints::solve_prismatic(&mut joint, &mut body_a, &mut body_b, beta, inv_dt);
    }
}

fn write_back_warm_start(contacts: &mut Contacts2D) {
    contacts.commit_warm_start();
}
