//! Joint constraint solving (C7): distance, revolute and prismatic joints.
//!
//! Grounded on the Box2D-style sequential-impulse joint formulation also
//! used by `other_examples/.../LingZard-tiny-physics-engine` constraint
//! solver (local anchors in body space, precomputed effective mass,
//! Baumgarte bias folded into the velocity solve) — the teacher repo has no
//! joints at all, so this stage is built from that pack precedent restated
//! in the teacher's module style.

use crate::ecs::components::body::Body;
use crate::ecs::components::joint::{DistanceJoint, PrismaticJoint, RevoluteJoint, AUTO_REST_LENGTH};
use crate::fixed::{Fx, FxVec2};

/// Per-joint preparation: recomputes the effective mass for this step and,
/// for distance joints still carrying the auto-init sentinel, pins
/// `rest_length` to the anchors' current world distance (spec §9 open
/// question resolution). Called once per joint with both endpoint bodies
/// already fetched by the caller — joints live on their own entity and
/// reference their two bodies by `hecs::Entity` (`joint.body_a`/`body_b`),
/// so the orchestrator in `physics/mod.rs` does that two-entity fetch
/// before calling into this module.
pub fn prepare_distance(joint: &mut DistanceJoint, body_a: &Body, body_b: &Body) {
    let world_a = body_a.pos + joint.anchor_a.rotate(body_a.angle.cos(), body_a.angle.sin());
    let world_b = body_b.pos + joint.anchor_b.rotate(body_b.angle.cos(), body_b.angle.sin());

    if joint.rest_length == AUTO_REST_LENGTH {
        joint.rest_length = (world_b - world_a).length();
    }

    let delta = world_b - world_a;
    let dist = delta.length();
    let axis = if dist.is_zero() { FxVec2::new(Fx::ONE, Fx::ZERO) } else { delta * (Fx::ONE / dist) };

    let ra = world_a - body_a.pos;
    let rb = world_b - body_b.pos;
    let ra_cross_n = ra.cross(axis);
    let rb_cross_n = rb.cross(axis);
    let k = body_a.inv_mass
        + body_b.inv_mass
        + body_a.inv_inertia * ra_cross_n * ra_cross_n
        + body_b.inv_inertia * rb_cross_n * rb_cross_n
        + joint.gamma;

    joint.effective_mass = if k.is_zero() { Fx::ZERO } else { Fx::ONE / k };
}

/// Solves one velocity iteration of a distance joint, writing the impulse
/// back into both bodies and accumulating it on the joint for next frame's
/// warm start.
pub fn solve_distance(joint: &mut DistanceJoint, body_a: &mut Body, body_b: &mut Body, beta: Fx, inv_dt: Fx) {
    let world_a = body_a.pos + joint.anchor_a.rotate(body_a.angle.cos(), body_a.angle.sin());
    let world_b = body_b.pos + joint.anchor_b.rotate(body_b.angle.cos(), body_b.angle.sin());
    let delta = world_b - world_a;
    let dist = delta.length();
    let axis = if dist.is_zero() { FxVec2::new(Fx::ONE, Fx::ZERO) } else { delta * (Fx::ONE / dist) };

    let ra = world_a - body_a.pos;
    let rb = world_b - body_b.pos;

    let rel_vel = (body_b.vel + FxVec2::cross_scalar(body_b.omega, rb)) - (body_a.vel + FxVec2::cross_scalar(body_a.omega, ra));
    let c = dist - joint.rest_length;
    let bias = beta * inv_dt * c;

    let jn = -(rel_vel.dot(axis) + bias) * joint.effective_mass;
    joint.accumulated_impulse += jn;

    let impulse = axis * jn;
    body_a.vel = body_a.vel - impulse * body_a.inv_mass;
    body_a.omega -= body_a.inv_inertia * ra.cross(impulse);
    body_b.vel = body_b.vel + impulse * body_b.inv_mass;
    body_b.omega += body_b.inv_inertia * rb.cross(impulse);

    if joint.can_break() && joint.accumulated_impulse.abs() > joint.break_impulse {
        joint.broken = true;
    }
}

/// Applies a joint's warm-started impulse from last frame before the first
/// velocity iteration, matching the solver's contact warm-start convention.
pub fn warm_start_distance(joint: &DistanceJoint, body_a: &mut Body, body_b: &mut Body) {
    let world_a = body_a.pos + joint.anchor_a.rotate(body_a.angle.cos(), body_a.angle.sin());
    let world_b = body_b.pos + joint.anchor_b.rotate(body_b.angle.cos(), body_b.angle.sin());
    let delta = world_b - world_a;
    let dist = delta.length();
    let axis = if dist.is_zero() { FxVec2::new(Fx::ONE, Fx::ZERO) } else { delta * (Fx::ONE / dist) };
    let ra = world_a - body_a.pos;
    let rb = world_b - body_b.pos;

    let impulse = axis * joint.accumulated_impulse;
    body_a.vel = body_a.vel - impulse * body_a.inv_mass;
    body_a.omega -= body_a.inv_inertia * ra.cross(impulse);
    body_b.vel = body_b.vel + impulse * body_b.inv_mass;
    body_b.omega += body_b.inv_inertia * rb.cross(impulse);
}

/// Revolute joint: a 2x2 point constraint pinning the two anchors together.
pub fn prepare_revolute(joint: &mut RevoluteJoint, body_a: &Body, body_b: &Body) {
    let ra = joint.anchor_a.rotate(body_a.angle.cos(), body_a.angle.sin());
    let rb = joint.anchor_b.rotate(body_b.angle.cos(), body_b.angle.sin());

    let k11 = body_a.inv_mass + body_b.inv_mass + body_a.inv_inertia * ra.y * ra.y + body_b.inv_inertia * rb.y * rb.y + joint.gamma;
    let k12 = -body_a.inv_inertia * ra.x * ra.y - body_b.inv_inertia * rb.x * rb.y;
    let k22 = body_a.inv_mass + body_b.inv_mass + body_a.inv_inertia * ra.x * ra.x + body_b.inv_inertia * rb.x * rb.x + joint.gamma;

    joint.effective_mass = invert_2x2(k11, k12, k12, k22);
}

pub fn solve_revolute(joint: &mut RevoluteJoint, body_a: &mut Body, body_b: &mut Body, beta: Fx, inv_dt: Fx) {
    let ra = joint.anchor_a.rotate(body_a.angle.cos(), body_a.angle.sin());
    let rb = joint.anchor_b.rotate(body_b.angle.cos(), body_b.angle.sin());

    let world_a = body_a.pos + ra;
    let world_b = body_b.pos + rb;
    let c = world_b - world_a;
    let bias = c * (beta * inv_dt);

    let rel_vel = (body_b.vel + FxVec2::cross_scalar(body_b.omega, rb)) - (body_a.vel + FxVec2::cross_scalar(body_a.omega, ra));
    let rhs = -(rel_vel + bias);

    let m = joint.effective_mass;
    let impulse = FxVec2::new(m[0] * rhs.x + m[1] * rhs.y, m[2] * rhs.x + m[3] * rhs.y);
    joint.accumulated_impulse = joint.accumulated_impulse + impulse;

    body_a.vel = body_a.vel - impulse * body_a.inv_mass;
    body_a.omega -= body_a.inv_inertia * ra.cross(impulse);
    body_b.vel = body_b.vel + impulse * body_b.inv_mass;
    body_b.omega += body_b.inv_inertia * rb.cross(impulse);
}

pub fn warm_start_revolute(joint: &RevoluteJoint, body_a: &mut Body, body_b: &mut Body) {
    let ra = joint.anchor_a.rotate(body_a.angle.cos(), body_a.angle.sin());
    let rb = joint.anchor_b.rotate(body_b.angle.cos(), body_b.angle.sin());
    let impulse = joint.accumulated_impulse;
    body_a.vel = body_a.vel - impulse * body_a.inv_mass;
    body_a.omega -= body_a.inv_inertia * ra.cross(impulse);
    body_b.vel = body_b.vel + impulse * body_b.inv_mass;
    body_b.omega += body_b.inv_inertia * rb.cross(impulse);
}

/// Prismatic joint: locks relative motion perpendicular to `axis_a` and the
/// two bodies' relative angle, leaves motion along the axis free.
pub fn prepare_prismatic(joint: &mut PrismaticJoint, body_a: &Body, body_b: &Body) {
    let axis = joint.axis_a.rotate(body_a.angle.cos(), body_a.angle.sin());
    let perp = axis.perp();

    let ra = joint.anchor_a.rotate(body_a.angle.cos(), body_a.angle.sin());
    let rb = joint.anchor_b.rotate(body_b.angle.cos(), body_b.angle.sin());
    let d = (body_b.pos + rb) - (body_a.pos + ra);

    let s1 = (d + ra).cross(perp);
    let s2 = rb.cross(perp);
    let k = body_a.inv_mass + body_b.inv_mass + body_a.inv_inertia * s1 * s1 + body_b.inv_inertia * s2 * s2 + joint.gamma;
    joint.effective_mass = if k.is_zero() { Fx::ZERO } else { Fx::ONE / k };

    let k_angle = body_a.inv_inertia + body_b.inv_inertia + joint.gamma;
    joint.angle_effective_mass = if k_angle.is_zero() { Fx::ZERO } else { Fx::ONE / k_angle };
}

pub fn solve_prismatic(joint: &mut PrismaticJoint, body_a: &mut Body, body_b: &mut Body, beta: Fx, inv_dt: Fx) {
    let axis = joint.axis_a.rotate(body_a.angle.cos(), body_a.angle.sin());
    let perp = axis.perp();

    let ra = joint.anchor_a.rotate(body_a.angle.cos(), body_a.angle.sin());
    let rb = joint.anchor_b.rotate(body_b.angle.cos(), body_b.angle.sin());
    let d = (body_b.pos + rb) - (body_a.pos + ra);

    let s1 = (d + ra).cross(perp);
    let s2 = rb.cross(perp);

    let rel_vel = perp.dot(body_b.vel - body_a.vel) + s2 * body_b.omega - s1 * body_a.omega;
    let c = perp.dot(d);
    let bias = beta * inv_dt * c;

    let jn = -(rel_vel + bias) * joint.effective_mass;
    joint.accumulated_impulse += jn;

    let impulse = perp * jn;
    body_a.vel = body_a.vel - impulse * body_a.inv_mass;
    body_a.omega -= body_a.inv_inertia * s1 * jn;
    body_b.vel = body_b.vel + impulse * body_b.inv_mass;
    body_b.omega += body_b.inv_inertia * s2 * jn;

    let c_angle = body_b.angle - body_a.angle - joint.reference_angle;
    let angle_bias = beta * inv_dt * c_angle;
    let jn_angle = -(body_b.omega - body_a.omega + angle_bias) * joint.angle_effective_mass;
    joint.angle_accumulated_impulse += jn_angle;

    body_a.omega -= body_a.inv_inertia * jn_angle;
    body_b.omega += body_b.inv_inertia * jn_angle;
}

/// Applies a prismatic joint's warm-started impulse from last frame, same
/// convention as [`warm_start_distance`]/[`warm_start_revolute`].
pub fn warm_start_prismatic(joint: &PrismaticJoint, body_a: &mut Body, body_b: &mut Body) {
    let axis = joint.axis_a.rotate(body_a.angle.cos(), body_a.angle.sin());
    let perp = axis.perp();
    let ra = joint.anchor_a.rotate(body_a.angle.cos(), body_a.angle.sin());
    let rb = joint.anchor_b.rotate(body_b.angle.cos(), body_b.angle.sin());
    let d = (body_b.pos + rb) - (body_a.pos + ra);
    let s1 = (d + ra).cross(perp);
    let s2 = rb.cross(perp);

    let jn = joint.accumulated_impulse;
    let impulse = perp * jn;
    body_a.vel = body_a.vel - impulse * body_a.inv_mass;
    body_a.omega -= body_a.inv_inertia * s1 * jn;
    body_b.vel = body_b.vel + impulse * body_b.inv_mass;
    body_b.omega += body_b.inv_inertia * s2 * jn;

    let jn_angle = joint.angle_accumulated_impulse;
    body_a.omega -= body_a.inv_inertia * jn_angle;
    body_b.omega += body_b.inv_inertia * jn_angle;
}

fn invert_2x2(a: Fx, b: Fx, c: Fx, d: Fx) -> [Fx; 4] {
    let det = a * d - b * c;
    if det.is_zero() {
        return [Fx::ZERO; 4];
    }
    let inv_det = Fx::ONE / det;
    [d * inv_det, -b * inv_det, -c * inv_det, a * inv_det]
}
