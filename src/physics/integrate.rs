//! Integration (C12): the final per-step write to body position and angle.
//!
//! Grounded on the teacher's `rigid_body::integrate_positions` (a single
//! pass applying `pos += vel * dt` to every non-static body), generalized to
//! also carry angle forward since these bodies can rotate and the teacher's
//! 3D bodies use a quaternion updated elsewhere, not this pass.

use hecs::World;

use crate::ecs::components::body::Body;
use crate::fixed::Fx;

/// `pos += v * dt; angle += omega * dt` (spec §4.9). Static bodies are
/// skipped; every dynamic body's update only reads its own fields, so the
/// result doesn't depend on iteration order even though `hecs::World::query`
/// makes no ordering guarantee.
pub fn integrate(world: &mut World, dt: Fx) {
    for (_, body) in world.query::<&mut Body>().iter() {
        if body.is_static() {
            continue;
        }
        body.pos = body.pos + body.vel * dt;
        body.angle = body.angle + body.omega * dt;
    }
}
