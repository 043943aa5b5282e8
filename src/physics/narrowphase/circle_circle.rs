//! Closed-form circle vs circle contact generation (spec §4.4.1).
//!
//! Grounded on the teacher's specialized `sphere_sphere` fast path in
//! `physics/narrowphase.rs`, reduced from 3D to 2D.

use crate::ecs::components::body::Body;
use crate::ecs::components::shape::CircleShape;
use crate::fixed::{Fx, FxVec2};

use super::{RawContact, RawManifold};

/// A circle-circle manifold always has exactly one contact point, so
/// `feature_id` is a constant: there's nothing to disambiguate warm-start
/// against.
const FEATURE_ID: u32 = 0;

pub fn detect(body_a: &Body, a: &CircleShape, body_b: &Body, b: &CircleShape) -> Option<RawManifold> {
    let delta = body_b.pos - body_a.pos;
    let dist_sq = delta.length_squared();
    let radius_sum = a.radius + a.skin + b.radius + b.skin;

    if dist_sq > radius_sum * radius_sum {
        return None;
    }

    let dist = dist_sq.sqrt();
    let (normal, dist) = if dist.is_zero() {
        // Exactly coincident centers: pick a canonical axis so the result is
        // deterministic rather than direction-of-discovery dependent.
        (FxVec2::new(Fx::ONE, Fx::ZERO), Fx::ZERO)
    } else {
        (FxVec2::new(delta.x / dist, delta.y / dist), dist)
    };

    let penetration = radius_sum - dist;
    let point = body_a.pos + normal * (a.radius + a.skin - penetration.max(Fx::ZERO) / Fx::from_int(2));

    Some(RawManifold {
        normal,
        points: vec![RawContact { position: point, penetration, feature_id: FEATURE_ID }],
    })
}
