//! Convex hull vs circle contact generation via Voronoi-region
//! classification (spec §4.4.2).
//!
//! Grounded on the classic polygon/circle collision routine (closest-edge
//! separation, then face/vertex region test), restated in the teacher's
//! narrowphase style and over `Fx` instead of floats.

use crate::ecs::components::body::Body;
use crate::ecs::components::shape::{CircleShape, ConvexHullShape, HullWorldCache};
use crate::fixed::{Fx, FxVec2};

use super::{RawContact, RawManifold};

/// Face-region feature ids are even (`2*edge`), vertex-region feature ids
/// are odd (`2*vertex + 1`); this keeps the two classes from colliding
/// while remaining stable across frames as long as hull topology doesn't
/// change.
fn face_feature(edge: usize) -> u32 {
    (edge as u32) * 2
}
fn vertex_feature(vertex: usize) -> u32 {
    (vertex as u32) * 2 + 1
}

pub fn detect(
    hull_body: &Body,
    hull: &ConvexHullShape,
    cache: &HullWorldCache,
    circle_body: &Body,
    circle: &CircleShape,
) -> Option<RawManifold> {
    let _ = hull_body;
    let n = cache.count;
    let center = circle_body.pos;
    let radius_sum = circle.radius + circle.skin + hull.skin;

    // Find the edge whose outward normal gives the greatest (signed)
    // separation of the circle center — that's the closest feature.
    let mut best_separation = Fx::MIN;
    let mut best_edge = 0usize;
    for i in 0..n {
        let normal = cache.normals[i].normalize_or_zero();
        let separation = normal.dot(center - cache.wverts[i]);
        if separation > best_separation {
            best_separation = separation;
            best_edge = i;
        }
    }

    if best_separation > radius_sum {
        return None;
    }

    let v1 = cache.wverts[best_edge];
    let v2 = cache.wverts[(best_edge + 1) % n];

    if best_separation <= Fx::ZERO {
        // Center lies inside the hull: always a face contact against the
        // least-penetrating edge.
        return Some(face_contact(cache, best_edge, center, radius_sum, best_separation));
    }

    let u1 = (center - v1).dot(v2 - v1);
    let u2 = (center - v2).dot(v1 - v2);

    if u1 <= Fx::ZERO {
        vertex_contact(best_edge, v1, center, radius_sum)
    } else if u2 <= Fx::ZERO {
        vertex_contact((best_edge + 1) % n, v2, center, radius_sum)
    } else {
        Some(face_contact(cache, best_edge, center, radius_sum, best_separation))
    }
}

fn face_contact(cache: &HullWorldCache, edge: usize, center: FxVec2, radius_sum: Fx, separation: Fx) -> RawManifold {
    let normal = cache.normals[edge].normalize_or_zero();
    let penetration = radius_sum - separation;
    let point = center - normal * (radius_sum - penetration / Fx::from_int(2));
    RawManifold {
        normal,
        points: vec![RawContact { position: point, penetration, feature_id: face_feature(edge) }],
    }
}

fn vertex_contact(vertex_index: usize, vertex: FxVec2, center: FxVec2, radius_sum: Fx) -> Option<RawManifold> {
    let delta = center - vertex;
    let dist_sq = delta.length_squared();
    if dist_sq > radius_sum * radius_sum {
        return None;
    }
    let dist = dist_sq.sqrt();
    let normal = if dist.is_zero() {
        FxVec2::new(Fx::ONE, Fx::ZERO)
    } else {
        FxVec2::new(delta.x / dist, delta.y / dist)
    };
    let penetration = radius_sum - dist;
    Some(RawManifold {
        normal,
        points: vec![RawContact {
            position: vertex,
            penetration,
            feature_id: vertex_feature(vertex_index),
        }],
    })
}
