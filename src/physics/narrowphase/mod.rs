//! Narrowphase collision detection (C5): produces a contact manifold for
//! every broadphase candidate pair that is actually touching.
//!
//! Grounded on the teacher's `physics/narrowphase.rs` dispatch structure
//! (`detect_collision` picking a specialized routine per shape pair, falling
//! back to a generic algorithm only when neither side is a circle), but
//! rebuilt for 2D circles/convex hulls: SAT + clipping instead of GJK/EPA,
//! since the spec's shape set (circle, convex hull) doesn't need a general
//! Minkowski-difference solver.

pub mod circle_circle;
pub mod hull_circle;
pub mod hull_hull;

use crate::ecs::components::body::Body;
use crate::ecs::components::shape::{CircleShape, ConvexHullShape, HullWorldCache};
use crate::ecs::resources::{ContactManifold, ContactPoint, Contacts2D, PairKey};
use crate::fixed::FxVec2;

/// One candidate contact point before warm-start impulses are attached.
pub struct RawContact {
    pub position: FxVec2,
    pub penetration: crate::fixed::Fx,
    pub feature_id: u32,
}

/// A detected manifold: world-space normal pointing from body A to body B,
/// plus up to two contact points (spec §4.4: manifolds never exceed 2
/// points for this shape set).
pub struct RawManifold {
    pub normal: FxVec2,
    pub points: Vec<RawContact>,
}

pub enum Shapes<'a> {
    Circle(&'a CircleShape),
    Hull(&'a ConvexHullShape, &'a HullWorldCache),
}

/// Dispatches to the specialized routine for the pair of shape kinds,
/// matching the spec's §4.4.1/4.4.2/4.4.3 split.
pub fn detect(body_a: &Body, shape_a: &Shapes, body_b: &Body, shape_b: &Shapes) -> Option<RawManifold> {
    match (shape_a, shape_b) {
        (Shapes::Circle(a), Shapes::Circle(b)) => circle_circle::detect(body_a, a, body_b, b),
        (Shapes::Circle(a), Shapes::Hull(hull, cache)) => {
            hull_circle::detect(body_b, hull, cache, body_a, a).map(flip)
        }
        (Shapes::Hull(hull, cache), Shapes::Circle(b)) => hull_circle::detect(body_a, hull, cache, body_b, b),
        (Shapes::Hull(hull_a, cache_a), Shapes::Hull(hull_b, cache_b)) => {
            hull_hull::detect(hull_a, cache_a, hull_b, cache_b)
        }
    }
}

fn flip(manifold: RawManifold) -> RawManifold {
    RawManifold { normal: -manifold.normal, points: manifold.points }
}

/// Converts a detected raw manifold into the resource-owned `ContactManifold`,
/// looking up each point's warm-start impulse from the previous frame's
/// cache by `(pair, feature_id)` (spec §4.7).
pub fn commit_manifold(
    contacts: &mut Contacts2D,
    pair: PairKey,
    entity_a: hecs::Entity,
    entity_b: hecs::Entity,
    raw: RawManifold,
) {
    if raw.points.is_empty() {
        return;
    }
    let points = raw
        .points
        .into_iter()
        .map(|p| ContactPoint {
            position: p.position,
            penetration: p.penetration,
            feature_id: p.feature_id,
            warm_start: contacts.lookup_warm_start(pair, p.feature_id),
        })
        .collect();
    contacts.manifolds.push(ContactManifold { pair, entity_a, entity_b, normal: raw.normal, points });
}
