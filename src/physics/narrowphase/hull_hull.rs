//! Convex hull vs convex hull contact generation: Separating Axis Theorem
//! to find the least-penetrating edge, then Sutherland-Hodgman clipping of
//! the incident edge against the reference face's side planes (spec
//! §4.4.3).
//!
//! Grounded on the teacher's SAT routine for boxes (`sat_box_box`,
//! `sat_test_axis` in `physics/narrowphase.rs`), generalized from a
//! fixed 3-axis box test to an arbitrary convex polygon's edge normals.

use crate::ecs::components::shape::{ConvexHullShape, HullWorldCache};
use crate::fixed::{Fx, FxVec2};

use super::{RawContact, RawManifold};

/// Contacts shallower than this are discarded from the final manifold
/// (spec §4.4.3: "contacts with depth below 1/1024 are discarded").
const MIN_CONTACT_DEPTH: Fx = Fx::from_bits(64); // 1/1024 in Q16.16

fn max_separation(cache_a: &HullWorldCache, cache_b: &HullWorldCache) -> (usize, Fx, FxVec2) {
    let mut best_separation = Fx::MIN;
    let mut best_edge = 0usize;
    let mut best_normal = FxVec2::ZERO;
    for i in 0..cache_a.count {
        let normal = cache_a.normals[i].normalize_or_zero();
        let origin = cache_a.wverts[i];
        let mut min_projection = Fx::MAX;
        for v in &cache_b.wverts {
            let projection = normal.dot(*v - origin);
            min_projection = min_projection.min(projection);
        }
        if min_projection > best_separation {
            best_separation = min_projection;
            best_edge = i;
            best_normal = normal;
        }
    }
    (best_edge, best_separation, best_normal)
}

/// Spec §4.4.3 Step 2 tie-break cascade: larger (less negative) separation
/// wins; ties broken by lexicographic `(nx, ny)`, then smaller reference
/// edge index, then default to A. Returns `true` when B should be the
/// reference hull.
#[allow(clippy::too_many_arguments)]
fn reference_is_b(sep_a: Fx, normal_a: FxVec2, edge_a: usize, sep_b: Fx, normal_b: FxVec2, edge_b: usize) -> bool {
    if sep_a != sep_b {
        return sep_b > sep_a;
    }
    if normal_a.x != normal_b.x {
        return normal_b.x < normal_a.x;
    }
    if normal_a.y != normal_b.y {
        return normal_b.y < normal_a.y;
    }
    if edge_a != edge_b {
        return edge_b < edge_a;
    }
    false
}

/// Whether `point` lies on the inward side of every face plane of `cache`
/// (spec §4.4.3 Step 5b: reference-edge endpoints inside the other hull).
fn point_inside_hull(point: FxVec2, cache: &HullWorldCache) -> bool {
    for i in 0..cache.count {
        let normal = cache.normals[i].normalize_or_zero();
        let origin = cache.wverts[i];
        if normal.dot(point - origin) > Fx::ZERO {
            return false;
        }
    }
    true
}

/// Clips the (at most 2-point) segment `points` against the half-plane
/// `{ p : normal . p <= offset }`, returning the surviving points
/// (interpolating a new one if a 2-point segment straddles the plane).
/// A chain of these may collapse a segment to 0 or 1 points; subsequent
/// calls degrade gracefully rather than indexing out of bounds, since a
/// collapsed clip is not itself a rejection (spec §4.4.3 Step 5 still has
/// fallbacks to try).
fn clip(points: &[(FxVec2, u32)], normal: FxVec2, offset: Fx) -> Vec<(FxVec2, u32)> {
    match points.len() {
        0 => Vec::new(),
        1 => {
            let d0 = normal.dot(points[0].0) - offset;
            if d0 <= Fx::ZERO {
                vec![points[0]]
            } else {
                Vec::new()
            }
        }
        _ => {
            let mut out = Vec::with_capacity(2);
            let d0 = normal.dot(points[0].0) - offset;
            let d1 = normal.dot(points[1].0) - offset;

            if d0 <= Fx::ZERO {
                out.push(points[0]);
            }
            if d1 <= Fx::ZERO {
                out.push(points[1]);
            }
            if d0 * d1 < Fx::ZERO {
                let t = d0 / (d0 - d1);
                let pos = points[0].0 + (points[1].0 - points[0].0) * t;
                out.push((pos, points[0].1 ^ points[1].1 ^ 0x4000_0000));
            }
            out
        }
    }
}

pub fn detect(
    hull_a: &ConvexHullShape,
    cache_a: &HullWorldCache,
    hull_b: &ConvexHullShape,
    cache_b: &HullWorldCache,
) -> Option<RawManifold> {
    let skin_sum = hull_a.skin + hull_b.skin;

    let (edge_a, sep_a, normal_a) = max_separation(cache_a, cache_b);
    let (edge_b, sep_b, normal_b) = max_separation(cache_b, cache_a);

    if sep_a > skin_sum || sep_b > skin_sum {
        return None;
    }

    let flip = reference_is_b(sep_a, normal_a, edge_a, sep_b, normal_b, edge_b);

    let (ref_cache, ref_edge, inc_cache) = if flip {
        (cache_b, edge_b, cache_a)
    } else {
        (cache_a, edge_a, cache_b)
    };

    let ref_v1 = ref_cache.wverts[ref_edge];
    let ref_v2 = ref_cache.wverts[(ref_edge + 1) % ref_cache.count];
    let ref_normal = ref_cache.normals[ref_edge].normalize_or_zero();
    let tangent = (ref_v2 - ref_v1).normalize_or_zero();

    // Incident edge: the one whose normal is most anti-parallel to the
    // reference normal.
    let mut inc_edge = 0usize;
    let mut min_dot = Fx::MAX;
    for i in 0..inc_cache.count {
        let n = inc_cache.normals[i].normalize_or_zero();
        let d = n.dot(ref_normal);
        if d < min_dot {
            min_dot = d;
            inc_edge = i;
        }
    }
    let inc_v1 = inc_cache.wverts[inc_edge];
    let inc_v2 = inc_cache.wverts[(inc_edge + 1) % inc_cache.count];

    let points = [(inc_v1, inc_edge as u32 * 2), (inc_v2, inc_edge as u32 * 2 + 1)];
    let base_feature = ((ref_edge as u32) << 16) | ((inc_edge as u32) << 8);

    // Clip against the two side planes of the reference face. Unlike a
    // textbook Sutherland-Hodgman pass, a clip that collapses to <2 points
    // is not itself a rejection — spec §4.4.3 Step 5 still has fallbacks
    // (b)/(c) to try before giving up on the pair.
    let clipped = clip(&points, -tangent, -tangent.dot(ref_v1));
    let clipped = clip(&clipped, tangent, tangent.dot(ref_v2));

    // Step 5a: points surviving side clipping, within skin of the reference
    // plane.
    let mut contact_points: Vec<RawContact> = clipped
        .into_iter()
        .enumerate()
        .filter_map(|(i, (p, local_id))| {
            let separation = ref_normal.dot(p - ref_v1);
            if separation <= skin_sum {
                Some(RawContact {
                    position: p,
                    penetration: skin_sum - separation,
                    feature_id: base_feature ^ local_id ^ (i as u32),
                })
            } else {
                None
            }
        })
        .collect();

    // Step 5b: fall back to reference-edge endpoints that lie inside the
    // incident hull.
    if contact_points.is_empty() {
        for (i, p) in [ref_v1, ref_v2].into_iter().enumerate() {
            if point_inside_hull(p, inc_cache) {
                contact_points.push(RawContact {
                    position: p,
                    penetration: skin_sum,
                    feature_id: base_feature ^ 0x8000_0000 ^ (i as u32),
                });
            }
        }
    }

    // Step 5c: clamp the incident edge's midpoint onto the reference edge
    // and emit a single contact.
    if contact_points.is_empty() {
        let mid = (inc_v1 + inc_v2) * Fx::HALF;
        let edge = ref_v2 - ref_v1;
        let edge_len_sq = edge.dot(edge);
        let t = if edge_len_sq.is_zero() {
            Fx::ZERO
        } else {
            ((mid - ref_v1).dot(edge) / edge_len_sq).clamp(Fx::ZERO, Fx::ONE)
        };
        let clamped = ref_v1 + edge * t;
        let separation = ref_normal.dot(clamped - ref_v1);
        contact_points.push(RawContact {
            position: clamped,
            penetration: skin_sum - separation,
            feature_id: base_feature ^ 0xC000_0000,
        });
    }

    contact_points.retain(|c| c.penetration >= MIN_CONTACT_DEPTH);
    if contact_points.is_empty() {
        return None;
    }

    // Step 6: at most 2 contacts, ties broken lexicographically by position.
    contact_points.sort_by(|a, b| a.position.x.cmp(&b.position.x).then(a.position.y.cmp(&b.position.y)));
    contact_points.truncate(2);

    let normal = if flip { -ref_normal } else { ref_normal };
    Some(RawManifold { normal, points: contact_points })
}
