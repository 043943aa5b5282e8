//! Geometry sync (C3): transforms local shapes into the world-space caches
//! every later stage reads, and computes (swept) AABBs for broadphase.
//!
//! Grounded on the teacher's `physics/collider.rs` (`compute_aabb`,
//! `aabb_from_extents`), generalized from 3D float boxes/spheres to 2D
//! fixed-point circles/hulls, plus the hull world-cache the spec adds.

use hecs::World;

use crate::ecs::components::body::{Body, Rotation};
use crate::ecs::components::shape::{Aabb, CircleShape, ConvexHullShape, HullWorldCache};
use crate::fixed::{Fx, FxVec2};

/// Skin/margin added around every AABB so narrowphase doesn't miss
/// contacts that start just outside a tight box (spec §4.2/§4.3).
pub const AABB_MARGIN: Fx = Fx::from_bits(3277); // ~0.05 in Q16.16

/// Rotation to use for a body this frame: the explicit `Rotation` component
/// takes precedence over deriving `(cos, sin)` from `Body::angle` (spec
/// §4.2).
#[inline]
pub fn resolve_rotation(body: &Body, rotation: Option<&Rotation>) -> (Fx, Fx) {
    match rotation {
        Some(r) => (r.cos, r.sin),
        None => body.cos_sin(),
    }
}

/// Writes `cache` with `hull`'s vertices/edge-normals transformed into world
/// space at `body`'s current pose, bumping `epoch` so readers can tell the
/// cache is fresh this frame.
pub fn sync_hull_world_cache(
    body: &Body,
    rotation: Option<&Rotation>,
    hull: &ConvexHullShape,
    cache: &mut HullWorldCache,
    epoch: u64,
) {
    let (cos, sin) = resolve_rotation(body, rotation);
    let n = hull.count();

    cache.wverts.clear();
    cache.wverts.reserve(n);
    for v in &hull.verts {
        cache.wverts.push(body.pos + v.rotate(cos, sin));
    }

    cache.normals.clear();
    cache.normals.reserve(n);
    for i in 0..n {
        let a = cache.wverts[i];
        let b = cache.wverts[(i + 1) % n];
        let edge = b - a;
        // Outward normal for a CCW polygon is the edge rotated -90°.
        cache.normals.push(FxVec2::new(edge.y, -edge.x));
    }

    cache.count = n;
    cache.epoch = epoch;
}

/// AABB of a circle at `body`'s current position, inflated by skin + margin.
pub fn circle_aabb(body: &Body, shape: &CircleShape, epoch: u64) -> Aabb {
    let r = shape.radius + shape.skin + AABB_MARGIN;
    Aabb {
        minx: body.pos.x - r,
        maxx: body.pos.x + r,
        miny: body.pos.y - r,
        maxy: body.pos.y + r,
        epoch,
    }
}

/// AABB of a hull from its already-synced world-space cache, inflated by
/// skin + margin.
pub fn hull_aabb(cache: &HullWorldCache, skin: Fx, epoch: u64) -> Aabb {
    let mut minx = Fx::MAX;
    let mut maxx = Fx::MIN;
    let mut miny = Fx::MAX;
    let mut maxy = Fx::MIN;
    for v in &cache.wverts {
        minx = minx.min(v.x);
        maxx = maxx.max(v.x);
        miny = miny.min(v.y);
        maxy = maxy.max(v.y);
    }
    let pad = skin + AABB_MARGIN;
    Aabb { minx: minx - pad, maxx: maxx + pad, miny: miny - pad, maxy: maxy + pad, epoch }
}

/// Expands a body's resting AABB to also cover where it will be at the end
/// of the step, so CCD (C6) and broadphase never miss a fast-moving body
/// that would otherwise tunnel between two discrete positions (spec §4.2).
pub fn sweep_aabb(resting: Aabb, vel: FxVec2, dt: Fx) -> Aabb {
    let displacement = vel * dt;
    let swept = Aabb {
        minx: resting.minx + displacement.x.min(Fx::ZERO),
        maxx: resting.maxx + displacement.x.max(Fx::ZERO),
        miny: resting.miny + displacement.y.min(Fx::ZERO),
        maxy: resting.maxy + displacement.y.max(Fx::ZERO),
        epoch: resting.epoch,
    };
    resting.union(swept)
}

/// Runs geometry sync over every body in the world: updates hull world
/// caches in place and (re)computes each collider's swept AABB.
///
/// Iterates via `hecs::World::query`, which has no ordering guarantee —
/// callers that need deterministic order (broadphase) must sort what they
/// read out of here, not rely on iteration order here.
pub fn sync_all(world: &mut World, dt: Fx, epoch: u64) {
    for (_, (body, rotation, hull, cache)) in world
        .query::<(&Body, Option<&Rotation>, &ConvexHullShape, &mut HullWorldCache)>()
        .iter()
    {
        sync_hull_world_cache(body, rotation, hull, cache, epoch);
    }

    for (_, (body, hull, cache, aabb)) in world
        .query::<(&Body, &ConvexHullShape, &HullWorldCache, &mut Aabb)>()
        .iter()
    {
        let resting = hull_aabb(cache, hull.skin, epoch);
        *aabb = sweep_aabb(resting, body.vel, dt);
    }

    for (_, (body, shape, aabb)) in world.query::<(&Body, &CircleShape, &mut Aabb)>().iter() {
        let resting = circle_aabb(body, shape, epoch);
        *aabb = sweep_aabb(resting, body.vel, dt);
    }
}
