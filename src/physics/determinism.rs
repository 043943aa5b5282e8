//! Frame hash (C10): a 64-bit checksum folding every piece of state that
//! must agree bit-for-bit between two runs sharing the same initial state
//! and command stream (spec §4.11).
//!
//! There's no replay/checksum facility in the teacher repo to generalize
//! from — the FNV-1a-style fold here is exactly the formula spec.md's §4.11
//! states (`h = h * prime XOR word`, 32-bit words), not an invented scheme.
//! `PairKey`'s canonical (lo, hi) ordering (spec §4.3) is what makes pair
//! identity itself reproducible across runs; this module just folds in
//! whatever that ordering and `hecs`'s entity ids already make
//! deterministic once read out in sorted form.

use hecs::World;

use crate::ecs::components::body::{Body, Guid};
use crate::ecs::components::joint::{DistanceJoint, PrismaticJoint, RevoluteJoint};
use crate::ecs::resources::Contacts2D;
use crate::fixed::Fx;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 1_099_511_628_211;

#[inline]
fn fold_word(h: u64, word: u32) -> u64 {
    h.wrapping_mul(FNV_PRIME) ^ (word as u64)
}

#[inline]
fn fold_u64(h: u64, word: u64) -> u64 {
    let h = fold_word(h, word as u32);
    fold_word(h, (word >> 32) as u32)
}

#[inline]
fn fold_fx(h: u64, value: Fx) -> u64 {
    fold_word(h, value.to_bits() as u32)
}

#[inline]
fn fold_guid(h: u64, guid: Guid) -> u64 {
    fold_u64(fold_u64(h, guid.hi), guid.lo)
}

/// Computes this frame's hash: every dynamic body's `(px, py, angle, vx, vy,
/// omega)` in entity-id order, then the live warm-start cache's size and
/// sorted entries, then every joint row's accumulated impulse in entity-id
/// order (spec §4.11).
pub fn frame_hash(world: &World, contacts: &Contacts2D) -> u64 {
    let mut h = FNV_OFFSET_BASIS;
    h = fold_bodies(h, world);
    h = fold_contact_cache(h, contacts);
    h = fold_joints(h, world);
    h
}

fn fold_bodies(mut h: u64, world: &World) -> u64 {
    let mut bodies: Vec<(hecs::Entity, Body)> = world
        .query::<&Body>()
        .iter()
        .filter(|(_, b)| !b.is_static())
        .map(|(e, b)| (e, *b))
        .collect();
    bodies.sort_by_key(|(e, _)| e.to_bits().get());

    for (entity, body) in bodies {
        h = fold_u64(h, entity.to_bits().get());
        h = fold_fx(h, body.pos.x);
        h = fold_fx(h, body.pos.y);
        h = fold_fx(h, body.angle);
        h = fold_fx(h, body.vel.x);
        h = fold_fx(h, body.vel.y);
        h = fold_fx(h, body.omega);
    }
    h
}

fn fold_contact_cache(mut h: u64, contacts: &Contacts2D) -> u64 {
    let mut entries: Vec<_> = contacts.warm_start_cache.iter().collect();
    entries.sort_by_key(|(key, _)| **key);

    h = fold_word(h, entries.len() as u32);
    for ((pair, feature_id), warm_start) in entries {
        h = fold_guid(h, pair.lo);
        h = fold_guid(h, pair.hi);
        h = fold_word(h, *feature_id);
        h = fold_fx(h, warm_start.normal_impulse);
        h = fold_fx(h, warm_start.tangent_impulse);
    }
    h
}

fn fold_joints(mut h: u64, world: &World) -> u64 {
    let mut distance: Vec<(hecs::Entity, Fx)> = world.query::<&DistanceJoint>().iter().map(|(e, j)| (e, j.accumulated_impulse)).collect();
    distance.sort_by_key(|(e, _)| e.to_bits().get());
    for (entity, impulse) in distance {
        h = fold_u64(h, entity.to_bits().get());
        h = fold_fx(h, impulse);
    }

    let mut revolute: Vec<(hecs::Entity, crate::fixed::FxVec2)> =
        world.query::<&RevoluteJoint>().iter().map(|(e, j)| (e, j.accumulated_impulse)).collect();
    revolute.sort_by_key(|(e, _)| e.to_bits().get());
    for (entity, impulse) in revolute {
        h = fold_u64(h, entity.to_bits().get());
        h = fold_fx(h, impulse.x);
        h = fold_fx(h, impulse.y);
    }

    let mut prismatic: Vec<(hecs::Entity, Fx, Fx)> = world
        .query::<&PrismaticJoint>()
        .iter()
        .map(|(e, j)| (e, j.accumulated_impulse, j.angle_accumulated_impulse))
        .collect();
    prismatic.sort_by_key(|(e, _, _)| e.to_bits().get());
    for (entity, impulse, angle_impulse) in prismatic {
        h = fold_u64(h, entity.to_bits().get());
        h = fold_fx(h, impulse);
        h = fold_fx(h, angle_impulse);
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::FxVec2;

    #[test]
    fn identical_states_hash_identically() {
        let mut world_a = World::new();
        world_a.spawn((Body::new_dynamic(FxVec2::new(Fx::ONE, Fx::from_int(2)), Fx::ONE, Fx::ONE),));
        let mut world_b = World::new();
        world_b.spawn((Body::new_dynamic(FxVec2::new(Fx::ONE, Fx::from_int(2)), Fx::ONE, Fx::ONE),));

        let contacts = Contacts2D::default();
        assert_eq!(frame_hash(&world_a, &contacts), frame_hash(&world_b, &contacts));
    }

    #[test]
    fn differing_velocity_changes_the_hash() {
        let mut world = World::new();
        world.spawn((Body::new_dynamic(FxVec2::ZERO, Fx::ONE, Fx::ONE),));
        let contacts = Contacts2D::default();
        let h1 = frame_hash(&world, &contacts);

        let mut world2 = World::new();
        let mut b = Body::new_dynamic(FxVec2::ZERO, Fx::ONE, Fx::ONE);
        b.vel = FxVec2::new(Fx::ONE, Fx::ZERO);
        world2.spawn((b,));
        let h2 = frame_hash(&world2, &contacts);

        assert_ne!(h1, h2);
    }

    #[test]
    fn static_bodies_do_not_affect_the_hash() {
        let mut world = World::new();
        world.spawn((Body::new_dynamic(FxVec2::ZERO, Fx::ONE, Fx::ONE),));
        let contacts = Contacts2D::default();
        let h1 = frame_hash(&world, &contacts);

        world.spawn((Body::new_static(FxVec2::new(Fx::from_int(99), Fx::from_int(99))),));
        let h2 = frame_hash(&world, &contacts);

        assert_eq!(h1, h2);
    }
}
