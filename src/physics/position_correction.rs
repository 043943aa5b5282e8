//! Position correction (C9): a light pseudo-velocity pass that bleeds off
//! contact penetration directly, plus draining the CCD time-of-impact queue.
//!
//! The teacher's solver folds its positional (Baumgarte) bias straight into
//! the velocity update, with no separate position-only pass; the spec splits
//! that in two so the velocity solver (C8) only ever touches velocities.
//! This stage is the position half: same mass-weighted push-apart idiom as
//! `solver::apply_impulse`, but moving `pos` instead of `vel` and with no
//! velocity change at all.

use hecs::World;

use crate::ecs::components::body::Body;
use crate::ecs::resources::{Contacts2D, ToiQueue};
use crate::fixed::Fx;
use crate::physics::ccd::STOP_EPSILON;

const CORRECTION_ITERATIONS: u32 = 3;
const BAUMGARTE_BETA: Fx = Fx::from_bits(13107); // 0.2 in Q16.16
/// Per-contact maximum linear correction, also the slop below which
/// penetration is left alone rather than corrected (spec §4.8).
const LINEAR_SLOP: Fx = Fx::from_bits(327); // ~0.005 in Q16.16

/// Runs `CORRECTION_ITERATIONS` Gauss-Seidel passes over every manifold,
/// nudging the two bodies apart along the contact normal in proportion to
/// their inverse mass. Manifolds are processed in their existing order
/// (already pair-key sorted upstream), so the result is reproducible.
pub fn correct_positions(world: &mut World, contacts: &Contacts2D) {
    for _ in 0..CORRECTION_ITERATIONS {
        for manifold in &contacts.manifolds {
            let Ok([mut body_a, mut body_b]) = world.query_many_mut::<&mut Body, 2>([manifold.entity_a, manifold.entity_b]) else {
                continue;
            };
            let total_inv_mass = body_a.inv_mass + body_b.inv_mass;
            if total_inv_mass.is_zero() {
                continue;
            }

            for point in &manifold.points {
                let excess = point.penetration - LINEAR_SLOP;
                if excess <= Fx::ZERO {
                    continue;
                }
                let correction = (BAUMGARTE_BETA * excess).min(LINEAR_SLOP);
                let push = manifold.normal * (correction / total_inv_mass);
                body_a.pos = body_a.pos - push * body_a.inv_mass;
                body_b.pos = body_b.pos + push * body_b.inv_mass;
            }
        }
    }
}

/// Drains the CCD queue in `(toi, pairKey)` order (spec §4.8), advancing
/// each fast mover to `p0 + d * (t - epsilon)` so it rests just short of
/// what it hit rather than exactly on the boundary. `entity_a` in a
/// `ToiEvent` is always the swept circle (spec §4.5/§4.6's CCD pairing), so
/// only it moves here.
pub fn drain_toi_queue(world: &mut World, queue: &mut ToiQueue) {
    queue.sort();
    for event in queue.events.drain(..) {
        let Ok(mut body) = world.get::<&mut Body>(event.entity_a) else {
            continue;
        };
        let advance = (event.toi - STOP_EPSILON).max(Fx::ZERO);
        body.pos = body.pos + event.displacement * advance;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::body::Guid;
    use crate::ecs::resources::{ContactManifold, ContactPoint, PairKey, ToiEvent};
    use crate::fixed::FxVec2;

    #[test]
    fn penetrating_pair_is_pulled_apart_over_several_iterations() {
        let mut world = World::new();
        let entity_a = world.spawn((Body::new_static(FxVec2::ZERO), Guid::new(0, 1)));
        let entity_b = world.spawn((Body::new_dynamic(FxVec2::new(Fx::ZERO, Fx::from_f64(0.4)), Fx::ONE, Fx::ONE), Guid::new(0, 2)));

        let mut contacts = Contacts2D::default();
        contacts.manifolds.push(ContactManifold {
            pair: PairKey::new(Guid::new(0, 1), Guid::new(0, 2)),
            entity_a,
            entity_b,
            normal: FxVec2::new(Fx::ZERO, Fx::ONE),
            points: vec![ContactPoint {
                position: FxVec2::ZERO,
                penetration: Fx::from_f64(0.1),
                feature_id: 0,
                warm_start: Default::default(),
            }],
        });

        correct_positions(&mut world, &contacts);

        let body_b = world.get::<&Body>(entity_b).unwrap();
        assert!(body_b.pos.y > Fx::from_f64(0.4));
    }

    #[test]
    fn shallow_penetration_below_slop_is_left_alone() {
        let mut world = World::new();
        let entity_a = world.spawn((Body::new_static(FxVec2::ZERO), Guid::new(0, 1)));
        let entity_b = world.spawn((Body::new_dynamic(FxVec2::new(Fx::ZERO, Fx::from_f64(0.4)), Fx::ONE, Fx::ONE), Guid::new(0, 2)));

        let mut contacts = Contacts2D::default();
        contacts.manifolds.push(ContactManifold {
            pair: PairKey::new(Guid::new(0, 1), Guid::new(0, 2)),
            entity_a,
            entity_b,
            normal: FxVec2::new(Fx::ZERO, Fx::ONE),
            points: vec![ContactPoint {
                position: FxVec2::ZERO,
                penetration: Fx::from_f64(0.001),
                feature_id: 0,
                warm_start: Default::default(),
            }],
        });

        correct_positions(&mut world, &contacts);

        let body_b = world.get::<&Body>(entity_b).unwrap();
        assert_eq!(body_b.pos.y, Fx::from_f64(0.4));
    }

    #[test]
    fn toi_queue_drains_in_toi_order_and_advances_position() {
        let mut world = World::new();
        let mut bullet = Body::new_dynamic(FxVec2::ZERO, Fx::ONE, Fx::ONE);
        bullet.vel = FxVec2::new(Fx::from_int(10), Fx::ZERO);
        let entity = world.spawn((bullet, Guid::new(0, 1)));
        let other = world.spawn((Body::new_static(FxVec2::ZERO), Guid::new(0, 2)));

        let mut queue = ToiQueue::default();
        queue.events.push(ToiEvent {
            pair: PairKey::new(Guid::new(0, 1), Guid::new(0, 2)),
            entity_a: entity,
            entity_b: other,
            toi: Fx::from_f64(0.5),
            displacement: FxVec2::new(Fx::ONE, Fx::ZERO),
        });

        drain_toi_queue(&mut world, &mut queue);

        assert!(queue.events.is_empty());
        let body = world.get::<&Body>(entity).unwrap();
        assert!(body.pos.x > Fx::ZERO && body.pos.x < Fx::from_f64(0.5));
    }
}
