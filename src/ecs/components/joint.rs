//! Joint constraint components (spec §3/§4.6): distance, revolute, prismatic.
//!
//! Joints carry local anchors (fixed in each body's local frame) plus the
//! per-constraint-row solver scratch (effective mass, accumulated impulse)
//! that warm-start reads and writes across frames. Building one validates
//! `gamma`/`beta` at construction time; nothing past that point returns a
//! `Result`.

use crate::error::JointError;
use crate::fixed::{Fx, FxVec2};

/// Sentinel meaning "derive rest length from the anchors' initial distance"
/// (spec §3: distance joints may auto-init their rest length).
pub const AUTO_REST_LENGTH: Fx = Fx::from_bits(-1);

fn validate_softening(gamma: Fx, beta: Fx) -> Result<(), JointError> {
    if gamma < Fx::ZERO {
        return Err(JointError::NegativeGamma(gamma));
    }
    if beta < Fx::ZERO || beta > Fx::ONE {
        return Err(JointError::BetaOutOfRange(beta));
    }
    Ok(())
}

/// Two bodies held at a fixed (or auto-derived) distance apart. Lives on its
/// own entity, referencing the two connected bodies by `hecs::Entity` (a
/// joint is not itself a body and does not carry a `Guid`; pair-key
/// derivation for joints uses the two bodies' `Guid`s instead, see
/// `physics::determinism`).
#[derive(Debug, Clone, Copy)]
pub struct DistanceJoint {
    pub body_a: hecs::Entity,
    pub body_b: hecs::Entity,
    pub anchor_a: FxVec2,
    pub anchor_b: FxVec2,
    /// `AUTO_REST_LENGTH` until first solve, when it is pinned to the
    /// anchors' initial world-space distance (spec §9 open question).
    pub rest_length: Fx,
    pub gamma: Fx,
    pub beta: Fx,

    /// Effective mass of the single scalar constraint row, recomputed each
    /// step by the solver's constraint-prep pass.
    pub effective_mass: Fx,
    /// Accumulated normal impulse, warm-started from the previous frame.
    pub accumulated_impulse: Fx,
    /// Impulse magnitude beyond which the joint snaps. `Fx::ZERO` (the
    /// default from [`DistanceJoint::new`]) means "never breaks" (spec §3).
    pub break_impulse: Fx,
    /// Once set, the joint is skipped by constraint build (spec §4.12) but
    /// stays in storage rather than being erased.
    pub broken: bool,
}

impl DistanceJoint {
    pub fn new(
        body_a: hecs::Entity,
        body_b: hecs::Entity,
        anchor_a: FxVec2,
        anchor_b: FxVec2,
        rest_length: Fx,
        gamma: Fx,
        beta: Fx,
    ) -> Result<DistanceJoint, JointError> {
        validate_softening(gamma, beta)?;
        Ok(DistanceJoint {
            body_a,
            body_b,
            anchor_a,
            anchor_b,
            rest_length,
            gamma,
            beta,
            effective_mass: Fx::ZERO,
            accumulated_impulse: Fx::ZERO,
            break_impulse: Fx::ZERO,
            broken: false,
        })
    }

    /// Sets the impulse threshold beyond which [`crate::physics::joints`]
    /// marks this joint broken instead of continuing to solve it.
    pub fn with_break_impulse(mut self, break_impulse: Fx) -> DistanceJoint {
        self.break_impulse = break_impulse;
        self
    }

    #[inline]
    pub fn needs_auto_rest_length(&self) -> bool {
        self.rest_length == AUTO_REST_LENGTH
    }

    /// A break impulse of zero means "never breaks" (spec §3).
    #[inline]
    pub fn can_break(&self) -> bool {
        self.break_impulse > Fx::ZERO
    }
}

/// Pins two bodies together at a shared point, free to rotate about it.
#[derive(Debug, Clone, Copy)]
pub struct RevoluteJoint {
    pub body_a: hecs::Entity,
    pub body_b: hecs::Entity,
    pub anchor_a: FxVec2,
    pub anchor_b: FxVec2,
    pub gamma: Fx,
    pub beta: Fx,

    /// 2x2 effective mass matrix for the point constraint, row-major.
    pub effective_mass: [Fx; 4],
    pub accumulated_impulse: FxVec2,
}

impl RevoluteJoint {
    pub fn new(
        body_a: hecs::Entity,
        body_b: hecs::Entity,
        anchor_a: FxVec2,
        anchor_b: FxVec2,
        gamma: Fx,
        beta: Fx,
    ) -> Result<RevoluteJoint, JointError> {
        validate_softening(gamma, beta)?;
        Ok(RevoluteJoint {
            body_a,
            body_b,
            anchor_a,
            anchor_b,
            gamma,
            beta,
            effective_mass: [Fx::ZERO; 4],
            accumulated_impulse: FxVec2::ZERO,
        })
    }
}

/// Restricts relative motion to a single axis (fixed in body A's local
/// frame), plus a rotational row holding the two bodies' relative angle
/// fixed at its value when the joint was built (spec §4.6: "single scalar
/// along the perpendicular to the axis plus a rotational row").
#[derive(Debug, Clone, Copy)]
pub struct PrismaticJoint {
    pub body_a: hecs::Entity,
    pub body_b: hecs::Entity,
    pub anchor_a: FxVec2,
    pub anchor_b: FxVec2,
    /// Slide axis, in body A's local frame, unit length.
    pub axis_a: FxVec2,
    /// `body_b.angle - body_a.angle` at construction; the angle row holds
    /// this difference fixed.
    pub reference_angle: Fx,
    pub gamma: Fx,
    pub beta: Fx,

    /// Effective mass of the perpendicular (locked) constraint row.
    pub effective_mass: Fx,
    pub accumulated_impulse: Fx,
    /// Effective mass of the angle-equality row.
    pub angle_effective_mass: Fx,
    pub angle_accumulated_impulse: Fx,
}

impl PrismaticJoint {
    pub fn new(
        body_a: hecs::Entity,
        body_b: hecs::Entity,
        anchor_a: FxVec2,
        anchor_b: FxVec2,
        axis_a: FxVec2,
        reference_angle: Fx,
        gamma: Fx,
        beta: Fx,
    ) -> Result<PrismaticJoint, JointError> {
        validate_softening(gamma, beta)?;
        Ok(PrismaticJoint {
            body_a,
            body_b,
            anchor_a,
            anchor_b,
            axis_a: axis_a.normalize_or_zero(),
            reference_angle,
            gamma,
            beta,
            effective_mass: Fx::ZERO,
            accumulated_impulse: Fx::ZERO,
            angle_effective_mass: Fx::ZERO,
            angle_accumulated_impulse: Fx::ZERO,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_entities() -> (hecs::Entity, hecs::Entity) {
        let mut world = hecs::World::new();
        (world.spawn(()), world.spawn(()))
    }

    #[test]
    fn distance_joint_rejects_negative_gamma() {
        let (a, b) = dummy_entities();
        assert!(DistanceJoint::new(a, b, FxVec2::ZERO, FxVec2::ZERO, Fx::ONE, -Fx::ONE, Fx::ZERO).is_err());
    }

    #[test]
    fn distance_joint_rejects_beta_out_of_range() {
        let (a, b) = dummy_entities();
        assert!(DistanceJoint::new(a, b, FxVec2::ZERO, FxVec2::ZERO, Fx::ONE, Fx::ZERO, Fx::from_int(2)).is_err());
    }

    #[test]
    fn distance_joint_auto_rest_length_sentinel_round_trips() {
        let (a, b) = dummy_entities();
        let j = DistanceJoint::new(a, b, FxVec2::ZERO, FxVec2::ZERO, AUTO_REST_LENGTH, Fx::ZERO, Fx::from_f64(0.2)).unwrap();
        assert!(j.needs_auto_rest_length());
    }

    #[test]
    fn revolute_joint_accepts_valid_softening() {
        let (a, b) = dummy_entities();
        assert!(RevoluteJoint::new(a, b, FxVec2::ZERO, FxVec2::ZERO, Fx::ZERO, Fx::from_f64(0.2)).is_ok());
    }

    #[test]
    fn prismatic_joint_normalizes_axis() {
        let (a, b) = dummy_entities();
        let j = PrismaticJoint::new(
            a,
            b,
            FxVec2::ZERO,
            FxVec2::ZERO,
            FxVec2::new(Fx::from_int(3), Fx::from_int(4)),
            Fx::ZERO,
            Fx::ZERO,
            Fx::from_f64(0.2),
        )
        .unwrap();
        assert_eq!(j.axis_a.length(), Fx::ONE);
    }
}
