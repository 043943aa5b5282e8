//! Rigid body and stable-identity components.

use crate::fixed::{Fx, FxVec2};

/// 128-bit stable identity, distinct from the `hecs::Entity` used to address
/// ECS storage. Pair-key derivation (spec §3/§4.4) sorts on this, never on
/// the `hecs::Entity` index, so replaying the same initial state with
/// entities spawned in a different order still produces the same canonical
/// ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Guid {
    pub hi: u64,
    pub lo: u64,
}

impl Guid {
    pub const fn new(hi: u64, lo: u64) -> Guid {
        Guid { hi, lo }
    }
}

/// A rigid body. Static iff `inv_mass == 0 && inv_inertia == 0` (spec §3).
#[derive(Debug, Clone, Copy)]
pub struct Body {
    pub pos: FxVec2,
    pub angle: Fx,
    pub vel: FxVec2,
    pub omega: Fx,
    pub inv_mass: Fx,
    pub inv_inertia: Fx,
}

impl Body {
    pub fn new_dynamic(pos: FxVec2, mass: Fx, inertia: Fx) -> Body {
        Body {
            pos,
            angle: Fx::ZERO,
            vel: FxVec2::ZERO,
            omega: Fx::ZERO,
            inv_mass: if mass.is_zero() { Fx::ZERO } else { Fx::ONE / mass },
            inv_inertia: if inertia.is_zero() { Fx::ZERO } else { Fx::ONE / inertia },
        }
    }

    pub fn new_static(pos: FxVec2) -> Body {
        Body {
            pos,
            angle: Fx::ZERO,
            vel: FxVec2::ZERO,
            omega: Fx::ZERO,
            inv_mass: Fx::ZERO,
            inv_inertia: Fx::ZERO,
        }
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.inv_mass.is_zero() && self.inv_inertia.is_zero()
    }

    /// Rotation as `(cos, sin)` derived from `angle`; stages that carry an
    /// explicit `Rotation` component prefer that instead (spec §4.2).
    #[inline]
    pub fn cos_sin(&self) -> (Fx, Fx) {
        (self.angle.cos(), self.angle.sin())
    }
}

/// Explicit precomputed rotation, overriding `Body::angle` for geometry sync
/// when present (spec §4.2: "compute `(cos, sin)` from `Rotation` if present
/// else from `angle`").
#[derive(Debug, Clone, Copy)]
pub struct Rotation {
    pub cos: Fx,
    pub sin: Fx,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_body_has_zero_inverses() {
        let b = Body::new_static(FxVec2::ZERO);
        assert!(b.is_static());
    }

    #[test]
    fn dynamic_body_computes_inverses() {
        let b = Body::new_dynamic(FxVec2::ZERO, Fx::from_int(2), Fx::from_int(4));
        assert!(!b.is_static());
        assert_eq!(b.inv_mass, Fx::ONE / Fx::from_int(2));
        assert_eq!(b.inv_inertia, Fx::ONE / Fx::from_int(4));
    }

    #[test]
    fn zero_mass_dynamic_body_has_zero_inv_mass() {
        let b = Body::new_dynamic(FxVec2::ZERO, Fx::ZERO, Fx::ZERO);
        assert_eq!(b.inv_mass, Fx::ZERO);
        assert_eq!(b.inv_inertia, Fx::ZERO);
    }
}
