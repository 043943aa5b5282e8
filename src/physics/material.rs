//! Material mixing stage (C11): resolves the friction/restitution/bounce
//! threshold for every live contact manifold before the solver and CCD
//! response consume them.
//!
//! The mixing rules and override table themselves are plain data living on
//! [`crate::ecs::resources::MaterialTable`] (it's a per-world resource, not
//! a per-stage scratch structure); this module is the stage that actually
//! walks the manifolds and applies them each frame.

use crate::ecs::components::material::Material;
use crate::ecs::resources::{Contacts2D, MaterialTable};
use crate::fixed::Fx;

/// Resolved surface properties for one manifold's pair of materials.
/// `friction` is the static coefficient; the Coulomb clamp in the solver
/// (spec §4.7) doesn't distinguish static/dynamic within one impulse
/// iteration, so `mu_static` is what's carried through to it.
#[derive(Debug, Clone, Copy, Default)]
pub struct MixedSurface {
    pub friction: Fx,
    pub restitution: Fx,
    pub bounce_threshold: Fx,
}

/// Looks up and mixes the surface properties for every manifold this frame,
/// in manifold order (manifolds are already sorted by pair key upstream).
pub fn mix_all(contacts: &Contacts2D, table: &MaterialTable, materials: impl Fn(hecs::Entity) -> Option<Material>) -> Vec<MixedSurface> {
    contacts
        .manifolds
        .iter()
        .map(|m| {
            let a = materials(m.entity_a);
            let b = materials(m.entity_b);
            match (a, b) {
                (Some(a), Some(b)) => {
                    let mixed = table.mix(&a, &b);
                    MixedSurface {
                        friction: mixed.mu_static,
                        restitution: mixed.restitution,
                        bounce_threshold: mixed.bounce_threshold,
                    }
                }
                _ => MixedSurface::default(),
            }
        })
        .collect()
}

/// Mixes a single pair's surface properties directly, for callers (CCD
/// overlap response) that don't go through a `ContactManifold`.
pub fn mix_pair(table: &MaterialTable, a: Option<Material>, b: Option<Material>) -> MixedSurface {
    match (a, b) {
        (Some(a), Some(b)) => {
            let mixed = table.mix(&a, &b);
            MixedSurface { friction: mixed.mu_static, restitution: mixed.restitution, bounce_threshold: mixed.bounce_threshold }
        }
        _ => MixedSurface::default(),
    }
}
