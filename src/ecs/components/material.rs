//! Surface material component and the mixing table it's looked up in
//! (C11, spec §4.10). The component itself is just an id; mixing rules and
//! the per-pair override table live in [`crate::ecs::resources::MaterialTable`]
//! so two bodies never need to know about each other's material directly.

/// Interned material identifier. Small and `Copy` so it's cheap to carry on
/// every collider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MaterialId(pub u32);

/// Surface properties attached to a material id, read by the table during
/// mixing (spec §3: `{ id, muS, muD, restitution, bounceThreshold }`).
/// `mu_static`/`mu_dynamic` are both carried because the source data model
/// distinguishes them even though the current solver (§4.7) only consults
/// one mixed coefficient per contact; downstream stages pick `mu_static`
/// for the Coulomb clamp, matching a resting-contact-biased sequential
/// impulse solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub id: MaterialId,
    pub mu_static: crate::fixed::Fx,
    pub mu_dynamic: crate::fixed::Fx,
    pub restitution: crate::fixed::Fx,
    pub bounce_threshold: crate::fixed::Fx,
}

impl Material {
    pub fn new(
        id: MaterialId,
        mu_static: crate::fixed::Fx,
        mu_dynamic: crate::fixed::Fx,
        restitution: crate::fixed::Fx,
        bounce_threshold: crate::fixed::Fx,
    ) -> Material {
        Material { id, mu_static, mu_dynamic, restitution, bounce_threshold }
    }
}
