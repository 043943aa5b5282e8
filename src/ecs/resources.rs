//! World-level (`hecs` has no built-in resource slot, so these are plain
//! structs the physics pipeline threads through explicitly) resources: the
//! broadphase pair list, the contact cache, the TOI queue, the material
//! table, the frame counter and the deterministic RNG.

use rustc_hash::FxHashMap;

use crate::ecs::components::body::Guid;
use crate::ecs::components::material::MaterialId;
use crate::fixed::Fx;

/// Canonically-ordered pair key: `(lo, hi)` where `lo < hi` by `Guid`
/// ordering (spec §3/§4.3). Used everywhere two entities need a stable,
/// order-independent identity for a potential interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey {
    pub lo: Guid,
    pub hi: Guid,
}

impl PairKey {
    pub fn new(a: Guid, b: Guid) -> PairKey {
        if a < b {
            PairKey { lo: a, hi: b }
        } else {
            PairKey { lo: b, hi: a }
        }
    }
}

/// Candidate pairs emitted by broadphase (C4), consumed by narrowphase (C5).
/// Sorted by `PairKey` before being handed downstream so iteration order
/// never depends on broadphase's internal bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct BroadphasePairs {
    pub pairs: Vec<(hecs::Entity, hecs::Entity, PairKey)>,
}

impl BroadphasePairs {
    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    pub fn sort(&mut self) {
        self.pairs.sort_by_key(|&(_, _, key)| key);
    }
}

/// One persisted contact point's warm-start state (spec §3).
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactWarmStart {
    pub normal_impulse: Fx,
    pub tangent_impulse: Fx,
}

/// Live contact manifold for one pair, valid for exactly one frame.
#[derive(Debug, Clone)]
pub struct ContactManifold {
    pub pair: PairKey,
    pub entity_a: hecs::Entity,
    pub entity_b: hecs::Entity,
    pub normal: crate::fixed::FxVec2,
    pub points: Vec<ContactPoint>,
}

/// A single manifold contact point, in world space.
#[derive(Debug, Clone, Copy)]
pub struct ContactPoint {
    pub position: crate::fixed::FxVec2,
    pub penetration: Fx,
    /// Index into the point's warm-start slot, stable frame over frame as
    /// long as the contact feature id doesn't change.
    pub feature_id: u32,
    pub warm_start: ContactWarmStart,
}

/// This frame's manifolds plus the previous frame's warm-start cache, keyed
/// by `(PairKey, feature_id)` so a lost/regained contact doesn't inherit a
/// stale impulse (spec §4.7).
#[derive(Debug, Clone, Default)]
pub struct Contacts2D {
    pub manifolds: Vec<ContactManifold>,
    pub warm_start_cache: FxHashMap<(PairKey, u32), ContactWarmStart>,
}

impl Contacts2D {
    pub fn clear_manifolds(&mut self) {
        self.manifolds.clear();
    }

    /// Rebuild the warm-start cache from this frame's solved manifolds, ready
    /// for next frame's lookup. Call after the solver has written back its
    /// accumulated impulses into each `ContactPoint`.
    pub fn commit_warm_start(&mut self) {
        self.warm_start_cache.clear();
        for manifold in &self.manifolds {
            for point in &manifold.points {
                self.warm_start_cache
                    .insert((manifold.pair, point.feature_id), point.warm_start);
            }
        }
    }

    pub fn lookup_warm_start(&self, pair: PairKey, feature_id: u32) -> ContactWarmStart {
        self.warm_start_cache
            .get(&(pair, feature_id))
            .copied()
            .unwrap_or_default()
    }
}

/// A scheduled time-of-impact event from CCD (C6), queued for the position
/// correction stage (C9) to apply in `(toi, pair)` order.
#[derive(Debug, Clone, Copy)]
pub struct ToiEvent {
    pub pair: PairKey,
    pub entity_a: hecs::Entity,
    pub entity_b: hecs::Entity,
    /// Time of impact within the step, in `[0, 1)`.
    pub toi: Fx,
    /// The moving body's (`entity_a`'s) displacement this step, captured at
    /// detection time so position correction can replay `p0 + d * (t -
    /// epsilon)` without depending on velocities the solver may since have
    /// changed.
    pub displacement: crate::fixed::FxVec2,
}

#[derive(Debug, Clone, Default)]
pub struct ToiQueue {
    pub events: Vec<ToiEvent>,
}

impl ToiQueue {
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Sort by `(toi, pair)` so ties are resolved deterministically rather
    /// than by discovery order (spec §4.5/§9).
    pub fn sort(&mut self) {
        self.events
            .sort_by(|a, b| a.toi.cmp(&b.toi).then(a.pair.cmp(&b.pair)));
    }
}

/// Material mixing rule selected per pair (spec §4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixRule {
    Min,
    Max,
    Average,
    Multiply,
    GeometricMean,
    PreferA,
    PreferB,
}

/// A pair's fully-resolved surface properties after mixing (spec §4.10).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixedMaterial {
    pub mu_static: Fx,
    pub mu_dynamic: Fx,
    pub restitution: Fx,
    pub bounce_threshold: Fx,
}

/// `{ frictionRule, restitutionRule, thresholdRule }` (spec §4.10). Defaults
/// are friction = min, restitution = max, threshold = max.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairRule {
    pub friction_rule: MixRule,
    pub restitution_rule: MixRule,
    pub threshold_rule: MixRule,
}

impl Default for PairRule {
    fn default() -> PairRule {
        PairRule {
            friction_rule: MixRule::Min,
            restitution_rule: MixRule::Max,
            threshold_rule: MixRule::Max,
        }
    }
}

/// Resolves friction/restitution/bounce-threshold for a pair of materials,
/// honoring any explicit per-pair override before falling back to the
/// default rule set.
#[derive(Debug, Clone)]
pub struct MaterialTable {
    pub default_rule: PairRule,
    pub overrides: FxHashMap<(MaterialId, MaterialId), PairRule>,
}

impl MaterialTable {
    pub fn new(default_friction_rule: MixRule, default_restitution_rule: MixRule) -> MaterialTable {
        MaterialTable {
            default_rule: PairRule {
                friction_rule: default_friction_rule,
                restitution_rule: default_restitution_rule,
                threshold_rule: MixRule::Max,
            },
            overrides: FxHashMap::default(),
        }
    }

    pub fn with_default_rule(default_rule: PairRule) -> MaterialTable {
        MaterialTable { default_rule, overrides: FxHashMap::default() }
    }

    fn canonical_key(a: MaterialId, b: MaterialId) -> (MaterialId, MaterialId) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub fn set_override(&mut self, a: MaterialId, b: MaterialId, friction_rule: MixRule, restitution_rule: MixRule) {
        let rule = PairRule { friction_rule, restitution_rule, threshold_rule: self.default_rule.threshold_rule };
        self.overrides.insert(Self::canonical_key(a, b), rule);
    }

    pub fn set_override_rule(&mut self, a: MaterialId, b: MaterialId, rule: PairRule) {
        self.overrides.insert(Self::canonical_key(a, b), rule);
    }

    fn rule_for(&self, a: MaterialId, b: MaterialId) -> PairRule {
        self.overrides.get(&Self::canonical_key(a, b)).copied().unwrap_or(self.default_rule)
    }

    /// Mixes every surface property pinned down by spec.md §9: the table's
    /// configured rule governs friction, restitution *and* bounce threshold
    /// — there is no separate ad-hoc threshold mixing path.
    pub fn mix(
        &self,
        a: &crate::ecs::components::material::Material,
        b: &crate::ecs::components::material::Material,
    ) -> MixedMaterial {
        let rule = self.rule_for(a.id, b.id);
        MixedMaterial {
            mu_static: apply_rule(rule.friction_rule, a.mu_static, b.mu_static),
            mu_dynamic: apply_rule(rule.friction_rule, a.mu_dynamic, b.mu_dynamic),
            restitution: apply_rule(rule.restitution_rule, a.restitution, b.restitution),
            bounce_threshold: apply_rule(rule.threshold_rule, a.bounce_threshold, b.bounce_threshold),
        }
    }
}

fn apply_rule(rule: MixRule, x: Fx, y: Fx) -> Fx {
    match rule {
        MixRule::Min => x.min(y),
        MixRule::Max => x.max(y),
        MixRule::Average => (x + y) / Fx::from_int(2),
        MixRule::Multiply => x * y,
        MixRule::GeometricMean => (x * y).sqrt(),
        MixRule::PreferA => x,
        MixRule::PreferB => y,
    }
}

/// Monotonic frame counter, stamped onto the frame hash (C10).
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameCounter(pub u64);

impl FrameCounter {
    pub fn advance(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }
}

/// Deterministic xorshift64* PRNG. Never seeded from wall-clock time or any
/// other non-reproducible source — callers pass an explicit seed (spec §6).
#[derive(Debug, Clone, Copy)]
pub struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> DeterministicRng {
        DeterministicRng { state: if seed == 0 { 0x9E3779B97F4A7C15 } else { seed } }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// A deterministic `Fx` in `[0, 1)`.
    pub fn next_fx_unit(&mut self) -> Fx {
        let bits = (self.next_u64() >> 48) as i32 & 0xFFFF;
        Fx::from_bits(bits)
    }
}
