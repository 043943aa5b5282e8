//! The physics core: a staged, single-threaded, deterministic fixed
//! timestep (spec §2). `PhysicsWorld::step` is the only entry point a
//! collaborator calls; everything else in this module tree is an ordered
//! stage it drives.
//!
//! Grounded on the teacher's `physics/mod.rs` accumulator pattern
//! (`PhysicsWorld{config, accumulator, ...}`, `step` draining into
//! `fixed_step` while clamping runaway accumulation), generalized from the
//! teacher's float/3D/GPU pipeline to this crate's fixed-point 2D stage set.
//! Dependency order follows spec §2's leaves-first table: geometry sync →
//! broadphase → narrowphase/CCD → material mixing → solver → position
//! correction → integration → frame hash.

pub mod broadphase;
pub mod ccd;
pub mod determinism;
pub mod geometry;
pub mod integrate;
pub mod joints;
pub mod material;
pub mod narrowphase;
pub mod position_correction;
pub mod solver;

use hecs::{Entity, World};

use crate::ecs::components::body::{Body, Guid};
use crate::ecs::components::material::Material;
use crate::ecs::components::shape::{CircleShape, ConvexHullShape, HullWorldCache};
use crate::ecs::resources::{BroadphasePairs, Contacts2D, DeterministicRng, FrameCounter, MaterialTable, PairKey, ToiQueue};
use crate::fixed::Fx;

/// Tunable knobs for the fixed-timestep loop (spec §4.1/§5: the physics core
/// never consults wall-clock time; `fixed_timestep` is the sole, caller-set
/// notion of "how much simulated time one stage pass advances").
#[derive(Debug, Clone, Copy)]
pub struct PhysicsConfig {
    pub fixed_timestep: Fx,
    /// Hard cap on substeps run from a single `step` call, so a long stall
    /// (e.g. a debugger pause) can't demand an unbounded burst of catch-up
    /// work (spec §5: "no stage suspends mid-execution").
    pub max_substeps: u32,
    pub solver_iterations: u32,
    pub joint_beta: Fx,
}

impl Default for PhysicsConfig {
    fn default() -> PhysicsConfig {
        PhysicsConfig {
            fixed_timestep: Fx::ONE / Fx::from_int(60),
            max_substeps: 4,
            solver_iterations: 8,
            joint_beta: Fx::from_f64(0.2),
        }
    }
}

/// Per-stage diagnostics for one completed fixed step, useful for replay
/// verification and logging (spec §6: "Frame hash (for replay)").
#[derive(Debug, Clone, Copy, Default)]
pub struct StepStats {
    pub frame: u64,
    pub contact_count: usize,
    pub frame_hash: u64,
}

/// Owns every per-frame resource the stage set reads and writes (spec §3's
/// "the core owns only the per-frame tables"), plus the config and the two
/// long-lived named resources (material table, PRNG) spec §9 calls out as
/// "global singletons... modelled as named resources".
pub struct PhysicsWorld {
    pub config: PhysicsConfig,
    pub materials: MaterialTable,
    pub rng: DeterministicRng,
    accumulator: Fx,
    broadphase: BroadphasePairs,
    contacts: Contacts2D,
    toi_queue: ToiQueue,
    frame_counter: FrameCounter,
    last_stats: Option<StepStats>,
}

impl PhysicsWorld {
    pub fn new(config: PhysicsConfig, materials: MaterialTable, rng_seed: u64) -> PhysicsWorld {
        PhysicsWorld {
            config,
            materials,
            rng: DeterministicRng::new(rng_seed),
            accumulator: Fx::ZERO,
            broadphase: BroadphasePairs::default(),
            contacts: Contacts2D::default(),
            toi_queue: ToiQueue::default(),
            frame_counter: FrameCounter::default(),
            last_stats: None,
        }
    }

    pub fn contacts(&self) -> &Contacts2D {
        &self.contacts
    }

    pub fn toi_queue(&self) -> &ToiQueue {
        &self.toi_queue
    }

    /// Diagnostics from the most recently completed fixed step, `None` before
    /// the first step (spec.md expansion C13: stage counters surfaced for
    /// collaborators, mirroring the teacher's `Counters`-style bookkeeping).
    pub fn last_stats(&self) -> Option<StepStats> {
        self.last_stats
    }

    /// Accumulates `frame_dt` and runs as many fixed steps as it covers, up
    /// to `max_substeps`. `frame_dt` may be a non-deterministic wall-clock
    /// delta from the caller's render loop; determinism only requires that
    /// `config.fixed_timestep` and every fixed step's internal behaviour
    /// stay fixed, which is why accumulation, not `frame_dt` itself, decides
    /// how many times `fixed_step` runs (spec §5).
    pub fn step(&mut self, world: &mut World, frame_dt: Fx) -> Vec<StepStats> {
        self.accumulator = self.accumulator + frame_dt;

        let max_accumulated = self.config.fixed_timestep * Fx::from_int(self.config.max_substeps as i32);
        if self.accumulator > max_accumulated {
            tracing::warn!(dropped = ?(self.accumulator - max_accumulated), "physics accumulator overflow, discarding excess");
            self.accumulator = max_accumulated;
        }

        let mut stats = Vec::new();
        let mut substeps = 0;
        while self.accumulator >= self.config.fixed_timestep && substeps < self.config.max_substeps {
            self.accumulator = self.accumulator - self.config.fixed_timestep;
            stats.push(self.fixed_step(world));
            substeps += 1;
        }
        stats
    }

    /// Runs exactly one fixed timestep's stage set, in spec §2's dependency
    /// order.
    pub fn fixed_step(&mut self, world: &mut World) -> StepStats {
        let dt = self.config.fixed_timestep;
        let frame = self.frame_counter.advance();
        let _frame_span = tracing::debug_span!("physics_fixed_step", frame).entered();

        {
            let _span = tracing::trace_span!("geometry_sync").entered();
            geometry::sync_all(world, dt, frame);
        }

        {
            let _span = tracing::trace_span!("broadphase").entered();
            broadphase::find_pairs(world, &mut self.broadphase);
        }

        self.contacts.clear_manifolds();
        self.toi_queue.clear();

        {
            let _span = tracing::trace_span!("narrowphase_and_ccd").entered();
            for &(a, b, pair) in &self.broadphase.pairs {
                process_pair(world, a, b, pair, dt, &mut self.contacts, &mut self.toi_queue, &self.materials);
            }
        }

        let surfaces = {
            let _span = tracing::trace_span!("material_mix").entered();
            material::mix_all(&self.contacts, &self.materials, |e| world.get::<&Material>(e).ok().as_deref().copied())
        };

        {
            let _span = tracing::trace_span!("solve").entered();
            solver::solve(world, &mut self.contacts, &surfaces, self.config.solver_iterations, self.config.joint_beta, Fx::ONE / dt);
        }

        {
            let _span = tracing::trace_span!("position_correction").entered();
            position_correction::correct_positions(world, &self.contacts);
            position_correction::drain_toi_queue(world, &mut self.toi_queue);
        }

        {
            let _span = tracing::trace_span!("integrate").entered();
            integrate::integrate(world, dt);
        }

        let frame_hash = determinism::frame_hash(world, &self.contacts);
        tracing::trace!(frame, contacts = self.contacts.manifolds.len(), frame_hash, "fixed step complete");

        let stats = StepStats { frame, contact_count: self.contacts.manifolds.len(), frame_hash };
        self.last_stats = Some(stats);
        stats
    }
}

/// One entity's collision shape, borrowed for the duration of a single
/// narrowphase dispatch (spec §4.4's shape-kind match). Holding the `hecs`
/// `Ref` guards rather than copying keeps a hull's world cache from being
/// cloned on every pair check.
enum ShapeRef<'a> {
    Circle(hecs::Ref<'a, CircleShape>),
    Hull(hecs::Ref<'a, ConvexHullShape>, hecs::Ref<'a, HullWorldCache>),
}

impl<'a> ShapeRef<'a> {
    fn as_shapes(&self) -> narrowphase::Shapes<'_> {
        match self {
            ShapeRef::Circle(c) => narrowphase::Shapes::Circle(c),
            ShapeRef::Hull(h, cache) => narrowphase::Shapes::Hull(h, cache),
        }
    }
}

fn shape_ref(world: &World, entity: Entity) -> Option<ShapeRef<'_>> {
    if let Ok(c) = world.get::<&CircleShape>(entity) {
        return Some(ShapeRef::Circle(c));
    }
    let h = world.get::<&ConvexHullShape>(entity).ok()?;
    let cache = world.get::<&HullWorldCache>(entity).ok()?;
    Some(ShapeRef::Hull(h, cache))
}

fn is_circle(world: &World, entity: Entity) -> bool {
    world.get::<&CircleShape>(entity).is_ok()
}

fn is_hull(world: &World, entity: Entity) -> bool {
    world.get::<&ConvexHullShape>(entity).is_ok()
}

/// Handles one broadphase candidate pair: a circle/hull pair is first swept
/// through CCD (which no-ops for slow movers, per `ccd::is_fast_moving`),
/// then every pair always runs through discrete narrowphase so the solver
/// has a manifold for persistent contacts (spec §4.4/§4.5: C5 and C6 are
/// peers, not alternatives).
fn process_pair(
    world: &mut World,
    a: Entity,
    b: Entity,
    pair: PairKey,
    dt: Fx,
    contacts: &mut Contacts2D,
    toi_queue: &mut ToiQueue,
    materials: &MaterialTable,
) {
    if is_circle(world, a) && is_hull(world, b) {
        sweep_and_queue_ccd(world, a, b, dt, toi_queue, materials);
    } else if is_hull(world, a) && is_circle(world, b) {
        sweep_and_queue_ccd(world, b, a, dt, toi_queue, materials);
    }

    run_narrowphase(world, a, b, pair, contacts);
}

fn sweep_and_queue_ccd(world: &mut World, circle_entity: Entity, hull_entity: Entity, dt: Fx, toi_queue: &mut ToiQueue, materials: &MaterialTable) {
    let Some(circle_guid) = world.get::<&Guid>(circle_entity).ok().as_deref().copied() else { return };
    let Some(hull_guid) = world.get::<&Guid>(hull_entity).ok().as_deref().copied() else { return };
    let Ok(shape) = world.get::<&CircleShape>(circle_entity) else { return };
    let Ok(cache) = world.get::<&HullWorldCache>(hull_entity) else { return };

    let surface = {
        let mat_a = world.get::<&Material>(circle_entity).ok().as_deref().copied();
        let mat_b = world.get::<&Material>(hull_entity).ok().as_deref().copied();
        material::mix_pair(materials, mat_a, mat_b)
    };

    let Ok([mut circle_body, mut hull_body]) = world.query_many_mut::<&mut Body, 2>([circle_entity, hull_entity]) else { return };
    ccd::sweep_circle_vs_hull(
        circle_entity,
        circle_guid,
        &mut circle_body,
        &shape,
        hull_entity,
        hull_guid,
        &mut hull_body,
        &cache,
        dt,
        surface,
        toi_queue,
    );
}

fn run_narrowphase(world: &World, a: Entity, b: Entity, pair: PairKey, contacts: &mut Contacts2D) {
    let Ok(body_a) = world.get::<&Body>(a) else { return };
    let Ok(body_b) = world.get::<&Body>(b) else { return };
    let Some(shape_a) = shape_ref(world, a) else { return };
    let Some(shape_b) = shape_ref(world, b) else { return };

    if let Some(raw) = narrowphase::detect(&body_a, &shape_a.as_shapes(), &body_b, &shape_b.as_shapes()) {
        narrowphase::commit_manifold(contacts, pair, a, b, raw);
    }
}
