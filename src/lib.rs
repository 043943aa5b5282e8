//! Deterministic fixed-point 2D rigid body physics core.
//!
//! Bodies, shapes, joints and materials are plain ECS components
//! ([`ecs::components`]); per-frame bookkeeping (contacts, broadphase pairs,
//! the TOI queue, the material table) lives in [`ecs::resources`].
//! [`physics::PhysicsWorld`] drives the fixed-timestep stage pipeline over a
//! `hecs::World` that owns both.

pub mod ecs;
pub mod error;
pub mod fixed;
pub mod physics;

mod sin_table;

pub use physics::{PhysicsConfig, PhysicsWorld, StepStats};
