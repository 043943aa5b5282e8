//! Construction-time validation errors.
//!
//! These are the only `Result`s the physics core ever returns. They are
//! raised exclusively when a shape or joint is *built*, never inside the
//! per-frame step — degenerate runtime conditions are absorbed silently
//! there (see `physics` module docs).

use thiserror::Error;

/// Failure building a [`crate::ecs::components::shape::CircleShape`] or
/// [`crate::ecs::components::shape::ConvexHullShape`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("circle radius must be positive, got {0:?}")]
    NonPositiveRadius(crate::fixed::Fx),

    #[error("hull skin radius must be non-negative, got {0:?}")]
    NegativeSkin(crate::fixed::Fx),

    #[error("convex hull must have between 3 and 16 vertices, got {0}")]
    VertexCountOutOfRange(usize),

    #[error("convex hull vertices must be wound counter-clockwise (signed area must be positive)")]
    NotCounterClockwise,
}

/// Failure building a joint component.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JointError {
    #[error("joint softening gamma must be non-negative, got {0:?}")]
    NegativeGamma(crate::fixed::Fx),

    #[error("joint Baumgarte beta must be in [0, 1], got {0:?}")]
    BetaOutOfRange(crate::fixed::Fx),
}
