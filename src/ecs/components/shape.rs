//! Shape components: local circle/hull definitions, and the world-space
//! caches geometry sync (C3) writes into.

use crate::error::ShapeError;
use crate::fixed::{Fx, FxVec2};

pub const MIN_HULL_VERTICES: usize = 3;
pub const MAX_HULL_VERTICES: usize = 16;

/// A circle shape, local space (a circle has no orientation to speak of).
#[derive(Debug, Clone, Copy)]
pub struct CircleShape {
    pub radius: Fx,
    pub skin: Fx,
}

impl CircleShape {
    pub fn new(radius: Fx, skin: Fx) -> Result<CircleShape, ShapeError> {
        if radius <= Fx::ZERO {
            return Err(ShapeError::NonPositiveRadius(radius));
        }
        if skin < Fx::ZERO {
            return Err(ShapeError::NegativeSkin(skin));
        }
        Ok(CircleShape { radius, skin })
    }
}

/// A convex hull, local space: vertices wound counter-clockwise.
#[derive(Debug, Clone)]
pub struct ConvexHullShape {
    /// Interleaved `[x0,y0,x1,y1,...]` layout (`FxVec2` is `repr(C)` with two
    /// `Fx` fields, so this `Vec<FxVec2>` *is* that interleaved buffer).
    pub verts: Vec<FxVec2>,
    pub skin: Fx,
}

impl ConvexHullShape {
    pub fn new(verts: Vec<FxVec2>, skin: Fx) -> Result<ConvexHullShape, ShapeError> {
        if verts.len() < MIN_HULL_VERTICES || verts.len() > MAX_HULL_VERTICES {
            return Err(ShapeError::VertexCountOutOfRange(verts.len()));
        }
        if skin < Fx::ZERO {
            return Err(ShapeError::NegativeSkin(skin));
        }
        if signed_area_x2(&verts) <= Fx::ZERO {
            return Err(ShapeError::NotCounterClockwise);
        }
        Ok(ConvexHullShape { verts, skin })
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.verts.len()
    }
}

/// Twice the signed polygon area (shoelace formula); CCW winding is positive.
fn signed_area_x2(verts: &[FxVec2]) -> Fx {
    let n = verts.len();
    let mut sum = Fx::ZERO;
    for i in 0..n {
        let a = verts[i];
        let b = verts[(i + 1) % n];
        sum += a.cross(b);
    }
    sum
}

/// World-space cache for a hull, written exclusively by geometry sync (C3)
/// and read-only to every downstream stage in the same frame (spec §3).
#[derive(Debug, Clone, Default)]
pub struct HullWorldCache {
    pub wverts: Vec<FxVec2>,
    /// Un-normalised outward edge normal for edge `(i, i+1 mod n)`;
    /// narrowphase renormalises on demand (spec §3).
    pub normals: Vec<FxVec2>,
    pub count: usize,
    pub epoch: u64,
}

/// Axis-aligned bounding box. For dynamic bodies this is the *swept* box
/// over one fixed timestep (spec §3/§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aabb {
    pub minx: Fx,
    pub maxx: Fx,
    pub miny: Fx,
    pub maxy: Fx,
    pub epoch: u64,
}

impl Aabb {
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.minx <= other.maxx
            && self.maxx >= other.minx
            && self.miny <= other.maxy
            && self.maxy >= other.miny
    }

    #[inline]
    pub fn union(self, other: Aabb) -> Aabb {
        Aabb {
            minx: self.minx.min(other.minx),
            maxx: self.maxx.max(other.maxx),
            miny: self.miny.min(other.miny),
            maxy: self.maxy.max(other.maxy),
            epoch: self.epoch.max(other.epoch),
        }
    }

    #[inline]
    pub fn inflate(self, by: Fx) -> Aabb {
        Aabb {
            minx: self.minx - by,
            maxx: self.maxx + by,
            miny: self.miny - by,
            maxy: self.maxy + by,
            epoch: self.epoch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_rejects_nonpositive_radius() {
        assert!(CircleShape::new(Fx::ZERO, Fx::ZERO).is_err());
        assert!(CircleShape::new(-Fx::ONE, Fx::ZERO).is_err());
    }

    #[test]
    fn circle_rejects_negative_skin() {
        assert!(CircleShape::new(Fx::ONE, -Fx::ONE).is_err());
    }

    fn square(half: f64) -> Vec<FxVec2> {
        vec![
            FxVec2::new(Fx::from_f64(-half), Fx::from_f64(-half)),
            FxVec2::new(Fx::from_f64(half), Fx::from_f64(-half)),
            FxVec2::new(Fx::from_f64(half), Fx::from_f64(half)),
            FxVec2::new(Fx::from_f64(-half), Fx::from_f64(half)),
        ]
    }

    #[test]
    fn hull_accepts_ccw_square() {
        let hull = ConvexHullShape::new(square(1.0), Fx::ZERO).unwrap();
        assert_eq!(hull.count(), 4);
    }

    #[test]
    fn hull_rejects_clockwise_winding() {
        let mut verts = square(1.0);
        verts.reverse();
        assert_eq!(
            ConvexHullShape::new(verts, Fx::ZERO).unwrap_err(),
            ShapeError::NotCounterClockwise
        );
    }

    #[test]
    fn hull_rejects_too_few_vertices() {
        let verts = vec![FxVec2::ZERO, FxVec2::new(Fx::ONE, Fx::ZERO)];
        assert!(matches!(
            ConvexHullShape::new(verts, Fx::ZERO).unwrap_err(),
            ShapeError::VertexCountOutOfRange(2)
        ));
    }

    #[test]
    fn hull_rejects_too_many_vertices() {
        let verts: Vec<FxVec2> = (0..17)
            .map(|i| FxVec2::new(Fx::from_int(i), Fx::from_int(i * i % 7)))
            .collect();
        assert!(matches!(
            ConvexHullShape::new(verts, Fx::ZERO).unwrap_err(),
            ShapeError::VertexCountOutOfRange(17)
        ));
    }

    #[test]
    fn aabb_overlap() {
        let a = Aabb { minx: Fx::from_int(-1), maxx: Fx::from_int(1), miny: Fx::from_int(-1), maxy: Fx::from_int(1), epoch: 0 };
        let b = Aabb { minx: Fx::from_int(0), maxx: Fx::from_int(2), miny: Fx::from_int(0), maxy: Fx::from_int(2), epoch: 0 };
        let c = Aabb { minx: Fx::from_int(5), maxx: Fx::from_int(6), miny: Fx::from_int(5), maxy: Fx::from_int(6), epoch: 0 };
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }
}
