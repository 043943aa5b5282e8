pub mod body;
pub mod joint;
pub mod material;
pub mod shape;

pub use body::{Body, Guid, Rotation};
pub use joint::{DistanceJoint, PrismaticJoint, RevoluteJoint, AUTO_REST_LENGTH};
pub use material::{Material, MaterialId};
pub use shape::{Aabb, CircleShape, ConvexHullShape, HullWorldCache};
