//! # Corral
//!
//! Collider substrate for arena placement.
//!
//! Corral stores the bodies that occupy an arena as oriented boxes and answers
//! the one question placement needs: "which bodies overlap this box?". It
//! provides:
//!
//! - **Oriented boxes**: separating-axis overlap between rotated boxes
//! - **Body kinds**: solid, pass-through (trigger), arena boundary and agent
//! - **Collision layers**: bodies being placed sit on a staging layer that
//!   queries skip until they are activated
//! - **State hashing**: deterministic hash of the index for replay checks
//!
//! ## Quick Start
//!
//! ```
//! use corral::{BodyKind, ColliderIndex, Layer, OrientedBox, OverlapQuery};
//! use glam::{Quat, Vec3};
//!
//! let mut index = ColliderIndex::new();
//! let wall = index.insert(
//!     BodyKind::Solid,
//!     Layer::ACTIVE,
//!     OrientedBox::axis_aligned(Vec3::new(5.0, 1.0, 5.0), Vec3::splat(1.0)),
//! );
//!
//! let query = OrientedBox::new(
//!     Vec3::new(6.0, 1.0, 5.0),
//!     Vec3::splat(0.5),
//!     Quat::from_rotation_y(0.3),
//! );
//! let hits = index.overlapping(&query, Layer::ACTIVE);
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].body, wall);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod body;
pub mod hash;
pub mod index;
pub mod obb;

// Re-exports for convenience
pub use body::{Body, BodyId, BodyKind, Layer};
pub use hash::hash_index;
pub use index::{ColliderIndex, Overlap, OverlapQuery};
pub use obb::OrientedBox;

use thiserror::Error;

/// Errors raised when constructing spatial primitives.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum BoundsError {
    /// A minimum corner exceeds its maximum corner on some axis.
    #[error("bounds are inverted on the {axis} axis ({min} > {max})")]
    Inverted {
        /// Axis name (`x`, `y` or `z`).
        axis: char,
        /// Minimum coordinate on that axis.
        min: f32,
        /// Maximum coordinate on that axis.
        max: f32,
    },
    /// A coordinate is NaN or infinite.
    #[error("bounds contain a non-finite coordinate")]
    NonFinite,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bounds {
    /// Minimum corner
    pub min: glam::Vec3,
    /// Maximum corner
    pub max: glam::Vec3,
}

impl Bounds {
    /// Create bounds from dimensions, with the minimum corner at the origin.
    ///
    /// Arenas are addressed in `[0, width] x [0, height] x [0, depth]`.
    #[must_use]
    pub fn new(width: f32, height: f32, depth: f32) -> Self {
        Self {
            min: glam::Vec3::ZERO,
            max: glam::Vec3::new(width, height, depth),
        }
    }

    /// Create bounds from min/max corners.
    #[must_use]
    pub fn from_min_max(min: glam::Vec3, max: glam::Vec3) -> Self {
        Self { min, max }
    }

    /// Create bounds from min/max corners, rejecting inverted or non-finite input.
    ///
    /// # Errors
    ///
    /// Returns [`BoundsError::NonFinite`] if any coordinate is NaN or infinite,
    /// and [`BoundsError::Inverted`] if `min` exceeds `max` on any axis.
    pub fn try_from_min_max(min: glam::Vec3, max: glam::Vec3) -> Result<Self, BoundsError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(BoundsError::NonFinite);
        }
        for (axis, lo, hi) in [('x', min.x, max.x), ('y', min.y, max.y), ('z', min.z, max.z)] {
            if lo > hi {
                return Err(BoundsError::Inverted {
                    axis,
                    min: lo,
                    max: hi,
                });
            }
        }
        Ok(Self { min, max })
    }

    /// Get the center of the bounds.
    #[must_use]
    pub fn center(&self) -> glam::Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the size of the bounds.
    #[must_use]
    pub fn size(&self) -> glam::Vec3 {
        self.max - self.min
    }

    /// Get the half-size of the bounds.
    #[must_use]
    pub fn half_extents(&self) -> glam::Vec3 {
        self.size() * 0.5
    }

    /// Check if a point is inside the bounds.
    #[must_use]
    pub fn contains(&self, point: glam::Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Check if the interiors of two bounds overlap.
    ///
    /// Boxes that only share a face, edge or corner do not intersect.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
            && self.min.z < other.max.z
            && other.min.z < self.max.z
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(40.0, 10.0, 40.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_bounds_contains() {
        let bounds = Bounds::new(10.0, 10.0, 10.0);
        assert!(bounds.contains(Vec3::ZERO));
        assert!(bounds.contains(Vec3::new(4.0, 4.0, 4.0)));
        assert!(!bounds.contains(Vec3::new(11.0, 0.0, 0.0)));
        assert!(!bounds.contains(Vec3::new(-0.1, 0.0, 0.0)));
    }

    #[test]
    fn test_bounds_touching_do_not_intersect() {
        let a = Bounds::from_min_max(Vec3::ZERO, Vec3::ONE);
        let b = Bounds::from_min_max(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        assert!(!a.intersects(&b));

        let c = Bounds::from_min_max(Vec3::splat(0.5), Vec3::splat(1.5));
        assert!(a.intersects(&c));
        assert!(c.intersects(&a));
    }

    #[test]
    fn test_try_from_min_max_rejects_inverted() {
        let err = Bounds::try_from_min_max(Vec3::new(0.0, 2.0, 0.0), Vec3::new(1.0, 1.0, 1.0))
            .unwrap_err();
        assert_eq!(
            err,
            BoundsError::Inverted {
                axis: 'y',
                min: 2.0,
                max: 1.0
            }
        );
    }

    #[test]
    fn test_try_from_min_max_rejects_nan() {
        let err = Bounds::try_from_min_max(Vec3::new(f32::NAN, 0.0, 0.0), Vec3::ONE).unwrap_err();
        assert_eq!(err, BoundsError::NonFinite);
    }

    #[test]
    fn test_half_extents() {
        let bounds = Bounds::new(40.0, 10.0, 20.0);
        assert_eq!(bounds.half_extents(), Vec3::new(20.0, 5.0, 10.0));
        assert_eq!(bounds.center(), Vec3::new(20.0, 5.0, 10.0));
    }
}
