//! Oriented bounding boxes and separating-axis overlap.
//!
//! An [`OrientedBox`] is a box with a center, half-extents along its local
//! axes and a rotation. Two boxes overlap when no separating axis exists among
//! the 15 candidates (3 face normals of each box plus the 9 pairwise edge
//! cross products).
//!
//! Touching boxes (shared face, edge or corner) are NOT counted as
//! overlapping, so objects may be placed flush against each other or against
//! the arena walls.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::Bounds;

/// Penetration depth below which two boxes are considered touching.
pub const CONTACT_EPSILON: f32 = 1e-4;

/// Squared length below which an edge cross product is treated as degenerate.
const PARALLEL_EPSILON: f32 = 1e-8;

/// A box with arbitrary orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientedBox {
    /// Center in world space
    pub center: Vec3,
    /// Half-size along each local axis
    pub half_extents: Vec3,
    /// Rotation from local to world space
    pub rotation: Quat,
}

impl OrientedBox {
    /// Create a new oriented box.
    #[must_use]
    pub fn new(center: Vec3, half_extents: Vec3, rotation: Quat) -> Self {
        Self {
            center,
            half_extents: half_extents.abs(),
            rotation,
        }
    }

    /// Create an unrotated box.
    #[must_use]
    pub fn axis_aligned(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center, half_extents, Quat::IDENTITY)
    }

    /// World-space directions of the box's local X, Y and Z axes.
    #[must_use]
    pub fn axes(&self) -> [Vec3; 3] {
        [
            self.rotation * Vec3::X,
            self.rotation * Vec3::Y,
            self.rotation * Vec3::Z,
        ]
    }

    /// World-space axis-aligned bounds enclosing the box.
    #[must_use]
    pub fn aabb(&self) -> Bounds {
        let [ax, ay, az] = self.axes();
        let reach = ax.abs() * self.half_extents.x
            + ay.abs() * self.half_extents.y
            + az.abs() * self.half_extents.z;
        Bounds::from_min_max(self.center - reach, self.center + reach)
    }

    /// Half-length of the box's projection onto `axis` (assumed unit length).
    #[must_use]
    pub fn projected_radius(&self, axis: Vec3) -> f32 {
        self.axes()
            .iter()
            .zip(self.half_extents.to_array())
            .map(|(u, h)| h * u.dot(axis).abs())
            .sum()
    }

    /// Check if a world-space point lies inside the box.
    #[must_use]
    pub fn contains_point(&self, point: Vec3) -> bool {
        let local = self.rotation.inverse() * (point - self.center);
        local.abs().cmple(self.half_extents).all()
    }

    /// Check if the interiors of two boxes overlap.
    ///
    /// Penetrations shallower than [`CONTACT_EPSILON`] count as touching.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        // Cheap reject before the full axis sweep.
        if !self.aabb().intersects(&other.aabb()) {
            return false;
        }

        let a = self.axes();
        let b = other.axes();
        let offset = other.center - self.center;

        for axis in a.iter().chain(b.iter()) {
            if self.separated_on(other, *axis, offset) {
                return false;
            }
        }

        for ai in &a {
            for bj in &b {
                let axis = ai.cross(*bj);
                if axis.length_squared() < PARALLEL_EPSILON {
                    continue;
                }
                if self.separated_on(other, axis.normalize(), offset) {
                    return false;
                }
            }
        }

        true
    }

    fn separated_on(&self, other: &Self, axis: Vec3, offset: Vec3) -> bool {
        let distance = offset.dot(axis).abs();
        distance >= self.projected_radius(axis) + other.projected_radius(axis) - CONTACT_EPSILON
    }

    /// Four wall boxes enclosing the XZ footprint of `bounds`.
    ///
    /// Walls sit just outside `[min, max]` on X and Z with the given
    /// `thickness`, and span the full height of `bounds`. Order: -X, +X, -Z, +Z.
    #[must_use]
    pub fn walls_around(bounds: &Bounds, thickness: f32) -> [Self; 4] {
        let size = bounds.size();
        let center = bounds.center();
        let half_t = thickness * 0.5;
        let half_h = size.y * 0.5;
        let half_x = size.x * 0.5 + thickness;
        let half_z = size.z * 0.5 + thickness;

        [
            Self::axis_aligned(
                Vec3::new(bounds.min.x - half_t, center.y, center.z),
                Vec3::new(half_t, half_h, half_z),
            ),
            Self::axis_aligned(
                Vec3::new(bounds.max.x + half_t, center.y, center.z),
                Vec3::new(half_t, half_h, half_z),
            ),
            Self::axis_aligned(
                Vec3::new(center.x, center.y, bounds.min.z - half_t),
                Vec3::new(half_x, half_h, half_t),
            ),
            Self::axis_aligned(
                Vec3::new(center.x, center.y, bounds.max.z + half_t),
                Vec3::new(half_x, half_h, half_t),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::FRAC_PI_4;

    fn unit_at(x: f32, z: f32) -> OrientedBox {
        OrientedBox::axis_aligned(Vec3::new(x, 0.5, z), Vec3::splat(0.5))
    }

    #[test]
    fn separate_boxes_do_not_overlap() {
        assert!(!unit_at(0.0, 0.0).overlaps(&unit_at(3.0, 0.0)));
    }

    #[test]
    fn flush_boxes_do_not_overlap() {
        assert!(!unit_at(0.0, 0.0).overlaps(&unit_at(1.0, 0.0)));
        assert!(!unit_at(0.0, 0.0).overlaps(&unit_at(1.0, 1.0)));
    }

    #[test]
    fn penetrating_boxes_overlap() {
        assert!(unit_at(0.0, 0.0).overlaps(&unit_at(0.9, 0.0)));
        assert!(unit_at(0.0, 0.0).overlaps(&unit_at(0.0, 0.0)));
    }

    #[test]
    fn rotation_changes_the_footprint() {
        // A unit box rotated 45 degrees reaches sqrt(2)/2 ~ 0.707 along X.
        let rotated = OrientedBox::new(
            Vec3::new(0.0, 0.5, 0.0),
            Vec3::splat(0.5),
            Quat::from_rotation_y(FRAC_PI_4),
        );
        let neighbour = unit_at(1.15, 0.0);
        assert!(rotated.overlaps(&neighbour));
        assert!(!unit_at(0.0, 0.0).overlaps(&neighbour));
    }

    #[test]
    fn rotated_corner_gap_is_separated_by_edge_axis() {
        // Diamond next to a box: AABBs overlap but the boxes do not.
        let diamond = OrientedBox::new(
            Vec3::new(0.0, 0.5, 0.0),
            Vec3::splat(0.5),
            Quat::from_rotation_y(FRAC_PI_4),
        );
        let corner = OrientedBox::axis_aligned(Vec3::new(0.9, 0.5, 0.9), Vec3::splat(0.5));
        assert!(diamond.aabb().intersects(&corner.aabb()));
        assert!(!diamond.overlaps(&corner));
    }

    #[test]
    fn aabb_of_rotated_box_grows() {
        let rotated = OrientedBox::new(Vec3::ZERO, Vec3::splat(1.0), Quat::from_rotation_y(FRAC_PI_4));
        let aabb = rotated.aabb();
        assert!((aabb.max.x - 2.0_f32.sqrt()).abs() < 1e-5);
        assert!((aabb.max.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn contains_point_respects_rotation() {
        let rotated = OrientedBox::new(
            Vec3::ZERO,
            Vec3::new(2.0, 1.0, 0.1),
            Quat::from_rotation_y(FRAC_PI_4),
        );
        assert!(rotated.contains_point(Vec3::ZERO));
        assert!(!rotated.contains_point(Vec3::new(1.8, 0.0, 0.0)));
        assert!(rotated.contains_point(Vec3::new(1.0, 0.0, -1.0)));
    }

    #[test]
    fn walls_enclose_without_touching_interior() {
        let bounds = Bounds::new(40.0, 10.0, 40.0);
        let walls = OrientedBox::walls_around(&bounds, 1.0);
        let inside = OrientedBox::axis_aligned(Vec3::new(20.0, 1.0, 20.0), Vec3::splat(19.0));
        for wall in &walls {
            assert!(!wall.overlaps(&inside));
        }
        let poking_out = OrientedBox::axis_aligned(Vec3::new(0.5, 1.0, 20.0), Vec3::splat(1.0));
        assert!(walls[0].overlaps(&poking_out));
    }

    proptest! {
        #[test]
        fn overlap_is_symmetric(
            ax in 0.0f32..10.0, az in 0.0f32..10.0,
            bx in 0.0f32..10.0, bz in 0.0f32..10.0,
            ha in 0.1f32..3.0, hb in 0.1f32..3.0,
            ra in 0.0f32..6.28, rb in 0.0f32..6.28,
        ) {
            let a = OrientedBox::new(Vec3::new(ax, 1.0, az), Vec3::new(ha, 1.0, ha * 0.5), Quat::from_rotation_y(ra));
            let b = OrientedBox::new(Vec3::new(bx, 1.0, bz), Vec3::new(hb * 0.5, 1.0, hb), Quat::from_rotation_y(rb));
            prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        }

        #[test]
        fn overlap_implies_aabb_overlap(
            ax in 0.0f32..10.0, az in 0.0f32..10.0,
            bx in 0.0f32..10.0, bz in 0.0f32..10.0,
            ra in 0.0f32..6.28, rb in 0.0f32..6.28,
        ) {
            let a = OrientedBox::new(Vec3::new(ax, 1.0, az), Vec3::new(1.5, 1.0, 0.5), Quat::from_rotation_y(ra));
            let b = OrientedBox::new(Vec3::new(bx, 1.0, bz), Vec3::new(0.5, 1.0, 1.5), Quat::from_rotation_y(rb));
            if a.overlaps(&b) {
                prop_assert!(a.aabb().intersects(&b.aabb()));
            }
        }

        #[test]
        fn shared_center_always_overlaps(
            x in 0.0f32..10.0, z in 0.0f32..10.0,
            ra in 0.0f32..6.28, rb in 0.0f32..6.28,
        ) {
            let a = OrientedBox::new(Vec3::new(x, 1.0, z), Vec3::splat(0.5), Quat::from_rotation_y(ra));
            let b = OrientedBox::new(Vec3::new(x, 1.0, z), Vec3::splat(0.3), Quat::from_rotation_y(rb));
            prop_assert!(a.overlaps(&b));
        }
    }
}
