//! Placement sampling: the bounded retry loop that finds a collision-free
//! pose for one entity.
//!
//! Requested values use negative components as a "randomize" sentinel:
//!
//! - **Size**: a negative component is drawn uniformly from the template's
//!   size range; explicit components are clamped into it.
//! - **Position**: a negative x or z is drawn uniformly from
//!   `[half_extent, range - half_extent]`; explicit values are clamped into
//!   `[0, range]`. The vertical axis is never randomized; it follows the
//!   template's [`VerticalRule`](crate::entity::VerticalRule).
//! - **Rotation**: a negative yaw is drawn from the template's rotation range.
//!
//! Each attempt queries the collider index on the active layer and asks the
//! template's [`CollisionTolerance`](crate::entity::CollisionTolerance)
//! whether the hits are acceptable. A request without any sentinel resolves
//! to the same pose every time, so it gets a single attempt.

use corral::{Layer, OrientedBox, OverlapQuery};
use glam::{EulerRot, Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::ArenaBounds;
use crate::entity::EntityTemplate;

/// Sentinel for "randomize every component".
pub const RANDOMIZE: Vec3 = Vec3::NEG_ONE;

/// A position paired with Euler rotation angles in degrees.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionRotation {
    position: Vec3,
    rotation: Vec3,
}

impl PositionRotation {
    /// Creates a pose from a position and Euler angles in degrees.
    #[must_use]
    pub const fn new(position: Vec3, rotation: Vec3) -> Self {
        Self { position, rotation }
    }

    /// Returns the position (pivot, not box center).
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Returns the Euler angles in degrees: pitch, yaw, roll.
    #[must_use]
    pub const fn rotation(&self) -> Vec3 {
        self.rotation
    }

    /// Returns the rotation as a quaternion (yaw, then pitch, then roll).
    #[must_use]
    pub fn quat(&self) -> Quat {
        euler_to_quat(self.rotation)
    }
}

fn euler_to_quat(degrees: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        degrees.y.to_radians(),
        degrees.x.to_radians(),
        degrees.z.to_radians(),
    )
}

/// What a configuration asks for one instance.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementRequest {
    /// Requested position; negative x/z are randomized
    pub position: Vec3,
    /// Requested Euler angles in degrees; a negative yaw is randomized
    pub rotation: Vec3,
    /// Requested size; negative components are randomized
    pub size: Vec3,
}

impl Default for PlacementRequest {
    fn default() -> Self {
        Self {
            position: RANDOMIZE,
            rotation: RANDOMIZE,
            size: RANDOMIZE,
        }
    }
}

impl PlacementRequest {
    /// Returns true if every attempt would resolve to the same pose.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.position.x >= 0.0
            && self.position.z >= 0.0
            && self.rotation.y >= 0.0
            && self.size.cmpge(Vec3::ZERO).all()
    }
}

/// A successful placement.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Final pivot position and rotation
    pub at: PositionRotation,
    /// Final size
    pub size: Vec3,
    /// Collision box at the final pose
    pub shape: OrientedBox,
    /// Attempts used, including the successful one
    pub attempts: u32,
}

/// Placement failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlacementError {
    /// Every attempt collided with something the entity may not overlap.
    #[error("no valid placement after {attempts} attempts")]
    Exhausted {
        /// Attempts performed before giving up.
        attempts: u32,
    },
}

/// Searches for a valid pose for one instance of `template`.
///
/// Performs at most `max_attempts` samples; `max_attempts == 0` fails
/// without probing.
///
/// # Errors
///
/// Returns [`PlacementError::Exhausted`] if no sampled pose is acceptable.
pub fn sample_placement<Q, R>(
    query: &Q,
    bounds: &ArenaBounds,
    template: &EntityTemplate,
    request: &PlacementRequest,
    max_attempts: u32,
    rng: &mut R,
) -> Result<Placement, PlacementError>
where
    Q: OverlapQuery + ?Sized,
    R: Rng + ?Sized,
{
    let rules = template.rules();
    let single_shot = request.is_deterministic();

    for attempt in 1..=max_attempts {
        let size = resolve_size(template, request.size, rng);
        let half = template.half_extents(size);

        let x = resolve_axis(request.position.x, half.x, bounds.width(), rng);
        let z = resolve_axis(request.position.z, half.z, bounds.depth(), rng);
        let base_y = request.position.y.max(0.0);
        let (pivot_y, center_y) = rules.vertical.resolve(base_y, half.y);

        let rotation = resolve_rotation(template, request.rotation, rng);
        let shape = OrientedBox::new(Vec3::new(x, center_y, z), half, euler_to_quat(rotation));

        let hits = query.overlapping(&shape, Layer::ACTIVE);
        if rules.tolerance.accepts(&hits) {
            return Ok(Placement {
                at: PositionRotation::new(Vec3::new(x, pivot_y, z), rotation),
                size,
                shape,
                attempts: attempt,
            });
        }

        debug!(
            template = %template.name,
            attempt,
            blocked_by = hits.len(),
            "placement attempt rejected"
        );

        if single_shot {
            return Err(PlacementError::Exhausted { attempts: attempt });
        }
    }

    Err(PlacementError::Exhausted {
        attempts: max_attempts,
    })
}

/// Resolves a requested colour: negative channels become a random 0-255 value.
pub fn resolve_color<R: Rng + ?Sized>(requested: Vec3, rng: &mut R) -> Vec3 {
    let mut channel = |c: f32| {
        if c < 0.0 {
            f32::from(rng.gen_range(0u8..=255))
        } else {
            c
        }
    };
    Vec3::new(channel(requested.x), channel(requested.y), channel(requested.z))
}

/// Resolves a requested size against the template's size range.
pub fn resolve_size<R: Rng + ?Sized>(template: &EntityTemplate, requested: Vec3, rng: &mut R) -> Vec3 {
    let (min, max) = template.size_range;
    let mut axis = |req: f32, lo: f32, hi: f32| {
        if req < 0.0 {
            uniform(rng, lo, hi)
        } else {
            req.max(lo).min(hi)
        }
    };
    Vec3::new(
        axis(requested.x, min.x, max.x),
        axis(requested.y, min.y, max.y),
        axis(requested.z, min.z, max.z),
    )
}

/// Resolves a requested rotation: a negative yaw is randomized within the
/// template's rotation range and negative pitch/roll fall back to zero.
pub fn resolve_rotation<R: Rng + ?Sized>(template: &EntityTemplate, requested: Vec3, rng: &mut R) -> Vec3 {
    if requested.y >= 0.0 {
        return requested;
    }
    let (lo, hi) = template.rotation_range;
    Vec3::new(requested.x.max(0.0), uniform(rng, lo, hi), requested.z.max(0.0))
}

fn resolve_axis<R: Rng + ?Sized>(requested: f32, half: f32, range: f32, rng: &mut R) -> f32 {
    if requested >= 0.0 {
        return requested.min(range);
    }
    let (lo, hi) = (half, range - half);
    if lo > hi {
        range * 0.5
    } else {
        uniform(rng, lo, hi)
    }
}

fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo {
        rng.gen_range(lo..=hi)
    } else {
        lo
    }
}
