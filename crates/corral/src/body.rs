//! Collider bodies: identity, kind and collision layer.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::obb::OrientedBox;

/// Unique identifier for a body in a [`ColliderIndex`](crate::ColliderIndex).
///
/// Body IDs are assigned monotonically and never reused within an index, so
/// ordering by ID is insertion order.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(u64);

impl BodyId {
    /// Creates a new `BodyId` from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BodyId({})", self.0)
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a body participates in placement checks.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyKind {
    /// Solid obstacle (walls, ramps, goals with physical colliders)
    Solid,
    /// Trigger volume other objects may overlap (zones, pass-through goals)
    PassThrough,
    /// The arena's enclosing walls
    Boundary,
    /// The agent's own body
    Agent,
}

impl BodyKind {
    /// Returns true if nothing may be placed inside this body.
    #[must_use]
    pub const fn is_solid(self) -> bool {
        !matches!(self, Self::PassThrough)
    }

    /// Returns true if this body is a trigger volume.
    #[must_use]
    pub const fn is_pass_through(self) -> bool {
        matches!(self, Self::PassThrough)
    }
}

impl fmt::Display for BodyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Solid => write!(f, "Solid"),
            Self::PassThrough => write!(f, "PassThrough"),
            Self::Boundary => write!(f, "Boundary"),
            Self::Agent => write!(f, "Agent"),
        }
    }
}

bitflags! {
    /// Collision layers.
    ///
    /// A body lives on exactly one layer; queries take a mask of the layers
    /// they want to see. Bodies that are still being placed live on
    /// `STAGING` so they never collide with themselves.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Layer: u8 {
        /// Placed bodies that take part in collision queries.
        const ACTIVE = 0b0000_0001;
        /// Bodies awaiting a valid placement.
        const STAGING = 0b0000_0010;
    }
}

/// A body registered in a collider index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Unique identifier
    pub id: BodyId,
    /// Placement semantics
    pub kind: BodyKind,
    /// Current collision layer
    pub layer: Layer,
    /// World-space shape
    pub shape: OrientedBox,
}
