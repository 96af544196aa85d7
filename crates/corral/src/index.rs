//! Collider index: body storage and overlap queries.
//!
//! The index keeps bodies in a `BTreeMap` keyed by [`BodyId`] so that query
//! results come back in a deterministic order (insertion order). A linear
//! sweep with an AABB pre-check is plenty for arena-sized body counts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::body::{Body, BodyId, BodyKind, Layer};
use crate::obb::OrientedBox;

/// One body found by an overlap query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overlap {
    /// The overlapping body
    pub body: BodyId,
    /// Its kind, so callers can apply tolerance rules without a second lookup
    pub kind: BodyKind,
}

/// Spatial-query capability: find bodies overlapping an oriented box.
///
/// Implementations must return hits in a deterministic order.
pub trait OverlapQuery {
    /// Returns every body on a layer in `mask` whose shape overlaps `query`.
    fn overlapping(&self, query: &OrientedBox, mask: Layer) -> Vec<Overlap>;
}

/// Storage for the bodies of one arena.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColliderIndex {
    /// Monotonically increasing body ID counter.
    next_id: u64,
    /// Bodies in deterministic order.
    bodies: BTreeMap<BodyId, Body>,
}

impl ColliderIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 0,
            bodies: BTreeMap::new(),
        }
    }

    /// Registers a body and returns its ID.
    pub fn insert(&mut self, kind: BodyKind, layer: Layer, shape: OrientedBox) -> BodyId {
        let id = BodyId::new(self.next_id);
        self.next_id += 1;
        self.bodies.insert(
            id,
            Body {
                id,
                kind,
                layer,
                shape,
            },
        );
        id
    }

    /// Removes a body, returning it if it existed.
    pub fn remove(&mut self, id: BodyId) -> Option<Body> {
        self.bodies.remove(&id)
    }

    /// Returns a body by ID.
    #[must_use]
    pub fn get(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    /// Moves a body to another layer. Returns false if the body is unknown.
    pub fn set_layer(&mut self, id: BodyId, layer: Layer) -> bool {
        match self.bodies.get_mut(&id) {
            Some(body) => {
                body.layer = layer;
                true
            }
            None => false,
        }
    }

    /// Replaces a body's shape. Returns false if the body is unknown.
    pub fn set_shape(&mut self, id: BodyId, shape: OrientedBox) -> bool {
        match self.bodies.get_mut(&id) {
            Some(body) => {
                body.shape = shape;
                true
            }
            None => false,
        }
    }

    /// Keeps only the bodies for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&Body) -> bool) {
        self.bodies.retain(|_, body| keep(body));
    }

    /// Iterates over bodies in ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Body> + '_ {
        self.bodies.values()
    }

    /// Returns the number of registered bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Returns true if no bodies are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Returns the ID the next inserted body will receive.
    #[must_use]
    pub fn next_id(&self) -> BodyId {
        BodyId::new(self.next_id)
    }
}

impl OverlapQuery for ColliderIndex {
    fn overlapping(&self, query: &OrientedBox, mask: Layer) -> Vec<Overlap> {
        let query_aabb = query.aabb();
        self.bodies
            .values()
            .filter(|body| mask.intersects(body.layer))
            .filter(|body| body.shape.aabb().intersects(&query_aabb))
            .filter(|body| body.shape.overlaps(query))
            .map(|body| Overlap {
                body: body.id,
                kind: body.kind,
            })
            .collect()
    }
}
