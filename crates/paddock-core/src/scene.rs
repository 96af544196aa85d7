//! The scene: spawned entities and the colliders backing them.
//!
//! # Architecture
//!
//! The scene keeps entities in a `BTreeMap` keyed by [`EntityId`]. IDs are
//! assigned monotonically, so iteration order is spawn order on every
//! platform. Each entity owns exactly one body in the scene's
//! [`ColliderIndex`], and four boundary walls enclose the arena floor.
//!
//! # Entity lifecycle
//!
//! ```text
//! instantiate ──► STAGING layer (invisible to placement queries)
//!     │
//!     ├── activate ──► ACTIVE layer, pose/size/colour applied
//!     │
//!     └── despawn  ──► entity and body removed
//! ```
//!
//! An entity waiting on the staging layer does not block its own placement.
//!
//! # Example
//!
//! ```
//! use paddock_core::config::ArenaBounds;
//! use paddock_core::entity::{TemplateCatalog, TemplateRegistry};
//! use paddock_core::scene::Scene;
//!
//! let mut scene = Scene::new(ArenaBounds::default());
//! let wall = TemplateCatalog::standard().resolve("Wall").unwrap();
//!
//! let id = scene.instantiate(&wall);
//! assert!(!scene.get(id).unwrap().is_active());
//!
//! scene.despawn(id);
//! assert_eq!(scene.entity_count(), 0);
//! ```

use std::collections::BTreeMap;

use corral::{BodyKind, ColliderIndex, Layer, OrientedBox};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::ArenaBounds;
use crate::entity::{EntityId, EntityTemplate, SpawnedEntity};
use crate::placement::Placement;

/// Thickness of the boundary walls.
pub const WALL_THICKNESS: f32 = 1.0;

/// Spawned entities of one arena and their collision bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    bounds: ArenaBounds,
    /// Monotonically increasing entity ID counter.
    next_id: u64,
    /// Entity storage with deterministic iteration order.
    entities: BTreeMap<EntityId, SpawnedEntity>,
    colliders: ColliderIndex,
    /// Successful activations over the scene's lifetime.
    total_spawned: u64,
}

impl Scene {
    /// Creates an empty scene enclosed by boundary walls.
    #[must_use]
    pub fn new(bounds: ArenaBounds) -> Self {
        let mut colliders = ColliderIndex::new();
        for wall in OrientedBox::walls_around(&bounds.as_bounds(), WALL_THICKNESS) {
            colliders.insert(BodyKind::Boundary, Layer::ACTIVE, wall);
        }
        Self {
            bounds,
            next_id: 0,
            entities: BTreeMap::new(),
            colliders,
            total_spawned: 0,
        }
    }

    /// Creates an inactive entity for `template` on the staging layer.
    pub fn instantiate(&mut self, template: &EntityTemplate) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;

        let shape = OrientedBox::axis_aligned(Vec3::ZERO, template.half_extents(template.size_range.0));
        let body = self.colliders.insert(template.body_kind(), Layer::STAGING, shape);
        self.entities.insert(id, SpawnedEntity::new(id, template, body));
        id
    }

    /// Applies a placement and moves the entity onto the active layer.
    ///
    /// Returns false if `id` is unknown.
    pub fn activate(&mut self, id: EntityId, placement: &Placement, color: Vec3) -> bool {
        let Some(entity) = self.entities.get_mut(&id) else {
            return false;
        };
        entity.place(placement.at, placement.size, color);
        let body = entity.body();
        self.colliders.set_shape(body, placement.shape);
        self.colliders.set_layer(body, Layer::ACTIVE);
        self.total_spawned += 1;
        true
    }

    /// Removes an entity and its body.
    pub fn despawn(&mut self, id: EntityId) -> Option<SpawnedEntity> {
        let entity = self.entities.remove(&id)?;
        self.colliders.remove(entity.body());
        Some(entity)
    }

    /// Removes every spawned entity. The boundary walls remain.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.colliders.retain(|body| body.kind == BodyKind::Boundary);
    }

    /// Returns a reference to an entity by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&SpawnedEntity> {
        self.entities.get(&id)
    }

    /// Returns a mutable reference to an entity by ID.
    #[must_use]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut SpawnedEntity> {
        self.entities.get_mut(&id)
    }

    /// Returns an iterator over entity IDs in spawn order.
    pub fn entity_ids_sorted(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Returns an iterator over entities in spawn order.
    pub fn entities_sorted(&self) -> impl Iterator<Item = &SpawnedEntity> + '_ {
        self.entities.values()
    }

    /// Returns the number of entities currently in the scene.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns the number of successful placements since the scene was created.
    #[must_use]
    pub const fn spawned_count(&self) -> u64 {
        self.total_spawned
    }

    /// Returns true if an active agent is in the scene.
    #[must_use]
    pub fn has_agent(&self) -> bool {
        self.entities.values().any(|e| e.is_agent() && e.is_active())
    }

    /// Returns the collider index.
    #[must_use]
    pub fn colliders(&self) -> &ColliderIndex {
        &self.colliders
    }

    /// Returns the arena bounds.
    #[must_use]
    pub const fn bounds(&self) -> &ArenaBounds {
        &self.bounds
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(ArenaBounds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityTag, PlacementPolicy};
    use crate::placement::PositionRotation;
    use corral::OverlapQuery;

    fn crate_template() -> EntityTemplate {
        EntityTemplate::new("Cardbox1", EntityTag::Prop, PlacementPolicy::Grounded)
    }

    fn placement_at(x: f32, z: f32) -> Placement {
        let at = PositionRotation::new(Vec3::new(x, 0.0, z), Vec3::ZERO);
        Placement {
            at,
            size: Vec3::ONE,
            shape: OrientedBox::axis_aligned(Vec3::new(x, 0.5, z), Vec3::splat(0.5)),
            attempts: 1,
        }
    }

    #[test]
    fn new_scene_has_only_walls() {
        let scene = Scene::default();
        assert_eq!(scene.entity_count(), 0);
        assert_eq!(scene.colliders().len(), 4);
        assert!(scene
            .colliders()
            .iter()
            .all(|b| b.kind == BodyKind::Boundary && b.layer == Layer::ACTIVE));
    }

    #[test]
    fn staged_entities_are_invisible_until_activated() {
        let mut scene = Scene::default();
        let id = scene.instantiate(&crate_template());
        let query = OrientedBox::axis_aligned(Vec3::new(10.0, 0.5, 10.0), Vec3::splat(0.25));

        assert!(scene.colliders().overlapping(&query, Layer::ACTIVE).is_empty());

        assert!(scene.activate(id, &placement_at(10.0, 10.0), Vec3::splat(50.0)));
        let hits = scene.colliders().overlapping(&query, Layer::ACTIVE);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].body, scene.get(id).unwrap().body());

        let entity = scene.get(id).unwrap();
        assert!(entity.is_active());
        assert_eq!(entity.color(), Vec3::splat(50.0));
        assert_eq!(scene.spawned_count(), 1);
    }

    #[test]
    fn despawn_removes_body() {
        let mut scene = Scene::default();
        let id = scene.instantiate(&crate_template());
        assert_eq!(scene.colliders().len(), 5);

        let removed = scene.despawn(id).unwrap();
        assert_eq!(removed.id(), id);
        assert_eq!(scene.colliders().len(), 4);
        assert!(scene.despawn(id).is_none());
        assert!(!scene.activate(id, &placement_at(1.0, 1.0), Vec3::ZERO));
    }

    #[test]
    fn clear_keeps_walls_and_ids_keep_increasing() {
        let mut scene = Scene::default();
        let first = scene.instantiate(&crate_template());
        scene.activate(first, &placement_at(5.0, 5.0), Vec3::ZERO);
        scene.clear();

        assert_eq!(scene.entity_count(), 0);
        assert_eq!(scene.colliders().len(), 4);
        assert_eq!(scene.spawned_count(), 1);

        let second = scene.instantiate(&crate_template());
        assert!(second > first);
    }

    #[test]
    fn has_agent_requires_active_agent() {
        let agent = EntityTemplate::new("Agent", EntityTag::Agent, PlacementPolicy::Agent);
        let mut scene = Scene::default();
        let id = scene.instantiate(&agent);
        assert!(!scene.has_agent());
        scene.activate(id, &placement_at(20.0, 20.0), Vec3::ZERO);
        assert!(scene.has_agent());
    }
}
