//! Entity module: identities, tags and instantiated entities.
//!
//! This module provides the entity types the arena builder produces:
//! - [`EntityId`]: Unique identifier for a spawned entity
//! - [`EntityTag`]: Gameplay classification (agent, goals, walls, zones)
//! - [`BehaviorState`]: Optional behaviour parameters applied through the
//!   [`ParameterRegistry`](crate::capability::ParameterRegistry)
//! - [`SpawnedEntity`]: A placed instance of an [`EntityTemplate`]
//!
//! Templates and placement policies live in [`template`].
//!
//! # Example
//!
//! ```
//! use paddock_core::entity::{EntityId, EntityTag};
//!
//! let id = EntityId::new(42);
//! assert_eq!(id.as_u64(), 42);
//! assert!(EntityTag::GoodGoalMulti.is_countable_goal());
//! assert!(!EntityTag::GoodGoal.is_countable_goal());
//! ```

pub mod template;

use std::fmt;

use corral::BodyId;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::capability::Capabilities;
use crate::placement::PositionRotation;

pub use template::{
    CollisionTolerance, EntityTemplate, PlacementPolicy, PolicyRules, TemplateCatalog,
    TemplateRegistry, VerticalRule, SUNKEN_DEPTH,
};

/// Unique identifier for a spawned entity.
///
/// Entity IDs are assigned monotonically by the [`Scene`](crate::scene::Scene)
/// and never reused, so ordering by ID is spawn order.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new `EntityId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

/// Gameplay classification of an entity.
///
/// The tag decides goal-ledger membership; placement behaviour is decided
/// separately by the template's [`PlacementPolicy`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityTag {
    /// The learning agent
    Agent,
    /// Single reward that ends the episode
    GoodGoal,
    /// One of a group of rewards that must all be collected
    GoodGoalMulti,
    /// Negative reward
    BadGoal,
    /// Static obstacle
    Wall,
    /// Floor zone with an effect while the agent stands in it
    Zone,
    /// Anything else: spawners, signs, buttons, ramps
    Prop,
}

impl EntityTag {
    /// Returns true if placed instances are counted in the goal ledger.
    #[must_use]
    pub const fn is_countable_goal(self) -> bool {
        matches!(self, Self::GoodGoalMulti)
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Agent => write!(f, "agent"),
            Self::GoodGoal => write!(f, "goodGoal"),
            Self::GoodGoalMulti => write!(f, "goodGoalMulti"),
            Self::BadGoal => write!(f, "badGoal"),
            Self::Wall => write!(f, "wall"),
            Self::Zone => write!(f, "zone"),
            Self::Prop => write!(f, "prop"),
        }
    }
}

/// Behaviour parameters of an instantiated entity.
///
/// Every field starts unset; the parameter registry fills in the ones the
/// entity's capabilities support. Unset means "use the entity's own default".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BehaviorState {
    /// Seconds before the behaviour starts
    pub delay: Option<f32>,
    /// Starting reward/size for value-changing goals
    pub initial_value: Option<f32>,
    /// Final reward/size for value-changing goals
    pub final_value: Option<f32>,
    /// Change per step for value-changing goals
    pub change_rate: Option<f32>,
    /// Number of rewards a spawner produces (negative: unlimited)
    pub spawn_count: Option<f32>,
    /// Colour of spawned rewards
    pub spawn_color: Option<Vec3>,
    /// Seconds between spawns
    pub time_between_spawns: Option<f32>,
    /// Seconds before a tree's fruit ripens
    pub ripen_time: Option<f32>,
    /// Seconds before a dispenser door first opens
    pub door_delay: Option<f32>,
    /// Seconds between door openings (negative: never)
    pub time_between_door_opens: Option<f32>,
    /// Seconds a moving part takes to travel
    pub move_duration: Option<f32>,
    /// Seconds a moving part takes to return
    pub reset_duration: Option<f32>,
    /// Seconds the agent is frozen at episode start
    pub frozen_agent_delay: Option<f32>,
    /// Probability a button press spawns a reward
    pub spawn_probability: Option<f32>,
    /// Maximum rewards a button may spawn (negative: unlimited)
    pub max_reward_count: Option<f32>,
    /// Where button rewards appear
    pub reward_spawn_position: Option<Vec3>,
    /// Which reward a button spawns
    pub reward_name: Option<String>,
    /// Symbol drawn on a sign board
    pub symbol_name: Option<String>,
    /// Agent skin
    pub skin: Option<String>,
    /// Whether a zone is rendered
    pub zone_visible: Option<bool>,
}

/// A placed instance of an entity template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnedEntity {
    id: EntityId,
    name: String,
    tag: EntityTag,
    capabilities: Capabilities,
    body: BodyId,
    transform: PositionRotation,
    size: Vec3,
    color: Vec3,
    active: bool,
    number_of_goals: Option<usize>,
    /// Behaviour parameters applied after placement.
    pub behavior: BehaviorState,
}

impl SpawnedEntity {
    /// Creates an inactive entity for `template`, backed by collider `body`.
    #[must_use]
    pub fn new(id: EntityId, template: &EntityTemplate, body: BodyId) -> Self {
        Self {
            id,
            name: template.name.clone(),
            tag: template.tag,
            capabilities: template.capabilities,
            body,
            transform: PositionRotation::default(),
            size: Vec3::ZERO,
            color: template.default_color,
            active: false,
            number_of_goals: None,
            behavior: BehaviorState::default(),
        }
    }

    /// Returns the entity's unique ID.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the name of the template this entity was built from.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the entity's tag.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        self.tag
    }

    /// Returns the capabilities inherited from the template.
    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Returns the collider body backing this entity.
    #[must_use]
    pub const fn body(&self) -> BodyId {
        self.body
    }

    /// Returns the placed position and rotation.
    #[must_use]
    pub const fn transform(&self) -> PositionRotation {
        self.transform
    }

    /// Returns the applied size.
    #[must_use]
    pub const fn size(&self) -> Vec3 {
        self.size
    }

    /// Returns the applied colour (RGB, 0-255 per channel).
    #[must_use]
    pub const fn color(&self) -> Vec3 {
        self.color
    }

    /// Returns true once the entity has a valid placement.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Returns true if this is the agent.
    #[must_use]
    pub fn is_agent(&self) -> bool {
        self.tag == EntityTag::Agent
    }

    /// Returns the size of this entity's goal group, if it belongs to one.
    #[must_use]
    pub const fn number_of_goals(&self) -> Option<usize> {
        self.number_of_goals
    }

    pub(crate) fn place(&mut self, transform: PositionRotation, size: Vec3, color: Vec3) {
        self.transform = transform;
        self.size = size;
        self.color = color;
        self.active = true;
    }

    pub(crate) fn set_number_of_goals(&mut self, total: usize) {
        self.number_of_goals = Some(total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_ordering_and_format() {
        let a = EntityId::new(1);
        let b = EntityId::new(2);
        assert!(a < b);
        assert_eq!(format!("{a:?}"), "EntityId(1)");
        assert_eq!(b.to_string(), "2");
        assert_eq!(EntityId::from(9).as_u64(), 9);
    }

    #[test]
    fn only_multi_goals_are_counted() {
        for tag in [
            EntityTag::Agent,
            EntityTag::GoodGoal,
            EntityTag::BadGoal,
            EntityTag::Wall,
            EntityTag::Zone,
            EntityTag::Prop,
        ] {
            assert!(!tag.is_countable_goal(), "{tag} should not be counted");
        }
        assert!(EntityTag::GoodGoalMulti.is_countable_goal());
    }

    #[test]
    fn new_entity_is_inactive_with_template_defaults() {
        let template = EntityTemplate::new("GoodGoalMulti", EntityTag::GoodGoalMulti, PlacementPolicy::Centered)
            .with_default_color(Vec3::new(255.0, 215.0, 0.0));
        let entity = SpawnedEntity::new(EntityId::new(3), &template, BodyId::new(7));

        assert!(!entity.is_active());
        assert_eq!(entity.name(), "GoodGoalMulti");
        assert_eq!(entity.color(), Vec3::new(255.0, 215.0, 0.0));
        assert_eq!(entity.body(), BodyId::new(7));
        assert_eq!(entity.number_of_goals(), None);
        assert_eq!(entity.behavior, BehaviorState::default());
    }

    #[test]
    fn place_activates_entity() {
        let template = EntityTemplate::new("Wall", EntityTag::Wall, PlacementPolicy::Grounded);
        let mut entity = SpawnedEntity::new(EntityId::new(0), &template, BodyId::new(0));
        let at = PositionRotation::new(Vec3::new(1.0, 0.0, 2.0), Vec3::new(0.0, 90.0, 0.0));

        entity.place(at, Vec3::ONE, Vec3::splat(100.0));

        assert!(entity.is_active());
        assert_eq!(entity.transform(), at);
        assert_eq!(entity.size(), Vec3::ONE);
    }
}
