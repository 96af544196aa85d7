//! Entity templates, placement policies and template resolution.
//!
//! A template carries everything placement needs to know about an entity
//! type: its bounding geometry, size and rotation ranges, solidity and which
//! optional parameters it understands.
//!
//! # Placement policies
//!
//! Entity types differ in placement only by two rules: where they sit
//! vertically and which collisions they tolerate. [`PlacementPolicy::rules`]
//! is the single table mapping each policy to those rules:
//!
//! | Policy     | Vertical              | Tolerance  |
//! |------------|-----------------------|------------|
//! | `Grounded` | `Ground`              | `Standard` |
//! | `Sunken`   | `BelowGround(0.15)`   | `Standard` |
//! | `Centered` | `Centered`            | `Standard` |
//! | `Zone`     | `BelowGround(0.15)`   | `Zone`     |
//! | `Agent`    | `Centered`            | `Strict`   |

use std::collections::BTreeMap;

use corral::{BodyKind, Overlap};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::capability::Capabilities;
use crate::entity::EntityTag;

/// Depth below the floor at which sunken entities and zones sit.
pub const SUNKEN_DEPTH: f32 = 0.15;

// =============================================================================
// Placement rules
// =============================================================================

/// Where an entity sits vertically relative to its requested base height.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum VerticalRule {
    /// Pivot at the base; the body rests on the floor.
    Ground,
    /// Pivot sunk below the base by a fixed offset.
    BelowGround(f32),
    /// Pivot at the body's center, half a height above the base.
    Centered,
}

impl VerticalRule {
    /// Resolves `(pivot_y, center_y)` for a body of `half_height` placed at `base_y`.
    #[must_use]
    pub fn resolve(self, base_y: f32, half_height: f32) -> (f32, f32) {
        match self {
            Self::Ground => (base_y, base_y + half_height),
            Self::BelowGround(depth) => {
                let pivot = base_y - depth;
                (pivot, pivot + half_height)
            }
            Self::Centered => {
                let center = base_y + half_height;
                (center, center)
            }
        }
    }
}

/// Which existing bodies a candidate placement may overlap.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionTolerance {
    /// Pass-through bodies only.
    Standard,
    /// Anything except solid obstacles: boundary walls, triggers and the agent
    /// are tolerated.
    Zone,
    /// Nothing at all. Used for the agent.
    Strict,
}

impl CollisionTolerance {
    /// Returns true if a candidate overlapping `hits` is acceptable.
    #[must_use]
    pub fn accepts(self, hits: &[Overlap]) -> bool {
        match self {
            Self::Standard => hits.iter().all(|hit| hit.kind.is_pass_through()),
            Self::Zone => hits.iter().all(|hit| hit.kind != BodyKind::Solid),
            Self::Strict => hits.is_empty(),
        }
    }
}

/// The two rules a placement policy selects.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRules {
    /// Vertical offset rule
    pub vertical: VerticalRule,
    /// Collision tolerance rule
    pub tolerance: CollisionTolerance,
}

/// Placement behaviour variant of an entity type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementPolicy {
    /// Rests on the floor (walls, ramps, crates, spawners)
    Grounded,
    /// Partly below the floor (platform-like props)
    Sunken,
    /// Floats at its own center (goals)
    Centered,
    /// Floor zone that may overlap the arena walls
    Zone,
    /// The agent
    Agent,
}

impl PlacementPolicy {
    /// Returns the placement rules for this policy.
    #[must_use]
    pub const fn rules(self) -> PolicyRules {
        match self {
            Self::Grounded => PolicyRules {
                vertical: VerticalRule::Ground,
                tolerance: CollisionTolerance::Standard,
            },
            Self::Sunken => PolicyRules {
                vertical: VerticalRule::BelowGround(SUNKEN_DEPTH),
                tolerance: CollisionTolerance::Standard,
            },
            Self::Centered => PolicyRules {
                vertical: VerticalRule::Centered,
                tolerance: CollisionTolerance::Standard,
            },
            Self::Zone => PolicyRules {
                vertical: VerticalRule::BelowGround(SUNKEN_DEPTH),
                tolerance: CollisionTolerance::Zone,
            },
            Self::Agent => PolicyRules {
                vertical: VerticalRule::Centered,
                tolerance: CollisionTolerance::Strict,
            },
        }
    }
}

// =============================================================================
// Entity template
// =============================================================================

/// Everything placement needs to know about an entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTemplate {
    /// Name used to resolve the template from a configuration
    pub name: String,
    /// Gameplay tag
    pub tag: EntityTag,
    /// Placement behaviour
    pub policy: PlacementPolicy,
    /// Inclusive `(min, max)` size per axis
    pub size_range: (Vec3, Vec3),
    /// Size used when a configuration gives none; `None` randomizes
    pub default_size: Option<Vec3>,
    /// Inclusive `(min, max)` yaw in degrees for randomized rotations
    pub rotation_range: (f32, f32),
    /// Colour used when a configuration gives none (RGB, 0-255)
    pub default_color: Vec3,
    /// Bounding extents of the geometry at size 1
    pub extent_scale: Vec3,
    /// Whether other objects are blocked by this entity
    pub solid: bool,
    /// Optional parameters this entity understands
    pub capabilities: Capabilities,
}

impl EntityTemplate {
    /// Creates a solid unit-size template with no capabilities.
    #[must_use]
    pub fn new(name: &str, tag: EntityTag, policy: PlacementPolicy) -> Self {
        Self {
            name: name.to_string(),
            tag,
            policy,
            size_range: (Vec3::ONE, Vec3::ONE),
            default_size: None,
            rotation_range: (0.0, 360.0),
            default_color: Vec3::splat(255.0),
            extent_scale: Vec3::ONE,
            solid: true,
            capabilities: Capabilities::empty(),
        }
    }

    /// Set the inclusive size range.
    #[must_use]
    pub fn with_size_range(mut self, min: Vec3, max: Vec3) -> Self {
        self.size_range = (min.min(max), min.max(max));
        self
    }

    /// Set a fixed size, used both as range and as default.
    #[must_use]
    pub fn with_fixed_size(mut self, size: Vec3) -> Self {
        self.size_range = (size, size);
        self.default_size = Some(size);
        self
    }

    /// Set the size used when none is configured.
    #[must_use]
    pub fn with_default_size(mut self, size: Vec3) -> Self {
        self.default_size = Some(size);
        self
    }

    /// Set the yaw range for randomized rotations.
    #[must_use]
    pub fn with_rotation_range(mut self, min: f32, max: f32) -> Self {
        self.rotation_range = (min.min(max), min.max(max));
        self
    }

    /// Set the default colour.
    #[must_use]
    pub fn with_default_color(mut self, color: Vec3) -> Self {
        self.default_color = color;
        self
    }

    /// Set the geometry's extents at size 1.
    #[must_use]
    pub fn with_extent_scale(mut self, scale: Vec3) -> Self {
        self.extent_scale = scale;
        self
    }

    /// Mark the template as pass-through.
    #[must_use]
    pub fn pass_through(mut self) -> Self {
        self.solid = false;
        self
    }

    /// Set the capability set.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Returns the placement rules of this template's policy.
    #[must_use]
    pub const fn rules(&self) -> PolicyRules {
        self.policy.rules()
    }

    /// Returns the collider kind instances of this template register as.
    #[must_use]
    pub fn body_kind(&self) -> BodyKind {
        if self.policy == PlacementPolicy::Agent {
            BodyKind::Agent
        } else if self.solid {
            BodyKind::Solid
        } else {
            BodyKind::PassThrough
        }
    }

    /// Returns true if this template describes the agent.
    #[must_use]
    pub fn is_agent(&self) -> bool {
        self.tag == EntityTag::Agent
    }

    /// Returns the half-extents of the bounding box at `size`.
    #[must_use]
    pub fn half_extents(&self, size: Vec3) -> Vec3 {
        size * self.extent_scale * 0.5
    }
}

// =============================================================================
// Template resolution
// =============================================================================

/// Resolves entity templates by name.
///
/// This is the boundary to whatever stores the actual entity prefabs; the
/// builder only ever asks for a template by its configured name.
pub trait TemplateRegistry {
    /// Returns the template registered under `name`, if any.
    fn resolve(&self, name: &str) -> Option<EntityTemplate>;
}

/// In-memory template registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateCatalog {
    templates: BTreeMap<String, EntityTemplate>,
}

impl TemplateCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            templates: BTreeMap::new(),
        }
    }

    /// Registers a template under its own name, replacing any previous one.
    pub fn register(&mut self, template: EntityTemplate) {
        self.templates.insert(template.name.clone(), template);
    }

    /// Returns the number of registered templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns true if no templates are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Iterates over registered template names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.templates.keys().map(String::as_str)
    }

    /// The stock set of arena objects.
    #[must_use]
    pub fn standard() -> Self {
        let grey = Vec3::splat(153.0);
        let green = Vec3::new(129.0, 191.0, 65.0);
        let gold = Vec3::new(255.0, 215.0, 0.0);
        let red = Vec3::new(185.0, 50.0, 50.0);
        let goal_sizes = (Vec3::splat(0.5), Vec3::splat(5.0));

        let mut catalog = Self::new();
        catalog.register(
            EntityTemplate::new("Agent", EntityTag::Agent, PlacementPolicy::Agent)
                .with_fixed_size(Vec3::ONE)
                .with_capabilities(Capabilities::SKIN | Capabilities::FREEZE),
        );
        catalog.register(
            EntityTemplate::new("Wall", EntityTag::Wall, PlacementPolicy::Grounded)
                .with_size_range(Vec3::new(0.1, 0.1, 0.1), Vec3::new(40.0, 10.0, 40.0))
                .with_default_color(grey),
        );
        catalog.register(
            EntityTemplate::new("WallTransparent", EntityTag::Wall, PlacementPolicy::Grounded)
                .with_size_range(Vec3::new(0.1, 0.1, 0.1), Vec3::new(40.0, 10.0, 40.0)),
        );
        catalog.register(
            EntityTemplate::new("Ramp", EntityTag::Wall, PlacementPolicy::Grounded)
                .with_size_range(Vec3::new(0.5, 0.1, 0.5), Vec3::new(40.0, 10.0, 40.0))
                .with_default_color(Vec3::new(255.0, 0.0, 255.0)),
        );
        catalog.register(
            EntityTemplate::new("CylinderTunnel", EntityTag::Wall, PlacementPolicy::Grounded)
                .with_size_range(Vec3::new(2.5, 2.5, 2.5), Vec3::new(10.0, 10.0, 10.0))
                .with_default_color(grey),
        );
        catalog.register(
            EntityTemplate::new("Cardbox1", EntityTag::Prop, PlacementPolicy::Grounded)
                .with_size_range(Vec3::splat(0.5), Vec3::splat(10.0)),
        );
        catalog.register(
            EntityTemplate::new("Platform", EntityTag::Prop, PlacementPolicy::Sunken)
                .with_size_range(Vec3::new(1.0, 0.3, 1.0), Vec3::new(40.0, 0.3, 40.0)),
        );
        catalog.register(
            EntityTemplate::new("GoodGoal", EntityTag::GoodGoal, PlacementPolicy::Centered)
                .with_size_range(goal_sizes.0, goal_sizes.1)
                .with_default_color(green),
        );
        catalog.register(
            EntityTemplate::new("GoodGoalMulti", EntityTag::GoodGoalMulti, PlacementPolicy::Centered)
                .with_size_range(goal_sizes.0, goal_sizes.1)
                .with_default_color(gold),
        );
        catalog.register(
            EntityTemplate::new("GoodGoalMultiBounce", EntityTag::GoodGoalMulti, PlacementPolicy::Centered)
                .with_size_range(goal_sizes.0, goal_sizes.1)
                .with_default_color(gold),
        );
        catalog.register(
            EntityTemplate::new("BadGoal", EntityTag::BadGoal, PlacementPolicy::Centered)
                .with_size_range(goal_sizes.0, goal_sizes.1)
                .with_default_color(red),
        );
        for name in ["DecayGoal", "AntiDecayGoal", "GrowGoal", "ShrinkGoal"] {
            catalog.register(
                EntityTemplate::new(name, EntityTag::GoodGoal, PlacementPolicy::Centered)
                    .with_size_range(goal_sizes.0, goal_sizes.1)
                    .with_default_color(green)
                    .with_capabilities(Capabilities::VALUE_CHANGE | Capabilities::DELAYED),
            );
        }
        catalog.register(
            EntityTemplate::new("DeathZone", EntityTag::Zone, PlacementPolicy::Zone)
                .with_size_range(Vec3::new(1.0, 0.0, 1.0), Vec3::new(40.0, 10.0, 40.0))
                .with_default_color(red)
                .pass_through()
                .with_capabilities(Capabilities::ZONE),
        );
        catalog.register(
            EntityTemplate::new("HotZone", EntityTag::Zone, PlacementPolicy::Zone)
                .with_size_range(Vec3::new(1.0, 0.0, 1.0), Vec3::new(40.0, 10.0, 40.0))
                .with_default_color(Vec3::new(255.0, 120.0, 0.0))
                .pass_through()
                .with_capabilities(Capabilities::ZONE),
        );
        catalog.register(
            EntityTemplate::new("SpawnerTree", EntityTag::Prop, PlacementPolicy::Grounded)
                .with_fixed_size(Vec3::new(2.5, 5.0, 2.5))
                .with_capabilities(
                    Capabilities::SPAWNER
                        | Capabilities::RIPEN
                        | Capabilities::VALUE_CHANGE
                        | Capabilities::DELAYED,
                ),
        );
        catalog.register(
            EntityTemplate::new("SpawnerDispenserTall", EntityTag::Prop, PlacementPolicy::Grounded)
                .with_fixed_size(Vec3::new(1.5, 4.0, 1.5))
                .with_capabilities(Capabilities::SPAWNER | Capabilities::DOOR | Capabilities::DELAYED),
        );
        catalog.register(
            EntityTemplate::new("SpawnerButton", EntityTag::Prop, PlacementPolicy::Grounded)
                .with_fixed_size(Vec3::new(1.0, 1.0, 1.0))
                .with_capabilities(Capabilities::REWARD_SPAWN | Capabilities::MOVER),
        );
        catalog.register(
            EntityTemplate::new("SignBoard", EntityTag::Prop, PlacementPolicy::Grounded)
                .with_fixed_size(Vec3::new(1.0, 1.5, 0.2))
                .with_capabilities(Capabilities::SIGN),
        );
        catalog
    }
}

impl TemplateRegistry for TemplateCatalog {
    fn resolve(&self, name: &str) -> Option<EntityTemplate> {
        self.templates.get(name).cloned()
    }
}
