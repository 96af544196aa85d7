//! Capability sets and named-parameter dispatch.
//!
//! Optional spawnable parameters (delays, spawn counts, value-change rates, ...)
//! only make sense for some entity types. Each template declares a
//! [`Capabilities`] set, and the [`ParameterRegistry`] maps every parameter
//! name to the `(capability, setter)` pairs able to apply it.
//!
//! Dispatch is "apply if supported, ignore otherwise": a parameter whose name
//! is unknown, or whose capabilities the entity lacks, is silently skipped.
//!
//! # Example
//!
//! ```
//! use paddock_core::capability::{names, ParamValue, ParameterRegistry};
//! use paddock_core::entity::{EntityId, SpawnedEntity, TemplateCatalog, TemplateRegistry};
//! use corral::BodyId;
//!
//! let registry = ParameterRegistry::standard();
//! let template = TemplateCatalog::standard().resolve("DecayGoal").unwrap();
//! let mut goal = SpawnedEntity::new(EntityId::new(0), &template, BodyId::new(0));
//!
//! assert!(registry.try_set_named_float(&mut goal, names::CHANGE_RATE, -0.01));
//! assert!(!registry.try_set_named_float(&mut goal, names::DOOR_DELAY, 3.0));
//! assert_eq!(goal.behavior.change_rate, Some(-0.01));
//! assert_eq!(goal.behavior.door_delay, None);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use bitflags::bitflags;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::entity::{BehaviorState, SpawnedEntity};

bitflags! {
    /// Behaviour capabilities an entity template may expose.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Capabilities: u16 {
        /// Reward or size that changes over time
        const VALUE_CHANGE = 1 << 0;
        /// Spawns rewards
        const SPAWNER = 1 << 1;
        /// Grows fruit that ripens
        const RIPEN = 1 << 2;
        /// Has a door that opens on a schedule
        const DOOR = 1 << 3;
        /// Has a moving part
        const MOVER = 1 << 4;
        /// Can freeze the agent at episode start
        const FREEZE = 1 << 5;
        /// Spawns a reward when interacted with
        const REWARD_SPAWN = 1 << 6;
        /// Displays a symbol
        const SIGN = 1 << 7;
        /// Has selectable skins
        const SKIN = 1 << 8;
        /// Is a floor zone
        const ZONE = 1 << 9;
        /// Starts its behaviour after a delay
        const DELAYED = 1 << 10;
    }
}

/// Parameter names understood by the standard registry.
pub mod names {
    /// Behaviour start delay.
    pub const DELAY: &str = "delay";
    /// Initial value of a value-changing goal.
    pub const INITIAL_VALUE: &str = "initialValue";
    /// Final value of a value-changing goal.
    pub const FINAL_VALUE: &str = "finalValue";
    /// Per-step change of a value-changing goal.
    pub const CHANGE_RATE: &str = "changeRate";
    /// Number of rewards a spawner produces.
    pub const SPAWN_COUNT: &str = "spawnCount";
    /// Colour of spawned rewards.
    pub const SPAWN_COLOR: &str = "spawnColor";
    /// Time between spawns.
    pub const TIME_BETWEEN_SPAWNS: &str = "timeBetweenSpawns";
    /// Time before fruit ripens.
    pub const RIPEN_TIME: &str = "ripenTime";
    /// Time before a door first opens.
    pub const DOOR_DELAY: &str = "doorDelay";
    /// Time between door openings.
    pub const TIME_BETWEEN_DOOR_OPENS: &str = "timeBetweenDoorOpens";
    /// Travel time of a moving part.
    pub const MOVE_DURATION: &str = "moveDuration";
    /// Return time of a moving part.
    pub const RESET_DURATION: &str = "resetDuration";
    /// Time the agent is frozen at episode start.
    pub const FROZEN_AGENT_DELAY: &str = "frozenAgentDelay";
    /// Probability a button press spawns a reward.
    pub const SPAWN_PROBABILITY: &str = "spawnProbability";
    /// Maximum rewards a button may spawn.
    pub const MAX_REWARD_COUNT: &str = "maxRewardCount";
    /// Where button rewards appear.
    pub const REWARD_SPAWN_POSITION: &str = "rewardSpawnPos";
    /// Which reward a button spawns.
    pub const REWARD_NAME: &str = "rewardName";
    /// Symbol on a sign board.
    pub const SYMBOL_NAME: &str = "symbolName";
    /// Agent skin.
    pub const SKIN: &str = "skin";
    /// Zone visibility.
    pub const ZONE_VISIBILITY: &str = "zoneVisibility";
}

// =============================================================================
// Parameter values
// =============================================================================

/// A concrete value for one optional parameter of one instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    /// Scalar
    Float(f32),
    /// Vector (positions, colours)
    Vector(Vec3),
    /// Name or label
    Text(String),
    /// Switch
    Flag(bool),
}

impl ParamValue {
    /// Returns the scalar, if this is a `Float`.
    #[must_use]
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the vector, if this is a `Vector`.
    #[must_use]
    pub fn as_vector(&self) -> Option<Vec3> {
        match self {
            Self::Vector(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the text, if this is a `Text`.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the switch, if this is a `Flag`.
    #[must_use]
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v}"),
            Self::Vector(v) => write!(f, "({}, {}, {})", v.x, v.y, v.z),
            Self::Text(v) => write!(f, "{v}"),
            Self::Flag(v) => write!(f, "{v}"),
        }
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Writes a parameter value into an entity's behaviour state.
///
/// Returns false if the value has the wrong type for the field.
pub type Setter = fn(&mut BehaviorState, &ParamValue) -> bool;

/// Maps parameter names to the capabilities and setters able to apply them.
#[derive(Clone, Default)]
pub struct ParameterRegistry {
    setters: BTreeMap<&'static str, Vec<(Capabilities, Setter)>>,
}

impl fmt::Debug for ParameterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterRegistry")
            .field("parameters", &self.setters.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ParameterRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            setters: BTreeMap::new(),
        }
    }

    /// Registers a setter for `name`, applicable to entities with `capability`.
    ///
    /// Setters registered earlier for the same name take precedence.
    pub fn register(&mut self, name: &'static str, capability: Capabilities, setter: Setter) {
        self.setters.entry(name).or_default().push((capability, setter));
    }

    /// Applies `value` to `entity` if it exposes a matching setter.
    ///
    /// Returns true if a setter accepted the value.
    pub fn try_set(&self, entity: &mut SpawnedEntity, name: &str, value: &ParamValue) -> bool {
        let Some(candidates) = self.setters.get(name) else {
            return false;
        };
        let capabilities = entity.capabilities();
        candidates
            .iter()
            .filter(|(capability, _)| capabilities.intersects(*capability))
            .any(|(_, setter)| setter(&mut entity.behavior, value))
    }

    /// Float form of [`try_set`](Self::try_set).
    pub fn try_set_named_float(&self, entity: &mut SpawnedEntity, name: &str, value: f32) -> bool {
        self.try_set(entity, name, &ParamValue::Float(value))
    }

    /// Returns true if an entity with `capabilities` can accept `name`.
    #[must_use]
    pub fn supports(&self, capabilities: Capabilities, name: &str) -> bool {
        self.setters
            .get(name)
            .is_some_and(|c| c.iter().any(|(cap, _)| capabilities.intersects(*cap)))
    }

    /// Iterates over registered parameter names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.setters.keys().copied()
    }

    /// The registry covering every standard optional parameter.
    #[must_use]
    pub fn standard() -> Self {
        let mut r = Self::new();
        r.register(names::DELAY, Capabilities::DELAYED, set_delay);
        r.register(names::DELAY, Capabilities::SPAWNER, set_delay);
        r.register(names::INITIAL_VALUE, Capabilities::VALUE_CHANGE, set_initial_value);
        r.register(names::FINAL_VALUE, Capabilities::VALUE_CHANGE, set_final_value);
        r.register(names::CHANGE_RATE, Capabilities::VALUE_CHANGE, set_change_rate);
        r.register(names::SPAWN_COUNT, Capabilities::SPAWNER, set_spawn_count);
        r.register(names::SPAWN_COLOR, Capabilities::SPAWNER, set_spawn_color);
        r.register(names::TIME_BETWEEN_SPAWNS, Capabilities::SPAWNER, set_time_between_spawns);
        r.register(names::RIPEN_TIME, Capabilities::RIPEN, set_ripen_time);
        r.register(names::DOOR_DELAY, Capabilities::DOOR, set_door_delay);
        r.register(names::TIME_BETWEEN_DOOR_OPENS, Capabilities::DOOR, set_time_between_door_opens);
        r.register(names::MOVE_DURATION, Capabilities::MOVER, set_move_duration);
        r.register(names::RESET_DURATION, Capabilities::MOVER, set_reset_duration);
        r.register(names::FROZEN_AGENT_DELAY, Capabilities::FREEZE, set_frozen_agent_delay);
        r.register(names::SPAWN_PROBABILITY, Capabilities::REWARD_SPAWN, set_spawn_probability);
        r.register(names::MAX_REWARD_COUNT, Capabilities::REWARD_SPAWN, set_max_reward_count);
        r.register(names::REWARD_SPAWN_POSITION, Capabilities::REWARD_SPAWN, set_reward_spawn_position);
        r.register(names::REWARD_NAME, Capabilities::REWARD_SPAWN, set_reward_name);
        r.register(names::SYMBOL_NAME, Capabilities::SIGN, set_symbol_name);
        r.register(names::SKIN, Capabilities::SKIN, set_skin);
        r.register(names::ZONE_VISIBILITY, Capabilities::ZONE, set_zone_visibility);
        r
    }
}

fn write_float(slot: &mut Option<f32>, value: &ParamValue) -> bool {
    let Some(v) = value.as_float() else {
        return false;
    };
    *slot = Some(v);
    true
}

fn write_vector(slot: &mut Option<Vec3>, value: &ParamValue) -> bool {
    let Some(v) = value.as_vector() else {
        return false;
    };
    *slot = Some(v);
    true
}

fn write_text(slot: &mut Option<String>, value: &ParamValue) -> bool {
    let Some(v) = value.as_text() else {
        return false;
    };
    *slot = Some(v.to_string());
    true
}

fn write_flag(slot: &mut Option<bool>, value: &ParamValue) -> bool {
    let Some(v) = value.as_flag() else {
        return false;
    };
    *slot = Some(v);
    true
}

fn set_delay(b: &mut BehaviorState, v: &ParamValue) -> bool {
    write_float(&mut b.delay, v)
}

fn set_initial_value(b: &mut BehaviorState, v: &ParamValue) -> bool {
    write_float(&mut b.initial_value, v)
}

fn set_final_value(b: &mut BehaviorState, v: &ParamValue) -> bool {
    write_float(&mut b.final_value, v)
}

fn set_change_rate(b: &mut BehaviorState, v: &ParamValue) -> bool {
    write_float(&mut b.change_rate, v)
}

fn set_spawn_count(b: &mut BehaviorState, v: &ParamValue) -> bool {
    write_float(&mut b.spawn_count, v)
}

fn set_spawn_color(b: &mut BehaviorState, v: &ParamValue) -> bool {
    write_vector(&mut b.spawn_color, v)
}

fn set_time_between_spawns(b: &mut BehaviorState, v: &ParamValue) -> bool {
    write_float(&mut b.time_between_spawns, v)
}

fn set_ripen_time(b: &mut BehaviorState, v: &ParamValue) -> bool {
    write_float(&mut b.ripen_time, v)
}

fn set_door_delay(b: &mut BehaviorState, v: &ParamValue) -> bool {
    write_float(&mut b.door_delay, v)
}

fn set_time_between_door_opens(b: &mut BehaviorState, v: &ParamValue) -> bool {
    write_float(&mut b.time_between_door_opens, v)
}

fn set_move_duration(b: &mut BehaviorState, v: &ParamValue) -> bool {
    write_float(&mut b.move_duration, v)
}

fn set_reset_duration(b: &mut BehaviorState, v: &ParamValue) -> bool {
    write_float(&mut b.reset_duration, v)
}

fn set_frozen_agent_delay(b: &mut BehaviorState, v: &ParamValue) -> bool {
    write_float(&mut b.frozen_agent_delay, v)
}

fn set_spawn_probability(b: &mut BehaviorState, v: &ParamValue) -> bool {
    write_float(&mut b.spawn_probability, v)
}

fn set_max_reward_count(b: &mut BehaviorState, v: &ParamValue) -> bool {
    write_float(&mut b.max_reward_count, v)
}

fn set_reward_spawn_position(b: &mut BehaviorState, v: &ParamValue) -> bool {
    write_vector(&mut b.reward_spawn_position, v)
}

fn set_reward_name(b: &mut BehaviorState, v: &ParamValue) -> bool {
    write_text(&mut b.reward_name, v)
}

fn set_symbol_name(b: &mut BehaviorState, v: &ParamValue) -> bool {
    write_text(&mut b.symbol_name, v)
}

fn set_skin(b: &mut BehaviorState, v: &ParamValue) -> bool {
    write_text(&mut b.skin, v)
}

fn set_zone_visibility(b: &mut BehaviorState, v: &ParamValue) -> bool {
    write_flag(&mut b.zone_visible, v)
}
