//! Parameter broadcasting: expanding a [`Spawnable`] into per-instance records.
//!
//! Instance `k` takes element `k` of every array that reaches it and a
//! default from every array that doesn't. Most defaults are fixed; the
//! `(initialValue, finalValue, changeRate)` triple depends on the entity's
//! name through [`ValueProfile::classify`]:
//!
//! | Profile    | Name rule                         | Initial | Final | Rate   |
//! |------------|-----------------------------------|---------|-------|--------|
//! | `Tree`     | contains `"Tree"`                 | 0.2     | 1.0   | 0.005  |
//! | `Growing`  | starts with `"Anti"` or `"Grow"`  | 2.5     | 5.0   | 0.005  |
//! | `Decaying` | anything else                     | 2.5     | 0.0   | -0.005 |
//!
//! # Example
//!
//! ```
//! use paddock_core::broadcast::broadcast;
//! use paddock_core::entity::{TemplateCatalog, TemplateRegistry};
//! use paddock_core::spawnable::Spawnable;
//! use glam::Vec3;
//!
//! let catalog = TemplateCatalog::standard();
//! let template = catalog.resolve("GoodGoal").unwrap();
//! let spawnable = Spawnable::new("GoodGoal")
//!     .with_positions(vec![Vec3::new(1.0, 0.0, 1.0), Vec3::new(5.0, 0.0, 5.0)]);
//!
//! let records = broadcast(&spawnable, &template);
//! assert_eq!(records.len(), 2);
//! assert_eq!(records[1].request.position, Vec3::new(5.0, 0.0, 5.0));
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::capability::{names, ParamValue};
use crate::entity::EntityTemplate;
use crate::placement::{PlacementRequest, RANDOMIZE};
use crate::spawnable::Spawnable;

// =============================================================================
// Value-change profiles
// =============================================================================

/// Default `(initial, final, rate)` for value-changing entities.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueDefaults {
    /// Starting value
    pub initial_value: f32,
    /// Value approached over time
    pub final_value: f32,
    /// Change per step
    pub change_rate: f32,
}

/// Name-derived class selecting value-change defaults.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueProfile {
    /// Fruit-bearing spawners: rewards ripen from small to full size
    Tree,
    /// Goals whose value rises
    Growing,
    /// Goals whose value falls
    Decaying,
}

#[derive(Debug, Copy, Clone)]
enum NameRule {
    Contains(&'static str),
    Prefix(&'static str),
}

impl NameRule {
    fn matches(self, name: &str) -> bool {
        match self {
            Self::Contains(s) => name.contains(s),
            Self::Prefix(s) => name.starts_with(s),
        }
    }
}

/// Checked in order; the first match wins.
const PROFILE_RULES: &[(NameRule, ValueProfile)] = &[
    (NameRule::Contains("Tree"), ValueProfile::Tree),
    (NameRule::Prefix("Anti"), ValueProfile::Growing),
    (NameRule::Prefix("Grow"), ValueProfile::Growing),
];

impl ValueProfile {
    /// Classifies an entity by name.
    #[must_use]
    pub fn classify(name: &str) -> Self {
        PROFILE_RULES
            .iter()
            .find(|(rule, _)| rule.matches(name))
            .map_or(Self::Decaying, |(_, profile)| *profile)
    }

    /// Returns this profile's default triple.
    #[must_use]
    pub const fn defaults(self) -> ValueDefaults {
        match self {
            Self::Tree => ValueDefaults {
                initial_value: 0.2,
                final_value: 1.0,
                change_rate: 0.005,
            },
            Self::Growing => ValueDefaults {
                initial_value: 2.5,
                final_value: 5.0,
                change_rate: 0.005,
            },
            Self::Decaying => ValueDefaults {
                initial_value: 2.5,
                final_value: 0.0,
                change_rate: -0.005,
            },
        }
    }
}

/// Default for optional parameter `name` on an entity of `profile`.
///
/// Unknown names default to `Float(0.0)`.
#[must_use]
pub fn default_param(name: &str, profile: ValueProfile) -> ParamValue {
    let values = profile.defaults();
    match name {
        names::INITIAL_VALUE => ParamValue::Float(values.initial_value),
        names::FINAL_VALUE => ParamValue::Float(values.final_value),
        names::CHANGE_RATE => ParamValue::Float(values.change_rate),
        names::SPAWN_COUNT | names::TIME_BETWEEN_DOOR_OPENS | names::MAX_REWARD_COUNT => {
            ParamValue::Float(-1.0)
        }
        names::TIME_BETWEEN_SPAWNS => ParamValue::Float(4.0),
        names::RIPEN_TIME => ParamValue::Float(6.0),
        names::DOOR_DELAY => ParamValue::Float(10.0),
        names::MOVE_DURATION => ParamValue::Float(3.0),
        names::RESET_DURATION | names::SPAWN_PROBABILITY => ParamValue::Float(1.0),
        names::SPAWN_COLOR | names::REWARD_SPAWN_POSITION => ParamValue::Vector(RANDOMIZE),
        names::REWARD_NAME => ParamValue::Text("GoodGoal".to_string()),
        names::SYMBOL_NAME => ParamValue::Text(String::new()),
        names::SKIN => ParamValue::Text("random".to_string()),
        names::ZONE_VISIBILITY => ParamValue::Flag(true),
        _ => ParamValue::Float(0.0),
    }
}

// =============================================================================
// Broadcasting
// =============================================================================

/// One concrete instance of a spawnable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceRecord {
    /// Instance index within the spawnable
    pub index: usize,
    /// Requested pose and size, sentinels included
    pub request: PlacementRequest,
    /// Requested colour; negative channels are randomized
    pub color: Vec3,
    /// Every optional parameter with its value or default
    pub params: Vec<(&'static str, ParamValue)>,
}

impl InstanceRecord {
    /// Returns the value recorded for parameter `name`.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }
}

/// Expands `spawnable` into one record per instance.
///
/// Out-of-range sizes fall back to the template's default size (or a full
/// randomization when it has none); out-of-range colours fall back to the
/// template's default colour.
#[must_use]
pub fn broadcast(spawnable: &Spawnable, template: &EntityTemplate) -> Vec<InstanceRecord> {
    let profile = ValueProfile::classify(&spawnable.name);
    let columns = spawnable.options.columns();

    (0..spawnable.instance_count())
        .map(|k| InstanceRecord {
            index: k,
            request: PlacementRequest {
                position: spawnable.positions.get(k).copied().unwrap_or(RANDOMIZE),
                rotation: spawnable.rotations.get(k).copied().unwrap_or(RANDOMIZE),
                size: spawnable
                    .sizes
                    .get(k)
                    .copied()
                    .or(template.default_size)
                    .unwrap_or(RANDOMIZE),
            },
            color: spawnable
                .colors
                .get(k)
                .copied()
                .unwrap_or(template.default_color),
            params: columns
                .iter()
                .map(|(name, column)| {
                    let value = column.get(k).unwrap_or_else(|| default_param(name, profile));
                    (*name, value)
                })
                .collect(),
        })
        .collect()
}
