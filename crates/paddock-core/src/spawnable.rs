//! Spawnables: declarative descriptors for one entity type.
//!
//! A [`Spawnable`] carries parallel arrays: index `k` of every array describes
//! instance `k`. Arrays may have different lengths; the number of instances
//! is the longest of them, and shorter arrays fall back to defaults (see
//! [`broadcast`](crate::broadcast)).
//!
//! Spawnables deserialize directly from the in-memory records an external
//! configuration parser produces. The template reference is not part of the
//! record: it is bound late, by name, when the arena is applied.
//!
//! # Example
//!
//! ```
//! use paddock_core::spawnable::Spawnable;
//! use glam::Vec3;
//!
//! let goals = Spawnable::new("GoodGoal")
//!     .with_positions(vec![Vec3::new(5.0, 0.0, 5.0)])
//!     .with_sizes(vec![Vec3::ONE, Vec3::splat(2.0), Vec3::splat(3.0)]);
//!
//! assert_eq!(goals.instance_count(), 3);
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::capability::{names, ParamValue};
use crate::entity::{EntityTemplate, TemplateRegistry};

/// One optional parameter array, borrowed for broadcasting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamColumn<'a> {
    /// Scalar values
    Float(&'a [f32]),
    /// Vector values
    Vector(&'a [Vec3]),
    /// Text values
    Text(&'a [String]),
    /// Switch values
    Flag(&'a [bool]),
}

impl ParamColumn<'_> {
    /// Returns the number of values in the column.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Float(v) => v.len(),
            Self::Vector(v) => v.len(),
            Self::Text(v) => v.len(),
            Self::Flag(v) => v.len(),
        }
    }

    /// Returns true if the column holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the value for instance `index`, if the column reaches it.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<ParamValue> {
        match self {
            Self::Float(v) => v.get(index).copied().map(ParamValue::Float),
            Self::Vector(v) => v.get(index).copied().map(ParamValue::Vector),
            Self::Text(v) => v.get(index).cloned().map(ParamValue::Text),
            Self::Flag(v) => v.get(index).copied().map(ParamValue::Flag),
        }
    }
}

/// The optional parameter arrays of a spawnable.
///
/// `None` and an empty array are equivalent: every instance uses the default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionalParams {
    /// Behaviour start delays
    pub delays: Option<Vec<f32>>,
    /// Initial values of value-changing goals
    pub initial_values: Option<Vec<f32>>,
    /// Final values of value-changing goals
    pub final_values: Option<Vec<f32>>,
    /// Per-step changes of value-changing goals
    pub change_rates: Option<Vec<f32>>,
    /// Spawner reward counts
    pub spawn_counts: Option<Vec<f32>>,
    /// Spawned reward colours
    pub spawn_colors: Option<Vec<Vec3>>,
    /// Times between spawns
    pub times_between_spawns: Option<Vec<f32>>,
    /// Ripen times
    pub ripen_times: Option<Vec<f32>>,
    /// Door delays
    pub door_delays: Option<Vec<f32>>,
    /// Times between door openings
    pub times_between_door_opens: Option<Vec<f32>>,
    /// Moving-part travel times
    pub move_durations: Option<Vec<f32>>,
    /// Moving-part return times
    pub reset_durations: Option<Vec<f32>>,
    /// Agent freeze times
    pub frozen_agent_delays: Option<Vec<f32>>,
    /// Button spawn probabilities
    pub spawn_probabilities: Option<Vec<f32>>,
    /// Button reward caps
    pub max_reward_counts: Option<Vec<f32>>,
    /// Button reward positions
    pub reward_spawn_positions: Option<Vec<Vec3>>,
    /// Button reward names
    pub reward_names: Option<Vec<String>>,
    /// Sign symbols
    pub symbol_names: Option<Vec<String>>,
    /// Agent skins
    pub skins: Option<Vec<String>>,
    /// Zone visibility switches
    pub zone_visibilities: Option<Vec<bool>>,
}

impl OptionalParams {
    /// Every optional array paired with the parameter name it feeds.
    #[must_use]
    pub fn columns(&self) -> [(&'static str, ParamColumn<'_>); 20] {
        fn floats(v: Option<&Vec<f32>>) -> ParamColumn<'_> {
            ParamColumn::Float(v.map_or(&[], Vec::as_slice))
        }
        fn vectors(v: Option<&Vec<Vec3>>) -> ParamColumn<'_> {
            ParamColumn::Vector(v.map_or(&[], Vec::as_slice))
        }
        fn texts(v: Option<&Vec<String>>) -> ParamColumn<'_> {
            ParamColumn::Text(v.map_or(&[], Vec::as_slice))
        }
        fn flags(v: Option<&Vec<bool>>) -> ParamColumn<'_> {
            ParamColumn::Flag(v.map_or(&[], Vec::as_slice))
        }

        [
            (names::DELAY, floats(self.delays.as_ref())),
            (names::INITIAL_VALUE, floats(self.initial_values.as_ref())),
            (names::FINAL_VALUE, floats(self.final_values.as_ref())),
            (names::CHANGE_RATE, floats(self.change_rates.as_ref())),
            (names::SPAWN_COUNT, floats(self.spawn_counts.as_ref())),
            (names::SPAWN_COLOR, vectors(self.spawn_colors.as_ref())),
            (names::TIME_BETWEEN_SPAWNS, floats(self.times_between_spawns.as_ref())),
            (names::RIPEN_TIME, floats(self.ripen_times.as_ref())),
            (names::DOOR_DELAY, floats(self.door_delays.as_ref())),
            (names::TIME_BETWEEN_DOOR_OPENS, floats(self.times_between_door_opens.as_ref())),
            (names::MOVE_DURATION, floats(self.move_durations.as_ref())),
            (names::RESET_DURATION, floats(self.reset_durations.as_ref())),
            (names::FROZEN_AGENT_DELAY, floats(self.frozen_agent_delays.as_ref())),
            (names::SPAWN_PROBABILITY, floats(self.spawn_probabilities.as_ref())),
            (names::MAX_REWARD_COUNT, floats(self.max_reward_counts.as_ref())),
            (names::REWARD_SPAWN_POSITION, vectors(self.reward_spawn_positions.as_ref())),
            (names::REWARD_NAME, texts(self.reward_names.as_ref())),
            (names::SYMBOL_NAME, texts(self.symbol_names.as_ref())),
            (names::SKIN, texts(self.skins.as_ref())),
            (names::ZONE_VISIBILITY, flags(self.zone_visibilities.as_ref())),
        ]
    }

    /// Length of the longest optional array.
    #[must_use]
    pub fn max_len(&self) -> usize {
        self.columns().iter().map(|(_, c)| c.len()).max().unwrap_or(0)
    }
}

/// Descriptor for one or more instances of an entity type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spawnable {
    /// Template name
    pub name: String,
    /// Requested positions; negative components are randomized
    #[serde(default)]
    pub positions: Vec<Vec3>,
    /// Requested Euler rotations in degrees; a negative yaw is randomized
    #[serde(default)]
    pub rotations: Vec<Vec3>,
    /// Requested sizes; negative components are randomized
    #[serde(default)]
    pub sizes: Vec<Vec3>,
    /// Requested RGB colours; negative channels are randomized
    #[serde(default)]
    pub colors: Vec<Vec3>,
    /// Optional parameter arrays
    #[serde(flatten)]
    pub options: OptionalParams,
    /// Late-bound template
    #[serde(skip)]
    pub template: Option<EntityTemplate>,
}

impl Spawnable {
    /// Creates a spawnable with no parameters: one instance, everything default.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Set requested positions.
    #[must_use]
    pub fn with_positions(mut self, positions: Vec<Vec3>) -> Self {
        self.positions = positions;
        self
    }

    /// Set requested rotations.
    #[must_use]
    pub fn with_rotations(mut self, rotations: Vec<Vec3>) -> Self {
        self.rotations = rotations;
        self
    }

    /// Set requested sizes.
    #[must_use]
    pub fn with_sizes(mut self, sizes: Vec<Vec3>) -> Self {
        self.sizes = sizes;
        self
    }

    /// Set requested colours.
    #[must_use]
    pub fn with_colors(mut self, colors: Vec<Vec3>) -> Self {
        self.colors = colors;
        self
    }

    /// Set the optional parameter arrays.
    #[must_use]
    pub fn with_options(mut self, options: OptionalParams) -> Self {
        self.options = options;
        self
    }

    /// Bind a template directly.
    #[must_use]
    pub fn with_template(mut self, template: EntityTemplate) -> Self {
        self.template = Some(template);
        self
    }

    /// Number of instances: the longest of all arrays, at least one.
    ///
    /// A spawnable with every array empty still describes a single,
    /// fully-defaulted instance.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        [
            self.positions.len(),
            self.rotations.len(),
            self.sizes.len(),
            self.colors.len(),
            self.options.max_len(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
        .max(1)
    }

    /// Resolves the template by name, replacing any previous binding.
    ///
    /// Returns false, leaving the spawnable unbound, if the name is unknown.
    pub fn bind(&mut self, registry: &dyn TemplateRegistry) -> bool {
        self.template = registry.resolve(&self.name);
        self.template.is_some()
    }

    /// Returns true if the bound template is the agent.
    #[must_use]
    pub fn is_agent(&self) -> bool {
        self.template.as_ref().is_some_and(EntityTemplate::is_agent)
    }

    /// Returns true if the request content (everything but the template
    /// binding) matches `other`.
    #[must_use]
    pub fn same_request(&self, other: &Self) -> bool {
        self.name == other.name
            && self.positions == other.positions
            && self.rotations == other.rotations
            && self.sizes == other.sizes
            && self.colors == other.colors
            && self.options == other.options
    }
}
