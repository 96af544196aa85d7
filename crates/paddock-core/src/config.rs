//! Arena configurations, the arena catalog and tunable settings.
//!
//! An external parser produces [`ArenaRecord`]s; converting them into an
//! [`ArenaCatalog`] performs every load-time check (blackout lists, episode
//! lengths, the merge chain) so that nothing fatal can surface once
//! placement has started.

use std::collections::BTreeSet;

use corral::Bounds;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::lights::LightsSwitch;
use crate::spawnable::Spawnable;

/// Height of the boundary walls.
pub const WALL_HEIGHT: f32 = 10.0;

// =============================================================================
// Bounds
// =============================================================================

/// The floor footprint of an arena, addressed as `[0, width] x [0, depth]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBounds")]
pub struct ArenaBounds {
    width: f32,
    depth: f32,
}

/// Unchecked wire form of [`ArenaBounds`].
#[derive(Deserialize)]
struct RawBounds {
    width: f32,
    depth: f32,
}

impl TryFrom<RawBounds> for ArenaBounds {
    type Error = ConfigError;

    fn try_from(raw: RawBounds) -> Result<Self, Self::Error> {
        Self::new(raw.width, raw.depth)
    }
}

impl Default for ArenaBounds {
    fn default() -> Self {
        Self {
            width: 40.0,
            depth: 40.0,
        }
    }
}

impl ArenaBounds {
    /// Creates bounds of `width` x `depth`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DegenerateBounds`] unless both extents are
    /// positive and finite.
    pub fn new(width: f32, depth: f32) -> Result<Self, ConfigError> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if !valid(width) || !valid(depth) {
            return Err(ConfigError::DegenerateBounds { width, depth });
        }
        Ok(Self { width, depth })
    }

    /// Creates bounds from the arena's two corner markers.
    ///
    /// # Errors
    ///
    /// Fails if a marker is missing, if `lower` exceeds `upper` on any axis,
    /// or if the footprint has no area.
    pub fn from_markers(lower: Option<Vec3>, upper: Option<Vec3>) -> Result<Self, ConfigError> {
        let lower = lower.ok_or(ConfigError::MissingBoundsMarker { marker: "lower" })?;
        let upper = upper.ok_or(ConfigError::MissingBoundsMarker { marker: "upper" })?;
        let size = Bounds::try_from_min_max(lower, upper)?.size();
        Self::new(size.x, size.z)
    }

    /// Extent along X.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Extent along Z.
    #[must_use]
    pub const fn depth(&self) -> f32 {
        self.depth
    }

    /// The arena volume, wall height included.
    #[must_use]
    pub fn as_bounds(&self) -> Bounds {
        Bounds::new(self.width, WALL_HEIGHT, self.depth)
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Tunables for the arena builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderSettings {
    /// Placement attempts per object instance
    pub max_attempts_object: u32,
    /// Placement attempts for the agent
    pub max_attempts_agent: u32,
    /// Template used when no spawnable provides the agent
    pub agent_template: String,
}

impl Default for BuilderSettings {
    fn default() -> Self {
        Self {
            max_attempts_object: 20,
            max_attempts_agent: 100,
            agent_template: "Agent".to_string(),
        }
    }
}

/// Tunables for the arena lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingSettings {
    /// Simulation steps per agent decision
    pub decision_interval: u32,
    /// Draw arenas at random instead of in order
    pub randomize_arenas: bool,
    /// Builder tunables
    pub builder: BuilderSettings,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            decision_interval: 5,
            randomize_arenas: false,
            builder: BuilderSettings::default(),
        }
    }
}

impl TrainingSettings {
    /// Enable or disable random arena selection.
    #[must_use]
    pub fn with_randomization(mut self, randomize: bool) -> Self {
        self.randomize_arenas = randomize;
        self
    }

    /// Set the decision interval.
    #[must_use]
    pub fn with_decision_interval(mut self, interval: u32) -> Self {
        self.decision_interval = interval;
        self
    }
}

// =============================================================================
// Arena configuration
// =============================================================================

/// One arena as produced by an external configuration parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArenaRecord {
    /// Entities to place
    pub spawnables: Vec<Spawnable>,
    /// Episode length in steps; 0 means unlimited
    pub time_limit: i32,
    /// Cumulative reward counting as a pass
    pub pass_mark: f32,
    /// Blackout toggle points in decisions, or `[-k]` for every `k`
    pub blackouts: Vec<i32>,
    /// Keep this arena's entities when the next arena is built
    pub merge_next_arena: bool,
    /// Seed for the shared random source; 0 leaves it untouched
    pub random_seed: u64,
}

/// A validated arena.
///
/// Serializes as the [`ArenaRecord`] it was built from, and deserializes
/// through [`ArenaConfiguration::from_record`], so a loaded configuration
/// is always validated and starts flagged `to_update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ArenaRecord", into = "ArenaRecord")]
pub struct ArenaConfiguration {
    /// Entities to place, in order
    pub spawnables: Vec<Spawnable>,
    /// Episode length in steps; 0 means unlimited
    pub time_limit: u32,
    /// Cumulative reward counting as a pass
    pub pass_mark: f32,
    /// Blackout schedule
    pub lights: LightsSwitch,
    /// Keep this arena's entities when the next arena is built
    pub merge_next_arena: bool,
    /// Seed for the shared random source; 0 leaves it untouched
    pub random_seed: u64,
    /// Content changed since this arena was last built
    pub to_update: bool,
}

impl ArenaConfiguration {
    /// Validates a record.
    ///
    /// # Errors
    ///
    /// Fails on a negative time limit or a malformed blackout list.
    pub fn from_record(record: ArenaRecord) -> Result<Self, ConfigError> {
        let lights = LightsSwitch::new(record.time_limit, &record.blackouts)?;
        Ok(Self {
            spawnables: record.spawnables,
            time_limit: lights.episode_length(),
            pass_mark: record.pass_mark,
            lights,
            merge_next_arena: record.merge_next_arena,
            random_seed: record.random_seed,
            to_update: true,
        })
    }

    /// Returns true if both describe the same arena, ignoring template
    /// bindings, light progress and the update flag.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.time_limit == other.time_limit
            && self.pass_mark.to_bits() == other.pass_mark.to_bits()
            && self.lights.schedule() == other.lights.schedule()
            && self.merge_next_arena == other.merge_next_arena
            && self.random_seed == other.random_seed
            && self.spawnables.len() == other.spawnables.len()
            && self
                .spawnables
                .iter()
                .zip(&other.spawnables)
                .all(|(a, b)| a.same_request(b))
    }
}

impl TryFrom<ArenaRecord> for ArenaConfiguration {
    type Error = ConfigError;

    fn try_from(record: ArenaRecord) -> Result<Self, Self::Error> {
        Self::from_record(record)
    }
}

impl From<ArenaConfiguration> for ArenaRecord {
    fn from(config: ArenaConfiguration) -> Self {
        Self {
            spawnables: config.spawnables,
            time_limit: i32::try_from(config.time_limit).unwrap_or(i32::MAX),
            pass_mark: config.pass_mark,
            blackouts: config.lights.schedule().to_blackouts(),
            merge_next_arena: config.merge_next_arena,
            random_seed: config.random_seed,
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// The ordered set of arenas a training run cycles through.
///
/// Serializes as a list of records and deserializes through
/// [`ArenaCatalog::from_records`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ArenaRecord>", into = "Vec<ArenaRecord>")]
pub struct ArenaCatalog {
    arenas: Vec<ArenaConfiguration>,
}

impl ArenaCatalog {
    /// Creates a catalog from validated configurations.
    ///
    /// # Errors
    ///
    /// Fails if `arenas` is empty or the last arena merges forward.
    pub fn new(arenas: Vec<ArenaConfiguration>) -> Result<Self, ConfigError> {
        if arenas.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        let catalog = Self { arenas };
        catalog.validate_merge_chain()?;
        Ok(catalog)
    }

    /// Validates and collects parsed records.
    ///
    /// # Errors
    ///
    /// Fails on the first invalid record, or as [`ArenaCatalog::new`].
    pub fn from_records(records: Vec<ArenaRecord>) -> Result<Self, ConfigError> {
        let arenas = records
            .into_iter()
            .map(ArenaConfiguration::from_record)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(arenas)
    }

    /// Checks that the final arena does not merge into a missing successor.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MergeChainOverrun`] if it does.
    pub fn validate_merge_chain(&self) -> Result<(), ConfigError> {
        match self.arenas.last() {
            Some(last) if last.merge_next_arena => Err(ConfigError::MergeChainOverrun {
                arena_id: self.arenas.len() - 1,
            }),
            _ => Ok(()),
        }
    }

    /// Arenas only reachable through their predecessor's merge flag.
    #[must_use]
    pub fn merged_ids(&self) -> BTreeSet<usize> {
        self.arenas
            .windows(2)
            .enumerate()
            .filter(|(_, pair)| pair[0].merge_next_arena)
            .map(|(i, _)| i + 1)
            .collect()
    }

    /// Returns the arena whose build also builds `arena_id`.
    #[must_use]
    pub fn chain_head(&self, arena_id: usize) -> usize {
        let mut head = arena_id.min(self.arenas.len().saturating_sub(1));
        while head > 0 && self.arenas[head - 1].merge_next_arena {
            head -= 1;
        }
        head
    }

    /// Returns the arena at `arena_id`.
    #[must_use]
    pub fn get(&self, arena_id: usize) -> Option<&ArenaConfiguration> {
        self.arenas.get(arena_id)
    }

    /// Returns the arena at `arena_id` mutably.
    pub fn get_mut(&mut self, arena_id: usize) -> Option<&mut ArenaConfiguration> {
        self.arenas.get_mut(arena_id)
    }

    /// Number of arenas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arenas.len()
    }

    /// Always false for a constructed catalog.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arenas.is_empty()
    }

    /// Iterates over arenas in order.
    pub fn iter(&self) -> impl Iterator<Item = &ArenaConfiguration> + '_ {
        self.arenas.iter()
    }
}

impl TryFrom<Vec<ArenaRecord>> for ArenaCatalog {
    type Error = ConfigError;

    fn try_from(records: Vec<ArenaRecord>) -> Result<Self, Self::Error> {
        Self::from_records(records)
    }
}

impl From<ArenaCatalog> for Vec<ArenaRecord> {
    fn from(catalog: ArenaCatalog) -> Self {
        catalog.arenas.into_iter().map(ArenaRecord::from).collect()
    }
}
