//! The training arena: arena selection and the episode lifecycle.
//!
//! `TrainingArena` owns everything that persists across episodes: the
//! catalog, the scene, the shared random source and the selection history.
//!
//! # Selection
//!
//! ```text
//! NeedsFirstReset ──reset──► Active(id) ──reset──► Active(next) ──► ...
//! ```
//!
//! - **First reset**: a random non-merged arena when randomizing, else arena 0.
//! - **Randomized**: the current arena joins the played history; once the
//!   history covers every eligible arena it restarts from just the current
//!   one, so the same arena is never drawn twice in a row. Merged arenas are
//!   never drawn.
//! - **Sequential**: the next index, skipping every arena whose predecessor
//!   merges into it.
//!
//! # Merged arenas
//!
//! Building arena `i` also builds `i + 1` into the same scene when `i` sets
//! `merge_next_arena`, and so on down the chain. Timing, lights and seed
//! come from `i`.
//!
//! # Example
//!
//! ```
//! use paddock_core::config::{ArenaBounds, ArenaCatalog, ArenaRecord, TrainingSettings};
//! use paddock_core::entity::TemplateCatalog;
//! use paddock_core::spawnable::Spawnable;
//! use paddock_core::training::TrainingArena;
//!
//! let records = vec![
//!     ArenaRecord {
//!         spawnables: vec![Spawnable::new("GoodGoal")],
//!         time_limit: 250,
//!         ..ArenaRecord::default()
//!     },
//!     ArenaRecord::default(),
//! ];
//! let catalog = ArenaCatalog::from_records(records).unwrap();
//! let mut arena = TrainingArena::new(
//!     catalog,
//!     ArenaBounds::default(),
//!     Box::new(TemplateCatalog::standard()),
//!     TrainingSettings::default(),
//!     42,
//! )
//! .unwrap();
//!
//! let report = arena.reset().unwrap();
//! assert_eq!(report.arena_id, 0);
//! assert_eq!(arena.time_limit(), 250);
//!
//! arena.reset().unwrap();
//! assert_eq!(arena.current_arena_id(), Some(1));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::builder::{ArenaBuilder, BuildReport};
use crate::config::{ArenaBounds, ArenaCatalog, ArenaConfiguration, TrainingSettings};
use crate::entity::TemplateRegistry;
use crate::error::{ArenaError, ConfigError};
use crate::events::ArenaEvent;
use crate::lights::LightsSwitch;
use crate::scene::Scene;

/// Result of advancing the simulation by one step.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickOutcome {
    /// The step that was evaluated
    pub step: u64,
    /// Lights state after the step
    pub lights_on: bool,
    /// Whether the lights flipped on this step
    pub toggled: bool,
}

/// Episode lifecycle controller.
pub struct TrainingArena {
    catalog: ArenaCatalog,
    scene: Scene,
    builder: ArenaBuilder,
    templates: Box<dyn TemplateRegistry>,
    settings: TrainingSettings,
    rng: ChaCha8Rng,
    seed: u64,
    /// `None` until the first reset.
    current: Option<usize>,
    played: Vec<usize>,
    /// Computed on first use after each catalog load.
    merged: Option<BTreeSet<usize>>,
    lights: LightsSwitch,
    step: u64,
    /// Events raised outside a build, delivered with the next report.
    pending: Vec<ArenaEvent>,
}

impl fmt::Debug for TrainingArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainingArena")
            .field("arenas", &self.catalog.len())
            .field("current", &self.current)
            .field("played", &self.played)
            .field("step", &self.step)
            .field("entities", &self.scene.entity_count())
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

impl TrainingArena {
    /// Creates a controller. No arena is built until the first [`reset`](Self::reset).
    ///
    /// # Errors
    ///
    /// Fails if the decision interval is zero or the merge chain overruns
    /// the catalog.
    pub fn new(
        catalog: ArenaCatalog,
        bounds: ArenaBounds,
        templates: Box<dyn TemplateRegistry>,
        settings: TrainingSettings,
        seed: u64,
    ) -> Result<Self, ArenaError> {
        if settings.decision_interval == 0 {
            return Err(ConfigError::InvalidDecisionInterval.into());
        }
        catalog.validate_merge_chain()?;

        let mut arena = Self {
            catalog,
            scene: Scene::new(bounds),
            builder: ArenaBuilder::new(settings.builder.clone()),
            templates,
            settings,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            current: None,
            played: Vec::new(),
            merged: None,
            lights: LightsSwitch::default(),
            step: 0,
            pending: Vec::new(),
        };
        arena.pending = arena.unreachable_merged_warnings();
        Ok(arena)
    }

    /// Replace the arena builder.
    #[must_use]
    pub fn with_builder(mut self, builder: ArenaBuilder) -> Self {
        self.builder = builder;
        self
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Starts a new episode: picks the next arena and builds it.
    ///
    /// # Errors
    ///
    /// Fails only on a malformed merge chain.
    pub fn reset(&mut self) -> Result<BuildReport, ArenaError> {
        let next = self.choose_next_arena()?;
        self.apply(next)
    }

    /// Builds a specific arena, leaving the played history untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::NotFound`] for an unknown id.
    pub fn load_arena(&mut self, arena_id: usize) -> Result<BuildReport, ArenaError> {
        self.apply(arena_id)
    }

    /// Picks the arena the next reset will build.
    ///
    /// Updates the played history when randomizing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MergeChainOverrun`] if sequential selection
    /// wraps past a final arena that merges forward.
    pub fn choose_next_arena(&mut self) -> Result<usize, ArenaError> {
        let randomize = self.settings.randomize_arenas;
        let eligible = self.eligible_arenas();

        let Some(current) = self.current else {
            if randomize {
                return Ok(eligible.choose(&mut self.rng).copied().unwrap_or(0));
            }
            return Ok(0);
        };

        if !randomize {
            return self.next_sequential(current);
        }

        if !self.played.contains(&current) {
            self.played.push(current);
        }
        if eligible.iter().all(|id| self.played.contains(id)) {
            self.played.clear();
            self.played.push(current);
        }
        let candidates: Vec<usize> = eligible
            .into_iter()
            .filter(|id| !self.played.contains(id))
            .collect();
        Ok(candidates.choose(&mut self.rng).copied().unwrap_or(current))
    }

    /// Replaces the catalog wholesale.
    ///
    /// Arenas whose content changed, and new arenas, are flagged
    /// `to_update`. If the current arena no longer exists, the next reset
    /// behaves like the first one.
    ///
    /// # Errors
    ///
    /// Fails if the new catalog's merge chain overruns it.
    pub fn update_configurations(&mut self, mut catalog: ArenaCatalog) -> Result<(), ArenaError> {
        catalog.validate_merge_chain()?;

        for id in 0..catalog.len() {
            let previous = self.catalog.get(id);
            if let Some(config) = catalog.get_mut(id) {
                config.to_update = match previous {
                    Some(old) if old.same_content(config) => old.to_update,
                    _ => true,
                };
            }
        }

        let total = catalog.len();
        self.catalog = catalog;
        self.merged = None;
        self.played.retain(|id| *id < total);
        if self.current.is_some_and(|id| id >= total) {
            self.current = None;
        }
        info!(total, "arena configurations updated");
        let warnings = self.unreachable_merged_warnings();
        self.pending.extend(warnings);
        Ok(())
    }

    /// Advances one simulation step and evaluates the blackout schedule.
    pub fn tick(&mut self) -> TickOutcome {
        let before = self.lights.is_on();
        let lights_on = self
            .lights
            .light_status(self.step, self.settings.decision_interval);
        let outcome = TickOutcome {
            step: self.step,
            lights_on,
            toggled: lights_on != before,
        };
        self.step += 1;
        outcome
    }

    fn apply(&mut self, arena_id: usize) -> Result<BuildReport, ArenaError> {
        let total = self.catalog.len();
        let Some(config) = self.catalog.get(arena_id) else {
            return Err(ArenaError::NotFound { arena_id, total });
        };
        let lights = config.lights.clone();
        if config.random_seed != 0 {
            self.rng = ChaCha8Rng::seed_from_u64(config.random_seed);
        }

        let old = self.current;
        info!(?old, new = arena_id, total, "arena changed");

        let mut report = BuildReport::new(arena_id);
        report.events.append(&mut self.pending);
        report.events.push(ArenaEvent::ArenaChanged {
            old,
            new: arena_id,
            total,
        });

        self.scene.clear();
        let mut id = arena_id;
        loop {
            let Some(config) = self.catalog.get_mut(id) else {
                return Err(ConfigError::MergeChainOverrun {
                    arena_id: id.saturating_sub(1),
                }
                .into());
            };
            self.builder.build(
                &mut self.scene,
                &mut config.spawnables,
                self.templates.as_ref(),
                &mut self.rng,
                &mut report,
            );
            config.to_update = false;
            if !config.merge_next_arena {
                break;
            }
            id += 1;
        }

        self.lights = lights;
        self.lights.reset();
        self.step = 0;
        self.current = Some(arena_id);
        Ok(report)
    }

    fn next_sequential(&self, current: usize) -> Result<usize, ArenaError> {
        let total = self.catalog.len();
        let mut next = (current + 1) % total;
        for _ in 0..total {
            let preceding = (next + total - 1) % total;
            let merges = self
                .catalog
                .get(preceding)
                .is_some_and(|c| c.merge_next_arena);
            if !merges {
                return Ok(next);
            }
            if next == 0 {
                return Err(ConfigError::MergeChainOverrun { arena_id: preceding }.into());
            }
            next = (next + 1) % total;
        }
        Ok(next)
    }

    fn eligible_arenas(&mut self) -> Vec<usize> {
        let total = self.catalog.len();
        let merged = self.merged_arena_ids();
        (0..total).filter(|id| !merged.contains(id)).collect()
    }

    fn unreachable_merged_warnings(&mut self) -> Vec<ArenaEvent> {
        if !self.settings.randomize_arenas {
            return Vec::new();
        }
        let merged: Vec<usize> = self.merged_arena_ids().iter().copied().collect();
        merged
            .into_iter()
            .map(|id| {
                let head = self.catalog.chain_head(id);
                warn!(
                    arena_id = id,
                    chain_head = head,
                    "merged arena is never drawn directly under randomized selection"
                );
                ArenaEvent::ConfigWarning {
                    message: format!(
                        "arena {id} is never drawn directly; it is only built as part of arena {head}"
                    ),
                }
            })
            .collect()
    }

    // =========================================================================
    // Read-outs
    // =========================================================================

    /// Arenas only reachable through their predecessor's merge flag.
    pub fn merged_arena_ids(&mut self) -> &BTreeSet<usize> {
        self.merged.get_or_insert_with(|| self.catalog.merged_ids())
    }

    /// The active arena, `None` before the first reset.
    #[must_use]
    pub const fn current_arena_id(&self) -> Option<usize> {
        self.current
    }

    /// The active configuration.
    #[must_use]
    pub fn current_configuration(&self) -> Option<&ArenaConfiguration> {
        self.current.and_then(|id| self.catalog.get(id))
    }

    /// Number of arenas in the catalog.
    #[must_use]
    pub fn total_arenas(&self) -> usize {
        self.catalog.len()
    }

    /// Arenas drawn since the history last restarted.
    #[must_use]
    pub fn played_arenas(&self) -> &[usize] {
        &self.played
    }

    /// Episode length of the active arena; 0 means unlimited.
    #[must_use]
    pub fn time_limit(&self) -> u32 {
        self.current_configuration().map_or(0, |c| c.time_limit)
    }

    /// Pass mark of the active arena.
    #[must_use]
    pub fn pass_mark(&self) -> f32 {
        self.current_configuration().map_or(0.0, |c| c.pass_mark)
    }

    /// Returns true if `cumulative_reward` reaches the active arena's pass mark.
    #[must_use]
    pub fn is_success(&self, cumulative_reward: f32) -> bool {
        cumulative_reward >= self.pass_mark()
    }

    /// Steps since the last reset.
    #[must_use]
    pub const fn step(&self) -> u64 {
        self.step
    }

    /// Current lights state.
    #[must_use]
    pub const fn lights_on(&self) -> bool {
        self.lights.is_on()
    }

    /// The scene holding the active arena's entities.
    #[must_use]
    pub const fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The arena catalog.
    #[must_use]
    pub const fn catalog(&self) -> &ArenaCatalog {
        &self.catalog
    }

    /// The seed the controller was created with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Hash of the scene's colliders and the selection state.
    ///
    /// Two controllers with the same seed and catalog report equal hashes
    /// after the same sequence of calls.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        corral::hash_index(self.scene.colliders()).hash(&mut hasher);
        self.current.hash(&mut hasher);
        self.played.hash(&mut hasher);
        self.step.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArenaRecord;
    use crate::entity::TemplateCatalog;
    use crate::spawnable::Spawnable;
    use glam::Vec3;
    use proptest::prelude::*;

    fn catalog(merge_flags: &[bool]) -> ArenaCatalog {
        ArenaCatalog::from_records(
            merge_flags
                .iter()
                .map(|&merge| ArenaRecord {
                    merge_next_arena: merge,
                    ..ArenaRecord::default()
                })
                .collect(),
        )
        .unwrap()
    }

    fn controller(catalog: ArenaCatalog, randomize: bool, seed: u64) -> TrainingArena {
        TrainingArena::new(
            catalog,
            ArenaBounds::default(),
            Box::new(TemplateCatalog::standard()),
            TrainingSettings::default().with_randomization(randomize),
            seed,
        )
        .unwrap()
    }

    #[test]
    fn sequential_cycles_and_wraps() {
        let mut arena = controller(catalog(&[false, false, false]), false, 0);
        let ids: Vec<usize> = (0..5).map(|_| arena.reset().unwrap().arena_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 0, 1]);
    }

    #[test]
    fn sequential_skips_merge_chain() {
        let mut arena = controller(catalog(&[false, true, true, false, false]), false, 0);
        arena.load_arena(1).unwrap();
        assert_eq!(arena.choose_next_arena().unwrap(), 4);
    }

    #[test]
    fn merge_chain_wrapping_to_start_is_skipped() {
        let mut arena = controller(catalog(&[true, false, false]), false, 0);
        arena.load_arena(2).unwrap();
        // 0 merges into 1, so wrapping lands on 0 and then 2.
        assert_eq!(arena.choose_next_arena().unwrap(), 0);
        arena.load_arena(0).unwrap();
        assert_eq!(arena.choose_next_arena().unwrap(), 2);
    }

    #[test]
    fn unknown_arena_is_not_found() {
        let mut arena = controller(catalog(&[false, false]), false, 0);
        assert_eq!(
            arena.load_arena(7).unwrap_err(),
            ArenaError::NotFound { arena_id: 7, total: 2 }
        );
        assert_eq!(arena.current_arena_id(), None);
    }

    #[test]
    fn zero_decision_interval_is_rejected() {
        let result = TrainingArena::new(
            catalog(&[false]),
            ArenaBounds::default(),
            Box::new(TemplateCatalog::standard()),
            TrainingSettings::default().with_decision_interval(0),
            0,
        );
        assert!(matches!(
            result,
            Err(ArenaError::Config(ConfigError::InvalidDecisionInterval))
        ));
    }

    #[test]
    fn randomized_first_reset_avoids_merged_arenas() {
        for seed in 0..20 {
            let mut arena = controller(catalog(&[true, false, true, false]), true, seed);
            let first = arena.reset().unwrap().arena_id;
            assert!(first == 0 || first == 2, "seed {seed} drew {first}");
        }
    }

    #[test]
    fn randomized_single_eligible_arena_repeats() {
        let mut arena = controller(catalog(&[true, false]), true, 3);
        for _ in 0..4 {
            assert_eq!(arena.reset().unwrap().arena_id, 0);
        }
    }

    #[test]
    fn merged_arenas_warn_under_randomization() {
        let mut arena = controller(catalog(&[false, true, false]), true, 0);
        let report = arena.reset().unwrap();
        let warnings: Vec<_> = report
            .events
            .iter()
            .filter(|e| matches!(e, ArenaEvent::ConfigWarning { .. }))
            .collect();
        assert_eq!(warnings.len(), 1);

        let report = arena.reset().unwrap();
        assert!(!report
            .events
            .iter()
            .any(|e| matches!(e, ArenaEvent::ConfigWarning { .. })));
    }

    #[test]
    fn merged_build_keeps_both_arenas() {
        let records = vec![
            ArenaRecord {
                spawnables: vec![
                    Spawnable::new("Agent").with_positions(vec![Vec3::new(36.0, 0.0, 36.0)]),
                    Spawnable::new("Wall")
                        .with_positions(vec![Vec3::new(5.0, 0.0, 5.0)])
                        .with_rotations(vec![Vec3::ZERO])
                        .with_sizes(vec![Vec3::ONE]),
                ],
                time_limit: 100,
                merge_next_arena: true,
                ..ArenaRecord::default()
            },
            ArenaRecord {
                spawnables: vec![
                    Spawnable::new("BadGoal")
                        .with_positions(vec![Vec3::new(30.0, 0.0, 30.0)])
                        .with_rotations(vec![Vec3::ZERO])
                        .with_sizes(vec![Vec3::ONE]),
                ],
                time_limit: 999,
                ..ArenaRecord::default()
            },
        ];
        let mut arena = controller(ArenaCatalog::from_records(records).unwrap(), false, 9);
        let report = arena.reset().unwrap();

        let names: Vec<&str> = arena.scene().entities_sorted().map(|e| e.name()).collect();
        assert!(names.contains(&"Wall"));
        assert!(names.contains(&"BadGoal"));
        assert_eq!(names.iter().filter(|n| **n == "Agent").count(), 1);
        assert_eq!(report.arena_id, 0);
        assert_eq!(arena.time_limit(), 100);
        assert!(arena.catalog().iter().all(|c| !c.to_update));
    }

    #[test]
    fn reset_clears_previous_entities() {
        let mut arena = controller(catalog(&[false, false]), false, 1);
        arena.reset().unwrap();
        let first: Vec<_> = arena.scene().entity_ids_sorted().collect();
        arena.reset().unwrap();
        let second: Vec<_> = arena.scene().entity_ids_sorted().collect();
        assert!(first.iter().all(|id| !second.contains(id)));
    }

    #[test]
    fn custom_builder_controls_parameter_dispatch() {
        use crate::capability::ParameterRegistry;
        use crate::spawnable::OptionalParams;

        let tree = Spawnable::new("SpawnerTree")
            .with_positions(vec![Vec3::new(20.0, 0.0, 20.0)])
            .with_options(OptionalParams {
                ripen_times: Some(vec![3.0]),
                ..OptionalParams::default()
            });
        let records = vec![ArenaRecord {
            spawnables: vec![tree],
            ..ArenaRecord::default()
        }];
        let builder = ArenaBuilder::new(TrainingSettings::default().builder)
            .with_parameters(ParameterRegistry::new());
        let mut arena = controller(ArenaCatalog::from_records(records).unwrap(), false, 3)
            .with_builder(builder);
        arena.reset().unwrap();

        let tree = arena
            .scene()
            .entities_sorted()
            .find(|e| e.name() == "SpawnerTree")
            .unwrap();
        assert_eq!(tree.behavior.ripen_time, None);
    }

    #[test]
    fn tick_drives_lights_and_resets_with_arena() {
        let records = vec![ArenaRecord {
            blackouts: vec![5, 10],
            ..ArenaRecord::default()
        }];
        let mut arena = TrainingArena::new(
            ArenaCatalog::from_records(records).unwrap(),
            ArenaBounds::default(),
            Box::new(TemplateCatalog::standard()),
            TrainingSettings::default().with_decision_interval(2),
            0,
        )
        .unwrap();
        arena.reset().unwrap();

        let outcomes: Vec<TickOutcome> = (0..25).map(|_| arena.tick()).collect();
        assert!(outcomes[..10].iter().all(|o| o.lights_on));
        assert!(outcomes[10..20].iter().all(|o| !o.lights_on));
        assert!(outcomes[20..].iter().all(|o| o.lights_on));
        let toggles: Vec<u64> = outcomes.iter().filter(|o| o.toggled).map(|o| o.step).collect();
        assert_eq!(toggles, vec![10, 20]);

        arena.reset().unwrap();
        assert_eq!(arena.step(), 0);
        assert!(arena.lights_on());
    }

    #[test]
    fn update_flags_changed_and_new_arenas() {
        let mut arena = controller(catalog(&[false, false]), false, 0);
        arena.reset().unwrap();
        arena.reset().unwrap();

        let updated = ArenaCatalog::from_records(vec![
            ArenaRecord::default(),
            ArenaRecord {
                time_limit: 500,
                ..ArenaRecord::default()
            },
            ArenaRecord::default(),
        ])
        .unwrap();
        arena.update_configurations(updated).unwrap();

        let flags: Vec<bool> = arena.catalog().iter().map(|c| c.to_update).collect();
        assert_eq!(flags, vec![false, true, true]);
        assert_eq!(arena.total_arenas(), 3);
        assert_eq!(arena.choose_next_arena().unwrap(), 2);
    }

    #[test]
    fn success_uses_pass_mark() {
        let records = vec![ArenaRecord {
            pass_mark: 2.5,
            ..ArenaRecord::default()
        }];
        let mut arena = controller(ArenaCatalog::from_records(records).unwrap(), false, 0);
        arena.reset().unwrap();
        assert!(!arena.is_success(2.0));
        assert!(arena.is_success(2.5));
    }

    proptest! {
        #[test]
        fn randomized_selection_never_repeats_within_a_cycle(
            seed in any::<u64>(),
            total in 2usize..7,
        ) {
            let mut arena = controller(catalog(&vec![false; total]), true, seed);
            let mut drawn = vec![arena.reset().unwrap().arena_id];
            for _ in 0..(total * 3) {
                drawn.push(arena.reset().unwrap().arena_id);
            }

            for pair in drawn.windows(2) {
                prop_assert_ne!(pair[0], pair[1]);
            }
            // The first cycle visits every arena once.
            let first_cycle: BTreeSet<usize> = drawn[..total].iter().copied().collect();
            prop_assert_eq!(first_cycle.len(), total);
        }
    }
}
