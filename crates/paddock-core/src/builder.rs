//! The arena builder: turns spawnables into placed entities.
//!
//! # Architecture
//!
//! A build runs in three passes over the configuration:
//!
//! 1. **Bind**: every spawnable is resolved against the template registry.
//!    Unknown names are reported and skipped.
//! 2. **Agent first**: the first instance of the first agent spawnable is
//!    placed before anything else, so user-fixed agent positions never get
//!    blocked by randomly placed objects. An arena holds one agent: every
//!    other agent instance is recorded as [`PlacementOutcome::ExtraAgent`].
//! 3. **Objects**: each remaining spawnable is broadcast into instances and
//!    every instance goes through [`sample_placement`]. If no spawnable
//!    provided the agent, the default agent template is placed last.
//!
//! Failures are soft: an instance that cannot be placed is despawned and
//! recorded in the [`BuildReport`], and the build carries on.
//!
//! # Goal ledger
//!
//! Placed instances whose tag is a countable goal are registered in a
//! [`GoalLedger`]. After every build pass all registered members are told
//! the actual size of their group, so groups spanning merged arenas end up
//! with the same total.

use std::collections::BTreeMap;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::broadcast::{broadcast, InstanceRecord};
use crate::capability::ParameterRegistry;
use crate::config::BuilderSettings;
use crate::entity::{EntityId, EntityTag, EntityTemplate, TemplateRegistry};
use crate::events::ArenaEvent;
use crate::placement::{
    resolve_color, sample_placement, PlacementError, PlacementRequest, PositionRotation, RANDOMIZE,
};
use crate::scene::Scene;
use crate::spawnable::Spawnable;

// =============================================================================
// Goal ledger
// =============================================================================

/// Placed members of each countable goal group, keyed by tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalLedger {
    groups: BTreeMap<EntityTag, Vec<EntityId>>,
}

impl GoalLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a placed member to `tag`'s group.
    pub fn register(&mut self, tag: EntityTag, id: EntityId) {
        self.groups.entry(tag).or_default().push(id);
    }

    /// Number of placed members of `tag`'s group.
    #[must_use]
    pub fn count(&self, tag: EntityTag) -> usize {
        self.groups.get(&tag).map_or(0, Vec::len)
    }

    /// Placed members of `tag`'s group, in placement order.
    #[must_use]
    pub fn members(&self, tag: EntityTag) -> &[EntityId] {
        self.groups.get(&tag).map_or(&[], Vec::as_slice)
    }

    /// Iterates over groups in tag order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityTag, &[EntityId])> + '_ {
        self.groups.iter().map(|(tag, ids)| (*tag, ids.as_slice()))
    }

    /// Returns true if no goal has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

// =============================================================================
// Build report
// =============================================================================

/// How one instance fared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlacementOutcome {
    /// The instance is in the scene.
    Placed {
        /// Final pose
        at: PositionRotation,
        /// Final size
        size: Vec3,
        /// Attempts used
        attempts: u32,
    },
    /// No valid pose was found; the instance was discarded.
    Failed {
        /// Attempts used
        attempts: u32,
    },
    /// The spawnable's template could not be resolved.
    TemplateMissing,
    /// An agent instance beyond the arena's single agent; not placed.
    ExtraAgent,
}

/// The outcome for one instance of one spawnable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementRecord {
    /// Spawnable (template) name
    pub spawnable: String,
    /// Instance index within the spawnable
    pub instance: usize,
    /// The spawned entity, if placement succeeded
    pub entity: Option<EntityId>,
    /// What happened
    pub outcome: PlacementOutcome,
}

/// Everything a build produced.
///
/// Returned only after the build completes; nothing in here describes a
/// partially built arena.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    /// The arena that was built
    pub arena_id: usize,
    /// Per-instance outcomes, in build order
    pub records: Vec<PlacementRecord>,
    /// Instances placed
    pub spawned: usize,
    /// Instances discarded
    pub failed: usize,
    /// Countable goals placed, by group
    pub goal_ledger: GoalLedger,
    /// Events raised during the build
    pub events: Vec<ArenaEvent>,
}

impl BuildReport {
    /// Creates an empty report for `arena_id`.
    #[must_use]
    pub fn new(arena_id: usize) -> Self {
        Self {
            arena_id,
            ..Self::default()
        }
    }

    /// Iterates over successfully placed entities.
    pub fn placed(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.records.iter().filter_map(|r| r.entity)
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Places the entities of one arena configuration into a scene.
#[derive(Debug, Clone)]
pub struct ArenaBuilder {
    settings: BuilderSettings,
    parameters: ParameterRegistry,
}

impl Default for ArenaBuilder {
    fn default() -> Self {
        Self::new(BuilderSettings::default())
    }
}

impl ArenaBuilder {
    /// Creates a builder with the standard parameter registry.
    #[must_use]
    pub fn new(settings: BuilderSettings) -> Self {
        Self {
            settings,
            parameters: ParameterRegistry::standard(),
        }
    }

    /// Replace the parameter registry.
    #[must_use]
    pub fn with_parameters(mut self, parameters: ParameterRegistry) -> Self {
        self.parameters = parameters;
        self
    }

    /// Returns the builder settings.
    #[must_use]
    pub const fn settings(&self) -> &BuilderSettings {
        &self.settings
    }

    /// Builds `spawnables` into `scene`, appending outcomes to `report`.
    ///
    /// The scene is not cleared first; merged arenas are built by calling
    /// this repeatedly with the same scene and report.
    pub fn build<R: Rng + ?Sized>(
        &self,
        scene: &mut Scene,
        spawnables: &mut [Spawnable],
        templates: &dyn TemplateRegistry,
        rng: &mut R,
        report: &mut BuildReport,
    ) {
        for spawnable in spawnables.iter_mut() {
            if !spawnable.bind(templates) {
                warn!(name = %spawnable.name, "no template for spawnable, skipping");
                report.events.push(ArenaEvent::TemplateMissing {
                    name: spawnable.name.clone(),
                });
                report.records.push(PlacementRecord {
                    spawnable: spawnable.name.clone(),
                    instance: 0,
                    entity: None,
                    outcome: PlacementOutcome::TemplateMissing,
                });
            }
        }

        let inherited_agent = scene.has_agent();
        let mut first_agent = true;
        for spawnable in spawnables.iter().filter(|s| s.is_agent()) {
            let Some(template) = &spawnable.template else {
                continue;
            };
            for instance in broadcast(spawnable, template) {
                let first = std::mem::replace(&mut first_agent, false);
                if first && !inherited_agent {
                    self.place_instance(
                        scene,
                        template,
                        instance,
                        self.settings.max_attempts_agent,
                        rng,
                        report,
                    );
                } else {
                    skip_agent_instance(template, instance.index, !first, report);
                }
            }
        }

        for spawnable in spawnables.iter().filter(|s| !s.is_agent()) {
            let Some(template) = &spawnable.template else {
                continue;
            };
            for instance in broadcast(spawnable, template) {
                self.place_instance(
                    scene,
                    template,
                    instance,
                    self.settings.max_attempts_object,
                    rng,
                    report,
                );
            }
        }

        let agent_configured = spawnables.iter().any(Spawnable::is_agent);
        if !agent_configured && !scene.has_agent() {
            self.place_default_agent(scene, templates, rng, report);
        }

        refresh_goal_counts(scene, &report.goal_ledger);
    }

    fn place_default_agent<R: Rng + ?Sized>(
        &self,
        scene: &mut Scene,
        templates: &dyn TemplateRegistry,
        rng: &mut R,
        report: &mut BuildReport,
    ) {
        let name = &self.settings.agent_template;
        let Some(template) = templates.resolve(name) else {
            warn!(name = %name, "default agent template missing");
            report.events.push(ArenaEvent::TemplateMissing { name: name.clone() });
            report.records.push(PlacementRecord {
                spawnable: name.clone(),
                instance: 0,
                entity: None,
                outcome: PlacementOutcome::TemplateMissing,
            });
            return;
        };
        let instance = InstanceRecord {
            index: 0,
            request: PlacementRequest {
                size: template.default_size.unwrap_or(RANDOMIZE),
                ..PlacementRequest::default()
            },
            color: template.default_color,
            params: Vec::new(),
        };
        self.place_instance(
            scene,
            &template,
            instance,
            self.settings.max_attempts_agent,
            rng,
            report,
        );
    }

    fn place_instance<R: Rng + ?Sized>(
        &self,
        scene: &mut Scene,
        template: &EntityTemplate,
        instance: InstanceRecord,
        max_attempts: u32,
        rng: &mut R,
        report: &mut BuildReport,
    ) {
        let id = scene.instantiate(template);
        let sampled = sample_placement(
            scene.colliders(),
            scene.bounds(),
            template,
            &instance.request,
            max_attempts,
            rng,
        );

        match sampled {
            Ok(placement) => {
                let color = resolve_color(instance.color, rng);
                scene.activate(id, &placement, color);
                if let Some(entity) = scene.get_mut(id) {
                    for (name, value) in &instance.params {
                        self.parameters.try_set(entity, name, value);
                    }
                }
                if template.tag.is_countable_goal() {
                    report.goal_ledger.register(template.tag, id);
                }
                debug!(
                    entity = %id,
                    template = %template.name,
                    instance = instance.index,
                    attempts = placement.attempts,
                    "entity placed"
                );
                report.spawned += 1;
                report.records.push(PlacementRecord {
                    spawnable: template.name.clone(),
                    instance: instance.index,
                    entity: Some(id),
                    outcome: PlacementOutcome::Placed {
                        at: placement.at,
                        size: placement.size,
                        attempts: placement.attempts,
                    },
                });
            }
            Err(PlacementError::Exhausted { attempts }) => {
                scene.despawn(id);
                warn!(
                    template = %template.name,
                    instance = instance.index,
                    attempts,
                    "could not place entity, discarding it"
                );
                report.failed += 1;
                report.events.push(ArenaEvent::PlacementFailed {
                    name: template.name.clone(),
                    instance: instance.index,
                    attempts,
                });
                report.records.push(PlacementRecord {
                    spawnable: template.name.clone(),
                    instance: instance.index,
                    entity: None,
                    outcome: PlacementOutcome::Failed { attempts },
                });
            }
        }
    }
}

/// Records an agent instance that was not placed because the scene already
/// holds, or has just been given, its one agent.
fn skip_agent_instance(
    template: &EntityTemplate,
    index: usize,
    duplicate: bool,
    report: &mut BuildReport,
) {
    if duplicate {
        warn!(
            template = %template.name,
            instance = index,
            "arena already has an agent, ignoring extra agent instance"
        );
        report.events.push(ArenaEvent::ConfigWarning {
            message: format!(
                "extra agent {}[{index}] ignored; an arena holds exactly one agent",
                template.name
            ),
        });
    } else {
        debug!(template = %template.name, "agent already placed by a merged arena");
    }
    report.records.push(PlacementRecord {
        spawnable: template.name.clone(),
        instance: index,
        entity: None,
        outcome: PlacementOutcome::ExtraAgent,
    });
}

/// Tells every ledger member the size of its group.
fn refresh_goal_counts(scene: &mut Scene, ledger: &GoalLedger) {
    for (_, members) in ledger.iter() {
        for id in members {
            if let Some(entity) = scene.get_mut(*id) {
                entity.set_number_of_goals(members.len());
            }
        }
    }
}
