//! Test helper functions for setting up catalogs and controllers.

use glam::Vec3;

use crate::config::{ArenaBounds, ArenaCatalog, ArenaRecord, TrainingSettings};
use crate::entity::{EntityTag, EntityTemplate, PlacementPolicy, TemplateCatalog};
use crate::spawnable::Spawnable;
use crate::training::TrainingArena;

// =============================================================================
// Spawnables
// =============================================================================

/// A single instance with explicit position, zero rotation and unit size.
///
/// Fully specified requests get exactly one placement attempt, so these
/// either land exactly where asked or fail.
pub fn fixed(name: &str, x: f32, z: f32) -> Spawnable {
    Spawnable::new(name)
        .with_positions(vec![Vec3::new(x, 0.0, z)])
        .with_rotations(vec![Vec3::ZERO])
        .with_sizes(vec![Vec3::ONE])
}

/// Several fixed unit-size instances of one template.
pub fn fixed_many(name: &str, spots: &[(f32, f32)]) -> Spawnable {
    let positions = spots.iter().map(|&(x, z)| Vec3::new(x, 0.0, z)).collect();
    Spawnable::new(name)
        .with_positions(positions)
        .with_rotations(vec![Vec3::ZERO; spots.len()])
        .with_sizes(vec![Vec3::ONE; spots.len()])
}

// =============================================================================
// Catalogs
// =============================================================================

/// An arena record holding `spawnables` and otherwise default.
pub fn record(spawnables: Vec<Spawnable>) -> ArenaRecord {
    ArenaRecord {
        spawnables,
        ..ArenaRecord::default()
    }
}

/// A catalog where arena `i` holds the agent and one goal at a distinct
/// spot, and merges forward if `merge_flags[i]` is set.
pub fn tagged_chain(merge_flags: &[bool]) -> ArenaCatalog {
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap
    )]
    let records = merge_flags
        .iter()
        .enumerate()
        .map(|(i, &merge)| ArenaRecord {
            spawnables: vec![
                fixed("Agent", 36.0, 36.0),
                fixed("BadGoal", 4.0 + 4.0 * i as f32, 8.0),
            ],
            merge_next_arena: merge,
            time_limit: 100 * (i as i32 + 1),
            ..ArenaRecord::default()
        })
        .collect();
    ArenaCatalog::from_records(records).unwrap()
}

/// The standard templates plus a unit "Box" prop with default size 2.
pub fn templates_with_box() -> TemplateCatalog {
    let mut catalog = TemplateCatalog::standard();
    catalog.register(
        EntityTemplate::new("Box", EntityTag::Prop, PlacementPolicy::Grounded)
            .with_size_range(Vec3::splat(0.5), Vec3::splat(5.0))
            .with_default_size(Vec3::splat(2.0)),
    );
    catalog
}

// =============================================================================
// Controllers
// =============================================================================

/// A controller over `catalog` with the standard templates.
pub fn controller(catalog: ArenaCatalog, settings: TrainingSettings, seed: u64) -> TrainingArena {
    TrainingArena::new(
        catalog,
        ArenaBounds::default(),
        Box::new(TemplateCatalog::standard()),
        settings,
        seed,
    )
    .unwrap()
}

/// A sequential controller over the given records.
pub fn sequential(records: Vec<ArenaRecord>, seed: u64) -> TrainingArena {
    controller(
        ArenaCatalog::from_records(records).unwrap(),
        TrainingSettings::default(),
        seed,
    )
}

/// Names of the entities in the scene, in spawn order.
pub fn scene_names(arena: &TrainingArena) -> Vec<String> {
    arena
        .scene()
        .entities_sorted()
        .map(|e| e.name().to_string())
        .collect()
}
