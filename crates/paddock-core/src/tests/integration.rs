//! End-to-end tests of the reset/build/tick cycle.

use std::collections::BTreeSet;

use glam::Vec3;
use proptest::prelude::*;

use crate::config::{ArenaBounds, ArenaCatalog, ArenaRecord, TrainingSettings};
use crate::entity::EntityTag;
use crate::error::ArenaError;
use crate::events::ArenaEvent;
use crate::spawnable::{OptionalParams, Spawnable};
use crate::training::TrainingArena;

use super::helpers::{
    controller, fixed, fixed_many, record, scene_names, sequential, tagged_chain,
    templates_with_box,
};

// =============================================================================
// Placement
// =============================================================================

#[test]
fn explicit_position_with_template_default_size() {
    let spawnable = Spawnable::new("Box")
        .with_positions(vec![Vec3::new(5.0, 0.0, 5.0)])
        .with_colors(vec![Vec3::splat(-1.0)]);
    let catalog = ArenaCatalog::from_records(vec![record(vec![spawnable])]).unwrap();
    let mut arena = TrainingArena::new(
        catalog,
        ArenaBounds::default(),
        Box::new(templates_with_box()),
        TrainingSettings::default(),
        11,
    )
    .unwrap();

    let report = arena.reset().unwrap();
    assert_eq!(report.failed, 0);

    let placed: Vec<_> = arena
        .scene()
        .entities_sorted()
        .filter(|e| e.name() == "Box")
        .collect();
    assert_eq!(placed.len(), 1);
    let entity = placed[0];
    assert_eq!(entity.transform().position(), Vec3::new(5.0, 0.0, 5.0));
    assert_eq!(entity.size(), Vec3::splat(2.0));
    for channel in entity.color().to_array() {
        assert!((0.0..=255.0).contains(&channel));
        assert_eq!(channel.fract(), 0.0);
    }
}

#[test]
fn multi_goal_groups_share_their_size() {
    let records = vec![record(vec![
        fixed_many("GoodGoalMulti", &[(5.0, 5.0), (10.0, 5.0), (15.0, 5.0)]),
        fixed("GoodGoal", 30.0, 30.0),
    ])];
    let mut arena = sequential(records, 3);
    let report = arena.reset().unwrap();

    assert_eq!(report.goal_ledger.count(EntityTag::GoodGoalMulti), 3);
    for entity in arena.scene().entities_sorted() {
        match entity.name() {
            "GoodGoalMulti" => assert_eq!(entity.number_of_goals(), Some(3)),
            _ => assert_eq!(entity.number_of_goals(), None),
        }
    }
}

#[test]
fn merged_goal_groups_count_across_the_chain() {
    let records = vec![
        ArenaRecord {
            merge_next_arena: true,
            ..record(vec![fixed("Agent", 36.0, 36.0), fixed("GoodGoalMulti", 5.0, 5.0)])
        },
        record(vec![fixed("GoodGoalMulti", 15.0, 15.0)]),
    ];
    let mut arena = sequential(records, 3);
    arena.reset().unwrap();

    let counts: Vec<_> = arena
        .scene()
        .entities_sorted()
        .filter(|e| e.tag() == EntityTag::GoodGoalMulti)
        .map(|e| e.number_of_goals())
        .collect();
    assert_eq!(counts, vec![Some(2), Some(2)]);
}

#[test]
fn failed_placements_are_reported_and_discarded() {
    let records = vec![record(vec![fixed_many(
        "Cardbox1",
        &[(10.0, 10.0), (10.0, 10.0)],
    )])];
    let mut arena = sequential(records, 5);
    let report = arena.reset().unwrap();

    assert_eq!(report.failed, 1);
    assert!(report.events.contains(&ArenaEvent::PlacementFailed {
        name: "Cardbox1".to_string(),
        instance: 1,
        attempts: 1,
    }));
    let boxes = scene_names(&arena).iter().filter(|n| *n == "Cardbox1").count();
    assert_eq!(boxes, 1);
}

#[test]
fn unknown_templates_do_not_abort_the_build() {
    let records = vec![record(vec![
        Spawnable::new("Unicorn"),
        fixed("BadGoal", 12.0, 12.0),
    ])];
    let mut arena = sequential(records, 5);
    let report = arena.reset().unwrap();

    assert!(report.events.contains(&ArenaEvent::TemplateMissing {
        name: "Unicorn".to_string(),
    }));
    let names = scene_names(&arena);
    assert!(names.contains(&"BadGoal".to_string()));
    assert!(arena.scene().has_agent());
}

#[test]
fn optional_parameters_reach_the_entity() {
    let tree = fixed("SpawnerTree", 20.0, 20.0).with_options(OptionalParams {
        ripen_times: Some(vec![3.0]),
        ..OptionalParams::default()
    });
    let mut arena = sequential(vec![record(vec![tree])], 5);
    arena.reset().unwrap();

    let tree = arena
        .scene()
        .entities_sorted()
        .find(|e| e.name() == "SpawnerTree")
        .unwrap();
    assert_eq!(tree.behavior.ripen_time, Some(3.0));
    assert_eq!(tree.size(), Vec3::new(2.5, 5.0, 2.5));
}

// =============================================================================
// Selection
// =============================================================================

#[test]
fn sequential_selection_skips_merged_arenas() {
    let mut arena = controller(
        tagged_chain(&[false, true, true, false, false]),
        TrainingSettings::default(),
        0,
    );

    let mut ids = Vec::new();
    for _ in 0..4 {
        ids.push(arena.reset().unwrap().arena_id);
        if arena.current_arena_id() == Some(1) {
            let goals = scene_names(&arena).iter().filter(|n| *n == "BadGoal").count();
            assert_eq!(goals, 3);
            assert_eq!(arena.time_limit(), 200);
        }
    }
    assert_eq!(ids, vec![0, 1, 4, 0]);
}

#[test]
fn load_arena_rejects_unknown_ids() {
    let mut arena = controller(tagged_chain(&[false; 5]), TrainingSettings::default(), 0);
    assert_eq!(
        arena.load_arena(9).unwrap_err(),
        ArenaError::NotFound {
            arena_id: 9,
            total: 5
        }
    );
    assert_eq!(arena.reset().unwrap().arena_id, 0);
}

#[test]
fn arena_changed_reports_previous_arena() {
    let mut arena = controller(tagged_chain(&[false; 3]), TrainingSettings::default(), 0);
    arena.reset().unwrap();
    let report = arena.load_arena(2).unwrap();
    assert!(report.events.contains(&ArenaEvent::ArenaChanged {
        old: Some(0),
        new: 2,
        total: 3,
    }));
}

// =============================================================================
// Lights
// =============================================================================

#[test]
fn periodic_blackout_through_ticks() {
    let records = vec![ArenaRecord {
        blackouts: vec![-20],
        ..ArenaRecord::default()
    }];
    let mut arena = controller(
        ArenaCatalog::from_records(records).unwrap(),
        TrainingSettings::default().with_decision_interval(1),
        0,
    );
    arena.reset().unwrap();

    let lights: Vec<bool> = (0..60).map(|_| arena.tick().lights_on).collect();
    assert!(lights[..20].iter().all(|on| *on));
    assert!(lights[20..40].iter().all(|on| !*on));
    assert!(lights[40..].iter().all(|on| *on));
}

proptest! {
    #[test]
    fn randomized_selection_never_draws_merged_arenas(seed in any::<u64>()) {
        let flags = [false, true, true, false, false, true, false];
        let merged: BTreeSet<usize> = [2, 3, 6].into_iter().collect();
        let mut arena = controller(
            tagged_chain(&flags),
            TrainingSettings::default().with_randomization(true),
            seed,
        );

        let mut previous = None;
        for _ in 0..12 {
            let id = arena.reset().unwrap().arena_id;
            prop_assert!(!merged.contains(&id));
            prop_assert_ne!(Some(id), previous);
            previous = Some(id);
        }
    }
}
