//! # Paddock Core
//!
//! Procedural arena construction and arena lifecycle for agent training.
//!
//! A training run cycles through a catalog of arena configurations. Each
//! reset picks the next arena, clears the scene and places every configured
//! entity at a collision-free position, retrying random candidates until one
//! fits. Arenas may merge into their successor, carry their own random seed
//! and schedule lights-off periods.
//!
//! ## Architecture
//!
//! - **Configuration**: [`config`] validates parsed arena records into a
//!   [`ArenaCatalog`]; [`spawnable`] describes what to place.
//! - **Placement**: [`broadcast`] expands a spawnable into per-instance
//!   requests, [`placement`] samples candidates against the scene's
//!   colliders, and [`builder`] drives both and applies parameters through
//!   [`capability`].
//! - **Lifecycle**: [`training`] selects arenas, builds merge chains and
//!   ticks the [`lights`] schedule.
//!
//! Collision queries run on the [`corral`] substrate.
//!
//! ## Usage
//!
//! ```
//! use paddock_core::{ArenaBounds, ArenaCatalog, ArenaRecord, TemplateCatalog, TrainingArena,
//!     TrainingSettings};
//!
//! let catalog = ArenaCatalog::from_records(vec![ArenaRecord::default()]).unwrap();
//! let mut arena = TrainingArena::new(
//!     catalog,
//!     ArenaBounds::default(),
//!     Box::new(TemplateCatalog::standard()),
//!     TrainingSettings::default(),
//!     7,
//! )
//! .unwrap();
//!
//! let report = arena.reset().unwrap();
//! assert!(arena.scene().has_agent());
//! assert_eq!(report.spawned, 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

// Re-export corral for collision queries
pub use corral;

pub mod broadcast;
pub mod builder;
pub mod capability;
pub mod config;
pub mod entity;
pub mod error;
pub mod events;
pub mod lights;
pub mod placement;
pub mod scene;
pub mod spawnable;
pub mod training;

pub use builder::{ArenaBuilder, BuildReport, PlacementOutcome};
pub use config::{ArenaBounds, ArenaCatalog, ArenaConfiguration, ArenaRecord, TrainingSettings};
pub use entity::{EntityId, EntityTag, EntityTemplate, TemplateCatalog, TemplateRegistry};
pub use error::{ArenaError, ConfigError};
pub use events::ArenaEvent;
pub use lights::LightsSwitch;
pub use scene::Scene;
pub use spawnable::Spawnable;
pub use training::{TickOutcome, TrainingArena};

#[cfg(test)]
mod tests;
