//! Events raised while building and cycling arenas.
//!
//! Events are collected into the [`BuildReport`](crate::builder::BuildReport)
//! returned by each build, so consumers read them after the build completes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Something a UI or telemetry consumer may want to know about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArenaEvent {
    /// A different arena became active.
    ArenaChanged {
        /// Previous arena, `None` on the first build
        old: Option<usize>,
        /// New arena
        new: usize,
        /// Number of arenas in the catalog
        total: usize,
    },
    /// An instance could not be placed and was discarded.
    PlacementFailed {
        /// Template name
        name: String,
        /// Instance index within its spawnable
        instance: usize,
        /// Attempts made
        attempts: u32,
    },
    /// A spawnable names a template the registry does not know.
    TemplateMissing {
        /// The unresolved name
        name: String,
    },
    /// A configuration is accepted but likely not what was meant.
    ConfigWarning {
        /// Human-readable description
        message: String,
    },
}

impl fmt::Display for ArenaEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArenaChanged { old: Some(old), new, total } => {
                write!(f, "arena changed: {old} -> {new} (of {total})")
            }
            Self::ArenaChanged { old: None, new, total } => {
                write!(f, "arena changed: {new} (of {total})")
            }
            Self::PlacementFailed {
                name,
                instance,
                attempts,
            } => write!(f, "could not place {name}[{instance}] after {attempts} attempts"),
            Self::TemplateMissing { name } => write!(f, "no template named {name}"),
            Self::ConfigWarning { message } => write!(f, "configuration warning: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let changed = ArenaEvent::ArenaChanged {
            old: Some(1),
            new: 2,
            total: 5,
        };
        assert_eq!(changed.to_string(), "arena changed: 1 -> 2 (of 5)");

        let failed = ArenaEvent::PlacementFailed {
            name: "Wall".to_string(),
            instance: 3,
            attempts: 20,
        };
        assert_eq!(failed.to_string(), "could not place Wall[3] after 20 attempts");
    }
}
