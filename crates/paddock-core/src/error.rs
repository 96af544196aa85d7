//! Error types for arena construction and the arena lifecycle.
//!
//! Only configuration-shape problems are errors. Per-entity placement
//! failures are soft: they are recorded in the
//! [`BuildReport`](crate::builder::BuildReport) and the build carries on.

use thiserror::Error;

/// Fatal configuration errors, raised at load time before any placement.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The episode length (time limit) is negative.
    #[error("episode length must be non-negative, got {length}")]
    NegativeEpisodeLength {
        /// The rejected length.
        length: i32,
    },
    /// A finite blackout list is not strictly increasing.
    #[error("blackout steps must be strictly increasing: step {index} is {next} after {previous}")]
    BlackoutsNotIncreasing {
        /// Index of the offending step.
        index: usize,
        /// The step before it.
        previous: i32,
        /// The offending step.
        next: i32,
    },
    /// A negative step appears in a blackout list with more than one entry.
    #[error("blackout step {index} is negative ({step}); only a single-entry list may encode an interval")]
    NegativeBlackoutStep {
        /// Index of the offending step.
        index: usize,
        /// The offending step.
        step: i32,
    },
    /// The final arena asks to merge into an arena that does not exist.
    #[error("arena {arena_id} is the last arena but sets merge_next_arena")]
    MergeChainOverrun {
        /// The arena whose merge flag overruns the catalog.
        arena_id: usize,
    },
    /// One of the arena bounds markers is missing.
    #[error("arena bounds marker '{marker}' is missing")]
    MissingBoundsMarker {
        /// Which marker is absent.
        marker: &'static str,
    },
    /// The arena floor has no area.
    #[error("arena bounds must have positive width and depth, got {width} x {depth}")]
    DegenerateBounds {
        /// Extent along X.
        width: f32,
        /// Extent along Z.
        depth: f32,
    },
    /// The bounds markers describe an invalid box.
    #[error("invalid arena bounds: {0}")]
    InvalidBounds(#[from] corral::BoundsError),
    /// No arena configurations were supplied.
    #[error("arena catalog is empty")]
    EmptyCatalog,
    /// The agent decision interval must be at least one step.
    #[error("decision interval must be at least 1")]
    InvalidDecisionInterval,
}

/// Errors raised by the arena lifecycle controller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArenaError {
    /// The requested arena does not exist in the catalog.
    #[error("arena {arena_id} not found (catalog holds {total} arenas)")]
    NotFound {
        /// The requested arena.
        arena_id: usize,
        /// Number of arenas in the catalog.
        total: usize,
    },
    /// The configuration is malformed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_messages() {
        let err = ConfigError::BlackoutsNotIncreasing {
            index: 2,
            previous: 10,
            next: 10,
        };
        assert_eq!(
            err.to_string(),
            "blackout steps must be strictly increasing: step 2 is 10 after 10"
        );
        assert_eq!(
            ConfigError::MergeChainOverrun { arena_id: 3 }.to_string(),
            "arena 3 is the last arena but sets merge_next_arena"
        );
    }

    #[test]
    fn arena_error_wraps_config_error() {
        let err: ArenaError = ConfigError::EmptyCatalog.into();
        assert_eq!(err, ArenaError::Config(ConfigError::EmptyCatalog));
        assert_eq!(err.to_string(), "arena catalog is empty");
    }

    #[test]
    fn bounds_error_converts() {
        let bounds_err = corral::BoundsError::NonFinite;
        let err: ConfigError = bounds_err.into();
        assert!(matches!(err, ConfigError::InvalidBounds(_)));
    }
}
