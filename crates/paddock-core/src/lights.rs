//! Blackout scheduling.
//!
//! A [`LightsSwitch`] maps the simulation step counter to a "lights on" flag.
//! Toggle points are given in agent decisions and scaled by the decision
//! interval when compared against the raw step:
//!
//! - A strictly increasing list `[a, b, c, ...]` flips the lights at steps
//!   `a * interval`, `b * interval`, ... and then never again.
//! - A list holding a single negative value `[-k]` flips the lights every
//!   `k * interval` steps for as long as the episode runs.
//!
//! ```
//! use paddock_core::lights::LightsSwitch;
//!
//! let mut lights = LightsSwitch::new(0, &[5, 10]).unwrap();
//! let status: Vec<bool> = (0..25).map(|step| lights.light_status(step, 2)).collect();
//! assert!(status[..10].iter().all(|on| *on));
//! assert!(status[10..20].iter().all(|on| !*on));
//! assert!(status[20..].iter().all(|on| *on));
//! ```

use serde::Serialize;
use tracing::debug;

use crate::error::ConfigError;

/// The sequence of toggle points, in agent decisions.
///
/// Only built through [`BlackoutSchedule::parse`], so it is serialized but
/// never deserialized directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BlackoutSchedule {
    /// Toggle at each listed decision, in order.
    Finite(Vec<u32>),
    /// Toggle every `interval` decisions, forever.
    Periodic {
        /// Decisions between toggles
        interval: u32,
    },
}

impl BlackoutSchedule {
    /// Parses a configured blackout list.
    ///
    /// # Errors
    ///
    /// Fails if a multi-entry list holds a negative step or is not strictly
    /// increasing.
    pub fn parse(blackouts: &[i32]) -> Result<Self, ConfigError> {
        if let [single] = blackouts {
            if *single < 0 {
                return Ok(Self::Periodic {
                    interval: single.unsigned_abs(),
                });
            }
        }

        let mut steps = Vec::with_capacity(blackouts.len());
        for (index, &step) in blackouts.iter().enumerate() {
            let Ok(decision) = u32::try_from(step) else {
                return Err(ConfigError::NegativeBlackoutStep { index, step });
            };
            if let Some(&previous) = index.checked_sub(1).and_then(|i| blackouts.get(i)) {
                if step <= previous {
                    return Err(ConfigError::BlackoutsNotIncreasing {
                        index,
                        previous,
                        next: step,
                    });
                }
            }
            steps.push(decision);
        }
        Ok(Self::Finite(steps))
    }

    /// Returns the configured list this schedule was parsed from.
    #[must_use]
    pub fn to_blackouts(&self) -> Vec<i32> {
        match self {
            Self::Finite(steps) => steps
                .iter()
                .map(|&s| i32::try_from(s).unwrap_or(i32::MAX))
                .collect(),
            Self::Periodic { interval } => vec![0i32.saturating_sub_unsigned(*interval)],
        }
    }

    /// The first toggle point, if any.
    fn first(&self) -> Option<u64> {
        match self {
            Self::Finite(steps) => steps.first().map(|&s| u64::from(s)),
            Self::Periodic { interval } => Some(u64::from(*interval)),
        }
    }
}

/// Scheduled toggling of global scene visibility.
///
/// Serializes its full progress; configurations are loaded through
/// [`ArenaRecord`](crate::config::ArenaRecord) instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LightsSwitch {
    episode_length: u32,
    schedule: BlackoutSchedule,
    cursor: usize,
    next_toggle: Option<u64>,
    on: bool,
}

impl Default for LightsSwitch {
    fn default() -> Self {
        Self {
            episode_length: 0,
            schedule: BlackoutSchedule::Finite(Vec::new()),
            cursor: 0,
            next_toggle: None,
            on: true,
        }
    }
}

impl LightsSwitch {
    /// Builds a switch for an episode of `episode_length` steps.
    ///
    /// # Errors
    ///
    /// Fails on a negative episode length or a malformed blackout list
    /// (see [`BlackoutSchedule::parse`]).
    pub fn new(episode_length: i32, blackouts: &[i32]) -> Result<Self, ConfigError> {
        let Ok(episode_length) = u32::try_from(episode_length) else {
            return Err(ConfigError::NegativeEpisodeLength {
                length: episode_length,
            });
        };
        let schedule = BlackoutSchedule::parse(blackouts)?;
        let next_toggle = schedule.first();
        Ok(Self {
            episode_length,
            schedule,
            cursor: 0,
            next_toggle,
            on: true,
        })
    }

    /// Returns the light state at `step`, flipping it if `step` is the next
    /// toggle point.
    ///
    /// Expects to be called once per step with a non-decreasing step.
    pub fn light_status(&mut self, step: u64, decision_interval: u32) -> bool {
        if let Some(next) = self.next_toggle {
            if step == next.saturating_mul(u64::from(decision_interval)) {
                self.on = !self.on;
                self.advance();
                debug!(step, on = self.on, "lights toggled");
            }
        }
        self.on
    }

    /// Restores the lights and rewinds the schedule to its first toggle point.
    pub fn reset(&mut self) {
        self.on = true;
        self.cursor = 0;
        self.next_toggle = self.schedule.first();
    }

    /// Returns the current state without advancing.
    #[must_use]
    pub const fn is_on(&self) -> bool {
        self.on
    }

    /// Returns the next toggle point in decisions, if one remains.
    #[must_use]
    pub const fn next_toggle(&self) -> Option<u64> {
        self.next_toggle
    }

    /// Returns the episode length this switch was built for.
    #[must_use]
    pub const fn episode_length(&self) -> u32 {
        self.episode_length
    }

    /// Returns the toggle schedule.
    #[must_use]
    pub const fn schedule(&self) -> &BlackoutSchedule {
        &self.schedule
    }

    fn advance(&mut self) {
        match &self.schedule {
            BlackoutSchedule::Finite(steps) => {
                self.cursor += 1;
                self.next_toggle = steps.get(self.cursor).map(|&s| u64::from(s));
            }
            BlackoutSchedule::Periodic { interval } => {
                self.next_toggle = self
                    .next_toggle
                    .map(|n| n.saturating_add(u64::from(*interval)));
            }
        }
    }
}
