//! Race data model: lane-assigned horses, races, schedules, per-tick
//! positions and results.

use crate::horse::Horse;
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::time::{Duration, SystemTime};

/// A horse entered into a race, with its lane frozen for the race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceHorse {
    #[serde(flatten)]
    pub horse: Horse,

    /// Lane in `1..=HORSES_PER_RACE`, unique within the race
    pub lane_number: u32,
}

impl RaceHorse {
    pub fn new(horse: Horse, lane_number: u32) -> Self {
        Self { horse, lane_number }
    }
}

impl Deref for RaceHorse {
    type Target = Horse;

    fn deref(&self) -> &Horse {
        &self.horse
    }
}

impl AsRef<Horse> for RaceHorse {
    fn as_ref(&self) -> &Horse {
        &self.horse
    }
}

/// Lifecycle of a race.
///
/// `Scheduled -> InProgress -> Completed`. There is no way back; a fresh
/// schedule is the only reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaceStatus {
    Scheduled,
    InProgress,
    Completed,
}

/// A single round of the tournament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Race {
    /// Unique identifier
    pub id: String,

    /// Round number (1-based)
    pub round_number: u32,

    /// Distance in meters
    pub distance: u32,

    /// The field, one horse per lane
    pub horses: Vec<RaceHorse>,

    /// Set once, when the race completes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<RaceResult>,

    /// Current status
    pub status: RaceStatus,
}

impl Race {
    /// Moves a scheduled race to `InProgress`.
    ///
    /// Returns false (and changes nothing) unless the race is `Scheduled`.
    pub fn begin(&mut self) -> bool {
        if self.status != RaceStatus::Scheduled {
            return false;
        }
        self.status = RaceStatus::InProgress;
        true
    }

    /// Records the result and marks the race `Completed`.
    ///
    /// Returns false if the race already has a result; the first result
    /// is never overwritten.
    pub fn complete(&mut self, result: RaceResult) -> bool {
        if self.status == RaceStatus::Completed {
            return false;
        }
        self.results = Some(result);
        self.status = RaceStatus::Completed;
        true
    }

    pub fn is_completed(&self) -> bool {
        self.status == RaceStatus::Completed
    }

    /// Plain horse records of the field, in lane order.
    pub fn field(&self) -> Vec<Horse> {
        self.horses.iter().map(|h| h.horse.clone()).collect()
    }
}

/// The full tournament card: one race per round, in round order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSchedule {
    /// Unique identifier
    pub id: String,

    /// Races in round order; membership never changes after creation
    pub races: Vec<Race>,

    /// When the schedule was built
    pub generated_at: SystemTime,
}

/// Ephemeral per-tick progress of one horse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorsePosition {
    pub horse_id: String,

    /// Percent of the track covered, in `[0, 100]`
    pub position: f64,

    /// Lane (1-based)
    pub lane: u32,

    pub is_finished: bool,

    /// Clock reading of the tick on which the horse crossed the line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_time: Option<Duration>,
}

impl HorsePosition {
    /// A horse at the start line.
    pub fn at_start(horse_id: impl Into<String>, lane: u32) -> Self {
        Self {
            horse_id: horse_id.into(),
            position: 0.0,
            lane,
            is_finished: false,
            finish_time: None,
        }
    }
}

/// Outcome of a completed race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    pub race_id: String,

    /// Horse ids by finishing order, winner first
    pub positions: Vec<String>,

    pub completed_at: SystemTime,

    /// Running time, pauses excluded
    pub duration: Duration,
}

impl RaceResult {
    /// Winning horse id, if the race had any runner.
    pub fn winner(&self) -> Option<&str> {
        self.positions.first().map(String::as_str)
    }
}
