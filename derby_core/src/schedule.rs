//! Schedule construction: picks the field and lays out the rounds.

use crate::config::{HORSES_PER_RACE, RACE_DISTANCES, TOTAL_ROUNDS};
use crate::error::{DerbyError, Result};
use crate::horse::Horse;
use crate::race::{Race, RaceHorse, RaceSchedule, RaceStatus};
use derby_env::{unique_token, RandomSource, RandomSourceExt};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::debug;

/// Builds races and full tournament schedules.
#[derive(Clone)]
pub struct ScheduleBuilder {
    random: Arc<dyn RandomSource>,
}

impl ScheduleBuilder {
    /// Creates a builder drawing from `random`.
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }

    /// Creates the race for `round_number` with the given field.
    ///
    /// # Errors
    /// - `InvalidRound` unless `1 <= round_number <= TOTAL_ROUNDS`
    /// - `InvalidHorseCount` unless exactly `HORSES_PER_RACE` horses are given
    pub fn create_race(&self, round_number: u32, horses: Vec<RaceHorse>) -> Result<Race> {
        if round_number < 1 || round_number as usize > TOTAL_ROUNDS {
            return Err(DerbyError::InvalidRound(round_number));
        }

        if horses.len() != HORSES_PER_RACE {
            return Err(DerbyError::InvalidHorseCount {
                expected: HORSES_PER_RACE,
                actual: horses.len(),
            });
        }

        Ok(Race {
            id: unique_token(&format!("race-{}", round_number)),
            round_number,
            distance: RACE_DISTANCES[round_number as usize - 1],
            horses,
            results: None,
            status: RaceStatus::Scheduled,
        })
    }

    /// Builds a schedule stamped with the current wall-clock time.
    pub fn create_schedule(&self, pool: &[Horse]) -> Result<RaceSchedule> {
        self.create_schedule_at(pool, SystemTime::now())
    }

    /// Builds a schedule stamped with `generated_at`.
    ///
    /// Samples `HORSES_PER_RACE` horses without replacement, gives them lanes
    /// `1..=10` in sample order, and enters that same roster in every round.
    ///
    /// # Errors
    /// `InsufficientHorses` if the pool cannot fill a race.
    pub fn create_schedule_at(&self, pool: &[Horse], generated_at: SystemTime) -> Result<RaceSchedule> {
        if pool.len() < HORSES_PER_RACE {
            return Err(DerbyError::InsufficientHorses {
                required: HORSES_PER_RACE,
                available: pool.len(),
            });
        }

        let roster: Vec<RaceHorse> = self
            .random
            .sample(pool, HORSES_PER_RACE)?
            .into_iter()
            .enumerate()
            .map(|(index, horse)| RaceHorse::new(horse, index as u32 + 1))
            .collect();

        let races = (1..=TOTAL_ROUNDS as u32)
            .map(|round| self.create_race(round, roster.clone()))
            .collect::<Result<Vec<_>>>()?;

        let schedule = RaceSchedule {
            id: unique_token("schedule"),
            races,
            generated_at,
        };

        debug!(
            "Built schedule {} with roster [{}]",
            schedule.id,
            roster.iter().map(|h| h.id.as_str()).collect::<Vec<_>>().join(", ")
        );

        Ok(schedule)
    }
}
