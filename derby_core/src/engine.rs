//! The SIMULATION Engine - frame-stepped race progress.
//!
//! Each tick moves every running horse forward by a condition-driven speed
//! with uniform noise, clamps at the finish line and stamps the tick on
//! which each horse crossed it. Finishing order is decided afterwards from
//! the final positions.

use crate::config::{RaceMechanics, FINISH_LINE};
use crate::horse::Horse;
use crate::race::{HorsePosition, Race, RaceResult};
use derby_env::RandomSource;
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Positions after one tick plus the race-level finish flag.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionUpdate {
    pub positions: Vec<HorsePosition>,

    /// True once every horse has finished
    pub is_finished: bool,
}

/// Advances horse positions and ranks finishers.
#[derive(Clone)]
pub struct SimulationEngine {
    random: Arc<dyn RandomSource>,
    mechanics: RaceMechanics,
}

impl SimulationEngine {
    /// Creates an engine with the default speed model.
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self::with_mechanics(random, RaceMechanics::default())
    }

    /// Creates an engine with a custom speed model.
    pub fn with_mechanics(random: Arc<dyn RandomSource>, mechanics: RaceMechanics) -> Self {
        Self { random, mechanics }
    }

    pub fn mechanics(&self) -> &RaceMechanics {
        &self.mechanics
    }

    /// Puts every horse of the race on the start line.
    ///
    /// Lanes are numbered by field order (index + 1) rather than read from
    /// `lane_number`; schedules never reorder the field, so both agree.
    pub fn initialize_positions(&self, race: &Race) -> Vec<HorsePosition> {
        race.horses
            .iter()
            .enumerate()
            .map(|(index, horse)| HorsePosition::at_start(horse.id.clone(), index as u32 + 1))
            .collect()
    }

    /// Advances all unfinished horses by `delta_secs` of running time.
    ///
    /// `speed = condition / 100 * base + U(-variation, +variation)` in track
    /// percent per second, floored at zero. Positions are clamped to the
    /// finish line; a horse reaching it is marked finished and stamped with
    /// `now`. Finished horses, and horses missing from `horses`, pass
    /// through untouched.
    pub fn update_positions<H: AsRef<Horse>>(
        &self,
        positions: &[HorsePosition],
        horses: &[H],
        delta_secs: f64,
        now: Option<Duration>,
    ) -> PositionUpdate {
        let positions: Vec<HorsePosition> = positions
            .iter()
            .map(|pos| {
                if pos.is_finished {
                    return pos.clone();
                }

                let Some(horse) = horses.iter().map(AsRef::<Horse>::as_ref).find(|h| h.id == pos.horse_id) else {
                    return pos.clone();
                };

                let speed = self.speed(horse);
                let position = (pos.position + speed * delta_secs).clamp(0.0, FINISH_LINE);
                let is_finished = position >= FINISH_LINE;

                HorsePosition {
                    position,
                    is_finished,
                    finish_time: if is_finished { now } else { pos.finish_time },
                    ..pos.clone()
                }
            })
            .collect();

        let is_finished = positions.iter().all(|p| p.is_finished);

        PositionUpdate {
            positions,
            is_finished,
        }
    }

    /// Ranks the final positions, stamping the result with the current time.
    pub fn determine_results(&self, race: &Race, positions: &[HorsePosition], duration: Duration) -> RaceResult {
        self.determine_results_at(race, positions, duration, SystemTime::now())
    }

    /// Ranks the final positions.
    ///
    /// Order: earlier finish stamp first when both horses have one, then
    /// further along the track, then lower lane. The sort is stable.
    pub fn determine_results_at(
        &self,
        race: &Race,
        positions: &[HorsePosition],
        duration: Duration,
        completed_at: SystemTime,
    ) -> RaceResult {
        let mut ranked: Vec<&HorsePosition> = positions.iter().collect();
        stable_sort_by(&mut ranked, |a, b| finish_order(a, b));

        RaceResult {
            race_id: race.id.clone(),
            positions: ranked.into_iter().map(|p| p.horse_id.clone()).collect(),
            completed_at,
            duration,
        }
    }

    fn speed(&self, horse: &Horse) -> f64 {
        let base = horse.condition as f64 / 100.0 * self.mechanics.base_speed_multiplier;
        let range = self.mechanics.speed_variation_range;
        // Horses never run backwards, even when noise outweighs a weak base
        (base + self.random.next_float(-range, range)).max(0.0)
    }
}

fn finish_order(a: &HorsePosition, b: &HorsePosition) -> Ordering {
    if let (Some(ta), Some(tb)) = (a.finish_time, b.finish_time) {
        if ta != tb {
            return ta.cmp(&tb);
        }
    }

    match b.position.total_cmp(&a.position) {
        Ordering::Equal => a.lane.cmp(&b.lane),
        other => other,
    }
}

/// Stable insertion sort.
///
/// `finish_order` is not a total order when stamped and unstamped finishers
/// are mixed, and `slice::sort_by` may panic on inconsistent comparators.
fn stable_sort_by<T, F>(items: &mut [T], mut compare: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && compare(&items[j - 1], &items[j]) == Ordering::Greater {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
}
