//! Tournament - the boundary the presentation/state layer talks to.
//!
//! Owns the horse pool, the authoritative schedule and the race driver.
//! The current race is an index into the schedule, never a second copy, so
//! status and results are only ever written in one place.

use crate::config::TournamentConfig;
use crate::driver::{RaceDriver, RaceObserver, TickStatus};
use crate::engine::SimulationEngine;
use crate::error::Result;
use crate::horse::{Horse, HorseFactory};
use crate::race::{HorsePosition, Race, RaceResult, RaceSchedule};
use crate::schedule::ScheduleBuilder;
use derby_env::RaceContext;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A tournament session: pool, schedule and the race being run.
pub struct Tournament<Ctx: RaceContext> {
    context: Arc<Ctx>,
    config: TournamentConfig,

    horse_factory: HorseFactory,
    schedule_builder: ScheduleBuilder,
    engine: SimulationEngine,
    driver: RaceDriver<Ctx>,

    horses: Vec<Horse>,
    schedule: Option<RaceSchedule>,
    current_index: usize,
    positions: Vec<HorsePosition>,
    is_racing: bool,
    is_paused: bool,
}

impl<Ctx: RaceContext> Tournament<Ctx> {
    /// Creates an empty session wired to the context's clock and randomness.
    pub fn new(context: Arc<Ctx>, config: TournamentConfig) -> Self {
        let random = context.random();
        let engine = SimulationEngine::with_mechanics(random.clone(), config.mechanics);
        let driver = RaceDriver::new(context.clone(), engine.clone());

        Self {
            context,
            config,
            horse_factory: HorseFactory::new(random.clone()),
            schedule_builder: ScheduleBuilder::new(random),
            engine,
            driver,
            horses: Vec::new(),
            schedule: None,
            current_index: 0,
            positions: Vec::new(),
            is_racing: false,
            is_paused: false,
        }
    }

    /// Generates a fresh horse pool. Any existing schedule is left alone.
    pub fn generate_horses(&mut self) -> Result<&[Horse]> {
        self.horses = self.horse_factory.create_horse_pool(self.config.horse_count)?;
        info!("Generated {} horses", self.horses.len());
        Ok(&self.horses)
    }

    /// Builds a new schedule from the pool and selects round 1.
    ///
    /// On error the previous schedule and race state are kept.
    pub fn generate_schedule(&mut self) -> Result<&RaceSchedule> {
        let schedule = self
            .schedule_builder
            .create_schedule_at(&self.horses, self.context.system_time())?;

        self.driver.reset();
        self.is_racing = false;
        self.is_paused = false;
        self.current_index = 0;
        self.positions = schedule
            .races
            .first()
            .map(|race| self.engine.initialize_positions(race))
            .unwrap_or_default();

        info!("Generated schedule {} ({} races)", schedule.id, schedule.races.len());
        Ok(self.schedule.insert(schedule))
    }

    /// Starts the current race, or resumes it if paused.
    ///
    /// Returns false when there is nothing to start: no schedule, a race
    /// already running, or a race that has completed.
    pub fn start_race(&mut self, observer: impl RaceObserver + 'static) -> bool {
        if self.is_racing && !self.is_paused {
            return false;
        }

        let Some(race) = self
            .schedule
            .as_mut()
            .and_then(|s| s.races.get_mut(self.current_index))
        else {
            return false;
        };

        if race.is_completed() {
            warn!("Round {} already completed; start ignored", race.round_number);
            return false;
        }

        if !self.is_paused {
            self.positions = self.engine.initialize_positions(race);
            race.begin();
            debug!("Round {} in progress", race.round_number);
        }

        self.is_racing = true;
        self.is_paused = false;

        self.driver
            .start(self.positions.clone(), race.field(), Box::new(observer));
        true
    }

    /// Pumps one host frame into the driver and records its outcome.
    pub fn tick(&mut self) -> TickStatus {
        let status = self.driver.tick();

        match &status {
            TickStatus::Idle => {}
            TickStatus::Running => {
                if let Some(positions) = self.driver.positions() {
                    self.positions = positions.to_vec();
                }
            }
            TickStatus::Finished { positions, duration } => {
                self.positions = positions.clone();
                self.is_racing = false;
                self.is_paused = false;

                let completed_at = self.context.system_time();
                if let Some(race) = self
                    .schedule
                    .as_mut()
                    .and_then(|s| s.races.get_mut(self.current_index))
                {
                    let result = self
                        .engine
                        .determine_results_at(race, positions, *duration, completed_at);
                    info!(
                        "Round {} ({}m) won by {} in {:.2}s",
                        race.round_number,
                        race.distance,
                        result.winner().unwrap_or("-"),
                        duration.as_secs_f64()
                    );
                    race.complete(result);
                }
            }
        }

        status
    }

    /// Runs the current race to the end, one frame interval per tick.
    ///
    /// Returns the result if the race finished, `None` if it was not
    /// running.
    pub async fn run_current_race(&mut self) -> Option<RaceResult> {
        while self.driver.has_pending_tick() {
            self.context.sleep(self.config.frame_interval).await;

            if let TickStatus::Finished { .. } = self.tick() {
                return self.current_race().and_then(|race| race.results.clone());
            }
        }

        None
    }

    /// Pauses the running race. Returns the running time so far.
    pub fn stop_race(&mut self) -> Option<Duration> {
        if !self.is_racing {
            return None;
        }

        let elapsed = self.driver.stop();
        self.is_racing = false;
        self.is_paused = true;
        elapsed
    }

    /// Moves to the next round and puts its field on the start line.
    ///
    /// Returns `None` (changing nothing) without a schedule or on the last
    /// round.
    pub fn next_race(&mut self) -> Option<(&Race, &[HorsePosition])> {
        let schedule = self.schedule.as_ref()?;
        let next_index = self.current_index + 1;

        let Some(race) = schedule.races.get(next_index) else {
            debug!("No round after {}", self.current_index + 1);
            return None;
        };

        self.driver.reset();
        self.current_index = next_index;
        self.is_racing = false;
        self.is_paused = false;
        self.positions = self.engine.initialize_positions(race);

        debug!("Advanced to round {}", race.round_number);
        Some((race, &self.positions))
    }

    /// Drops the schedule and all race state. The horse pool is kept.
    pub fn reset_races(&mut self) {
        self.driver.reset();
        self.schedule = None;
        self.current_index = 0;
        self.positions.clear();
        self.is_racing = false;
        self.is_paused = false;
    }

    pub fn horses(&self) -> &[Horse] {
        &self.horses
    }

    pub fn schedule(&self) -> Option<&RaceSchedule> {
        self.schedule.as_ref()
    }

    pub fn current_race(&self) -> Option<&Race> {
        self.schedule.as_ref()?.races.get(self.current_index)
    }

    pub fn current_race_index(&self) -> usize {
        self.current_index
    }

    /// 1-based round number of the current race.
    pub fn current_race_number(&self) -> usize {
        self.current_index + 1
    }

    pub fn total_races(&self) -> usize {
        self.schedule.as_ref().map_or(0, |s| s.races.len())
    }

    pub fn has_next_race(&self) -> bool {
        self.current_index + 1 < self.total_races()
    }

    pub fn completed_races(&self) -> Vec<&Race> {
        self.schedule
            .as_ref()
            .map(|s| s.races.iter().filter(|r| r.is_completed()).collect())
            .unwrap_or_default()
    }

    pub fn has_schedule(&self) -> bool {
        self.schedule.is_some()
    }

    pub fn positions(&self) -> &[HorsePosition] {
        &self.positions
    }

    pub fn is_racing(&self) -> bool {
        self.is_racing
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn driver(&self) -> &RaceDriver<Ctx> {
        &self.driver
    }

    pub fn config(&self) -> &TournamentConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HORSES_PER_RACE, RACE_DISTANCES, TOTAL_HORSES, TOTAL_ROUNDS};
    use crate::driver::{DriverState, NoopObserver};
    use crate::error::DerbyError;
    use crate::race::RaceStatus;
    use derby_env::SimContext;
    use std::collections::HashSet;
    use std::sync::Mutex;

    fn tournament(seed: u64) -> (Tournament<SimContext>, Arc<SimContext>) {
        let ctx = SimContext::shared(seed);
        (Tournament::new(ctx.clone(), TournamentConfig::default()), ctx)
    }

    fn scheduled(seed: u64) -> (Tournament<SimContext>, Arc<SimContext>) {
        let (mut t, ctx) = tournament(seed);
        t.generate_horses().unwrap();
        t.generate_schedule().unwrap();
        (t, ctx)
    }

    /// Counts callbacks so tests can check what reached the outside.
    struct Counter(Arc<Mutex<(usize, usize)>>);

    impl RaceObserver for Counter {
        fn on_position_update(&mut self, _positions: &[HorsePosition]) {
            self.0.lock().unwrap().0 += 1;
        }

        fn on_race_complete(&mut self, _positions: &[HorsePosition], _duration: Duration) {
            self.0.lock().unwrap().1 += 1;
        }
    }

    #[test]
    fn test_generate_horses() {
        let (mut t, _) = tournament(1);
        let horses = t.generate_horses().unwrap().to_vec();

        assert_eq!(horses.len(), TOTAL_HORSES);
        assert_eq!(t.horses(), horses.as_slice());
        assert!(!t.has_schedule());
    }

    #[test]
    fn test_generate_schedule_requires_horses() {
        let (mut t, _) = tournament(1);
        assert_eq!(
            t.generate_schedule().unwrap_err(),
            DerbyError::InsufficientHorses { required: 10, available: 0 }
        );
        assert!(!t.has_schedule());
    }

    #[test]
    fn test_generate_schedule_selects_first_round() {
        let (t, _) = scheduled(2);

        assert!(t.has_schedule());
        assert_eq!(t.total_races(), TOTAL_ROUNDS);
        assert_eq!(t.current_race_number(), 1);
        assert_eq!(t.current_race().unwrap().distance, 1200);
        assert_eq!(t.positions().len(), HORSES_PER_RACE);
        assert!(t.positions().iter().all(|p| p.position == 0.0));
        assert!(t.has_next_race());
        assert!(t.completed_races().is_empty());
    }

    #[test]
    fn test_schedule_lanes_match_position_lanes() {
        let (t, _) = scheduled(3);
        let race = t.current_race().unwrap();

        for (entry, position) in race.horses.iter().zip(t.positions()) {
            assert_eq!(entry.id, position.horse_id);
            assert_eq!(entry.lane_number, position.lane);
        }
    }

    #[test]
    fn test_start_race_marks_in_progress() {
        let (mut t, _) = scheduled(4);

        assert!(t.start_race(NoopObserver));
        assert!(t.is_racing());
        assert!(!t.is_paused());
        assert_eq!(t.current_race().unwrap().status, RaceStatus::InProgress);
        assert!(t.driver().has_pending_tick());

        // Second start while running does nothing
        assert!(!t.start_race(NoopObserver));
    }

    #[test]
    fn test_start_race_without_schedule() {
        let (mut t, _) = tournament(5);
        assert!(!t.start_race(NoopObserver));
        assert!(!t.is_racing());
    }

    #[test]
    fn test_tick_updates_positions() {
        let (mut t, ctx) = scheduled(6);
        t.start_race(NoopObserver);

        ctx.advance_time(Duration::from_millis(500));
        assert_eq!(t.tick(), TickStatus::Running);
        assert!(t.positions().iter().all(|p| p.position > 0.0));
    }

    #[test]
    fn test_stop_and_resume_race() {
        let (mut t, ctx) = scheduled(7);
        let counts = Arc::new(Mutex::new((0, 0)));
        t.start_race(Counter(counts.clone()));

        ctx.advance_time(Duration::from_secs(1));
        t.tick();
        let progress: Vec<f64> = t.positions().iter().map(|p| p.position).collect();

        assert_eq!(t.stop_race(), Some(Duration::from_secs(1)));
        assert!(!t.is_racing());
        assert!(t.is_paused());
        assert_eq!(t.stop_race(), None);

        // Paused: frames do nothing
        ctx.advance_time(Duration::from_secs(5));
        assert_eq!(t.tick(), TickStatus::Idle);
        assert_eq!(counts.lock().unwrap().0, 1);

        // Resume keeps the progress made so far
        assert!(t.start_race(Counter(counts.clone())));
        let resumed: Vec<f64> = t.positions().iter().map(|p| p.position).collect();
        assert_eq!(resumed, progress);
        assert_eq!(t.current_race().unwrap().status, RaceStatus::InProgress);
    }

    #[tokio::test]
    async fn test_run_current_race_records_result() {
        let (mut t, _) = scheduled(8);
        let counts = Arc::new(Mutex::new((0, 0)));
        t.start_race(Counter(counts.clone()));

        let result = t.run_current_race().await.unwrap();

        let race = t.current_race().unwrap();
        assert_eq!(race.status, RaceStatus::Completed);
        assert_eq!(race.results.as_ref(), Some(&result));
        assert_eq!(result.race_id, race.id);
        assert_eq!(result.positions.len(), HORSES_PER_RACE);
        let unique: HashSet<_> = result.positions.iter().collect();
        assert_eq!(unique.len(), HORSES_PER_RACE);

        assert!(!t.is_racing());
        assert!(!t.is_paused());
        assert_eq!(t.completed_races().len(), 1);
        assert_eq!(counts.lock().unwrap().1, 1);

        // A completed race cannot be restarted
        assert!(!t.start_race(NoopObserver));
    }

    #[tokio::test]
    async fn test_paused_time_excluded_from_duration() {
        let (mut a, _) = scheduled(9);
        a.start_race(NoopObserver);
        let straight = a.run_current_race().await.unwrap();

        let (mut b, ctx) = scheduled(9);
        b.start_race(NoopObserver);
        for _ in 0..30 {
            ctx.advance_time(Duration::from_millis(16));
            b.tick();
        }
        b.stop_race();
        ctx.advance_time(Duration::from_secs(60));
        b.start_race(NoopObserver);
        let paused = b.run_current_race().await.unwrap();

        // Same seed, same frame cadence: only the pause differs
        assert_eq!(paused.positions, straight.positions);
        assert_eq!(paused.duration, straight.duration);
    }

    #[test]
    fn test_next_race_resets_state() {
        let (mut t, ctx) = scheduled(10);
        t.start_race(NoopObserver);
        ctx.advance_time(Duration::from_secs(1));
        t.tick();

        let (race, positions) = t.next_race().unwrap();
        assert_eq!(race.round_number, 2);
        assert_eq!(race.distance, 1400);
        assert!(positions.iter().all(|p| p.position == 0.0));

        assert_eq!(t.current_race_number(), 2);
        assert!(!t.is_racing());
        assert!(!t.is_paused());
        assert_eq!(t.driver().state(), DriverState::default());
    }

    #[test]
    fn test_reset_races_keeps_pool() {
        let (mut t, _) = scheduled(11);
        let pool = t.horses().to_vec();
        t.start_race(NoopObserver);

        t.reset_races();

        assert!(!t.has_schedule());
        assert_eq!(t.current_race_index(), 0);
        assert!(t.positions().is_empty());
        assert!(!t.is_racing());
        assert!(!t.driver().has_pending_tick());
        assert_eq!(t.horses(), pool.as_slice());
        assert!(t.next_race().is_none());
    }

    #[tokio::test]
    async fn test_full_tournament() {
        let (mut t, _) = scheduled(12);

        for round in 0..TOTAL_ROUNDS {
            let race = t.current_race().unwrap();
            assert_eq!(race.distance, RACE_DISTANCES[round]);

            assert!(t.start_race(NoopObserver));
            assert!(t.run_current_race().await.is_some());

            if round + 1 < TOTAL_ROUNDS {
                assert!(t.next_race().is_some());
            }
        }

        assert_eq!(t.completed_races().len(), TOTAL_ROUNDS);
        assert!(!t.has_next_race());

        // No seventh round
        assert!(t.next_race().is_none());
        assert_eq!(t.current_race_index(), TOTAL_ROUNDS - 1);
        assert!(!t.start_race(NoopObserver));
    }
}
