//! Race Driver - sequences engine ticks against the host's frame clock.
//!
//! The driver owns a single timer record and at most one pending tick.
//! `start` (or a non-final tick) schedules the next tick; the host pumps
//! `tick()` once per frame. `stop` and `reset` cancel the pending tick, so a
//! paused or reset driver fires no callbacks until it is started again.
//!
//! ```text
//!           start                 stop
//!   Idle ──────────► Running ────────────► Paused
//!    ▲                 │   ▲                 │
//!    │   final tick    │   └──── start ──────┘
//!    └─────────────────┘       (resume)
//!    ▲
//!    └────────── reset (from any state)
//! ```

use crate::engine::SimulationEngine;
use crate::horse::Horse;
use crate::race::HorsePosition;
use derby_env::RaceContext;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Receives race events from the driver.
///
/// On every tick `on_position_update` fires first, then `on_frame`, and on
/// the final tick only, `on_race_complete`.
pub trait RaceObserver: Send {
    /// Positions after one tick's worth of advance.
    fn on_position_update(&mut self, positions: &[HorsePosition]);

    /// Seconds elapsed since the previous tick.
    fn on_frame(&mut self, _delta_secs: f64) {}

    /// Every horse has finished; `duration` excludes paused time.
    fn on_race_complete(&mut self, positions: &[HorsePosition], duration: Duration);
}

/// Observer that ignores every event.
pub struct NoopObserver;

impl RaceObserver for NoopObserver {
    fn on_position_update(&mut self, _positions: &[HorsePosition]) {}

    fn on_race_complete(&mut self, _positions: &[HorsePosition], _duration: Duration) {}
}

/// Snapshot of the driver's timer record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverState {
    pub running: bool,
    pub paused: bool,

    /// Clock reading the race (virtually) started at; moved forward on resume
    pub start_time: Option<Duration>,

    /// Elapsed running time captured by the last `stop`
    pub paused_elapsed: Option<Duration>,

    /// Clock reading of the previous tick
    pub last_frame_time: Option<Duration>,
}

/// What `start` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Fresh race, first tick scheduled
    Started,

    /// Paused race picked up again
    Resumed,

    /// Already running; nothing changed
    AlreadyRunning,
}

/// Result of pumping one host frame.
#[derive(Debug, Clone, PartialEq)]
pub enum TickStatus {
    /// No tick was pending (never started, stopped or reset)
    Idle,

    /// Positions advanced; the next tick is scheduled
    Running,

    /// The race finished on this tick and the driver is back to idle
    Finished {
        positions: Vec<HorsePosition>,
        duration: Duration,
    },
}

struct PendingTick {
    positions: Vec<HorsePosition>,
    horses: Vec<Horse>,
    observer: Box<dyn RaceObserver>,
}

/// Drives one race at a time through the simulation engine.
///
/// Not reentrant: callers sharing a driver across tasks must serialize
/// access (e.g. behind a mutex) so ticks never overlap.
pub struct RaceDriver<Ctx: RaceContext> {
    context: Arc<Ctx>,
    engine: SimulationEngine,
    state: DriverState,
    pending: Option<PendingTick>,
}

impl<Ctx: RaceContext> RaceDriver<Ctx> {
    /// Creates an idle driver.
    pub fn new(context: Arc<Ctx>, engine: SimulationEngine) -> Self {
        Self {
            context,
            engine,
            state: DriverState::default(),
            pending: None,
        }
    }

    /// Starts a fresh race, or resumes a paused one.
    ///
    /// Starting while already running is a benign re-entry: it is logged
    /// and ignored.
    pub fn start(
        &mut self,
        positions: Vec<HorsePosition>,
        horses: Vec<Horse>,
        observer: Box<dyn RaceObserver>,
    ) -> StartOutcome {
        if self.state.running && !self.state.paused {
            warn!("Race driver already running; ignoring start");
            return StartOutcome::AlreadyRunning;
        }

        let now = self.context.now();

        let outcome = if self.state.paused {
            self.state.paused = false;
            self.state.running = true;
            self.state.last_frame_time = Some(now);

            // Shift the start so elapsed time carries on from the pause
            if let Some(elapsed) = self.state.paused_elapsed {
                self.state.start_time = Some(now.saturating_sub(elapsed));
            }

            debug!("Race resumed at {:?}", now);
            StartOutcome::Resumed
        } else {
            self.state.running = true;
            self.state.paused = false;
            self.state.start_time = Some(now);
            self.state.last_frame_time = Some(now);

            debug!("Race started at {:?}", now);
            StartOutcome::Started
        };

        self.pending = Some(PendingTick {
            positions,
            horses,
            observer,
        });

        outcome
    }

    /// Runs the pending tick, if any.
    pub fn tick(&mut self) -> TickStatus {
        let Some(PendingTick {
            positions,
            horses,
            mut observer,
        }) = self.pending.take()
        else {
            return TickStatus::Idle;
        };

        let now = self.context.now();
        let last_frame = self.state.last_frame_time.unwrap_or(now);
        let delta_secs = now.saturating_sub(last_frame).as_secs_f64();
        self.state.last_frame_time = Some(now);

        let update = self
            .engine
            .update_positions(&positions, &horses, delta_secs, Some(now));

        observer.on_position_update(&update.positions);
        observer.on_frame(delta_secs);

        if update.is_finished {
            let start = self.state.start_time.unwrap_or(now);
            let duration = now.saturating_sub(start);

            observer.on_race_complete(&update.positions, duration);
            self.reset();

            debug!("Race finished after {:?}", duration);
            return TickStatus::Finished {
                positions: update.positions,
                duration,
            };
        }

        self.pending = Some(PendingTick {
            positions: update.positions,
            horses,
            observer,
        });

        TickStatus::Running
    }

    /// Pumps frames until the race finishes or nothing is pending.
    ///
    /// Waits `frame_interval` on the context between ticks, which makes a
    /// `SimContext`-driven race instantaneous and fully reproducible.
    pub async fn run(&mut self, frame_interval: Duration) -> TickStatus {
        while self.has_pending_tick() {
            self.context.sleep(frame_interval).await;

            if let finished @ TickStatus::Finished { .. } = self.tick() {
                return finished;
            }
        }

        TickStatus::Idle
    }

    /// Pauses the race.
    ///
    /// Cancels the pending tick. Returns the running time so far if the
    /// driver was running, `None` otherwise.
    pub fn stop(&mut self) -> Option<Duration> {
        self.pending = None;

        if self.state.running {
            if let Some(start) = self.state.start_time {
                let elapsed = self.context.now().saturating_sub(start);
                self.state.paused_elapsed = Some(elapsed);
                self.state.paused = true;
                self.state.running = false;

                debug!("Race paused after {:?}", elapsed);
                return Some(elapsed);
            }
        }

        self.state.running = false;
        None
    }

    /// Cancels any pending tick and returns to the initial idle state.
    pub fn reset(&mut self) {
        self.pending = None;
        self.state = DriverState::default();
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    pub fn has_pending_tick(&self) -> bool {
        self.pending.is_some()
    }

    /// Positions the pending tick will advance from.
    pub fn positions(&self) -> Option<&[HorsePosition]> {
        self.pending.as_ref().map(|p| p.positions.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race::{Race, RaceHorse, RaceStatus};
    use derby_env::{ScriptedRandom, SimContext};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Positions(Vec<f64>),
        Frame(f64),
        Complete(Duration),
    }

    /// Records every callback into a shared log.
    struct Recorder(Arc<Mutex<Vec<Event>>>);

    impl RaceObserver for Recorder {
        fn on_position_update(&mut self, positions: &[HorsePosition]) {
            let values = positions.iter().map(|p| p.position).collect();
            self.0.lock().unwrap().push(Event::Positions(values));
        }

        fn on_frame(&mut self, delta_secs: f64) {
            self.0.lock().unwrap().push(Event::Frame(delta_secs));
        }

        fn on_race_complete(&mut self, _positions: &[HorsePosition], duration: Duration) {
            self.0.lock().unwrap().push(Event::Complete(duration));
        }
    }

    fn recorder() -> (Box<dyn RaceObserver>, Arc<Mutex<Vec<Event>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        (Box::new(Recorder(log.clone())), log)
    }

    fn race() -> Race {
        let horses = (0..2)
            .map(|i| {
                RaceHorse::new(
                    Horse {
                        id: format!("horse-{}", i + 1),
                        name: format!("Horse {}", i + 1),
                        condition: 100 - i * 50, // 100, 50
                        color: "#000000".to_string(),
                    },
                    i + 1,
                )
            })
            .collect();

        Race {
            id: "race-test".to_string(),
            round_number: 1,
            distance: 1200,
            horses,
            results: None,
            status: RaceStatus::Scheduled,
        }
    }

    /// Noiseless driver: speeds are exactly 30 and 15 percent per second.
    fn driver() -> (RaceDriver<SimContext>, Arc<SimContext>) {
        let random = Arc::new(ScriptedRandom::new(vec![0.5]));
        let ctx = Arc::new(SimContext::with_random(1, random.clone()));
        let engine = SimulationEngine::new(random);
        (RaceDriver::new(ctx.clone(), engine), ctx)
    }

    fn start(driver: &mut RaceDriver<SimContext>, observer: Box<dyn RaceObserver>) -> StartOutcome {
        let race = race();
        let positions = driver.engine.initialize_positions(&race);
        driver.start(positions, race.field(), observer)
    }

    #[test]
    fn test_start_schedules_first_tick() {
        let (mut driver, ctx) = driver();
        ctx.advance_time(Duration::from_secs(3));

        assert_eq!(start(&mut driver, Box::new(NoopObserver)), StartOutcome::Started);

        let state = driver.state();
        assert!(state.running);
        assert!(!state.paused);
        assert_eq!(state.start_time, Some(Duration::from_secs(3)));
        assert_eq!(state.last_frame_time, Some(Duration::from_secs(3)));
        assert!(driver.has_pending_tick());
    }

    #[test]
    fn test_start_while_running_is_ignored() {
        let (mut driver, ctx) = driver();
        start(&mut driver, Box::new(NoopObserver));
        let before = driver.state();

        ctx.advance_time(Duration::from_secs(1));
        assert_eq!(start(&mut driver, Box::new(NoopObserver)), StartOutcome::AlreadyRunning);
        assert_eq!(driver.state(), before);
    }

    #[test]
    fn test_tick_event_order_and_delta() {
        let (mut driver, ctx) = driver();
        let (observer, log) = recorder();
        start(&mut driver, observer);

        ctx.advance_time(Duration::from_millis(500));
        assert_eq!(driver.tick(), TickStatus::Running);

        let events = log.lock().unwrap().clone();
        assert_eq!(events, vec![Event::Positions(vec![15.0, 7.5]), Event::Frame(0.5)]);
        assert_eq!(driver.state().last_frame_time, Some(Duration::from_millis(500)));
        assert_eq!(driver.positions().unwrap()[0].position, 15.0);
    }

    #[test]
    fn test_race_completes_and_resets() {
        let (mut driver, ctx) = driver();
        let (observer, log) = recorder();
        start(&mut driver, observer);

        // Slowest horse needs 100 / 15 seconds
        let mut status = TickStatus::Idle;
        for _ in 0..10 {
            ctx.advance_time(Duration::from_secs(1));
            status = driver.tick();
            if matches!(status, TickStatus::Finished { .. }) {
                break;
            }
        }

        match status {
            TickStatus::Finished { positions, duration } => {
                assert_eq!(duration, Duration::from_secs(7));
                assert!(positions.iter().all(|p| p.is_finished));
                // Fast horse finished at t=4s and kept its stamp
                assert_eq!(positions[0].finish_time, Some(Duration::from_secs(4)));
                assert_eq!(positions[1].finish_time, Some(Duration::from_secs(7)));
            }
            other => panic!("expected finish, got {:?}", other),
        }

        let events = log.lock().unwrap().clone();
        assert_eq!(events.last(), Some(&Event::Complete(Duration::from_secs(7))));
        assert_eq!(events.iter().filter(|e| matches!(e, Event::Complete(_))).count(), 1);

        assert_eq!(driver.state(), DriverState::default());
        assert!(!driver.has_pending_tick());
        assert_eq!(driver.tick(), TickStatus::Idle);
    }

    #[test]
    fn test_stop_cancels_pending_tick() {
        let (mut driver, ctx) = driver();
        let (observer, log) = recorder();
        start(&mut driver, observer);

        ctx.advance_time(Duration::from_millis(1200));
        let elapsed = driver.stop();

        assert_eq!(elapsed, Some(Duration::from_millis(1200)));
        assert!(driver.is_paused());
        assert!(!driver.is_running());
        assert!(!driver.has_pending_tick());

        ctx.advance_time(Duration::from_secs(1));
        assert_eq!(driver.tick(), TickStatus::Idle);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let (mut driver, _ctx) = driver();
        assert_eq!(driver.stop(), None);
        assert_eq!(driver.state(), DriverState::default());
    }

    #[test]
    fn test_pause_resume_keeps_elapsed_continuous() {
        let (mut driver, ctx) = driver();
        let (observer, log) = recorder();
        start(&mut driver, observer);

        // Run 2 seconds, pause for 10, resume
        ctx.advance_time(Duration::from_secs(2));
        assert_eq!(driver.tick(), TickStatus::Running);
        let paused_at = driver.positions().unwrap().to_vec();
        assert_eq!(driver.stop(), Some(Duration::from_secs(2)));

        ctx.advance_time(Duration::from_secs(10));
        let (observer, _) = recorder();
        assert_eq!(driver.start(paused_at, race().field(), observer), StartOutcome::Resumed);

        let state = driver.state();
        assert!(state.running && !state.paused);
        assert_eq!(state.start_time, Some(Duration::from_secs(10)));
        assert_eq!(state.last_frame_time, Some(Duration::from_secs(12)));

        let mut finished = None;
        for _ in 0..10 {
            ctx.advance_time(Duration::from_secs(1));
            if let TickStatus::Finished { duration, .. } = driver.tick() {
                finished = Some(duration);
                break;
            }
        }

        // Same 7 seconds of running time as an uninterrupted race
        assert_eq!(finished, Some(Duration::from_secs(7)));
        // The first observer saw only the pre-pause tick
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_first_tick_after_resume_excludes_pause() {
        let (mut driver, ctx) = driver();
        start(&mut driver, Box::new(NoopObserver));
        ctx.advance_time(Duration::from_secs(1));
        driver.tick();
        let positions = driver.positions().unwrap().to_vec();
        driver.stop();

        ctx.advance_time(Duration::from_secs(30));
        let (observer, log) = recorder();
        driver.start(positions, race().field(), observer);
        ctx.advance_time(Duration::from_millis(100));
        driver.tick();

        let events = log.lock().unwrap().clone();
        assert_eq!(events[1], Event::Frame(0.1));
    }

    #[test]
    fn test_reset_from_any_state() {
        let (mut driver, ctx) = driver();

        start(&mut driver, Box::new(NoopObserver));
        driver.reset();
        assert_eq!(driver.state(), DriverState::default());
        assert!(!driver.has_pending_tick());

        start(&mut driver, Box::new(NoopObserver));
        ctx.advance_time(Duration::from_secs(1));
        driver.stop();
        driver.reset();
        assert_eq!(driver.state(), DriverState::default());

        // After reset a start is fresh, not a resume
        assert_eq!(start(&mut driver, Box::new(NoopObserver)), StartOutcome::Started);
    }

    #[tokio::test]
    async fn test_run_to_completion() {
        let (mut driver, ctx) = driver();
        let (observer, log) = recorder();
        start(&mut driver, observer);

        let status = driver.run(Duration::from_millis(100)).await;

        match status {
            TickStatus::Finished { duration, .. } => {
                // 100 / 15 %/s rounds up to the next 100ms frame
                assert_eq!(duration, Duration::from_millis(6700));
                assert_eq!(ctx.now(), Duration::from_millis(6700));
            }
            other => panic!("expected finish, got {:?}", other),
        }

        let events = log.lock().unwrap().clone();
        let frames = events.iter().filter(|e| matches!(e, Event::Frame(_))).count();
        assert_eq!(frames, 67);
        assert!(!driver.has_pending_tick());
    }

    #[tokio::test]
    async fn test_run_without_start_is_idle() {
        let (mut driver, ctx) = driver();
        assert_eq!(driver.run(Duration::from_millis(16)).await, TickStatus::Idle);
        assert_eq!(ctx.now(), Duration::ZERO);
    }
}
