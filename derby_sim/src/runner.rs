//! Tournament runner - plays full tournaments on a virtual clock.

use crate::exporter::{LanePosition, RaceExport, SimFrame};
use derby_core::{
    HorsePosition, RaceObserver, RaceResult, Result, Tournament, TournamentConfig,
};
use derby_env::{RaceContext, SimContext};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// One horse in a round's finishing order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finisher {
    pub horse_id: String,
    pub name: String,
}

/// Outcome of one round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceSummary {
    pub round: u32,

    /// Distance in meters
    pub distance: u32,

    /// Running time of the race
    pub duration: Duration,

    /// Host frames the race took
    pub frames: u64,

    /// Winner first
    pub finishers: Vec<Finisher>,
}

/// Results from running a tournament.
#[derive(Debug, Clone, Serialize)]
pub struct TournamentReport {
    /// Seed used
    pub seed: u64,

    /// Whether every round completed with a full, distinct finishing order
    /// and no round past the last could be started
    pub passed: bool,

    /// Rounds in order
    pub races: Vec<RaceSummary>,

    /// Frames across all rounds
    pub total_frames: u64,

    /// Virtual time the whole tournament took
    pub elapsed: Duration,

    /// Failure message if any
    pub failure_reason: Option<String>,
}

/// Observer that counts frames and optionally records them for export.
struct FrameRecorder {
    context: Arc<SimContext>,
    round: u32,
    frames: Arc<Mutex<u64>>,
    export: Option<Arc<Mutex<RaceExport>>>,
}

impl RaceObserver for FrameRecorder {
    fn on_position_update(&mut self, positions: &[HorsePosition]) {
        if let Some(export) = &self.export {
            let frame = SimFrame {
                time_ms: self.context.now().as_millis() as u64,
                round: self.round,
                positions: positions.iter().map(LanePosition::from).collect(),
            };
            export
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .add_frame(frame);
        }
    }

    fn on_frame(&mut self, _delta_secs: f64) {
        *self.frames.lock().unwrap_or_else(PoisonError::into_inner) += 1;
    }

    fn on_race_complete(&mut self, _positions: &[HorsePosition], duration: Duration) {
        debug!("Round {} crossed the line after {:?}", self.round, duration);
    }
}

/// Runs complete tournaments.
pub struct TournamentRunner {
    /// Master seed
    seed: u64,

    /// Tournament configuration (pool size, frame pacing, speed model)
    config: TournamentConfig,
}

impl TournamentRunner {
    /// Creates a runner with the default configuration.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            config: TournamentConfig::default(),
        }
    }

    /// Sets the pool size.
    pub fn with_horse_count(mut self, count: usize) -> Self {
        self.config.horse_count = count;
        self
    }

    /// Sets the host frame interval.
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.config.frame_interval = interval;
        self
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, config: TournamentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Plays a tournament.
    ///
    /// # Errors
    /// Propagates pool and schedule errors (e.g. `ExhaustedPool` for pools
    /// larger than the color list, `InsufficientHorses` under 10).
    pub async fn run(&self) -> Result<TournamentReport> {
        self.play(None).await
    }

    /// Plays a tournament and records every frame.
    pub async fn run_with_export(&self) -> Result<(TournamentReport, RaceExport)> {
        let export = Arc::new(Mutex::new(RaceExport::new(self.seed)));
        let report = self.play(Some(export.clone())).await?;

        let mut export = export
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        export.finalize(report.passed);
        Ok((report, export))
    }

    async fn play(&self, export: Option<Arc<Mutex<RaceExport>>>) -> Result<TournamentReport> {
        info!("Starting tournament (seed={})", self.seed);

        let context = SimContext::shared(self.seed);
        let mut tournament = Tournament::new(context.clone(), self.config.clone());

        tournament.generate_horses()?;
        tournament.generate_schedule()?;

        let names: HashMap<String, String> = tournament
            .horses()
            .iter()
            .map(|h| (h.id.clone(), h.name.clone()))
            .collect();

        let mut races = Vec::new();
        let mut failure_reason = None;

        loop {
            let Some(race) = tournament.current_race() else {
                break;
            };
            let (round, distance, field_size) = (race.round_number, race.distance, race.horses.len());

            let frames = Arc::new(Mutex::new(0u64));
            let recorder = FrameRecorder {
                context: context.clone(),
                round,
                frames: frames.clone(),
                export: export.clone(),
            };

            if !tournament.start_race(recorder) {
                failure_reason.get_or_insert_with(|| format!("round {} could not be started", round));
                break;
            }

            let Some(result) = tournament.run_current_race().await else {
                failure_reason.get_or_insert_with(|| format!("round {} never finished", round));
                break;
            };

            if let Some(reason) = check_result(&result, field_size) {
                warn!("Round {}: {}", round, reason);
                failure_reason.get_or_insert_with(|| format!("round {}: {}", round, reason));
            }

            let frames = *frames.lock().unwrap_or_else(PoisonError::into_inner);
            races.push(RaceSummary {
                round,
                distance,
                duration: result.duration,
                frames,
                finishers: result
                    .positions
                    .iter()
                    .map(|id| Finisher {
                        horse_id: id.clone(),
                        name: names.get(id).cloned().unwrap_or_default(),
                    })
                    .collect(),
            });

            if tournament.next_race().is_none() {
                break;
            }
        }

        if races.len() != tournament.total_races() {
            failure_reason.get_or_insert_with(|| {
                format!("only {}/{} rounds completed", races.len(), tournament.total_races())
            });
        }

        // Past the last round the tournament must refuse to advance
        if tournament.next_race().is_some() {
            failure_reason.get_or_insert_with(|| "advanced past the final round".to_string());
        }

        let total_frames = races.iter().map(|r| r.frames).sum();
        let passed = failure_reason.is_none();

        Ok(TournamentReport {
            seed: self.seed,
            passed,
            races,
            total_frames,
            elapsed: context.now(),
            failure_reason,
        })
    }
}

/// Returns why a result is malformed, if it is.
fn check_result(result: &RaceResult, field_size: usize) -> Option<String> {
    let distinct: HashSet<&String> = result.positions.iter().collect();

    if result.positions.len() != field_size {
        return Some(format!(
            "{} finishers for a field of {}",
            result.positions.len(),
            field_size
        ));
    }
    if distinct.len() != field_size {
        return Some("duplicate finishers".to_string());
    }
    None
}
