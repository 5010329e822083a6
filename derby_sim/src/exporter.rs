//! JSON exporter for frame-by-frame race playback.

use derby_core::HorsePosition;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// A single frame of simulation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimFrame {
    /// Virtual clock reading in milliseconds
    pub time_ms: u64,

    /// Round the frame belongs to
    pub round: u32,

    /// Every horse of the field after this frame
    pub positions: Vec<LanePosition>,
}

/// Position of one horse in a frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanePosition {
    pub horse_id: String,
    pub lane: u32,
    pub position: f64,
    pub finished: bool,
}

impl From<&HorsePosition> for LanePosition {
    fn from(pos: &HorsePosition) -> Self {
        Self {
            horse_id: pos.horse_id.clone(),
            lane: pos.lane,
            position: pos.position,
            finished: pos.is_finished,
        }
    }
}

/// Complete tournament export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceExport {
    /// Seed used
    pub seed: u64,

    /// Clock reading of the last frame in milliseconds
    pub duration_ms: u64,

    /// All frames, across every round
    pub frames: Vec<SimFrame>,

    /// Final verdict of the run
    pub passed: bool,
}

impl RaceExport {
    /// Creates a new export container.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            duration_ms: 0,
            frames: Vec::new(),
            passed: false,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        self.duration_ms = frame.time_ms;
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool) {
        self.passed = passed;
    }

    /// Frames belonging to one round.
    pub fn round_frames(&self, round: u32) -> impl Iterator<Item = &SimFrame> {
        self.frames.iter().filter(move |f| f.round == round)
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
