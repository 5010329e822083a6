//! Derby Tournament Simulator
//!
//! Plays complete tournaments on a virtual clock so every run is
//! reproducible from its seed:
//!
//! ```text
//!  generate horses ─► build schedule ─► round 1 ─► ... ─► round 6 ─► report
//!                                         │                  │
//!                                   RaceDriver ticks    next round refused
//!                                  (SimContext clock)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use derby_sim::TournamentRunner;
//!
//! let runner = TournamentRunner::new(42).with_frame_interval(Duration::from_millis(16));
//! let report = runner.run().await?;
//! assert!(report.passed);
//! ```

mod exporter;
pub mod report;
mod runner;

pub use exporter::{LanePosition, RaceExport, SimFrame};
pub use report::{format_ordinal, format_position};
pub use runner::{Finisher, RaceSummary, TournamentReport, TournamentRunner};
