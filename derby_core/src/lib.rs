//! Derby Core - Horse Race Tournament Engines
//!
//! A tournament draws a pool of horses, builds a six-round card over a
//! fixed distance ladder and runs each race frame by frame until every
//! horse is past the post:
//!
//! 1. **Entities**: `HorseFactory` builds horses and name/color-unique pools
//! 2. **Scheduling**: `ScheduleBuilder` samples the field and lays out the rounds
//! 3. **Simulation**: `SimulationEngine` steps positions and ranks finishers
//! 4. **Driving**: `RaceDriver` paces ticks against the host clock with pause/resume
//!
//! `Tournament` ties them together behind the operations a UI layer needs.
//! Clock and randomness come from a `derby_env::RaceContext`, so any run
//! can be replayed from its seed.

pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod horse;
pub mod race;
pub mod schedule;
pub mod tournament;

// Re-export key types for convenience
pub use config::{RaceMechanics, TournamentConfig};
pub use driver::{DriverState, NoopObserver, RaceDriver, RaceObserver, StartOutcome, TickStatus};
pub use engine::{PositionUpdate, SimulationEngine};
pub use error::{DerbyError, Result};
pub use horse::{Horse, HorseFactory, HorseParams};
pub use race::{HorsePosition, Race, RaceHorse, RaceResult, RaceSchedule, RaceStatus};
pub use schedule::ScheduleBuilder;
pub use tournament::Tournament;
