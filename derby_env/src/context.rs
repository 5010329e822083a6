//! Core environment context trait for the race engines.

use crate::random::RandomSource;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// The central interface for environment interaction.
///
/// This trait abstracts the host so the simulation engine and the race
/// driver run unchanged against a real clock or a virtual one.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `Instant`, `tokio::time`, entropy RNG
/// - **Simulation**: `SimContext` - manual virtual clock, seeded RNG
///
/// # Determinism
///
/// Time and randomness are both owned by the implementation, so a seeded
/// context replays the exact same tournament.
#[async_trait]
pub trait RaceContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// The race driver measures frame deltas, finish stamps and race
    /// durations against this clock.
    fn now(&self) -> Duration;

    /// Returns the wall-clock time.
    ///
    /// Used to stamp schedules and results. In simulation this is the
    /// virtual clock plus a fixed epoch.
    fn system_time(&self) -> SystemTime;

    /// Waits for the next host frame.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances the virtual clock
    async fn sleep(&self, duration: Duration);

    /// Returns the randomness capability handed to the engines.
    fn random(&self) -> Arc<dyn RandomSource>;

    /// Returns the context's seed (for logging/debugging).
    ///
    /// In production, returns 0 (not seeded).
    fn seed(&self) -> u64;
}
