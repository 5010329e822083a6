//! Simulation context implementing RaceContext for deterministic runs.

use crate::random::{ChaChaRandom, RandomSource};
use crate::RaceContext;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Simulation context backed by a virtual clock and a replaceable RNG.
///
/// This implements `RaceContext` using:
/// - A virtual clock that only moves when advanced (or slept on)
/// - A seeded ChaCha8 stream, or any injected `RandomSource`
///
/// Clones share both the clock and the random source.
#[derive(Clone)]
pub struct SimContext {
    /// Master seed for this simulation
    seed: u64,

    /// Current virtual time (nanoseconds since simulation start)
    virtual_time_ns: Arc<AtomicU64>,

    random: Arc<dyn RandomSource>,

    /// Epoch offset (virtual time 0 maps to this wall-clock time)
    epoch: SystemTime,
}

impl SimContext {
    /// Creates a new SimContext with a ChaCha stream seeded from `seed`.
    pub fn new(seed: u64) -> Self {
        Self::with_random(seed, Arc::new(ChaChaRandom::from_seed(seed)))
    }

    /// Creates a SimContext that draws from the given random source.
    pub fn with_random(seed: u64, random: Arc<dyn RandomSource>) -> Self {
        Self {
            seed,
            virtual_time_ns: Arc::new(AtomicU64::new(0)),
            random,
            epoch: UNIX_EPOCH + Duration::from_secs(1704067200), // 2024-01-01 00:00:00 UTC
        }
    }

    /// Creates an Arc-wrapped context for sharing.
    pub fn shared(seed: u64) -> Arc<Self> {
        Arc::new(Self::new(seed))
    }

    /// Advances virtual time by the given duration.
    pub fn advance_time(&self, duration: Duration) {
        self.virtual_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Sets the virtual time to a specific value.
    pub fn set_time(&self, time_ns: u64) {
        self.virtual_time_ns.store(time_ns, Ordering::SeqCst);
    }

    /// Returns the current virtual time in nanoseconds.
    pub fn time_ns(&self) -> u64 {
        self.virtual_time_ns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RaceContext for SimContext {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.time_ns())
    }

    fn system_time(&self) -> SystemTime {
        self.epoch + self.now()
    }

    async fn sleep(&self, duration: Duration) {
        // Virtual frames are instantaneous
        self.advance_time(duration);
    }

    fn random(&self) -> Arc<dyn RandomSource> {
        self.random.clone()
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}
