//! Production implementation of RaceContext using Tokio.

use crate::random::{ChaChaRandom, RandomSource};
use crate::RaceContext;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

/// Production context backed by Tokio and OS entropy.
///
/// Time comes from the system clock, randomness from an entropy-seeded
/// ChaCha stream.
pub struct TokioContext {
    /// Start time for monotonic duration calculations
    start: Instant,

    random: Arc<ChaChaRandom>,
}

impl TokioContext {
    /// Creates a new TokioContext.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            random: Arc::new(ChaChaRandom::from_entropy()),
        }
    }

    /// Creates an Arc-wrapped context for sharing across tasks.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for TokioContext {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RaceContext for TokioContext {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn random(&self) -> Arc<dyn RandomSource> {
        self.random.clone()
    }

    fn seed(&self) -> u64 {
        // Production is not seeded
        0
    }
}
