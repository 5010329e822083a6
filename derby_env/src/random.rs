//! Pluggable randomness for the race engines.
//!
//! Every component that needs entropy receives an `Arc<dyn RandomSource>`
//! instead of reaching for a global RNG. Production code uses
//! [`ChaChaRandom`]; tests substitute a [`ScriptedRandom`] that replays a
//! fixed sequence so speeds, picks and schedules are fully predictable.

use crate::error::EnvError;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::{Mutex, PoisonError};

/// Source of uniform random draws.
///
/// The trait is object safe; the generic `shuffle`/`sample` helpers live on
/// [`RandomSourceExt`], which every `RandomSource` (including
/// `dyn RandomSource`) gets for free.
pub trait RandomSource: Send + Sync {
    /// Returns an integer in `[min, max]` (both bounds inclusive).
    fn next_int(&self, min: i64, max: i64) -> i64;

    /// Returns a float in `[min, max)`.
    fn next_float(&self, min: f64, max: f64) -> f64;

    /// Returns the order in which `len` items should be rearranged.
    fn permutation(&self, len: usize) -> Vec<usize>;

    /// Picks `count` distinct indices out of `0..len`.
    ///
    /// # Errors
    /// `EnvError::InvalidArgument` when `count > len`.
    fn sample_indices(&self, len: usize, count: usize) -> Result<Vec<usize>, EnvError> {
        if count > len {
            return Err(EnvError::invalid_argument(format!(
                "cannot sample {} items out of {}",
                count, len
            )));
        }

        let mut order = self.permutation(len);
        order.truncate(count);
        Ok(order)
    }
}

/// Generic conveniences layered over [`RandomSource`].
pub trait RandomSourceExt: RandomSource {
    /// Returns a shuffled copy of `items` (same multiset, new order).
    fn shuffle<T: Clone>(&self, items: &[T]) -> Vec<T> {
        self.permutation(items.len())
            .into_iter()
            .map(|i| items[i].clone())
            .collect()
    }

    /// Picks `count` distinct elements of `items` without replacement.
    fn sample<T: Clone>(&self, items: &[T], count: usize) -> Result<Vec<T>, EnvError> {
        Ok(self
            .sample_indices(items.len(), count)?
            .into_iter()
            .map(|i| items[i].clone())
            .collect())
    }
}

impl<R: RandomSource + ?Sized> RandomSourceExt for R {}

/// Production random source backed by a ChaCha8 stream.
pub struct ChaChaRandom {
    /// Seed the stream was created from (0 when drawn from OS entropy)
    seed: u64,

    rng: Mutex<ChaCha8Rng>,
}

impl ChaChaRandom {
    /// Creates a source seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            seed: 0,
            rng: Mutex::new(ChaCha8Rng::from_entropy()),
        }
    }

    /// Creates a reproducible source from a 64-bit seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// Returns the seed (0 for entropy-seeded sources).
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for ChaChaRandom {
    fn next_int(&self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(min..=max)
    }

    fn next_float(&self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(min..max)
    }

    fn permutation(&self, len: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..len).collect();
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        // Fisher-Yates
        order.shuffle(&mut *rng);
        order
    }
}

/// Test double that replays a fixed sequence of values in `[0, 1)`.
///
/// Each draw takes the next value `v` (wrapping around at the end) and maps
/// it linearly onto the requested range: `min + v * (max - min)`, floored for
/// integers. With an empty sequence every draw returns `min`. Shuffling is
/// the identity, so sampling always takes the leading items.
#[derive(Default)]
pub struct ScriptedRandom {
    script: Mutex<Script>,
}

#[derive(Default)]
struct Script {
    values: Vec<f64>,
    cursor: usize,
}

impl Script {
    fn draw(&mut self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        Some(value)
    }
}

impl ScriptedRandom {
    /// Creates a source replaying `values`.
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            script: Mutex::new(Script { values, cursor: 0 }),
        }
    }

    /// Replaces the sequence and rewinds to its first value.
    pub fn set_sequence(&self, values: Vec<f64>) {
        let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        script.values = values;
        script.cursor = 0;
    }

    /// Number of values consumed so far.
    pub fn draws(&self) -> usize {
        self.script.lock().unwrap_or_else(PoisonError::into_inner).cursor
    }

    fn draw(&self) -> Option<f64> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner).draw()
    }
}

impl RandomSource for ScriptedRandom {
    fn next_int(&self, min: i64, max: i64) -> i64 {
        match self.draw() {
            Some(value) => (min as f64 + value * (max - min) as f64).floor() as i64,
            None => min,
        }
    }

    fn next_float(&self, min: f64, max: f64) -> f64 {
        match self.draw() {
            Some(value) => min + value * (max - min),
            None => min,
        }
    }

    fn permutation(&self, len: usize) -> Vec<usize> {
        (0..len).collect()
    }
}
