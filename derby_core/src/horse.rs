//! Horse entities and the factory that generates them.
//!
//! Single horses take every field from the caller or from a random default.
//! Pools additionally guarantee that no two horses share an id, a name or a
//! color.

use crate::config::{HORSE_COLORS, HORSE_NAMES, MAX_CONDITION, MIN_CONDITION, TOTAL_HORSES};
use crate::error::{DerbyError, Result};
use derby_env::{unique_token, RandomSource};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// A horse in the pool. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Horse {
    /// Unique identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Condition score in `[MIN_CONDITION, MAX_CONDITION]`; drives base speed
    pub condition: u32,

    /// Silk color (hex)
    pub color: String,
}

impl AsRef<Horse> for Horse {
    fn as_ref(&self) -> &Horse {
        self
    }
}

/// Optional overrides for [`HorseFactory::create_horse`].
///
/// Each field that is left `None` is filled with its own default.
#[derive(Debug, Clone, Default)]
pub struct HorseParams {
    pub id: Option<String>,
    pub name: Option<String>,
    pub condition: Option<u32>,
    pub color: Option<String>,
}

impl HorseParams {
    /// Sets the id override.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the name override.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the condition override.
    pub fn with_condition(mut self, condition: u32) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Sets the color override.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Builds horses and horse pools from an injected random source.
#[derive(Clone)]
pub struct HorseFactory {
    random: Arc<dyn RandomSource>,
}

impl HorseFactory {
    /// Creates a factory drawing from `random`.
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }

    /// Creates a single horse.
    ///
    /// Missing fields default independently: a process-unique id, a random
    /// name and color from the fixed pools, and a condition drawn from
    /// `[MIN_CONDITION, MAX_CONDITION]`. No uniqueness is enforced here.
    pub fn create_horse(&self, params: HorseParams) -> Horse {
        let id = params.id.unwrap_or_else(|| unique_token("horse"));
        let name = params.name.unwrap_or_else(|| self.pick(&HORSE_NAMES).to_string());
        let condition = params.condition.unwrap_or_else(|| self.generate_condition());
        let color = params.color.unwrap_or_else(|| self.pick(&HORSE_COLORS).to_string());

        Horse {
            id,
            name,
            condition,
            color,
        }
    }

    /// Creates the default-sized pool of [`TOTAL_HORSES`] horses.
    pub fn create_default_pool(&self) -> Result<Vec<Horse>> {
        self.create_horse_pool(TOTAL_HORSES)
    }

    /// Creates `count` horses with ids `horse-1..=horse-{count}`.
    ///
    /// Names and colors are drawn without replacement, so the pool never
    /// repeats either.
    ///
    /// # Errors
    /// `ExhaustedPool` once the name (40) or color (20) candidates run out
    /// before `count` horses are built.
    pub fn create_horse_pool(&self, count: usize) -> Result<Vec<Horse>> {
        let mut used_names = HashSet::new();
        let mut used_colors = HashSet::new();
        let mut horses = Vec::with_capacity(count);

        for i in 0..count {
            let name = self.select_unique("names", &HORSE_NAMES, &mut used_names)?;
            let color = self.select_unique("colors", &HORSE_COLORS, &mut used_colors)?;

            horses.push(self.create_horse(
                HorseParams::default()
                    .with_id(format!("horse-{}", i + 1))
                    .with_name(name)
                    .with_color(color),
            ));
        }

        Ok(horses)
    }

    fn generate_condition(&self) -> u32 {
        self.random
            .next_int(MIN_CONDITION as i64, MAX_CONDITION as i64)
            .clamp(MIN_CONDITION as i64, MAX_CONDITION as i64) as u32
    }

    fn pick<'a>(&self, items: &[&'a str]) -> &'a str {
        items[self.index(items.len())]
    }

    /// Picks an item not yet in `used` and records it.
    fn select_unique<'a>(
        &self,
        pool: &'static str,
        items: &[&'a str],
        used: &mut HashSet<&'a str>,
    ) -> Result<&'a str> {
        let available: Vec<&'a str> = items
            .iter()
            .copied()
            .filter(|item| !used.contains(item))
            .collect();

        if available.is_empty() {
            return Err(DerbyError::ExhaustedPool {
                pool,
                available: items.len(),
            });
        }

        let selected = available[self.index(available.len())];
        used.insert(selected);
        Ok(selected)
    }

    /// Uniform index into a non-empty slice of length `len`.
    fn index(&self, len: usize) -> usize {
        let last = len.saturating_sub(1) as i64;
        self.random.next_int(0, last).clamp(0, last) as usize
    }
}
