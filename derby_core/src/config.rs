//! Game constants and tunables.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default size of the horse pool.
pub const TOTAL_HORSES: usize = 20;

/// Field size of every race.
pub const HORSES_PER_RACE: usize = 10;

/// Rounds per tournament.
pub const TOTAL_ROUNDS: usize = 6;

/// Race distance in meters for each round, in round order.
pub const RACE_DISTANCES: [u32; TOTAL_ROUNDS] = [1200, 1400, 1600, 1800, 2000, 2200];

/// Lowest condition a generated horse can have.
pub const MIN_CONDITION: u32 = 60;

/// Highest condition a generated horse can have.
pub const MAX_CONDITION: u32 = 100;

/// Track progress (percent) at which a horse has finished.
pub const FINISH_LINE: f64 = 100.0;

/// Candidate horse names; pool generation draws without replacement.
pub const HORSE_NAMES: [&str; 40] = [
    "Thunder Bolt", "Lightning Strike", "Wind Runner", "Storm Chaser",
    "Midnight Star", "Golden Arrow", "Silver Dream", "Fire Dancer",
    "Ocean Wave", "Mountain King", "Desert Rose", "Arctic Fox",
    "Crimson Glory", "Emerald Isle", "Diamond Dust", "Shadow Walker",
    "Sun Burst", "Moon Beam", "Star Gazer", "Cloud Jumper",
    "Iron Will", "Brave Heart", "Swift Arrow", "Noble Spirit",
    "Wild Fire", "Ice Crystal", "Ruby Red", "Sapphire Blue",
    "Jade Emperor", "Pearl Diver", "Gold Rush", "Silver Lining",
    "Bronze Age", "Copper King", "Steel Runner", "Titanium Force",
    "Velocity Max", "Speed Demon", "Quick Silver", "Flash Forward",
];

/// Candidate silk colors; pool generation draws without replacement.
pub const HORSE_COLORS: [&str; 20] = [
    "#DC143C", "#4169E1", "#FFD700", "#32CD32", "#FF69B4",
    "#8A2BE2", "#FF8C00", "#20B2AA", "#FF1493", "#00CED1",
    "#9370DB", "#FF6347", "#48D1CC", "#DA70D6", "#F0E68C",
    "#6495ED", "#FF7F50", "#40E0D0", "#EE82EE", "#98FB98",
];

/// Speed model parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaceMechanics {
    /// Track percent per second at condition 100
    pub base_speed_multiplier: f64,

    /// Uniform noise added to every speed draw, in +/- percent per second
    pub speed_variation_range: f64,
}

impl Default for RaceMechanics {
    fn default() -> Self {
        Self {
            base_speed_multiplier: 30.0,
            speed_variation_range: 5.0,
        }
    }
}

/// Configuration for a tournament session.
#[derive(Debug, Clone)]
pub struct TournamentConfig {
    /// Horses generated per pool
    pub horse_count: usize,

    /// Wait between host frames when a race is run to completion
    pub frame_interval: Duration,

    /// Speed model
    pub mechanics: RaceMechanics,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            horse_count: TOTAL_HORSES,
            frame_interval: Duration::from_millis(16),
            mechanics: RaceMechanics::default(),
        }
    }
}
