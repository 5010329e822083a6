//! Text formatting for result tables.

use crate::runner::{RaceSummary, TournamentReport};
use std::fmt::Write;

/// Zero-pads a finishing position to two digits (`7` -> `"07"`).
pub fn format_position(position: usize) -> String {
    format!("{:02}", position)
}

/// English ordinal of `num` (`1st`, `2nd`, `3rd`, `4th`, `11th`, `21st`).
pub fn format_ordinal(num: u32) -> String {
    let suffix = match (num % 10, num % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", num, suffix)
}

/// Heading used for a round, e.g. `2nd Lap - 1400m`.
pub fn lap_label(summary: &RaceSummary) -> String {
    format!("{} Lap - {}m", format_ordinal(summary.round), summary.distance)
}

/// Renders one round as a ranked table.
pub fn render_race(summary: &RaceSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({:.2}s)", lap_label(summary), summary.duration.as_secs_f64());

    for (rank, finisher) in summary.finishers.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {}  {:<16} {}",
            format_position(rank + 1),
            finisher.name,
            finisher.horse_id
        );
    }

    out
}

/// Renders every round of a tournament.
pub fn render_report(report: &TournamentReport) -> String {
    report
        .races
        .iter()
        .map(render_race)
        .collect::<Vec<_>>()
        .join("\n")
}
