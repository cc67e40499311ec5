//! Odds table export. One row per cached battle state; the header and column
//! order are fixed — downstream reporting tools key on them.

use std::io;
use std::path::Path;

use crate::battle::cache::BattleCache;

/// Column order of the exported odds table. Do not reorder.
pub const ODDS_HEADERS: [&str; 13] = [
    "a_men",
    "a_knights",
    "a_leader",
    "a_strength",
    "a_structure",
    "b_men",
    "b_knights",
    "b_leader",
    "b_strength",
    "b_structure",
    "a_win_rate",
    "b_win_rate",
    "tie_rate",
];

/// Write the full odds table for every cached state. Rates are decimal
/// fractions in `[0, 1]`.
pub fn write_odds_csv<W: io::Write>(cache: &BattleCache, writer: W) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(ODDS_HEADERS)?;
    for (battle, tally) in cache.records() {
        let samples = tally.samples() as f64;
        let a = battle.side_a;
        let b = battle.side_b;
        // Code +1 marks side B incapacitated, i.e. side A carried the field.
        let a_win_rate = tally.losses as f64 / samples;
        let b_win_rate = tally.wins as f64 / samples;
        let tie_rate = tally.ties as f64 / samples;
        out.write_record(&[
            a.men_at_arms.to_string(),
            a.knights.to_string(),
            a.leader.as_str().to_string(),
            a.strength_points().to_string(),
            a.structure.as_str().to_string(),
            b.men_at_arms.to_string(),
            b.knights.to_string(),
            b.leader.as_str().to_string(),
            b.strength_points().to_string(),
            b.structure.as_str().to_string(),
            a_win_rate.to_string(),
            b_win_rate.to_string(),
            tie_rate.to_string(),
        ])?;
    }
    out.flush()?;
    Ok(())
}

/// [write_odds_csv] straight to a file path.
pub fn export_odds_csv(cache: &BattleCache, path: impl AsRef<Path>) -> Result<(), csv::Error> {
    let file = std::fs::File::create(path)?;
    write_odds_csv(cache, file)
}
