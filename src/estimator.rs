//! Fixed-iteration Monte Carlo estimate for an ad-hoc army pair, bypassing
//! the shared cache. Both sides soak men-at-arms first and no cavalcade
//! applies, matching the tabletop's default resolution.

use serde::Serialize;

use crate::battle::{Army, Battle, Outcome, Rng};

/// Independent playouts per estimate.
pub const ESTIMATE_ITERATIONS: u32 = 1000;

/// Outcome fractions over the playouts; the three rates sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EstimateRates {
    pub win_a: f64,
    pub tie: f64,
    pub win_b: f64,
}

/// Play the pair out [ESTIMATE_ITERATIONS] times from fresh copies and count
/// outcomes. Nothing is memoized; use [crate::battle::BattleCache] when the
/// same states recur.
pub fn estimate_battle(side_a: &Army, side_b: &Army, rng: &mut Rng) -> EstimateRates {
    let mut win_a = 0u32;
    let mut tie = 0u32;
    let mut win_b = 0u32;
    for _ in 0..ESTIMATE_ITERATIONS {
        let mut playout = Battle::new(*side_a, *side_b);
        match playout.resolve_with(rng) {
            Outcome::SideBDown => win_a += 1,
            Outcome::Mutual => tie += 1,
            Outcome::SideADown => win_b += 1,
        }
    }
    let total = f64::from(ESTIMATE_ITERATIONS);
    EstimateRates {
        win_a: f64::from(win_a) / total,
        tie: f64::from(tie) / total,
        win_b: f64::from(win_b) / total,
    }
}
