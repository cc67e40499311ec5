pub mod army;
pub mod cache;
pub mod export_csv;
pub mod rng;
pub mod rounds;

pub use army::{
    Allocation, Army, ArmyLeader, DamageStrategy, DefensiveStructure, KNIGHT_POINTS, MAX_KNIGHTS,
    MAX_MEN_AT_ARMS,
};
pub use cache::{
    BattleCache, CancelToken, Probability, SweepOrder, Tally, RELIABILITY_THRESHOLD,
};
pub use export_csv::{export_odds_csv, write_odds_csv, ODDS_HEADERS};
pub use rng::{DieSource, Rng};
pub use rounds::{Battle, BattleRounds, Outcome, RoundOutcome, MAX_ROUNDS};
