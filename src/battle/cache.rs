//! Memoized battle resolution.
//!
//! A statistics table keyed by the canonical battle encoding, improved
//! recursively: resolving a state below the reliability threshold advances a
//! copy by one round and rolls the sub-state's resolution up into the
//! original key, so a state's recorded distribution is the distribution of
//! its next state's resolution, sampled once per call. Once a state holds
//! enough samples its empirical distribution is drawn from directly and no
//! further simulation is spent on it.
//!
//! The table is single-writer by construction (`&mut self`); `resolve` is a
//! read-check-write sequence that must not interleave per key. Callers that
//! want concurrency shard caches or serialize access through one owner.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::battle::army::{Army, ArmyLeader, DefensiveStructure, MAX_KNIGHTS, MAX_MEN_AT_ARMS};
use crate::battle::rng::Rng;
use crate::battle::rounds::{Battle, Outcome, RoundOutcome, MAX_ROUNDS};

/// Sample count above which a state's accumulated distribution is trusted
/// and sampled from instead of re-simulated.
pub const RELIABILITY_THRESHOLD: u64 = 1000;

/// Progress line cadence for the batch sweeps.
const REPORT_EVERY: u64 = 10_000;

/// Accumulated outcomes for one canonical battle state.
///
/// Scored from side B's seat: `wins` counts resolutions where side A went
/// down (code -1), `losses` where side B went down (code +1), `ties` mutual
/// destruction. The exported table's `a_win_rate` is therefore the `losses`
/// share.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub wins: u64,
    pub ties: u64,
    pub losses: u64,
}

impl Tally {
    pub fn samples(&self) -> u64 {
        self.wins + self.ties + self.losses
    }

    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::SideADown => self.wins += 1,
            Outcome::Mutual => self.ties += 1,
            Outcome::SideBDown => self.losses += 1,
        }
    }

    /// Weighted draw from the accumulated distribution.
    fn sample(&self, rng: &mut Rng) -> Outcome {
        let draw = rng.next_below(self.samples());
        if draw < self.wins {
            Outcome::SideADown
        } else if draw < self.wins + self.ties {
            Outcome::Mutual
        } else {
            Outcome::SideBDown
        }
    }
}

/// Normalized view of a [Tally].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Probability {
    pub win_rate: f64,
    pub loss_rate: f64,
    pub tie_rate: f64,
    pub samples: u64,
}

/// Cooperative cancellation flag for the long-running sweeps. Clones share
/// one flag, so a token handed to another thread can stop a sweep between
/// state iterations.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Visit order for [BattleCache::complete].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOrder {
    /// Least-observed states first (the useful default).
    LeastSampledFirst,
    MostSampledFirst,
}

/// Outcome statistics per canonical battle state. Construct one explicitly
/// and pass it by reference; there is no process-wide instance.
#[derive(Debug, Default)]
pub struct BattleCache {
    table: HashMap<u32, Tally>,
}

impl BattleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct states observed so far.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Raw tally for a battle's current state, if one exists.
    pub fn tally(&self, battle: &Battle) -> Option<Tally> {
        self.table.get(&battle.encode()).copied()
    }

    /// Iterate cached states decoded back to battles, with their tallies.
    pub fn records(&self) -> impl Iterator<Item = (Battle, Tally)> + '_ {
        self.table
            .iter()
            .map(|(key, tally)| (Battle::decode(*key), *tally))
    }

    /// Return one trial outcome for the battle's current state and fold it
    /// into that state's statistics. The caller's battle is never mutated.
    pub fn resolve(&mut self, battle: &Battle, rng: &mut Rng) -> Outcome {
        self.resolve_inner(*battle, rng, 0)
    }

    fn resolve_inner(&mut self, battle: Battle, rng: &mut Rng, depth: u32) -> Outcome {
        assert!(
            depth <= MAX_ROUNDS,
            "battle resolution failed to terminate: {battle:?}"
        );
        let key = battle.encode();
        let tally = self.table.get(&key).copied().unwrap_or_default();
        if tally.samples() >= RELIABILITY_THRESHOLD {
            return tally.sample(rng);
        }
        let mut advanced = battle;
        let outcome = match advanced.status() {
            RoundOutcome::Resolved(outcome) => outcome,
            RoundOutcome::Ongoing { .. } => {
                advanced.advance_round(rng);
                self.resolve_inner(advanced, rng, depth + 1)
            }
        };
        self.table.entry(key).or_default().record(outcome);
        outcome
    }

    /// Normalized rates for a battle's current state. Fails explicitly when
    /// no record exists or it holds no samples; never divides by zero.
    pub fn probability(&self, battle: &Battle) -> Result<Probability, String> {
        let key = battle.encode();
        let tally = self
            .table
            .get(&key)
            .copied()
            .ok_or_else(|| format!("no cached record for battle key {key:#x}"))?;
        let samples = tally.samples();
        if samples == 0 {
            return Err(format!("record for battle key {key:#x} holds no samples"));
        }
        Ok(Probability {
            win_rate: tally.wins as f64 / samples as f64,
            loss_rate: tally.losses as f64 / samples as f64,
            tie_rate: tally.ties as f64 / samples as f64,
            samples,
        })
    }

    /// Resolve every legal starting configuration once: leader, structure,
    /// knights, and men-at-arms swept for both sides, default strategies, no
    /// cavalcade. Returns the number of configurations resolved before
    /// completion or cancellation.
    pub fn populate(&mut self, rng: &mut Rng, cancel: &CancelToken) -> u64 {
        let started = Utc::now();
        let mut resolved = 0u64;
        for side_a in all_starting_armies() {
            for side_b in all_starting_armies() {
                if cancel.is_cancelled() {
                    return resolved;
                }
                self.resolve(&Battle::new(side_a, side_b), rng);
                resolved += 1;
                if resolved % REPORT_EVERY == 0 {
                    report_progress("populate", resolved, started);
                }
            }
        }
        resolved
    }

    /// Top up every currently cached state until it holds `limit` samples,
    /// visiting states in `order` of current sample count. The top-up count
    /// is fixed when a state is visited, so a `limit` above
    /// [RELIABILITY_THRESHOLD] cannot spin: `resolve` stops recording once a
    /// state is converged and its sample count stays put. Returns the number
    /// of states processed before completion or cancellation.
    pub fn complete(
        &mut self,
        limit: u64,
        order: SweepOrder,
        rng: &mut Rng,
        cancel: &CancelToken,
    ) -> u64 {
        let mut queue: Vec<(u32, u64)> = self
            .table
            .iter()
            .map(|(key, tally)| (*key, tally.samples()))
            .collect();
        match order {
            SweepOrder::LeastSampledFirst => queue.sort_by_key(|&(_, samples)| samples),
            SweepOrder::MostSampledFirst => {
                queue.sort_by_key(|&(_, samples)| std::cmp::Reverse(samples))
            }
        }
        let started = Utc::now();
        let mut processed = 0u64;
        for (key, _) in queue {
            if cancel.is_cancelled() {
                break;
            }
            // Re-read at visit time: earlier top-ups feed samples into
            // downstream states, including queued ones.
            let samples = self.table.get(&key).map_or(0, |tally| tally.samples());
            let battle = Battle::decode(key);
            for _ in samples..limit {
                self.resolve(&battle, rng);
            }
            processed += 1;
            if processed % REPORT_EVERY == 0 {
                report_progress("complete", processed, started);
            }
        }
        processed
    }
}

/// Every legal starting army, leader x structure x knights x men-at-arms.
fn all_starting_armies() -> impl Iterator<Item = Army> {
    ArmyLeader::ALL.into_iter().flat_map(|leader| {
        DefensiveStructure::ALL.into_iter().flat_map(move |structure| {
            (0..=MAX_KNIGHTS).flat_map(move |knights| {
                (0..=MAX_MEN_AT_ARMS).map(move |men_at_arms| Army {
                    men_at_arms,
                    knights,
                    structure,
                    leader,
                })
            })
        })
    })
}

fn report_progress(stage: &str, processed: u64, started: DateTime<Utc>) {
    let elapsed = (Utc::now() - started).num_milliseconds() as f64 / 1000.0;
    eprintln!("{stage}: {processed} states in {elapsed:.1}s");
}
