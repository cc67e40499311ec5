//! Battle state and the round-by-round resolution state machine.
//!
//! A round rolls both sides' dice and applies each total as damage to the
//! opposing side. A side with zero dice before the roll resolves the battle
//! immediately. The outcome codes are fixed at -1/0/+1 keyed to which side
//! went down; downstream statistics depend on that exact mapping.

use crate::battle::army::{
    field_mask, Army, DamageStrategy, ARMY_BITS, STRATEGY_BITS,
};
use crate::battle::rng::DieSource;

/// Hard cap on simulated rounds per battle. Damage almost always removes at
/// least one unit per round, but a knights-only army can absorb a roll of one
/// or two without losses, so the cap is a safety net rather than a bound the
/// rules guarantee. Hitting it means the state machine is broken.
pub const MAX_ROUNDS: u32 = 1024;

/// Terminal battle result. `code()` gives the wire value the statistics
/// tables are keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum Outcome {
    /// Only side A incapacitated.
    SideADown = -1,
    /// Both sides incapacitated in the same round.
    Mutual = 0,
    /// Only side B incapacitated.
    SideBDown = 1,
}

impl Outcome {
    pub const fn code(self) -> i8 {
        self as i8
    }
}

/// One step of the state machine: either the battle resolved, or it goes on
/// and both sides' remaining army points are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    Resolved(Outcome),
    Ongoing {
        side_a_points: u32,
        side_b_points: u32,
    },
}

/// Two armies plus everything that fixes their trajectory: per-side damage
/// strategies and the cavalcade charge modifier. `Copy`, so the cache can
/// deep-copy a battle before mutating it and cached keys stay untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Battle {
    pub side_a: Army,
    pub side_b: Army,
    pub strategy_a: DamageStrategy,
    pub strategy_b: DamageStrategy,
    /// Charge bonus: +1 per die on side B's roll only.
    pub cavalcade: bool,
}

impl Battle {
    /// Battle with the default men-at-arms-first strategies and no cavalcade.
    pub fn new(side_a: Army, side_b: Army) -> Self {
        Self {
            side_a,
            side_b,
            strategy_a: DamageStrategy::MenAtArmsFirst,
            strategy_b: DamageStrategy::MenAtArmsFirst,
            cavalcade: false,
        }
    }

    /// Canonical encoding: both armies, both strategies, and the cavalcade
    /// flag packed into 27 bits. Injective over legal states; this is the
    /// sole cache key.
    pub fn encode(&self) -> u32 {
        let mut key = 0u32;
        let mut offset = 0;
        key |= self.side_a.encode() << offset;
        offset += ARMY_BITS;
        key |= (self.strategy_a as u32) << offset;
        offset += STRATEGY_BITS;
        key |= self.side_b.encode() << offset;
        offset += ARMY_BITS;
        key |= (self.strategy_b as u32) << offset;
        offset += STRATEGY_BITS;
        key |= u32::from(self.cavalcade) << offset;
        key
    }

    /// Inverse of [Battle::encode]. Only keys produced by `encode` are legal;
    /// unrecognized enum bits abort.
    pub fn decode(key: u32) -> Self {
        let side_a = Army::decode(key & field_mask(ARMY_BITS));
        let key = key >> ARMY_BITS;
        let strategy_a = DamageStrategy::from_bits(key & field_mask(STRATEGY_BITS));
        let key = key >> STRATEGY_BITS;
        let side_b = Army::decode(key & field_mask(ARMY_BITS));
        let key = key >> ARMY_BITS;
        let strategy_b = DamageStrategy::from_bits(key & field_mask(STRATEGY_BITS));
        let key = key >> STRATEGY_BITS;
        Self {
            side_a,
            side_b,
            strategy_a,
            strategy_b,
            cavalcade: key & 1 == 1,
        }
    }

    /// Evaluate the battle without rolling. A side whose effective dice count
    /// is zero cannot contest and the battle resolves on the spot.
    pub fn status(&self) -> RoundOutcome {
        let dice_a = self.side_a.dice(self.side_b.attacker_penalty());
        let dice_b = self.side_b.dice(self.side_a.attacker_penalty());
        match (dice_a, dice_b) {
            (0, 0) => RoundOutcome::Resolved(Outcome::Mutual),
            (0, _) => RoundOutcome::Resolved(Outcome::SideADown),
            (_, 0) => RoundOutcome::Resolved(Outcome::SideBDown),
            _ => RoundOutcome::Ongoing {
                side_a_points: self.side_a.army_points(),
                side_b_points: self.side_b.army_points(),
            },
        }
    }

    /// Run one round, mutating both armies in place. On an already-resolved
    /// battle this reports the resolution and rolls nothing.
    pub fn advance_round<D: DieSource>(&mut self, dice: &mut D) -> RoundOutcome {
        let status = self.status();
        if !matches!(status, RoundOutcome::Ongoing { .. }) {
            return status;
        }
        let dice_a = self.side_a.dice(self.side_b.attacker_penalty());
        let dice_b = self.side_b.dice(self.side_a.attacker_penalty());
        let roll_a = roll(dice_a, 0, dice);
        let roll_b = roll(dice_b, u32::from(self.cavalcade), dice);
        self.side_a.apply_damage(roll_b, self.strategy_a);
        self.side_b.apply_damage(roll_a, self.strategy_b);
        match (self.side_a.is_defeated(), self.side_b.is_defeated()) {
            (true, true) => RoundOutcome::Resolved(Outcome::Mutual),
            (true, false) => RoundOutcome::Resolved(Outcome::SideADown),
            (false, true) => RoundOutcome::Resolved(Outcome::SideBDown),
            (false, false) => RoundOutcome::Ongoing {
                side_a_points: self.side_a.army_points(),
                side_b_points: self.side_b.army_points(),
            },
        }
    }

    /// Lazy single-pass round sequence. Yields one [RoundOutcome] per round
    /// and fuses permanently after the first `Resolved`.
    pub fn rounds<'a, D: DieSource>(&'a mut self, dice: &'a mut D) -> BattleRounds<'a, D> {
        BattleRounds {
            battle: self,
            dice,
            done: false,
        }
    }

    /// Drive the state machine to its terminal outcome.
    pub fn resolve_with<D: DieSource>(&mut self, dice: &mut D) -> Outcome {
        for _ in 0..MAX_ROUNDS {
            if let RoundOutcome::Resolved(outcome) = self.advance_round(dice) {
                return outcome;
            }
        }
        panic!("battle failed to resolve within {MAX_ROUNDS} rounds: {self:?}");
    }
}

/// Sum of `count` die faces, each raised by `per_die_bonus`.
fn roll<D: DieSource>(count: u32, per_die_bonus: u32, dice: &mut D) -> u32 {
    (0..count).map(|_| dice.die() + per_die_bonus).sum()
}

/// Iterator over battle rounds. See [Battle::rounds].
pub struct BattleRounds<'a, D: DieSource> {
    battle: &'a mut Battle,
    dice: &'a mut D,
    done: bool,
}

impl<D: DieSource> Iterator for BattleRounds<'_, D> {
    type Item = RoundOutcome;

    fn next(&mut self) -> Option<RoundOutcome> {
        if self.done {
            return None;
        }
        let step = self.battle.advance_round(self.dice);
        if matches!(step, RoundOutcome::Resolved(_)) {
            self.done = true;
        }
        Some(step)
    }
}
