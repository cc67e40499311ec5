use std::collections::HashSet;

use fiefsim::battle::{
    Army, ArmyLeader, Battle, DamageStrategy, DefensiveStructure, DieSource, Outcome, Rng,
    RoundOutcome, MAX_KNIGHTS, MAX_MEN_AT_ARMS,
};

/// Hands out a fixed list of die faces and panics if the machine asks for
/// more than the script provides.
struct ScriptedDice {
    faces: Vec<u32>,
    next: usize,
}

impl ScriptedDice {
    fn new(faces: &[u32]) -> Self {
        Self {
            faces: faces.to_vec(),
            next: 0,
        }
    }
}

impl DieSource for ScriptedDice {
    fn die(&mut self) -> u32 {
        let face = *self
            .faces
            .get(self.next)
            .expect("scripted dice exhausted: unexpected roll");
        self.next += 1;
        face
    }
}

fn all_unit_counts() -> impl Iterator<Item = (u8, u8)> {
    (0..=MAX_MEN_AT_ARMS).flat_map(|men| (0..=MAX_KNIGHTS).map(move |knights| (men, knights)))
}

#[test]
fn allocation_orders_always_agree_on_leftover() {
    for (men, knights) in all_unit_counts() {
        let army = Army::new(men, knights);
        for damage in 0..=60 {
            let knights_first = army.allocate_knights_first(damage);
            let men_first = army.allocate_men_at_arms_first(damage);
            assert_eq!(
                knights_first.leftover, men_first.leftover,
                "leftover mismatch for {men} men / {knights} knights taking {damage}"
            );
        }
    }
}

#[test]
fn knights_first_spends_three_points_per_knight() {
    let mut army = Army::new(5, 2);
    let leftover = army.apply_damage(7, DamageStrategy::KnightsFirst);
    assert_eq!(leftover, 0);
    assert_eq!(army.knights, 0);
    assert_eq!(army.men_at_arms, 4);
}

#[test]
fn men_at_arms_first_diverts_heavy_hit_to_knight_near_exhaustion() {
    // Two men left and a knight available: a 3-point hit takes the knight.
    let mut army = Army::new(2, 1);
    let leftover = army.apply_damage(3, DamageStrategy::MenAtArmsFirst);
    assert_eq!(leftover, 0);
    assert_eq!(army.knights, 0);
    assert_eq!(army.men_at_arms, 2);
}

#[test]
fn men_at_arms_first_spends_singles_while_men_remain() {
    let mut army = Army::new(5, 2);
    let leftover = army.apply_damage(4, DamageStrategy::MenAtArmsFirst);
    assert_eq!(leftover, 0);
    assert_eq!(army.knights, 2);
    assert_eq!(army.men_at_arms, 1);
}

#[test]
fn overkill_damage_comes_back_as_leftover() {
    let mut army = Army::new(1, 1);
    let leftover = army.apply_damage(10, DamageStrategy::KnightsFirst);
    assert_eq!(leftover, 6);
    assert!(army.is_defeated());
}

#[test]
fn zero_army_points_always_rolls_zero_dice() {
    let empty = Army::new(0, 0);
    for penalty in -3..=3 {
        assert_eq!(empty.dice(penalty), 0);
    }
}

#[test]
fn dice_tiers_follow_strength_points() {
    // 6 strength: one die; 7: two; 13: three.
    assert_eq!(Army::new(6, 0).dice(0), 1);
    assert_eq!(Army::new(7, 0).dice(0), 2);
    assert_eq!(Army::new(13, 0).dice(0), 3);
    assert_eq!(Army::new(12, 0).dice(0), 2);
}

#[test]
fn leadership_shifts_tier_and_darc_adds_a_die() {
    let lord = Army {
        men_at_arms: 6,
        knights: 0,
        structure: DefensiveStructure::None,
        leader: ArmyLeader::LordOrTitledLady,
    };
    // 6 points + 1 leadership = 7 strength, second tier.
    assert_eq!(lord.strength_points(), 7);
    assert_eq!(lord.dice(0), 2);

    let darc = Army {
        leader: ArmyLeader::Darc,
        ..lord
    };
    assert_eq!(darc.dice(0), 3);
}

#[test]
fn structure_penalty_can_zero_out_an_attacker() {
    let raiders = Army::new(1, 0);
    assert_eq!(raiders.dice(-2), 0);
    assert_eq!(raiders.dice(-1), 0);
    assert_eq!(raiders.dice(0), 1);
}

#[test]
fn attacker_penalty_matches_structure() {
    let mut army = Army::new(3, 1);
    assert_eq!(army.attacker_penalty(), 0);
    army.structure = DefensiveStructure::Stronghold;
    assert_eq!(army.attacker_penalty(), -1);
    army.structure = DefensiveStructure::FortifiedCity;
    assert_eq!(army.attacker_penalty(), -2);
}

#[test]
fn army_encoding_is_injective_over_the_legal_space() {
    let mut seen = HashSet::new();
    for (men, knights) in all_unit_counts() {
        for structure in DefensiveStructure::ALL {
            for leader in ArmyLeader::ALL {
                let army = Army {
                    men_at_arms: men,
                    knights,
                    structure,
                    leader,
                };
                assert!(
                    seen.insert(army.encode()),
                    "duplicate encoding for {army:?}"
                );
                assert_eq!(Army::decode(army.encode()), army);
            }
        }
    }
}

#[test]
fn battle_encoding_roundtrips_and_separates_flags() {
    let side_a = Army {
        men_at_arms: 9,
        knights: 4,
        structure: DefensiveStructure::None,
        leader: ArmyLeader::LordOrTitledLady,
    };
    let side_b = Army {
        men_at_arms: 2,
        knights: 6,
        structure: DefensiveStructure::Stronghold,
        leader: ArmyLeader::NoneOrLady,
    };
    let mut keys = HashSet::new();
    for strategy_a in [DamageStrategy::MenAtArmsFirst, DamageStrategy::KnightsFirst] {
        for strategy_b in [DamageStrategy::MenAtArmsFirst, DamageStrategy::KnightsFirst] {
            for cavalcade in [false, true] {
                let battle = Battle {
                    side_a,
                    side_b,
                    strategy_a,
                    strategy_b,
                    cavalcade,
                };
                assert!(keys.insert(battle.encode()));
                assert_eq!(Battle::decode(battle.encode()), battle);
            }
        }
    }
    assert_eq!(keys.len(), 8);
}

#[test]
fn maxed_out_state_encodes_without_overflow_or_collision() {
    let maxed = Army {
        men_at_arms: MAX_MEN_AT_ARMS,
        knights: MAX_KNIGHTS,
        structure: DefensiveStructure::FortifiedCity,
        leader: ArmyLeader::Darc,
    };
    let battle = Battle {
        side_a: maxed,
        side_b: maxed,
        strategy_a: DamageStrategy::KnightsFirst,
        strategy_b: DamageStrategy::KnightsFirst,
        cavalcade: true,
    };
    let key = battle.encode();
    assert!(key < 1 << 27, "key spills past the packed width: {key:#x}");
    assert_eq!(Battle::decode(key), battle);

    let mut neighbor = battle;
    neighbor.side_b.men_at_arms -= 1;
    assert_ne!(neighbor.encode(), key);
}

#[test]
fn mirrored_battles_encode_differently() {
    let strong = Army::new(10, 3);
    let weak = Army::new(2, 1);
    let forward = Battle::new(strong, weak);
    let reversed = Battle::new(weak, strong);
    assert_ne!(forward.encode(), reversed.encode());
}

#[test]
fn empty_sides_resolve_before_any_roll() {
    let mut both_empty = Battle::new(Army::new(0, 0), Army::new(0, 0));
    let mut no_dice = ScriptedDice::new(&[]);
    assert_eq!(
        both_empty.advance_round(&mut no_dice),
        RoundOutcome::Resolved(Outcome::Mutual)
    );

    let mut b_empty = Battle::new(Army::new(13, 8), Army::new(0, 0));
    assert_eq!(
        b_empty.advance_round(&mut no_dice),
        RoundOutcome::Resolved(Outcome::SideBDown)
    );

    let mut a_empty = Battle::new(Army::new(0, 0), Army::new(1, 0));
    assert_eq!(
        a_empty.advance_round(&mut no_dice),
        RoundOutcome::Resolved(Outcome::SideADown)
    );
}

#[test]
fn scripted_rounds_transition_exactly() {
    // One die per side (5 and 4 strength). Round one: A rolls 3, B rolls 2.
    let mut battle = Battle::new(Army::new(5, 0), Army::new(4, 0));
    let mut dice = ScriptedDice::new(&[3, 2, 1, 1]);

    let first = battle.advance_round(&mut dice);
    assert_eq!(
        first,
        RoundOutcome::Ongoing {
            side_a_points: 3,
            side_b_points: 1,
        }
    );
    assert_eq!(battle.side_a.men_at_arms, 3);
    assert_eq!(battle.side_b.men_at_arms, 1);

    // Round two: A rolls 1, B rolls 1; B's last man falls.
    let second = battle.advance_round(&mut dice);
    assert_eq!(second, RoundOutcome::Resolved(Outcome::SideBDown));
    assert_eq!(battle.side_a.men_at_arms, 2);
    assert!(battle.side_b.is_defeated());
}

#[test]
fn cavalcade_raises_side_b_rolls_only() {
    let mut battle = Battle::new(Army::new(6, 0), Army::new(6, 0));
    battle.cavalcade = true;
    // A rolls a bare 2; B's 3 becomes 4 with the charge bonus.
    let mut dice = ScriptedDice::new(&[2, 3]);
    let step = battle.advance_round(&mut dice);
    assert_eq!(
        step,
        RoundOutcome::Ongoing {
            side_a_points: 2,
            side_b_points: 4,
        }
    );
    assert_eq!(battle.side_a.men_at_arms, 2);
    assert_eq!(battle.side_b.men_at_arms, 4);
}

#[test]
fn round_iterator_fuses_after_resolution() {
    let mut battle = Battle::new(Army::new(1, 0), Army::new(0, 0));
    let mut rng = Rng::new(5);
    let mut rounds = battle.rounds(&mut rng);
    assert_eq!(
        rounds.next(),
        Some(RoundOutcome::Resolved(Outcome::SideBDown))
    );
    assert_eq!(rounds.next(), None);
    assert_eq!(rounds.next(), None);
}

#[test]
fn combined_unit_count_never_grows_and_battles_terminate() {
    for seed in 0..50 {
        let mut battle = Battle::new(Army::new(5, 2), Army::new(5, 2));
        let mut rng = Rng::new(seed);
        let mut total = u32::from(battle.side_a.men_at_arms)
            + u32::from(battle.side_a.knights)
            + u32::from(battle.side_b.men_at_arms)
            + u32::from(battle.side_b.knights);
        for _ in 0..64 {
            let both_have_men =
                battle.side_a.men_at_arms > 0 && battle.side_b.men_at_arms > 0;
            let step = battle.advance_round(&mut rng);
            let now = u32::from(battle.side_a.men_at_arms)
                + u32::from(battle.side_a.knights)
                + u32::from(battle.side_b.men_at_arms)
                + u32::from(battle.side_b.knights);
            assert!(now <= total, "unit count grew on seed {seed}");
            if both_have_men {
                // A point of damage always removes a man while men remain.
                assert!(now < total, "no units fell on seed {seed}");
            }
            total = now;
            if let RoundOutcome::Resolved(_) = step {
                break;
            }
        }
        assert!(matches!(battle.status(), RoundOutcome::Resolved(_)));
    }
}
