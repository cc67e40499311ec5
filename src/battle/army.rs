//! Army state, dice strength, and the deterministic damage-allocation rules.
//!
//! Incoming damage is the opposing side's dice total for the round. Two
//! allocation orders exist (knights soak first, or men-at-arms soak first);
//! the rules guarantee both leave the same unused remainder, and
//! [Army::apply_damage] checks that equivalence on every hit.

/// Most men-at-arms an army may field.
pub const MAX_MEN_AT_ARMS: u8 = 13;

/// Most knights an army may field.
pub const MAX_KNIGHTS: u8 = 8;

/// Damage points one knight absorbs, and the strength he contributes.
pub const KNIGHT_POINTS: u32 = 3;

/// Minimum bits needed to hold values up to `max`.
const fn bit_width(max: u8) -> u32 {
    u8::BITS - max.leading_zeros()
}

pub(crate) const MEN_AT_ARMS_BITS: u32 = bit_width(MAX_MEN_AT_ARMS);
pub(crate) const KNIGHTS_BITS: u32 = bit_width(MAX_KNIGHTS);
pub(crate) const STRUCTURE_BITS: u32 = bit_width(DefensiveStructure::FortifiedCity as u8);
pub(crate) const LEADER_BITS: u32 = bit_width(ArmyLeader::Darc as u8);
pub(crate) const STRATEGY_BITS: u32 = bit_width(DamageStrategy::KnightsFirst as u8);

/// Width of one packed army inside a battle key.
pub(crate) const ARMY_BITS: u32 =
    MEN_AT_ARMS_BITS + KNIGHTS_BITS + STRUCTURE_BITS + LEADER_BITS;

pub(crate) const fn field_mask(bits: u32) -> u32 {
    (1 << bits) - 1
}

/// Which unit type absorbs damage first for a side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DamageStrategy {
    MenAtArmsFirst = 0,
    KnightsFirst = 1,
}

impl DamageStrategy {
    pub(crate) fn from_bits(bits: u32) -> Self {
        match bits {
            0 => Self::MenAtArmsFirst,
            1 => Self::KnightsFirst,
            other => panic!("unrecognized damage strategy bits: {other}"),
        }
    }
}

/// Defensive fortification. Defense-only: it penalizes the dice of an
/// attacker targeting this army, never this army's own roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefensiveStructure {
    None = 0,
    Stronghold = 1,
    FortifiedCity = 2,
}

impl DefensiveStructure {
    pub const ALL: [Self; 3] = [Self::None, Self::Stronghold, Self::FortifiedCity];

    /// Uppercase name used in the exported odds table.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Stronghold => "STRONGHOLD",
            Self::FortifiedCity => "FORTIFIED_CITY",
        }
    }

    pub(crate) fn from_bits(bits: u32) -> Self {
        match bits {
            0 => Self::None,
            1 => Self::Stronghold,
            2 => Self::FortifiedCity,
            other => panic!("unrecognized defensive structure bits: {other}"),
        }
    }
}

/// Leadership. A lord or titled lady adds one strength point; D'Arc adds the
/// strength point and an extra die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArmyLeader {
    NoneOrLady = 0,
    LordOrTitledLady = 1,
    Darc = 2,
}

impl ArmyLeader {
    pub const ALL: [Self; 3] = [Self::NoneOrLady, Self::LordOrTitledLady, Self::Darc];

    /// Uppercase name used in the exported odds table.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoneOrLady => "NONE_OR_LADY",
            Self::LordOrTitledLady => "LORD_OR_TITLED_LADY",
            Self::Darc => "DARC",
        }
    }

    pub(crate) fn from_bits(bits: u32) -> Self {
        match bits {
            0 => Self::NoneOrLady,
            1 => Self::LordOrTitledLady,
            2 => Self::Darc,
            other => panic!("unrecognized army leader bits: {other}"),
        }
    }
}

/// One side of a battle. Plain value type; rounds mutate it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Army {
    pub men_at_arms: u8,
    pub knights: u8,
    pub structure: DefensiveStructure,
    pub leader: ArmyLeader,
}

/// Result of distributing one round's damage over an army.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    /// Damage points that could not be spent on any unit.
    pub leftover: u32,
    pub knights: u8,
    pub men_at_arms: u8,
}

impl Army {
    /// Army with no structure and no notable leader.
    pub fn new(men_at_arms: u8, knights: u8) -> Self {
        Self {
            men_at_arms,
            knights,
            structure: DefensiveStructure::None,
            leader: ArmyLeader::NoneOrLady,
        }
    }

    pub fn is_defeated(&self) -> bool {
        self.knights == 0 && self.men_at_arms == 0
    }

    /// Raw combat strength: knights count triple.
    pub fn army_points(&self) -> u32 {
        u32::from(self.knights) * KNIGHT_POINTS + u32::from(self.men_at_arms)
    }

    /// Army points plus the flat leadership bonus. Only selects the dice tier.
    pub fn strength_points(&self) -> u32 {
        let bonus = matches!(
            self.leader,
            ArmyLeader::LordOrTitledLady | ArmyLeader::Darc
        ) as u32;
        self.army_points() + bonus
    }

    /// Dice rolled this round. `penalty` comes from the opponent's structure
    /// and may push the count below the tier; the result never goes negative.
    pub fn dice(&self, penalty: i32) -> u32 {
        if self.army_points() == 0 {
            return 0;
        }
        let strength = self.strength_points();
        let mut count: i32 = if strength <= 6 {
            1
        } else if strength <= 12 {
            2
        } else {
            3
        };
        count += penalty;
        if self.leader == ArmyLeader::Darc {
            count += 1;
        }
        count.max(0) as u32
    }

    /// Dice penalty this army's structure imposes on an attacker targeting it.
    pub fn attacker_penalty(&self) -> i32 {
        match self.structure {
            DefensiveStructure::FortifiedCity => -2,
            DefensiveStructure::Stronghold => -1,
            DefensiveStructure::None => 0,
        }
    }

    /// Spend damage on knights while three points remain, then on men-at-arms
    /// point by point.
    pub fn allocate_knights_first(&self, damage: u32) -> Allocation {
        let mut leftover = damage;
        let mut knights = self.knights;
        let mut men_at_arms = self.men_at_arms;
        while leftover >= KNIGHT_POINTS && knights > 0 {
            knights -= 1;
            leftover -= KNIGHT_POINTS;
        }
        while leftover >= 1 && men_at_arms > 0 {
            men_at_arms -= 1;
            leftover -= 1;
        }
        Allocation {
            leftover,
            knights,
            men_at_arms,
        }
    }

    /// Spend damage on men-at-arms first, except that a three-point hit goes
    /// to a knight while only one or two men remain: spending it on the last
    /// men would waste points a knight can soak.
    pub fn allocate_men_at_arms_first(&self, damage: u32) -> Allocation {
        let mut leftover = damage;
        let mut knights = self.knights;
        let mut men_at_arms = self.men_at_arms;
        while leftover >= 1 && men_at_arms > 0 {
            if leftover >= KNIGHT_POINTS && men_at_arms <= 2 && knights > 0 {
                knights -= 1;
                leftover -= KNIGHT_POINTS;
                continue;
            }
            men_at_arms -= 1;
            leftover -= 1;
        }
        while leftover >= KNIGHT_POINTS && knights > 0 {
            knights -= 1;
            leftover -= KNIGHT_POINTS;
        }
        Allocation {
            leftover,
            knights,
            men_at_arms,
        }
    }

    /// Apply one round's damage with the chosen strategy and return the
    /// unused remainder.
    ///
    /// Both allocation orders are computed every time and must agree on the
    /// leftover; a mismatch is a defect in the allocation rules themselves,
    /// not bad input, and aborts.
    pub fn apply_damage(&mut self, damage: u32, strategy: DamageStrategy) -> u32 {
        let knights_first = self.allocate_knights_first(damage);
        let men_first = self.allocate_men_at_arms_first(damage);
        assert_eq!(
            knights_first.leftover, men_first.leftover,
            "damage allocation orders disagree on leftover for {self:?} taking {damage}"
        );
        let chosen = match strategy {
            DamageStrategy::KnightsFirst => knights_first,
            DamageStrategy::MenAtArmsFirst => men_first,
        };
        self.knights = chosen.knights;
        self.men_at_arms = chosen.men_at_arms;
        chosen.leftover
    }

    /// Pack the army into the low 12 bits of a key. Over-limit unit counts
    /// abort: the key would collide with another legal state.
    pub fn encode(&self) -> u32 {
        assert!(
            self.men_at_arms <= MAX_MEN_AT_ARMS,
            "{} men-at-arms exceeds the limit of {MAX_MEN_AT_ARMS}",
            self.men_at_arms
        );
        assert!(
            self.knights <= MAX_KNIGHTS,
            "{} knights exceeds the limit of {MAX_KNIGHTS}",
            self.knights
        );
        let mut key = 0u32;
        let mut offset = 0;
        key |= u32::from(self.men_at_arms) << offset;
        offset += MEN_AT_ARMS_BITS;
        key |= u32::from(self.knights) << offset;
        offset += KNIGHTS_BITS;
        key |= (self.structure as u32) << offset;
        offset += STRUCTURE_BITS;
        key |= (self.leader as u32) << offset;
        key
    }

    /// Inverse of [Army::encode] for the low 12 bits.
    pub fn decode(bits: u32) -> Self {
        let men_at_arms = (bits & field_mask(MEN_AT_ARMS_BITS)) as u8;
        let bits = bits >> MEN_AT_ARMS_BITS;
        let knights = (bits & field_mask(KNIGHTS_BITS)) as u8;
        let bits = bits >> KNIGHTS_BITS;
        let structure = DefensiveStructure::from_bits(bits & field_mask(STRUCTURE_BITS));
        let bits = bits >> STRUCTURE_BITS;
        let leader = ArmyLeader::from_bits(bits & field_mask(LEADER_BITS));
        Self {
            men_at_arms,
            knights,
            structure,
            leader,
        }
    }
}
