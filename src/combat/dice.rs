//! AA hit resolution.
//!
//! Every firing unit contributes dice up to its attack cap, strongest units
//! first, and the total is capped at one die per target. Standard mode rolls
//! each die against its unit's strength. Low-luck mode pools the strengths
//! and only rolls for the remainder.

use serde::{Deserialize, Serialize};

use crate::bridge::RandomSource;
use crate::board::{AaAbility, UnitId};

/// One firing unit's contribution to a roll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shooter {
    pub unit: UnitId,
    pub strength: u32,
    pub max_attacks: i32,
}

impl Shooter {
    pub fn new(unit: UnitId, aa: &AaAbility) -> Self {
        Shooter {
            unit,
            strength: aa.strength,
            max_attacks: aa.max_attacks,
        }
    }

    fn attacks_against(&self, target_count: usize) -> usize {
        if self.max_attacks < 0 {
            target_count
        } else {
            (self.max_attacks as usize).min(target_count)
        }
    }
}

/// A single rolled die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Die {
    pub value: u32,
    /// Values strictly below this hit.
    pub threshold: u32,
    pub hit: bool,
}

/// Immutable outcome of one firing group's roll.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRoll {
    pub hits: usize,
    pub sides: u32,
    pub dice: Vec<Die>,
    /// Hits guaranteed by low-luck pooling, before the remainder die.
    #[serde(default)]
    pub pooled_hits: usize,
}

impl DiceRoll {
    pub fn misses(&self) -> usize {
        self.dice.iter().filter(|d| !d.hit).count()
    }
}

/// Strength assigned to each die, strongest shooters first.
fn assign_rolls(shooters: &[Shooter], target_count: usize) -> Vec<u32> {
    let mut ordered: Vec<&Shooter> = shooters.iter().collect();
    ordered.sort_by(|a, b| b.strength.cmp(&a.strength));

    let mut rolls = Vec::new();
    for shooter in ordered {
        let remaining = target_count - rolls.len();
        if remaining == 0 {
            break;
        }
        let n = shooter.attacks_against(target_count).min(remaining);
        rolls.extend(std::iter::repeat(shooter.strength).take(n));
    }
    rolls
}

/// Rolls AA fire from `shooters` at `target_count` valid targets.
///
/// No dice are drawn when there are no targets or no attacks to make.
pub fn roll_aa(
    shooters: &[Shooter],
    target_count: usize,
    sides: u32,
    low_luck: bool,
    random: &mut dyn RandomSource,
    annotation: &str,
) -> DiceRoll {
    let sides = sides.max(1);
    let rolls = assign_rolls(shooters, target_count);
    if rolls.is_empty() {
        return DiceRoll {
            sides,
            ..DiceRoll::default()
        };
    }

    let mut roll = if low_luck {
        roll_low_luck(&rolls, sides, random, annotation)
    } else {
        let values = random.random(sides, rolls.len(), annotation);
        let dice: Vec<Die> = values
            .iter()
            .zip(&rolls)
            .map(|(&value, &threshold)| Die {
                value,
                threshold,
                hit: value < threshold,
            })
            .collect();
        DiceRoll {
            hits: dice.iter().filter(|d| d.hit).count(),
            sides,
            dice,
            pooled_hits: 0,
        }
    };
    roll.hits = roll.hits.min(target_count);
    roll
}

fn roll_low_luck(rolls: &[u32], sides: u32, random: &mut dyn RandomSource, annotation: &str) -> DiceRoll {
    let power: u32 = rolls.iter().sum();
    let pooled = (power / sides) as usize;
    let remainder = power % sides;

    let mut dice = Vec::new();
    let mut hits = pooled;
    if remainder > 0 {
        let value = random.random(sides, 1, annotation).first().copied().unwrap_or(sides);
        let hit = value < remainder;
        if hit {
            hits += 1;
        }
        dice.push(Die {
            value,
            threshold: remainder,
            hit,
        });
    }
    DiceRoll {
        hits,
        sides,
        dice,
        pooled_hits: pooled,
    }
}
