//! Authoritative random sources.
//!
//! Exactly one source rolls for an action; every participant sees the
//! recorded `DiceRoll`, never a local re-roll.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Produces 0-based die values below `max`.
pub trait RandomSource {
    fn random(&mut self, max: u32, count: usize, annotation: &str) -> Vec<u32>;
}

/// Seeded pseudo-random dice.
pub struct SeededDice {
    rng: SmallRng,
}

impl SeededDice {
    /// A seed of 0 draws from entropy.
    pub fn new(seed: u64) -> Self {
        let rng = if seed != 0 {
            SmallRng::seed_from_u64(seed)
        } else {
            SmallRng::from_entropy()
        };
        SeededDice { rng }
    }
}

impl RandomSource for SeededDice {
    fn random(&mut self, max: u32, count: usize, annotation: &str) -> Vec<u32> {
        let values: Vec<u32> = (0..count).map(|_| self.rng.gen_range(0..max.max(1))).collect();
        tracing::debug!(annotation, ?values, "rolled dice");
        values
    }
}

/// Replays a fixed script of die values, cycling when it runs out.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    script: Vec<u32>,
    next: usize,
}

impl ScriptedDice {
    pub fn new(script: Vec<u32>) -> Self {
        ScriptedDice { script, next: 0 }
    }

    /// Number of values handed out so far.
    pub fn consumed(&self) -> usize {
        self.next
    }
}

impl RandomSource for ScriptedDice {
    fn random(&mut self, max: u32, count: usize, _annotation: &str) -> Vec<u32> {
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            let value = if self.script.is_empty() {
                0
            } else {
                self.script[self.next % self.script.len()]
            };
            self.next += 1;
            values.push(value % max.max(1));
        }
        values
    }
}
