//! Game rule switches that shape AA fire.

use serde::{Deserialize, Serialize};

/// How casualties are picked once hits are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CasualtyMode {
    /// Damage multi-hit units first, then kill in target order.
    Automatic,
    /// Each hit lands on a random target.
    Random,
    /// The affected player chooses, falling back to `Automatic`.
    Interactive,
}

/// Game properties consulted by the AA core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// AA fires at every fly-over, including during non-combat moves.
    pub always_on_aa: bool,
    /// AA only fires in the attacked territory (handled by the battle, not the move).
    pub aa_territory_restricted: bool,
    /// Fire at the route's destination instead of checking its start.
    pub force_aa_attacks_for_last_step_of_fly_over: bool,
    /// Use low-luck hit resolution instead of individual dice.
    pub low_luck_aa: bool,
    pub choose_aa_casualties: bool,
    pub random_aa_casualties: bool,
    pub dice_sides: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Rules {
            always_on_aa: false,
            aa_territory_restricted: false,
            force_aa_attacks_for_last_step_of_fly_over: false,
            low_luck_aa: false,
            choose_aa_casualties: false,
            random_aa_casualties: false,
            dice_sides: 6,
        }
    }
}

impl Rules {
    /// Choosing beats random; random beats the automatic rule.
    pub fn casualty_mode(&self) -> CasualtyMode {
        if self.choose_aa_casualties {
            CasualtyMode::Interactive
        } else if self.random_aa_casualties {
            CasualtyMode::Random
        } else {
            CasualtyMode::Automatic
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let rules: Rules = serde_json::from_str(r#"{"always_on_aa":true}"#).unwrap();
        assert!(rules.always_on_aa);
        assert_eq!(rules.dice_sides, 6);
        assert_eq!(rules.casualty_mode(), CasualtyMode::Automatic);
    }

    #[test]
    fn casualty_mode_precedence() {
        let mut rules = Rules {
            random_aa_casualties: true,
            ..Rules::default()
        };
        assert_eq!(rules.casualty_mode(), CasualtyMode::Random);
        rules.choose_aa_casualties = true;
        assert_eq!(rules.casualty_mode(), CasualtyMode::Interactive);
    }
}
