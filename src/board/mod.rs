//! Board representation and game-data types.
//!
//! Minimal model of players, unit types, units, territories and routes that
//! the AA core reads and mutates through the delegate bridge.

pub mod player;
pub mod rules;
pub mod state;
pub mod territory;
pub mod unit;

pub use player::{Player, PlayerId};
pub use rules::{CasualtyMode, Rules};
pub use state::{GameData, MovePhase};
pub use territory::{Route, Territory};
pub use unit::{AaAbility, Unit, UnitId, UnitType, UNLIMITED_ATTACKS};

use std::collections::BTreeMap;

/// Renders units as "2 fighter, 1 bomber" in first-seen order.
pub fn units_to_text(data: &GameData, units: &[UnitId]) -> String {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: BTreeMap<String, usize> = BTreeMap::new();
    for id in units {
        let name = data
            .unit(*id)
            .map(|u| u.unit_type.clone())
            .unwrap_or_else(|| format!("unit {}", id));
        match index.get(&name) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(name.clone(), counts.len());
                counts.push((name, 1));
            }
        }
    }
    counts
        .iter()
        .map(|(name, n)| format!("{} {}", n, name))
        .collect::<Vec<_>>()
        .join(", ")
}
