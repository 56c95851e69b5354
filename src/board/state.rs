//! Game data snapshot.
//!
//! Holds everything the AA core reads from the host game: rules, players and
//! their alliances, declared unit types, live units, territories, airborne
//! tech, and which territories already saw a battle this turn.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::player::{Player, PlayerId};
use super::rules::Rules;
use super::territory::Territory;
use super::unit::{Unit, UnitId, UnitType};
use crate::error::CombatError;

/// The kind of move step currently being played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovePhase {
    #[default]
    Combat,
    NonCombat,
}

/// Complete game data at a point in time.
///
/// Unit types keep their declaration order; AA firing priority is derived
/// from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameData {
    #[serde(default)]
    pub rules: Rules,
    #[serde(default)]
    pub phase: MovePhase,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub unit_types: Vec<UnitType>,
    #[serde(default)]
    pub units: Vec<Unit>,
    #[serde(default)]
    pub territories: Vec<Territory>,
    /// Per player: AA type -> unit types that become targetable when airborne.
    #[serde(default)]
    pub airborne_targets: BTreeMap<PlayerId, BTreeMap<String, Vec<String>>>,
    /// Territories where a battle was already fought this turn.
    #[serde(default)]
    pub battles_fought: BTreeSet<String>,
}

impl GameData {
    pub fn new(rules: Rules) -> Self {
        GameData {
            rules,
            ..GameData::default()
        }
    }

    pub fn add_player(&mut self, player: Player) {
        self.players.push(player);
    }

    pub fn add_unit_type(&mut self, unit_type: UnitType) {
        self.unit_types.push(unit_type);
    }

    pub fn add_territory(&mut self, territory: Territory) {
        self.territories.push(territory);
    }

    /// Places a unit in a territory.
    pub fn place_unit(&mut self, territory: &str, unit: Unit) -> Result<UnitId, CombatError> {
        let id = unit.id;
        let t = self.territory_mut(territory)?;
        t.units.push(id);
        self.units.push(unit);
        Ok(id)
    }

    pub fn unit_type(&self, name: &str) -> Option<&UnitType> {
        self.unit_types.iter().find(|t| t.name == name)
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    pub fn require_unit(&self, id: UnitId) -> Result<&Unit, CombatError> {
        self.unit(id).ok_or(CombatError::UnknownUnit(id))
    }

    /// Returns a unit together with its declared type.
    pub fn unit_with_type(&self, id: UnitId) -> Result<(&Unit, &UnitType), CombatError> {
        let unit = self.require_unit(id)?;
        let unit_type = self
            .unit_type(&unit.unit_type)
            .ok_or_else(|| CombatError::UnknownUnitType(unit.unit_type.clone()))?;
        Ok((unit, unit_type))
    }

    pub fn territory(&self, name: &str) -> Result<&Territory, CombatError> {
        self.territories
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| CombatError::UnknownTerritory(name.to_string()))
    }

    pub fn territory_mut(&mut self, name: &str) -> Result<&mut Territory, CombatError> {
        self.territories
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| CombatError::UnknownTerritory(name.to_string()))
    }

    fn alliance_of(&self, player: &PlayerId) -> Option<&str> {
        self.players
            .iter()
            .find(|p| &p.id == player)
            .and_then(|p| p.alliance.as_deref())
    }

    /// Two distinct, non-null players are at war unless they share an alliance.
    pub fn is_at_war(&self, a: &PlayerId, b: &PlayerId) -> bool {
        if a == b || a.is_null() || b.is_null() {
            return false;
        }
        match (self.alliance_of(a), self.alliance_of(b)) {
            (Some(x), Some(y)) => x != y,
            _ => true,
        }
    }

    /// Unit types that `player`'s airborne units expose to AA of `aa_type`.
    pub fn airborne_targets_for(&self, player: &PlayerId, aa_type: &str) -> &[String] {
        self.airborne_targets
            .get(player)
            .and_then(|by_type| by_type.get(aa_type))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Position of the first unit type declaring `aa_type`. Undeclared types sort last.
    pub fn aa_declaration_index(&self, aa_type: &str) -> usize {
        self.unit_types
            .iter()
            .position(|t| t.aa.as_ref().is_some_and(|aa| aa.aa_type == aa_type))
            .unwrap_or(usize::MAX)
    }

    pub fn was_battle_fought(&self, territory: &str) -> bool {
        self.battles_fought.contains(territory)
    }

    /// Whether the unit still exists and, when given, still stands in `territory`.
    pub fn is_present(&self, unit: UnitId, territory: Option<&str>) -> bool {
        if self.unit(unit).is_none() {
            return false;
        }
        match territory {
            Some(name) => self.territory(name).is_ok_and(|t| t.contains(unit)),
            None => true,
        }
    }

    /// Adds hits to surviving units.
    pub fn mark_damaged(&mut self, damaged: &[(UnitId, u32)]) -> Result<(), CombatError> {
        for &(id, hits) in damaged {
            let unit = self.unit_mut(id).ok_or(CombatError::UnknownUnit(id))?;
            unit.hits += hits;
        }
        Ok(())
    }

    /// Removes units from a territory and from the game.
    pub fn remove_units(&mut self, territory: &str, ids: &[UnitId]) -> Result<(), CombatError> {
        let t = self.territory_mut(territory)?;
        t.units.retain(|u| !ids.contains(u));
        self.units.retain(|u| !ids.contains(&u.id));
        Ok(())
    }
}
