//! Unit types, AA abilities, and unit instances.
//!
//! A unit type declares toughness (hit points) and, optionally, an AA
//! ability describing what it shoots at and how hard. Units reference their
//! type by name and track damage taken so far.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::player::PlayerId;

/// Unique identifier of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Marker for an AA ability with no per-roll attack cap.
pub const UNLIMITED_ATTACKS: i32 = -1;

fn unlimited_attacks() -> i32 {
    UNLIMITED_ATTACKS
}

fn default_true() -> bool {
    true
}

fn default_hit_points() -> u32 {
    1
}

/// Defensive fire capability of a unit type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AaAbility {
    /// AA type name, e.g. "AA" or "radar-AA". Units of the same AA type fire together.
    pub aa_type: String,
    /// A 0-based die strictly below this value is a hit.
    pub strength: u32,
    /// Die size; falls back to the game's dice sides.
    #[serde(default)]
    pub dice_sides: Option<u32>,
    /// Maximum dice this unit rolls per firing, or `UNLIMITED_ATTACKS` for one per target.
    #[serde(default = "unlimited_attacks")]
    pub max_attacks: i32,
    /// Unit type names this AA can target.
    pub targets: Vec<String>,
    /// Whether this AA fires at units flying over (rather than only in battle).
    #[serde(default = "default_true")]
    pub fires_on_fly_over: bool,
    /// Whether the firing unit is destroyed for each hit it scores.
    #[serde(default)]
    pub suicide_on_hit: bool,
}

impl AaAbility {
    pub fn can_target(&self, unit_type: &str) -> bool {
        self.targets.iter().any(|t| t == unit_type)
    }
}

/// A declared unit type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitType {
    pub name: String,
    #[serde(default = "default_hit_points")]
    pub hit_points: u32,
    /// Factories, bases and the like: never casualties of AA fire.
    #[serde(default)]
    pub is_infrastructure: bool,
    #[serde(default)]
    pub aa: Option<AaAbility>,
}

impl UnitType {
    pub fn new(name: &str) -> Self {
        UnitType {
            name: name.to_string(),
            hit_points: 1,
            is_infrastructure: false,
            aa: None,
        }
    }

    pub fn with_hit_points(mut self, hit_points: u32) -> Self {
        self.hit_points = hit_points;
        self
    }

    pub fn with_aa(mut self, aa: AaAbility) -> Self {
        self.aa = Some(aa);
        self
    }

    pub fn infrastructure(mut self) -> Self {
        self.is_infrastructure = true;
        self
    }
}

/// A unit on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub unit_type: String,
    pub owner: PlayerId,
    /// Hits taken so far.
    #[serde(default)]
    pub hits: u32,
    #[serde(default)]
    pub movement_left: u32,
    /// Launched by airborne tech; targetable by AA types that tech exposes.
    #[serde(default)]
    pub airborne: bool,
    /// Carrier when loaded on a transport. Transported AA cannot fire.
    #[serde(default)]
    pub transported_by: Option<UnitId>,
}

impl Unit {
    pub fn new(id: u32, unit_type: &str, owner: &str) -> Self {
        Unit {
            id: UnitId(id),
            unit_type: unit_type.to_string(),
            owner: PlayerId::new(owner),
            hits: 0,
            movement_left: 0,
            airborne: false,
            transported_by: None,
        }
    }

    pub fn with_movement(mut self, movement_left: u32) -> Self {
        self.movement_left = movement_left;
        self
    }

    /// Hit points left given the unit's declared toughness.
    pub fn remaining_hit_points(&self, unit_type: &UnitType) -> u32 {
        unit_type.hit_points.saturating_sub(self.hits)
    }
}
