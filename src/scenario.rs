//! JSON scenarios for the command-line runner.
//!
//! A scenario is a board, the acting player, an optional move (route plus
//! moving units) and any number of battle AA firings. Running it produces a
//! report of what fired, the dice, and what was lost.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::board::{GameData, PlayerId, Route, UnitId};
use crate::bridge::{AcknowledgingRemote, DelegateBridge, HistoryEntry, LocalBridge, MoveHandle, ScriptedDice};
use crate::combat::{BattleActionContext, BattleId, GroupRecord};
use crate::config::EngineConfig;
use crate::error::{CombatError, ConfigError};
use crate::fire::{default_ordering, territories_where_aa_will_fire, AaInMove, BattleAa, BattleAaSpec};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub data: GameData,
    pub player: String,
    #[serde(default)]
    pub route: Option<Route>,
    #[serde(default)]
    pub units: Vec<UnitId>,
    #[serde(default)]
    pub battles: Vec<BattleAaSpec>,
    /// Dice seed; 0 or absent draws from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Fixed die values to replay instead of seeded dice.
    #[serde(default)]
    pub dice: Option<Vec<u32>>,
    /// Register an auto-acknowledging remote for every player and run the
    /// confirmation round-trips.
    #[serde(default)]
    pub interactive: bool,
}

/// One firing group as it resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub territory: String,
    pub aa_type: String,
    pub firing_player: PlayerId,
    pub hit_player: PlayerId,
    pub dice: Vec<u32>,
    pub hits: usize,
    pub killed: Vec<UnitId>,
    pub damaged: Vec<(UnitId, u32)>,
}

impl From<&GroupRecord> for GroupSummary {
    fn from(record: &GroupRecord) -> Self {
        let casualties = record.casualties.clone().unwrap_or_default();
        GroupSummary {
            territory: record.group.territory.clone(),
            aa_type: record.group.aa_type.clone(),
            firing_player: record.group.firing_player.clone(),
            hit_player: record.group.hit_player.clone(),
            dice: record
                .dice
                .as_ref()
                .map(|d| d.dice.iter().map(|die| die.value).collect())
                .unwrap_or_default(),
            hits: record.hits(),
            killed: casualties.killed,
            damaged: casualties.damaged,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Territories along the route where AA fired.
    pub fired_in: Vec<String>,
    /// Moving units killed, for the host to remove.
    pub casualties: Vec<UnitId>,
    pub cant_undo: Option<String>,
    /// Units removed from the board by battle AA.
    pub battle_casualties: Vec<UnitId>,
    pub groups: Vec<GroupSummary>,
    pub history: Vec<HistoryEntry>,
    /// Messages each player's remote received, when run interactively.
    pub messages: BTreeMap<PlayerId, Vec<String>>,
}

/// Loads a scenario from a JSON file.
pub fn load_scenario(path: &Path) -> Result<Scenario, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_scenario_from_str(&data)
}

/// Loads a scenario from a JSON string.
pub fn load_scenario_from_str(json: &str) -> Result<Scenario, ConfigError> {
    let scenario: Scenario = serde_json::from_str(json)?;
    if scenario.route.is_none() && !scenario.units.is_empty() {
        return Err(ConfigError::Invalid(
            "moving units given without a route".to_string(),
        ));
    }
    Ok(scenario)
}

/// Runs a scenario to completion. `seed` overrides the scenario's own.
pub fn run_scenario(scenario: &Scenario, config: &EngineConfig, seed: Option<u64>) -> Result<Report, CombatError> {
    let seed = seed.or(scenario.seed).unwrap_or(0);
    let mut bridge = LocalBridge::new(scenario.data.clone(), &scenario.player, seed).headless(!scenario.interactive);
    if let Some(script) = &scenario.dice {
        bridge = bridge.with_dice(ScriptedDice::new(script.clone()));
    }

    let mut remotes: BTreeMap<PlayerId, Arc<AcknowledgingRemote>> = BTreeMap::new();
    if scenario.interactive {
        for player in &scenario.data.players {
            let remote = Arc::new(AcknowledgingRemote::new());
            bridge = bridge.with_remote(player.id.name(), remote.clone());
            remotes.insert(player.id.clone(), remote);
        }
    }

    let mut report = Report::default();
    if let Some(route) = &scenario.route {
        report.fired_in = territories_where_aa_will_fire(bridge.data(), bridge.player(), route, &scenario.units)?;
        let mut aa = AaInMove::new(config.clone());
        let mut handle = MoveHandle::default();
        report.casualties = aa.fire_aa(&mut bridge, route, &scenario.units, default_ordering, &mut handle)?;
        report.cant_undo = handle.cant_undo;
        report
            .groups
            .extend(aa.action().groups().iter().map(GroupSummary::from));
    }

    if !scenario.battles.is_empty() {
        let mut action = BattleActionContext::new(BattleId(1), bridge.player().clone(), bridge.is_headless());
        for spec in &scenario.battles {
            let killed = BattleAa::new().fire(&mut bridge, &mut action, config, spec)?;
            report.battle_casualties.extend(killed);
        }
        report
            .groups
            .extend(action.groups().iter().map(GroupSummary::from));
    }

    let (_, history) = bridge.into_parts();
    report.history = history.entries;
    report.messages = remotes
        .into_iter()
        .map(|(player, remote)| (player, remote.messages()))
        .collect();
    Ok(report)
}
