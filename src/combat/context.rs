//! Per-action state shared by every step of one AA firing.
//!
//! Steps hold only a `GroupId`; whatever a step produces (dice, casualties)
//! is written to the group's record here. The record's phase says which
//! work is already done, so a step replayed after a resume picks up where
//! the previous run stopped instead of rolling or confirming twice.

use serde::{Deserialize, Serialize};

use super::casualty::CasualtyDetails;
use super::confirm::PendingRequests;
use super::dice::DiceRoll;
use super::group::FiringGroup;
use crate::board::{PlayerId, UnitId};
use crate::bridge::DelegateBridge;
use crate::config::EngineConfig;
use crate::error::CombatError;

/// Identifies the battle (or move) a firing belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BattleId(pub u64);

/// Index of a firing group within its action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub usize);

/// Progress of one firing group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupPhase {
    PendingRoll,
    Rolled,
    CasualtiesSelected,
    Confirmed,
    Done,
}

/// A firing group and the results it has produced so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: GroupId,
    pub group: FiringGroup,
    pub phase: GroupPhase,
    /// Firing units still present when the dice were rolled.
    #[serde(default)]
    pub active_firing: Vec<UnitId>,
    /// Targets still valid when the dice were rolled.
    #[serde(default)]
    pub valid_targets: Vec<UnitId>,
    #[serde(default)]
    pub dice: Option<DiceRoll>,
    #[serde(default)]
    pub casualties: Option<CasualtyDetails>,
    /// The firing player has been sent its acknowledgement.
    #[serde(default)]
    pub enemy_notified: bool,
}

impl GroupRecord {
    pub fn hits(&self) -> usize {
        self.dice.as_ref().map_or(0, |d| d.hits)
    }
}

/// Ledger for one battle action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleActionContext {
    pub battle_id: BattleId,
    /// Player whose delegate runs the action.
    pub player: PlayerId,
    pub headless: bool,
    groups: Vec<GroupRecord>,
    /// Every unit the action may hit, in casualty order.
    #[serde(default)]
    targets: Vec<UnitId>,
    /// Units killed so far, in the order they were selected.
    casualties: Vec<UnitId>,
    cant_undo: Option<String>,
    #[serde(skip)]
    pending: PendingRequests,
}

impl BattleActionContext {
    pub fn new(battle_id: BattleId, player: PlayerId, headless: bool) -> Self {
        BattleActionContext {
            battle_id,
            player,
            headless,
            ..BattleActionContext::default()
        }
    }

    /// Registers a group and returns the id its steps refer to.
    pub fn open_group(&mut self, group: FiringGroup) -> GroupId {
        let id = GroupId(self.groups.len());
        self.groups.push(GroupRecord {
            id,
            group,
            phase: GroupPhase::PendingRoll,
            active_firing: Vec::new(),
            valid_targets: Vec::new(),
            dice: None,
            casualties: None,
            enemy_notified: false,
        });
        id
    }

    pub fn group(&self, id: GroupId) -> Result<&GroupRecord, CombatError> {
        self.groups.get(id.0).ok_or(CombatError::UnknownGroup(id))
    }

    pub fn group_mut(&mut self, id: GroupId) -> Result<&mut GroupRecord, CombatError> {
        self.groups.get_mut(id.0).ok_or(CombatError::UnknownGroup(id))
    }

    pub fn groups(&self) -> &[GroupRecord] {
        &self.groups
    }

    pub fn set_targets(&mut self, targets: Vec<UnitId>) {
        self.targets = targets;
    }

    /// Targets not yet killed by this action.
    pub fn remaining_targets(&self) -> Vec<UnitId> {
        self.targets
            .iter()
            .copied()
            .filter(|u| !self.casualties.contains(u))
            .collect()
    }

    pub fn casualties(&self) -> &[UnitId] {
        &self.casualties
    }

    pub fn is_casualty(&self, unit: UnitId) -> bool {
        self.casualties.contains(&unit)
    }

    pub fn record_killed(&mut self, killed: &[UnitId]) {
        for &unit in killed {
            if !self.casualties.contains(&unit) {
                self.casualties.push(unit);
            }
        }
    }

    /// Keeps the first reason; later firings don't overwrite it.
    pub fn set_cant_undo(&mut self, reason: String) {
        if self.cant_undo.is_none() {
            self.cant_undo = Some(reason);
        }
    }

    pub fn cant_undo(&self) -> Option<&str> {
        self.cant_undo.as_deref()
    }

    /// Remote requests still running from an earlier, abandoned wait.
    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn pending_mut(&mut self) -> &mut PendingRequests {
        &mut self.pending
    }
}

/// What a step sees while it runs.
pub struct StepContext<'a> {
    pub bridge: &'a mut dyn DelegateBridge,
    pub action: &'a mut BattleActionContext,
    pub config: &'a EngineConfig,
}
