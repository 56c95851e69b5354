//! AA fire opening a battle.
//!
//! Same groups and steps as fire during a move, but the firing and hit sides
//! are fixed by the battle, airborne units only count as targets when the
//! AA is defending, and casualties leave the board once confirmed.

use serde::{Deserialize, Serialize};

use super::Step;
use crate::board::{PlayerId, UnitId};
use crate::bridge::DelegateBridge;
use crate::combat::{build_groups, BattleActionContext, CasualtyRemoval, FiringGroup, GroupPlan, StepContext};
use crate::config::EngineConfig;
use crate::error::CombatError;
use crate::stack::ExecutionStack;

/// Parameters of one battle AA firing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleAaSpec {
    pub territory: String,
    pub firing_player: PlayerId,
    pub hit_player: PlayerId,
    pub firing_units: Vec<UnitId>,
    /// Units the AA may shoot at, in casualty order.
    pub targets: Vec<UnitId>,
    #[serde(default)]
    pub defending: bool,
}

/// Queues battle AA on a host-owned stack.
pub fn push_battle_aa(stack: &mut ExecutionStack<Step>, spec: BattleAaSpec) {
    stack.push(Step::FireBattleAa(spec));
}

pub(crate) fn plan_battle(cx: &mut StepContext<'_>, spec: &BattleAaSpec) -> Result<Vec<FiringGroup>, CombatError> {
    let data = cx.bridge.data();
    data.territory(&spec.territory)?;

    let aa_units: Vec<UnitId> = spec
        .firing_units
        .iter()
        .copied()
        .filter(|&u| {
            data.is_present(u, Some(&spec.territory))
                && data.unit_with_type(u).is_ok_and(|(_, t)| t.aa.is_some())
        })
        .collect();
    let candidates: Vec<UnitId> = spec
        .targets
        .iter()
        .copied()
        .filter(|&u| !cx.action.is_casualty(u))
        .collect();

    Ok(build_groups(
        data,
        &GroupPlan {
            territory: &spec.territory,
            aa_units: &aa_units,
            candidates: &candidates,
            hit_player: &spec.hit_player,
            firing_player: Some(&spec.firing_player),
            airborne_allowed: spec.defending,
            removal: CasualtyRemoval::RemoveFromBoard,
        },
    ))
}

/// Battle AA whose progress survives a failed or interrupted run.
///
/// The caller keeps the value (and may persist it) until `is_finished`;
/// calling `fire` again resumes the groups already planned instead of
/// planning new ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleAa {
    stack: ExecutionStack<Step>,
    /// Length of the action's casualty list when this firing started.
    first_casualty: Option<usize>,
}

impl BattleAa {
    pub fn new() -> Self {
        BattleAa::default()
    }

    /// Fires `spec`, or resumes where an earlier call stopped.
    ///
    /// `spec` is only read on the first call. Returns the units this firing
    /// killed.
    pub fn fire(
        &mut self,
        bridge: &mut dyn DelegateBridge,
        action: &mut BattleActionContext,
        config: &EngineConfig,
        spec: &BattleAaSpec,
    ) -> Result<Vec<UnitId>, CombatError> {
        if self.first_casualty.is_none() {
            self.first_casualty = Some(action.casualties().len());
            push_battle_aa(&mut self.stack, spec.clone());
        }
        self.resume(bridge, action, config)
    }

    /// Drains the remaining steps.
    pub fn resume(
        &mut self,
        bridge: &mut dyn DelegateBridge,
        action: &mut BattleActionContext,
        config: &EngineConfig,
    ) -> Result<Vec<UnitId>, CombatError> {
        let mut cx = StepContext {
            bridge,
            action: &mut *action,
            config,
        };
        self.stack.execute(&mut cx)?;
        Ok(self.killed(action))
    }

    /// Units killed by this firing so far.
    pub fn killed(&self, action: &BattleActionContext) -> Vec<UnitId> {
        let casualties = action.casualties();
        let from = self.first_casualty.unwrap_or(casualties.len()).min(casualties.len());
        casualties[from..].to_vec()
    }

    pub fn is_finished(&self) -> bool {
        self.first_casualty.is_some() && self.stack.is_empty()
    }

    pub fn stack(&self) -> &ExecutionStack<Step> {
        &self.stack
    }
}
