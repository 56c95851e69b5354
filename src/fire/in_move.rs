//! AA fire against units moving through defended territories.
//!
//! The route decides where AA fires: every middle step with eligible AA,
//! plus either the destination (when fly-over attacks are forced on the
//! last step) or the start (unless a battle was already fought there).
//! Territories fire in route order; within a territory, AA types fire most
//! recently declared first.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::Step;
use crate::board::{GameData, MovePhase, PlayerId, Route, Unit, UnitId};
use crate::bridge::{DelegateBridge, UndoableMove};
use crate::combat::{build_groups, BattleActionContext, BattleId, CasualtyRemoval, FiringGroup, GroupPlan, StepContext};
use crate::config::EngineConfig;
use crate::error::CombatError;
use crate::stack::ExecutionStack;

/// Units with the least movement left are hit first; ties go by id.
pub fn default_ordering(a: &Unit, b: &Unit) -> Ordering {
    a.movement_left
        .cmp(&b.movement_left)
        .then_with(|| a.id.cmp(&b.id))
}

/// The player the moving units fight for.
///
/// In edit mode the acting player need not own the units, so ownership of
/// the units decides: the acting player if they own any, else the first
/// non-null owner found.
pub fn moving_player(player: &PlayerId, units: &[&Unit]) -> PlayerId {
    if units.iter().any(|u| &u.owner == player) {
        return player.clone();
    }
    units
        .iter()
        .map(|u| u.owner.clone())
        .find(|owner| !owner.is_null())
        .unwrap_or_else(PlayerId::null)
}

/// Whether `unit` is fly-over AA able to shoot at any of `moving`.
fn can_fire_at(data: &GameData, unit: UnitId, moving: &[&Unit], moving_player: &PlayerId) -> bool {
    let Ok((unit, unit_type)) = data.unit_with_type(unit) else {
        return false;
    };
    let Some(aa) = &unit_type.aa else {
        return false;
    };
    if !aa.fires_on_fly_over || aa.max_attacks == 0 || unit.transported_by.is_some() {
        return false;
    }
    if !data.is_at_war(&unit.owner, moving_player) {
        return false;
    }
    let airborne = data.airborne_targets_for(moving_player, &aa.aa_type);
    moving.iter().any(|m| {
        aa.can_target(&m.unit_type) || (m.airborne && airborne.iter().any(|t| *t == m.unit_type))
    })
}

fn has_aa(data: &GameData, territory: &str, moving: &[&Unit], moving_player: &PlayerId) -> Result<bool, CombatError> {
    Ok(data
        .territory(territory)?
        .units
        .iter()
        .any(|&u| can_fire_at(data, u, moving, moving_player)))
}

/// Territories along `route` where AA will fire at `units`, in route order.
pub fn territories_where_aa_will_fire(
    data: &GameData,
    player: &PlayerId,
    route: &Route,
    units: &[UnitId],
) -> Result<Vec<String>, CombatError> {
    let rules = &data.rules;
    if !rules.always_on_aa && rules.aa_territory_restricted {
        return Ok(Vec::new());
    }
    if data.phase == MovePhase::NonCombat && !rules.always_on_aa {
        return Ok(Vec::new());
    }

    let moving = units
        .iter()
        .map(|&u| data.require_unit(u))
        .collect::<Result<Vec<_>, _>>()?;
    let moving_player = moving_player(player, &moving);

    let mut territories = Vec::new();
    for step in route.middle_steps() {
        if has_aa(data, step, &moving, &moving_player)? {
            territories.push(step.clone());
        }
    }
    if rules.force_aa_attacks_for_last_step_of_fly_over {
        if has_aa(data, route.end(), &moving, &moving_player)? {
            territories.push(route.end().to_string());
        }
    } else if has_aa(data, route.start(), &moving, &moving_player)? && !data.was_battle_fought(route.start()) {
        // The start fires too, so units can't hop to and from AA sites one
        // step at a time.
        territories.push(route.start().to_string());
    }
    Ok(territories)
}

/// Forms the firing groups for one territory on the route.
pub(crate) fn plan_territory(
    cx: &mut StepContext<'_>,
    territory: &str,
    targets: &[UnitId],
) -> Result<Vec<FiringGroup>, CombatError> {
    let data = cx.bridge.data();
    let remaining: Vec<UnitId> = targets
        .iter()
        .copied()
        .filter(|&u| !cx.action.is_casualty(u) && data.unit(u).is_some())
        .collect();
    if remaining.is_empty() {
        debug!(territory, "no moving units left to fire at");
        return Ok(Vec::new());
    }

    let moving: Vec<&Unit> = remaining.iter().filter_map(|&u| data.unit(u)).collect();
    let moving_player = moving_player(&cx.action.player, &moving);
    let defending: Vec<UnitId> = data
        .territory(territory)?
        .units
        .iter()
        .copied()
        .filter(|&u| can_fire_at(data, u, &moving, &moving_player))
        .collect();

    let groups = build_groups(
        data,
        &GroupPlan {
            territory,
            aa_units: &defending,
            candidates: &remaining,
            hit_player: &moving_player,
            firing_player: None,
            airborne_allowed: true,
            removal: CasualtyRemoval::ReturnToHost,
        },
    );
    for group in &groups {
        cx.action
            .set_cant_undo(format!("Move cannot be undone after {} has fired.", group.aa_type));
    }
    info!(territory, groups = groups.len(), "AA fires at moving units");
    Ok(groups)
}

/// AA fire for one move, resumable across calls and process restarts.
///
/// Serializing an `AaInMove` captures the pending steps and everything
/// already rolled and selected; deserializing it and calling `fire_aa` (or
/// `resume`) again continues where it stopped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AaInMove {
    #[serde(default)]
    config: EngineConfig,
    stack: ExecutionStack<Step>,
    action: BattleActionContext,
}

impl AaInMove {
    pub fn new(config: EngineConfig) -> Self {
        AaInMove {
            config,
            ..AaInMove::default()
        }
    }

    /// Fires AA along `route` at `units` and returns the units killed.
    ///
    /// Targets are hit in `ordering` order. If a previous call was
    /// interrupted, its pending steps run instead and the arguments are
    /// ignored. Once any AA has fired the move is marked non-undoable, even
    /// if resolution then fails.
    pub fn fire_aa<F>(
        &mut self,
        bridge: &mut dyn DelegateBridge,
        route: &Route,
        units: &[UnitId],
        ordering: F,
        current_move: &mut dyn UndoableMove,
    ) -> Result<Vec<UnitId>, CombatError>
    where
        F: FnMut(&Unit, &Unit) -> Ordering,
    {
        self.prepare(&*bridge, route, units, ordering)?;
        let result = self.resume(bridge);
        if let Some(reason) = self.action.cant_undo() {
            current_move.set_cant_undo(reason);
        }
        result?;
        Ok(self.action.casualties().to_vec())
    }

    /// Queues one territory step per firing territory. Does nothing while
    /// steps are still pending.
    pub fn prepare<F>(
        &mut self,
        bridge: &dyn DelegateBridge,
        route: &Route,
        units: &[UnitId],
        mut ordering: F,
    ) -> Result<(), CombatError>
    where
        F: FnMut(&Unit, &Unit) -> Ordering,
    {
        if !self.stack.is_empty() {
            debug!(pending = self.stack.len(), "resuming interrupted AA fire");
            return Ok(());
        }
        let data = bridge.data();
        let territories = territories_where_aa_will_fire(data, bridge.player(), route, units)?;

        let mut moving = units
            .iter()
            .map(|&u| data.require_unit(u))
            .collect::<Result<Vec<_>, _>>()?;
        moving.sort_by(|a, b| ordering(a, b));
        let targets: Vec<UnitId> = moving.iter().map(|u| u.id).collect();

        self.action = BattleActionContext::new(BattleId::default(), bridge.player().clone(), bridge.is_headless());
        self.action.set_targets(targets.clone());
        self.stack.push_all(
            territories
                .into_iter()
                .map(|territory| Step::FireInTerritory {
                    territory,
                    targets: targets.clone(),
                })
                .collect(),
        );
        Ok(())
    }

    /// Runs pending steps to completion.
    pub fn resume(&mut self, bridge: &mut dyn DelegateBridge) -> Result<(), CombatError> {
        self.execute_steps(bridge, usize::MAX).map(|_| ())
    }

    /// Runs at most `limit` pending steps. Returns how many ran.
    pub fn execute_steps(&mut self, bridge: &mut dyn DelegateBridge, limit: usize) -> Result<usize, CombatError> {
        let mut cx = StepContext {
            bridge,
            action: &mut self.action,
            config: &self.config,
        };
        self.stack.execute_steps(&mut cx, limit)
    }

    /// Units killed so far, in selection order.
    pub fn casualties(&self) -> &[UnitId] {
        self.action.casualties()
    }

    pub fn is_finished(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn stack(&self) -> &ExecutionStack<Step> {
        &self.stack
    }

    pub fn action(&self) -> &BattleActionContext {
        &self.action
    }
}
