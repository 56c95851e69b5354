//! The three steps every firing group goes through: roll, select, notify.
//!
//! Each step checks the group's phase first. A step that finds its work
//! already recorded returns without doing it again.

use tracing::{debug, info, warn};

use super::casualty::{self, CasualtyDetails};
use super::confirm;
use super::context::{GroupId, GroupPhase, GroupRecord, StepContext};
use super::dice::{self, Shooter};
use super::group::CasualtyRemoval;
use crate::board::{units_to_text, CasualtyMode, UnitId};
use crate::bridge::{CasualtyNotice, CasualtyRequest};
use crate::error::CombatError;

/// Checks `phase` against the phase a step runs in.
///
/// `Ok(false)` means the step's work is already recorded.
fn should_run(record: &GroupRecord, expected: GroupPhase) -> Result<bool, CombatError> {
    let order = |p: GroupPhase| p as u8;
    if record.phase == expected {
        Ok(true)
    } else if order(record.phase) > order(expected) {
        debug!(group = record.id.0, phase = ?record.phase, "step already done, skipping");
        Ok(false)
    } else {
        Err(CombatError::PhaseMismatch {
            group: record.id,
            expected,
            found: record.phase,
        })
    }
}

/// Sends an informational message to the player running the action.
/// Failures are only logged.
fn report(cx: &StepContext<'_>, message: &str, title: &str) {
    let player = &cx.action.player;
    match cx.bridge.remote_player(player) {
        Some(remote) => {
            if let Err(e) = remote.report_message(message, title) {
                warn!(%player, error = %e, "could not report message");
            }
        }
        None => debug!(%player, message, "no remote to report to"),
    }
}

pub fn roll_dice(cx: &mut StepContext<'_>, id: GroupId) -> Result<(), CombatError> {
    let record = cx.action.group(id)?;
    if !should_run(record, GroupPhase::PendingRoll)? {
        return Ok(());
    }
    let group = &record.group;
    let data = cx.bridge.data();

    let targets: Vec<UnitId> = group
        .targets
        .iter()
        .copied()
        .filter(|&u| !cx.action.is_casualty(u) && data.is_present(u, None))
        .collect();

    let mut shooters = Vec::new();
    let mut sides = data.rules.dice_sides;
    for &unit in &group.firing_units {
        if !data.is_present(unit, Some(&group.territory)) {
            continue;
        }
        let (_, unit_type) = data.unit_with_type(unit)?;
        if let Some(aa) = &unit_type.aa {
            if shooters.is_empty() {
                sides = aa.dice_sides.unwrap_or(data.rules.dice_sides);
            }
            shooters.push(Shooter::new(unit, aa));
        }
    }

    if targets.is_empty() || shooters.is_empty() {
        debug!(
            group = id.0,
            territory = %group.territory,
            aa_type = %group.aa_type,
            "nothing to fire at, group skipped"
        );
        cx.action.group_mut(id)?.phase = GroupPhase::Done;
        return Ok(());
    }

    let low_luck = data.rules.low_luck_aa;
    let annotation = format!("Roll {} in {}", group.aa_type, group.territory);
    let roll = dice::roll_aa(
        &shooters,
        targets.len(),
        sides,
        low_luck,
        cx.bridge.random_source(),
        &annotation,
    );
    info!(
        group = id.0,
        hits = roll.hits,
        dice = roll.dice.len(),
        targets = targets.len(),
        "{}",
        annotation
    );

    let record = cx.action.group_mut(id)?;
    record.active_firing = shooters.iter().map(|s| s.unit).collect();
    record.valid_targets = targets;
    record.dice = Some(roll);
    record.phase = GroupPhase::Rolled;
    Ok(())
}

pub fn select_casualties(cx: &mut StepContext<'_>, id: GroupId) -> Result<(), CombatError> {
    let record = cx.action.group(id)?;
    if !should_run(record, GroupPhase::Rolled)? {
        return Ok(());
    }
    let group = record.group.clone();
    let roll = record.dice.clone().unwrap_or_default();
    let hits = roll.hits;
    let targets = casualty::targets_from(cx.bridge.data(), &record.valid_targets)?;

    let details = if hits == 0 {
        CasualtyDetails::default()
    } else {
        let mode = cx.bridge.data().rules.casualty_mode();
        let annotation = format!("{} casualties in {}", group.aa_type, group.territory);
        let default = match mode {
            CasualtyMode::Random => {
                casualty::select_random(&targets, hits, cx.bridge.random_source(), &annotation)
            }
            CasualtyMode::Automatic | CasualtyMode::Interactive => casualty::select_automatic(&targets, hits),
        };
        casualty::validate(&default, &targets, hits)?;

        if mode == CasualtyMode::Interactive && !cx.action.headless {
            let request = CasualtyRequest {
                battle_id: cx.action.battle_id,
                territory: group.territory.clone(),
                aa_type: group.aa_type.clone(),
                dice: roll.clone(),
                targets: targets.iter().map(|t| t.unit).collect(),
                default_selection: default.clone(),
            };
            match confirm::request_casualty_choice(cx, id, request, &group.hit_player)? {
                Some(choice) => match casualty::validate(&choice, &targets, hits) {
                    Ok(()) => choice,
                    Err(e) => {
                        warn!(player = %group.hit_player, error = %e, "invalid casualty choice, using default");
                        default
                    }
                },
                None => default,
            }
        } else {
            default
        }
    };

    if hits == 0 {
        report(
            cx,
            &format!("No {} hits in {}", group.aa_type, group.territory),
            &group.aa_type,
        );
    } else {
        report(
            cx,
            &format!("{} {} hits in {}", details.size(), group.aa_type, group.territory),
            &group.aa_type,
        );
    }

    cx.bridge.data_mut().mark_damaged(&details.damaged)?;
    if !details.killed.is_empty() {
        let text = format!(
            "{} lost in {}",
            units_to_text(cx.bridge.data(), &details.killed),
            group.territory
        );
        cx.bridge.history().add_child_to_event(text, details.killed.clone());
    }
    cx.action.record_killed(&details.killed);
    info!(
        group = id.0,
        killed = details.killed.len(),
        damaged = details.damaged.len(),
        "{} casualties selected in {}",
        group.aa_type,
        group.territory
    );

    let record = cx.action.group_mut(id)?;
    record.casualties = Some(details);
    record.phase = GroupPhase::CasualtiesSelected;
    Ok(())
}

pub fn notify_casualties(cx: &mut StepContext<'_>, id: GroupId) -> Result<(), CombatError> {
    let record = cx.action.group(id)?;
    if record.phase == GroupPhase::Done {
        return Ok(());
    }
    if record.phase != GroupPhase::Confirmed && !should_run(record, GroupPhase::CasualtiesSelected)? {
        return Ok(());
    }
    let record = record.clone();
    let group = &record.group;
    let details = record.casualties.clone().unwrap_or_default();

    if record.phase == GroupPhase::CasualtiesSelected {
        if !cx.action.headless {
            let notice = CasualtyNotice {
                battle_id: cx.action.battle_id,
                message: format!("{} remove {} casualties", group.hit_player, group.aa_type),
                dice: record.dice.clone().unwrap_or_default(),
                casualties: details.clone(),
            };
            confirm::confirm_casualties(cx, id, group, notice)?;
        }
        cx.action.group_mut(id)?.phase = GroupPhase::Confirmed;
    }

    let data = cx.bridge.data_mut();
    if group.removal == CasualtyRemoval::RemoveFromBoard && !details.killed.is_empty() {
        data.remove_units(&group.territory, &details.killed)?;
    }
    if group.suicide_on_hit && record.hits() > 0 {
        let spent: Vec<UnitId> = record
            .active_firing
            .iter()
            .copied()
            .filter(|&u| data.is_present(u, Some(&group.territory)))
            .take(record.hits())
            .collect();
        if !spent.is_empty() {
            debug!(group = id.0, spent = spent.len(), "removing suicide AA");
            data.remove_units(&group.territory, &spent)?;
        }
    }
    cx.action.group_mut(id)?.phase = GroupPhase::Done;
    Ok(())
}
