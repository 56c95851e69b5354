//! Firing groups.
//!
//! AA units in a territory fire by AA type. Within one type, units that die
//! when they score a hit fire as separate groups per unit type (so each hit
//! costs the right unit) and everything else fires together.

use serde::{Deserialize, Serialize};

use crate::board::{AaAbility, GameData, PlayerId, UnitId};

/// What happens to units killed by a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CasualtyRemoval {
    /// The host removes them when it finishes the move.
    ReturnToHost,
    /// Removed from the board as soon as the group is confirmed.
    RemoveFromBoard,
}

/// Units of one AA type firing together at one set of targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiringGroup {
    pub territory: String,
    pub aa_type: String,
    pub firing_player: PlayerId,
    pub hit_player: PlayerId,
    pub firing_units: Vec<UnitId>,
    /// Eligible targets in casualty order.
    pub targets: Vec<UnitId>,
    pub suicide_on_hit: bool,
    pub removal: CasualtyRemoval,
}

fn ability(data: &GameData, unit: UnitId) -> Option<&AaAbility> {
    let (_, unit_type) = data.unit_with_type(unit).ok()?;
    unit_type.aa.as_ref()
}

/// Distinct AA types among `units`, most recently declared first.
pub fn aa_types_in_firing_order(data: &GameData, units: &[UnitId]) -> Vec<String> {
    let mut types: Vec<String> = Vec::new();
    for &unit in units {
        if let Some(aa) = ability(data, unit) {
            if !types.contains(&aa.aa_type) {
                types.push(aa.aa_type.clone());
            }
        }
    }
    types.sort_by_key(|t| data.aa_declaration_index(t));
    types.reverse();
    types
}

/// Splits units sharing an AA type into suicide groups per unit type (in
/// declaration order) followed by one group for the rest.
pub fn partition_by_suicide(data: &GameData, units: &[UnitId]) -> Vec<Vec<UnitId>> {
    let mut groups = Vec::new();
    for unit_type in &data.unit_types {
        if !unit_type.aa.as_ref().is_some_and(|aa| aa.suicide_on_hit) {
            continue;
        }
        let members: Vec<UnitId> = units
            .iter()
            .copied()
            .filter(|&u| data.unit(u).is_some_and(|unit| unit.unit_type == unit_type.name))
            .collect();
        if !members.is_empty() {
            groups.push(members);
        }
    }

    let rest: Vec<UnitId> = units
        .iter()
        .copied()
        .filter(|&u| !ability(data, u).is_some_and(|aa| aa.suicide_on_hit))
        .collect();
    if !rest.is_empty() {
        groups.push(rest);
    }
    groups
}

/// Candidates the given AA can shoot at, preserving candidate order.
///
/// Airborne units are also eligible when their type is among
/// `airborne_types`. Infrastructure is never eligible.
pub fn eligible_targets(
    data: &GameData,
    aa: &AaAbility,
    airborne_types: &[String],
    candidates: &[UnitId],
) -> Vec<UnitId> {
    candidates
        .iter()
        .copied()
        .filter(|&id| {
            let Ok((unit, unit_type)) = data.unit_with_type(id) else {
                return false;
            };
            if unit_type.is_infrastructure {
                return false;
            }
            aa.can_target(&unit.unit_type)
                || (unit.airborne && airborne_types.iter().any(|t| *t == unit.unit_type))
        })
        .collect()
}

/// Owner of the firing units: the territory owner when one of the units is
/// theirs, otherwise the owner of the first unit.
pub fn find_defender(data: &GameData, territory: &str, units: &[UnitId]) -> PlayerId {
    let owner = data.territory(territory).ok().map(|t| t.owner.clone());
    if let Some(owner) = owner.filter(|o| !o.is_null()) {
        if units
            .iter()
            .any(|&u| data.unit(u).is_some_and(|unit| unit.owner == owner))
        {
            return owner;
        }
    }
    units
        .iter()
        .find_map(|&u| data.unit(u).map(|unit| unit.owner.clone()))
        .unwrap_or_default()
}

/// Everything needed to form the groups firing in one territory.
#[derive(Debug, Clone)]
pub struct GroupPlan<'a> {
    pub territory: &'a str,
    pub aa_units: &'a [UnitId],
    pub candidates: &'a [UnitId],
    pub hit_player: &'a PlayerId,
    /// Firing player; derived per group from the territory when `None`.
    pub firing_player: Option<&'a PlayerId>,
    pub airborne_allowed: bool,
    pub removal: CasualtyRemoval,
}

/// Forms firing groups in firing order.
///
/// Groups whose AA cannot reach any candidate are still formed; they resolve
/// as a silent no-op.
pub fn build_groups(data: &GameData, plan: &GroupPlan<'_>) -> Vec<FiringGroup> {
    let mut groups = Vec::new();
    for aa_type in aa_types_in_firing_order(data, plan.aa_units) {
        let of_type: Vec<UnitId> = plan
            .aa_units
            .iter()
            .copied()
            .filter(|&u| ability(data, u).is_some_and(|aa| aa.aa_type == aa_type))
            .collect();

        for members in partition_by_suicide(data, &of_type) {
            let Some(aa) = members.first().and_then(|&u| ability(data, u)) else {
                continue;
            };
            let airborne = if plan.airborne_allowed {
                data.airborne_targets_for(plan.hit_player, &aa_type)
            } else {
                &[]
            };
            let targets = eligible_targets(data, aa, airborne, plan.candidates);
            let firing_player = match plan.firing_player {
                Some(p) => p.clone(),
                None => find_defender(data, plan.territory, &members),
            };
            groups.push(FiringGroup {
                territory: plan.territory.to_string(),
                aa_type: aa_type.clone(),
                firing_player,
                hit_player: plan.hit_player.clone(),
                suicide_on_hit: aa.suicide_on_hit,
                firing_units: members,
                targets,
                removal: plan.removal,
            });
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Player, Rules, Territory, Unit, UnitType};

    fn aa(aa_type: &str, targets: &[&str], suicide: bool) -> AaAbility {
        AaAbility {
            aa_type: aa_type.to_string(),
            strength: 1,
            dice_sides: None,
            max_attacks: -1,
            targets: targets.iter().map(|t| t.to_string()).collect(),
            fires_on_fly_over: true,
            suicide_on_hit: suicide,
        }
    }

    fn board() -> GameData {
        let mut data = GameData::new(Rules::default());
        data.add_player(Player::new("Germans", Some("Axis")));
        data.add_player(Player::new("British", Some("Allies")));
        data.add_unit_type(UnitType::new("aaGun").with_aa(aa("AA", &["fighter", "bomber"], false)));
        data.add_unit_type(UnitType::new("radar").with_aa(aa("radar-AA", &["bomber"], false)));
        data.add_unit_type(UnitType::new("rocket").with_aa(aa("AA", &["fighter"], true)));
        data.add_unit_type(UnitType::new("fighter"));
        data.add_unit_type(UnitType::new("bomber"));
        data.add_unit_type(UnitType::new("factory").infrastructure());
        data.add_territory(Territory::new("Ruhr", "Germans"));
        data.add_territory(Territory::new("London", "British"));
        data
    }

    fn place(data: &mut GameData, territory: &str, id: u32, unit_type: &str, owner: &str) -> UnitId {
        data.place_unit(territory, Unit::new(id, unit_type, owner)).unwrap()
    }

    #[test]
    fn later_declared_aa_types_fire_first() {
        let mut data = board();
        let gun = place(&mut data, "Ruhr", 1, "aaGun", "Germans");
        let radar = place(&mut data, "Ruhr", 2, "radar", "Germans");
        assert_eq!(
            aa_types_in_firing_order(&data, &[gun, radar]),
            vec!["radar-AA".to_string(), "AA".to_string()]
        );
    }

    #[test]
    fn suicide_units_fire_apart() {
        let mut data = board();
        let gun = place(&mut data, "Ruhr", 1, "aaGun", "Germans");
        let rocket = place(&mut data, "Ruhr", 2, "rocket", "Germans");
        let groups = partition_by_suicide(&data, &[gun, rocket]);
        assert_eq!(groups, vec![vec![rocket], vec![gun]]);
    }

    #[test]
    fn infrastructure_is_never_a_target() {
        let mut data = board();
        let general = aa("AA", &["fighter", "factory"], false);
        let fighter = place(&mut data, "London", 10, "fighter", "British");
        let factory = place(&mut data, "London", 11, "factory", "British");
        assert_eq!(eligible_targets(&data, &general, &[], &[factory, fighter]), vec![fighter]);
    }

    #[test]
    fn airborne_units_become_targets() {
        let mut data = board();
        let mut paratrooper = Unit::new(12, "bomber", "British");
        paratrooper.airborne = true;
        let id = data.place_unit("London", paratrooper).unwrap();
        let fighters_only = aa("AA", &["fighter"], false);
        assert!(eligible_targets(&data, &fighters_only, &[], &[id]).is_empty());
        assert_eq!(
            eligible_targets(&data, &fighters_only, &["bomber".to_string()], &[id]),
            vec![id]
        );
    }

    #[test]
    fn defender_prefers_territory_owner() {
        let mut data = board();
        data.add_player(Player::new("Italians", Some("Axis")));
        let italian = place(&mut data, "Ruhr", 1, "aaGun", "Italians");
        let german = place(&mut data, "Ruhr", 2, "aaGun", "Germans");
        assert_eq!(find_defender(&data, "Ruhr", &[italian, german]), PlayerId::new("Germans"));
        assert_eq!(find_defender(&data, "Ruhr", &[italian]), PlayerId::new("Italians"));
    }

    #[test]
    fn groups_follow_firing_order() {
        let mut data = board();
        let gun = place(&mut data, "Ruhr", 1, "aaGun", "Germans");
        let radar = place(&mut data, "Ruhr", 2, "radar", "Germans");
        let fighter = place(&mut data, "London", 10, "fighter", "British");
        let bomber = place(&mut data, "London", 11, "bomber", "British");
        let british = PlayerId::new("British");
        let groups = build_groups(
            &data,
            &GroupPlan {
                territory: "Ruhr",
                aa_units: &[gun, radar],
                candidates: &[fighter, bomber],
                hit_player: &british,
                firing_player: None,
                airborne_allowed: true,
                removal: CasualtyRemoval::ReturnToHost,
            },
        );
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].aa_type, "radar-AA");
        assert_eq!(groups[0].targets, vec![bomber]);
        assert_eq!(groups[1].aa_type, "AA");
        assert_eq!(groups[1].targets, vec![fighter, bomber]);
        assert_eq!(groups[1].firing_player, PlayerId::new("Germans"));
    }
}
