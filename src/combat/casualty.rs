//! Casualty selection.
//!
//! Hits are assigned to valid targets in target order. A hit on a unit with
//! more than one hit point left damages it; the hit that takes its last hit
//! point kills it. Selections are checked against the targets before they
//! are applied.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::board::{GameData, UnitId};
use crate::bridge::RandomSource;
use crate::error::CombatError;

/// Units killed and units damaged (with the hits they take) by one roll.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasualtyDetails {
    pub killed: Vec<UnitId>,
    #[serde(default)]
    pub damaged: Vec<(UnitId, u32)>,
}

impl CasualtyDetails {
    pub fn is_empty(&self) -> bool {
        self.killed.is_empty() && self.damaged.is_empty()
    }

    /// Number of distinct units affected.
    pub fn size(&self) -> usize {
        self.killed.len() + self.damaged.len()
    }
}

/// A valid target and the hit points it has left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub unit: UnitId,
    pub hit_points: u32,
}

/// Resolves the ordered target list against the board. Dead units are dropped.
pub fn targets_from(data: &GameData, units: &[UnitId]) -> Result<Vec<Target>, CombatError> {
    let mut targets = Vec::with_capacity(units.len());
    for &id in units {
        let (unit, unit_type) = data.unit_with_type(id)?;
        let hit_points = unit.remaining_hit_points(unit_type);
        if hit_points > 0 {
            targets.push(Target { unit: id, hit_points });
        }
    }
    Ok(targets)
}

fn details_from(targets: &[Target], applied: &[u32]) -> CasualtyDetails {
    let mut details = CasualtyDetails::default();
    for (t, &hits) in targets.iter().zip(applied) {
        if hits == 0 {
            continue;
        }
        if hits >= t.hit_points {
            details.killed.push(t.unit);
        } else {
            details.damaged.push((t.unit, hits));
        }
    }
    details
}

/// Damage first, then kill, both in target order.
pub fn select_automatic(targets: &[Target], hits: usize) -> CasualtyDetails {
    let mut applied = vec![0u32; targets.len()];
    let mut left = hits as u32;

    for (i, t) in targets.iter().enumerate() {
        if left == 0 {
            break;
        }
        let absorb = t.hit_points.saturating_sub(1).min(left);
        applied[i] += absorb;
        left -= absorb;
    }
    for (i, t) in targets.iter().enumerate() {
        if left == 0 {
            break;
        }
        let take = (t.hit_points - applied[i]).min(left);
        applied[i] += take;
        left -= take;
    }
    details_from(targets, &applied)
}

/// Spreads hits over targets uniformly at random, one hit at a time.
pub fn select_random(
    targets: &[Target],
    hits: usize,
    random: &mut dyn RandomSource,
    annotation: &str,
) -> CasualtyDetails {
    let mut applied = vec![0u32; targets.len()];
    for _ in 0..hits {
        let open: Vec<usize> = (0..targets.len())
            .filter(|&i| applied[i] < targets[i].hit_points)
            .collect();
        if open.is_empty() {
            break;
        }
        let pick = random
            .random(open.len() as u32, 1, annotation)
            .first()
            .map(|&v| v as usize % open.len())
            .unwrap_or(0);
        applied[open[pick]] += 1;
    }
    details_from(targets, &applied)
}

/// Checks that `details` assigns exactly the hits available to valid targets.
///
/// Every casualty must be a target, no unit may appear twice, a damaged unit
/// must survive, and the hits consumed must equal `min(hits, total hit points)`.
pub fn validate(details: &CasualtyDetails, targets: &[Target], hits: usize) -> Result<(), CombatError> {
    if details.size() > targets.len() {
        return Err(CombatError::CasualtyOverflow {
            casualties: details.size(),
            targets: targets.len(),
        });
    }

    let mut seen = BTreeSet::new();
    let mut consumed: u64 = 0;
    let lookup = |unit: UnitId| -> Result<&Target, CombatError> {
        targets
            .iter()
            .find(|t| t.unit == unit)
            .ok_or(CombatError::CasualtyNotTargeted(unit))
    };

    for &unit in &details.killed {
        let target = lookup(unit)?;
        if !seen.insert(unit) {
            return Err(CombatError::CasualtyNotTargeted(unit));
        }
        consumed += u64::from(target.hit_points);
    }
    for &(unit, taken) in &details.damaged {
        let target = lookup(unit)?;
        if !seen.insert(unit) || taken == 0 || taken >= target.hit_points {
            return Err(CombatError::CasualtyNotTargeted(unit));
        }
        consumed += u64::from(taken);
    }

    let capacity: u64 = targets.iter().map(|t| u64::from(t.hit_points)).sum();
    let expected = (hits as u64).min(capacity);
    if consumed != expected {
        return Err(CombatError::CasualtyOverflow {
            casualties: consumed as usize,
            targets: expected as usize,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::ScriptedDice;

    fn t(id: u32, hit_points: u32) -> Target {
        Target {
            unit: UnitId(id),
            hit_points,
        }
    }

    #[test]
    fn automatic_kills_in_target_order() {
        let targets = [t(1, 1), t(2, 1), t(3, 1)];
        let details = select_automatic(&targets, 2);
        assert_eq!(details.killed, vec![UnitId(1), UnitId(2)]);
        assert!(details.damaged.is_empty());
        validate(&details, &targets, 2).unwrap();
    }

    #[test]
    fn automatic_damages_before_killing() {
        let targets = [t(1, 1), t(2, 2)];
        let details = select_automatic(&targets, 1);
        assert!(details.killed.is_empty());
        assert_eq!(details.damaged, vec![(UnitId(2), 1)]);

        let details = select_automatic(&targets, 2);
        assert_eq!(details.killed, vec![UnitId(1)]);
        assert_eq!(details.damaged, vec![(UnitId(2), 1)]);

        let details = select_automatic(&targets, 3);
        assert_eq!(details.killed, vec![UnitId(1), UnitId(2)]);
        validate(&details, &targets, 3).unwrap();
    }

    #[test]
    fn excess_hits_are_dropped() {
        let targets = [t(1, 1)];
        let details = select_automatic(&targets, 4);
        assert_eq!(details.killed, vec![UnitId(1)]);
        validate(&details, &targets, 4).unwrap();
    }

    #[test]
    fn random_selection_stays_within_targets() {
        let targets = [t(1, 1), t(2, 2), t(3, 1)];
        let mut dice = ScriptedDice::new(vec![1, 0, 2, 1]);
        let details = select_random(&targets, 3, &mut dice, "casualties");
        assert!(details.size() <= targets.len());
        validate(&details, &targets, 3).unwrap();
    }

    #[test]
    fn validate_rejects_foreign_and_duplicate_units() {
        let targets = [t(1, 1), t(2, 1)];
        let foreign = CasualtyDetails {
            killed: vec![UnitId(9)],
            damaged: vec![],
        };
        assert!(matches!(
            validate(&foreign, &targets, 1),
            Err(CombatError::CasualtyNotTargeted(UnitId(9)))
        ));

        let twice = CasualtyDetails {
            killed: vec![UnitId(1), UnitId(1)],
            damaged: vec![],
        };
        assert!(validate(&twice, &targets, 2).is_err());
    }

    #[test]
    fn validate_rejects_wrong_hit_count() {
        let targets = [t(1, 1), t(2, 1)];
        let short = CasualtyDetails {
            killed: vec![UnitId(1)],
            damaged: vec![],
        };
        assert!(matches!(
            validate(&short, &targets, 2),
            Err(CombatError::CasualtyOverflow { .. })
        ));
        assert!(validate(&CasualtyDetails::default(), &targets, 0).is_ok());
    }
}
