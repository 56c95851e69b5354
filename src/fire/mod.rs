//! Steps run on the battle action's execution stack.

pub mod in_battle;
pub mod in_move;

pub use in_battle::{push_battle_aa, BattleAa, BattleAaSpec};
pub use in_move::{default_ordering, moving_player, territories_where_aa_will_fire, AaInMove};

use serde::{Deserialize, Serialize};

use crate::board::UnitId;
use crate::combat::{resolve, FiringGroup, GroupId, StepContext};
use crate::error::CombatError;
use crate::stack::{Executable, ExecutionStack};

/// One resumable piece of AA fire.
///
/// Territory and battle steps expand into one roll/select/notify triple per
/// firing group. Group steps carry only the group id; their inputs and
/// results live in the action context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    FireInTerritory {
        territory: String,
        targets: Vec<UnitId>,
    },
    FireBattleAa(BattleAaSpec),
    RollDice(GroupId),
    SelectCasualties(GroupId),
    NotifyCasualties(GroupId),
}

impl<'a> Executable<StepContext<'a>> for Step {
    fn execute(self, stack: &mut ExecutionStack<Self>, cx: &mut StepContext<'a>) -> Result<(), CombatError> {
        match self {
            Step::FireInTerritory { territory, targets } => {
                let groups = in_move::plan_territory(cx, &territory, &targets)?;
                push_groups(stack, cx, groups);
                Ok(())
            }
            Step::FireBattleAa(spec) => {
                let groups = in_battle::plan_battle(cx, &spec)?;
                push_groups(stack, cx, groups);
                Ok(())
            }
            Step::RollDice(id) => resolve::roll_dice(cx, id),
            Step::SelectCasualties(id) => resolve::select_casualties(cx, id),
            Step::NotifyCasualties(id) => resolve::notify_casualties(cx, id),
        }
    }
}

/// Opens each group and queues its steps so groups resolve in order.
fn push_groups(stack: &mut ExecutionStack<Step>, cx: &mut StepContext<'_>, groups: Vec<FiringGroup>) {
    let mut steps = Vec::with_capacity(groups.len() * 3);
    for group in groups {
        let id = cx.action.open_group(group);
        steps.push(Step::RollDice(id));
        steps.push(Step::SelectCasualties(id));
        steps.push(Step::NotifyCasualties(id));
    }
    stack.push_all(steps);
}
