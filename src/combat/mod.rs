//! AA combat core: dice, casualty selection, firing groups and the
//! confirmation protocol, plus the per-action ledger the steps share.

pub mod casualty;
pub mod confirm;
pub mod context;
pub mod dice;
pub mod group;
pub mod resolve;

pub use casualty::{select_automatic, select_random, validate, CasualtyDetails, Target};
pub use context::{BattleActionContext, BattleId, GroupId, GroupPhase, GroupRecord, StepContext};
pub use dice::{roll_aa, DiceRoll, Die, Shooter};
pub use group::{build_groups, CasualtyRemoval, FiringGroup, GroupPlan};
