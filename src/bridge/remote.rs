//! Remote player facade.
//!
//! Calls may block for as long as the human on the other end takes to click
//! through, so implementations must be shareable across threads.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::board::{PlayerId, UnitId};
use crate::combat::{BattleId, CasualtyDetails, DiceRoll};
use crate::error::RemoteError;

/// Casualties shown to both sides for acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasualtyNotice {
    pub battle_id: BattleId,
    pub message: String,
    pub dice: DiceRoll,
    pub casualties: CasualtyDetails,
}

/// Asks the affected player to pick casualties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasualtyRequest {
    pub battle_id: BattleId,
    pub territory: String,
    pub aa_type: String,
    pub dice: DiceRoll,
    /// Units the hits may be assigned to, in target order.
    pub targets: Vec<UnitId>,
    /// What the automatic rule would choose.
    pub default_selection: CasualtyDetails,
}

/// A participant reachable over the network (or a local AI).
pub trait RemotePlayer: Send + Sync {
    fn report_message(&self, message: &str, title: &str) -> Result<(), RemoteError>;

    /// Blocks until the player acknowledges their own losses.
    fn confirm_own_casualties(&self, notice: &CasualtyNotice) -> Result<(), RemoteError>;

    /// Blocks until the player acknowledges the losses they inflicted.
    fn confirm_enemy_casualties(
        &self,
        notice: &CasualtyNotice,
        hit_player: &PlayerId,
    ) -> Result<(), RemoteError>;

    /// `None` accepts the default selection.
    fn select_casualties(
        &self,
        _request: &CasualtyRequest,
    ) -> Result<Option<CasualtyDetails>, RemoteError> {
        Ok(None)
    }
}

/// Acknowledges everything immediately and keeps the messages it received.
#[derive(Debug, Default)]
pub struct AcknowledgingRemote {
    messages: Mutex<Vec<String>>,
}

impl AcknowledgingRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(m) => m.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn record(&self, line: String) {
        match self.messages.lock() {
            Ok(mut m) => m.push(line),
            Err(poisoned) => poisoned.into_inner().push(line),
        }
    }
}

impl RemotePlayer for AcknowledgingRemote {
    fn report_message(&self, message: &str, _title: &str) -> Result<(), RemoteError> {
        self.record(message.to_string());
        Ok(())
    }

    fn confirm_own_casualties(&self, notice: &CasualtyNotice) -> Result<(), RemoteError> {
        self.record(format!("own: {}", notice.message));
        Ok(())
    }

    fn confirm_enemy_casualties(
        &self,
        notice: &CasualtyNotice,
        _hit_player: &PlayerId,
    ) -> Result<(), RemoteError> {
        self.record(format!("enemy: {}", notice.message));
        Ok(())
    }
}
