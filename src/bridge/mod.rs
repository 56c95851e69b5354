//! Host collaborators.
//!
//! The AA core never looks anything up globally: game data, dice, remote
//! players, history and the delegate execution slot all come through a
//! `DelegateBridge` handed to each step.

pub mod history;
pub mod local;
pub mod random;
pub mod remote;

pub use history::{History, HistoryEntry, HistoryWriter};
pub use local::LocalBridge;
pub use random::{RandomSource, ScriptedDice, SeededDice};
pub use remote::{AcknowledgingRemote, CasualtyNotice, CasualtyRequest, RemotePlayer};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::board::{GameData, PlayerId};

/// Shared flag that interrupts blocked remote waits.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// What the turn framework exposes to a running battle action.
pub trait DelegateBridge {
    fn data(&self) -> &GameData;
    fn data_mut(&mut self) -> &mut GameData;

    /// Player whose delegate is executing.
    fn player(&self) -> &PlayerId;

    /// No interactive participants: skip confirmations and choices.
    fn is_headless(&self) -> bool;

    fn random_source(&mut self) -> &mut dyn RandomSource;
    fn remote_player(&self, player: &PlayerId) -> Option<Arc<dyn RemotePlayer>>;
    fn history(&mut self) -> &mut dyn HistoryWriter;

    /// Hands the execution slot back to the turn framework while blocked.
    fn leave_delegate_execution(&mut self);
    fn enter_delegate_execution(&mut self);

    fn cancel_token(&self) -> CancelToken;
}

/// Delegate execution given up for the lifetime of the guard.
///
/// Re-entered on drop, so every exit path (including `?` and panics)
/// reclaims the slot.
pub struct YieldedExecution<'a> {
    bridge: &'a mut dyn DelegateBridge,
}

impl<'a> YieldedExecution<'a> {
    pub fn new(bridge: &'a mut dyn DelegateBridge) -> Self {
        bridge.leave_delegate_execution();
        YieldedExecution { bridge }
    }
}

impl Drop for YieldedExecution<'_> {
    fn drop(&mut self) {
        self.bridge.enter_delegate_execution();
    }
}

/// Handle on the move being executed.
pub trait UndoableMove {
    fn set_cant_undo(&mut self, reason: &str);
}

/// Plain record of whether a move may still be undone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveHandle {
    pub cant_undo: Option<String>,
}

impl MoveHandle {
    pub fn can_undo(&self) -> bool {
        self.cant_undo.is_none()
    }
}

impl UndoableMove for MoveHandle {
    fn set_cant_undo(&mut self, reason: &str) {
        self.cant_undo = Some(reason.to_string());
    }
}
