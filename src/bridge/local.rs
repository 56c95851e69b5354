//! In-process delegate bridge.
//!
//! Owns the game data, an authoritative random source, registered remote
//! players and an in-memory history. Used by the scenario runner and by
//! tests; a networked host supplies its own `DelegateBridge`.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::history::History;
use super::random::{RandomSource, SeededDice};
use super::remote::RemotePlayer;
use super::{CancelToken, DelegateBridge, HistoryWriter};
use crate::board::{GameData, PlayerId};

pub struct LocalBridge {
    data: GameData,
    player: PlayerId,
    headless: bool,
    dice: Box<dyn RandomSource + Send>,
    remotes: BTreeMap<PlayerId, Arc<dyn RemotePlayer>>,
    history: History,
    cancel: CancelToken,
    in_delegate: bool,
    yields: usize,
}

impl LocalBridge {
    /// Creates an interactive bridge rolling seeded dice (seed 0 uses entropy).
    pub fn new(data: GameData, player: &str, seed: u64) -> Self {
        LocalBridge {
            data,
            player: PlayerId::new(player),
            headless: false,
            dice: Box::new(SeededDice::new(seed)),
            remotes: BTreeMap::new(),
            history: History::default(),
            cancel: CancelToken::new(),
            in_delegate: true,
            yields: 0,
        }
    }

    pub fn with_dice(mut self, dice: impl RandomSource + Send + 'static) -> Self {
        self.dice = Box::new(dice);
        self
    }

    pub fn with_remote(mut self, player: &str, remote: Arc<dyn RemotePlayer>) -> Self {
        self.set_remote(player, remote);
        self
    }

    /// Registers or replaces a player's remote, e.g. after a reconnect.
    pub fn set_remote(&mut self, player: &str, remote: Arc<dyn RemotePlayer>) {
        self.remotes.insert(PlayerId::new(player), remote);
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn history_entries(&self) -> &History {
        &self.history
    }

    pub fn into_parts(self) -> (GameData, History) {
        (self.data, self.history)
    }

    /// Times the execution slot was given up.
    pub fn yield_count(&self) -> usize {
        self.yields
    }

    pub fn in_delegate_execution(&self) -> bool {
        self.in_delegate
    }
}

impl DelegateBridge for LocalBridge {
    fn data(&self) -> &GameData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut GameData {
        &mut self.data
    }

    fn player(&self) -> &PlayerId {
        &self.player
    }

    fn is_headless(&self) -> bool {
        self.headless
    }

    fn random_source(&mut self) -> &mut dyn RandomSource {
        self.dice.as_mut()
    }

    fn remote_player(&self, player: &PlayerId) -> Option<Arc<dyn RemotePlayer>> {
        self.remotes.get(player).cloned()
    }

    fn history(&mut self) -> &mut dyn HistoryWriter {
        &mut self.history
    }

    fn leave_delegate_execution(&mut self) {
        self.in_delegate = false;
        self.yields += 1;
    }

    fn enter_delegate_execution(&mut self) {
        self.in_delegate = true;
    }

    fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }
}
