//! Shared board fixture and scripted remotes for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use barrage::board::{AaAbility, GameData, Player, PlayerId, Rules, Territory, Unit, UnitId, UnitType};
use barrage::bridge::{CasualtyNotice, CasualtyRequest, RemotePlayer};
use barrage::combat::CasualtyDetails;
use barrage::error::RemoteError;

pub fn aa(aa_type: &str, strength: u32, targets: &[&str]) -> AaAbility {
    AaAbility {
        aa_type: aa_type.to_string(),
        strength,
        dice_sides: None,
        max_attacks: -1,
        targets: targets.iter().map(|t| t.to_string()).collect(),
        fires_on_fly_over: true,
        suicide_on_hit: false,
    }
}

/// Axis Germans against Allied British and Americans.
///
/// Unit types are declared in this order: `aaGun` (AA), `radar` (radar-AA),
/// `rocket` (suicide AA), `fighter`, `bomber`, `heavyBomber` (2 hit points),
/// `factory` (infrastructure). The route London -> Channel -> Holland ->
/// Ruhr -> Berlin crosses a neutral sea zone.
pub fn world(rules: Rules) -> GameData {
    let mut data = GameData::new(rules);
    data.add_player(Player::new("Germans", Some("Axis")));
    data.add_player(Player::new("British", Some("Allies")));
    data.add_player(Player::new("Americans", Some("Allies")));

    data.add_unit_type(UnitType::new("aaGun").with_aa(aa("AA", 1, &["fighter", "bomber", "heavyBomber"])));
    data.add_unit_type(UnitType::new("radar").with_aa(aa("radar-AA", 2, &["bomber", "heavyBomber"])));
    let mut rocket = aa("AA", 3, &["fighter", "bomber"]);
    rocket.suicide_on_hit = true;
    data.add_unit_type(UnitType::new("rocket").with_aa(rocket));
    data.add_unit_type(UnitType::new("fighter"));
    data.add_unit_type(UnitType::new("bomber"));
    data.add_unit_type(UnitType::new("heavyBomber").with_hit_points(2));
    data.add_unit_type(UnitType::new("factory").infrastructure());

    data.add_territory(Territory::new("London", "British"));
    data.add_territory(Territory::unowned("Channel"));
    data.add_territory(Territory::new("Holland", "Germans"));
    data.add_territory(Territory::new("Ruhr", "Germans"));
    data.add_territory(Territory::new("Berlin", "Germans"));
    data
}

pub fn place(data: &mut GameData, territory: &str, id: u32, unit_type: &str, owner: &str) -> UnitId {
    data.place_unit(territory, Unit::new(id, unit_type, owner)).unwrap()
}

pub fn place_moving(data: &mut GameData, id: u32, unit_type: &str, movement_left: u32) -> UnitId {
    data.place_unit("London", Unit::new(id, unit_type, "British").with_movement(movement_left))
        .unwrap()
}

pub fn british() -> PlayerId {
    PlayerId::new("British")
}

pub fn germans() -> PlayerId {
    PlayerId::new("Germans")
}

/// Records every call and answers as configured.
#[derive(Default)]
pub struct ScriptedRemote {
    log: Mutex<Vec<String>>,
    pub own_error: Option<RemoteError>,
    pub enemy_error: Option<RemoteError>,
    pub choice: Option<CasualtyDetails>,
    pub choice_delay: Option<Duration>,
    pub enemy_signal: Option<Mutex<Sender<String>>>,
}

impl ScriptedRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, line: String) {
        self.log.lock().unwrap().push(line);
    }
}

impl RemotePlayer for ScriptedRemote {
    fn report_message(&self, message: &str, _title: &str) -> Result<(), RemoteError> {
        self.record(format!("report: {}", message));
        Ok(())
    }

    fn confirm_own_casualties(&self, notice: &CasualtyNotice) -> Result<(), RemoteError> {
        self.record(format!("own: {}", notice.message));
        match &self.own_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn confirm_enemy_casualties(&self, notice: &CasualtyNotice, hit_player: &PlayerId) -> Result<(), RemoteError> {
        self.record(format!("enemy: {} ({})", notice.message, hit_player));
        if let Some(signal) = &self.enemy_signal {
            let _ = signal.lock().unwrap().send(notice.message.clone());
        }
        match &self.enemy_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn select_casualties(&self, request: &CasualtyRequest) -> Result<Option<CasualtyDetails>, RemoteError> {
        self.record(format!("select: {} targets", request.targets.len()));
        if let Some(delay) = self.choice_delay {
            thread::sleep(delay);
        }
        Ok(self.choice.clone())
    }
}

/// Holds every casualty choice and own confirmation until released, and
/// counts the requests it receives.
#[derive(Default)]
pub struct BlockingRemote {
    release: AtomicBool,
    entered: AtomicBool,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    own_calls: AtomicUsize,
    enemy_calls: AtomicUsize,
    select_calls: AtomicUsize,
    pub choice: Option<CasualtyDetails>,
}

impl BlockingRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn release(&self) {
        self.release.store(true, Ordering::SeqCst);
    }

    /// Whether a request has started blocking.
    pub fn entered(&self) -> bool {
        self.entered.load(Ordering::SeqCst)
    }

    /// Most requests ever blocked at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn own_calls(&self) -> usize {
        self.own_calls.load(Ordering::SeqCst)
    }

    pub fn enemy_calls(&self) -> usize {
        self.enemy_calls.load(Ordering::SeqCst)
    }

    pub fn select_calls(&self) -> usize {
        self.select_calls.load(Ordering::SeqCst)
    }

    fn hold(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.entered.store(true, Ordering::SeqCst);
        while !self.release.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(5));
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RemotePlayer for BlockingRemote {
    fn report_message(&self, _message: &str, _title: &str) -> Result<(), RemoteError> {
        Ok(())
    }

    fn confirm_own_casualties(&self, _notice: &CasualtyNotice) -> Result<(), RemoteError> {
        self.own_calls.fetch_add(1, Ordering::SeqCst);
        self.hold();
        Ok(())
    }

    fn confirm_enemy_casualties(&self, _notice: &CasualtyNotice, _hit_player: &PlayerId) -> Result<(), RemoteError> {
        self.enemy_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn select_casualties(&self, _request: &CasualtyRequest) -> Result<Option<CasualtyDetails>, RemoteError> {
        self.select_calls.fetch_add(1, Ordering::SeqCst);
        self.hold();
        Ok(self.choice.clone())
    }
}

pub fn shared<T: RemotePlayer + 'static>(remote: T) -> Arc<T> {
    Arc::new(remote)
}

/// Polls `condition` for up to five seconds.
pub fn wait_until(what: &str, condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        thread::sleep(Duration::from_millis(5));
    }
}
