//! Remote round-trips for casualties.
//!
//! Confirmation runs two acknowledgements concurrently. The player who lost
//! units must confirm before the action continues; the player who fired is
//! asked on a detached helper thread whose outcome nobody waits for. While
//! blocked on the affected player the action gives up delegate execution,
//! and the wait can be interrupted through the bridge's cancel token.
//!
//! A wait that is interrupted or times out leaves its request running. The
//! request is parked in the action's ledger under its group and player, and
//! the next attempt waits on it instead of asking again.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::casualty::CasualtyDetails;
use super::context::{GroupId, StepContext};
use super::group::FiringGroup;
use crate::board::PlayerId;
use crate::bridge::{CancelToken, CasualtyNotice, CasualtyRequest, DelegateBridge, RemotePlayer, YieldedExecution};
use crate::error::{CombatError, RemoteError};

/// Name of the thread that collects the firing player's acknowledgement.
pub const ENEMY_CONFIRMATION_THREAD: &str = "click to continue waiter";

/// Why a remote wait ended without a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitError {
    Remote(RemoteError),
    TimedOut,
    Interrupted,
}

/// A remote call running on its own worker thread.
#[derive(Debug)]
pub struct InFlight<T> {
    rx: Receiver<T>,
}

impl<T: Send + 'static> InFlight<T> {
    /// Starts `call` on a worker thread.
    pub fn start<F>(call: F) -> Result<Self, RemoteError>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("remote request".to_string())
            .spawn(move || {
                let _ = tx.send(call());
            })
            .map_err(|e| RemoteError::Failed(e.to_string()))?;
        Ok(InFlight { rx })
    }

    /// Waits for the worker's answer.
    ///
    /// The wait wakes every `poll` to check `cancel` and gives up once
    /// `timeout` elapses. After `TimedOut` or `Interrupted` the worker is
    /// still running and the request can be waited on again.
    pub fn wait(&self, cancel: &CancelToken, poll: Duration, timeout: Option<Duration>) -> Result<T, WaitError> {
        let poll = poll.max(Duration::from_millis(1));
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            if cancel.is_cancelled() {
                return Err(WaitError::Interrupted);
            }
            let wait = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(WaitError::TimedOut);
                    }
                    poll.min(deadline - now)
                }
                None => poll,
            };
            match self.rx.recv_timeout(wait) {
                Ok(answer) => return Ok(answer),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(WaitError::Remote(RemoteError::Failed(
                        "remote worker exited without answering".to_string(),
                    )))
                }
            }
        }
    }
}

/// Runs `call` on a worker thread and waits once for its result.
///
/// An abandoned worker finishes in the background and its result is dropped.
pub fn await_remote<T, F>(
    cancel: &CancelToken,
    poll: Duration,
    timeout: Option<Duration>,
    call: F,
) -> Result<T, WaitError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, RemoteError> + Send + 'static,
{
    let request = InFlight::start(call).map_err(WaitError::Remote)?;
    request.wait(cancel, poll, timeout)?.map_err(WaitError::Remote)
}

/// What a parked request eventually answers.
#[derive(Debug)]
pub enum Answer {
    Choice(Result<Option<CasualtyDetails>, RemoteError>),
    Acknowledged(Result<(), RemoteError>),
}

/// Requests whose wait gave up, at most one per group and player.
///
/// They belong to the running process. A cloned or deserialized ledger
/// starts without any, and ledgers compare equal whatever is parked.
#[derive(Default)]
pub struct PendingRequests(BTreeMap<(GroupId, PlayerId), InFlight<Answer>>);

impl PendingRequests {
    pub fn take(&mut self, group: GroupId, player: &PlayerId) -> Option<InFlight<Answer>> {
        self.0.remove(&(group, player.clone()))
    }

    pub fn park(&mut self, group: GroupId, player: PlayerId, request: InFlight<Answer>) {
        debug!(group = group.0, %player, "remote request left in flight");
        self.0.insert((group, player), request);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Clone for PendingRequests {
    fn clone(&self) -> Self {
        PendingRequests::default()
    }
}

impl PartialEq for PendingRequests {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

impl Eq for PendingRequests {}

impl fmt::Debug for PendingRequests {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

/// Asks the firing player to acknowledge the casualties they inflicted.
///
/// Failures are logged and dropped. Returns `None` if the thread could not
/// be started.
pub fn spawn_enemy_confirmation(
    remote: Arc<dyn RemotePlayer>,
    notice: CasualtyNotice,
    hit_player: PlayerId,
) -> Option<JoinHandle<()>> {
    let spawned = thread::Builder::new()
        .name(ENEMY_CONFIRMATION_THREAD.to_string())
        .spawn(move || {
            if let Err(e) = remote.confirm_enemy_casualties(&notice, &hit_player) {
                warn!(error = %e, battle = notice.battle_id.0, "enemy casualty confirmation failed");
            }
        });
    match spawned {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "could not start {}", ENEMY_CONFIRMATION_THREAD);
            None
        }
    }
}

fn send_confirmation(
    bridge: &dyn DelegateBridge,
    group: &FiringGroup,
    notice: &CasualtyNotice,
) -> Result<InFlight<Answer>, CombatError> {
    let remote = bridge
        .remote_player(&group.hit_player)
        .ok_or_else(|| RemoteError::NoRemote(group.hit_player.clone()))?;
    let notice = notice.clone();
    Ok(InFlight::start(move || {
        Answer::Acknowledged(remote.confirm_own_casualties(&notice))
    })?)
}

/// Sends the firing player's acknowledgement the first time only.
fn notify_firing_player(cx: &mut StepContext<'_>, id: GroupId, group: &FiringGroup, notice: &CasualtyNotice) {
    let Ok(record) = cx.action.group_mut(id) else {
        return;
    };
    if record.enemy_notified {
        return;
    }
    record.enemy_notified = true;
    match cx.bridge.remote_player(&group.firing_player) {
        Some(remote) => {
            spawn_enemy_confirmation(remote, notice.clone(), group.hit_player.clone());
        }
        None => debug!(player = %group.firing_player, "no remote for firing player, skipping enemy confirmation"),
    }
}

/// Blocks until the hit player has confirmed `notice` for group `id`.
///
/// The firing player is asked in the background, once per group. A missing
/// remote for the firing player is skipped; a missing remote for the hit
/// player is an error.
pub fn confirm_casualties(
    cx: &mut StepContext<'_>,
    id: GroupId,
    group: &FiringGroup,
    notice: CasualtyNotice,
) -> Result<(), CombatError> {
    let mut request = match cx.action.pending_mut().take(id, &group.hit_player) {
        Some(request) => {
            debug!(group = id.0, player = %group.hit_player, "waiting on earlier request");
            request
        }
        None => send_confirmation(&*cx.bridge, group, &notice)?,
    };
    notify_firing_player(cx, id, group, &notice);

    let cancel = cx.bridge.cancel_token();
    let poll = cx.config.ack_poll_interval();
    loop {
        let outcome = {
            let _yielded = YieldedExecution::new(&mut *cx.bridge);
            request.wait(&cancel, poll, None)
        };
        match outcome {
            Ok(Answer::Acknowledged(result)) => return result.map_err(CombatError::from),
            Ok(Answer::Choice(_)) => {
                // A casualty choice answered after its timeout; the default already stands.
                debug!(group = id.0, player = %group.hit_player, "late casualty choice ignored");
                request = send_confirmation(&*cx.bridge, group, &notice)?;
            }
            Err(WaitError::Interrupted) => {
                cx.action.pending_mut().park(id, group.hit_player.clone(), request);
                return Err(CombatError::Interrupted);
            }
            Err(WaitError::TimedOut) => {
                cx.action.pending_mut().park(id, group.hit_player.clone(), request);
                return Err(RemoteError::Timeout(group.hit_player.clone()).into());
            }
            Err(WaitError::Remote(e)) => return Err(e.into()),
        }
    }
}

/// Lets the hit player pick casualties for group `id`, within the
/// configured timeout.
///
/// Returns `Ok(None)` when the default selection should stand: no remote,
/// no answer in time, a disconnect, or an explicit acceptance. Only an
/// interrupted wait is an error. A request that times out stays parked so
/// the player is not asked anything else for the group until it answers.
pub fn request_casualty_choice(
    cx: &mut StepContext<'_>,
    id: GroupId,
    request: CasualtyRequest,
    hit_player: &PlayerId,
) -> Result<Option<CasualtyDetails>, CombatError> {
    let in_flight = match cx.action.pending_mut().take(id, hit_player) {
        Some(in_flight) => in_flight,
        None => {
            let Some(remote) = cx.bridge.remote_player(hit_player) else {
                debug!(player = %hit_player, "no remote to choose casualties, using default");
                return Ok(None);
            };
            match InFlight::start(move || Answer::Choice(remote.select_casualties(&request))) {
                Ok(in_flight) => in_flight,
                Err(e) => {
                    warn!(player = %hit_player, error = %e, "casualty selection failed, using default");
                    return Ok(None);
                }
            }
        }
    };

    let cancel = cx.bridge.cancel_token();
    let poll = cx.config.ack_poll_interval();
    let timeout = cx.config.casualty_selection_timeout();
    let outcome = {
        let _yielded = YieldedExecution::new(&mut *cx.bridge);
        in_flight.wait(&cancel, poll, Some(timeout))
    };
    match outcome {
        Ok(Answer::Choice(Ok(choice))) => Ok(choice),
        Ok(Answer::Choice(Err(e))) | Err(WaitError::Remote(e)) => {
            warn!(player = %hit_player, error = %e, "casualty selection failed, using default");
            Ok(None)
        }
        Ok(Answer::Acknowledged(_)) => Ok(None),
        Err(WaitError::Interrupted) => {
            cx.action.pending_mut().park(id, hit_player.clone(), in_flight);
            Err(CombatError::Interrupted)
        }
        Err(WaitError::TimedOut) => {
            warn!(player = %hit_player, "casualty selection timed out, using default");
            cx.action.pending_mut().park(id, hit_player.clone(), in_flight);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn await_remote_returns_worker_result() {
        let cancel = CancelToken::new();
        let result = await_remote(&cancel, Duration::from_millis(5), None, || Ok(7));
        assert_eq!(result, Ok(7));

        let failed: Result<(), _> = await_remote(&cancel, Duration::from_millis(5), None, || {
            Err(RemoteError::Failed("boom".into()))
        });
        assert_eq!(failed, Err(WaitError::Remote(RemoteError::Failed("boom".into()))));
    }

    #[test]
    fn await_remote_honours_cancellation() {
        let cancel = CancelToken::new();
        let release = Arc::new(AtomicBool::new(false));
        let worker_release = Arc::clone(&release);
        let canceller = cancel.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            canceller.cancel();
        });
        let result: Result<(), _> = await_remote(&cancel, Duration::from_millis(5), None, move || {
            while !worker_release.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_millis(5));
            }
            Ok(())
        });
        release.store(true, Ordering::Relaxed);
        handle.join().unwrap();
        assert_eq!(result, Err(WaitError::Interrupted));
    }

    #[test]
    fn await_remote_times_out() {
        let cancel = CancelToken::new();
        let result: Result<(), _> = await_remote(
            &cancel,
            Duration::from_millis(5),
            Some(Duration::from_millis(20)),
            || {
                thread::sleep(Duration::from_millis(200));
                Ok(())
            },
        );
        assert_eq!(result, Err(WaitError::TimedOut));
    }

    #[test]
    fn panicking_worker_is_a_remote_failure() {
        let cancel = CancelToken::new();
        let result: Result<(), _> =
            await_remote(&cancel, Duration::from_millis(5), None, || panic!("remote crashed"));
        assert!(matches!(result, Err(WaitError::Remote(RemoteError::Failed(_)))));
    }

    #[test]
    fn timed_out_request_can_be_waited_on_again() {
        let cancel = CancelToken::new();
        let request = InFlight::start(|| {
            thread::sleep(Duration::from_millis(60));
            7
        })
        .unwrap();
        let poll = Duration::from_millis(5);
        assert_eq!(request.wait(&cancel, poll, Some(Duration::from_millis(10))), Err(WaitError::TimedOut));
        assert_eq!(request.wait(&cancel, poll, None), Ok(7));
    }
}
